//! Include path resolution.
//!
//! Turns the `path` of an include spec into concrete document paths:
//!
//! - **Glob** (`*`, `?`, `[`): expanded against the filesystem in sorted
//!   order. Regular files are admitted only with a `.yaml`/`.yml` extension.
//!   A pattern ending in a separator (`hosts/*/`) selects directories, and
//!   each matched directory contributes its `default.yaml`. A pattern
//!   without a trailing separator never descends into directories. `**`
//!   follows the `glob` crate's recursive matching.
//! - **Trailing separator** (`hosts/laptop/`): must name a directory that
//!   contains `default.yaml`.
//! - **Plain path**: a directory contributes its `default.yaml`, a file is
//!   used directly, and an extension-less name is retried with `.yaml`.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::debug;

use crate::defaults::DIRECTORY_DOCUMENT;
use crate::error::{Error, Result};

/// Resolve `include` relative to `base_dir`.
///
/// `optional` only affects globs: a glob with no admissible match yields an
/// empty list instead of an error. Every other failure is reported and left
/// to the caller to forgive.
pub fn resolve_include(base_dir: &Path, include: &str, optional: bool) -> Result<Vec<PathBuf>> {
    if include.trim().is_empty() {
        return Err(Error::InvalidInclude {
            path: include.to_string(),
            message: "include path must not be empty".to_string(),
        });
    }

    if has_glob_meta(include) {
        return resolve_glob(base_dir, include, optional);
    }

    let candidate = base_dir.join(include);
    if ends_with_separator(include) {
        return resolve_directory(&candidate).ok_or_else(|| Error::UnresolvedInclude {
            path: include.to_string(),
            base: base_dir.to_path_buf(),
        });
    }

    resolve_plain(&candidate).ok_or_else(|| Error::UnresolvedInclude {
        path: include.to_string(),
        base: base_dir.to_path_buf(),
    })
}

/// True if `path` contains glob metacharacters.
pub fn has_glob_meta(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

fn ends_with_separator(path: &str) -> bool {
    path.ends_with('/') || path.ends_with(std::path::MAIN_SEPARATOR)
}

fn is_yaml_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

fn resolve_directory(dir: &Path) -> Option<Vec<PathBuf>> {
    let document = dir.join(DIRECTORY_DOCUMENT);
    if dir.is_dir() && document.is_file() {
        Some(vec![document])
    } else {
        None
    }
}

fn resolve_plain(candidate: &Path) -> Option<Vec<PathBuf>> {
    if candidate.is_dir() {
        return resolve_directory(candidate);
    }
    if candidate.is_file() {
        return Some(vec![candidate.to_path_buf()]);
    }
    if candidate.extension().is_none() {
        let mut with_extension = candidate.as_os_str().to_os_string();
        with_extension.push(".yaml");
        let with_extension = PathBuf::from(with_extension);
        if with_extension.is_file() {
            return Some(vec![with_extension]);
        }
    }
    None
}

fn resolve_glob(base_dir: &Path, include: &str, optional: bool) -> Result<Vec<PathBuf>> {
    let directories_only = ends_with_separator(include);
    let trimmed = include.trim_end_matches(['/', std::path::MAIN_SEPARATOR]);

    let pattern = if Path::new(trimmed).is_absolute() {
        trimmed.to_string()
    } else {
        let base = Pattern::escape(&base_dir.to_string_lossy());
        format!("{}/{}", base.trim_end_matches('/'), trimmed)
    };

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut resolved = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry.map_err(|e| Error::Io {
            path: e.path().to_path_buf(),
            source: std::io::Error::from(e),
        })?;

        if path.is_dir() {
            if !directories_only {
                debug!("Glob '{}' skips directory {}", include, path.display());
                continue;
            }
            match resolve_directory(&path) {
                Some(documents) => resolved.extend(documents),
                None => debug!(
                    "Glob '{}' skips {} (no {})",
                    include,
                    path.display(),
                    DIRECTORY_DOCUMENT
                ),
            }
        } else if !directories_only && is_yaml_file(&path) {
            resolved.push(path);
        } else {
            debug!("Glob '{}' skips non-document {}", include, path.display());
        }
    }

    let mut seen = std::collections::HashSet::new();
    resolved.retain(|path| seen.insert(path.clone()));

    if resolved.is_empty() && !optional {
        return Err(Error::UnresolvedInclude {
            path: include.to_string(),
            base: base_dir.to_path_buf(),
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf], base: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(base).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn packages_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let packages = dir.path().join("packages");
        fs::create_dir_all(packages.join("nested")).unwrap();
        fs::write(packages.join("a.yaml"), "").unwrap();
        fs::write(packages.join("b.yaml"), "").unwrap();
        fs::write(packages.join("notes.txt"), "").unwrap();
        fs::write(packages.join("nested").join("default.yaml"), "").unwrap();
        dir
    }

    #[test]
    fn test_single_star_glob_admits_flat_yaml_files_only() {
        let dir = packages_fixture();
        let resolved = resolve_include(dir.path(), "packages/*", false).unwrap();
        assert_eq!(names(&resolved, dir.path()), vec!["packages/a.yaml", "packages/b.yaml"]);
    }

    #[test]
    fn test_directory_glob_admits_default_documents() {
        let dir = packages_fixture();
        fs::create_dir_all(dir.path().join("packages").join("empty")).unwrap();

        let resolved = resolve_include(dir.path(), "packages/*/", false).unwrap();
        assert_eq!(names(&resolved, dir.path()), vec!["packages/nested/default.yaml"]);
    }

    #[test]
    fn test_glob_accepts_yml_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.yml"), "").unwrap();
        fs::write(dir.path().join("two.yaml"), "").unwrap();

        let resolved = resolve_include(dir.path(), "*.y*ml", false).unwrap();
        assert_eq!(names(&resolved, dir.path()), vec!["one.yml", "two.yaml"]);
    }

    #[test]
    fn test_glob_without_matches() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve_include(dir.path(), "hosts/*.yaml", false),
            Err(Error::UnresolvedInclude { .. })
        ));
        assert!(resolve_include(dir.path(), "hosts/*.yaml", true)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_trailing_separator_requires_default_document() {
        let dir = packages_fixture();
        let resolved = resolve_include(dir.path(), "packages/nested/", false).unwrap();
        assert_eq!(names(&resolved, dir.path()), vec!["packages/nested/default.yaml"]);

        // packages/ itself has no default.yaml; optional does not help here
        assert!(resolve_include(dir.path(), "packages/", true).is_err());
    }

    #[test]
    fn test_plain_directory_uses_default_document() {
        let dir = packages_fixture();
        let resolved = resolve_include(dir.path(), "packages/nested", false).unwrap();
        assert_eq!(names(&resolved, dir.path()), vec!["packages/nested/default.yaml"]);
    }

    #[test]
    fn test_plain_file_and_extension_retry() {
        let dir = packages_fixture();
        let direct = resolve_include(dir.path(), "packages/a.yaml", false).unwrap();
        assert_eq!(names(&direct, dir.path()), vec!["packages/a.yaml"]);

        let retried = resolve_include(dir.path(), "packages/b", false).unwrap();
        assert_eq!(names(&retried, dir.path()), vec!["packages/b.yaml"]);
    }

    #[test]
    fn test_plain_unresolved() {
        let dir = TempDir::new().unwrap();
        let err = resolve_include(dir.path(), "missing", true).unwrap_err();
        assert!(matches!(err, Error::UnresolvedInclude { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_absolute_path() {
        let dir = packages_fixture();
        let absolute = dir.path().join("packages").join("a.yaml");
        let other = TempDir::new().unwrap();
        let resolved =
            resolve_include(other.path(), absolute.to_str().unwrap(), false).unwrap();
        assert_eq!(resolved, vec![absolute]);
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve_include(dir.path(), "  ", true),
            Err(Error::InvalidInclude { .. })
        ));
    }

    #[test]
    fn test_has_glob_meta() {
        assert!(has_glob_meta("hosts/*.yaml"));
        assert!(has_glob_meta("host?.yaml"));
        assert!(has_glob_meta("[ab].yaml"));
        assert!(!has_glob_meta("hosts/laptop.yaml"));
    }
}
