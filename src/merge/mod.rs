//! Document merging
//!
//! This module folds one resolved document into another. The default mode,
//! used by the include loader, applies a fixed rule per section:
//!
//! | Section                       | Rule                                          |
//! |-------------------------------|-----------------------------------------------|
//! | `packages.*`, `repositories.*`| destination then source, dedup by name, first wins |
//! | `includes`                    | destination then source, dedup by path, first wins |
//! | `files`, `binaries`, `dconf`  | keyed, source overwrites (last merged wins)   |
//! | `package_defaults`            | keyed by manager, last merged wins            |
//! | `backup_policy`               | field-wise, set source fields overwrite       |
//! | `version`                     | destination wins when set                     |
//!
//! Lists are cumulative, so earlier declarations keep their attributes;
//! keyed sections are single-valued per key, so later declarations replace
//! them.
//!
//! The alternate, rule-driven mode for parent/child templates lives in
//! [`inherit`].

pub mod inherit;

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use log::debug;

use crate::config::{
    AptRepository, BackupPolicy, Document, FlatpakRepository, IncludeSpec, Manager, PackageEntry,
};
use crate::error::Result;

/// The deduplication key of a list item.
pub trait Identity {
    fn identity(&self) -> &str;
}

impl Identity for PackageEntry {
    fn identity(&self) -> &str {
        &self.name
    }
}

impl Identity for AptRepository {
    fn identity(&self) -> &str {
        &self.name
    }
}

impl Identity for FlatpakRepository {
    fn identity(&self) -> &str {
        &self.name
    }
}

impl Identity for IncludeSpec {
    fn identity(&self) -> &str {
        &self.path
    }
}

/// Remove later items whose identity was already seen, preserving order.
pub fn dedup_first_wins<T: Identity>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.identity().to_string()) {
            kept.push(item);
        } else {
            debug!("Dropping duplicate '{}'", item.identity());
        }
    }
    kept
}

fn merge_list<T: Identity>(destination: &mut Vec<T>, source: Vec<T>) {
    let mut combined = std::mem::take(destination);
    combined.extend(source);
    *destination = dedup_first_wins(combined);
}

fn merge_keyed<V>(section: &str, destination: &mut BTreeMap<String, V>, source: BTreeMap<String, V>) {
    for (key, value) in source {
        if destination.insert(key.clone(), value).is_some() {
            debug!("{} '{}' overridden by a later document", section, key);
        }
    }
}

/// Follow a keyed merge: every key of `incoming` now belongs to its origin
/// in `source`, or to none if it has no recorded origin.
fn merge_origins<V>(
    destination: &mut BTreeMap<String, PathBuf>,
    incoming: &BTreeMap<String, V>,
    source: &mut BTreeMap<String, PathBuf>,
) {
    for key in incoming.keys() {
        match source.remove(key) {
            Some(origin) => destination.insert(key.clone(), origin),
            None => destination.remove(key),
        };
    }
}

fn merge_backup_policy(destination: &mut Option<BackupPolicy>, source: Option<BackupPolicy>) {
    let Some(source) = source else {
        return;
    };
    let target = destination.get_or_insert_with(BackupPolicy::default);
    if source.enabled.is_some() {
        target.enabled = source.enabled;
    }
    if source.directory.is_some() {
        target.directory = source.directory;
    }
    if source.keep.is_some() {
        target.keep = source.keep;
    }
}

/// Fold `source` into `destination` in place.
pub fn merge_into(destination: &mut Document, source: Document) -> Result<()> {
    let Document {
        version,
        includes,
        package_defaults,
        backup_policy,
        repositories,
        mut packages,
        files,
        binaries,
        dconf,
        mut origins,
    } = source;

    if destination.version.is_empty() {
        destination.version = version;
        destination.origins.version = origins.version;
    }
    merge_list(&mut destination.includes, includes);
    merge_origins(
        &mut destination.origins.package_defaults,
        &package_defaults,
        &mut origins.package_defaults,
    );
    merge_keyed("package_defaults", &mut destination.package_defaults, package_defaults);
    merge_backup_policy(&mut destination.backup_policy, backup_policy);

    merge_list(&mut destination.repositories.apt, repositories.apt);
    merge_list(&mut destination.repositories.flatpak, repositories.flatpak);

    for manager in Manager::ALL {
        let incoming = std::mem::take(packages.for_manager_mut(manager));
        merge_list(destination.packages.for_manager_mut(manager), incoming);
    }

    merge_keyed("file", &mut destination.files, files);
    merge_keyed("binary", &mut destination.binaries, binaries);
    merge_origins(&mut destination.origins.dconf, &dconf.settings, &mut origins.dconf);
    merge_keyed("dconf setting", &mut destination.dconf.settings, dconf.settings);

    Ok(())
}

/// Left-fold `documents` into one: the first is the destination, every
/// following document is merged into the running result.
pub fn merge_all<I>(documents: I) -> Result<Document>
where
    I: IntoIterator<Item = Document>,
{
    let mut documents = documents.into_iter();
    let mut merged = documents.next().unwrap_or_default();
    for document in documents {
        merge_into(&mut merged, document)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, FileEntry};

    fn names(entries: &[PackageEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_package_lists_dedup_first_wins_in_order() {
        let mut destination = Document::default();
        destination.packages.apt = vec![
            PackageEntry::new("git"),
            PackageEntry::with_flags("curl", ["--first"]),
        ];
        let mut source = Document::default();
        source.packages.apt = vec![
            PackageEntry::with_flags("curl", ["--second"]),
            PackageEntry::new("vim"),
        ];

        merge_into(&mut destination, source).unwrap();

        assert_eq!(names(&destination.packages.apt), vec!["git", "curl", "vim"]);
        assert_eq!(destination.packages.apt[1].flags, vec!["--first"]);
    }

    #[test]
    fn test_dedup_within_a_single_list() {
        let mut destination = parse("packages:\n  snap: [code, code, slack]\n").unwrap();
        merge_into(&mut destination, Document::default()).unwrap();
        assert_eq!(names(&destination.packages.snap), vec!["code", "slack"]);
    }

    #[test]
    fn test_managers_do_not_share_identity() {
        let mut destination = parse("packages:\n  apt: [git]\n").unwrap();
        let source = parse("packages:\n  snap: [git]\n").unwrap();
        merge_into(&mut destination, source).unwrap();
        assert_eq!(names(&destination.packages.apt), vec!["git"]);
        assert_eq!(names(&destination.packages.snap), vec!["git"]);
    }

    #[test]
    fn test_repositories_dedup_by_name() {
        let mut destination = parse(
            "repositories:\n  flatpak:\n    - {name: flathub, url: 'https://first.example'}\n",
        )
        .unwrap();
        let source = parse(
            "repositories:\n  flatpak:\n    - {name: flathub, url: 'https://second.example'}\n    - {name: gnome, url: 'https://gnome.example'}\n",
        )
        .unwrap();

        merge_into(&mut destination, source).unwrap();

        let flatpak = &destination.repositories.flatpak;
        assert_eq!(flatpak.len(), 2);
        assert_eq!(flatpak[0].url, "https://first.example");
        assert_eq!(flatpak[1].name, "gnome");
    }

    #[test]
    fn test_keyed_sections_last_wins() {
        let mut destination = parse("dconf:\n  settings:\n    /a: '1'\n").unwrap();
        let source = parse("dconf:\n  settings:\n    /a: '2'\n    /b: '3'\n").unwrap();

        merge_into(&mut destination, source).unwrap();

        let settings = &destination.dconf.settings;
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["/a"], "2");
        assert_eq!(settings["/b"], "3");
    }

    #[test]
    fn test_files_last_wins_keeps_source_origin() {
        let mut destination = Document::default();
        destination.files.insert(
            "vimrc".to_string(),
            FileEntry {
                source: "root/vimrc".to_string(),
                origin: Some("/cfg/machine.yaml".into()),
                ..Default::default()
            },
        );
        let mut source = Document::default();
        source.files.insert(
            "vimrc".to_string(),
            FileEntry {
                source: "fragment/vimrc".to_string(),
                origin: Some("/cfg/hosts/laptop.yaml".into()),
                ..Default::default()
            },
        );

        merge_into(&mut destination, source).unwrap();

        let vimrc = &destination.files["vimrc"];
        assert_eq!(vimrc.source, "fragment/vimrc");
        assert_eq!(vimrc.base_dir(), Some(std::path::Path::new("/cfg/hosts")));
    }

    #[test]
    fn test_version_destination_wins_when_set() {
        let mut destination = parse("version: '1.0'\n").unwrap();
        merge_into(&mut destination, parse("version: '1.5'\n").unwrap()).unwrap();
        assert_eq!(destination.version, "1.0");

        let mut unversioned = Document::default();
        merge_into(&mut unversioned, parse("version: '1.5'\n").unwrap()).unwrap();
        assert_eq!(unversioned.version, "1.5");
    }

    #[test]
    fn test_backup_policy_field_wise() {
        let mut destination =
            parse("backup_policy:\n  enabled: true\n  directory: /var/backups\n").unwrap();
        let source = parse("backup_policy:\n  keep: 3\n  directory: /srv/backups\n").unwrap();

        merge_into(&mut destination, source).unwrap();

        let policy = destination.backup_policy.unwrap();
        assert_eq!(policy.enabled, Some(true));
        assert_eq!(policy.directory.as_deref(), Some("/srv/backups"));
        assert_eq!(policy.keep, Some(3));
    }

    #[test]
    fn test_package_defaults_last_wins_per_manager() {
        let mut destination =
            parse("package_defaults:\n  apt: ['-y']\n  snap: ['--classic']\n").unwrap();
        let source = parse("package_defaults:\n  apt: ['-q']\n").unwrap();

        merge_into(&mut destination, source).unwrap();

        assert_eq!(destination.package_defaults["apt"], vec!["-q"]);
        assert_eq!(destination.package_defaults["snap"], vec!["--classic"]);
    }

    #[test]
    fn test_origins_follow_the_winning_declaration() {
        let root = std::path::Path::new("/cfg/machine.yaml");
        let fragment = std::path::Path::new("/cfg/hosts/laptop.yaml");

        let mut destination =
            parse("packages:\n  apt: [git]\ndconf:\n  settings:\n    /a: '1'\n").unwrap();
        destination.annotate_origin(root);
        let mut source = parse(
            "version: '1.0'\npackages:\n  apt: [git, Bad]\ndconf:\n  settings:\n    /a: '2'\n    /b: '3'\npackage_defaults:\n  apt: ['-y']\n",
        )
        .unwrap();
        source.annotate_origin(fragment);

        merge_into(&mut destination, source).unwrap();

        let apt = &destination.packages.apt;
        assert_eq!(apt[0].origin.as_deref(), Some(root));
        assert_eq!(apt[1].origin.as_deref(), Some(fragment));
        let origins = &destination.origins;
        assert_eq!(origins.version.as_deref(), Some(fragment));
        assert_eq!(origins.dconf["/a"], fragment);
        assert_eq!(origins.dconf["/b"], fragment);
        assert_eq!(origins.package_defaults["apt"], fragment);

        merge_into(&mut destination, parse("dconf:\n  settings:\n    /a: '4'\n").unwrap()).unwrap();
        assert!(!destination.origins.dconf.contains_key("/a"));
    }

    #[test]
    fn test_includes_dedup_by_path() {
        let mut destination = parse("includes:\n  - path: common.yaml\n").unwrap();
        let source =
            parse("includes:\n  - path: common.yaml\n    optional: true\n  - path: extra.yaml\n")
                .unwrap();

        merge_into(&mut destination, source).unwrap();

        assert_eq!(destination.includes.len(), 2);
        assert!(!destination.includes[0].optional);
    }

    #[test]
    fn test_merge_all_left_fold() {
        let merged = merge_all(vec![
            parse("packages:\n  apt: [git, curl]\n").unwrap(),
            parse("packages:\n  apt: [curl, vim]\n").unwrap(),
            parse("packages:\n  apt: [htop]\n").unwrap(),
        ])
        .unwrap();
        assert_eq!(names(&merged.packages.apt), vec!["git", "curl", "vim", "htop"]);

        assert_eq!(merge_all(Vec::new()).unwrap(), Document::default());
    }
}
