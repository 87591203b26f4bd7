//! # Recursive Loader
//!
//! Turns a root document path into one merged [`Document`] by following its
//! include specs depth-first.
//!
//! ## Process
//!
//! 1.  **Enter**: the document's canonical path is checked against the
//!     ancestry set (the paths on the current descent). Re-entering one of
//!     them is a circular include. Otherwise the path is pushed and the file
//!     is parsed, with each item annotated with the document declaring it.
//!
//! 2.  **Includes**: each include spec is processed in declaration order.
//!     Specs whose conditions fail are skipped. The rest are resolved to
//!     concrete paths, each path is loaded recursively, and the results are
//!     folded into the current document with [`merge_into`] in encounter
//!     order.
//!
//! 3.  **Leave**: the path is popped from the ancestry set, so the same file
//!     reached through a different branch (a diamond) is loaded again rather
//!     than reported as a cycle.
//!
//! A failing required include aborts the load, wrapped in
//! [`Error::Include`] with the including document attached. A failing
//! optional include is dropped whole. Circular includes are fatal even
//! under an optional include.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::condition;
use crate::config::{self, Document, IncludeSpec};
use crate::error::{Error, Result};
use crate::facts::HostFacts;
use crate::merge::merge_into;
use crate::resolve::resolve_include;

/// One loaded document and the fragments it pulled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeTree {
    /// Canonical path of the document.
    pub path: PathBuf,
    /// Description of the include spec that led here; empty for the root.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Loaded fragments, in encounter order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IncludeTree>,
}

impl IncludeTree {
    pub fn new(path: PathBuf, description: &str) -> Self {
        Self {
            path,
            description: description.to_string(),
            children: Vec::new(),
        }
    }

    /// Number of documents in the tree, counting repeated visits.
    pub fn document_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(IncludeTree::document_count)
            .sum::<usize>()
    }
}

/// Depth-first include loader.
///
/// The ancestry state is reset at the start of every top-level load, so one
/// instance can be reused for sequential loads. It must not be shared
/// between concurrent loads.
#[derive(Debug)]
pub struct Loader {
    facts: HostFacts,
    ancestry: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
}

impl Loader {
    pub fn new(facts: HostFacts) -> Self {
        Self {
            facts,
            ancestry: HashSet::new(),
            stack: Vec::new(),
        }
    }

    /// Loader for the current host.
    pub fn detect() -> Self {
        Self::new(HostFacts::detect())
    }

    pub fn facts(&self) -> &HostFacts {
        &self.facts
    }

    /// Load and merge the document tree rooted at `path`.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<Document> {
        self.load_tree(path).map(|(document, _)| document)
    }

    /// Like [`Loader::load`], resolving a relative `path` against `base_dir`.
    pub fn load_with_base<P: AsRef<Path>>(&mut self, path: P, base_dir: &Path) -> Result<Document> {
        let path = path.as_ref();
        if path.is_absolute() {
            self.load(path)
        } else {
            self.load(base_dir.join(path))
        }
    }

    /// Load the document tree and report which documents were visited.
    pub fn load_tree<P: AsRef<Path>>(&mut self, path: P) -> Result<(Document, IncludeTree)> {
        self.ancestry.clear();
        self.stack.clear();
        self.load_file(path.as_ref(), "")
    }

    fn load_file(&mut self, path: &Path, description: &str) -> Result<(Document, IncludeTree)> {
        let canonical = std::fs::canonicalize(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if self.ancestry.contains(&canonical) {
            let chain = self
                .stack
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(Error::CircularInclude {
                path: canonical,
                chain,
            });
        }

        debug!("Loading {}", canonical.display());
        self.ancestry.insert(canonical.clone());
        self.stack.push(canonical.clone());

        let result = self.load_entered(&canonical, description);

        self.stack.pop();
        self.ancestry.remove(&canonical);
        result
    }

    fn load_entered(&mut self, path: &Path, description: &str) -> Result<(Document, IncludeTree)> {
        let mut document = config::from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("/")).to_path_buf();
        let mut tree = IncludeTree::new(path.to_path_buf(), description);

        let includes = document.includes.clone();
        for include in &includes {
            if !condition::all_hold(&include.conditions, &self.facts) {
                debug!(
                    "Skipping include '{}' from {}: conditions not met",
                    include.path,
                    path.display()
                );
                continue;
            }

            match self.follow(&base_dir, include) {
                Ok(fragments) => {
                    for (fragment, child) in fragments {
                        merge_into(&mut document, fragment)?;
                        tree.children.push(child);
                    }
                }
                Err(e) if include.optional && !e.is_circular_include() => {
                    debug!(
                        "Skipping optional include '{}' from {}: {}",
                        include.path,
                        path.display(),
                        e
                    );
                }
                Err(e) => {
                    return Err(Error::Include {
                        path: include.path.clone(),
                        parent: path.to_path_buf(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok((document, tree))
    }

    /// Load every fragment an include resolves to. Nothing is merged until
    /// all of them have loaded.
    fn follow(
        &mut self,
        base_dir: &Path,
        include: &IncludeSpec,
    ) -> Result<Vec<(Document, IncludeTree)>> {
        let paths = resolve_include(base_dir, &include.path, include.optional)?;
        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            loaded.push(self.load_file(&path, &include.description)?);
        }
        Ok(loaded)
    }
}
