//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `machinecfg` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! Commands that read a document tree flatten [`DocumentArgs`] into their
//! arguments and call [`load_tree`], so root path lookup and load-error
//! reporting behave the same everywhere.

pub mod completions;
pub mod compose;
pub mod flags;
pub mod resolve;
pub mod tree;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use machinecfg::config::Document;
use machinecfg::defaults::{user_document_path, CONFIG_ENV, DEFAULT_DOCUMENT};
use machinecfg::error::Error;
use machinecfg::loader::{IncludeTree, Loader};
use machinecfg::suggestions;

/// Root document selection shared by every command that loads a tree.
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// Path to the root machine document.
    ///
    /// Defaults to `machine.yaml` in the base directory, then to the
    /// per-user document (e.g. `~/.config/machinecfg/machine.yaml`).
    #[arg(short, long, value_name = "FILE", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Directory that a relative root path is resolved against.
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

impl DocumentArgs {
    /// The root document this invocation should load.
    pub fn document_path(&self) -> PathBuf {
        let base_dir = self.base_dir.clone().unwrap_or_default();
        match &self.config {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base_dir.join(path),
            None => {
                let local = base_dir.join(DEFAULT_DOCUMENT);
                if local.exists() {
                    return local;
                }
                match user_document_path() {
                    Some(user) if user.exists() => user,
                    _ => local,
                }
            }
        }
    }
}

/// Load the tree rooted at `path`, turning load failures into user-facing
/// errors with hints.
pub fn load_tree(path: &Path) -> Result<(Document, IncludeTree)> {
    if !path.exists() {
        return Err(suggestions::config_not_found(path));
    }
    let mut loader = Loader::detect();
    loader.load_tree(path).map_err(describe_load_error)
}

fn describe_load_error(error: Error) -> anyhow::Error {
    match error.root_cause() {
        Error::CircularInclude { chain, .. } => suggestions::circular_include(chain),
        _ => anyhow::Error::new(error),
    }
}
