//! # Error Handling
//!
//! This module defines the load-time error taxonomy for `machinecfg`. It uses
//! the `thiserror` library to create an `Error` enum covering every way a
//! document tree can fail to load.
//!
//! Load-time failures are fatal: the first one aborts the whole load and is
//! returned with the responsible path attached. Validation findings are a
//! separate, non-fatal taxonomy (see [`crate::validation`]) and never use
//! this type.
//!
//! ## Key Components
//!
//! - **`Error`**: I/O, parse, unresolved include, circular include and the
//!   `Include` wrapper that records which parent document asked for a
//!   failing required include.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for machinecfg load operations
#[derive(Error, Debug)]
pub enum Error {
    /// A document could not be read from disk.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document was read but is not a valid machine document.
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A document includes itself, directly or through its descendants.
    #[error("Circular include detected at {}: {chain}", path.display())]
    CircularInclude { path: PathBuf, chain: String },

    /// An include path did not resolve to any document.
    #[error("Include '{path}' could not be resolved relative to {}", base.display())]
    UnresolvedInclude { path: String, base: PathBuf },

    /// An include path resolved to something that is not a usable document.
    #[error("Invalid include '{path}': {message}")]
    InvalidInclude { path: String, message: String },

    /// A required include failed; wraps the underlying failure.
    #[error("Required include '{path}' from {} failed: {source}", parent.display())]
    Include {
        path: String,
        parent: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A merge between two documents could not be completed.
    #[error("Merge error in section '{section}': {message}")]
    Merge { section: String, message: String },

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns the innermost error, unwrapping `Include` context layers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Include { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True if this error (or the error it wraps) is a circular include.
    pub fn is_circular_include(&self) -> bool {
        matches!(self.root_cause(), Error::CircularInclude { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
