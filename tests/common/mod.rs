//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and document snippets to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(documents::MINIMAL);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::documents;
    pub use super::TestFixture;
}

/// Common machine document snippets for testing.
#[allow(dead_code)]
pub mod documents {
    /// Minimal valid document.
    pub const MINIMAL: &str = r#"version: "1.0"
"#;

    /// Valid document with one package per manager.
    pub const PACKAGES: &str = r#"version: "1.0"
packages:
  apt:
    - git
    - name: curl
      flags: ["--reinstall"]
  flatpak:
    - org.mozilla.firefox
  snap:
    - code
"#;

    /// Missing version, missing source file, malformed dconf key.
    pub const THREE_ERRORS: &str = r#"files:
  vimrc:
    source: dotfiles/vimrc
    destination: ~/.vimrc
dconf:
  settings:
    org/gnome/x: "1"
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "version: [unclosed\n";

    /// Document that only warns: one package shared by two managers.
    pub const WARNINGS_ONLY: &str = r#"version: "1.0"
packages:
  apt: [git]
  snap: [git]
"#;
}

/// A temporary directory holding a `machine.yaml` and its fragments.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(documents::MINIMAL)
///     .with_file("hosts/laptop.yaml", "packages:\n  apt: [tlp]\n");
///
/// fixture.command().arg("resolve").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `machine.yaml` root document with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("machine.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the root document.
    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("machine.yaml")
    }

    /// A `machinecfg` command running in the fixture directory, with
    /// colors off and no inherited or per-user document.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("machinecfg");
        cmd.current_dir(self.path())
            .env_remove("MACHINECFG_CONFIG")
            .env_remove("RUST_LOG")
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
