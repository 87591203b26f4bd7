//! Default values for machinecfg.
//!
//! This module provides centralized default values used across the engine
//! and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

use crate::config::Manager;

/// File name of the root document looked up in the current directory.
pub const DEFAULT_DOCUMENT: &str = "machine.yaml";

/// Environment variable that overrides the root document path.
pub const CONFIG_ENV: &str = "MACHINECFG_CONFIG";

/// Document loaded when an include names a directory.
pub const DIRECTORY_DOCUMENT: &str = "default.yaml";

/// Highest document major version this engine understands.
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

/// Built-in invocation flags, used when neither the package entry nor the
/// user-level `package_defaults` provide any.
pub fn builtin_flags(manager: Manager) -> &'static [&'static str] {
    match manager {
        Manager::Apt => &["-y", "--no-install-recommends"],
        Manager::Flatpak => &["--system", "--assumeyes"],
        Manager::Snap => &[],
    }
}

/// Returns the per-user root document path.
///
/// Uses the platform-appropriate configuration directory:
/// - Linux: `~/.config/machinecfg/machine.yaml` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/machinecfg/machine.yaml`
///
/// Returns `None` if the platform configuration directory cannot be
/// determined.
pub fn user_document_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("machinecfg").join(DEFAULT_DOCUMENT))
}
