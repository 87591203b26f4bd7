//! Syntax rules and flag tables used by the validator.

use regex::Regex;
use url::Url;

use crate::config::Manager;
use crate::defaults::SUPPORTED_MAJOR_VERSION;
use crate::error::Result;

/// Flags that weaken package verification or system integrity.
pub const DANGEROUS_FLAGS: &[(Manager, &str, &str)] = &[
    (
        Manager::Apt,
        "--allow-unauthenticated",
        "installs packages that failed signature verification",
    ),
    (
        Manager::Apt,
        "--allow-downgrades",
        "silently downgrades installed packages",
    ),
    (
        Manager::Apt,
        "--allow-remove-essential",
        "can remove packages the system needs to boot",
    ),
    (
        Manager::Apt,
        "--allow-change-held-packages",
        "overrides packages pinned with apt-mark hold",
    ),
    (
        Manager::Apt,
        "--force-yes",
        "answers yes to every prompt, including unsafe ones",
    ),
    (
        Manager::Snap,
        "--dangerous",
        "installs snaps without signature verification",
    ),
    (
        Manager::Snap,
        "--devmode",
        "disables snap confinement",
    ),
];

/// Flag groups that cannot be combined. A conflict exists when flags from
/// both sides of a pair are present.
pub const CONFLICTING_FLAGS: &[(Manager, &[&str], &[&str])] = &[
    (Manager::Flatpak, &["--user"], &["--system"]),
    (
        Manager::Apt,
        &["--install-recommends"],
        &["--no-install-recommends"],
    ),
    (Manager::Apt, &["-y", "--yes", "--assume-yes"], &["--assume-no"]),
    (Manager::Snap, &["--devmode"], &["--jailmode"]),
    (Manager::Snap, &["--classic"], &["--jailmode"]),
];

/// Compiled syntax patterns.
#[derive(Debug, Clone)]
pub struct Syntax {
    version: Regex,
    apt_name: Regex,
    flatpak_name: Regex,
    snap_name: Regex,
    file_mode: Regex,
    ppa: Regex,
}

impl Syntax {
    pub fn new() -> Result<Self> {
        Ok(Self {
            version: Regex::new(r"^\d+\.\d+(\.\d+)?$")?,
            apt_name: Regex::new(r"^[a-z0-9][a-z0-9.+\-]*$")?,
            flatpak_name: Regex::new(
                r"^[A-Za-z_][A-Za-z0-9_\-]*(\.[A-Za-z_][A-Za-z0-9_\-]*){2,}$",
            )?,
            snap_name: Regex::new(r"^[a-z0-9][a-z0-9\-]*$")?,
            file_mode: Regex::new(r"^[0-7]{3,4}$")?,
            ppa: Regex::new(r"^ppa:[a-z0-9][a-z0-9.+\-]*/[a-z0-9][a-z0-9.+\-]*$")?,
        })
    }

    /// `MAJOR.MINOR` or `MAJOR.MINOR.PATCH`.
    pub fn is_version(&self, version: &str) -> bool {
        self.version.is_match(version)
    }

    pub fn is_package_name(&self, manager: Manager, name: &str) -> bool {
        match manager {
            Manager::Apt => is_local_archive(name) || self.apt_name.is_match(name),
            Manager::Flatpak => self.flatpak_name.is_match(name),
            Manager::Snap => self.snap_name.is_match(name),
        }
    }

    /// Three or four octal digits.
    pub fn is_file_mode(&self, mode: &str) -> bool {
        self.file_mode.is_match(mode)
    }

    /// `ppa:owner/name`.
    pub fn is_ppa(&self, ppa: &str) -> bool {
        self.ppa.is_match(ppa)
    }
}

/// True if the version's major component is newer than this engine reads.
/// Versions that do not parse are not reported here.
pub fn is_unsupported_version(version: &str) -> bool {
    let normalized = if version.matches('.').count() == 1 {
        format!("{}.0", version)
    } else {
        version.to_string()
    };
    semver::Version::parse(&normalized)
        .map(|v| v.major > SUPPORTED_MAJOR_VERSION)
        .unwrap_or(false)
}

/// A `.deb` path with at least one separator and no parent traversal.
pub fn is_local_archive(name: &str) -> bool {
    name.ends_with(".deb") && name.contains('/') && !has_parent_traversal(name)
}

/// True if `path` contains `..` anywhere.
pub fn has_parent_traversal(path: &str) -> bool {
    path.contains("..")
}

/// Write permission for "other" in an octal mode.
pub fn is_world_writable(mode: &str) -> bool {
    mode.chars()
        .last()
        .and_then(|digit| digit.to_digit(8))
        .is_some_and(|bits| bits & 0o2 != 0)
}

/// Absolute, with no empty components.
pub fn is_dconf_path(path: &str) -> bool {
    path.starts_with('/') && !path.contains("//")
}

pub fn is_http_url(source: &str) -> bool {
    Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Dangerous flags present in `flags`, with the reason each is dangerous.
pub fn dangerous_flags<'a>(manager: Manager, flags: &'a [String]) -> Vec<(&'a str, &'static str)> {
    flags
        .iter()
        .filter_map(|flag| {
            DANGEROUS_FLAGS
                .iter()
                .find(|(m, dangerous, _)| *m == manager && *dangerous == flag.as_str())
                .map(|(_, _, reason)| (flag.as_str(), *reason))
        })
        .collect()
}

/// Pairs of mutually exclusive flags present in `flags`.
pub fn conflicting_flags<'a>(manager: Manager, flags: &'a [String]) -> Vec<(&'a str, &'a str)> {
    let present = |group: &[&str]| {
        flags
            .iter()
            .find(|flag| group.contains(&flag.as_str()))
            .map(String::as_str)
    };
    CONFLICTING_FLAGS
        .iter()
        .filter(|(m, _, _)| *m == manager)
        .filter_map(|(_, left, right)| Some((present(*left)?, present(*right)?)))
        .collect()
}
