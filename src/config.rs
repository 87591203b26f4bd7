//! # Document Schema and Parsing
//!
//! This module defines the data structures that represent a machine document
//! (`machine.yaml` and every fragment it includes), as well as the logic for
//! parsing one file into a [`Document`].
//!
//! ## Key Components
//!
//! - **`Document`**: The parsed contents of one source file: version, include
//!   specs, per-manager default flags, backup policy, repositories, package
//!   lists, file and binary definitions, and desktop settings.
//!
//! - **`IncludeSpec` / `IncludeCondition`**: An edge to another document,
//!   gated by conditions over host facts.
//!
//! - **`PackageEntry`**: A package name plus optional invocation flags. Accepts
//!   a bare string, a `{name, flags}` mapping, or a name-keyed mapping.
//!
//! ## Lenient Parsing
//!
//! Condition types and operators are closed enumerations with an `Unknown`
//! catch-all. A typo such as `type: hostnme` still parses; the condition
//! evaluator treats it as false and the validator reports it with a
//! suggestion. Scalar fields (`version`, dconf values, file modes) accept
//! numbers and booleans as well as strings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

use crate::error::{Error, Result};

/// Package managers known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Manager {
    Apt,
    Flatpak,
    Snap,
}

impl Manager {
    /// All managers, in section order.
    pub const ALL: [Manager; 3] = [Manager::Apt, Manager::Flatpak, Manager::Snap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Manager::Apt => "apt",
            Manager::Flatpak => "flatpak",
            Manager::Snap => "snap",
        }
    }
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Manager {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "apt" => Ok(Manager::Apt),
            "flatpak" => Ok(Manager::Flatpak),
            "snap" => Ok(Manager::Snap),
            other => Err(format!("unknown package manager '{}'", other)),
        }
    }
}

/// The kind of host fact a condition inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    Os,
    Hostname,
    Env,
    FileExists,
    DirExists,
    /// Anything else; evaluates to false and is reported by validation.
    Unknown(String),
}

impl ConditionKind {
    /// Names accepted in the `type` field.
    pub const NAMES: [&'static str; 5] = ["os", "hostname", "env", "file_exists", "dir_exists"];

    pub fn as_str(&self) -> &str {
        match self {
            ConditionKind::Os => "os",
            ConditionKind::Hostname => "hostname",
            ConditionKind::Env => "env",
            ConditionKind::FileExists => "file_exists",
            ConditionKind::DirExists => "dir_exists",
            ConditionKind::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ConditionKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "os" => ConditionKind::Os,
            "hostname" => ConditionKind::Hostname,
            "env" => ConditionKind::Env,
            "file_exists" => ConditionKind::FileExists,
            "dir_exists" => ConditionKind::DirExists,
            _ => ConditionKind::Unknown(raw),
        }
    }
}

impl From<ConditionKind> for String {
    fn from(kind: ConditionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between a host fact and the expected value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    #[default]
    Equals,
    Contains,
    Matches,
    NotEquals,
    NotContains,
    /// Anything else; behaves like `Equals` and is reported by validation.
    Unknown(String),
}

impl Operator {
    /// Names accepted in the `operator` field.
    pub const NAMES: [&'static str; 5] =
        ["equals", "contains", "matches", "not_equals", "not_contains"];

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::Matches => "matches",
            Operator::NotEquals => "not_equals",
            Operator::NotContains => "not_contains",
            Operator::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "" | "equals" => Operator::Equals,
            "contains" => Operator::Contains,
            "matches" => Operator::Matches,
            "not_equals" => Operator::NotEquals,
            "not_contains" => Operator::NotContains,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate gating an include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeCondition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default, deserialize_with = "de_scalar")]
    pub value: String,
    #[serde(default)]
    pub operator: Operator,
}

/// An edge from one document to zero or more fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeSpec {
    /// Relative or absolute path; may contain `*`, `?` or `[`.
    #[serde(default)]
    pub path: String,
    /// All must hold for the include to be followed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<IncludeCondition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// When true, a failure to resolve or load this include is skipped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

/// Field-wise backup policy; unset fields inherit through merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<u32>,
}

/// An apt source, either legacy (`ppa` / one-line `uri`) or structured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptRepository {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_by: Option<String>,
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl AptRepository {
    /// True if any field of the structured (deb822-style) form is set.
    pub fn has_structured_fields(&self) -> bool {
        !self.uris.is_empty() || !self.suites.is_empty() || !self.components.is_empty()
    }

    /// True if any field of the legacy form is set.
    pub fn has_legacy_fields(&self) -> bool {
        self.ppa.is_some() || self.uri.is_some()
    }
}

/// A flatpak remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatpakRepository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repositories {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apt: Vec<AptRepository>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flatpak: Vec<FlatpakRepository>,
}

impl Repositories {
    pub fn is_empty(&self) -> bool {
        self.apt.is_empty() && self.flatpak.is_empty()
    }
}

/// A package to install, identified by `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPackageEntry")]
pub struct PackageEntry {
    /// Repository package identifier, or a local archive path for apt.
    pub name: String,
    /// Extra invocation flags; empty means "use the defaults".
    pub flags: Vec<String>,
    /// The document this entry was declared in.
    pub origin: Option<PathBuf>,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Vec::new(),
            origin: None,
        }
    }

    pub fn with_flags<I, S>(name: impl Into<String>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            flags: flags.into_iter().map(Into::into).collect(),
            origin: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPackageEntry {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        flags: Vec<String>,
    },
    Keyed(BTreeMap<String, Option<PackageOptions>>),
}

#[derive(Deserialize, Default)]
struct PackageOptions {
    #[serde(default)]
    flags: Vec<String>,
}

impl TryFrom<RawPackageEntry> for PackageEntry {
    type Error = String;

    fn try_from(raw: RawPackageEntry) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawPackageEntry::Name(name) => Ok(PackageEntry::new(name)),
            RawPackageEntry::Full { name, flags } => Ok(PackageEntry::with_flags(name, flags)),
            RawPackageEntry::Keyed(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "a name-keyed package entry must have exactly one key, found {}",
                        map.len()
                    ));
                }
                let (name, options) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| "empty package entry".to_string())?;
                Ok(PackageEntry::with_flags(
                    name,
                    options.unwrap_or_default().flags,
                ))
            }
        }
    }
}

impl Serialize for PackageEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        if self.flags.is_empty() {
            return serializer.serialize_str(&self.name);
        }
        let mut state = serializer.serialize_struct("PackageEntry", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("flags", &self.flags)?;
        state.end()
    }
}

/// Package lists, one ordered sequence per manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packages {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apt: Vec<PackageEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flatpak: Vec<PackageEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snap: Vec<PackageEntry>,
}

impl Packages {
    pub fn is_empty(&self) -> bool {
        self.apt.is_empty() && self.flatpak.is_empty() && self.snap.is_empty()
    }

    pub fn for_manager(&self, manager: Manager) -> &[PackageEntry] {
        match manager {
            Manager::Apt => &self.apt,
            Manager::Flatpak => &self.flatpak,
            Manager::Snap => &self.snap,
        }
    }

    pub fn for_manager_mut(&mut self, manager: Manager) -> &mut Vec<PackageEntry> {
        match manager {
            Manager::Apt => &mut self.apt,
            Manager::Flatpak => &mut self.flatpak,
            Manager::Snap => &mut self.snap,
        }
    }

    /// Every entry with its manager, in section order.
    pub fn iter(&self) -> impl Iterator<Item = (Manager, &PackageEntry)> {
        Manager::ALL
            .into_iter()
            .flat_map(move |manager| self.for_manager(manager).iter().map(move |e| (manager, e)))
    }
}

/// A file to deploy.
///
/// Binaries share this shape; for them `source` is a download URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_permissions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_ownership: Option<bool>,
    /// The document this entry was declared in.
    #[serde(skip)]
    pub origin: Option<PathBuf>,
}

impl FileEntry {
    /// Directory that relative `source` paths are resolved against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.origin.as_deref().and_then(Path::parent)
    }
}

pub type BinaryEntry = FileEntry;

/// Desktop settings, keyed by dconf path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dconf {
    #[serde(
        default,
        deserialize_with = "de_scalar_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub settings: BTreeMap<String, String>,
}

impl Dconf {
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

/// The parsed contents of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(
        default,
        deserialize_with = "de_scalar",
        skip_serializing_if = "String::is_empty"
    )]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<IncludeSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub package_defaults: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_policy: Option<BackupPolicy>,
    #[serde(default, skip_serializing_if = "Repositories::is_empty")]
    pub repositories: Repositories,
    #[serde(default, skip_serializing_if = "Packages::is_empty")]
    pub packages: Packages,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, FileEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binaries: BTreeMap<String, BinaryEntry>,
    #[serde(default, skip_serializing_if = "Dconf::is_empty")]
    pub dconf: Dconf,
    #[serde(skip)]
    pub origins: Origins,
}

/// Declaring documents of the keyed values that carry no origin of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origins {
    pub version: Option<PathBuf>,
    /// Keyed by manager name.
    pub package_defaults: BTreeMap<String, PathBuf>,
    /// Keyed by dconf path.
    pub dconf: BTreeMap<String, PathBuf>,
}

impl Document {
    /// Record `origin` as the declaring document of everything in `self`.
    pub fn annotate_origin(&mut self, origin: &Path) {
        let origin = origin.to_path_buf();
        for entry in self.files.values_mut().chain(self.binaries.values_mut()) {
            entry.origin = Some(origin.clone());
        }
        for include in &mut self.includes {
            include.origin = Some(origin.clone());
        }
        for repository in &mut self.repositories.apt {
            repository.origin = Some(origin.clone());
        }
        for remote in &mut self.repositories.flatpak {
            remote.origin = Some(origin.clone());
        }
        for manager in Manager::ALL {
            for entry in self.packages.for_manager_mut(manager) {
                entry.origin = Some(origin.clone());
            }
        }

        if !self.version.is_empty() {
            self.origins.version = Some(origin.clone());
        }
        self.origins.package_defaults = self
            .package_defaults
            .keys()
            .map(|key| (key.clone(), origin.clone()))
            .collect();
        self.origins.dconf = self
            .dconf
            .settings
            .keys()
            .map(|key| (key.clone(), origin.clone()))
            .collect();
    }
}

/// Parses YAML text into a `Document`.
///
/// Empty input, or input containing only comments, yields an empty document.
pub fn parse(yaml_content: &str) -> std::result::Result<Document, serde_yaml::Error> {
    if is_blank(yaml_content) {
        return Ok(Document::default());
    }
    serde_yaml::from_str(yaml_content)
}

/// Reads and parses one document from disk, annotating entry origins.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut document = parse(&content).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    document.annotate_origin(path);
    Ok(document)
}

fn is_blank(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

fn scalar_to_string(value: Value) -> std::result::Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s)),
        Value::Sequence(_) => Err("expected a scalar, found a sequence".to_string()),
        Value::Mapping(_) => Err("expected a scalar, found a mapping".to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
    }
}

fn de_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value)
        .map(Option::unwrap_or_default)
        .map_err(D::Error::custom)
}

fn de_opt_scalar<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).map_err(D::Error::custom)
}

fn de_scalar_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error> {
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    let mut settings = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let value = scalar_to_string(value)
            .map_err(|e| D::Error::custom(format!("{}: {}", key, e)))?
            .unwrap_or_default();
        settings.insert(key, value);
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOCUMENT: &str = r#"
version: "1.2"
includes:
  - path: hosts/*.yaml
    description: per-host overrides
    optional: true
    conditions:
      - type: hostname
        value: laptop
        operator: contains
      - type: env
        value: NODE_ENV=production
package_defaults:
  apt: ["-y"]
backup_policy:
  enabled: true
  directory: ~/.local/share/machinecfg/backups
  keep: 5
repositories:
  apt:
    - name: neovim
      ppa: ppa:neovim-ppa/stable
  flatpak:
    - name: flathub
      url: https://dl.flathub.org/repo/flathub.flatpakrepo
packages:
  apt:
    - git
    - name: curl
      flags: ["--no-install-recommends"]
    - vim:
        flags: ["-q"]
  flatpak:
    - org.mozilla.firefox
  snap:
    - code
files:
  vimrc:
    source: dotfiles/vimrc
    destination: ~/.vimrc
    mode: "0644"
    backup: true
binaries:
  kubectl:
    source: https://dl.k8s.io/release/v1.30.0/bin/linux/amd64/kubectl
    destination: /usr/local/bin/kubectl
    mode: 755
dconf:
  settings:
    /org/gnome/desktop/interface/clock-show-seconds: true
    /org/gnome/desktop/interface/gtk-theme: "'Adwaita-dark'"
"#;

    #[test]
    fn test_parse_full_document() {
        let doc = parse(FULL_DOCUMENT).unwrap();

        assert_eq!(doc.version, "1.2");
        assert_eq!(doc.includes.len(), 1);
        let include = &doc.includes[0];
        assert_eq!(include.path, "hosts/*.yaml");
        assert!(include.optional);
        assert_eq!(include.conditions.len(), 2);
        assert_eq!(include.conditions[0].kind, ConditionKind::Hostname);
        assert_eq!(include.conditions[0].operator, Operator::Contains);
        assert_eq!(include.conditions[1].kind, ConditionKind::Env);
        assert_eq!(include.conditions[1].operator, Operator::Equals);

        assert_eq!(doc.package_defaults["apt"], vec!["-y".to_string()]);
        let backup = doc.backup_policy.as_ref().unwrap();
        assert_eq!(backup.enabled, Some(true));
        assert_eq!(backup.keep, Some(5));

        assert_eq!(doc.repositories.apt[0].ppa.as_deref(), Some("ppa:neovim-ppa/stable"));
        assert_eq!(doc.repositories.flatpak[0].name, "flathub");

        assert_eq!(doc.packages.apt.len(), 3);
        assert_eq!(doc.packages.apt[0], PackageEntry::new("git"));
        assert_eq!(
            doc.packages.apt[1],
            PackageEntry::with_flags("curl", ["--no-install-recommends"])
        );
        assert_eq!(doc.packages.apt[2], PackageEntry::with_flags("vim", ["-q"]));
        assert_eq!(doc.packages.flatpak[0].name, "org.mozilla.firefox");
        assert_eq!(doc.packages.snap[0].name, "code");

        assert_eq!(doc.files["vimrc"].mode.as_deref(), Some("0644"));
        assert_eq!(doc.binaries["kubectl"].mode.as_deref(), Some("755"));
        assert_eq!(
            doc.dconf.settings["/org/gnome/desktop/interface/clock-show-seconds"],
            "true"
        );
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(parse("").unwrap(), Document::default());
        assert_eq!(parse("# only a comment\n\n").unwrap(), Document::default());
    }

    #[test]
    fn test_parse_numeric_version() {
        let doc = parse("version: 2\n").unwrap();
        assert_eq!(doc.version, "2");
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(parse("packages: [unclosed").is_err());
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        assert!(parse("- just\n- a list\n").is_err());
    }

    #[test]
    fn test_unknown_condition_kind_and_operator_survive_parsing() {
        let doc = parse(
            r#"
includes:
  - path: extra.yaml
    conditions:
      - type: hostnme
        value: laptop
        operator: startswith
"#,
        )
        .unwrap();
        let condition = &doc.includes[0].conditions[0];
        assert_eq!(condition.kind, ConditionKind::Unknown("hostnme".to_string()));
        assert_eq!(condition.operator, Operator::Unknown("startswith".to_string()));
    }

    #[test]
    fn test_keyed_package_entry_requires_single_key() {
        let result = parse(
            r#"
packages:
  apt:
    - vim: {flags: ["-q"]}
      git: {}
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_package_entry_serializes_bare_name_without_flags() {
        let yaml = serde_yaml::to_string(&vec![
            PackageEntry::new("git"),
            PackageEntry::with_flags("curl", ["-y"]),
        ])
        .unwrap();
        assert!(yaml.contains("- git"));
        assert!(yaml.contains("name: curl"));
        assert!(yaml.contains("- -y"));
    }

    #[test]
    fn test_from_file_nonexistent() {
        let result = from_file("/nonexistent/machine.yaml");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_from_file_annotates_origin() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("machine.yaml");
        std::fs::write(
            &path,
            "version: '1.0'\nincludes:\n  - path: extra.yaml\npackages:\n  snap: [code]\nrepositories:\n  flatpak:\n    - name: flathub\nfiles:\n  vimrc:\n    source: vimrc\n    destination: ~/.vimrc\ndconf:\n  settings:\n    /a/b: '1'\n",
        )
        .unwrap();

        let doc = from_file(&path).unwrap();
        let origin = Some(path.as_path());
        assert_eq!(doc.files["vimrc"].origin.as_deref(), origin);
        assert_eq!(doc.files["vimrc"].base_dir(), Some(dir.path()));
        assert_eq!(doc.includes[0].origin.as_deref(), origin);
        assert_eq!(doc.packages.snap[0].origin.as_deref(), origin);
        assert_eq!(doc.repositories.flatpak[0].origin.as_deref(), origin);
        assert_eq!(doc.origins.version.as_deref(), origin);
        assert_eq!(doc.origins.dconf.get("/a/b").map(PathBuf::as_path), origin);
        assert!(doc.origins.package_defaults.is_empty());
    }

    #[test]
    fn test_from_file_parse_error_names_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "version: [1, 2\n").unwrap();

        let err = from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_manager_from_str() {
        assert_eq!("apt".parse::<Manager>(), Ok(Manager::Apt));
        assert_eq!("snap".parse::<Manager>(), Ok(Manager::Snap));
        assert!("brew".parse::<Manager>().is_err());
    }

    #[test]
    fn test_packages_iter_in_section_order() {
        let doc = parse("packages:\n  snap: [code]\n  apt: [git]\n").unwrap();
        let names: Vec<_> = doc
            .packages
            .iter()
            .map(|(m, e)| format!("{}:{}", m, e.name))
            .collect();
        assert_eq!(names, vec!["apt:git", "snap:code"]);
    }
}
