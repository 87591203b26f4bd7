//! # Document Validation
//!
//! This module checks a merged [`Document`] and reports every problem it
//! finds. Findings never abort validation: each check runs regardless of
//! earlier ones, so a single run surfaces the complete set.
//!
//! ## Checks
//!
//! Checks run in a fixed order and findings keep that order:
//!
//! 1.  **Version**: presence, `MAJOR.MINOR[.PATCH]` syntax, supported major,
//!     and a warning when an unquoted number lost digits on parsing.
//! 2.  **Includes**: non-empty paths, known condition types and operators,
//!     compilable `matches` patterns.
//! 3.  **Repositories**: names, legacy versus structured apt sources, PPA
//!     syntax, flatpak remote URLs.
//! 4.  **Files and binaries**: required fields, source existence (files) or
//!     download URL (binaries), octal modes, destination traversal.
//! 5.  **Packages**: name syntax per manager, then names shared by managers.
//! 6.  **Flags**: dangerous and mutually exclusive flags on entries and in
//!     `package_defaults`.
//! 7.  **Desktop settings**: dconf key syntax.
//!
//! Each finding is located in the document that declared the offending item,
//! using a [`PositionIndex`] built on first use. List items are found there by
//! identity (package or repository name, include path) rather than by merged
//! index. Items with no recorded origin are looked up in the root. When a
//! document cannot be indexed the findings are still reported, without a
//! location.

pub mod rules;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::config::{
    ConditionKind, Document, FileEntry, IncludeSpec, Manager, Operator, PackageEntry,
};
use crate::error::Result;
use crate::position::{join_index, join_key, Position, PositionIndex};
use crate::suggestions::{did_you_mean, regex_hint};
use rules::Syntax;

/// Whether a finding blocks application of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: Severity,
    /// Stable short description, used for quick-fix lookup.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Dotted field path, e.g. `files.vimrc.source`.
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(
        kind: Severity,
        title: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            file: None,
            line: None,
            column: None,
            field: field.into(),
            value: None,
            message: message.into(),
            help: None,
            note: None,
            suggestion: None,
        }
    }

    pub fn error(
        title: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, title, field, message)
    }

    pub fn warning(
        title: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, title, field, message)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set help only if there is one.
    pub fn with_optional_help(mut self, help: Option<String>) -> Self {
        self.help = help;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn located(mut self, file: Option<&Path>, position: Option<Position>) -> Self {
        self.file = file.map(Path::to_path_buf);
        if let Some(position) = position {
            self.line = Some(position.line);
            self.column = Some(position.column);
        }
        self
    }

    /// `file:line:column`, or as much of it as is known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_ref().map(|f| f.display().to_string());
        match (file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => Some(format!("{file}:{line}:{column}")),
            (Some(file), Some(line), None) => Some(format!("{file}:{line}")),
            (Some(file), None, _) => Some(file),
            (None, Some(line), Some(column)) => Some(format!("{line}:{column}")),
            _ => None,
        }
    }
}

/// Errors and warnings from one validation run, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn push(&mut self, finding: ValidationError) {
        match finding.kind {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// False if and only if there are errors; warnings never affect it.
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Validates merged documents against one root document.
#[derive(Debug)]
pub struct Validator {
    root_path: Option<PathBuf>,
    root_dir: PathBuf,
    root_index: Option<PositionIndex>,
    origin_indexes: HashMap<PathBuf, Option<PositionIndex>>,
    syntax: Syntax,
}

impl Validator {
    /// Validator for the document tree rooted at `root_path`.
    pub fn new(root_path: &Path) -> Result<Self> {
        let root_path = std::fs::canonicalize(root_path).unwrap_or_else(|_| root_path.to_path_buf());
        let root_dir = root_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self {
            root_index: PositionIndex::from_file(&root_path),
            root_path: Some(root_path),
            root_dir,
            origin_indexes: HashMap::new(),
            syntax: Syntax::new()?,
        })
    }

    /// Validator for in-memory root text. Findings carry lines but no file.
    pub fn from_source(source: &str, root_dir: &Path) -> Result<Self> {
        Ok(Self {
            root_path: None,
            root_dir: root_dir.to_path_buf(),
            root_index: PositionIndex::parse(source),
            origin_indexes: HashMap::new(),
            syntax: Syntax::new()?,
        })
    }

    /// Run every check against `document`.
    pub fn validate(&mut self, document: &Document) -> ValidationResult {
        let mut result = ValidationResult::default();
        self.check_version(document, &mut result);
        self.check_includes(&document.includes, &mut result);
        self.check_repositories(document, &mut result);
        self.check_files(document, &mut result);
        self.check_packages(document, &mut result);
        self.check_flags(document, &mut result);
        self.check_dconf(document, &mut result);
        result
    }

    /// The declaring document's index, or the root's when the origin is
    /// unknown.
    fn index_for(&mut self, origin: Option<&Path>) -> Option<&PositionIndex> {
        match origin {
            Some(origin) if Some(origin) != self.root_path.as_deref() => self
                .origin_indexes
                .entry(origin.to_path_buf())
                .or_insert_with(|| PositionIndex::from_file(origin))
                .as_ref(),
            _ => self.root_index.as_ref(),
        }
    }

    /// Locate `finding` in the document that declared it and record it.
    ///
    /// Without a known origin the root is searched, and the root file is
    /// only attached when the finding is actually found there.
    fn report(
        &mut self,
        result: &mut ValidationResult,
        finding: ValidationError,
        origin: Option<&Path>,
        target: Target<'_>,
    ) {
        let position = self
            .index_for(origin)
            .and_then(|index| target.locate(index, &finding.field));
        let file = match origin {
            Some(origin) => Some(origin.to_path_buf()),
            None if position.is_some() => self.root_path.clone(),
            None => None,
        };
        result.push(finding.located(file.as_deref(), position));
    }

    fn check_version(&mut self, document: &Document, result: &mut ValidationResult) {
        let version = document.version.trim();
        let origin = document.origins.version.as_deref();
        if version.is_empty() {
            self.report(
                result,
                ValidationError::error(
                    "missing version field",
                    "version",
                    "the document does not declare a version",
                )
                .with_help("every root document must start with a version")
                .with_suggestion("version: \"1.0\""),
                origin,
                Target::Nearest,
            );
            return;
        }

        if !self.syntax.is_version(version) {
            self.report(
                result,
                ValidationError::error(
                    "invalid version format",
                    "version",
                    format!("'{}' is not a valid version", version),
                )
                .with_value(version)
                .with_help("use MAJOR.MINOR or MAJOR.MINOR.PATCH")
                .with_suggestion("version: \"1.0\""),
                origin,
                Target::Field,
            );
        } else if rules::is_unsupported_version(version) {
            self.report(
                result,
                ValidationError::warning(
                    "unsupported version",
                    "version",
                    format!("version {} is newer than this tool supports", version),
                )
                .with_value(version)
                .with_note(format!(
                    "supported major version: {}",
                    crate::defaults::SUPPORTED_MAJOR_VERSION
                )),
                origin,
                Target::Field,
            );
        }

        // An unquoted version is a YAML number, so `1.10` arrives as `1.1`.
        let written = self
            .index_for(origin)
            .and_then(|index| index.scalar("version"))
            .map(|written| written.trim().to_string());
        if let Some(written) = written.filter(|written| written != version) {
            self.report(
                result,
                ValidationError::warning(
                    "numeric version",
                    "version",
                    format!("version {} was read as the number {}", written, version),
                )
                .with_value(written.as_str())
                .with_help("quote the version so it is kept as written")
                .with_suggestion(format!("version: \"{}\"", written)),
                origin,
                Target::Field,
            );
        }
    }

    fn check_includes(&mut self, includes: &[IncludeSpec], result: &mut ValidationResult) {
        for (i, include) in includes.iter().enumerate() {
            let field = join_index("includes", i);
            let origin = include.origin.as_deref();

            if include.path.trim().is_empty() {
                self.report(
                    result,
                    ValidationError::error(
                        "empty include path",
                        join_key(&field, "path"),
                        "include path must not be empty",
                    )
                    .with_help("point the include at a file, a directory, or a glob"),
                    origin,
                    Target::item("includes", "path", &include.path, "path"),
                );
            }

            for (j, condition) in include.conditions.iter().enumerate() {
                let member = join_index("conditions", j);
                let field = join_index(&join_key(&field, "conditions"), j);

                if let ConditionKind::Unknown(kind) = &condition.kind {
                    let member = join_key(&member, "type");
                    self.report(
                        result,
                        ValidationError::error(
                            "invalid condition type",
                            join_key(&field, "type"),
                            format!("unknown condition type '{}'", kind),
                        )
                        .with_value(kind.as_str())
                        .with_optional_help(did_you_mean(kind, &ConditionKind::NAMES))
                        .with_note(format!("valid types: {}", ConditionKind::NAMES.join(", "))),
                        origin,
                        Target::item("includes", "path", &include.path, &member),
                    );
                }

                if let Operator::Unknown(operator) = &condition.operator {
                    let member = join_key(&member, "operator");
                    self.report(
                        result,
                        ValidationError::error(
                            "invalid condition operator",
                            join_key(&field, "operator"),
                            format!("unknown condition operator '{}'", operator),
                        )
                        .with_value(operator.as_str())
                        .with_optional_help(did_you_mean(operator, &Operator::NAMES))
                        .with_note(format!("valid operators: {}", Operator::NAMES.join(", "))),
                        origin,
                        Target::item("includes", "path", &include.path, &member),
                    );
                }

                let member = join_key(&member, "value");
                if condition.value.trim().is_empty() {
                    self.report(
                        result,
                        ValidationError::error(
                            "empty condition value",
                            join_key(&field, "value"),
                            format!("a '{}' condition needs a value", condition.kind),
                        ),
                        origin,
                        Target::item("includes", "path", &include.path, &member),
                    );
                } else if condition.operator == Operator::Matches {
                    if let Err(e) = Regex::new(&condition.value) {
                        self.report(
                            result,
                            ValidationError::error(
                                "invalid condition pattern",
                                join_key(&field, "value"),
                                format!("'{}' is not a valid regular expression", condition.value),
                            )
                            .with_value(condition.value.as_str())
                            .with_help(regex_hint(&e))
                            .with_note(e.to_string()),
                            origin,
                            Target::item("includes", "path", &include.path, &member),
                        );
                    }
                }
            }
        }
    }

    fn check_repositories(&mut self, document: &Document, result: &mut ValidationResult) {
        for (i, repository) in document.repositories.apt.iter().enumerate() {
            let field = join_index("repositories.apt", i);
            let origin = repository.origin.as_deref();

            if repository.name.trim().is_empty() {
                self.report(
                    result,
                    ValidationError::error(
                        "missing repository name",
                        join_key(&field, "name"),
                        "apt repository has no name",
                    ),
                    origin,
                    Target::item("repositories.apt", "name", &repository.name, "name"),
                );
            }

            if repository.ppa.is_some() && repository.uri.is_some() {
                self.report(
                    result,
                    ValidationError::error(
                        "conflicting repository fields",
                        field.as_str(),
                        format!(
                            "repository '{}' sets both `ppa` and `uri`",
                            repository.name
                        ),
                    )
                    .with_help("a repository is either a PPA or a one-line source"),
                    origin,
                    Target::item("repositories.apt", "name", &repository.name, ""),
                );
            }

            let legacy = repository.has_legacy_fields();
            let structured = repository.has_structured_fields();
            if legacy && structured {
                self.report(
                    result,
                    ValidationError::error(
                        "mixed repository formats",
                        field.as_str(),
                        format!(
                            "repository '{}' combines legacy and structured fields",
                            repository.name
                        ),
                    )
                    .with_note("legacy fields: ppa, uri; structured fields: uris, suites, components"),
                    origin,
                    Target::item("repositories.apt", "name", &repository.name, ""),
                );
            } else if !legacy && (repository.uris.is_empty() || repository.suites.is_empty()) {
                self.report(
                    result,
                    ValidationError::error(
                        "incomplete repository definition",
                        field.as_str(),
                        format!("repository '{}' has no usable source", repository.name),
                    )
                    .with_help("set `ppa`, `uri`, or both `uris` and `suites`"),
                    origin,
                    Target::item("repositories.apt", "name", &repository.name, ""),
                );
            }

            if let Some(ppa) = &repository.ppa {
                if !self.syntax.is_ppa(ppa) {
                    self.report(
                        result,
                        ValidationError::error(
                            "invalid ppa format",
                            join_key(&field, "ppa"),
                            format!("'{}' is not a PPA reference", ppa),
                        )
                        .with_value(ppa.as_str())
                        .with_suggestion("ppa: ppa:owner/name"),
                        origin,
                        Target::item("repositories.apt", "name", &repository.name, "ppa"),
                    );
                }
            }

            if let Some(key_url) = &repository.key_url {
                if !rules::is_http_url(key_url) {
                    self.report(
                        result,
                        ValidationError::error(
                            "invalid repository url",
                            join_key(&field, "key_url"),
                            format!("'{}' is not an http(s) URL", key_url),
                        )
                        .with_value(key_url.as_str()),
                        origin,
                        Target::item("repositories.apt", "name", &repository.name, "key_url"),
                    );
                }
            }
        }

        for (i, remote) in document.repositories.flatpak.iter().enumerate() {
            let field = join_index("repositories.flatpak", i);
            let origin = remote.origin.as_deref();

            if remote.name.trim().is_empty() {
                self.report(
                    result,
                    ValidationError::error(
                        "missing repository name",
                        join_key(&field, "name"),
                        "flatpak remote has no name",
                    ),
                    origin,
                    Target::item("repositories.flatpak", "name", &remote.name, "name"),
                );
            }

            if remote.url.trim().is_empty() {
                self.report(
                    result,
                    ValidationError::error(
                        "missing repository url",
                        join_key(&field, "url"),
                        format!("flatpak remote '{}' has no url", remote.name),
                    ),
                    origin,
                    Target::item("repositories.flatpak", "name", &remote.name, "url"),
                );
            } else if !rules::is_http_url(&remote.url) {
                self.report(
                    result,
                    ValidationError::error(
                        "invalid repository url",
                        join_key(&field, "url"),
                        format!("'{}' is not an http(s) URL", remote.url),
                    )
                    .with_value(remote.url.as_str()),
                    origin,
                    Target::item("repositories.flatpak", "name", &remote.name, "url"),
                );
            }
        }
    }

    fn check_files(&mut self, document: &Document, result: &mut ValidationResult) {
        for (id, entry) in &document.files {
            self.check_entry("files", id, entry, false, result);
        }
        for (id, entry) in &document.binaries {
            self.check_entry("binaries", id, entry, true, result);
        }
    }

    fn check_entry(
        &mut self,
        section: &str,
        id: &str,
        entry: &FileEntry,
        binary: bool,
        result: &mut ValidationResult,
    ) {
        let field = join_key(section, id);
        let origin = entry.origin.as_deref();

        if entry.source.trim().is_empty() {
            self.report(
                result,
                ValidationError::error(
                    "missing source field",
                    join_key(&field, "source"),
                    format!("'{}' has no source", id),
                ),
                origin,
                Target::Nearest,
            );
        } else if binary {
            if !rules::is_http_url(&entry.source) {
                self.report(
                    result,
                    ValidationError::error(
                        "invalid binary url",
                        join_key(&field, "source"),
                        format!("binary '{}' must be downloaded from an http(s) URL", id),
                    )
                    .with_value(entry.source.as_str()),
                    origin,
                    Target::Field,
                );
            }
        } else {
            let base_dir = entry.base_dir().unwrap_or(&self.root_dir).to_path_buf();
            let resolved = resolve_source(&base_dir, &entry.source);
            if !resolved.exists() {
                self.report(
                    result,
                    ValidationError::error(
                        "source file not found",
                        join_key(&field, "source"),
                        format!("source '{}' of '{}' does not exist", entry.source, id),
                    )
                    .with_value(resolved.display().to_string())
                    .with_note(format!(
                        "relative sources are resolved against {}",
                        base_dir.display()
                    )),
                    origin,
                    Target::Field,
                );
            }
        }

        if entry.destination.trim().is_empty() {
            self.report(
                result,
                ValidationError::error(
                    "missing destination field",
                    join_key(&field, "destination"),
                    format!("'{}' has no destination", id),
                ),
                origin,
                Target::Nearest,
            );
        } else if rules::has_parent_traversal(&entry.destination) {
            self.report(
                result,
                ValidationError::error(
                    "unsafe destination path",
                    join_key(&field, "destination"),
                    format!("destination of '{}' contains '..'", id),
                )
                .with_value(entry.destination.as_str())
                .with_help("use an absolute path or a path under ~/"),
                origin,
                Target::Field,
            );
        }

        if let Some(mode) = &entry.mode {
            if !self.syntax.is_file_mode(mode) {
                self.report(
                    result,
                    ValidationError::error(
                        "invalid file mode",
                        join_key(&field, "mode"),
                        format!("'{}' is not an octal file mode", mode),
                    )
                    .with_value(mode.as_str())
                    .with_help("use three or four octal digits, e.g. \"0644\""),
                    origin,
                    Target::Field,
                );
            } else if rules::is_world_writable(mode) {
                self.report(
                    result,
                    ValidationError::warning(
                        "world-writable file mode",
                        join_key(&field, "mode"),
                        format!("mode {} lets any user modify '{}'", mode, id),
                    )
                    .with_value(mode.as_str())
                    .with_help("drop write permission for others, e.g. \"0644\" or \"0755\""),
                    origin,
                    Target::Field,
                );
            }
        }
    }

    fn check_packages(&mut self, document: &Document, result: &mut ValidationResult) {
        for (manager, i, entry) in indexed_packages(document) {
            let list = join_key("packages", manager.as_str());
            let field = join_index(&list, i);
            let target = Target::package(&list, entry, "");
            let name = entry.name.trim();

            if name.is_empty() {
                self.report(
                    result,
                    ValidationError::error(
                        "empty package name",
                        field,
                        format!("{} package entry has no name", manager),
                    ),
                    entry.origin.as_deref(),
                    target,
                );
            } else if !self.syntax.is_package_name(manager, name) {
                self.report(
                    result,
                    ValidationError::error(
                        "invalid package name",
                        field,
                        format!("'{}' is not a valid {} package name", name, manager),
                    )
                    .with_value(name)
                    .with_help(package_name_help(manager)),
                    entry.origin.as_deref(),
                    target,
                );
            }
        }

        let mut first_seen: BTreeMap<&str, Manager> = BTreeMap::new();
        for (manager, i, entry) in indexed_packages(document) {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            match first_seen.get(name) {
                Some(first) if *first != manager => {
                    let list = join_key("packages", manager.as_str());
                    let finding = ValidationError::warning(
                        "duplicate package across managers",
                        join_index(&list, i),
                        format!("'{}' is listed for both {} and {}", name, first, manager),
                    )
                    .with_value(name)
                    .with_help("install each package through one manager");
                    self.report(
                        result,
                        finding,
                        entry.origin.as_deref(),
                        Target::package(&list, entry, ""),
                    );
                }
                Some(_) => {}
                None => {
                    first_seen.insert(name, manager);
                }
            }
        }
    }

    fn check_flags(&mut self, document: &Document, result: &mut ValidationResult) {
        for (manager, i, entry) in indexed_packages(document) {
            if entry.flags.is_empty() {
                continue;
            }
            let list = join_key("packages", manager.as_str());
            let field = join_key(&join_index(&list, i), "flags");
            self.check_flag_list(
                manager,
                &field,
                &entry.flags,
                entry.origin.as_deref(),
                Target::package(&list, entry, "flags"),
                result,
            );
        }

        for (key, flags) in &document.package_defaults {
            let field = join_key("package_defaults", key);
            let origin = document.origins.package_defaults.get(key).map(PathBuf::as_path);
            match key.parse::<Manager>() {
                Ok(manager) => {
                    self.check_flag_list(manager, &field, flags, origin, Target::Field, result)
                }
                Err(message) => {
                    let names: Vec<&str> = Manager::ALL.iter().map(Manager::as_str).collect();
                    self.report(
                        result,
                        ValidationError::warning("unknown package manager", field, message)
                            .with_value(key.as_str())
                            .with_optional_help(did_you_mean(key, &names))
                            .with_note(format!("known managers: {}", names.join(", "))),
                        origin,
                        Target::Field,
                    );
                }
            }
        }
    }

    fn check_flag_list(
        &mut self,
        manager: Manager,
        field: &str,
        flags: &[String],
        origin: Option<&Path>,
        target: Target<'_>,
        result: &mut ValidationResult,
    ) {
        for (flag, reason) in rules::dangerous_flags(manager, flags) {
            self.report(
                result,
                ValidationError::warning(
                    "dangerous package flag",
                    field,
                    format!("{} flag '{}' {}", manager, flag, reason),
                )
                .with_value(flag),
                origin,
                target,
            );
        }
        for (left, right) in rules::conflicting_flags(manager, flags) {
            self.report(
                result,
                ValidationError::error(
                    "conflicting package flags",
                    field,
                    format!("{} flags '{}' and '{}' cannot be combined", manager, left, right),
                )
                .with_value(format!("{}, {}", left, right)),
                origin,
                target,
            );
        }
    }

    fn check_dconf(&mut self, document: &Document, result: &mut ValidationResult) {
        for key in document.dconf.settings.keys() {
            if !rules::is_dconf_path(key) {
                let finding = ValidationError::error(
                    "invalid dconf path",
                    join_key("dconf.settings", key),
                    format!("'{}' is not a valid dconf path", key),
                )
                .with_value(key.as_str())
                .with_help("dconf paths start with '/' and contain no empty segments");
                let finding = if key.starts_with('/') {
                    finding
                } else {
                    finding.with_suggestion(format!("/{}", key))
                };
                let origin = document.origins.dconf.get(key).map(PathBuf::as_path);
                self.report(result, finding, origin, Target::Field);
            }
        }
    }
}

/// Where a finding sits in the document that declared it.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    /// The finding's own field.
    Field,
    /// The closest existing parent of the finding's field, for absent fields.
    Nearest,
    /// `member` of the item in `list` identified by `identity`, or the item
    /// itself when the member is absent. Items are matched by identity, not
    /// by merged index.
    Item {
        list: &'a str,
        key: &'a str,
        identity: &'a str,
        member: &'a str,
    },
}

impl<'a> Target<'a> {
    fn item(list: &'a str, key: &'a str, identity: &'a str, member: &'a str) -> Self {
        Target::Item {
            list,
            key,
            identity,
            member,
        }
    }

    fn package(list: &'a str, entry: &'a PackageEntry, member: &'a str) -> Self {
        Self::item(list, "name", &entry.name, member)
    }

    fn locate(self, index: &PositionIndex, field: &str) -> Option<Position> {
        match self {
            Target::Field => index.locate(field),
            Target::Nearest => index.locate_nearest(field),
            Target::Item {
                list,
                key,
                identity,
                member,
            } => {
                let item = join_index(list, index.find_item(list, key, identity)?);
                if member.is_empty() {
                    index.locate(&item)
                } else {
                    index.locate_nearest(&format!("{}.{}", item, member))
                }
            }
        }
    }
}

/// Validate a merged document against the root document it was loaded from.
pub fn validate(document: &Document, root_path: &Path) -> Result<ValidationResult> {
    Ok(Validator::new(root_path)?.validate(document))
}

fn indexed_packages(
    document: &Document,
) -> impl Iterator<Item = (Manager, usize, &PackageEntry)> {
    Manager::ALL.into_iter().flat_map(move |manager| {
        document
            .packages
            .for_manager(manager)
            .iter()
            .enumerate()
            .map(move |(i, entry)| (manager, i, entry))
    })
}

fn package_name_help(manager: Manager) -> &'static str {
    match manager {
        Manager::Apt => {
            "use lowercase letters, digits, '.', '+' and '-', or a path to a .deb archive"
        }
        Manager::Flatpak => "use a reverse-domain application ID such as org.mozilla.firefox",
        Manager::Snap => "use lowercase letters, digits and '-'",
    }
}

fn resolve_source(base_dir: &Path, source: &str) -> PathBuf {
    if let Some(rest) = source.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = Path::new(source);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
