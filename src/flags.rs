//! Tiered flag resolution.
//!
//! The effective flags for one package entry come from the first tier that
//! provides them:
//!
//! 1. the entry's own `flags`, if non-empty;
//! 2. the user-level `package_defaults` for the entry's manager, if present;
//! 3. the built-in defaults for the manager.
//!
//! Each entry is resolved independently; a user default for one manager
//! never affects another.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{Document, Manager, PackageEntry};
use crate::defaults::builtin_flags;

/// Which tier supplied a package's effective flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    Entry,
    UserDefault,
    Builtin,
}

/// A package with its effective flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub manager: Manager,
    pub name: String,
    pub flags: Vec<String>,
    pub source: FlagSource,
}

/// Resolve the effective flags for `entry`.
pub fn resolve_flags(
    entry: &PackageEntry,
    manager: Manager,
    user_defaults: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    resolve_with_source(entry, manager, user_defaults).0
}

fn resolve_with_source(
    entry: &PackageEntry,
    manager: Manager,
    user_defaults: &BTreeMap<String, Vec<String>>,
) -> (Vec<String>, FlagSource) {
    if !entry.flags.is_empty() {
        return (entry.flags.clone(), FlagSource::Entry);
    }
    if let Some(defaults) = user_defaults.get(manager.as_str()) {
        return (defaults.clone(), FlagSource::UserDefault);
    }
    (
        builtin_flags(manager).iter().map(|f| f.to_string()).collect(),
        FlagSource::Builtin,
    )
}

/// Resolve every package in `document`, in section order.
pub fn resolve_all(document: &Document) -> Vec<ResolvedPackage> {
    document
        .packages
        .iter()
        .map(|(manager, entry)| {
            let (flags, source) = resolve_with_source(entry, manager, &document.package_defaults);
            ResolvedPackage {
                manager,
                name: entry.name.clone(),
                flags,
                source,
            }
        })
        .collect()
}
