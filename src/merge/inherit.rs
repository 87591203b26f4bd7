//! Rule-driven inheritance between parent and child documents
//!
//! Unlike the include loader's fixed per-section rules, this mode looks up
//! each top-level section in an [`InheritanceRules`] table and combines the
//! parent's and child's values with one of four patterns:
//!
//! - **Override**: the child's section replaces the parent's; the parent only
//!   fills sections the child does not declare.
//! - **Merge**: mappings are merged key by key, recursively; child values win
//!   per key and the parent supplies missing keys.
//! - **Append**: parent then child. Sequences are concatenated and
//!   deduplicated (by `name` when items carry one, else by value, first
//!   occurrence wins); mappings descend key-wise; scalars take the child.
//! - **Prepend**: child then parent, otherwise as Append.
//!
//! A table is a list of rules (`section` may be a glob, e.g. `package*`) with
//! a priority; the highest-priority matching rule decides, ties go to the
//! rule declared first, and unmatched sections use the table's default.
//!
//! ```yaml
//! default: override
//! rules:
//!   - section: packages
//!     pattern: append
//!     priority: 10
//!   - section: files
//!     pattern: merge
//! ```

use std::collections::HashSet;
use std::path::Path;

use glob::Pattern;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::config::Document;
use crate::error::{Error, Result};

/// How a section's parent and child values combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePattern {
    #[default]
    Override,
    Merge,
    Append,
    Prepend,
}

/// One entry of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRule {
    /// Section name or glob over section names.
    pub section: String,
    pub pattern: MergePattern,
    #[serde(default)]
    pub priority: i32,
}

impl SectionRule {
    fn matches(&self, section: &str) -> bool {
        self.section == section
            || Pattern::new(&self.section)
                .map(|pattern| pattern.matches(section))
                .unwrap_or(false)
    }
}

/// Section name to merge pattern table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceRules {
    /// Pattern for sections no rule matches.
    #[serde(default)]
    pub default: MergePattern,
    #[serde(default)]
    pub rules: Vec<SectionRule>,
}

impl InheritanceRules {
    pub fn new(default: MergePattern) -> Self {
        Self {
            default,
            rules: Vec::new(),
        }
    }

    /// Add a rule.
    pub fn with_rule(mut self, section: &str, pattern: MergePattern, priority: i32) -> Self {
        self.rules.push(SectionRule {
            section: section.to_string(),
            pattern,
            priority,
        });
        self
    }

    /// Parse a rule table from YAML and check its section globs.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        let rules: InheritanceRules = serde_yaml::from_str(yaml_content)?;
        for rule in &rules.rules {
            Pattern::new(&rule.section)?;
        }
        Ok(rules)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// The pattern that applies to `section`.
    pub fn pattern_for(&self, section: &str) -> MergePattern {
        let mut best: Option<&SectionRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.matches(section)) {
            if best.map_or(true, |current| rule.priority > current.priority) {
                best = Some(rule);
            }
        }
        best.map_or(self.default, |rule| rule.pattern)
    }
}

/// Combine one section's parent and child values.
pub fn apply_pattern(pattern: MergePattern, parent: Value, child: Value) -> Value {
    match pattern {
        MergePattern::Override => {
            if child.is_null() {
                parent
            } else {
                child
            }
        }
        MergePattern::Merge => deep_merge(parent, child),
        MergePattern::Append => combine(parent, child, false),
        MergePattern::Prepend => combine(child, parent, true),
    }
}

/// Recursively merge `child` over `parent`; child values win per key.
fn deep_merge(parent: Value, child: Value) -> Value {
    match (parent, child) {
        (parent, Value::Null) => parent,
        (Value::Mapping(mut parent_map), Value::Mapping(child_map)) => {
            for (key, child_value) in child_map {
                let merged = match parent_map.remove(&key) {
                    Some(parent_value) => deep_merge(parent_value, child_value),
                    None => child_value,
                };
                parent_map.insert(key, merged);
            }
            Value::Mapping(parent_map)
        }
        (_, child) => child,
    }
}

#[derive(PartialEq, Eq, Hash)]
enum ItemIdentity {
    Name(String),
    Value(Value),
}

fn item_identity(item: &Value) -> ItemIdentity {
    match item {
        Value::String(name) => ItemIdentity::Name(name.clone()),
        Value::Mapping(map) => match map.get("name").and_then(Value::as_str) {
            Some(name) => ItemIdentity::Name(name.to_string()),
            None => ItemIdentity::Value(item.clone()),
        },
        other => ItemIdentity::Value(other.clone()),
    }
}

/// Ordered combination of `first` then `second`. `first_is_child` says which
/// side wins when the values cannot be combined.
fn combine(first: Value, second: Value, first_is_child: bool) -> Value {
    match (first, second) {
        (Value::Null, second) => second,
        (first, Value::Null) => first,
        (Value::Sequence(first_items), Value::Sequence(second_items)) => {
            let mut seen = HashSet::new();
            let items = first_items
                .into_iter()
                .chain(second_items)
                .filter(|item| seen.insert(item_identity(item)))
                .collect();
            Value::Sequence(items)
        }
        (Value::Mapping(first_map), Value::Mapping(mut second_map)) => {
            let mut combined = Mapping::new();
            for (key, first_value) in first_map {
                let value = match second_map.remove(&key) {
                    Some(second_value) => combine(first_value, second_value, first_is_child),
                    None => first_value,
                };
                combined.insert(key, value);
            }
            for (key, second_value) in second_map {
                combined.insert(key, second_value);
            }
            Value::Mapping(combined)
        }
        (first, second) => {
            if first_is_child {
                first
            } else {
                second
            }
        }
    }
}

fn into_mapping(value: Value, role: &str) -> Result<Mapping> {
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        _ => Err(Error::Merge {
            section: "<root>".to_string(),
            message: format!("{} document must be a mapping", role),
        }),
    }
}

/// Combine a parent and a child document section by section.
pub fn inherit(rules: &InheritanceRules, parent: Value, child: Value) -> Result<Value> {
    let mut parent = into_mapping(parent, "parent")?;
    let child = into_mapping(child, "child")?;

    let mut result = Mapping::new();
    let mut child_sections = Vec::new();
    for (key, child_value) in child {
        child_sections.push((key, child_value));
    }

    // Parent section order first, then sections only the child declares.
    let parent_keys: Vec<Value> = parent.keys().cloned().collect();
    for key in parent_keys {
        let parent_value = parent.remove(&key).unwrap_or(Value::Null);
        let child_value = match child_sections.iter().position(|(k, _)| *k == key) {
            Some(index) => child_sections.remove(index).1,
            None => Value::Null,
        };
        let merged = merge_section(rules, &key, parent_value, child_value);
        result.insert(key, merged);
    }
    for (key, child_value) in child_sections {
        let merged = merge_section(rules, &key, Value::Null, child_value);
        result.insert(key, merged);
    }

    Ok(Value::Mapping(result))
}

fn merge_section(rules: &InheritanceRules, key: &Value, parent: Value, child: Value) -> Value {
    let pattern = match key.as_str() {
        Some(section) => rules.pattern_for(section),
        None => rules.default,
    };
    debug!("Section {:?} merges with {:?}", key, pattern);
    apply_pattern(pattern, parent, child)
}

/// Left-fold raw values: the first is the parent of the second, the result
/// is the parent of the third, and so on.
pub fn compose_values<I>(rules: &InheritanceRules, values: I) -> Result<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut values = values.into_iter();
    let mut composed = match values.next() {
        Some(first) => Value::Mapping(into_mapping(first, "parent")?),
        None => return Ok(Value::Mapping(Mapping::new())),
    };
    for value in values {
        composed = inherit(rules, composed, value)?;
    }
    Ok(composed)
}

/// Left-fold typed documents through the rule table.
pub fn compose(rules: &InheritanceRules, documents: &[Document]) -> Result<Document> {
    let values = documents
        .iter()
        .map(serde_yaml::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let composed = compose_values(rules, values)?;
    Ok(serde_yaml::from_value(composed)?)
}
