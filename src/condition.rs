//! Include condition evaluation.
//!
//! Each [`ConditionKind`] has one evaluation function. Unknown kinds fail
//! closed; unknown operators fall back to `equals`. A sequence of conditions
//! passes only if every condition holds, so an empty sequence always passes.

use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::config::{ConditionKind, IncludeCondition, Operator};
use crate::facts::HostFacts;

/// Returns true if every condition holds for `facts`.
pub fn all_hold(conditions: &[IncludeCondition], facts: &HostFacts) -> bool {
    conditions.iter().all(|condition| evaluate(condition, facts))
}

/// Evaluate a single condition.
pub fn evaluate(condition: &IncludeCondition, facts: &HostFacts) -> bool {
    let value = condition.value.as_str();
    let operator = &condition.operator;
    match &condition.kind {
        ConditionKind::Os => compare(&facts.os, value, operator),
        ConditionKind::Hostname => compare(&facts.hostname, value, operator),
        ConditionKind::Env => evaluate_env(value, operator, facts),
        ConditionKind::FileExists => expand_home(value).exists(),
        ConditionKind::DirExists => expand_home(value).is_dir(),
        ConditionKind::Unknown(kind) => {
            debug!("Unknown condition type '{}' evaluates to false", kind);
            false
        }
    }
}

/// `NAME=VALUE` compares the variable with the operator; a bare `NAME`
/// only checks that the variable is set. An unset variable never matches.
fn evaluate_env(value: &str, operator: &Operator, facts: &HostFacts) -> bool {
    match value.split_once('=') {
        Some((name, expected)) => match facts.env_var(name) {
            Some(actual) => compare(actual, expected, operator),
            None => false,
        },
        None => facts.env_var(value).is_some(),
    }
}

/// Apply `operator` to a fact and an expected value.
pub fn compare(actual: &str, expected: &str, operator: &Operator) -> bool {
    match operator {
        Operator::Equals | Operator::Unknown(_) => actual == expected,
        Operator::Contains => actual.contains(expected),
        Operator::NotEquals => actual != expected,
        Operator::NotContains => !actual.contains(expected),
        Operator::Matches => match Regex::new(expected) {
            Ok(re) => re.is_match(actual),
            Err(e) => {
                debug!("Condition pattern '{}' is not a valid regex: {}", expected, e);
                false
            }
        },
    }
}

fn expand_home(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(value).to_path_buf()
}
