//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! It also holds the quick-fix table used by the diagnostic formatter: each
//! validation title maps to a one-line remediation, with `{field}` and
//! `{value}` filled in from the finding.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::validation::ValidationError;

/// Title to remediation template.
const QUICK_FIXES: &[(&str, &str)] = &[
    (
        "missing version field",
        "add `version: \"1.0\"` at the top of the document",
    ),
    (
        "invalid version format",
        "write the version as MAJOR.MINOR or MAJOR.MINOR.PATCH, e.g. `version: \"1.0\"`",
    ),
    ("empty include path", "give {field} a path or remove the include"),
    (
        "invalid condition type",
        "use a supported condition type in {field} (os, hostname, env, file_exists, dir_exists)",
    ),
    (
        "invalid condition operator",
        "use a supported operator in {field} (equals, contains, matches, not_equals, not_contains)",
    ),
    (
        "invalid condition pattern",
        "fix the regular expression '{value}' in {field}",
    ),
    ("empty condition value", "set {field} or remove the condition"),
    ("missing repository name", "add a `name` to {field}"),
    (
        "conflicting repository fields",
        "keep either `ppa` or `uri` in {field}, not both",
    ),
    (
        "mixed repository formats",
        "use either the legacy (`ppa`/`uri`) or the structured (`uris`/`suites`) form in {field}",
    ),
    (
        "incomplete repository definition",
        "add `ppa`, `uri`, or `uris` with `suites` to {field}",
    ),
    ("invalid ppa format", "write the PPA as `ppa:owner/name`"),
    ("missing repository url", "add a `url` to {field}"),
    ("invalid repository url", "use an http(s) URL for {field}"),
    ("missing source field", "add `source:` to {field}"),
    ("missing destination field", "add `destination:` to {field}"),
    (
        "source file not found",
        "create {value} or correct the source path",
    ),
    ("invalid binary url", "use an http(s) download URL for {field}"),
    ("invalid file mode", "use an octal mode such as `mode: \"0644\"`"),
    ("unsafe destination path", "remove `..` from {value}"),
    ("empty package name", "remove the empty entry at {field}"),
    ("invalid package name", "check the spelling of '{value}'"),
    (
        "conflicting package flags",
        "keep only one of the conflicting flags in {field}",
    ),
    (
        "invalid dconf path",
        "start the key with `/` and avoid `//`: {value}",
    ),
];

/// One-line remediation for a finding, if its title is in the table.
pub fn quick_fix(finding: &ValidationError) -> Option<String> {
    QUICK_FIXES
        .iter()
        .find(|(title, _)| *title == finding.title)
        .map(|(_, template)| {
            template
                .replace("{field}", &finding.field)
                .replace("{value}", finding.value.as_deref().unwrap_or(""))
        })
}

/// Generate an error for when the root document is not found.
///
/// Includes hints about:
/// - Creating a new document
/// - Using the -c/--config flag
/// - Using the MACHINECFG_CONFIG environment variable
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Machine document not found: {path}\n\n\
         hint: Create a machine.yaml file in the current directory\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set MACHINECFG_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for a circular include.
///
/// Includes hints about how to break the cycle.
pub fn circular_include(chain: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Circular include detected: {chain}\n\n\
         hint: Remove one of the 'includes' entries to break the cycle\n\
         hint: Move the shared settings into a fragment that includes nothing"
    )
}

/// Hint for a regular expression that failed to compile.
pub fn regex_hint(error: &regex::Error) -> &'static str {
    match error {
        regex::Error::Syntax(msg) if msg.contains("unclosed") => {
            "check for unclosed brackets, parentheses, or braces"
        }
        regex::Error::Syntax(msg) if msg.contains("repetition") => {
            "repetition operators (+, *, ?) must follow a pattern"
        }
        _ => "test the pattern at https://regex101.com (select the Rust flavor)",
    }
}

/// "did you mean" text for `input`, if a candidate is close enough.
pub fn did_you_mean(input: &str, candidates: &[&str]) -> Option<String> {
    find_similar(input, candidates).map(|s| format!("did you mean '{s}'?"))
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
