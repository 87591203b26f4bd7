//! Compiler-style rendering of validation results.
//!
//! Each finding renders as a block:
//!
//! ```text
//! error: source file not found
//!   --> /home/me/machine/machine.yaml:9:5
//!    = field: files.vimrc.source
//!    = value: /home/me/machine/dotfiles/vimrc
//!   source 'dotfiles/vimrc' of 'vimrc' does not exist
//!   help: ...
//!   note: ...
//!   suggestion: ...
//! ```
//!
//! A summary line follows the blocks, and when there are errors, a
//! quick-fix section lists one-line remediations for the first few of them.

use std::fmt::Write as _;

use console::Style;

use crate::output::{paint, OutputConfig};
use crate::suggestions::quick_fix;
use crate::validation::{Severity, ValidationError, ValidationResult};

/// Errors considered for the quick-fix section.
pub const MAX_QUICK_FIXES: usize = 5;

/// Renders findings as text.
#[derive(Debug, Clone)]
pub struct DiagnosticFormatter {
    output: OutputConfig,
    quick_fixes: bool,
}

impl DiagnosticFormatter {
    pub fn new(output: OutputConfig) -> Self {
        Self {
            output,
            quick_fixes: true,
        }
    }

    /// Enable or disable the quick-fix section.
    pub fn with_quick_fixes(mut self, enabled: bool) -> Self {
        self.quick_fixes = enabled;
        self
    }

    fn paint(&self, text: &str, style: Style) -> String {
        paint(&self.output, text, &style)
    }

    /// Render one finding.
    pub fn format_finding(&self, finding: &ValidationError) -> String {
        let mut out = String::new();
        let label = match finding.kind {
            Severity::Error => self.paint("error", Style::new().red().bold()),
            Severity::Warning => self.paint("warning", Style::new().yellow().bold()),
        };
        let _ = writeln!(out, "{}: {}", label, self.paint(&finding.title, Style::new().bold()));

        let gutter = self.paint("-->", Style::new().blue().bold());
        if let Some(location) = finding.location() {
            let _ = writeln!(out, "  {} {}", gutter, location);
        }

        let bar = self.paint("=", Style::new().blue().bold());
        if !finding.field.is_empty() {
            let _ = writeln!(out, "   {} field: {}", bar, finding.field);
        }
        if let Some(value) = &finding.value {
            let _ = writeln!(out, "   {} value: {}", bar, value);
        }

        let _ = writeln!(out, "  {}", finding.message);

        let extras = [
            ("help", &finding.help, Style::new().cyan().bold()),
            ("note", &finding.note, Style::new().bold()),
            ("suggestion", &finding.suggestion, Style::new().green().bold()),
        ];
        for (name, text, style) in extras {
            if let Some(text) = text {
                let _ = writeln!(out, "  {}: {}", self.paint(name, style), text);
            }
        }
        out
    }

    /// One-line outcome, e.g. `validation failed: 3 errors, 1 warning`.
    pub fn format_summary(&self, result: &ValidationResult) -> String {
        let counts = format!(
            "{}, {}",
            plural(result.errors.len(), "error"),
            plural(result.warnings.len(), "warning")
        );
        if result.has_errors() {
            format!(
                "{}: {}",
                self.paint("validation failed", Style::new().red().bold()),
                counts
            )
        } else {
            format!(
                "{}: {}",
                self.paint("validation passed", Style::new().green().bold()),
                counts
            )
        }
    }

    /// Render every finding, errors first, then the summary and quick fixes.
    pub fn format_result(&self, result: &ValidationResult) -> String {
        let mut out = String::new();
        for finding in result.errors.iter().chain(&result.warnings) {
            out.push_str(&self.format_finding(finding));
            out.push('\n');
        }
        out.push_str(&self.format_summary(result));
        out.push('\n');

        if self.quick_fixes {
            let fixes = quick_fixes(result);
            if !fixes.is_empty() {
                let _ = writeln!(out, "\n{}", self.paint("quick fixes:", Style::new().bold()));
                for (i, fix) in fixes.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, fix);
                }
            }
        }
        out
    }
}

/// Remediation hints for the first [`MAX_QUICK_FIXES`] errors that have one.
pub fn quick_fixes(result: &ValidationResult) -> Vec<String> {
    result
        .errors
        .iter()
        .take(MAX_QUICK_FIXES)
        .filter_map(quick_fix)
        .collect()
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
