//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which loads the document
//! tree, merges it, and checks the merged document without applying it.
//!
//! ## Functionality
//!
//! - **Load checks**: unreadable documents, parse failures, unresolved
//!   required includes and include cycles abort with a single error.
//! - **Document checks**: every validation check runs and all findings are
//!   reported as compiler-style diagnostics on stderr.
//! - **Exit status**: 0 when there are no errors, 1 otherwise. Warnings are
//!   printed but only fail the run with `--strict`.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use machinecfg::diagnostics::DiagnosticFormatter;
use machinecfg::output::{emoji, OutputConfig};
use machinecfg::validation::{ValidationResult, Validator};

use super::DocumentArgs;

/// Report format for validation results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Compiler-style diagnostics
    #[default]
    Text,
    /// Machine-readable JSON on stdout
    Json,
}

/// Validate a machine document and everything it includes
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Output format for the findings.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,

    /// Omit the quick-fix section from text output.
    #[arg(long)]
    pub no_quick_fixes: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    valid: bool,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let path = args.document.document_path();
    log::info!("Validating {}", path.display());

    let (document, tree) = super::load_tree(&path)?;
    let result = Validator::new(&path)?.validate(&document);
    let failed = result.has_errors() || (args.strict && result.has_warnings());

    match args.format {
        ReportFormat::Json => {
            let report = JsonReport {
                valid: !failed,
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReportFormat::Text => {
            if !result.is_empty() {
                let formatter =
                    DiagnosticFormatter::new(out.clone()).with_quick_fixes(!args.no_quick_fixes);
                eprint!("{}", formatter.format_result(&result));
            }
            if !failed {
                println!(
                    "{} {} is valid ({} documents loaded)",
                    emoji(&out, "✅", "[OK]"),
                    path.display(),
                    tree.document_count()
                );
            }
        }
    }

    if result.has_errors() {
        return Err(anyhow!(
            "Validation failed with {} error(s)",
            result.errors.len()
        ));
    }
    if failed {
        return Err(anyhow!(
            "Validation failed: {} warning(s) in strict mode",
            result.warnings.len()
        ));
    }
    Ok(())
}
