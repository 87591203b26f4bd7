//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which prints the merged
//! document produced by following every include from the root document.
//! Conditional includes are evaluated against the current host.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::{Args, ValueEnum};

use machinecfg::config::Document;

use super::DocumentArgs;

/// Serialization format for the merged document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

/// Print the merged document
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
    pub format: DocumentFormat,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs) -> Result<()> {
    let path = args.document.document_path();
    let (document, _) = super::load_tree(&path)?;
    print!("{}", render(&document, args.format)?);
    Ok(())
}

fn render(document: &Document, format: DocumentFormat) -> Result<String> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::to_string(document)?,
        DocumentFormat::Json => format!("{}\n", serde_json::to_string_pretty(document)?),
    })
}
