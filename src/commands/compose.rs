//! # Compose Command Implementation
//!
//! This module implements the `compose` subcommand, which folds an ordered
//! list of documents with an inheritance rule set instead of the include
//! merge rules. The first document is the base; each following document is
//! merged into the running result.
//!
//! Documents are read as they are. Their `includes` are not followed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use machinecfg::config::{self, Document};
use machinecfg::merge::inherit::{compose, InheritanceRules, MergePattern};

use super::resolve::DocumentFormat;

/// Fold documents together with an inheritance rule set
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Rule set file (`default:` plus `rules:` entries).
    ///
    /// Without a rule file every section uses the `override` pattern.
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Documents to fold, parent first.
    #[arg(value_name = "DOC", required = true)]
    pub documents: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = DocumentFormat::Yaml)]
    pub format: DocumentFormat,
}

/// Execute the `compose` command.
pub fn execute(args: ComposeArgs) -> Result<()> {
    let rules = match &args.rules {
        Some(path) => InheritanceRules::from_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => InheritanceRules::new(MergePattern::Override),
    };

    let documents = args
        .documents
        .iter()
        .map(|path| {
            config::from_file(path)
                .with_context(|| format!("Failed to load document {}", path.display()))
        })
        .collect::<Result<Vec<Document>>>()?;

    let composed = compose(&rules, &documents)?;
    match args.format {
        DocumentFormat::Yaml => print!("{}", serde_yaml::to_string(&composed)?),
        DocumentFormat::Json => println!("{}", serde_json::to_string_pretty(&composed)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_missing_document() {
        let args = ComposeArgs {
            rules: None,
            documents: vec![PathBuf::from("/nonexistent/a.yaml")],
            format: DocumentFormat::Yaml,
        };
        let error = execute(args).unwrap_err();
        assert!(error.to_string().contains("Failed to load document"));
    }

    #[test]
    fn test_execute_missing_rules() {
        let args = ComposeArgs {
            rules: Some(PathBuf::from("/nonexistent/rules.yaml")),
            documents: vec![PathBuf::from("/nonexistent/a.yaml")],
            format: DocumentFormat::Yaml,
        };
        let error = execute(args).unwrap_err();
        assert!(error.to_string().contains("Failed to load rules"));
    }
}
