//! # Flags Command Implementation
//!
//! This module implements the `flags` subcommand, which shows the effective
//! invocation flags for every package in the merged document together with
//! the tier that supplied them (entry, user default, or built-in).

use anyhow::Result;
use clap::Args;

use machinecfg::config::Manager;
use machinecfg::flags::{resolve_all, FlagSource, ResolvedPackage};

use super::DocumentArgs;

/// Show the effective flags for each package
#[derive(Args, Debug)]
pub struct FlagsArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Only show packages for this manager (apt, flatpak, snap).
    #[arg(long, value_name = "MANAGER")]
    pub manager: Option<Manager>,

    /// Print the resolution as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `flags` command.
pub fn execute(args: FlagsArgs) -> Result<()> {
    let path = args.document.document_path();
    let (document, _) = super::load_tree(&path)?;

    let packages: Vec<ResolvedPackage> = resolve_all(&document)
        .into_iter()
        .filter(|package| args.manager.is_none_or(|m| m == package.manager))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    if packages.is_empty() {
        println!("No packages declared in {}", path.display());
        return Ok(());
    }
    for line in render(&packages) {
        println!("{}", line);
    }
    Ok(())
}

fn render(packages: &[ResolvedPackage]) -> Vec<String> {
    let width = packages
        .iter()
        .map(|package| package.name.len())
        .max()
        .unwrap_or(0);
    packages
        .iter()
        .map(|package| {
            let flags = if package.flags.is_empty() {
                "(none)".to_string()
            } else {
                package.flags.join(" ")
            };
            format!(
                "{:<7} {:<width$}  {}  [{}]",
                package.manager.as_str(),
                package.name,
                flags,
                source_label(package.source),
                width = width
            )
        })
        .collect()
}

fn source_label(source: FlagSource) -> &'static str {
    match source {
        FlagSource::Entry => "entry",
        FlagSource::UserDefault => "user default",
        FlagSource::Builtin => "built-in",
    }
}
