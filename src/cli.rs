//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// machinecfg - Resolve and validate layered machine documents
#[derive(Parser, Debug)]
#[command(name = "machinecfg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a machine document and everything it includes
    Validate(commands::validate::ValidateArgs),

    /// Print the merged document
    Resolve(commands::resolve::ResolveArgs),

    /// Show the effective flags for each package
    Flags(commands::flags::FlagsArgs),

    /// Display the include tree
    Tree(commands::tree::TreeArgs),

    /// Fold documents together with an inheritance rule set
    Compose(commands::compose::ComposeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Resolve(args) => commands::resolve::execute(args),
            Commands::Flags(args) => commands::flags::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Compose(args) => commands::compose::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under tests
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
