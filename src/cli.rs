use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "protopath", version, about)]
pub struct Args {
    /// Path to protopath.toml (overrides PROTOPATH_CONFIG and ./protopath.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace root (overrides workspace.root from the config)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Register a module as NAME or NAME:SUBDIR; repeatable, replaces [[modules]]
    #[arg(long = "module", value_name = "NAME[:SUBDIR]", global = true)]
    pub modules: Vec<String>,

    /// Fail on manifest entries without a path and on identifier collisions
    #[arg(long, global = true)]
    pub strict_manifest: bool,

    /// Fail if any registered module does not resolve
    #[arg(long, global = true)]
    pub require_all: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the sorted schema path filters
    Paths {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show how each registered module resolved
    Resolve {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Resolve, then run the configured generate command once
    Generate {
        /// Print the command line instead of running it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
