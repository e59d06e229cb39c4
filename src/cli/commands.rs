//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

/// Run make targets with a bounded timeout and parallelism.
///
/// Can be used as a standalone CLI or as an MCP server exposing a `make` tool.
#[derive(Parser, Debug)]
#[command(name = "makemcp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start MCP server over stdio
    Serve,

    /// Run one make target and print the result as JSON
    Run(RunArgs),

    /// Print the tool description built from the help target
    Describe(OverrideArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the `run` subcommand
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Make target to run (e.g., build, test)
    #[arg(required = true)]
    pub target: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Per-invocation overrides of the `[make]` configuration
#[derive(Parser, Debug, Default)]
pub struct OverrideArgs {
    /// Directory to run make in
    #[arg(short = 'C', long)]
    pub work_dir: Option<String>,

    /// Timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl OverrideArgs {
    /// Apply the overrides on top of loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref dir) = self.work_dir {
            config.make.work_dir = Some(dir.clone());
        }
        if let Some(timeout) = self.timeout {
            config.make.timeout = timeout;
        }
    }
}

/// Arguments for the `config` subcommand
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,

    /// List the config files that were merged instead of the values
    #[arg(long)]
    pub sources: bool,
}

/// Output format options for `config`
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    /// TOML, as it would appear in a config file
    Toml,
    /// JSON output
    Json,
}
