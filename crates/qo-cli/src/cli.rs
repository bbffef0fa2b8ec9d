//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// qopt - inspect and exercise the relational expression IR
#[derive(Parser, Debug)]
#[command(name = "qo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory (where qo.yml lives)
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List operators or show one operator's catalog entry
    Ops(OpsArgs),

    /// Build a plan file through the validating factory and print the tree
    Check(CheckArgs),

    /// Evaluate a plan file against its in-memory data
    Eval(EvalArgs),
}

/// Arguments for the ops command
#[derive(Args, Debug)]
pub struct OpsArgs {
    /// Show a single operator
    #[command(subcommand)]
    pub action: Option<OpsAction>,

    /// Only list operators carrying this tag (e.g. JoinApply)
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OpsOutput,
}

/// Subcommands of ops
#[derive(Subcommand, Debug)]
pub enum OpsAction {
    /// Show the catalog entry of one operator
    Show {
        /// Operator name (kebab-case, e.g. lookup-join)
        name: String,
    },
}

/// Catalog output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpsOutput {
    /// Human-readable text
    Text,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Plan file
    pub plan: String,

    /// Report counts of telemetry-tagged operators
    #[arg(long)]
    pub telemetry: bool,
}

/// Arguments for the eval command
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Plan file
    pub plan: String,

    /// Output format (overrides qo.yml)
    #[arg(short, long, value_enum)]
    pub output: Option<EvalOutput>,
}

/// Row output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutput {
    /// Aligned text table
    Table,
    /// JSON array of row objects
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
