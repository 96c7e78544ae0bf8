use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "formula-runner")]
#[command(about = "Evaluate and validate pricing formulas")]
pub struct Cli {
    /// Log engine decisions at debug level.
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Calculate a numeric formula.
    Calc(CalcCommand),
    /// Evaluate a boolean condition.
    Check(CheckCommand),
    /// Check formula or condition syntax without evaluating it.
    Validate(ValidateCommand),
    /// Run a pricing template's rules, first match wins.
    Rules(RulesCommand),
}

#[derive(Debug, Clone, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct VariableArgs {
    /// JSON or YAML file holding a flat map of variable values.
    #[arg(long)]
    pub vars: Option<PathBuf>,
    /// Inline variable as `name=value`; overrides `--vars`.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub var: Vec<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CalcCommand {
    #[arg(long)]
    pub formula: String,
    #[command(flatten)]
    pub variables: VariableArgs,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, clap::Args)]
pub struct CheckCommand {
    #[arg(long)]
    pub condition: String,
    #[command(flatten)]
    pub variables: VariableArgs,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ValidateCommand {
    #[arg(long, conflicts_with = "condition", required_unless_present = "condition")]
    pub formula: Option<String>,
    #[arg(long)]
    pub condition: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RulesCommand {
    #[arg(long)]
    pub template: PathBuf,
    #[command(flatten)]
    pub variables: VariableArgs,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
