mod cli;
mod config;
mod io;
mod run;

pub use cli::{CalcCommand, CheckCommand, Cli, Commands, OutputFormat, RulesCommand, ValidateCommand};
pub use cli::VariableArgs;
pub use config::{
    load_optional_runner_config, load_runner_config, validate_runner_config, ConfigIssue, RunnerConfig,
    RunnerConfigError,
};
pub use io::{load_template, load_variables, parse_inline_var, InputError, PricingTemplate};
pub use run::{execute_calc, execute_check, execute_rules, execute_validate, RunnerError};
