use crate::cli::{CalcCommand, CheckCommand, OutputFormat, RulesCommand, ValidateCommand};
use crate::config::{load_optional_runner_config, RunnerConfigError};
use crate::io::{load_template, load_variables, InputError};
use formula_engine::value::format_number;
use formula_engine::{
    CalculationResult, EngineError, FormulaEngine, ParseError, TemplateResolver, VariableResolver,
};
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("runner config load failed: {0}")]
    Config(#[from] RunnerConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("syntax error: {0}")]
    Syntax(ParseError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("template `{path}` has neither rules nor a formula")]
    EmptyTemplate { path: String },
    #[error("json encode failed: {0}")]
    JsonEncode(#[from] serde_json::Error),
}

pub fn execute_calc(command: &CalcCommand) -> Result<String, RunnerError> {
    let engine = build_engine(command.config.as_deref())?;
    let resolver = load_variables(&command.variables)?;
    match command.format {
        OutputFormat::Text => Ok(format_number(engine.calculate(&command.formula, &resolver)?)),
        OutputFormat::Json => {
            let result = engine.calculate_detailed(&command.formula, &resolver)?;
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}

pub fn execute_check(command: &CheckCommand) -> Result<String, RunnerError> {
    let engine = build_engine(command.config.as_deref())?;
    let resolver = load_variables(&command.variables)?;
    let result = engine.evaluate_condition(&command.condition, &resolver)?;
    match command.format {
        OutputFormat::Text => Ok(result.to_string()),
        OutputFormat::Json => {
            let variables = resolver
                .all_variables()
                .map_err(|error| EngineError::Evaluation(error.into()))?;
            Ok(serde_json::to_string_pretty(&json!({
                "condition": command.condition,
                "result": result,
                "variables": variables,
            }))?)
        }
    }
}

pub fn execute_validate(command: &ValidateCommand) -> Result<String, RunnerError> {
    // clap guarantees exactly one of the two is present.
    let (kind, expression) = match &command.formula {
        Some(formula) => ("formula", formula.as_str()),
        None => ("condition", command.condition.as_deref().unwrap_or_default()),
    };
    let variables = FormulaEngine::new()
        .referenced_variables(expression)
        .map_err(RunnerError::Syntax)?;
    match command.format {
        OutputFormat::Text => {
            let mut out = format!("{kind} is valid");
            if !variables.is_empty() {
                let _ = write!(out, "\nvariables: {}", variables.join(", "));
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "kind": kind,
            "valid": true,
            "variables": variables,
        }))?),
    }
}

pub fn execute_rules(command: &RulesCommand) -> Result<String, RunnerError> {
    let engine = build_engine(command.config.as_deref())?;
    let template = load_template(&command.template)?;
    let product = load_variables(&command.variables)?;
    debug!(
        template = template.name.as_deref(),
        rules = template.rules.len(),
        variables = template.variables.len(),
        "loaded pricing template"
    );
    let resolver = TemplateResolver::new(product, template.variables);

    let result = if !template.rules.is_empty() {
        engine.evaluate_rules(&template.rules, &resolver)?
    } else if let Some(formula) = &template.formula {
        engine.calculate_detailed(formula, &resolver)?
    } else {
        return Err(RunnerError::EmptyTemplate {
            path: command.template.display().to_string(),
        });
    };

    match command.format {
        OutputFormat::Text => Ok(render_result_text(&result)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result)?),
    }
}

fn build_engine(config_path: Option<&Path>) -> Result<FormulaEngine, RunnerError> {
    let config = load_optional_runner_config(config_path)?;
    Ok(FormulaEngine::with_config(config.engine))
}

fn render_result_text(result: &CalculationResult) -> String {
    let mut out = format!("value: {}", format_number(result.value));
    if let (Some(rule), Some(index)) = (&result.rule_applied, result.rule_index) {
        let label = rule.name.as_deref().unwrap_or("unnamed");
        let _ = write!(out, "\nrule: #{} {label} when {}", index + 1, rule.condition);
    }
    let _ = write!(out, "\nformula: {}", result.formula);
    for (name, value) in &result.variables {
        let _ = write!(out, "\n  {name} = {value}");
    }
    out
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
