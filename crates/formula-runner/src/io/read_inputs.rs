use crate::cli::VariableArgs;
use formula_engine::{MapResolver, Rule, Value, VariableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("read file failed `{path}`: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("decode `{path}` failed: {reason}")]
    Decode { path: String, reason: String },
    #[error("invalid --var `{raw}`: expected NAME=VALUE")]
    InlineVar { raw: String },
}

/// A pricing template as authored in the formula editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

/// Builds the variable set from `--vars` and then `--var`, later values winning.
pub fn load_variables(args: &VariableArgs) -> Result<MapResolver, InputError> {
    let mut resolver = match &args.vars {
        Some(path) => MapResolver::from(read_structured::<BTreeMap<String, Value>>(path)?),
        None => MapResolver::new(),
    };
    for raw in &args.var {
        let (name, value) = parse_inline_var(raw)?;
        resolver.insert(name, value);
    }
    Ok(resolver)
}

pub fn load_template(path: &Path) -> Result<PricingTemplate, InputError> {
    read_structured(path)
}

/// Parses `name=value`. `true`/`false` become booleans, numbers become
/// numbers, anything else stays text.
pub fn parse_inline_var(raw: &str) -> Result<(String, Value), InputError> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(InputError::InlineVar { raw: raw.to_string() });
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(InputError::InlineVar { raw: raw.to_string() });
    }
    let value = match value {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        other => match other.parse::<f64>() {
            Ok(number) if number.is_finite() => Value::Number(number),
            _ => Value::Text(other.to_string()),
        },
    };
    Ok((name.to_string(), value))
}

fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let raw = fs::read_to_string(path).map_err(|source| InputError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let decode_error = |reason: String| InputError::Decode {
        path: path.display().to_string(),
        reason,
    };
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(raw.as_str()).map_err(|error| decode_error(error.to_string())),
        // YAML is a superset of JSON, so anything else goes through the YAML decoder.
        _ => serde_yaml::from_str(raw.as_str()).map_err(|error| decode_error(error.to_string())),
    }
}

#[cfg(test)]
#[path = "read_inputs_test.rs"]
mod tests;
