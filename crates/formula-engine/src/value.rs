use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime value flowing through formula evaluation.
///
/// Serialized untagged, so `12.5`, `"gold"` and `true` map directly onto the
/// scalars stored in product fields and template defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
}

/// The variable type vocabulary shared with pricing templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "text")]
    String,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("cannot convert {value} to {target}")]
pub struct CoercionError {
    pub value: String,
    pub target: ValueType,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::String,
            Value::Boolean(_) => ValueType::Boolean,
        }
    }

    /// Converts a JSON scalar. Null, arrays and objects have no formula value.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Bool(value) => Some(Value::Boolean(*value)),
            serde_json::Value::Number(number) => number.as_f64().map(Value::Number),
            serde_json::Value::String(value) => Some(Value::Text(value.clone())),
            _ => None,
        }
    }

    pub fn to_number(&self) -> Result<f64, CoercionError> {
        match self {
            Value::Number(value) => Ok(*value),
            Value::Boolean(value) => Ok(if *value { 1.0 } else { 0.0 }),
            Value::Text(text) => text
                .parse::<f64>()
                .map_err(|_| self.coercion_error(ValueType::Number)),
        }
    }

    pub fn to_bool(&self) -> Result<bool, CoercionError> {
        match self {
            Value::Boolean(value) => Ok(*value),
            Value::Number(value) => Ok(*value != 0.0),
            Value::Text(text) => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" | "" => Ok(false),
                _ => Err(self.coercion_error(ValueType::Boolean)),
            },
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Number(value) => format_number(*value),
            Value::Text(text) => text.clone(),
            Value::Boolean(value) => value.to_string(),
        }
    }

    fn coercion_error(&self, target: ValueType) -> CoercionError {
        let value = match self {
            Value::Text(text) => format!("\"{text}\""),
            other => other.to_text(),
        };
        CoercionError { value, target }
    }
}

impl ValueType {
    /// Converts `value` into this type using the formula coercion rules.
    pub fn coerce(self, value: &Value) -> Result<Value, CoercionError> {
        match self {
            ValueType::Number => value.to_number().map(Value::Number),
            ValueType::Boolean => value.to_bool().map(Value::Boolean),
            ValueType::String => Ok(Value::Text(value.to_text())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::String => "string",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Integral numbers print without a fraction; everything else uses the
/// shortest representation, switching to exponent form outside `1e-4..1e6`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if value.fract() == 0.0 {
        return format!("{value:.0}");
    }

    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    if (-4..6).contains(&exponent) {
        return value.to_string();
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
