use crate::value::{CoercionError, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolverError {
    #[error("variable backend failed: {0}")]
    Backend(String),
    #[error("variable `{name}` has an invalid value: {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: CoercionError,
    },
}

/// Supplies variable values to formula evaluation on demand.
///
/// `get_variable` returns `Ok(None)` for a name the resolver does not know;
/// `Err` is reserved for failures of the backing store.
pub trait VariableResolver {
    fn get_variable(&self, name: &str) -> Result<Option<Value>, ResolverError>;

    fn has_variable(&self, name: &str) -> bool;

    fn all_variables(&self) -> Result<BTreeMap<String, Value>, ResolverError>;
}

impl<T: VariableResolver + ?Sized> VariableResolver for &T {
    fn get_variable(&self, name: &str) -> Result<Option<Value>, ResolverError> {
        (**self).get_variable(name)
    }

    fn has_variable(&self, name: &str) -> bool {
        (**self).has_variable(name)
    }

    fn all_variables(&self) -> Result<BTreeMap<String, Value>, ResolverError> {
        (**self).all_variables()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapResolver {
    variables: BTreeMap<String, Value>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.variables.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Builds a resolver from a JSON object, skipping null and container values.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .iter()
            .filter_map(|(name, value)| Value::from_json(value).map(|value| (name.clone(), value)))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for MapResolver {
    fn from(variables: BTreeMap<String, Value>) -> Self {
        Self { variables }
    }
}

impl FromIterator<(String, Value)> for MapResolver {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

impl VariableResolver for MapResolver {
    fn get_variable(&self, name: &str) -> Result<Option<Value>, ResolverError> {
        Ok(self.variables.get(name).cloned())
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn all_variables(&self) -> Result<BTreeMap<String, Value>, ResolverError> {
        Ok(self.variables.clone())
    }
}

/// A variable declared by a pricing template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            value_type,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Layers a template's declared variables over another resolver.
///
/// Values from `inner` win over declared defaults, and declared variables are
/// coerced to their declared type. Undeclared names pass through untouched.
#[derive(Debug, Clone)]
pub struct TemplateResolver<R> {
    inner: R,
    definitions: BTreeMap<String, VariableDefinition>,
}

impl<R: VariableResolver> TemplateResolver<R> {
    pub fn new(inner: R, definitions: impl IntoIterator<Item = VariableDefinition>) -> Self {
        Self {
            inner,
            definitions: definitions
                .into_iter()
                .map(|definition| (definition.name.clone(), definition))
                .collect(),
        }
    }

    pub fn definitions(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.definitions.values()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn typed(&self, definition: &VariableDefinition, value: Value) -> Result<Value, ResolverError> {
        definition
            .value_type
            .coerce(&value)
            .map_err(|source| ResolverError::InvalidValue {
                name: definition.name.clone(),
                source,
            })
    }
}

impl<R: VariableResolver> VariableResolver for TemplateResolver<R> {
    fn get_variable(&self, name: &str) -> Result<Option<Value>, ResolverError> {
        let raw = self.inner.get_variable(name)?;
        let Some(definition) = self.definitions.get(name) else {
            return Ok(raw);
        };
        match raw.or_else(|| definition.default_value.clone()) {
            Some(value) => self.typed(definition, value).map(Some),
            None => Ok(None),
        }
    }

    fn has_variable(&self, name: &str) -> bool {
        self.inner.has_variable(name)
            || self
                .definitions
                .get(name)
                .is_some_and(|definition| definition.default_value.is_some())
    }

    fn all_variables(&self) -> Result<BTreeMap<String, Value>, ResolverError> {
        let mut out = self.inner.all_variables()?;
        for definition in self.definitions.values() {
            let value = match out.remove(&definition.name) {
                Some(value) => Some(value),
                None => definition.default_value.clone(),
            };
            if let Some(value) = value {
                out.insert(definition.name.clone(), self.typed(definition, value)?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
