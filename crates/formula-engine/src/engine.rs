use crate::ast::Expression;
use crate::evaluator::{evaluate, EvalError};
use crate::parser::{parse_formula, ParseError};
use crate::resolver::VariableResolver;
use crate::value::{format_number, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvalError),
    #[error("no matching rule: none of {rules} rule condition(s) evaluated to true")]
    NoMatchingRule { rules: usize },
}

/// One (condition, calculation) pair of a pricing template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub condition: String,
    pub calculation: String,
}

impl Rule {
    pub fn new(condition: impl Into<String>, calculation: impl Into<String>) -> Self {
        Self {
            name: None,
            condition: condition.into(),
            calculation: calculation.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub value: f64,
    pub formula: String,
    pub variables: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_applied: Option<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default = "default_max_cached_formulas")]
    pub max_cached_formulas: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            max_cached_formulas: default_max_cached_formulas(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_cached_formulas() -> usize {
    1024
}

/// Parses and evaluates pricing formulas, conditions and rule lists.
///
/// The engine is `Send + Sync`; share it behind an `Arc` across request
/// handlers. Parsed trees are cached by formula text when the config enables it.
#[derive(Debug, Default)]
pub struct FormulaEngine {
    config: EngineConfig,
    cache: RwLock<HashMap<String, Arc<Expression>>>,
}

impl FormulaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn parse(&self, formula: &str) -> Result<Arc<Expression>, ParseError> {
        if !self.config.cache_enabled {
            return parse_formula(formula).map(Arc::new);
        }

        if let Some(ast) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(formula)
        {
            trace!(formula, "formula cache hit");
            return Ok(Arc::clone(ast));
        }

        let ast = Arc::new(parse_formula(formula)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.len() < self.config.max_cached_formulas {
            cache.insert(formula.to_string(), Arc::clone(&ast));
        }
        Ok(ast)
    }

    pub fn cached_formulas(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn validate_formula(&self, formula: &str) -> Result<(), ParseError> {
        crate::parser::validate_formula(formula)
    }

    pub fn validate_condition(&self, condition: &str) -> Result<(), ParseError> {
        crate::parser::validate_condition(condition)
    }

    /// Variables a formula reads, in first-appearance order.
    pub fn referenced_variables(&self, formula: &str) -> Result<Vec<String>, ParseError> {
        Ok(self.parse(formula)?.variables())
    }

    pub fn evaluate(&self, formula: &str, resolver: &dyn VariableResolver) -> Result<Value, EngineError> {
        let ast = self.parse(formula)?;
        Ok(evaluate(&ast, resolver)?)
    }

    /// Evaluates `formula` to a price. NaN and infinities are errors.
    pub fn calculate(&self, formula: &str, resolver: &dyn VariableResolver) -> Result<f64, EngineError> {
        let value = self.evaluate(formula, resolver)?;
        let number = value.to_number().map_err(EvalError::from)?;
        if !number.is_finite() {
            return Err(EvalError::NonFiniteResult {
                value: format_number(number),
            }
            .into());
        }
        Ok(number)
    }

    pub fn evaluate_condition(&self, condition: &str, resolver: &dyn VariableResolver) -> Result<bool, EngineError> {
        let value = self.evaluate(condition, resolver)?;
        Ok(value.to_bool().map_err(EvalError::from)?)
    }

    /// Calculates a formula and captures the variables it ran against.
    pub fn calculate_detailed(
        &self,
        formula: &str,
        resolver: &dyn VariableResolver,
    ) -> Result<CalculationResult, EngineError> {
        let value = self.calculate(formula, resolver)?;
        Ok(CalculationResult {
            value,
            formula: formula.to_string(),
            variables: snapshot(resolver)?,
            rule_applied: None,
            rule_index: None,
        })
    }

    /// Returns the calculation of the first rule whose condition holds.
    ///
    /// Rules are tried strictly in slice order; later rules are never consulted
    /// once one matches, even if their conditions are also true.
    pub fn evaluate_rules(
        &self,
        rules: &[Rule],
        resolver: &dyn VariableResolver,
    ) -> Result<CalculationResult, EngineError> {
        for (index, rule) in rules.iter().enumerate() {
            if !self.evaluate_condition(&rule.condition, resolver)? {
                trace!(index, condition = %rule.condition, "rule condition not met");
                continue;
            }
            debug!(index, name = rule.name.as_deref(), condition = %rule.condition, "rule matched");
            let value = self.calculate(&rule.calculation, resolver)?;
            return Ok(CalculationResult {
                value,
                formula: rule.calculation.clone(),
                variables: snapshot(resolver)?,
                rule_applied: Some(rule.clone()),
                rule_index: Some(index),
            });
        }
        Err(EngineError::NoMatchingRule { rules: rules.len() })
    }
}

fn snapshot(resolver: &dyn VariableResolver) -> Result<BTreeMap<String, Value>, EngineError> {
    resolver
        .all_variables()
        .map_err(|error| EngineError::Evaluation(EvalError::Resolver(error)))
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
