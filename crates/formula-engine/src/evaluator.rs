use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::functions::{self, Arity};
use crate::resolver::{ResolverError, VariableResolver};
use crate::value::{CoercionError, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },
    #[error("function `{function}` expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: Arity,
        got: usize,
    },
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result {value} is not a finite number")]
    NonFiniteResult { value: String },
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

/// Evaluates `expression` against `resolver`. Neither is mutated.
pub fn evaluate(expression: &Expression, resolver: &dyn VariableResolver) -> Result<Value, EvalError> {
    match expression {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Variable(name) => resolver
            .get_variable(name)?
            .ok_or_else(|| EvalError::UndefinedVariable { name: name.clone() }),
        Expression::Unary { op, operand } => {
            let value = evaluate(operand, resolver)?;
            evaluate_unary(*op, &value)
        }
        Expression::Binary { left, op, right } => {
            let left = evaluate(left, resolver)?;
            let right = evaluate(right, resolver)?;
            evaluate_binary(&left, *op, &right)
        }
        Expression::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            if evaluate(condition, resolver)?.to_bool()? {
                evaluate(then_branch, resolver)
            } else {
                evaluate(else_branch, resolver)
            }
        }
        Expression::Call { function, args } => evaluate_call(function, args, resolver),
    }
}

impl Expression {
    pub fn evaluate(&self, resolver: &dyn VariableResolver) -> Result<Value, EvalError> {
        evaluate(self, resolver)
    }
}

fn evaluate_unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Neg => Ok(Value::Number(-value.to_number()?)),
        UnaryOp::Not => Ok(Value::Boolean(!value.to_bool()?)),
    }
}

fn evaluate_binary(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::And => Ok(Value::Boolean(left.to_bool()? && right.to_bool()?)),
        BinaryOp::Or => Ok(Value::Boolean(left.to_bool()? || right.to_bool()?)),
        BinaryOp::Eq => Ok(Value::Boolean(values_equal(left, right)?)),
        BinaryOp::Ne => Ok(Value::Boolean(!values_equal(left, right)?)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => evaluate_compare(left, op, right),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
            evaluate_arithmetic(left, op, right)
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> Result<bool, EvalError> {
    let equal = match (left, right) {
        (Value::Number(left), Value::Number(right)) => left == right,
        (Value::Text(left), Value::Text(right)) => left == right,
        (Value::Boolean(left), other) | (other, Value::Boolean(left)) => *left == other.to_bool()?,
        (Value::Number(number), Value::Text(text)) | (Value::Text(text), Value::Number(number)) => {
            text.parse::<f64>().is_ok_and(|parsed| parsed == *number)
        }
    };
    Ok(equal)
}

fn evaluate_compare(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Text(left_text), Value::Text(right_text)) => {
            match (left_text.parse::<f64>(), right_text.parse::<f64>()) {
                (Ok(left), Ok(right)) => left.partial_cmp(&right),
                _ => Some(left_text.cmp(right_text)),
            }
        }
        _ => left.to_number()?.partial_cmp(&right.to_number()?),
    };

    // NaN compares false against everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Boolean(false));
    };
    let result = match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        _ => unreachable!("called only for relational ops"),
    };
    Ok(Value::Boolean(result))
}

fn evaluate_arithmetic(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, EvalError> {
    if op == BinaryOp::Add {
        if let (Value::Text(left), Value::Text(right)) = (left, right) {
            return Ok(Value::Text(format!("{left}{right}")));
        }
    }

    let left = left.to_number()?;
    let right = right.to_number()?;
    let result = match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => {
            if right == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            left / right
        }
        BinaryOp::Mod => {
            if right == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            left % right
        }
        BinaryOp::Pow => left.powf(right),
        _ => unreachable!("called only for arithmetic ops"),
    };
    Ok(Value::Number(result))
}

fn evaluate_call(function: &str, args: &[Expression], resolver: &dyn VariableResolver) -> Result<Value, EvalError> {
    let builtin = functions::lookup(function).ok_or_else(|| EvalError::UnknownFunction {
        name: function.to_string(),
    })?;
    if !builtin.arity.accepts(args.len()) {
        return Err(EvalError::Arity {
            function: function.to_string(),
            expected: builtin.arity,
            got: args.len(),
        });
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, resolver)?);
    }
    Ok(builtin.call(&values)?)
}

#[cfg(test)]
#[path = "evaluator_test.rs"]
mod tests;
