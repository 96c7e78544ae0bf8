use crate::value::{CoercionError, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

/// A numeric built-in. Arguments are already coerced to numbers when `apply` runs.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub arity: Arity,
    apply: fn(&[f64]) -> f64,
}

impl BuiltinFunction {
    pub fn call(&self, args: &[Value]) -> Result<Value, CoercionError> {
        let numbers = args.iter().map(Value::to_number).collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Number((self.apply)(&numbers)))
    }
}

const BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "max",
        arity: Arity::AtLeast(1),
        apply: max,
    },
    BuiltinFunction {
        name: "min",
        arity: Arity::AtLeast(1),
        apply: min,
    },
    BuiltinFunction {
        name: "round",
        arity: Arity::Range(1, 2),
        apply: round,
    },
    BuiltinFunction {
        name: "floor",
        arity: Arity::Exact(1),
        apply: |args| args[0].floor(),
    },
    BuiltinFunction {
        name: "ceil",
        arity: Arity::Exact(1),
        apply: |args| args[0].ceil(),
    },
    BuiltinFunction {
        name: "abs",
        arity: Arity::Exact(1),
        apply: |args| args[0].abs(),
    },
    BuiltinFunction {
        name: "pow",
        arity: Arity::Exact(2),
        apply: |args| args[0].powf(args[1]),
    },
    BuiltinFunction {
        name: "sqrt",
        arity: Arity::Exact(1),
        apply: |args| args[0].sqrt(),
    },
];

pub fn lookup(name: &str) -> Option<&'static BuiltinFunction> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|builtin| builtin.name)
}

fn max(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::INFINITY, f64::min)
}

// f64 carries at most 15 significant decimal digits.
const MAX_ROUND_DIGITS: f64 = 15.0;

// Half away from zero, optionally at a number of decimal places.
fn round(args: &[f64]) -> f64 {
    let value = args[0];
    let Some(digits) = args.get(1) else {
        return value.round();
    };
    let digits = if digits.is_nan() {
        0.0
    } else {
        digits.trunc().clamp(-MAX_ROUND_DIGITS, MAX_ROUND_DIGITS)
    };
    let factor = 10f64.powi(digits as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

#[cfg(test)]
#[path = "functions_test.rs"]
mod tests;
