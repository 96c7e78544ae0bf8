use crate::value::Value;
use std::collections::HashSet;
use std::fmt;

/// A parsed formula. Nodes own their children; a tree is never mutated after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    Call {
        function: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl Expression {
    /// Distinct variable names in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let Expression::Variable(name) = node {
                if seen.insert(name.as_str()) {
                    out.push(name.clone());
                }
            }
        });
        out
    }

    /// Distinct function names in order of first appearance.
    pub fn functions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let Expression::Call { function, .. } = node {
                if seen.insert(function.as_str()) {
                    out.push(function.clone());
                }
            }
        });
        out
    }

    fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Expression),
    {
        visit(self);
        match self {
            Expression::Literal(_) | Expression::Variable(_) => {}
            Expression::Unary { operand, .. } => operand.walk(visit),
            Expression::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.walk(visit);
                then_branch.walk(visit);
                else_branch.walk(visit);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "ast_test.rs"]
mod tests;
