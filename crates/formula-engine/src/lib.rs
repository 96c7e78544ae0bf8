pub mod ast;
pub mod engine;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod value;

pub use ast::{BinaryOp, Expression, UnaryOp};
pub use engine::{CalculationResult, EngineConfig, EngineError, FormulaEngine, Rule};
pub use evaluator::{evaluate, EvalError};
pub use functions::{Arity, BuiltinFunction};
pub use lexer::{tokenize, LexError, Token, TokenKind};
pub use parser::{parse_formula, validate_condition, validate_formula, ParseError, Parser, MAX_NESTING_DEPTH};
pub use resolver::{MapResolver, ResolverError, TemplateResolver, VariableDefinition, VariableResolver};
pub use value::{CoercionError, Value, ValueType};
