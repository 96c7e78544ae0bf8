use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::lexer::{tokenize, LexError, Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("unexpected {found} at position {pos}, expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        pos: usize,
    },
    #[error("invalid number literal {literal} at position {pos}")]
    InvalidNumber { literal: String, pos: usize },
    #[error("expression nested deeper than {max} levels at position {pos}", max = MAX_NESTING_DEPTH)]
    NestingTooDeep { pos: usize },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Lex(error) => error.position(),
            ParseError::UnexpectedToken { pos, .. }
            | ParseError::InvalidNumber { pos, .. }
            | ParseError::NestingTooDeep { pos } => *pos,
        }
    }
}

/// Bound on both parser recursion and the height of the resulting tree, so
/// evaluation and drop of any parsed formula stay within the thread stack.
pub const MAX_NESTING_DEPTH: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    // Height of the expression most recently returned by a parse step.
    height: usize,
}

/// Parses a formula or condition into an expression tree.
pub fn parse_formula(input: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Syntax-only check; accepts exactly what [`parse_formula`] accepts.
pub fn validate_formula(formula: &str) -> Result<(), ParseError> {
    parse_formula(formula).map(|_| ())
}

/// Conditions share the formula grammar; whether the result is boolean is only
/// known once variables are bound.
pub fn validate_condition(condition: &str) -> Result<(), ParseError> {
    validate_formula(condition)
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let pos = tokens
                .last()
                .map_or(0, |token| token.pos + token.lexeme.chars().count());
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                pos,
            });
        }
        Self {
            tokens,
            index: 0,
            depth: 0,
            height: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_ternary()?;
        self.expect(TokenKind::Eof, "end of input")?;
        Ok(expression)
    }

    fn parse_ternary(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_or()?;
        let condition_height = self.height;
        let Some(question) = self.match_token(TokenKind::Question) else {
            return Ok(condition);
        };
        let then_branch = self.nested(Self::parse_ternary)?;
        let then_height = self.height;
        self.expect(TokenKind::Colon, "':'")?;
        let else_branch = self.nested(Self::parse_ternary)?;
        let height = condition_height.max(then_height).max(self.height) + 1;
        self.set_height(height, question.pos)?;
        Ok(Expression::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_chain(
            |kind| (kind == TokenKind::OrOr).then_some(BinaryOp::Or),
            Self::parse_and,
        )
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_chain(
            |kind| (kind == TokenKind::AndAnd).then_some(BinaryOp::And),
            Self::parse_equality,
        )
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_chain(
            |kind| match kind {
                TokenKind::EqEq => Some(BinaryOp::Eq),
                TokenKind::NotEq => Some(BinaryOp::Ne),
                _ => None,
            },
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_chain(
            |kind| match kind {
                TokenKind::Lt => Some(BinaryOp::Lt),
                TokenKind::Le => Some(BinaryOp::Le),
                TokenKind::Gt => Some(BinaryOp::Gt),
                TokenKind::Ge => Some(BinaryOp::Ge),
                _ => None,
            },
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_chain(
            |kind| match kind {
                TokenKind::Plus => Some(BinaryOp::Add),
                TokenKind::Minus => Some(BinaryOp::Sub),
                _ => None,
            },
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary_chain(
            |kind| match kind {
                TokenKind::Star => Some(BinaryOp::Mul),
                TokenKind::Slash => Some(BinaryOp::Div),
                TokenKind::Percent => Some(BinaryOp::Mod),
                _ => None,
            },
            Self::parse_power,
        )
    }

    fn parse_power(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_unary()?;
        let base_height = self.height;
        let Some(operator) = self.match_token(TokenKind::StarStar) else {
            return Ok(base);
        };
        // right-associative: 2 ** 3 ** 2 == 2 ** (3 ** 2)
        let exponent = self.nested(Self::parse_power)?;
        self.set_height(base_height.max(self.height) + 1, operator.pos)?;
        Ok(Expression::Binary {
            left: Box::new(base),
            op: BinaryOp::Pow,
            right: Box::new(exponent),
        })
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let operator = self.advance();
        let operand = self.nested(Self::parse_unary)?;
        self.set_height(self.height + 1, operator.pos)?;
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number => {
                let value = token
                    .lexeme
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| ParseError::InvalidNumber {
                        literal: token.lexeme.clone(),
                        pos: token.pos,
                    })?;
                self.height = 1;
                Ok(Expression::Literal(Value::Number(value)))
            }
            TokenKind::String => {
                self.height = 1;
                Ok(Expression::Literal(Value::Text(token.lexeme)))
            }
            TokenKind::True | TokenKind::False => {
                self.height = 1;
                Ok(Expression::Literal(Value::Boolean(token.kind == TokenKind::True)))
            }
            TokenKind::Identifier => {
                if self.match_kind(TokenKind::LParen) {
                    let args = self.parse_arguments(token.pos)?;
                    return Ok(Expression::Call {
                        function: token.lexeme,
                        args,
                    });
                }
                self.height = 1;
                Ok(Expression::Variable(token.lexeme))
            }
            TokenKind::LParen => {
                let expr = self.nested(Self::parse_ternary)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(unexpected(&token, "expression")),
        }
    }

    fn parse_arguments(&mut self, call_pos: usize) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        let mut tallest = 0;
        if !self.match_kind(TokenKind::RParen) {
            loop {
                args.push(self.nested(Self::parse_ternary)?);
                tallest = tallest.max(self.height);
                if self.match_kind(TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }
        self.set_height(tallest + 1, call_pos)?;
        Ok(args)
    }

    fn parse_binary_chain<F, G>(&mut self, operator: F, mut parse_operand: G) -> Result<Expression, ParseError>
    where
        F: Fn(TokenKind) -> Option<BinaryOp>,
        G: FnMut(&mut Self) -> Result<Expression, ParseError>,
    {
        let mut node = parse_operand(self)?;
        let mut height = self.height;
        while let Some(op) = operator(self.peek().kind) {
            let token = self.advance();
            let right = parse_operand(self)?;
            height = height.max(self.height) + 1;
            self.set_height(height, token.pos)?;
            node = Expression::Binary {
                left: Box::new(node),
                op,
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    /// Runs `parse` one nesting level deeper, failing once the limit is hit.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expression, ParseError>) -> Result<Expression, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep { pos: self.peek().pos });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn set_height(&mut self, height: usize, pos: usize) -> Result<(), ParseError> {
        if height > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep { pos });
        }
        self.height = height;
        Ok(())
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> Option<Token> {
        self.check(kind).then(|| self.advance())
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&token, expected))
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }
}

fn unexpected(token: &Token, expected: &str) -> ParseError {
    ParseError::UnexpectedToken {
        expected: expected.to_string(),
        found: token.to_string(),
        pos: token.pos,
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
