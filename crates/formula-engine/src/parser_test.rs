use super::{parse_formula, validate_condition, validate_formula, ParseError, MAX_NESTING_DEPTH};
use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::lexer::LexError;
use crate::value::Value;

fn num(value: f64) -> Expression {
    Expression::Literal(Value::Number(value))
}

fn var(name: &str) -> Expression {
    Expression::Variable(name.to_string())
}

fn binary(left: Expression, op: BinaryOp, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let ast = parse_formula("2 + 3 * 4").expect("parse");
    assert_eq!(
        ast,
        binary(num(2.0), BinaryOp::Add, binary(num(3.0), BinaryOp::Mul, num(4.0)))
    );
}

#[test]
fn exponent_is_right_associative() {
    let ast = parse_formula("2 ** 3 ** 2").expect("parse");
    assert_eq!(
        ast,
        binary(num(2.0), BinaryOp::Pow, binary(num(3.0), BinaryOp::Pow, num(2.0)))
    );
}

#[test]
fn subtraction_is_left_associative() {
    let ast = parse_formula("10 - 4 - 3").expect("parse");
    assert_eq!(
        ast,
        binary(binary(num(10.0), BinaryOp::Sub, num(4.0)), BinaryOp::Sub, num(3.0))
    );
}

#[test]
fn unary_minus_binds_tighter_than_exponent() {
    let ast = parse_formula("-2 ** 2").expect("parse");
    let expected_base = Expression::Unary {
        op: UnaryOp::Neg,
        operand: Box::new(num(2.0)),
    };
    assert_eq!(ast, binary(expected_base, BinaryOp::Pow, num(2.0)));
}

#[test]
fn logical_precedence_puts_or_lowest() {
    let ast = parse_formula("a || b && c == d").expect("parse");
    let Expression::Binary { op, right, .. } = ast else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Or);
    let Expression::Binary { op, right, .. } = *right else {
        panic!("expected nested and");
    };
    assert_eq!(op, BinaryOp::And);
    let Expression::Binary { op, .. } = *right else {
        panic!("expected nested equality");
    };
    assert_eq!(op, BinaryOp::Eq);
}

#[test]
fn ternary_binds_looser_than_or_and_chains_right() {
    let ast = parse_formula("a || b ? 1 : c ? 2 : 3").expect("parse");
    let Expression::Ternary {
        condition,
        then_branch,
        else_branch,
    } = ast
    else {
        panic!("expected ternary");
    };
    assert!(matches!(*condition, Expression::Binary { op: BinaryOp::Or, .. }));
    assert_eq!(*then_branch, num(1.0));
    assert!(matches!(*else_branch, Expression::Ternary { .. }));
}

#[test]
fn identifiers_followed_by_paren_are_calls() {
    let ast = parse_formula("max(price, 10) + discount").expect("parse");
    let Expression::Binary { left, right, .. } = ast else {
        panic!("expected binary");
    };
    assert_eq!(
        *left,
        Expression::Call {
            function: "max".to_string(),
            args: vec![var("price"), num(10.0)],
        }
    );
    assert_eq!(*right, var("discount"));
}

#[test]
fn unknown_functions_and_empty_argument_lists_parse() {
    let ast = parse_formula("surcharge()").expect("parse");
    assert_eq!(
        ast,
        Expression::Call {
            function: "surcharge".to_string(),
            args: Vec::new(),
        }
    );
}

#[test]
fn literals_cover_strings_and_booleans() {
    assert_eq!(
        parse_formula("'gold'").expect("parse"),
        Expression::Literal(Value::from("gold"))
    );
    assert_eq!(
        parse_formula("!true").expect("parse"),
        Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(Expression::Literal(Value::Boolean(true))),
        }
    );
}

#[test]
fn reports_unexpected_closing_paren_with_position() {
    let err = parse_formula("base_price * (1 + )").expect_err("must fail");
    assert_eq!(
        err,
        ParseError::UnexpectedToken {
            expected: "expression".to_string(),
            found: "')'".to_string(),
            pos: 18,
        }
    );
    assert_eq!(
        err.to_string(),
        "unexpected ')' at position 18, expected expression"
    );
}

#[test]
fn reports_unbalanced_parentheses() {
    let err = parse_formula("(1 + 2").expect_err("must fail");
    assert_eq!(
        err,
        ParseError::UnexpectedToken {
            expected: "')'".to_string(),
            found: "end of input".to_string(),
            pos: 6,
        }
    );
    let err = parse_formula("1 + 2)").expect_err("must fail");
    assert_eq!(err.position(), 5);
}

#[test]
fn reports_malformed_ternary_and_call() {
    let err = parse_formula("a ? 1").expect_err("must fail");
    assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "':'"));
    let err = parse_formula("max(1 2)").expect_err("must fail");
    assert!(matches!(err, ParseError::UnexpectedToken { pos: 6, .. }));
}

#[test]
fn empty_input_is_a_parse_error() {
    let err = parse_formula("").expect_err("must fail");
    assert_eq!(err.position(), 0);
}

#[test]
fn lex_errors_surface_through_parse() {
    let err = parse_formula("price # 2").expect_err("must fail");
    assert_eq!(
        err,
        ParseError::Lex(LexError::UnexpectedCharacter { ch: '#', pos: 6 })
    );
}

#[test]
fn oversized_number_literal_is_rejected() {
    let literal = "9".repeat(400);
    let err = parse_formula(&literal).expect_err("must fail");
    assert!(matches!(err, ParseError::InvalidNumber { pos: 0, .. }));
}

#[test]
fn validation_matches_parse_acceptance() {
    let samples = [
        "2 + 3 * 4",
        "quantity > 10 ? base_price * 0.8 : base_price",
        "(",
        "a ==",
        "unknown_fn(1, 2)",
        "'unterminated",
        "x = 1",
        "!flag && region == 'EU'",
    ];
    for sample in samples {
        assert_eq!(validate_formula(sample).is_ok(), parse_formula(sample).is_ok(), "{sample}");
        assert_eq!(validate_condition(sample), validate_formula(sample), "{sample}");
    }
}

#[test]
fn deeply_nested_parentheses_are_rejected() {
    let formula = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = parse_formula(&formula).expect_err("must fail");
    assert!(matches!(err, ParseError::NestingTooDeep { .. }), "{err:?}");
    assert!(err.position() > 0);
    assert!(err.to_string().contains("nested deeper than 128 levels"));
}

#[test]
fn long_prefix_operator_runs_are_rejected() {
    let minus = format!("{}1", "-".repeat(10_000));
    assert!(matches!(
        validate_formula(&minus),
        Err(ParseError::NestingTooDeep { .. })
    ));
    let not = format!("{}flag", "!".repeat(10_000));
    assert!(matches!(
        validate_condition(&not),
        Err(ParseError::NestingTooDeep { .. })
    ));
}

#[test]
fn long_operator_chains_are_rejected() {
    let sum = vec!["1"; 10_000].join(" + ");
    assert!(matches!(parse_formula(&sum), Err(ParseError::NestingTooDeep { .. })));
    let power = vec!["2"; 10_000].join(" ** ");
    assert!(matches!(parse_formula(&power), Err(ParseError::NestingTooDeep { .. })));
    let ternary = format!("{}0", "a ? 1 : ".repeat(10_000));
    assert!(matches!(parse_formula(&ternary), Err(ParseError::NestingTooDeep { .. })));
}

#[test]
fn nesting_within_the_limit_parses() {
    let depth = MAX_NESTING_DEPTH - 8;
    let parens = format!("{}price{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse_formula(&parens).expect("parse"), var("price"));

    let sum = vec!["1"; depth].join(" + ");
    assert!(parse_formula(&sum).is_ok());
    let negated = format!("{}1", "-".repeat(depth));
    assert!(parse_formula(&negated).is_ok());
}
