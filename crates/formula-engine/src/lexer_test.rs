use super::{tokenize, LexError, TokenKind};

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .expect("tokenize")
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn tokenizes_pricing_expression() {
    assert_eq!(
        kinds("quantity >= 10 && max(base_price, 2.5) ** 2 != 'gold'"),
        vec![
            TokenKind::Identifier,
            TokenKind::Ge,
            TokenKind::Number,
            TokenKind::AndAnd,
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::RParen,
            TokenKind::StarStar,
            TokenKind::Number,
            TokenKind::NotEq,
            TokenKind::String,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn prefers_two_character_operators() {
    assert_eq!(
        kinds("a**b*c<=d<e==f||!g"),
        vec![
            TokenKind::Identifier,
            TokenKind::StarStar,
            TokenKind::Identifier,
            TokenKind::Star,
            TokenKind::Identifier,
            TokenKind::Le,
            TokenKind::Identifier,
            TokenKind::Lt,
            TokenKind::Identifier,
            TokenKind::EqEq,
            TokenKind::Identifier,
            TokenKind::OrOr,
            TokenKind::Bang,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn reserved_words_become_booleans() {
    assert_eq!(
        kinds("true false truthy"),
        vec![TokenKind::True, TokenKind::False, TokenKind::Identifier, TokenKind::Eof]
    );
}

#[test]
fn string_lexeme_excludes_quotes_and_keeps_backslashes() {
    let tokens = tokenize(r#"'it\' "a'b""#).expect("tokenize");
    assert_eq!(tokens[0].lexeme, r"it\");
    assert_eq!(tokens[1].lexeme, "a'b");

    let tokens = tokenize(r#""a'b" 'c\d'"#).expect("tokenize");
    assert_eq!(tokens[0].lexeme, "a'b");
    assert_eq!(tokens[1].lexeme, r"c\d");
    assert_eq!(tokens[1].pos, 6);
}

#[test]
fn numbers_keep_a_single_fraction() {
    let tokens = tokenize("12.50 + 3").expect("tokenize");
    assert_eq!(tokens[0].lexeme, "12.50");
    assert_eq!(tokens[2].lexeme, "3");

    assert_eq!(
        tokenize("1.2.3"),
        Err(LexError::UnexpectedCharacter { ch: '.', pos: 3 })
    );
    assert_eq!(
        tokenize("1..5"),
        Err(LexError::UnexpectedCharacter { ch: '.', pos: 2 })
    );
}

#[test]
fn trailing_decimal_point_stays_in_the_number() {
    let tokens = tokenize("7.*qty").expect("tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].lexeme, "7.");
    assert_eq!(tokens[1].kind, TokenKind::Star);
    assert_eq!(tokens[1].pos, 2);
    assert_eq!(tokens[2].lexeme, "qty");
}

#[test]
fn rejects_lone_assignment_and_bitwise_characters() {
    assert_eq!(
        tokenize("a = 1"),
        Err(LexError::UnexpectedCharacter { ch: '=', pos: 2 })
    );
    assert_eq!(
        tokenize("a & b"),
        Err(LexError::UnexpectedCharacter { ch: '&', pos: 2 })
    );
    assert_eq!(
        tokenize("price $"),
        Err(LexError::UnexpectedCharacter { ch: '$', pos: 6 })
    );
}

#[test]
fn eof_position_is_input_length() {
    let tokens = tokenize("  ").expect("tokenize");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
    assert_eq!(tokens[0].pos, 2);
}

#[test]
fn reports_unterminated_string_at_opening_quote() {
    assert_eq!(tokenize("'abc"), Err(LexError::UnterminatedString { pos: 0 }));
    assert_eq!(
        tokenize("tier == \"gold"),
        Err(LexError::UnterminatedString { pos: 8 })
    );
}
