use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Identifier,
    String,
    True,
    False,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::String => write!(f, "string \"{}\"", self.lexeme),
            TokenKind::Number => write!(f, "number {}", self.lexeme),
            TokenKind::Identifier => write!(f, "identifier '{}'", self.lexeme),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },
    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { pos, .. } | LexError::UnterminatedString { pos } => *pos,
        }
    }
}

/// Splits a formula into tokens. The returned vector always ends with an `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut scanner = Scanner::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Character cursor over a formula; positions are char offsets.
struct Scanner {
    chars: Vec<char>,
    cursor: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            cursor: 0,
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        while self.current().is_some_and(char::is_whitespace) {
            self.cursor += 1;
        }
        let start = self.cursor;
        let Some(ch) = self.current() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                pos: start,
            });
        };

        match ch {
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.word(start)),
            '0'..='9' => Ok(self.number(start)),
            '\'' | '"' => self.quoted(start, ch),
            _ => self.operator(start, ch),
        }
    }

    fn word(&mut self, start: usize) -> Token {
        self.skip_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let lexeme = self.slice(start);
        let kind = match lexeme.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Identifier,
        };
        Token {
            kind,
            lexeme,
            pos: start,
        }
    }

    // Digits with at most one decimal point. `7.` is a number; a second dot is
    // left for `operator`, which rejects it.
    fn number(&mut self, start: usize) -> Token {
        self.skip_while(|ch| ch.is_ascii_digit());
        if self.current() == Some('.') {
            self.cursor += 1;
            self.skip_while(|ch| ch.is_ascii_digit());
        }
        Token {
            kind: TokenKind::Number,
            lexeme: self.slice(start),
            pos: start,
        }
    }

    // No escapes: the literal ends at the next quote of the same kind.
    fn quoted(&mut self, start: usize, quote: char) -> Result<Token, LexError> {
        self.cursor += 1;
        self.skip_while(|ch| ch != quote);
        if self.current().is_none() {
            return Err(LexError::UnterminatedString { pos: start });
        }
        let lexeme = self.chars[start + 1..self.cursor].iter().collect();
        self.cursor += 1;
        Ok(Token {
            kind: TokenKind::String,
            lexeme,
            pos: start,
        })
    }

    fn operator(&mut self, start: usize, ch: char) -> Result<Token, LexError> {
        let next = self.chars.get(start + 1).copied();
        let paired = match (ch, next) {
            ('*', Some('*')) => Some(TokenKind::StarStar),
            ('!', Some('=')) => Some(TokenKind::NotEq),
            ('=', Some('=')) => Some(TokenKind::EqEq),
            ('<', Some('=')) => Some(TokenKind::Le),
            ('>', Some('=')) => Some(TokenKind::Ge),
            ('&', Some('&')) => Some(TokenKind::AndAnd),
            ('|', Some('|')) => Some(TokenKind::OrOr),
            _ => None,
        };
        let kind = match paired {
            Some(kind) => {
                self.cursor += 2;
                kind
            }
            None => {
                let kind = single_char_kind(ch).ok_or(LexError::UnexpectedCharacter { ch, pos: start })?;
                self.cursor += 1;
                kind
            }
        };
        Ok(Token {
            kind,
            lexeme: self.slice(start),
            pos: start,
        })
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn skip_while(&mut self, accept: impl Fn(char) -> bool) {
        while self.current().is_some_and(&accept) {
            self.cursor += 1;
        }
    }

    fn slice(&self, start: usize) -> String {
        self.chars[start..self.cursor].iter().collect()
    }
}

fn single_char_kind(ch: char) -> Option<TokenKind> {
    let kind = match ch {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '!' => TokenKind::Bang,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        ',' => TokenKind::Comma,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
#[path = "lexer_test.rs"]
mod tests;
