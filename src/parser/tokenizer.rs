//! Tokenizer for FHIRPath expressions
//!
//! Produces a flat token stream. String literals are unescaped here;
//! temporal literals keep their raw text so precision survives to the
//! evaluator.

use super::error::{ParseError, ParseResult};
use rust_decimal::Decimal;

/// A single FHIRPath token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (backtick delimiters already stripped)
    Identifier(String),
    /// String literal, unescaped
    StringLit(String),
    /// Integer literal
    Integer(i64),
    /// Decimal literal
    Decimal(Decimal),
    /// Date literal (`@2023-01-01`, without the `@`)
    Date(String),
    /// DateTime literal (`@2023-01-01T12:00:00Z`, without the `@`)
    DateTime(String),
    /// Time literal (`@T12:00`, without the `@T`)
    Time(String),
    /// External constant (`%ucum`, `%'vs-name'`)
    Variable(String),
    /// `$this`
    This,
    /// `$index`
    IndexVar,
    /// `$total`
    TotalVar,
    /// `true`
    True,
    /// `false`
    False,

    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
    /// `implies`
    Implies,
    /// `div`
    Div,
    /// `mod`
    Mod,
    /// `in`
    In,
    /// `contains` (operator position; method position turns it back into a name)
    Contains,
    /// `is`
    Is,
    /// `as`
    As,

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `~`
    Equivalent,
    /// `!~`
    NotEquivalent,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,

    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
}

impl Token {
    /// True for keyword tokens that the grammar also allows as member names
    /// (`Patient.contains`, `value.div(...)`).
    pub fn as_identifier_name(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            Token::And => Some("and"),
            Token::Or => Some("or"),
            Token::Xor => Some("xor"),
            Token::Implies => Some("implies"),
            Token::Div => Some("div"),
            Token::Mod => Some("mod"),
            Token::In => Some("in"),
            Token::Contains => Some("contains"),
            Token::Is => Some("is"),
            Token::As => Some("as"),
            _ => None,
        }
    }
}

/// A token plus its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Byte offset where the token starts
    pub position: usize,
}

/// Tokenizer over an expression string
pub struct Tokenizer<'input> {
    source: &'input str,
    bytes: &'input [u8],
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer over `source`.
    pub fn new(source: &'input str) -> Self {
        Tokenizer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> ParseResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.pos >= self.bytes.len() {
                return Ok(tokens);
            }
            let position = self.pos;
            let token = self.next_token()?;
            tokens.push(Spanned { token, position });
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            None => return Err(ParseError::UnexpectedEnd),
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            _ => self.pos += 1,
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        let c = self.bytes[self.pos];
        match c {
            b'(' => self.single(Token::LeftParen),
            b')' => self.single(Token::RightParen),
            b'[' => self.single(Token::LeftBracket),
            b']' => self.single(Token::RightBracket),
            b'{' => self.single(Token::LeftBrace),
            b'}' => self.single(Token::RightBrace),
            b'.' => self.single(Token::Dot),
            b',' => self.single(Token::Comma),
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'*' => self.single(Token::Star),
            b'/' => self.single(Token::Slash),
            b'&' => self.single(Token::Ampersand),
            b'|' => self.single(Token::Pipe),
            b'=' => self.single(Token::Equal),
            b'~' => self.single(Token::Equivalent),
            b'!' => {
                self.pos += 1;
                match self.peek() {
                    Some(b'=') => self.single(Token::NotEqual),
                    Some(b'~') => self.single(Token::NotEquivalent),
                    _ => Err(ParseError::UnexpectedCharacter { ch: '!', position: start }),
                }
            }
            b'<' => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.single(Token::LessThanOrEqual)
                } else {
                    Ok(Token::LessThan)
                }
            }
            b'>' => {
                self.pos += 1;
                if self.peek() == Some(b'=') {
                    self.single(Token::GreaterThanOrEqual)
                } else {
                    Ok(Token::GreaterThan)
                }
            }
            b'\'' => self.string_literal(),
            b'`' => self.delimited_identifier(),
            b'@' => self.temporal_literal(),
            b'%' => self.external_constant(),
            b'$' => self.dollar_variable(),
            b'0'..=b'9' => self.number_literal(),
            c if c == b'_' || (c as char).is_ascii_alphabetic() => Ok(self.identifier_or_keyword()),
            other => Err(ParseError::UnexpectedCharacter {
                ch: other as char,
                position: start,
            }),
        }
    }

    fn single(&mut self, token: Token) -> ParseResult<Token> {
        self.pos += 1;
        Ok(token)
    }

    fn identifier_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'_' || (c as char).is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word = &self.source[start..self.pos];
        match word {
            "true" => Token::True,
            "false" => Token::False,
            "and" => Token::And,
            "or" => Token::Or,
            "xor" => Token::Xor,
            "implies" => Token::Implies,
            "div" => Token::Div,
            "mod" => Token::Mod,
            "in" => Token::In,
            "contains" => Token::Contains,
            "is" => Token::Is,
            "as" => Token::As,
            _ => Token::Identifier(word.to_string()),
        }
    }

    fn delimited_identifier(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 1; // opening backtick
        let content_start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'`' {
                let name = self.source[content_start..self.pos].to_string();
                self.pos += 1;
                return Ok(Token::Identifier(name));
            }
            self.pos += 1;
        }
        Err(ParseError::UnterminatedString { position: start })
    }

    fn string_literal(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString { position: start }),
                Some(b'\'') => {
                    self.pos += 1;
                    return Ok(Token::StringLit(out));
                }
                Some(b'\\') => {
                    let escape_pos = self.pos;
                    self.pos += 1;
                    match self.peek() {
                        Some(b'r') => out.push('\r'),
                        Some(b'n') => out.push('\n'),
                        Some(b't') => out.push('\t'),
                        Some(b'f') => out.push('\u{000C}'),
                        Some(b'\\') => out.push('\\'),
                        Some(b'\'') => out.push('\''),
                        Some(b'"') => out.push('"'),
                        Some(b'/') => out.push('/'),
                        Some(b'u') => {
                            let hex_start = self.pos + 1;
                            let hex_end = hex_start + 4;
                            // hex_end may fall inside a multi-byte char;
                            // get() makes that a parse error, not a panic
                            let hex = self
                                .source
                                .get(hex_start..hex_end)
                                .ok_or(ParseError::InvalidEscape { position: escape_pos })?;
                            let code = u32::from_str_radix(hex, 16)
                                .map_err(|_| ParseError::InvalidEscape { position: escape_pos })?;
                            let ch = char::from_u32(code)
                                .ok_or(ParseError::InvalidEscape { position: escape_pos })?;
                            out.push(ch);
                            self.pos += 4;
                        }
                        _ => return Err(ParseError::InvalidEscape { position: escape_pos }),
                    }
                    self.pos += 1;
                }
                Some(_) => {
                    // multi-byte UTF-8 safe: advance over the whole char
                    let ch = self.source[self.pos..]
                        .chars()
                        .next()
                        .ok_or(ParseError::UnexpectedEnd)?;
                    out.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
    }

    fn number_literal(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let mut is_decimal = false;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            is_decimal = true;
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let text = &self.source[start..self.pos];
        if is_decimal {
            let value = text.parse::<Decimal>().map_err(|_| ParseError::InvalidNumber {
                text: text.to_string(),
                position: start,
            })?;
            Ok(Token::Decimal(value))
        } else {
            let value = text.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
                text: text.to_string(),
                position: start,
            })?;
            Ok(Token::Integer(value))
        }
    }

    /// Temporal literals start with `@`. The body is scanned greedily over
    /// the date/time alphabet; whitespace or any other character ends it.
    fn temporal_literal(&mut self) -> ParseResult<Token> {
        self.pos += 1; // '@'
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' | b'T' | b'Z' | b':' | b'-' | b'+' | b'.' => self.pos += 1,
                _ => break,
            }
        }
        let text = &self.source[start..self.pos];
        if let Some(time) = text.strip_prefix('T') {
            Ok(Token::Time(time.to_string()))
        } else if text.contains('T') {
            Ok(Token::DateTime(text.to_string()))
        } else {
            Ok(Token::Date(text.to_string()))
        }
    }

    fn external_constant(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 1; // '%'
        match self.peek() {
            Some(b'\'') => {
                if let Token::StringLit(name) = self.string_literal()? {
                    Ok(Token::Variable(name))
                } else {
                    Err(ParseError::UnexpectedCharacter { ch: '%', position: start })
                }
            }
            Some(b'`') => {
                if let Token::Identifier(name) = self.delimited_identifier()? {
                    Ok(Token::Variable(name))
                } else {
                    Err(ParseError::UnexpectedCharacter { ch: '%', position: start })
                }
            }
            Some(c) if c == b'_' || (c as char).is_ascii_alphabetic() => {
                if let Token::Identifier(name) = self.identifier_or_keyword() {
                    Ok(Token::Variable(name))
                } else {
                    // keyword after '%' is still a plain variable name
                    let end = self.pos;
                    Ok(Token::Variable(self.source[start + 1..end].to_string()))
                }
            }
            _ => Err(ParseError::UnexpectedCharacter { ch: '%', position: start }),
        }
    }

    fn dollar_variable(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 1; // '$'
        match self.identifier_or_keyword() {
            Token::Identifier(name) if name == "this" => Ok(Token::This),
            Token::Identifier(name) if name == "index" => Ok(Token::IndexVar),
            Token::Identifier(name) if name == "total" => Ok(Token::TotalVar),
            _ => Err(ParseError::UnexpectedCharacter { ch: '$', position: start }),
        }
    }
}
