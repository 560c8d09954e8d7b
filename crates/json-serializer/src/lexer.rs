//! JSON tokenizer.
//!
//! Splits validated UTF-8 input into tokens for the reader. Strings are unescaped
//! here (including `\uXXXX` surrogate pairs) and numbers are classified into
//! [`Number::Integer`] or [`Number::Float`].

use crate::error::{ParseError, ParseErrorKind};
use crate::value::Number;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Null,
    True,
    False,
    /// Unescaped string content.
    String(String),
    Number(Number),
    Eof,
}

impl Token {
    /// Short description used in "unexpected ..." errors.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Token::LeftBrace => "'{'",
            Token::RightBrace => "'}'",
            Token::LeftBracket => "'['",
            Token::RightBracket => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Null => "null",
            Token::True | Token::False => "boolean",
            Token::String(_) => "string",
            Token::Number(_) => "number",
            Token::Eof => "end of input",
        }
    }
}

pub(crate) struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    /// Offset of the most recently returned token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Validates the whole input as UTF-8 up front, so string slicing below only
    /// ever happens on char boundaries (all delimiters are ASCII).
    pub(crate) fn new(input: &'a [u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(input).map_err(|e| {
            ParseError::new(e.valid_up_to(), ParseErrorKind::InvalidUtf8, "UTF-8 text")
        })?;
        Ok(Self {
            text,
            pos: 0,
            start: 0,
        })
    }

    pub(crate) fn token_start(&self) -> usize {
        self.start
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        self.start = self.pos;

        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };
        let token = match byte {
            b'{' => Token::LeftBrace,
            b'}' => Token::RightBrace,
            b'[' => Token::LeftBracket,
            b']' => Token::RightBracket,
            b':' => Token::Colon,
            b',' => Token::Comma,
            b'"' => return self.read_string().map(Token::String),
            b'-' | b'0'..=b'9' => return self.read_number().map(Token::Number),
            b't' => return self.read_literal("true", Token::True),
            b'f' => return self.read_literal("false", Token::False),
            b'n' => return self.read_literal("null", Token::Null),
            _ => return Err(self.unexpected_character("value")),
        };
        self.pos += 1;
        Ok(token)
    }

    fn unexpected_character(&self, expected: &'static str) -> ParseError {
        let ch = self.text[self.pos..].chars().next().unwrap_or('\0');
        ParseError::new(self.pos, ParseErrorKind::UnexpectedCharacter(ch), expected)
    }

    fn read_literal(&mut self, literal: &'static str, token: Token) -> Result<Token, ParseError> {
        for expected in literal.bytes() {
            match self.peek() {
                Some(b) if b == expected => self.pos += 1,
                Some(_) => return Err(self.unexpected_character(literal)),
                None => {
                    return Err(ParseError::new(
                        self.pos,
                        ParseErrorKind::UnexpectedEnd,
                        literal,
                    ))
                }
            }
        }
        Ok(token)
    }

    /// Read a string literal. Unescaped runs are copied as slices; escapes are
    /// decoded one at a time.
    fn read_string(&mut self) -> Result<String, ParseError> {
        // Opening quote
        self.pos += 1;
        let mut out = String::new();
        let mut run_start = self.pos;

        loop {
            let Some(byte) = self.peek() else {
                return Err(ParseError::new(
                    self.pos,
                    ParseErrorKind::UnterminatedString,
                    "closing '\"'",
                ));
            };
            match byte {
                b'"' => {
                    out.push_str(&self.text[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    out.push_str(&self.text[run_start..self.pos]);
                    let escape_start = self.pos;
                    self.pos += 1;
                    out.push(self.read_escape(escape_start)?);
                    run_start = self.pos;
                }
                0x00..=0x1F => {
                    return Err(ParseError::new(
                        self.pos,
                        ParseErrorKind::ControlCharacter,
                        "escaped control character",
                    ));
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Decode the escape whose backslash sits at `escape_start`.
    fn read_escape(&mut self, escape_start: usize) -> Result<char, ParseError> {
        let Some(byte) = self.peek() else {
            return Err(ParseError::new(
                self.pos,
                ParseErrorKind::UnterminatedString,
                "escape character",
            ));
        };
        let ch = match byte {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                self.pos += 1;
                return self.read_unicode_escape(escape_start);
            }
            _ => {
                return Err(ParseError::new(
                    self.pos,
                    ParseErrorKind::InvalidEscape,
                    "one of \" \\ / b f n r t u",
                ));
            }
        };
        self.pos += 1;
        Ok(ch)
    }

    /// Decode `XXXX` after `\u`, pairing a high surrogate with the following
    /// `\uXXXX` low surrogate.
    fn read_unicode_escape(&mut self, escape_start: usize) -> Result<char, ParseError> {
        let unit = self.read_hex4()?;

        if (0xDC00..=0xDFFF).contains(&unit) {
            return Err(ParseError::new(
                escape_start,
                ParseErrorKind::InvalidUnicodeEscape,
                "high surrogate before low surrogate",
            ));
        }
        if !(0xD800..=0xDBFF).contains(&unit) {
            return char::from_u32(u32::from(unit)).ok_or(ParseError::new(
                escape_start,
                ParseErrorKind::InvalidUnicodeEscape,
                "unicode scalar value",
            ));
        }

        let low_start = self.pos;
        if !self.text[self.pos..].starts_with("\\u") {
            return Err(ParseError::new(
                low_start,
                ParseErrorKind::InvalidUnicodeEscape,
                "low surrogate escape",
            ));
        }
        self.pos += 2;
        let low = self.read_hex4()?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return Err(ParseError::new(
                low_start,
                ParseErrorKind::InvalidUnicodeEscape,
                "low surrogate escape",
            ));
        }

        let combined = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
        char::from_u32(combined).ok_or(ParseError::new(
            escape_start,
            ParseErrorKind::InvalidUnicodeEscape,
            "unicode scalar value",
        ))
    }

    fn read_hex4(&mut self) -> Result<u16, ParseError> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let digit = match self.peek() {
                Some(b @ b'0'..=b'9') => b - b'0',
                Some(b @ b'a'..=b'f') => b - b'a' + 10,
                Some(b @ b'A'..=b'F') => b - b'A' + 10,
                Some(_) => {
                    return Err(ParseError::new(
                        self.pos,
                        ParseErrorKind::InvalidEscape,
                        "hex digit",
                    ))
                }
                None => {
                    return Err(ParseError::new(
                        self.pos,
                        ParseErrorKind::UnterminatedString,
                        "hex digit",
                    ))
                }
            };
            value = (value << 4) | u16::from(digit);
            self.pos += 1;
        }
        Ok(value)
    }

    /// Read `-? (0 | [1-9][0-9]*) (.[0-9]+)? ([eE][+-]?[0-9]+)?`.
    fn read_number(&mut self) -> Result<Number, ParseError> {
        let start = self.pos;
        let mut integral = true;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                // No leading zeros
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.invalid_number("'.', exponent, or end of number"));
                }
            }
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.invalid_number("digit")),
        }

        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.invalid_number("digit after '.'"));
            }
            self.skip_digits();
        }

        if let Some(b'e' | b'E') = self.peek() {
            integral = false;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.invalid_number("exponent digit"));
            }
            self.skip_digits();
        }

        let literal = &self.text[start..self.pos];
        if integral {
            if let Ok(n) = literal.parse::<i128>() {
                return Ok(Number::Integer(n));
            }
        }
        // Grammar already checked, so this only fails on pathological input.
        let f: f64 = literal
            .parse()
            .map_err(|_| ParseError::new(start, ParseErrorKind::InvalidNumber, "number"))?;
        if !f.is_finite() {
            return Err(ParseError::new(
                start,
                ParseErrorKind::NumberOutOfRange,
                "finite number",
            ));
        }
        Ok(Number::Float(f))
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    fn invalid_number(&self, expected: &'static str) -> ParseError {
        ParseError::new(self.pos, ParseErrorKind::InvalidNumber, expected)
    }
}
