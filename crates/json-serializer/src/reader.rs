//! JSON text reader.
//!
//! Recursive descent over the token stream from [`crate::lexer`], producing
//! exactly one [`Value`] per document.
//!
//! - Duplicate object keys: the last occurrence wins (see [`Map::insert`]).
//! - Trailing commas, trailing content, and empty input are rejected.
//! - Nesting is bounded by `max_depth` so hostile input cannot exhaust the stack.
//!
//! # Example
//! ```
//! use json_serializer::reader::parse_str;
//!
//! let value = parse_str(r#"{"name":"ann","tags":["a","b"]}"#).unwrap();
//! assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("ann"));
//! ```

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token};
use crate::value::{Map, Value};

/// Parse a complete JSON document with the default depth limit.
pub fn parse(input: &[u8]) -> Result<Value, ParseError> {
    parse_with_limits(input, DEFAULT_MAX_DEPTH)
}

pub fn parse_str(input: &str) -> Result<Value, ParseError> {
    parse(input.as_bytes())
}

/// Parse a complete JSON document, allowing at most `max_depth` nested
/// arrays/objects.
pub fn parse_with_limits(input: &[u8], max_depth: usize) -> Result<Value, ParseError> {
    Parser::new(input, max_depth)?.parse_document()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Byte offset of `current`.
    offset: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8], max_depth: usize) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(input)?;
        let current = lexer.next_token()?;
        let offset = lexer.token_start();
        Ok(Self {
            lexer,
            current,
            offset,
            depth: 0,
            max_depth,
        })
    }

    fn parse_document(&mut self) -> Result<Value, ParseError> {
        if self.current == Token::Eof {
            return Err(ParseError::new(0, ParseErrorKind::EmptyInput, "value"));
        }
        let value = self.parse_value()?;
        if self.current != Token::Eof {
            return Err(ParseError::new(
                self.offset,
                ParseErrorKind::TrailingContent,
                "end of input",
            ));
        }
        Ok(value)
    }

    /// Take the current token and its offset, advancing to the next one.
    fn bump(&mut self) -> Result<(Token, usize), ParseError> {
        let next = self.lexer.next_token()?;
        let next_offset = self.lexer.token_start();
        let token = std::mem::replace(&mut self.current, next);
        let offset = std::mem::replace(&mut self.offset, next_offset);
        Ok((token, offset))
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let (token, offset) = self.bump()?;
        match token {
            Token::Null => Ok(Value::Null),
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::String(s) => Ok(Value::String(s)),
            Token::Number(n) => Ok(Value::Number(n)),
            Token::LeftBrace => self.parse_object(offset),
            Token::LeftBracket => self.parse_array(offset),
            other => Err(unexpected(&other, offset, "value")),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::new(
                offset,
                ParseErrorKind::DepthLimitExceeded(self.max_depth),
                "shallower nesting",
            ));
        }
        Ok(())
    }

    /// Called with the opening `{` already consumed.
    fn parse_object(&mut self, open_offset: usize) -> Result<Value, ParseError> {
        self.enter(open_offset)?;
        let mut map = Map::new();

        if self.current == Token::RightBrace {
            self.bump()?;
            self.depth -= 1;
            return Ok(Value::Object(map));
        }

        loop {
            let key = match self.bump()? {
                (Token::String(key), _) => key,
                (other, offset) => return Err(unexpected(&other, offset, "string key")),
            };

            match self.bump()? {
                (Token::Colon, _) => {}
                (other, offset) => return Err(unexpected(&other, offset, "':'")),
            }

            let value = self.parse_value()?;
            map.insert(key, value);

            match self.bump()? {
                (Token::Comma, _) => {}
                (Token::RightBrace, _) => break,
                (other, offset) => return Err(unexpected(&other, offset, "',' or '}'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    /// Called with the opening `[` already consumed.
    fn parse_array(&mut self, open_offset: usize) -> Result<Value, ParseError> {
        self.enter(open_offset)?;
        let mut items = Vec::new();

        if self.current == Token::RightBracket {
            self.bump()?;
            self.depth -= 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value()?);

            match self.bump()? {
                (Token::Comma, _) => {}
                (Token::RightBracket, _) => break,
                (other, offset) => return Err(unexpected(&other, offset, "',' or ']'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }
}

/// End of input is reported as such, so unbalanced brackets read naturally.
fn unexpected(token: &Token, offset: usize, expected: &'static str) -> ParseError {
    let kind = match token {
        Token::Eof => ParseErrorKind::UnexpectedEnd,
        other => ParseErrorKind::UnexpectedToken(other.describe()),
    };
    ParseError::new(offset, kind, expected)
}
