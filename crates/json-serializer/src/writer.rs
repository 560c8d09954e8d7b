//! JSON text writer.
//!
//! Renders a [`Value`] deterministically: array elements and object entries appear
//! in stored order, and the same value always produces the same text.
//!
//! - **Strings**: `"` and `\` are escaped, control characters use `\b \f \n \r \t`
//!   or `\u00XX`. Non-ASCII characters are written as raw UTF-8, never escaped.
//! - **Integers**: plain digits, no decimal point.
//! - **Floats**: shortest text that parses back to the same `f64`, always with a
//!   `.` or an exponent so it re-reads as a float (`1.0`, `0.1`, `1e300`).
//! - **Non-finite floats** and over-deep values are rejected with [`EncodeError`].
//!
//! # Example
//! ```
//! use json_serializer::{writer, Map, Value};
//!
//! let mut map = Map::new();
//! map.insert("name", Value::from("ann"));
//! map.insert("age", Value::from(30));
//! assert_eq!(writer::render(&Value::Object(map)).unwrap(), r#"{"name":"ann","age":30}"#);
//! ```

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::EncodeError;
use crate::path::{Path, Segment};
use crate::value::{Map, Number, Value};
use std::fmt::Write as _;

/// Layout options for [`render_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// `None` renders compact text; `Some(n)` puts each entry on its own line,
    /// indented by `n` spaces per level, with `": "` between key and value.
    pub indent: Option<usize>,
    pub max_depth: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Render compact JSON.
pub fn render(value: &Value) -> Result<String, EncodeError> {
    render_with(value, &WriteOptions::default())
}

/// Render indented JSON, `indent` spaces per level.
pub fn render_pretty(value: &Value, indent: usize) -> Result<String, EncodeError> {
    render_with(
        value,
        &WriteOptions {
            indent: Some(indent),
            ..WriteOptions::default()
        },
    )
}

/// Render with explicit options. Nothing is returned unless the whole value
/// rendered successfully.
pub fn render_with(value: &Value, options: &WriteOptions) -> Result<String, EncodeError> {
    let mut writer = Writer {
        out: String::new(),
        options,
    };
    writer.write_value(value, 0)?;
    Ok(writer.out)
}

struct Writer<'o> {
    out: String,
    options: &'o WriteOptions,
}

impl Writer<'_> {
    fn write_value(&mut self, value: &Value, depth: usize) -> Result<(), EncodeError> {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => write_number(n, &mut self.out)?,
            Value::String(s) => write_string(s, &mut self.out),
            Value::Array(items) => self.write_array(items, depth)?,
            Value::Object(map) => self.write_object(map, depth)?,
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), EncodeError> {
        if depth >= self.options.max_depth {
            return Err(EncodeError::DepthExceeded {
                limit: self.options.max_depth,
                path: Path::root(),
            });
        }
        Ok(())
    }

    fn write_array(&mut self, items: &[Value], depth: usize) -> Result<(), EncodeError> {
        self.check_depth(depth)?;
        if items.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }
        self.out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline(depth + 1);
            self.write_value(item, depth + 1)
                .map_err(|e| e.within(Segment::Index(i)))?;
        }
        self.newline(depth);
        self.out.push(']');
        Ok(())
    }

    fn write_object(&mut self, map: &Map, depth: usize) -> Result<(), EncodeError> {
        self.check_depth(depth)?;
        if map.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push('{');
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline(depth + 1);
            write_string(key, &mut self.out);
            self.out
                .push_str(if self.options.indent.is_some() { ": " } else { ":" });
            self.write_value(value, depth + 1)
                .map_err(|e| e.within(Segment::Field(key.to_owned())))?;
        }
        self.newline(depth);
        self.out.push('}');
        Ok(())
    }

    /// Line break plus indentation in pretty mode; nothing in compact mode.
    fn newline(&mut self, depth: usize) {
        if let Some(indent) = self.options.indent {
            self.out.push('\n');
            self.out.extend(std::iter::repeat_n(' ', indent * depth));
        }
    }
}

fn write_number(n: &Number, out: &mut String) -> Result<(), EncodeError> {
    match *n {
        Number::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        Number::Float(f) if !f.is_finite() => {
            return Err(EncodeError::NonFiniteNumber {
                value: f,
                path: Path::root(),
            });
        }
        Number::Float(f) => out.push_str(&format_float(f)),
    }
    Ok(())
}

/// Shortest round-trip representation of a finite float.
///
/// `{:?}` already yields the shortest digits that read back to the same `f64`
/// and keeps a `.0` on integral values (`1.0`), switching to exponent form for
/// very large or small magnitudes (`1e300`, `1e-7`); both forms are valid JSON.
pub(crate) fn format_float(f: f64) -> String {
    format!("{f:?}")
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    let mut run_start = 0;
    for (i, byte) in s.bytes().enumerate() {
        let escape = match byte {
            b'"' => "\\\"",
            b'\\' => "\\\\",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            0x08 => "\\b",
            0x0C => "\\f",
            0x00..=0x1F => "",
            _ => continue,
        };
        out.push_str(&s[run_start..i]);
        if escape.is_empty() {
            let _ = write!(out, "\\u{byte:04x}");
        } else {
            out.push_str(escape);
        }
        run_start = i + 1;
    }
    out.push_str(&s[run_start..]);
    out.push('"');
}
