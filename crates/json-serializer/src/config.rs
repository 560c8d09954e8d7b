//! Serializer configuration.
//!
//! [`SerializerConfig`] derives serde traits so a host application can embed it in
//! its own settings file; every field has a default.

use serde::{Deserialize, Serialize};

/// Nesting limit applied to parsing, rendering, and type mapping.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Decoding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unknown object keys are ignored and numeric strings decode into numbers.
    #[default]
    Lenient,
    /// Unknown object keys and numeric strings are type mismatches.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub mode: Mode,
    pub max_depth: usize,
    /// Spaces per level for pretty output; `None` for compact output.
    pub indent: Option<usize>,
    /// Leave record fields out of the output when their value is `null`.
    pub omit_null_fields: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
            indent: None,
            omit_null_fields: true,
        }
    }
}

impl SerializerConfig {
    pub fn strict() -> Self {
        Self::default().with_mode(Mode::Strict)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_omit_null_fields(mut self, omit: bool) -> Self {
        self.omit_null_fields = omit;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.mode == Mode::Strict
    }
}
