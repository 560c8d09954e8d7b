//! Typed objects to JSON text and back.
//!
//! [`Serializer`] chains the type mapper with the reader or writer. Each call
//! is all-or-nothing: text or an object is returned only after every stage
//! succeeded.

use crate::config::{Mode, SerializerConfig};
use crate::descriptor::TypeDescriptor;
use crate::error::{DecodeError, EncodeError, TypeMismatchError};
use crate::mapper::{DecodeContext, EncodeContext, Mapped};
use crate::reader;
use crate::value::Value;
use crate::writer::{self, WriteOptions};

/// A configured JSON serializer. Holds no state besides its configuration, so
/// it can be cloned freely and shared between threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Serializer {
    config: SerializerConfig,
}

impl Serializer {
    pub fn new(mode: Mode) -> Self {
        Self::with_config(SerializerConfig::default().with_mode(mode))
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Describe what `T` maps to without converting anything.
    pub fn descriptor<T: Mapped>(&self) -> TypeDescriptor {
        T::descriptor()
    }

    pub fn to_value<T: Mapped>(&self, object: &T) -> Result<Value, EncodeError> {
        object.to_value(&mut EncodeContext::new(&self.config))
    }

    pub fn from_value<T: Mapped>(&self, value: &Value) -> Result<T, TypeMismatchError> {
        T::from_value(value, &mut DecodeContext::new(&self.config))
    }

    /// Serialize `object`, compact or indented according to the configuration.
    pub fn to_json<T: Mapped>(&self, object: &T) -> Result<String, EncodeError> {
        let options = WriteOptions {
            indent: self.config.indent,
            max_depth: self.config.max_depth,
        };
        let text = self
            .to_value(object)
            .and_then(|value| writer::render_with(&value, &options));
        match &text {
            Ok(text) => tracing::trace!(
                target_type = std::any::type_name::<T>(),
                bytes = text.len(),
                "serialized"
            ),
            Err(e) => tracing::debug!(
                target_type = std::any::type_name::<T>(),
                path = %e.path(),
                "serialization failed: {e}"
            ),
        }
        text
    }

    pub fn from_json<T: Mapped>(&self, json: &str) -> Result<T, DecodeError> {
        self.from_slice(json.as_bytes())
    }

    /// Deserialize from raw bytes, which must be UTF-8.
    pub fn from_slice<T: Mapped>(&self, json: &[u8]) -> Result<T, DecodeError> {
        let result = reader::parse_with_limits(json, self.config.max_depth)
            .map_err(DecodeError::from)
            .and_then(|value| self.from_value(&value).map_err(DecodeError::from));
        match &result {
            Ok(_) => tracing::trace!(
                target_type = std::any::type_name::<T>(),
                bytes = json.len(),
                "deserialized"
            ),
            Err(DecodeError::Parse(e)) => tracing::debug!(
                target_type = std::any::type_name::<T>(),
                offset = e.offset,
                "parse failed: {e}"
            ),
            Err(DecodeError::Type(e)) => tracing::debug!(
                target_type = std::any::type_name::<T>(),
                path = %e.path,
                "type mapping failed: {e}"
            ),
        }
        result
    }
}

/// A lenient serializer with default settings.
pub fn create_serializer() -> Serializer {
    Serializer::default()
}

pub fn create_serializer_with(config: SerializerConfig) -> Serializer {
    Serializer::with_config(config)
}
