//! Typed objects to and from the value tree.
//!
//! [`Mapped`] is the contract a Rust type implements to take part in
//! serialization. Implementations are provided here for primitives, standard
//! collections, and smart pointers; records are registered through
//! [`crate::schema::RecordSchema`] and enums through [`crate::mapped_enum!`].
//!
//! Both directions run inside a context that carries the configuration and
//! bounds container nesting, so a self-referential object graph fails with
//! [`EncodeError::DepthExceeded`] instead of overflowing the stack.

use crate::config::SerializerConfig;
use crate::descriptor::{PrimitiveKind, Shape, TypeDescriptor};
use crate::error::{EncodeError, MismatchKind, TypeMismatchError};
use crate::path::{Path, Segment};
use crate::value::{Map, Number, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

/// A type that converts to and from [`Value`].
pub trait Mapped: Sized {
    /// The shape this type expects.
    fn descriptor() -> TypeDescriptor;

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError>;

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError>;

    /// The value a record field of this type takes when its key is missing.
    /// `None` makes the key required.
    fn absent() -> Option<Self> {
        None
    }
}

/// State for the object-to-value direction.
pub struct EncodeContext<'a> {
    config: &'a SerializerConfig,
    depth: usize,
}

impl<'a> EncodeContext<'a> {
    pub fn new(config: &'a SerializerConfig) -> Self {
        Self { config, depth: 0 }
    }

    pub fn config(&self) -> &SerializerConfig {
        self.config
    }

    /// Run `f` one container level deeper, failing once `max_depth` is reached.
    pub fn nested<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, EncodeError>,
    ) -> Result<R, EncodeError> {
        if self.depth >= self.config.max_depth {
            return Err(EncodeError::DepthExceeded {
                limit: self.config.max_depth,
                path: Path::root(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// State for the value-to-object direction.
pub struct DecodeContext<'a> {
    config: &'a SerializerConfig,
    depth: usize,
}

impl<'a> DecodeContext<'a> {
    pub fn new(config: &'a SerializerConfig) -> Self {
        Self { config, depth: 0 }
    }

    pub fn config(&self) -> &SerializerConfig {
        self.config
    }

    pub fn is_strict(&self) -> bool {
        self.config.is_strict()
    }

    /// Run `f` one container level deeper, failing once `max_depth` is reached.
    pub fn nested<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, TypeMismatchError>,
    ) -> Result<R, TypeMismatchError> {
        if self.depth >= self.config.max_depth {
            return Err(TypeMismatchError::new(MismatchKind::DepthExceeded {
                limit: self.config.max_depth,
            }));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

// ============================================================================
// Primitives
// ============================================================================

impl Mapped for () {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<()>(PrimitiveKind::Unit)
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        match value {
            Value::Null => Ok(()),
            other => Err(TypeMismatchError::expected("null", other)),
        }
    }

    fn absent() -> Option<Self> {
        Some(())
    }
}

impl Mapped for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<bool>(PrimitiveKind::Bool)
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        value
            .as_bool()
            .ok_or_else(|| TypeMismatchError::expected("boolean", value))
    }
}

impl Mapped for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<String>(PrimitiveKind::String)
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| TypeMismatchError::expected("string", value))
    }
}

impl Mapped for char {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<char>(PrimitiveKind::String)
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        let s = value
            .as_str()
            .ok_or_else(|| TypeMismatchError::expected("string", value))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(TypeMismatchError::invalid(format!(
                "{s:?} is not a single character"
            ))),
        }
    }
}

/// Read an integer, accepting integral floats and, in lenient mode, numeric
/// strings.
fn integer_from_value(value: &Value, cx: &DecodeContext<'_>) -> Result<i128, TypeMismatchError> {
    match value {
        Value::Number(Number::Integer(n)) => Ok(*n),
        Value::Number(Number::Float(f)) if f.fract() == 0.0 => {
            if *f >= i128::MIN as f64 && *f < i128::MAX as f64 {
                Ok(*f as i128)
            } else {
                Err(TypeMismatchError::new(MismatchKind::OutOfRange {
                    value: f.to_string(),
                    target: "integer",
                }))
            }
        }
        Value::Number(Number::Float(f)) => Err(TypeMismatchError::invalid(format!(
            "{f} is not an integer"
        ))),
        Value::String(s) if !cx.is_strict() => s
            .parse::<i128>()
            .map_err(|_| TypeMismatchError::invalid(format!("{s:?} is not an integer"))),
        other => Err(TypeMismatchError::expected("integer", other)),
    }
}

fn float_from_value(value: &Value, cx: &DecodeContext<'_>) -> Result<f64, TypeMismatchError> {
    match value {
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if !cx.is_strict() => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| TypeMismatchError::invalid(format!("{s:?} is not a number"))),
        other => Err(TypeMismatchError::expected("number", other)),
    }
}

macro_rules! mapped_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Mapped for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::primitive::<$ty>(PrimitiveKind::Integer)
            }

            fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
                Ok(Value::Number(Number::Integer(*self as i128)))
            }

            fn from_value(
                value: &Value,
                cx: &mut DecodeContext<'_>,
            ) -> Result<Self, TypeMismatchError> {
                let n = integer_from_value(value, cx)?;
                <$ty>::try_from(n).map_err(|_| {
                    TypeMismatchError::new(MismatchKind::OutOfRange {
                        value: n.to_string(),
                        target: stringify!($ty),
                    })
                })
            }
        }
    )*};
}

mapped_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl Mapped for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<f64>(PrimitiveKind::Float)
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        if !self.is_finite() {
            return Err(EncodeError::NonFiniteNumber {
                value: *self,
                path: Path::root(),
            });
        }
        Ok(Value::Number(Number::Float(*self)))
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        float_from_value(value, cx)
    }
}

impl Mapped for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<f32>(PrimitiveKind::Float)
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        if !self.is_finite() {
            return Err(EncodeError::NonFiniteNumber {
                value: f64::from(*self),
                path: Path::root(),
            });
        }
        // Go through the shortest f32 text so 0.1f32 stays 0.1 rather than
        // widening to 0.10000000149011612.
        let widened = self
            .to_string()
            .parse::<f64>()
            .unwrap_or_else(|_| f64::from(*self));
        Ok(Value::Number(Number::Float(widened)))
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        let f = float_from_value(value, cx)?;
        let narrowed = f as f32;
        if narrowed.is_finite() {
            Ok(narrowed)
        } else {
            Err(TypeMismatchError::new(MismatchKind::OutOfRange {
                value: f.to_string(),
                target: "f32",
            }))
        }
    }
}

// ============================================================================
// Dynamic fallback
// ============================================================================

impl Mapped for Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Value", Shape::Dynamic).nullable()
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(self.clone())
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        Ok(value.clone())
    }

    fn absent() -> Option<Self> {
        Some(Value::Null)
    }
}

impl Mapped for Map {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Map", Shape::Mapping(Box::new(Value::descriptor())))
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::Object(self.clone()))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| TypeMismatchError::expected("object", value))
    }
}

// ============================================================================
// Wrappers
// ============================================================================

impl<T: Mapped> Mapped for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor().nullable()
    }

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        match self {
            Some(inner) => inner.to_value(cx),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, cx).map(Some),
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

macro_rules! mapped_pointer {
    ($($ptr:ident),*) => {$(
        impl<T: Mapped> Mapped for $ptr<T> {
            fn descriptor() -> TypeDescriptor {
                T::descriptor()
            }

            fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
                (**self).to_value(cx)
            }

            fn from_value(
                value: &Value,
                cx: &mut DecodeContext<'_>,
            ) -> Result<Self, TypeMismatchError> {
                T::from_value(value, cx).map($ptr::new)
            }

            fn absent() -> Option<Self> {
                T::absent().map($ptr::new)
            }
        }
    )*};
}

mapped_pointer!(Box, Rc, Arc);

impl<T: Mapped> Mapped for RefCell<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        let inner = self
            .try_borrow()
            .map_err(|_| EncodeError::custom("value is mutably borrowed"))?;
        inner.to_value(cx)
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        T::from_value(value, cx).map(RefCell::new)
    }

    fn absent() -> Option<Self> {
        T::absent().map(RefCell::new)
    }
}

// ============================================================================
// Sequences
// ============================================================================

fn encode_sequence<'t, T: Mapped + 't>(
    items: impl Iterator<Item = &'t T>,
    cx: &mut EncodeContext<'_>,
) -> Result<Value, EncodeError> {
    cx.nested(|cx| {
        items
            .enumerate()
            .map(|(i, item)| {
                item.to_value(cx)
                    .map_err(|e| e.within(Segment::Index(i)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    })
}

fn decode_sequence<T: Mapped>(
    value: &Value,
    cx: &mut DecodeContext<'_>,
) -> Result<Vec<T>, TypeMismatchError> {
    let items = value
        .as_array()
        .ok_or_else(|| TypeMismatchError::expected("array", value))?;
    cx.nested(|cx| {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_value(item, cx).map_err(|e| e.within(Segment::Index(i))))
            .collect()
    })
}

impl<T: Mapped> Mapped for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            Shape::Sequence(Box::new(T::descriptor())),
        )
    }

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        encode_sequence(self.iter(), cx)
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        decode_sequence(value, cx)
    }
}

impl<T: Mapped> Mapped for VecDeque<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            Shape::Sequence(Box::new(T::descriptor())),
        )
    }

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        encode_sequence(self.iter(), cx)
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        decode_sequence(value, cx).map(VecDeque::from)
    }
}

// ============================================================================
// Mappings
// ============================================================================

fn encode_mapping<'t, T: Mapped + 't>(
    entries: impl Iterator<Item = (&'t String, &'t T)>,
    cx: &mut EncodeContext<'_>,
) -> Result<Value, EncodeError> {
    cx.nested(|cx| {
        let mut map = Map::new();
        for (key, item) in entries {
            let value = item
                .to_value(cx)
                .map_err(|e| e.within(Segment::Field(key.clone())))?;
            map.insert(key.clone(), value);
        }
        Ok(Value::Object(map))
    })
}

fn decode_mapping<T: Mapped, C: FromIterator<(String, T)>>(
    value: &Value,
    cx: &mut DecodeContext<'_>,
) -> Result<C, TypeMismatchError> {
    let map = value
        .as_object()
        .ok_or_else(|| TypeMismatchError::expected("object", value))?;
    cx.nested(|cx| {
        map.iter()
            .map(|(key, item)| {
                T::from_value(item, cx)
                    .map(|decoded| (key.to_owned(), decoded))
                    .map_err(|e| e.within(Segment::Field(key.to_owned())))
            })
            .collect()
    })
}

impl<T: Mapped> Mapped for BTreeMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            Shape::Mapping(Box::new(T::descriptor())),
        )
    }

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        encode_mapping(self.iter(), cx)
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        decode_mapping(value, cx)
    }
}

/// Keys are written in sorted order so the output does not depend on hashing.
impl<T: Mapped, S: BuildHasher + Default> Mapped for HashMap<String, T, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            std::any::type_name::<Self>(),
            Shape::Mapping(Box::new(T::descriptor())),
        )
    }

    fn to_value(&self, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        let mut entries: Vec<(&String, &T)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        encode_mapping(entries.into_iter(), cx)
    }

    fn from_value(value: &Value, cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        decode_mapping(value, cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_str;

    fn encode<T: Mapped>(value: &T) -> Result<Value, EncodeError> {
        let config = SerializerConfig::default();
        value.to_value(&mut EncodeContext::new(&config))
    }

    fn decode<T: Mapped>(json: &str) -> Result<T, TypeMismatchError> {
        decode_with(json, &SerializerConfig::default())
    }

    fn decode_with<T: Mapped>(json: &str, config: &SerializerConfig) -> Result<T, TypeMismatchError> {
        let value = parse_str(json).unwrap();
        T::from_value(&value, &mut DecodeContext::new(config))
    }

    #[test]
    fn integers_range_checked() {
        assert_eq!(decode::<u8>("255").unwrap(), 255);
        let err = decode::<u8>("256").unwrap_err();
        assert_eq!(
            err.kind,
            MismatchKind::OutOfRange {
                value: "256".into(),
                target: "u8"
            }
        );
        assert!(decode::<u32>("-1").is_err());
        assert_eq!(decode::<i64>("-9223372036854775808").unwrap(), i64::MIN);
        assert_eq!(decode::<u64>("18446744073709551615").unwrap(), u64::MAX);
    }

    #[test]
    fn integral_float_accepted_for_integer() {
        assert_eq!(decode::<i32>("5.0").unwrap(), 5);
        assert!(matches!(
            decode::<i32>("5.5").unwrap_err().kind,
            MismatchKind::InvalidValue(_)
        ));
    }

    #[test]
    fn numeric_strings_only_in_lenient_mode() {
        assert_eq!(decode::<i32>(r#""43""#).unwrap(), 43);
        assert_eq!(decode::<f64>(r#""2.5""#).unwrap(), 2.5);
        assert!(decode::<f64>(r#""NaN""#).is_err());

        let strict = SerializerConfig::strict();
        let err = decode_with::<i32>(r#""43""#, &strict).unwrap_err();
        assert_eq!(
            err.kind,
            MismatchKind::Expected {
                expected: "integer",
                found: "string"
            }
        );
    }

    #[test]
    fn floats() {
        assert_eq!(decode::<f64>("3").unwrap(), 3.0);
        assert_eq!(encode(&0.1f32).unwrap(), Value::from(0.1));
        assert!(decode::<f32>("1e300").is_err());
        assert!(matches!(
            encode(&f64::NAN).unwrap_err(),
            EncodeError::NonFiniteNumber { .. }
        ));
    }

    #[test]
    fn chars() {
        assert_eq!(decode::<char>(r#""x""#).unwrap(), 'x');
        assert!(decode::<char>(r#""xy""#).is_err());
        assert_eq!(encode(&'é').unwrap(), Value::from("é"));
    }

    #[test]
    fn options() {
        assert_eq!(decode::<Option<String>>("null").unwrap(), None);
        assert_eq!(
            decode::<Option<String>>(r#""a""#).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(encode(&None::<i32>).unwrap(), Value::Null);
        assert_eq!(Option::<i32>::absent(), Some(None));
        assert_eq!(i32::absent(), None);
    }

    #[test]
    fn sequences_report_index() {
        assert_eq!(decode::<Vec<i32>>("[1,2,3]").unwrap(), vec![1, 2, 3]);
        let err = decode::<Vec<i32>>(r#"[1,"two",3]"#).unwrap_err();
        assert_eq!(err.path.to_string(), "root[1]");

        let strict = SerializerConfig::strict();
        let err = decode_with::<Vec<i32>>(r#"[1,"two",3]"#, &strict).unwrap_err();
        assert_eq!(err.path.to_string(), "root[1]");

        let err = decode::<Vec<i32>>(r#"{"a":1}"#).unwrap_err();
        assert_eq!(
            err.kind,
            MismatchKind::Expected {
                expected: "array",
                found: "object"
            }
        );
    }

    #[test]
    fn hash_maps_encode_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        map.insert("c".to_string(), 3);
        let value = encode(&map).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn mappings_report_key() {
        let err = decode::<BTreeMap<String, u8>>(r#"{"ok":1,"bad":300}"#).unwrap_err();
        assert_eq!(err.path.to_string(), "root.bad");
    }

    #[test]
    fn dynamic_value_passes_through() {
        let value = decode::<Value>(r#"{"k":[1,true]}"#).unwrap();
        assert_eq!(encode(&value).unwrap(), value);
    }

    #[test]
    fn depth_guard_on_decode() {
        let config = SerializerConfig::default().with_max_depth(2);
        let err = decode_with::<Vec<Vec<Vec<i32>>>>("[[[1]]]", &config).unwrap_err();
        assert_eq!(err.kind, MismatchKind::DepthExceeded { limit: 2 });
        assert_eq!(err.path.to_string(), "root[0][0]");
    }

    #[test]
    fn smart_pointers() {
        let boxed: Box<i32> = decode("7").unwrap();
        assert_eq!(*boxed, 7);
        let shared: Rc<RefCell<String>> = decode(r#""s""#).unwrap();
        assert_eq!(encode(&shared).unwrap(), Value::from("s"));
        let arc: Arc<Option<u8>> = decode("null").unwrap();
        assert_eq!(*arc, None);
    }
}
