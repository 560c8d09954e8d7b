//! Record registration.
//!
//! A record type describes its fields once, as `(name, getter, setter)`
//! triples, and [`mapped_record!`](crate::mapped_record) wires that schema
//! into [`Mapped`]. The schema is built lazily on first use and shared
//! read-only afterwards.
//!
//! ```
//! use json_serializer::{create_serializer, mapped_record, RecordSchema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! mapped_record!(
//!     Person,
//!     RecordSchema::new("Person", Person::default)
//!         .field("name", |p: &Person| &p.name, |p, v| p.name = v)
//!         .field("age", |p: &Person| &p.age, |p, v| p.age = v)
//! );
//!
//! let serializer = create_serializer();
//! let ann = Person { name: "ann".into(), age: 30 };
//! assert_eq!(serializer.to_json(&ann).unwrap(), r#"{"name":"ann","age":30}"#);
//! assert_eq!(serializer.from_json::<Person>(r#"{"age":30,"name":"ann"}"#).unwrap(), ann);
//! ```

use crate::descriptor::{Shape, TypeDescriptor};
use crate::error::{EncodeError, MismatchKind, TypeMismatchError};
use crate::mapper::{DecodeContext, EncodeContext, Mapped};
use crate::path::Segment;
use crate::value::{Map, Value};
use std::fmt;

type EncodeFn<T> =
    Box<dyn Fn(&T, &mut EncodeContext<'_>) -> Result<Value, EncodeError> + Send + Sync>;

/// `None` for the value means the key was missing from the object.
type DecodeFn<T> = Box<
    dyn Fn(&mut T, Option<&Value>, &mut DecodeContext<'_>) -> Result<(), TypeMismatchError>
        + Send
        + Sync,
>;

struct FieldSpec<T> {
    name: &'static str,
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

/// Field list and construction function for a record type `T`.
pub struct RecordSchema<T> {
    name: &'static str,
    construct: Box<dyn Fn() -> T + Send + Sync>,
    fields: Vec<FieldSpec<T>>,
}

impl<T: 'static> RecordSchema<T> {
    /// `construct` produces the instance that decoded fields are written into,
    /// usually `T::default`.
    pub fn new(name: &'static str, construct: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            name,
            construct: Box::new(construct),
            fields: Vec::new(),
        }
    }

    /// Register a field. A missing key falls back to [`Mapped::absent`], so
    /// `Option` fields are optional and everything else is required.
    ///
    /// Registering the same name twice replaces the earlier field in place.
    pub fn field<F: Mapped + 'static>(
        self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.push_field(name, get, set, F::absent)
    }

    /// Register a field whose missing key decodes to `default()`.
    pub fn field_with_default<F: Mapped + 'static>(
        self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
        default: impl Fn() -> F + Send + Sync + 'static,
    ) -> Self {
        self.push_field(name, get, set, move || Some(default()))
    }

    fn push_field<F: Mapped + 'static>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
        fallback: impl Fn() -> Option<F> + Send + Sync + 'static,
    ) -> Self {
        let encode = move |record: &T, cx: &mut EncodeContext<'_>| get(record).to_value(cx);
        let decode = move |record: &mut T,
                          value: Option<&Value>,
                          cx: &mut DecodeContext<'_>|
              -> Result<(), TypeMismatchError> {
            let decoded = match value {
                Some(value) => F::from_value(value, cx)?,
                None => {
                    fallback().ok_or_else(|| TypeMismatchError::new(MismatchKind::MissingField))?
                }
            };
            set(record, decoded);
            Ok(())
        };
        let spec = FieldSpec {
            name,
            encode: Box::new(encode),
            decode: Box::new(decode),
        };
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registered field names, in output order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::new(self.name, Shape::Record(self.field_names().collect()))
    }

    /// One object entry per field, in registration order.
    pub fn encode(&self, record: &T, cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        cx.nested(|cx| {
            let omit_nulls = cx.config().omit_null_fields;
            let mut map = Map::with_capacity(self.fields.len());
            for field in &self.fields {
                let value = (field.encode)(record, cx)
                    .map_err(|e| e.within(Segment::Field(field.name.to_owned())))?;
                if omit_nulls && value.is_null() {
                    continue;
                }
                map.insert(field.name, value);
            }
            Ok(Value::Object(map))
        })
    }

    pub fn decode(&self, value: &Value, cx: &mut DecodeContext<'_>) -> Result<T, TypeMismatchError> {
        let object = value
            .as_object()
            .ok_or_else(|| TypeMismatchError::expected("object", value))?;
        cx.nested(|cx| {
            if cx.is_strict() {
                if let Some(key) = object.keys().find(|key| !self.has_field(key)) {
                    return Err(TypeMismatchError::new(MismatchKind::UnknownField)
                        .within(Segment::Field(key.to_owned())));
                }
            }
            let mut record = (self.construct)();
            for field in &self.fields {
                (field.decode)(&mut record, object.get(field.name), cx)
                    .map_err(|e| e.within(Segment::Field(field.name.to_owned())))?;
            }
            Ok(record)
        })
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

impl<T> fmt::Debug for RecordSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|s| s.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A type with a registered [`RecordSchema`]. Implemented by
/// [`mapped_record!`](crate::mapped_record).
pub trait Record: Sized + 'static {
    fn schema() -> &'static RecordSchema<Self>;
}

/// Implement [`Record`] and [`Mapped`] for a concrete struct from a schema
/// expression. The expression is evaluated once, on first use.
#[macro_export]
macro_rules! mapped_record {
    ($ty:ty, $schema:expr $(,)?) => {
        impl $crate::schema::Record for $ty {
            fn schema() -> &'static $crate::schema::RecordSchema<Self> {
                static SCHEMA: ::std::sync::OnceLock<$crate::schema::RecordSchema<$ty>> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| $schema)
            }
        }

        impl $crate::Mapped for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                <Self as $crate::schema::Record>::schema().descriptor()
            }

            fn to_value(
                &self,
                cx: &mut $crate::EncodeContext<'_>,
            ) -> ::std::result::Result<$crate::Value, $crate::EncodeError> {
                <Self as $crate::schema::Record>::schema().encode(self, cx)
            }

            fn from_value(
                value: &$crate::Value,
                cx: &mut $crate::DecodeContext<'_>,
            ) -> ::std::result::Result<Self, $crate::TypeMismatchError> {
                <Self as $crate::schema::Record>::schema().decode(value, cx)
            }
        }
    };
}

/// Implement [`Mapped`] for a fieldless enum, each variant written as the
/// given string.
///
/// ```
/// use json_serializer::{create_serializer, mapped_enum};
///
/// #[derive(Debug, PartialEq)]
/// enum Level { Low, High }
///
/// mapped_enum!(Level { Low => "LOW", High => "HIGH" });
///
/// let serializer = create_serializer();
/// assert_eq!(serializer.to_json(&Level::High).unwrap(), r#""HIGH""#);
/// assert_eq!(serializer.from_json::<Level>(r#""LOW""#).unwrap(), Level::Low);
/// ```
#[macro_export]
macro_rules! mapped_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $crate::Mapped for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::new(
                    stringify!($ty),
                    $crate::Shape::Primitive($crate::PrimitiveKind::Enum(vec![$($name),+])),
                )
            }

            fn to_value(
                &self,
                _cx: &mut $crate::EncodeContext<'_>,
            ) -> ::std::result::Result<$crate::Value, $crate::EncodeError> {
                let name = match self {
                    $($ty::$variant => $name,)+
                };
                Ok($crate::Value::String(name.to_owned()))
            }

            fn from_value(
                value: &$crate::Value,
                _cx: &mut $crate::DecodeContext<'_>,
            ) -> ::std::result::Result<Self, $crate::TypeMismatchError> {
                let name = value
                    .as_str()
                    .ok_or_else(|| $crate::TypeMismatchError::expected("string", value))?;
                match name {
                    $($name => Ok($ty::$variant),)+
                    other => Err($crate::TypeMismatchError::new(
                        $crate::MismatchKind::UnknownVariant {
                            variant: other.to_owned(),
                        },
                    )),
                }
            }
        }
    };
}
