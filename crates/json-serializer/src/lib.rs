//! # json-serializer
//!
//! Typed JSON serialization for Rust values, without reflection.
//!
//! Conversion runs in two stages through an in-memory [`Value`] tree: the type
//! mapper turns an object into a `Value` (or back), and the reader/writer turn a
//! `Value` into JSON text (or back). Record types register their fields once
//! with a [`RecordSchema`]; primitives, collections, smart pointers, and
//! common date/time types are mapped out of the box.
//!
//! ## Quick start
//!
//! ```rust
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
//! let person: Person = serializer.from_json(r#"{"name":"ann","age":30}"#).unwrap();
//! assert_eq!(person, Person { name: "ann".into(), age: 30 });
//! assert_eq!(serializer.to_json(&person).unwrap(), r#"{"name":"ann","age":30}"#);
//! ```
//!
//! ## Modules
//!
//! - [`value`] — `Value`, `Number`, `Map`
//! - [`reader`] — JSON text → `Value`
//! - [`writer`] — `Value` → JSON text, compact or indented
//! - [`mapper`] — the `Mapped` trait and its built-in implementations
//! - [`schema`] — record registration (`RecordSchema`, `mapped_record!`, `mapped_enum!`)
//! - [`temporal`] — ISO-8601 dates, times, durations, and periods
//! - [`serializer`] — `Serializer`, `to_json` / `from_json`
//! - [`config`] — `SerializerConfig`, `Mode`
//! - [`error`] — error types for every stage

pub mod config;
pub mod descriptor;
pub mod error;
mod lexer;
pub mod mapper;
pub mod path;
pub mod reader;
pub mod schema;
pub mod serializer;
pub mod temporal;
pub mod value;
pub mod writer;

pub use config::{Mode, SerializerConfig, DEFAULT_MAX_DEPTH};
pub use descriptor::{PrimitiveKind, Shape, TypeDescriptor};
pub use error::{
    DecodeError, EncodeError, MismatchKind, ParseError, ParseErrorKind, TemporalParseError,
    TypeMismatchError,
};
pub use mapper::{DecodeContext, EncodeContext, Mapped};
pub use path::{Path, Segment};
pub use reader::{parse, parse_str};
pub use schema::{Record, RecordSchema};
pub use serializer::{create_serializer, create_serializer_with, Serializer};
pub use temporal::Period;
pub use value::{Map, Number, Value};
pub use writer::{render, render_pretty};
