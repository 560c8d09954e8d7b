//! Type descriptors: what shape a mapped Rust type takes in the value tree.

use std::fmt;

/// Name and shape of a type implementing [`crate::Mapped`].
///
/// Descriptors are informational: they let callers inspect what a type expects
/// (for example the field list of a record) without decoding anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub shape: Shape,
    /// Accepts `null` (for example `Option<T>`).
    pub nullable: bool,
}

/// The capability set every mapped type falls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    /// Named fields, in registration order.
    Record(Vec<&'static str>),
    /// Ordered collection of one element type.
    Sequence(Box<TypeDescriptor>),
    /// String keys to one value type.
    Mapping(Box<TypeDescriptor>),
    /// Any value; the untyped fallback.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveKind {
    Unit,
    Bool,
    Integer,
    Float,
    String,
    /// A string restricted to the listed variant names.
    Enum(Vec<&'static str>),
    /// A string in a fixed textual format, such as `"ISO-8601 date"`.
    Formatted(&'static str),
}

impl TypeDescriptor {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            nullable: false,
        }
    }

    pub fn primitive<T: ?Sized>(kind: PrimitiveKind) -> Self {
        Self::new(std::any::type_name::<T>(), Shape::Primitive(kind))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Field names if this describes a record.
    pub fn fields(&self) -> Option<&[&'static str]> {
        match &self.shape {
            Shape::Record(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &self.shape {
            Shape::Primitive(_) => "primitive",
            Shape::Record(_) => "record",
            Shape::Sequence(_) => "sequence",
            Shape::Mapping(_) => "mapping",
            Shape::Dynamic => "dynamic",
        };
        write!(f, "{} ({shape})", self.name)?;
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}
