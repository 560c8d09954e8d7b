//! In-memory JSON value tree.
//!
//! Every conversion in this crate goes through [`Value`]: the mapper turns typed
//! objects into values, the writer renders values as text, and the reader parses
//! text back into values. A `Value` owns all of its children, so a tree is always
//! finite and acyclic.

use indexmap::IndexMap;

/// A JSON document value.
///
/// Separates integers from floats (the distinction survives a text round-trip)
/// and keeps object entries in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    /// Key-value pairs in insertion order.
    Object(Map),
}

/// A JSON number.
///
/// `Integer` holds any integer literal that fits in `i128`, which covers the whole
/// `i64` and `u64` ranges exactly. Everything else is a `Float`. A float may be
/// non-finite in memory, but the writer refuses to render one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i128),
    Float(f64),
}

impl Number {
    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// False only for NaN and the infinities.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(n) => i64::try_from(*n).ok(),
            Number::Float(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Integer(n) => u64::try_from(*n).ok(),
            Number::Float(_) => None,
        }
    }

    /// Lossy for integers beyond 2^53.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(n) => *n as f64,
            Number::Float(f) => *f,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Look up an element if this is an array.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Name of the variant, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Ordered JSON object.
///
/// Keys are unique. Inserting an existing key replaces its value in place, so the
/// entry keeps the position of its first insertion and the last write wins.
/// Lookups and inserts are hashed; equality compares entries in order.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<String, Value>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove an entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.values()
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        map.extend(iter);
        map
    }
}

impl Extend<(String, Value)> for Map {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::Integer(i128::from(n)))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Integer(i128::from(n)))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::Integer(i128::from(n)))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminators() {
        assert!(Value::Null.is_null());
        assert!(Value::from(true).is_bool());
        assert!(Value::from(42).is_number());
        assert!(Value::from("x").is_string());
        assert!(Value::Array(vec![]).is_array());
        assert!(Value::Object(Map::new()).is_object());
    }

    #[test]
    fn number_accessors() {
        assert_eq!(Value::from(-3).as_i64(), Some(-3));
        assert_eq!(Value::from(-3).as_u64(), None);
        assert_eq!(Value::from(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(Value::from(u64::MAX).as_i64(), None);
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::from(2.5).as_i64(), None);
    }

    #[test]
    fn integer_and_float_are_distinct() {
        assert_ne!(Value::from(1), Value::from(1.0));
    }

    #[test]
    fn map_insert_keeps_first_position_and_last_value() {
        let mut map = Map::new();
        map.insert("a", Value::from(1));
        map.insert("b", Value::from(2));
        let previous = map.insert("a", Value::from(3));

        assert_eq!(previous, Some(Value::from(1)));
        assert_eq!(map.len(), 2);
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn map_remove_preserves_order() {
        let mut map: Map = [("x", 1), ("y", 2), ("z", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        assert_eq!(map.remove("y"), Some(Value::from(2)));
        assert_eq!(map.remove("missing"), None);
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["x", "z"]);
    }

    #[test]
    fn object_equality_is_order_sensitive() {
        let ab: Map = [("a".to_string(), Value::Null), ("b".to_string(), Value::Null)]
            .into_iter()
            .collect();
        let ba: Map = [("b".to_string(), Value::Null), ("a".to_string(), Value::Null)]
            .into_iter()
            .collect();
        assert_ne!(ab, ba);
    }

    #[test]
    fn lookup_helpers() {
        let mut map = Map::new();
        map.insert("items", Value::Array(vec![Value::from("first")]));
        let value = Value::Object(map);

        assert_eq!(
            value.get("items").and_then(|v| v.get_index(0)),
            Some(&Value::from("first"))
        );
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::Null.get("items"), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(false).type_name(), "boolean");
        assert_eq!(Value::from(0).type_name(), "number");
        assert_eq!(Value::from("").type_name(), "string");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
        assert_eq!(Value::Object(Map::new()).type_name(), "object");
    }
}
