//! # Dynamic state values and structural cloning.
//!
//! [`Value`] is the caller-facing state type: scalars, an ordered sequence,
//! and an insertion-ordered keyed mapping. Containers are reference-counted
//! so that a *shallow* structural copy is cheap to express: a fresh outer
//! allocation whose elements still share their own inner allocations.
//!
//! [`clone_value`] is that copy. It is applied everywhere a stored or
//! in-flight value is handed to external code, so callers can never mutate
//! held state through a returned reference.
//!
//! ## Example
//! ```rust
//! use statevisor::{clone_value, Value};
//!
//! let original = Value::seq([Value::from(1i64), Value::from(2i64)]);
//! let copy = clone_value(&original);
//!
//! assert_eq!(original, copy);       // value-equal
//! assert!(!original.ptr_eq(&copy)); // but a fresh outer allocation
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// A dynamic state value.
///
/// Scalars carry their payload directly; `Text`, `Seq`, and `Map` share
/// their allocation through an `Arc`, which is what makes shallow copies
/// (fresh outer container, shared inner values) representable.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Unit,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar (cheaply shareable).
    Text(Arc<str>),
    /// Ordered sequence.
    Seq(Arc<Vec<Value>>),
    /// Keyed mapping; iteration follows insertion order.
    Map(Arc<IndexMap<String, Value>>),
}

impl Value {
    /// Builds a sequence value from anything iterable.
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a mapping value from `(key, value)` pairs, preserving order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// True for [`Value::Unit`].
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// True for container values (`Seq` or `Map`).
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Map(_))
    }

    /// Returns the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is a `Seq`.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a `Map`.
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Allocation identity.
    ///
    /// Containers and `Text` compare by `Arc` pointer; plain scalars have
    /// value identity and compare structurally.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Seq(a), Value::Seq(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Text(a), Value::Text(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }
}

/// Structural shallow copy.
///
/// - `Seq` and `Map` come back as a new outer container with the same
///   elements in the same order; nested containers stay shared.
/// - Scalars (including `Text`) come back unchanged, identity preserved.
///
/// No side effects.
pub fn clone_value(value: &Value) -> Value {
    match value {
        Value::Seq(items) => Value::Seq(Arc::new(items.as_ref().clone())),
        Value::Map(entries) => Value::Map(Arc::new(entries.as_ref().clone())),
        scalar => scalar.clone(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Arc::from(s.as_str()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(Arc::new(items))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_scalar_preserves_identity() {
        let n = Value::from(42i64);
        assert!(clone_value(&n).ptr_eq(&n));

        let s = Value::from("hello");
        let copy = clone_value(&s);
        assert_eq!(s, copy);
        // Text is a scalar: the very same allocation comes back.
        assert!(s.ptr_eq(&copy));
    }

    #[test]
    fn test_clone_seq_is_shallow() {
        let nested = Value::map([("count", 1i64)]);
        let original = Value::seq([nested.clone(), Value::from(2i64)]);
        let copy = clone_value(&original);

        assert_eq!(original, copy);
        assert!(!original.ptr_eq(&copy));
        // Nested containers are shared, not copied.
        assert!(copy.as_seq().unwrap()[0].ptr_eq(&nested));
    }

    #[test]
    fn test_clone_map_is_shallow() {
        let inner = Value::seq([Value::from(1i64)]);
        let original = Value::map([("items", inner.clone()), ("total", Value::from(1i64))]);
        let copy = clone_value(&original);

        assert_eq!(original, copy);
        assert!(!original.ptr_eq(&copy));
        assert!(copy.as_map().unwrap()["items"].ptr_eq(&inner));
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let m = Value::map([("z", 1i64), ("a", 2i64), ("m", 3i64)]);
        let keys: Vec<&str> = m.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_display_rendering() {
        let v = Value::map([
            ("name", Value::from("door")),
            ("open", Value::from(true)),
            ("tags", Value::seq([Value::from("a"), Value::from("b")])),
        ]);
        assert_eq!(v.to_string(), r#"{name: "door", open: true, tags: ["a", "b"]}"#);
    }
}
