//! Dynamically-typed values carried through the promise protocol.

use crate::promise::Promise;
use crate::thenable::Thenable;
use std::sync::Arc;

/// A value a promise can settle with, a handler can receive, or a handler can
/// throw.
///
/// Primitives compare structurally; `Promise` and `Thenable` compare by
/// pointer identity, which is what the self-resolution check relies on.
#[derive(Clone, Default)]
pub enum Value {
    /// The absent value.
    #[default]
    Undefined,
    /// A boolean.
    Boolean(bool),
    /// A double-precision number.
    Number(f64),
    /// An immutable string.
    String(Arc<str>),
    /// A native promise of this library.
    Promise(Arc<Promise>),
    /// A foreign object exposing a `then`-like capability.
    Thenable(Arc<dyn Thenable>),
}

impl Value {
    /// The undefined value.
    pub fn undefined() -> Self {
        Value::Undefined
    }

    /// Create a boolean value.
    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    /// Create a number value.
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    /// Create a string value.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Wrap a native promise.
    pub fn promise(p: Arc<Promise>) -> Self {
        Value::Promise(p)
    }

    /// Wrap a foreign thenable.
    pub fn thenable(t: Arc<dyn Thenable>) -> Self {
        Value::Thenable(t)
    }

    /// True for the object-like variants (`Promise`, `Thenable`).
    ///
    /// Resolution fulfills directly with anything that is not object-like.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Promise(_) | Value::Thenable(_))
    }

    /// True for `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// The boolean payload, if any.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The number payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The native promise payload, if any.
    pub fn as_promise(&self) -> Option<&Arc<Promise>> {
        match self {
            Value::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// The thenable payload, if any.
    pub fn as_thenable(&self) -> Option<&Arc<dyn Thenable>> {
        match self {
            Value::Thenable(t) => Some(t),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Promise(a), Value::Promise(b)) => Arc::ptr_eq(a, b),
            (Value::Thenable(a), Value::Thenable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Promise(p) => write!(f, "{p:?}"),
            Value::Thenable(t) => write!(f, "Thenable({:p})", Arc::as_ptr(t)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_equality() {
        assert_eq!(Value::number(42.0), Value::number(42.0));
        assert_eq!(Value::string("a"), Value::string("a"));
        assert_ne!(Value::number(1.0), Value::boolean(true));
        assert_eq!(Value::undefined(), Value::Undefined);
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::number(f64::NAN), Value::number(f64::NAN));
    }

    #[test]
    fn test_promise_identity() {
        let p = Promise::new();
        let q = Promise::new();
        assert_eq!(Value::promise(p.clone()), Value::promise(p.clone()));
        assert_ne!(Value::promise(p.clone()), Value::promise(q));
        assert!(Value::promise(p).is_object());
        assert!(!Value::number(0.0).is_object());
    }
}
