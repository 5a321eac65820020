//! Dynamic value currency shared across the crate.
//!
//! Every argument, default, metadata entry, and callback result is a `Value`.
//! The core never interprets values beyond the two collector shapes (`List`
//! for var-positional, `Map` for var-keyword); everything else passes through
//! untouched.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

/// Boxed error type for user-supplied callbacks and target routines.
///
/// Callback and target failures are propagated through the binding pipeline
/// unmodified, so the caller sees the original error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A dynamically typed argument value.
///
/// `None` doubles as the stable empty sentinel handed to converters and
/// validators as the context when no context parameter is declared.
/// `Opaque` carries arbitrary user types; two opaque values compare equal
/// only when they share the same allocation.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    /// Ordered sequence, used for collected var-positional arguments.
    List(Vec<Value>),
    /// Name-keyed mapping, used for collected var-keyword arguments.
    Map(IndexMap<SmolStr, Value>),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wrap an arbitrary user type.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<SmolStr, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Downcast an `Opaque` value to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Opaque(_) => write!(f, "<opaque>"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(SmolStr::new(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(SmolStr::from(value))
    }
}

impl From<SmolStr> for Value {
    fn from(value: SmolStr) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<IndexMap<SmolStr, Value>> for Value {
    fn from(value: IndexMap<SmolStr, Value>) -> Self {
        Value::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Value::from(5i64), Value::Int(5));
        assert_eq!(Value::from("x"), Value::Str("x".into()));
        assert_ne!(Value::Int(5), Value::Float(5.0));
    }

    #[test]
    fn test_opaque_compares_by_identity() {
        let a = Value::opaque(vec![1u8, 2, 3]);
        let b = a.clone();
        let c = Value::opaque(vec![1u8, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_downcast() {
        let v = Value::opaque(42u16);
        assert_eq!(v.downcast_ref::<u16>(), Some(&42));
        assert!(v.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_none_is_default() {
        assert!(Value::default().is_none());
    }
}
