//! User-supplied callback wrappers: factories, converters, validators.
//!
//! Each wrapper owns an `Arc`'d closure so parameters stay cheap to clone and
//! safe to share across threads. The core invokes these by contract only; it
//! never inspects what they do.

use std::fmt;
use std::sync::Arc;

use super::value::{BoxError, Value};

/// Zero-argument producer invoked once per call to supply a fresh default.
#[derive(Clone)]
pub struct Factory(Arc<dyn Fn() -> Value + Send + Sync>);

impl Factory {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn produce(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<factory>")
    }
}

impl PartialEq for Factory {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Transforms a resolved value: `(context, name, value) -> value`.
///
/// Converters run in declared order; each receives the previous converter's
/// output. A failure is propagated to the caller unmodified.
#[derive(Clone)]
pub struct Converter(Arc<dyn Fn(&Value, &str, Value) -> Result<Value, BoxError> + Send + Sync>);

impl Converter {
    pub fn new(
        f: impl Fn(&Value, &str, Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    /// Convenience for conversions that cannot fail.
    pub fn infallible(f: impl Fn(&Value, &str, Value) -> Value + Send + Sync + 'static) -> Self {
        Self::new(move |ctx, name, value| Ok(f(ctx, name, value)))
    }

    pub fn apply(&self, ctx: &Value, name: &str, value: Value) -> Result<Value, BoxError> {
        (self.0)(ctx, name, value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<converter>")
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Checks a post-conversion value: `(context, name, value) -> result`.
///
/// The first validator to fail aborts the call before the target is invoked.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&Value, &str, &Value) -> Result<(), BoxError> + Send + Sync>);

impl Validator {
    pub fn new(
        f: impl Fn(&Value, &str, &Value) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn check(&self, ctx: &Value, name: &str, value: &Value) -> Result<(), BoxError> {
        (self.0)(ctx, name, value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<validator>")
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_produces_fresh_values() {
        let factory = Factory::new(|| Value::List(Vec::new()));
        assert_eq!(factory.produce(), Value::List(Vec::new()));
    }

    #[test]
    fn test_converter_chain_contract() {
        let double = Converter::infallible(|_, _, value| {
            Value::Int(value.as_int().unwrap_or(0) * 2)
        });
        let out = double.apply(&Value::None, "x", Value::Int(21)).unwrap();
        assert_eq!(out, Value::Int(42));
    }

    #[test]
    fn test_callback_equality_is_identity() {
        let a = Validator::new(|_, _, _| Ok(()));
        let b = a.clone();
        let c = Validator::new(|_, _, _| Ok(()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
