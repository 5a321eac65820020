//! Foundation types: the dynamic `Value` currency and callback wrappers.

pub mod callback;
pub mod value;

pub use callback::{Converter, Factory, Validator};
pub use value::{BoxError, Value};
