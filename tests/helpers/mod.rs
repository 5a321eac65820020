//! Shared fixtures for integration tests.

use once_cell::sync::Lazy;
use veneer::{CallArguments, InterfaceParam, Routine, Value};

/// A routine that echoes everything it receives: element 0 is the positional
/// list, element 1 the named map.
pub fn capture(interface: Vec<InterfaceParam>) -> Routine {
    Routine::new("capture", interface, |call: CallArguments| {
        Ok(Value::List(vec![
            Value::List(call.args),
            Value::Map(call.kwargs),
        ]))
    })
}

/// The positional half of a [`capture`] result.
#[allow(dead_code)]
pub fn received_args(result: &Value) -> &[Value] {
    result
        .as_list()
        .and_then(|parts| parts.first())
        .and_then(Value::as_list)
        .unwrap_or(&[])
}

/// One named entry of a [`capture`] result.
pub fn received_named<'a>(result: &'a Value, name: &str) -> Option<&'a Value> {
    result
        .as_list()
        .and_then(|parts| parts.get(1))
        .and_then(Value::as_map)
        .and_then(|m| m.get(name))
}

/// A two-argument adder with a defaulted second slot, shared across tests.
pub static SUM: Lazy<Routine> = Lazy::new(|| {
    Routine::new(
        "sum",
        vec![
            InterfaceParam::arg("a"),
            InterfaceParam::arg("b").with_default(0),
        ],
        |call: CallArguments| {
            let a = call.get(0).and_then(Value::as_int).unwrap_or(0);
            let b = call.get(1).and_then(Value::as_int).unwrap_or(0);
            Ok(Value::Int(a + b))
        },
    )
});
