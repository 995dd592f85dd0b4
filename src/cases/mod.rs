#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Ready-made test case builders on top of the harness.

/// Authorship header checks.
pub mod authorship;
/// Doctest-driven partial-credit cases.
pub mod doctest;
/// Exact-value cases.
pub mod function;
/// Student modules and the registry checks import them from.
pub mod module;

pub use authorship::authorship_case;
pub use doctest::{DoctestCase, doctest_case};
pub use function::{FunctionCase, function_case};
use itertools::Itertools;
pub use module::{Function, Module, ModuleError, Modules};
use serde_json::Value;

/// Renders a value the way it appears in feedback: JSON with a space after
/// each separator, e.g. `[1, 2, {"a": 3}]`.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("[{}]", items.iter().map(render_value).join(", ")),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(key, value)| format!("{}: {}", Value::from(key.as_str()), render_value(value)))
                .join(", ")
        ),
        other => other.to_string(),
    }
}

/// Compares two values the way the student's language would: numbers are
/// equal when they denote the same quantity, so `5` equals `5.0`. Arrays
/// and objects compare element-wise, everything else with `==`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if a.is_f64() || b.is_f64() {
                a.as_f64() == b.as_f64()
            } else {
                a == b
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}
