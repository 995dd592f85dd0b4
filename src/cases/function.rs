#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Exact-value test cases: call one function with fixed arguments and
//! compare the result.

use bon::Builder;
use itertools::Itertools;
use serde_json::Value;

use super::{Modules, render_value, values_equal};
use crate::harness::{CheckError, CheckResult, ExecutionContext, TestCase, test};

/// A call with fixed arguments and the value it should return.
#[derive(Clone, Debug, Builder)]
#[builder(on(String, into))]
pub struct FunctionCase {
    /// Module that should define the function.
    #[builder(getter)]
    module:   String,
    /// Function to call.
    #[builder(getter)]
    function: String,
    /// Arguments passed to the function.
    #[builder(default, with = |iter: impl IntoIterator<Item = impl Into<Value>>| {
        iter.into_iter().map(Into::into).collect::<Vec<Value>>()
    })]
    #[builder(getter)]
    args:     Vec<Value>,
    /// Value the call should return.
    #[builder(into)]
    #[builder(getter)]
    expected: Value,
}

impl FunctionCase {
    /// Renders the call the way it appears in feedback, e.g. `add(2, 3)`.
    pub fn signature(&self) -> String {
        format!("{}({})", self.function, self.args.iter().map(render_value).join(", "))
    }

    /// Binds the case to a module registry, producing a runnable test case.
    pub fn into_test(
        self,
        modules: &Modules,
    ) -> TestCase<impl FnOnce(&mut ExecutionContext) -> CheckResult<bool> + 'static> {
        let modules = modules.clone();

        test(move |ctx: &mut ExecutionContext| -> CheckResult<bool> {
            let target = modules.import(&self.module)?;
            let Some(function) = target.lookup(&self.function) else {
                return Err(CheckError::failure(format!("Missing function {}", self.function)));
            };

            let result = function(ctx.console(), &self.args)?;
            if values_equal(&result, &self.expected) {
                return Ok(true);
            }

            Err(CheckError::failure(format!(
                "{} should return {}.",
                self.signature(),
                render_value(&self.expected)
            )))
        })
    }
}

/// Builds a test case checking that `module.function(args)` returns
/// `expected`.
pub fn function_case(
    modules: &Modules,
    module: impl Into<String>,
    function: impl Into<String>,
    args: impl IntoIterator<Item = impl Into<Value>>,
    expected: impl Into<Value>,
) -> TestCase<impl FnOnce(&mut ExecutionContext) -> CheckResult<bool> + 'static> {
    FunctionCase::builder()
        .module(module)
        .function(function)
        .args(args)
        .expected(expected)
        .build()
        .into_test(modules)
}
