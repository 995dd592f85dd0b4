#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The grading harness: runs one check against student code with scripted
//! input and captured output, and turns however the check ended into a
//! [`TestOutcome`].
//!
//! ```no_run
//! use labgrade::{check_assert, harness::test};
//!
//! let outcome = test(|ctx| {
//!     let name = ctx.input("Name? ")?;
//!     check_assert!(name == "Ada", "Expected to read `Ada`, got `{name}`");
//!     Ok(())
//! })
//! .with_input("Ada\n")
//! .run();
//!
//! assert!(outcome.passed());
//! ```

/// Execution context handed to checks.
pub mod context;
/// Check errors and their classification.
pub mod error;
/// Check return values and outcomes.
pub mod outcome;
/// Panic interception.
pub(crate) mod panic;
/// Trace rendering.
pub(crate) mod trace;

use std::io::Write;

pub use context::{Console, ExecutionContext, FeedbackBuffer, InputError, ScriptedInput};
pub use error::{CheckError, CheckResult, ClassifiedError};
pub use outcome::{CheckValue, TestOutcome};
use panic::{PanicReport, Unwound};

use crate::{
    config::{self, HarnessConfig},
    constants::{INPUT_NOT_ALLOWED, PASSED, STAFF_ALERT},
};

/// A type-erased check, as stored by suites.
pub type BoxedCheck = Box<dyn FnOnce(&mut ExecutionContext) -> CheckResult<CheckValue>>;

/// A test case whose check has been type-erased.
pub type BoxedTestCase = TestCase<BoxedCheck>;

/// A check bound to its scripted input and output settings, ready to run
/// once.
pub struct TestCase<F> {
    /// The check procedure.
    check:       F,
    /// Text fed to the check as standard input.
    input:       String,
    /// Whether captured output is replayed to the real stdout afterwards.
    show_stdout: bool,
    /// Harness settings; the global configuration when unset.
    config:      Option<HarnessConfig>,
}

/// Wraps `check` into a [`TestCase`] with no scripted input that replays its
/// output.
pub fn test<F, R>(check: F) -> TestCase<F>
where
    F: FnOnce(&mut ExecutionContext) -> CheckResult<R>,
    R: Into<CheckValue>,
{
    TestCase {
        check,
        input: String::new(),
        show_stdout: true,
        config: None,
    }
}

/// Runs `check` once with the given scripted input.
pub fn run_check<F, R>(check: F, scripted_input: &str, expose_stdout: bool) -> TestOutcome
where
    F: FnOnce(&mut ExecutionContext) -> CheckResult<R>,
    R: Into<CheckValue>,
{
    test(check)
        .with_input(scripted_input)
        .show_stdout(expose_stdout)
        .run()
}

impl<F> TestCase<F> {
    /// Scripts the text the check reads as input. Empty input means the
    /// check may not read input at all.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Sets whether captured output is replayed to the real stdout.
    pub fn show_stdout(mut self, show: bool) -> Self {
        self.show_stdout = show;
        self
    }

    /// Overrides the harness settings for this case.
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Returns the scripted input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl<F, R> TestCase<F>
where
    F: FnOnce(&mut ExecutionContext) -> CheckResult<R>,
    R: Into<CheckValue>,
{
    /// Erases the check's type so cases of different shapes can be stored
    /// together.
    pub fn boxed(self) -> BoxedTestCase
    where
        F: 'static,
        R: 'static,
    {
        let inner = self.check;
        let check: BoxedCheck =
            Box::new(move |ctx: &mut ExecutionContext| -> CheckResult<CheckValue> {
                inner(ctx).map(Into::into)
            });

        TestCase {
            check,
            input:       self.input,
            show_stdout: self.show_stdout,
            config:      self.config,
        }
    }

    /// Runs the check and reports how it went. Never panics and never
    /// fails: every way the check can end is turned into feedback.
    pub fn run(self) -> TestOutcome {
        let config = self.config.unwrap_or_else(config::harness);
        let mut ctx = ExecutionContext::new(&self.input);
        let check = self.check;

        let termination = panic::catch(config.backtrace(), || check(&mut ctx));
        let (console, feedback) = ctx.into_parts();

        let result: Result<CheckValue, ClassifiedError> = if console.input_denied() {
            Err(ClassifiedError::TestAuthoredFailure(INPUT_NOT_ALLOWED.to_string()))
        } else {
            match termination {
                Ok(Ok(value)) => Ok(value.into()),
                Ok(Err(err)) => Err(classify_error(err, &config)),
                Err(Unwound::InputNotAllowed) => {
                    Err(ClassifiedError::TestAuthoredFailure(INPUT_NOT_ALLOWED.to_string()))
                }
                Err(Unwound::Panic(report)) => Err(classify_panic(&report, &config)),
            }
        };

        let outcome = match result {
            Ok(value) => {
                let passed = value.is_truthy();
                let feedback = if !feedback.is_empty() {
                    feedback.into_string()
                } else if passed {
                    PASSED.to_string()
                } else {
                    tracing::warn!("Check failed without writing any feedback");
                    STAFF_ALERT.to_string()
                };

                TestOutcome {
                    passed,
                    score: value.score(),
                    feedback,
                    captured_stdout: String::new(),
                }
            }
            Err(err) => {
                tracing::debug!("Check ended with a {}", err.kind());
                TestOutcome {
                    passed:          false,
                    score:           None,
                    feedback:        err.feedback(),
                    captured_stdout: String::new(),
                }
            }
        };

        let captured_stdout = console.into_stdout();
        if self.show_stdout && !captured_stdout.is_empty() {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout
                .write_all(captured_stdout.as_bytes())
                .and_then(|_| stdout.flush())
            {
                tracing::warn!("Could not replay captured output: {e}");
            }
        }

        TestOutcome {
            captured_stdout,
            ..outcome
        }
    }
}

/// Classifies an error returned by a check.
fn classify_error(err: CheckError, config: &HarnessConfig) -> ClassifiedError {
    match err {
        CheckError::Failure(message) => ClassifiedError::TestAuthoredFailure(message),
        CheckError::Assertion(message) => {
            ClassifiedError::TestAuthoredFailure(message.trim().to_string())
        }
        CheckError::Runtime(err) => ClassifiedError::StudentRuntimeError {
            trace: trace::render_error(&err, config.strip_prefixes()),
        },
    }
}

/// Classifies a panic raised while a check ran. Panics never come from the
/// test's own helpers, so they are always attributed to the student.
fn classify_panic(report: &PanicReport, config: &HarnessConfig) -> ClassifiedError {
    let trace = trace::render_panic(report, config.strip_prefixes());
    let message = report.message();

    if message == "assertion failed" || message.starts_with("assertion failed: ") {
        // `assert!` without a message: the trace already shows the condition.
        ClassifiedError::StudentAssertionFailure {
            message: String::new(),
            trace,
        }
    } else if message.starts_with("assertion `") {
        ClassifiedError::StudentAssertionFailure {
            message: message.trim().to_string(),
            trace,
        }
    } else {
        ClassifiedError::StudentRuntimeError { trace }
    }
}
