#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Failures a check can end with, and how they are classified for feedback.

use thiserror::Error;

use super::context::InputError;
use crate::{
    cases::ModuleError,
    constants::{ASSERTION_PREFIX, RUNTIME_ERROR_HEADER},
};

/// Error type returned by check procedures.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A failure the test author raised on purpose; shown verbatim.
    #[error("{0}")]
    Failure(String),
    /// A test-authored assertion that did not hold; shown as the bare
    /// message.
    #[error("{0}")]
    Assertion(String),
    /// An error propagated out of the code under test.
    #[error(transparent)]
    Runtime(#[from] anyhow::Error),
}

impl CheckError {
    /// Creates a test-authored failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    /// Creates a test-authored assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }
}

impl From<InputError> for CheckError {
    fn from(err: InputError) -> Self {
        Self::Runtime(err.into())
    }
}

impl From<ModuleError> for CheckError {
    fn from(err: ModuleError) -> Self {
        Self::Runtime(err.into())
    }
}

/// Result type returned by check procedures.
pub type CheckResult<T = ()> = Result<T, CheckError>;

/// The kind of failure a check ended with, as reported to the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    /// Raised on purpose by test code; the message is the whole feedback.
    TestAuthoredFailure(String),
    /// An assertion inside the code under test.
    StudentAssertionFailure {
        /// Assertion message, possibly empty.
        message: String,
        /// Rendered trace.
        trace:   String,
    },
    /// Any other error or panic inside the code under test.
    StudentRuntimeError {
        /// Rendered trace.
        trace: String,
    },
}

impl ClassifiedError {
    /// Returns a short, stable name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TestAuthoredFailure(_) => "test-authored failure",
            Self::StudentAssertionFailure { .. } => "student assertion failure",
            Self::StudentRuntimeError { .. } => "student runtime error",
        }
    }

    /// Renders the feedback shown to the student.
    pub fn feedback(&self) -> String {
        match self {
            Self::TestAuthoredFailure(message) => message.clone(),
            Self::StudentAssertionFailure { message, trace } => {
                let header = if message.is_empty() {
                    RUNTIME_ERROR_HEADER.to_string()
                } else {
                    format!("{ASSERTION_PREFIX}{message}")
                };
                format!("{header}\n\n{trace}")
            }
            Self::StudentRuntimeError { trace } => format!("{RUNTIME_ERROR_HEADER}\n\n{trace}"),
        }
    }
}

/// Fails the check with a test-authored assertion unless `cond` holds.
///
/// Without a message the stringified condition is reported.
#[macro_export]
macro_rules! check_assert {
    ($cond:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::harness::CheckError::Assertion(
                ::core::concat!("assertion failed: ", ::core::stringify!($cond)).to_string(),
            ));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return ::core::result::Result::Err($crate::harness::CheckError::Assertion(
                ::std::format!($($arg)+),
            ));
        }
    };
}

/// Fails the check with a test-authored assertion unless both sides are
/// equal.
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    return ::core::result::Result::Err($crate::harness::CheckError::Assertion(
                        ::std::format!("expected {:?}, got {:?}", right, left),
                    ));
                }
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        if !($left == $right) {
            return ::core::result::Result::Err($crate::harness::CheckError::Assertion(
                ::std::format!($($arg)+),
            ));
        }
    };
}

/// Fails the check with a test-authored failure shown verbatim.
#[macro_export]
macro_rules! check_fail {
    ($($arg:tt)+) => {
        return ::core::result::Result::Err($crate::harness::CheckError::Failure(
            ::std::format!($($arg)+),
        ))
    };
}
