#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};

/// What a check returned, normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CheckValue {
    /// Nothing was returned; counts as a pass.
    Unit,
    /// Explicit pass or fail.
    Bool(bool),
    /// Partial credit.
    Score(f64),
}

impl CheckValue {
    /// Returns whether the value counts as a pass.
    pub fn is_truthy(self) -> bool {
        match self {
            Self::Unit => true,
            Self::Bool(b) => b,
            Self::Score(x) => x != 0.0,
        }
    }

    /// Returns the partial-credit score, if the check returned one.
    pub fn score(self) -> Option<f64> {
        match self {
            Self::Score(x) => Some(x),
            Self::Unit | Self::Bool(_) => None,
        }
    }
}

impl From<()> for CheckValue {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for CheckValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for CheckValue {
    fn from(x: f64) -> Self {
        Self::Score(x)
    }
}

impl From<Option<bool>> for CheckValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unit, Self::Bool)
    }
}

/// The result of running one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Whether the check passed.
    pub(crate) passed:          bool,
    /// Partial-credit score, if the check returned one.
    pub(crate) score:           Option<f64>,
    /// Feedback shown to the student.
    pub(crate) feedback:        String,
    /// Everything the check printed.
    pub(crate) captured_stdout: String,
}

impl TestOutcome {
    /// Returns whether the check passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the partial-credit score, if the check returned one.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Returns the feedback text.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Returns the feedback split into lines.
    pub fn feedback_lines(&self) -> impl Iterator<Item = &str> {
        self.feedback.lines()
    }

    /// Returns everything the check printed.
    pub fn captured_stdout(&self) -> &str {
        &self.captured_stdout
    }
}
