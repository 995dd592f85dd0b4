#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Runs many independently built test cases, each worth some points, and
//! reports the grades.

use std::fmt::Display;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::harness::{BoxedTestCase, CheckResult, CheckValue, ExecutionContext, TestCase, TestOutcome};

#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
/// A struct representing a grade
pub struct Grade {
    /// The actual grade received
    grade:  f64,
    /// The maximum grade possible
    out_of: f64,
}

impl Grade {
    /// Creates a new grade -
    /// * `grade` - The actual grade received
    /// * `out_of` - The maximum grade possible
    pub fn new(grade: f64, out_of: f64) -> Self {
        Self { grade, out_of }
    }

    /// a getter for the grade
    pub fn grade(&self) -> f64 {
        self.grade
    }

    /// a getter for the out_of
    pub fn out_of(&self) -> f64 {
        self.out_of
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}/{:.2}", self.grade, self.out_of)
    }
}

#[derive(Tabled, Clone, Debug, Serialize, Deserialize)]
/// A struct to store grading results and display them
pub struct GradeResult {
    #[tabled(rename = "Requirement")]
    /// * `requirement`: name of the suite entry
    requirement: String,
    #[tabled(rename = "Grade")]
    /// * `grade`: grade received for above Requirement
    grade:       Grade,
    #[tabled(rename = "Reason")]
    /// * `reason`: the feedback the check produced
    reason:      String,
    #[tabled(skip)]
    /// * `outcome`: the full outcome of the check
    outcome:     TestOutcome,
}

impl GradeResult {
    /// Scores an outcome out of `points`: a pass earns every point, a
    /// partial-credit score is clamped to `[0, points]`, anything else
    /// earns nothing.
    pub fn from_outcome(requirement: impl Into<String>, points: f64, outcome: TestOutcome) -> Self {
        let grade = match outcome.score() {
            Some(score) => score.max(0.0).min(points.max(0.0)),
            None if outcome.passed() => points,
            None => 0.0,
        };

        Self {
            requirement: requirement.into(),
            grade: Grade::new(grade, points),
            reason: outcome.feedback().trim_end().to_string(),
            outcome,
        }
    }

    /// a getter for Requirement
    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    /// a getter for Reason
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// a getter for the self.grade.grade
    pub fn grade(&self) -> f64 {
        self.grade.grade()
    }

    /// a getter for the self.grade.out_of
    pub fn out_of(&self) -> f64 {
        self.grade.out_of()
    }

    /// a getter for the outcome
    pub fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }
}

/// One named, weighted case of a suite.
struct SuiteEntry {
    /// Requirement name shown in reports.
    name:   String,
    /// Points the case is worth.
    points: f64,
    /// The case itself.
    case:   BoxedTestCase,
}

/// An ordered collection of weighted test cases.
#[derive(Default)]
pub struct Suite {
    /// Entries in the order they run.
    entries: Vec<SuiteEntry>,
}

impl Suite {
    /// Creates an empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a case worth `points`.
    pub fn case<F, R>(mut self, name: impl Into<String>, points: f64, case: TestCase<F>) -> Self
    where
        F: FnOnce(&mut ExecutionContext) -> CheckResult<R> + 'static,
        R: Into<CheckValue> + 'static,
    {
        self.entries.push(SuiteEntry {
            name: name.into(),
            points,
            case: case.boxed(),
        });
        self
    }

    /// Returns the number of cases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the suite has no cases.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the points the whole suite is worth.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.points).sum()
    }

    /// Runs every case once, in order.
    pub fn run(self) -> SuiteReport {
        let results = self
            .entries
            .into_iter()
            .map(|entry| {
                tracing::info!("Running {}", entry.name);
                let outcome = entry.case.run();
                GradeResult::from_outcome(entry.name, entry.points, outcome)
            })
            .collect();

        SuiteReport { results }
    }
}

/// Grades produced by running a suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// One result per entry, in run order.
    results: Vec<GradeResult>,
}

impl SuiteReport {
    /// Returns the results.
    pub fn results(&self) -> &[GradeResult] {
        &self.results
    }

    /// Returns the points earned and the points possible.
    pub fn total(&self) -> Grade {
        let (grade, out_of) = self
            .results
            .iter()
            .fold((0f64, 0f64), |acc, r| (acc.0 + r.grade(), acc.1 + r.out_of()));
        Grade::new(grade, out_of)
    }

    /// Renders the results as a table with the total in its footer.
    pub fn table(&self) -> String {
        Table::new(&self.results)
            .with(Panel::header("Grading Overview"))
            .with(Panel::footer(format!("Total: {}", self.total())))
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(48).keep_words(true)))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(
                Modify::new(Rows::last())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
            .to_string()
    }

    /// Serializes the results as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Could not serialize the suite report")
    }

    /// Returns a one-line, colored summary.
    pub fn summary(&self) -> String {
        let passed = self.results.iter().filter(|r| r.outcome.passed()).count();
        let total = self.total();
        let counts = format!("{passed}/{} checks passed", self.results.len());
        let counts = if passed == self.results.len() {
            counts.green().bold()
        } else {
            counts.red().bold()
        };

        format!("{counts}, {total} points")
    }
}
