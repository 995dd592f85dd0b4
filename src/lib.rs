//! # labgrade
//!
//! A grading harness for programming labs that turns every way a check can
//! end into feedback a student can act on, plus the course-staff tooling
//! around it: extracting bulk submissions and crediting partners.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Ready-made test case builders
pub mod cases;
/// Process-wide configuration read from the environment
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Unpacking bulk submission archives
pub mod extract;
/// The grading harness
pub mod harness;
/// Merging group scores into the course report
pub mod merge;
/// For all parsers used
pub mod parsers;
/// Course report loading
pub mod roster;
/// Running weighted collections of test cases
pub mod suite;
/// Utility functions for convenience
pub mod util;

pub use harness::{CheckError, CheckResult, ExecutionContext, TestOutcome, run_check, test};
