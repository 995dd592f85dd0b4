#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Doctest-driven test cases: a session of `>>> call(args)` examples with
//! their expected results, awarding partial credit for the fraction of
//! examples that pass.
//!
//! ```text
//! >>> add(2, 3)
//! 5
//! >>> shout("hi")
//! "HI!"
//! >>> divide(1, 0)
//! Error: division by zero
//! >>> describe([1, 2, 3])
//! "a list of ..."
//! ```
//!
//! Arguments and expected values are JSON literals. An expected block that is
//! not valid JSON is compared as text against the rendered result, and
//! `...` matches any run of characters. `Error: <text>` expects the call to
//! fail with an error mentioning `<text>`.

use std::fmt::Write as _;

use bon::Builder;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use super::{Module, Modules, render_value};
use crate::{
    harness::{
        CheckError, CheckResult, Console, ExecutionContext, TestCase,
        context::deny_input,
        panic::{self, Unwound},
        test,
    },
    parsers::parser,
};

/// Wildcard accepted in expected output.
const ELLIPSIS: &str = "...";

/// Prefix of an expected block that expects the call to fail.
const ERROR_PREFIX: &str = "Error:";

/// Prompt that starts an example.
const PROMPT: &str = ">>>";

/// Separator printed above each failure report.
const SEPARATOR: &str =
    "**********************************************************************";

/// Feedback when the example source holds no examples at all.
const NO_EXAMPLES: &str = "No examples were found to run; please alert the course staff.";

/// What an example expects its call to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// A value, compared with `==` (strings may contain `...`).
    Value(Value),
    /// Text compared against the rendered result, `...` allowed.
    Text(String),
    /// The call must fail with an error matching this text.
    Error(String),
}

impl Expectation {
    /// Interprets an expected block.
    fn parse(expected: &str) -> Self {
        let trimmed = expected.trim();
        if trimmed.is_empty() {
            return Self::Value(Value::Null);
        }
        if let Some(rest) = trimmed.strip_prefix(ERROR_PREFIX) {
            return Self::Error(rest.trim().to_string());
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::Value(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// Returns whether `got` satisfies the expectation.
    fn matches(&self, got: &Result<Value, String>) -> bool {
        match (self, got) {
            (Self::Value(Value::String(pattern)), Ok(Value::String(actual)))
                if pattern.contains(ELLIPSIS) =>
            {
                ellipsis_match(pattern, actual)
            }
            (Self::Value(expected), Ok(actual)) => expected == actual,
            (Self::Text(pattern), Ok(actual)) => ellipsis_match(pattern, &render_value(actual)),
            (Self::Error(pattern), Err(message)) => {
                if pattern.contains(ELLIPSIS) {
                    ellipsis_match(pattern, message)
                } else {
                    message.contains(pattern.as_str())
                }
            }
            _ => false,
        }
    }
}

/// One `>>>` example.
#[derive(Debug, Clone)]
pub struct Example {
    /// The call, without the prompt.
    source:        String,
    /// 1-based line of the prompt within the session text.
    line:          usize,
    /// The expected block as written.
    expected_text: String,
    /// The parsed expectation.
    expectation:   Expectation,
}

impl Example {
    /// Returns the call text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the line of the prompt.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the expectation.
    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }
}

/// Removes at most `indent` leading whitespace characters from `line`.
fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take(indent)
        .take_while(|(_, c)| c.is_whitespace())
        .last()
        .map_or(0, |(idx, c)| idx + c.len_utf8());
    &line[cut..]
}

/// Extracts every example from a doctest session.
pub fn parse_examples(session: &str) -> Vec<Example> {
    let lines: Vec<&str> = session.lines().collect();
    let mut examples = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        let trimmed = line.trim_start();
        idx += 1;

        let Some(call) = trimmed.strip_prefix(PROMPT) else {
            continue;
        };
        let indent = line.chars().count() - trimmed.chars().count();
        let start_line = idx;

        let mut expected = Vec::new();
        while idx < lines.len() {
            let next = lines[idx];
            if next.trim().is_empty() || next.trim_start().starts_with(PROMPT) {
                break;
            }
            expected.push(strip_indent(next, indent));
            idx += 1;
        }

        let expected_text = expected.join("\n");
        examples.push(Example {
            source: call.trim().to_string(),
            line: start_line,
            expectation: Expectation::parse(&expected_text),
            expected_text,
        });
    }

    examples
}

/// Result of running a doctest session.
#[derive(Debug, Clone, Default)]
pub struct DoctestReport {
    /// Number of examples run.
    attempted: usize,
    /// Rendered report of each failing example.
    failures:  Vec<String>,
}

impl DoctestReport {
    /// Returns the number of examples run.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Returns the number of failing examples.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns the rendered failure reports.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Returns the fraction of examples that passed, or `None` when nothing
    /// ran.
    pub fn pass_fraction(&self) -> Option<f64> {
        (self.attempted > 0).then(|| 1.0 - self.failed() as f64 / self.attempted as f64)
    }
}

/// Runs every example against `bindings`, continuing past failures.
pub fn run_examples(
    examples: &[Example],
    bindings: &Module,
    console: &mut Console,
) -> DoctestReport {
    let mut report = DoctestReport::default();

    for example in examples {
        report.attempted += 1;
        let got = evaluate(example, bindings, console);
        if !example.expectation.matches(&got) {
            tracing::debug!("Example on line {} failed", example.line);
            report
                .failures
                .push(describe_failure(example, bindings.name(), &got));
        }
    }

    report
}

/// Evaluates one example's call.
fn evaluate(example: &Example, bindings: &Module, console: &mut Console) -> Result<Value, String> {
    let (name, raw_args) = parser::call(&example.source)
        .map_err(|e| format!("Could not understand the example `{}`: {e}", example.source))?;
    let args: Vec<Value> = serde_json::from_str(&format!("[{raw_args}]"))
        .map_err(|e| format!("Could not read the arguments `{raw_args}`: {e}"))?;
    let function = bindings
        .lookup(name)
        .ok_or_else(|| format!("function `{name}` is not defined"))?;

    match panic::catch(false, || function(console, &args)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(Unwound::InputNotAllowed) => deny_input(),
        Err(Unwound::Panic(report)) => Err(report.message().to_string()),
    }
}

/// Indents every line of `text` by four spaces.
fn indent(text: &str) -> String {
    text.lines().fold(String::new(), |mut acc, line| {
        let _ = writeln!(acc, "    {line}");
        acc
    })
}

/// Renders the report for a failing example.
fn describe_failure(example: &Example, module: &str, got: &Result<Value, String>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{SEPARATOR}");
    let _ = writeln!(out, "Line {}, in {module}", example.line);
    out.push_str("Failed example:\n");
    out.push_str(&indent(&example.source));

    if example.expected_text.trim().is_empty() {
        out.push_str("Expected nothing\n");
    } else {
        out.push_str("Expected:\n");
        out.push_str(&indent(&example.expected_text));
    }

    let got_text = match got {
        Ok(value) => {
            out.push_str("Got:\n");
            render_value(value)
        }
        Err(message) => {
            out.push_str("Exception raised:\n");
            message.clone()
        }
    };
    out.push_str(&indent(&got_text));

    if example.expected_text.contains('\n') || got_text.contains('\n') {
        out.push_str("Differences:\n");
        let diff = TextDiff::from_lines(example.expected_text.as_str(), got_text.as_str());
        for change in diff.iter_all_changes() {
            let prefix = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            let _ = write!(out, "    {prefix} {change}");
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }

    out
}

/// Matches `text` against `pattern`, where `...` stands for any run of
/// characters.
fn ellipsis_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains(ELLIPSIS) {
        return pattern == text;
    }

    let pieces: Vec<&str> = pattern.split(ELLIPSIS).collect();
    let first = pieces[0];
    let last = pieces[pieces.len() - 1];
    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last)
    {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for piece in &pieces[1..pieces.len() - 1] {
        match rest.find(piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }
    true
}

/// A doctest session run against a student module for partial credit.
#[derive(Clone, Debug, Builder)]
#[builder(on(String, into))]
pub struct DoctestCase {
    /// Module under test.
    #[builder(getter)]
    module:  String,
    /// The `>>>` session.
    #[builder(getter)]
    session: String,
    /// Points awarded when every example passes.
    #[builder(default = 1.0)]
    #[builder(getter)]
    points:  f64,
    /// Helper functions available to examples; the module under test wins
    /// on name clashes.
    #[builder(default)]
    globals: Module,
}

impl DoctestCase {
    /// Returns the examples of the session.
    pub fn examples(&self) -> Vec<Example> {
        parse_examples(&self.session)
    }

    /// Binds the case to a module registry, producing a runnable test case
    /// that returns `points * fraction_passed`.
    pub fn into_test(
        self,
        modules: &Modules,
    ) -> TestCase<impl FnOnce(&mut ExecutionContext) -> CheckResult<f64> + 'static> {
        let modules = modules.clone();

        test(move |ctx: &mut ExecutionContext| -> CheckResult<f64> {
            let target = modules.import(&self.module)?;
            let bindings = self.globals.merged_with(target);

            let examples = parse_examples(&self.session);
            let report = run_examples(&examples, &bindings, ctx.console());
            let Some(fraction) = report.pass_fraction() else {
                return Err(CheckError::failure(NO_EXAMPLES));
            };

            if report.failed() > 0 {
                for failure in report.failures() {
                    ctx.feedback().push_str(failure);
                }
                let _ = writeln!(
                    ctx.feedback(),
                    "{SEPARATOR}\n***Test Failed*** {} of {} examples failed.",
                    report.failed(),
                    report.attempted()
                );
            }

            Ok(self.points * fraction)
        })
    }
}

/// Builds a partial-credit test case running `session` against `module`,
/// with `globals` available to the examples.
pub fn doctest_case(
    modules: &Modules,
    globals: Module,
    module: impl Into<String>,
    session: impl Into<String>,
    points: f64,
) -> TestCase<impl FnOnce(&mut ExecutionContext) -> CheckResult<f64> + 'static> {
    DoctestCase::builder()
        .globals(globals)
        .module(module)
        .session(session)
        .points(points)
        .build()
        .into_test(modules)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_examples_with_expected_blocks() {
        let session = "
    Some prose.

    >>> add(2, 3)
    5
    >>> greet(\"Ada\")
    \"Hello, Ada\"
    >>> divide(1, 0)
    Error: division by zero

    >>> noop()
";
        let examples = parse_examples(session);
        assert_eq!(examples.len(), 4);
        assert_eq!(examples[0].source(), "add(2, 3)");
        assert_eq!(examples[0].line(), 4);
        assert_eq!(examples[0].expectation(), &Expectation::Value(json!(5)));
        assert_eq!(examples[1].expectation(), &Expectation::Value(json!("Hello, Ada")));
        assert_eq!(
            examples[2].expectation(),
            &Expectation::Error("division by zero".to_string())
        );
        assert_eq!(examples[3].expectation(), &Expectation::Value(Value::Null));
    }

    #[test]
    fn unicode_indentation_is_stripped_by_character() {
        let session = "  >>> greet()\n\u{3000}\u{3000}\"hi\"\n  >>> shout()\n\u{3000}   \"HI\"\n";
        let examples = parse_examples(session);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].expectation(), &Expectation::Value(json!("hi")));
        assert_eq!(examples[1].expected_text, " \"HI\"");
    }

    #[test]
    fn ellipsis_matches_runs_of_characters() {
        assert!(ellipsis_match("a...c", "abbbc"));
        assert!(ellipsis_match("...", "anything"));
        assert!(ellipsis_match("[1, ..., 4]", "[1, 2, 3, 4]"));
        assert!(!ellipsis_match("a...c", "abbb"));
        assert!(!ellipsis_match("ab...ba", "aba"));
        assert!(ellipsis_match("exact", "exact"));
    }

    #[test]
    fn true_does_not_match_one() {
        let expectation = Expectation::parse("1");
        assert!(!expectation.matches(&Ok(json!(true))));
        assert!(expectation.matches(&Ok(json!(1))));
    }

    #[test]
    fn text_expectations_match_rendered_values() {
        let expectation = Expectation::parse("[1, 2, ...]");
        assert!(matches!(expectation, Expectation::Text(_)));
        assert!(expectation.matches(&Ok(json!([1, 2, 3, 4]))));
        assert!(!expectation.matches(&Ok(json!([2, 1]))));
    }
}
