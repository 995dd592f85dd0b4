#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Rendering of traces shown to students.

use std::fmt::Write as _;

use super::panic::PanicReport;

/// Symbol prefixes belonging to the standard library and panic machinery.
const INFRASTRUCTURE_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "<std::",
    "<core::",
    "<alloc::",
    "rust_begin_unwind",
    "__rust",
    "test::",
    "<unknown>",
];

/// Marker of frames that belong to the harness itself.
const HARNESS_MARKER: &str = "labgrade::harness";

/// One frame of a rendered `std::backtrace::Backtrace`.
#[derive(Debug)]
struct Frame<'a> {
    /// Demangled symbol name.
    symbol:   &'a str,
    /// `at file:line:col` lines following the symbol.
    location: Vec<&'a str>,
}

/// Splits the `Display` output of a backtrace into frames.
fn parse_frames(backtrace: &str) -> Vec<Frame<'_>> {
    let mut frames: Vec<Frame<'_>> = Vec::new();

    for line in backtrace.lines() {
        let trimmed = line.trim_start();
        let header = trimmed
            .split_once(": ")
            .filter(|(idx, _)| !idx.is_empty() && idx.chars().all(|c| c.is_ascii_digit()));

        match header {
            Some((_, symbol)) => frames.push(Frame {
                symbol:   symbol.trim(),
                location: Vec::new(),
            }),
            None => {
                if let Some(frame) = frames.last_mut() {
                    frame.location.push(trimmed);
                }
            }
        }
    }

    frames
}

/// Returns true for standard library and panic machinery frames.
fn is_infrastructure(frame: &Frame<'_>) -> bool {
    INFRASTRUCTURE_PREFIXES
        .iter()
        .any(|prefix| frame.symbol.starts_with(prefix))
}

/// Returns true for frames that belong to the harness itself.
fn is_harness(frame: &Frame<'_>) -> bool {
    frame.symbol.contains(HARNESS_MARKER)
}

/// Keeps only the frames attributable to the code under test: the panic
/// machinery on top is skipped, standard library frames are dropped and
/// everything from the first harness frame down is cut off.
fn student_frames(backtrace: &str) -> Vec<Frame<'_>> {
    let frames = parse_frames(backtrace);
    let start = frames
        .iter()
        .position(|frame| !is_infrastructure(frame) && !is_harness(frame))
        .unwrap_or(frames.len());

    frames
        .into_iter()
        .skip(start)
        .take_while(|frame| !is_harness(frame))
        .filter(|frame| !is_infrastructure(frame))
        .collect()
}

/// Removes every configured prefix from `text`.
pub(crate) fn strip_prefixes(text: &str, prefixes: &[String]) -> String {
    prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .fold(text.to_string(), |acc, prefix| acc.replace(prefix.as_str(), ""))
}

/// Renders a panic the way students see it.
pub(crate) fn render_panic(report: &PanicReport, prefixes: &[String]) -> String {
    let mut out = String::new();

    match report.location() {
        Some(location) => {
            let _ = writeln!(out, "panicked at {location}:");
        }
        None => out.push_str("panicked:\n"),
    }
    let _ = writeln!(out, "{}", report.message());

    if let Some(backtrace) = report.backtrace() {
        let frames = student_frames(backtrace);
        if !frames.is_empty() {
            out.push_str("stack backtrace:\n");
            for (idx, frame) in frames.iter().enumerate() {
                let _ = writeln!(out, "{idx:>4}: {}", frame.symbol);
                for at in &frame.location {
                    let _ = writeln!(out, "             {at}");
                }
            }
        }
    }

    strip_prefixes(&out, prefixes)
}

/// Renders an error returned from the code under test, cause chain included.
pub(crate) fn render_error(err: &anyhow::Error, prefixes: &[String]) -> String {
    let mut out = format!("{err:?}");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    strip_prefixes(&out, prefixes)
}
