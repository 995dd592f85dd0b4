#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Checks that submitted files open with documentation naming their authors
//! instead of the course template's placeholders.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    constants::PASSED,
    harness::{CheckError, CheckResult, ExecutionContext, TestCase, test},
};

/// Any of these in the header counts as naming an author.
const AUTHOR_TAGS: [&str; 3] = ["\nAuthor", "Author:", "@author"];

/// Placeholder names and usernames from the template.
const TEMPLATE_NAMES: [&str; 4] = ["YOUR-NAME", "yn123", "PARTNER-NAME", "pn31"];

/// Placeholder descriptions from the template.
const TEMPLATE_DESCRIPTIONS: [&str; 2] = ["Describe the module here.", "Lab X.X"];

/// Feedback when a file cannot be read.
const UNREADABLE: &str = "Unknown error reading documentation. Ask the course staff for help.";

/// Extracts the documentation block a source file opens with.
///
/// Recognises a triple-quoted string, a `/* ... */` block, or a run of line
/// comments (`//!`, `///`, `//`, `#`). A leading shebang line is skipped.
/// Returns `None` when the file does not start with documentation.
pub fn leading_documentation(source: &str) -> Option<String> {
    let mut lines = source
        .lines()
        .skip_while(|line| line.trim().is_empty() || line.starts_with("#!"))
        .peekable();
    let first = lines.peek()?.trim_start();

    for quote in ["\"\"\"", "'''"] {
        if first.starts_with(quote) {
            let start = source.find(quote)? + quote.len();
            let body = &source[start..];
            return body.find(quote).map(|end| body[..end].trim().to_string());
        }
    }

    if first.starts_with("/*") {
        let start = source.find("/*")? + 2;
        let body = &source[start..];
        let end = body.find("*/")?;
        let text = body[..end]
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim_start())
            .collect::<Vec<_>>()
            .join("\n");
        return Some(text.trim().to_string());
    }

    let comment: Vec<&str> = lines
        .map_while(|line| {
            let line = line.trim_start();
            ["//!", "///", "//", "#"]
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
                .map(str::trim)
        })
        .collect();

    if comment.is_empty() {
        None
    } else {
        Some(comment.join("\n"))
    }
}

/// Reviews one file's documentation, returning the failure message if it
/// falls short.
fn review(path: &Path) -> Option<String> {
    let name = path.display();
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Could not read {name}: {e}");
            return Some(format!("{UNREADABLE}\n\n{e}\n"));
        }
    };

    let docs = leading_documentation(&source);
    let Some(docs) = docs.filter(|docs| AUTHOR_TAGS.iter().any(|tag| docs.contains(tag))) else {
        return Some(format!("{name} documentation should include author (see the template)."));
    };

    if TEMPLATE_NAMES.iter().any(|p| docs.contains(p)) {
        return Some(format!(
            "{name}: Please replace the template names and usernames with your own."
        ));
    }

    if TEMPLATE_DESCRIPTIONS.iter().any(|p| docs.contains(p)) {
        return Some(format!("{name}: Please replace the template documentation with your own."));
    }

    None
}

/// Builds a test case checking that every file in `paths` documents its
/// authors; the first file that falls short fails the case.
pub fn authorship_case(
    paths: impl IntoIterator<Item = impl Into<PathBuf>>,
) -> TestCase<impl FnOnce(&mut ExecutionContext) -> CheckResult<bool> + 'static> {
    let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();

    test(move |ctx: &mut ExecutionContext| -> CheckResult<bool> {
        if let Some(message) = paths.iter().find_map(|path| review(path)) {
            return Err(CheckError::failure(message));
        }

        ctx.feedback().push_str(PASSED);
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::leading_documentation;

    #[test]
    fn reads_triple_quoted_headers() {
        let source = "#!/usr/bin/env python3\n\"\"\"Lab 2.1\n\nAuthor: Ada\n\"\"\"\nimport os\n";
        assert_eq!(
            leading_documentation(source).as_deref(),
            Some("Lab 2.1\n\nAuthor: Ada")
        );
    }

    #[test]
    fn reads_line_comment_headers() {
        let source = "//! Adds numbers.\n//! @author al12\nfn main() {}\n";
        assert_eq!(
            leading_documentation(source).as_deref(),
            Some("Adds numbers.\n@author al12")
        );
    }

    #[test]
    fn reads_block_comment_headers() {
        let source = "/**\n * Grade book.\n * Author: Ada\n */\nclass A {}\n";
        assert_eq!(
            leading_documentation(source).as_deref(),
            Some("Grade book.\nAuthor: Ada")
        );
    }

    #[test]
    fn code_first_has_no_header() {
        assert_eq!(leading_documentation("import os\n# Author: Ada\n"), None);
    }
}
