#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The course report exported from the learning platform, and the student
//! roster derived from it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{constants::SCHOOL_EMAIL_COLUMN, parsers::parser};

/// Errors raised while loading a course report.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The report could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        /// Path of the report.
        path:   PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The report is not valid CSV.
    #[error("could not parse the report: {0}")]
    Parse(String),
    /// The report has no header row.
    #[error("the report is empty")]
    Empty,
    /// A row holds more fields than the header names.
    #[error("row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        /// 1-based row number, header included.
        row:      usize,
        /// Fields found.
        found:    usize,
        /// Fields in the header.
        expected: usize,
    },
    /// A required column is missing.
    #[error("the report has no `{0}` column")]
    MissingColumn(String),
}

/// A course report: a header row and one row per student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Column names.
    header: Vec<String>,
    /// Student rows, each as long as the header.
    rows:   Vec<Vec<String>>,
}

impl Report {
    /// Parses CSV text. Blank lines are skipped and short rows are padded
    /// with empty fields.
    pub fn parse(text: &str) -> Result<Self, RosterError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = parser::csv(text)
            .map_err(|e| RosterError::Parse(e.to_string()))?
            .into_iter()
            .filter(|record| !(record.len() == 1 && record[0].trim().is_empty()));

        let header = records.next().ok_or(RosterError::Empty)?;
        let width = header.len();
        let mut rows = Vec::new();
        for (idx, mut record) in records.enumerate() {
            if record.len() > width {
                return Err(RosterError::RaggedRow {
                    row:      idx + 2,
                    found:    record.len(),
                    expected: width,
                });
            }
            record.resize(width, String::new());
            rows.push(record);
        }

        Ok(Self { header, rows })
    }

    /// Reads and parses the report at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Returns the column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Returns the student rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the position of the column named `name`.
    pub fn column_index(&self, name: &str) -> Result<usize, RosterError> {
        self.header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| RosterError::MissingColumn(name.to_string()))
    }

    /// Returns the values of the column named `name`, one per row.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, RosterError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Returns the student id of every row, derived from the school email.
    pub fn student_ids(&self) -> Result<Vec<String>, RosterError> {
        Ok(self
            .column(SCHOOL_EMAIL_COLUMN)?
            .into_iter()
            .map(student_id_from_email)
            .collect())
    }
}

/// Returns the part of a school email before the `@`.
pub fn student_id_from_email(email: &str) -> String {
    let email = email.trim();
    email
        .split_once('@')
        .map_or(email, |(id, _)| id)
        .to_string()
}

/// Quotes a CSV field when it holds a separator, a quote or a line break.
fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders rows as CSV text, one line per row.
pub fn to_csv<'a>(rows: impl IntoIterator<Item = &'a [String]>) -> String {
    rows.into_iter()
        .map(|row| {
            row.iter()
                .map(|field| quote_field(field))
                .collect::<Vec<_>>()
                .join(",")
                + "\n"
        })
        .collect()
}
