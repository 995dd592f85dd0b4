#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Credits pair programming in the course report: every member of a group
//! gets the best score of the group for each lab, then a weighted lab total
//! is computed.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result, bail, ensure};

use crate::{
    constants::{ID_COLUMN, LAB_COLUMN_MARKER, SCHOOL_EMAIL_COLUMN, TOTAL_COLUMN},
    extract::PartnersMap,
    parsers::parser,
    roster::{Report, student_id_from_email, to_csv},
    util::round_to,
};

/// Merges group scores into a course report.
#[derive(Debug, Clone)]
pub struct ScoreMerger {
    /// The course report.
    report:   Report,
    /// Author sets per assignment.
    partners: PartnersMap,
}

impl ScoreMerger {
    /// Creates a merger over an already loaded report and partners map.
    pub fn new(report: Report, partners: PartnersMap) -> Self {
        Self { report, partners }
    }

    /// Loads the report and the partners map from disk.
    pub fn from_paths(report: &Path, partners: &Path) -> Result<Self> {
        let report = Report::from_path(report)?;
        let text = fs::read_to_string(partners)
            .with_context(|| format!("Could not read {}", partners.display()))?;
        let partners: PartnersMap = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid partners map", partners.display()))?;
        Ok(Self::new(report, partners))
    }

    /// Returns the positions of the lab score columns, in report order.
    pub fn lab_columns(&self) -> Vec<usize> {
        self.report
            .header()
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(LAB_COLUMN_MARKER))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Returns the normalized weight of each lab column, read from the
    /// trailing `(points)` of its header.
    pub fn weights(&self) -> Result<Vec<f64>> {
        let header = self.report.header();
        let points = self
            .lab_columns()
            .into_iter()
            .map(|idx| {
                parser::column_points(&header[idx])
                    .map(f64::from)
                    .with_context(|| format!("Lab column `{}` has no point value", header[idx]))
            })
            .collect::<Result<Vec<f64>>>()?;

        let total: f64 = points.iter().sum();
        ensure!(total > 0.0, "Lab columns are worth no points in total");
        Ok(points.into_iter().map(|p| p / total).collect())
    }

    /// Gives each group its best score per lab and computes the totals.
    pub fn merge(&self) -> Result<MergedScores> {
        let header = self.report.header();
        let email_idx = self.report.column_index(SCHOOL_EMAIL_COLUMN)?;
        let lab_columns = self.lab_columns();
        let weights = self.weights()?;

        let ids: Vec<String> = self
            .report
            .rows()
            .iter()
            .map(|row| student_id_from_email(&row[email_idx]))
            .collect();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (row, id) in ids.iter().enumerate() {
            if index.insert(id.as_str(), row).is_some() {
                tracing::warn!("Student {id} appears more than once in the report");
            }
        }

        let mut scores: Vec<Vec<Option<f64>>> = self
            .report
            .rows()
            .iter()
            .map(|row| {
                lab_columns
                    .iter()
                    .map(|&col| parse_score(&row[col], &header[col]))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        if self.partners.len() > lab_columns.len() {
            bail!(
                "{} assignments have partner data but the report has only {} lab columns",
                self.partners.len(),
                lab_columns.len()
            );
        }

        // Assignments are paired with lab columns by sorted name.
        for (lab, (assignment, groups)) in self.partners.iter().enumerate() {
            tracing::info!("{assignment} -> {}", header[lab_columns[lab]]);

            for group in groups {
                let rows: Vec<usize> = group
                    .iter()
                    .filter_map(|id| {
                        let row = index.get(id.as_str()).copied();
                        if row.is_none() {
                            tracing::warn!("{assignment}: {id} is not in the report");
                        }
                        row
                    })
                    .collect();

                let best = rows
                    .iter()
                    .filter_map(|&row| scores[row][lab])
                    .reduce(f64::max);
                if let Some(best) = best {
                    for &row in &rows {
                        scores[row][lab] = Some(best);
                    }
                }
            }
        }

        let mut merged_header = Vec::with_capacity(header.len() + 2);
        merged_header.push(ID_COLUMN.to_string());
        merged_header.extend(header.iter().cloned());
        merged_header.push(TOTAL_COLUMN.to_string());

        let rows = self
            .report
            .rows()
            .iter()
            .zip(ids)
            .zip(scores)
            .map(|((row, id), scores)| {
                let mut cells = row.clone();
                let mut total = 0.0;
                for ((&col, score), weight) in lab_columns.iter().zip(scores).zip(&weights) {
                    let score = score.unwrap_or(0.0);
                    cells[col] = score.to_string();
                    total += weight * score;
                }

                let mut merged = Vec::with_capacity(cells.len() + 2);
                merged.push(id);
                merged.extend(cells);
                merged.push(round_to(total, 2).to_string());
                merged
            })
            .collect();

        Ok(MergedScores {
            header: merged_header,
            rows,
        })
    }
}

/// Parses a lab score cell; empty cells are missing scores.
fn parse_score(cell: &str, column: &str) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .with_context(|| format!("`{cell}` in column `{column}` is not a score"))
}

/// The merged report.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedScores {
    /// Column names, id first and total last.
    header: Vec<String>,
    /// One row per student.
    rows:   Vec<Vec<String>>,
}

impl MergedScores {
    /// Returns the column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the row of student `id`.
    pub fn row(&self, id: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|first| first == id))
            .map(Vec::as_slice)
    }

    /// Returns the weighted lab total of student `id`.
    pub fn total(&self, id: &str) -> Option<f64> {
        self.row(id)?.last()?.parse().ok()
    }

    /// Renders the merged report as CSV.
    pub fn to_csv(&self) -> String {
        to_csv(std::iter::once(self.header.as_slice()).chain(self.rows.iter().map(Vec::as_slice)))
    }

    /// Writes the merged report to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv()).with_context(|| format!("Could not write {}", path.display()))
    }
}
