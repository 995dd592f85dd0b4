#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Unpacks bulk submission downloads: each `*.zip` in the working directory
//! holds one zip per submitting student. Files land in one directory per
//! author set, and the author sets are recorded in `partners.json`.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::{Cursor, Read, Seek},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail, ensure};
use bon::Builder;
use itertools::Itertools;
use zip::ZipArchive;

use crate::{
    config::{self, ExtractConfig},
    constants::{AUTHOR_MARKER, PARTNERS_FILE},
    roster::Report,
    util::find_files,
};

/// Author sets per assignment: `{assignment: [[submitter, co-authors...]]}`.
pub type PartnersMap = BTreeMap<String, Vec<Vec<String>>>;

/// How credited partners are detected in submitted files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreditMode {
    /// Every roster id mentioned anywhere counts as an author.
    #[default]
    Lenient,
    /// Mentions only count when there are exactly as many `author:` markers
    /// as ids found; otherwise the authors are unknown.
    Conservative,
}

/// The fields encoded in a per-student archive name,
/// `<name>_<email>_<date>_<time>.zip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionName {
    /// Student name, underscores replaced by spaces.
    name:       String,
    /// Student id derived from the email.
    student_id: String,
    /// Submission date as written.
    date:       String,
    /// Submission time as written.
    time:       String,
}

impl SubmissionName {
    /// Returns the student name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the student id.
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Returns the submission date.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Returns the submission time.
    pub fn time(&self) -> &str {
        &self.time
    }
}

/// Parses a per-student archive name. Names may contain underscores, so the
/// fields are split from the right.
pub fn parse_submission_name(entry: &str, config: &ExtractConfig) -> Result<SubmissionName> {
    let stem = entry.strip_suffix(".zip").unwrap_or(entry);
    let mut fields = stem.rsplitn(4, '_');
    let (Some(time), Some(date), Some(email), Some(name)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        bail!("`{entry}` is not named <name>_<email>_<date>_<time>.zip");
    };

    let email = email.to_lowercase();
    let student_id = email
        .strip_suffix(config.school_domain())
        .unwrap_or(&email)
        .trim_end_matches('@')
        .to_string();
    ensure!(
        student_id.len() < config.max_id_len(),
        "`{student_id}` (from `{entry}`) is too long to be a student id"
    );

    Ok(SubmissionName {
        name: name.replace('_', " "),
        student_id,
        date: date.to_string(),
        time: time.to_string(),
    })
}

/// Returns the roster ids credited in `contents`.
pub fn credited_authors(contents: &str, roster: &[String], mode: CreditMode) -> Vec<String> {
    let lower = contents.to_lowercase();
    let authors: Vec<String> = roster
        .iter()
        .filter(|id| lower.contains(id.as_str()))
        .cloned()
        .collect();

    match mode {
        CreditMode::Lenient => authors,
        CreditMode::Conservative
            if !authors.is_empty() && authors.len() == lower.matches(AUTHOR_MARKER).count() =>
        {
            authors
        }
        CreditMode::Conservative => Vec::new(),
    }
}

/// Loads student ids from the course report at `path`. A missing or
/// malformed report disables partner crediting instead of failing.
pub fn load_roster(path: &Path) -> Vec<String> {
    match Report::from_path(path).and_then(|report| report.student_ids()) {
        Ok(ids) => ids
            .into_iter()
            .map(|id| id.to_lowercase())
            .filter(|id| !id.is_empty())
            .collect(),
        Err(e) => {
            tracing::warn!(
                "Failed to load school emails from {}; partner-crediting functionality is \
                 disabled: {e}",
                path.display()
            );
            Vec::new()
        }
    }
}

/// One student's submission.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Who submitted it.
    name:       SubmissionName,
    /// Submitted files, in archive order, as safe relative paths.
    files:      Vec<(PathBuf, String)>,
    /// Other credited authors.
    co_authors: BTreeSet<String>,
}

impl Submission {
    /// Returns the parsed archive name.
    pub fn name(&self) -> &SubmissionName {
        &self.name
    }

    /// Returns the submitted files.
    pub fn files(&self) -> &[(PathBuf, String)] {
        &self.files
    }

    /// Returns the credited co-authors, excluding the submitter.
    pub fn co_authors(&self) -> &BTreeSet<String> {
        &self.co_authors
    }

    /// Returns the submitter followed by the sorted co-authors.
    pub fn authors(&self) -> Vec<String> {
        std::iter::once(self.name.student_id.clone())
            .chain(self.co_authors.iter().cloned())
            .collect()
    }

    /// Returns the directory name for this author set.
    pub fn dir_name(&self) -> String {
        self.authors().join("_")
    }
}

/// Extracts every bulk archive in a directory.
#[derive(Debug, Clone, Builder)]
pub struct Extractor {
    /// Directory holding the bulk archives; output goes here too.
    #[builder(into)]
    dir:    PathBuf,
    /// Known student ids. Empty disables partner crediting.
    #[builder(default, with = |iter: impl IntoIterator<Item = impl Into<String>>| {
        iter.into_iter().map(Into::into).collect::<Vec<String>>()
    })]
    roster: Vec<String>,
    /// How credited partners are detected.
    #[builder(default)]
    mode:   CreditMode,
    /// Extractor settings.
    #[builder(default = config::extract())]
    config: ExtractConfig,
}

impl Extractor {
    /// Returns the bulk archives to extract, sorted by name.
    pub fn archives(&self) -> Result<Vec<PathBuf>> {
        let archives = find_files("zip", 0, &self.dir)?;
        ensure!(
            archives.len() < self.config.max_archives(),
            "Lots of zipfiles, are you sure this is the right directory?"
        );
        if archives.is_empty() {
            tracing::warn!("No zipfiles found in {}", self.dir.display());
        }
        Ok(archives)
    }

    /// Reads every submission in a bulk archive.
    pub fn read_archive(&self, path: &Path) -> Result<Vec<Submission>> {
        let file =
            fs::File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("{} is not a zip archive", path.display()))?;

        let mut submissions = Vec::new();
        for idx in 0..archive.len() {
            let mut entry = archive.by_index(idx)?;
            if entry.is_dir() {
                continue;
            }

            let entry_name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .with_context(|| format!("Could not read {entry_name}"))?;

            let submission = self
                .read_submission(&entry_name, Cursor::new(bytes))
                .with_context(|| format!("Could not read the submission {entry_name}"))?;
            submissions.push(submission);
        }

        Ok(submissions)
    }

    /// Reads one per-student archive.
    fn read_submission(&self, entry_name: &str, reader: impl Read + Seek) -> Result<Submission> {
        let file_name = Path::new(entry_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(entry_name);
        let name = parse_submission_name(file_name, &self.config)?;
        let mut archive = ZipArchive::new(reader)?;

        let mut files = Vec::new();
        for idx in 0..archive.len() {
            let mut entry = archive.by_index(idx)?;
            if entry.is_dir() {
                continue;
            }
            let Some(path) = entry.enclosed_name() else {
                tracing::warn!("Skipping {} in {entry_name}: unsafe path", entry.name());
                continue;
            };

            let mut contents = String::new();
            entry
                .read_to_string(&mut contents)
                .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
            files.push((path, contents));
        }

        let mut co_authors: BTreeSet<String> = files
            .iter()
            .flat_map(|(_, contents)| credited_authors(contents, &self.roster, self.mode))
            .collect();

        if !self.roster.is_empty() {
            if co_authors.remove(name.student_id()) {
                if !co_authors.is_empty() {
                    tracing::info!(
                        "{} also credited {}",
                        name.student_id(),
                        co_authors.iter().join(", ")
                    );
                }
            } else {
                tracing::warn!("Submitting student didn't include their id: {}", name.student_id());
            }
        }

        Ok(Submission {
            name,
            files,
            co_authors,
        })
    }

    /// Extracts one bulk archive into `<dir>/<stem>/<authors>/`, returning
    /// the author sets found.
    pub fn extract_archive(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        let stem = archive_stem(path)?;
        tracing::info!("Extracting assignment: {stem}");

        let out_dir = self.dir.join(stem);
        let mut groups = Vec::new();
        let mut seen = BTreeSet::new();

        for submission in self.read_archive(path)? {
            let authors = submission.authors();
            let submission_dir = out_dir.join(submission.dir_name());
            fs::create_dir_all(&submission_dir)
                .with_context(|| format!("Could not create {}", submission_dir.display()))?;

            for (relative, contents) in submission.files() {
                let target = submission_dir.join(relative);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Could not create {}", parent.display()))?;
                }
                fs::write(&target, contents)
                    .with_context(|| format!("Could not write {}", target.display()))?;
            }

            seen.extend(authors.iter().cloned());
            groups.push(authors);
        }

        let missing = self
            .roster
            .iter()
            .filter(|id| !seen.contains(id.as_str()))
            .join(", ");
        if !missing.is_empty() {
            tracing::warn!("{stem}: Didn't see anything from students: {missing}");
        }

        Ok(groups)
    }

    /// Extracts every bulk archive and writes `partners.json`.
    pub fn run(&self) -> Result<PartnersMap> {
        let mut partners = PartnersMap::new();
        for archive in self.archives()? {
            let groups = self.extract_archive(&archive)?;
            partners.insert(archive_stem(&archive)?.to_string(), groups);
        }

        let path = self.dir.join(PARTNERS_FILE);
        let json = serde_json::to_string_pretty(&partners)?;
        fs::write(&path, json).with_context(|| format!("Could not write {}", path.display()))?;
        tracing::info!("Wrote {}", path.display());

        Ok(partners)
    }
}

/// Returns the file stem of a bulk archive, naming the assignment.
fn archive_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))
}
