#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # labgrade
//! ## Introduction
//!
//! Course-staff tools around the grading harness.
//!
//! - `labgrade extract` unpacks bulk submission downloads into one directory
//!   per author set and writes `partners.json`.
//! - `labgrade merge` gives every member of a group the group's best score
//!   in `report.csv` and writes `merged_scores.csv` with a weighted total.
//!
//! Settings are read from the environment (and a `.env` file); see the
//! `config` module of the library.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use labgrade::{
    config,
    constants::{MERGED_SCORES_FILE, PARTNERS_FILE, REPORT_FILE},
    extract::{CreditMode, Extractor, load_roster},
    merge::ScoreMerger,
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Unpack bulk submission archives
    Extract {
        /// Directory holding the archives
        dir:          Option<PathBuf>,
        /// Course report used for the roster
        report:       Option<PathBuf>,
        /// Only credit partners when the author markers agree
        conservative: bool,
    },
    /// Merge group scores into the course report
    Merge {
        /// Course report to read
        report:   Option<PathBuf>,
        /// Partners map to read
        partners: Option<PathBuf>,
        /// Where to write the merged report
        output:   Option<PathBuf>,
    },
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the course report path
    fn report_file() -> impl Parser<Option<PathBuf>> {
        long("report")
            .help("Course report CSV (defaults to report.csv)")
            .argument::<PathBuf>("FILE")
            .optional()
    }

    let dir = long("dir")
        .help("Directory holding the bulk archives (defaults to the current directory)")
        .argument::<PathBuf>("DIR")
        .optional();
    let report = report_file();
    let conservative = long("conservative")
        .help("Only credit partners when every id has its own `author:` line")
        .switch();
    let extract = construct!(Cmd::Extract {
        dir,
        report,
        conservative
    })
    .to_options()
    .command("extract")
    .help("Extract submissions and detect partners");

    let report = report_file();
    let partners = long("partners")
        .help("Partners map (defaults to partners.json)")
        .argument::<PathBuf>("FILE")
        .optional();
    let output = long("output")
        .help("Merged report to write (defaults to merged_scores.csv)")
        .argument::<PathBuf>("FILE")
        .optional();
    let merge = construct!(Cmd::Merge {
        report,
        partners,
        output
    })
    .to_options()
    .command("merge")
    .help("Give partners the best score of their group");

    let cmd = construct!([extract, merge]);

    cmd.to_options()
        .descr("Grading and submission tools for programming labs")
        .run()
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();
    let work_dir = config::get()
        .work_dir()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    match cmd {
        Cmd::Extract {
            dir,
            report,
            conservative,
        } => {
            let dir = dir.unwrap_or(work_dir);
            let report = report.unwrap_or_else(|| dir.join(REPORT_FILE));
            let mode = if conservative {
                CreditMode::Conservative
            } else {
                CreditMode::Lenient
            };

            let partners = Extractor::builder()
                .dir(dir.clone())
                .roster(load_roster(&report))
                .mode(mode)
                .build()
                .run()
                .with_context(|| format!("Failed to extract submissions in {}", dir.display()))?;
            eprintln!("Extracted {} assignments", partners.len());
        }
        Cmd::Merge {
            report,
            partners,
            output,
        } => {
            let report = report.unwrap_or_else(|| work_dir.join(REPORT_FILE));
            let partners = partners.unwrap_or_else(|| work_dir.join(PARTNERS_FILE));
            let output = output.unwrap_or_else(|| work_dir.join(MERGED_SCORES_FILE));

            let merged = ScoreMerger::from_paths(&report, &partners)?
                .merge()
                .context("Failed to merge scores")?;
            merged.write(&output)?;
            eprintln!("Wrote {} rows to {}", merged.rows().len(), output.display());
        }
    };

    Ok(())
}
