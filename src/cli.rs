//! Command-line model and the gate pipeline behind it.
//!
//! [`cmd_check`] returns its output as a `String` together with the
//! pass/fail verdict, making it easy to test without capturing stdout.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::diff::{self, DiffSource, FileDiff, GitDiff, StdinDiff};
use crate::model::CoverageReport;
use crate::parsers;
use crate::reconcile::{self, Policy, Strategy};
use crate::report::{GateReport, MarkdownFormatter, ReportFormatter, TextFormatter};

/// covgate: fail the build when lines added in a diff lack test coverage.
#[derive(Parser, Debug)]
#[command(name = "covgate", version, about)]
pub struct Cli {
    /// Path to a unified diff file. Omit to read the diff from stdin.
    #[arg(short, long, conflicts_with = "git_diff")]
    pub diff: Option<PathBuf>,

    /// Git diff arguments, e.g. "origin/main...HEAD". Runs `git diff`
    /// instead of reading a diff file.
    #[arg(long)]
    pub git_diff: Option<String>,

    /// Path to the coverage report (coverage.py JSON or LCOV).
    #[arg(short, long)]
    pub report: PathBuf,

    /// Override report format detection (coveragepy, lcov).
    #[arg(long)]
    pub format: Option<String>,

    /// How added lines are matched against the report.
    #[arg(long, value_enum, default_value_t = Strategy::Strict)]
    pub strategy: Strategy,

    /// Source file extension to check (repeatable). Only used by the
    /// strict strategy.
    #[arg(short, long = "extension", default_values = ["py"])]
    pub extensions: Vec<String>,

    /// Path prefix to prepend to diff paths for matching against
    /// coverage report paths.
    #[arg(long)]
    pub path_prefix: Option<String>,

    /// Output style.
    #[arg(long, value_enum, default_value_t = Style::Text)]
    pub style: Style,

    /// When to color the pass/fail banner.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Log pipeline details to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn diff_source(&self) -> Box<dyn DiffSource> {
        match (&self.diff, &self.git_diff) {
            (Some(path), _) => Box::new(FileDiff { path: path.clone() }),
            (None, Some(args)) => Box::new(GitDiff { args: args.clone() }),
            (None, None) => Box::new(StdinDiff),
        }
    }

    fn policy(&self) -> Policy {
        Policy {
            strategy: self.strategy,
            extensions: self.extensions.clone(),
        }
    }
}

/// Output style for the gate report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
}

/// Banner coloring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color only when stdout is a terminal.
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    #[must_use]
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Rendered report and verdict of a gate run.
#[derive(Debug)]
pub struct Outcome {
    pub output: String,
    pub passed: bool,
}

/// Run the gate: load the report, read and parse the diff, reconcile and
/// render. Any input or parse failure aborts the run.
pub fn cmd_check(cli: &Cli, color: bool) -> Result<Outcome> {
    let (report, detected) = parsers::load_report(&cli.report, cli.format.as_deref())?;

    let diff_text = cli.diff_source().fetch_diff()?;
    let outcome = cmd_check_diff(cli, &report, &diff_text, color)?;
    info!(format = %detected, passed = outcome.passed, "coverage gate finished");
    Ok(outcome)
}

/// Core gate logic. Accepts the diff text directly so callers can obtain it
/// from stdin, a file or `git diff`.
pub fn cmd_check_diff(
    cli: &Cli,
    report: &CoverageReport,
    diff_text: &str,
    color: bool,
) -> Result<Outcome> {
    let mut additions = diff::extract_additions(diff_text)?;

    if let Some(prefix) = cli.path_prefix.as_deref() {
        additions = diff::apply_path_prefix(additions, prefix);
    }

    let missing = reconcile::reconcile(report, &additions, &cli.policy());
    let gate = GateReport::new(&additions, missing);

    let formatter: Box<dyn ReportFormatter> = match cli.style {
        Style::Text => Box::new(TextFormatter { color }),
        Style::Markdown => Box::new(MarkdownFormatter),
    };

    Ok(Outcome {
        output: gate.format(formatter.as_ref()),
        passed: gate.passed(),
    })
}
