//! Cross-reference diff additions against a coverage report.

use std::path::Path;

use clap::ValueEnum;
use tracing::debug;

use crate::model::{AdditionMap, CoverageReport, MissingCoverage};

/// How added lines are matched against the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Walk the added source files. A file the report doesn't know about
    /// counts as wholly uncovered.
    #[default]
    Strict,
    /// Walk the files in the report. Files the report doesn't know about
    /// are ignored.
    Report,
}

/// Reconciliation settings.
#[derive(Debug, Clone)]
pub struct Policy {
    pub strategy: Strategy,
    /// Source extensions considered by [`Strategy::Strict`], without the
    /// leading dot. Empty accepts every file.
    pub extensions: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            strategy: Strategy::Strict,
            extensions: vec!["py".to_string()],
        }
    }
}

impl Policy {
    /// True when `path` has one of the configured source extensions.
    #[must_use]
    pub fn matches_extension(&self, path: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Return the added lines that lack coverage, per file, in ascending line
/// order. Excluded lines are never reported.
#[must_use]
pub fn reconcile(
    report: &CoverageReport,
    additions: &AdditionMap,
    policy: &Policy,
) -> MissingCoverage {
    let missing = match policy.strategy {
        Strategy::Strict => reconcile_strict(report, additions, policy),
        Strategy::Report => reconcile_report(report, additions),
    };
    debug!(
        strategy = ?policy.strategy,
        files = missing.files.len(),
        lines = missing.line_count(),
        "reconciled additions against coverage"
    );
    missing
}

fn reconcile_strict(
    report: &CoverageReport,
    additions: &AdditionMap,
    policy: &Policy,
) -> MissingCoverage {
    let mut missing = MissingCoverage::default();

    for (path, lines) in additions {
        if !policy.matches_extension(path) {
            debug!(path = %path, "skipping non-source file");
            continue;
        }
        let record = report.files.get(path);
        if record.is_none() {
            debug!(path = %path, "file absent from coverage report");
        }
        for (&line_number, content) in lines {
            let uncovered = record.map_or(true, |r| r.is_uncovered(line_number));
            if uncovered {
                missing.push(path, line_number, content);
            }
        }
    }

    missing
}

fn reconcile_report(report: &CoverageReport, additions: &AdditionMap) -> MissingCoverage {
    let mut missing = MissingCoverage::default();

    for (path, record) in &report.files {
        let Some(lines) = additions.get(path) else {
            continue;
        };
        for &line_number in &record.missing_lines {
            if record.excluded_lines.contains(&line_number) {
                continue;
            }
            if let Some(content) = lines.get(&line_number) {
                missing.push(path, line_number, content);
            }
        }
    }

    missing
}
