//! Uniform in-memory representation of the gate's inputs and result,
//! independent of the diff tool or coverage format that produced them.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

/// File path -> (1-based line number in the new file -> added text).
pub type AdditionMap = BTreeMap<String, BTreeMap<u32, String>>;

/// Coverage state of a single source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileRecord {
    /// Lines that were never executed during tests.
    #[serde(default)]
    pub missing_lines: BTreeSet<u32>,
    /// Lines exempt from coverage accounting. Wins over `missing_lines`.
    #[serde(default)]
    pub excluded_lines: BTreeSet<u32>,
}

impl FileRecord {
    /// True when `line` counts against coverage.
    #[must_use]
    pub fn is_uncovered(&self, line: u32) -> bool {
        self.missing_lines.contains(&line) && !self.excluded_lines.contains(&line)
    }
}

/// The complete result of parsing a coverage report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CoverageReport {
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An added line that lacks coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncoveredLine {
    pub line_number: u32,
    pub content: String,
}

/// Added lines lacking coverage, grouped by file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingCoverage {
    pub files: BTreeMap<String, Vec<UncoveredLine>>,
}

impl MissingCoverage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of flagged lines across all files.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Record an uncovered line, creating the file entry on first use.
    pub fn push(&mut self, path: &str, line_number: u32, content: &str) {
        self.files
            .entry(path.to_string())
            .or_default()
            .push(UncoveredLine {
                line_number,
                content: content.to_string(),
            });
    }
}
