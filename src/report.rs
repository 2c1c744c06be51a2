//! Output formatting for gate results.

use std::fmt::Write;

use crate::model::{AdditionMap, MissingCoverage};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Gate result plus the diff totals it was computed from, ready to be
/// formatted.
pub struct GateReport {
    /// Number of files with added lines in the diff.
    pub added_files: usize,
    /// Total number of added lines across all files.
    pub added_lines: usize,
    /// Added lines lacking coverage.
    pub missing: MissingCoverage,
}

impl GateReport {
    pub fn new(additions: &AdditionMap, missing: MissingCoverage) -> Self {
        Self {
            added_files: additions.len(),
            added_lines: additions.values().map(|lines| lines.len()).sum(),
            missing,
        }
    }

    /// True when no added line lacks coverage.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }

    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }
}

/// Trait for formatting gate reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &GateReport) -> String;
}

/// Plain text formatter: a pass/fail banner followed by every uncovered
/// line as `<number> <text>`, grouped by file.
pub struct TextFormatter {
    /// Wrap the banner in ANSI color codes.
    pub color: bool,
}

impl TextFormatter {
    fn banner(&self, text: &str, color: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &GateReport) -> String {
        let mut out = String::new();

        if report.passed() {
            writeln!(out, "{}", self.banner("Success!", GREEN)).unwrap();
            return out;
        }

        writeln!(out, "{}", self.banner("Failure", RED)).unwrap();
        out.push('\n');
        out.push_str("Changes missing coverage:\n");
        for (path, lines) in &report.missing.files {
            writeln!(out, "{path}:").unwrap();
            for line in lines {
                writeln!(out, "{} {}", line.line_number, line.content).unwrap();
            }
            out.push('\n');
        }

        out
    }
}

/// Markdown formatter, suitable for a pull request comment.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &GateReport) -> String {
        let mut md = String::new();

        if report.passed() {
            md.push_str("### Coverage gate: passed\n\n");
            let lines = report.added_lines;
            let files = report.added_files;
            writeln!(
                md,
                "All added lines are covered ({lines} lines across {files} files). 🎉"
            )
            .unwrap();
            return md;
        }

        md.push_str("### Coverage gate: failed\n\n");
        let missing = report.missing.line_count();
        let files = report.missing.files.len();
        let added = report.added_lines;
        writeln!(
            md,
            "**{missing}** of **{added}** added lines lack coverage in **{files}** files.\n"
        )
        .unwrap();

        md.push_str("| File | Missing | Lines |\n");
        md.push_str("|:-----|--------:|:------|\n");
        for (path, lines) in &report.missing.files {
            let numbers: Vec<u32> = lines.iter().map(|l| l.line_number).collect();
            let count = numbers.len();
            let ranges = format_line_ranges(&numbers);
            writeln!(md, "| `{path}` | {count} | {ranges} |").unwrap();
        }

        md.push_str("\n<details>\n<summary>Uncovered lines</summary>\n\n");
        for (path, lines) in &report.missing.files {
            writeln!(md, "**`{path}`**\n\n```").unwrap();
            for line in lines {
                writeln!(md, "{} {}", line.line_number, line.content).unwrap();
            }
            md.push_str("```\n\n");
        }
        md.push_str("</details>\n");

        md
    }
}

/// Coalesce sorted line numbers into consecutive `(start, end)` ranges.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut start = first;
    let mut end = first;

    for &line in rest {
        if line == end.saturating_add(1) {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }

    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
///
/// The input slice must be sorted in ascending order.
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
