/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Only line records matter for the gate:
///   SF:<path to source file>
///   DA:<line number>,<execution count>[,<checksum>]
///   end_of_record
///
/// A line is missing when every `DA` record for it has a zero count, so
/// tracefiles that list the same file under several tests merge correctly.
/// LCOV has no exclusion records; excluded lines are simply not emitted by
/// the instrumenter.
use std::collections::BTreeMap;
use std::path::Path;

use super::Parser;
use crate::error::{CovgateError, Result};
use crate::model::{CoverageReport, FileRecord};

/// LCOV format parser.
pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, path: &Path, input: &[u8]) -> Result<CoverageReport> {
        let text = std::str::from_utf8(input).map_err(|e| CovgateError::MalformedReport {
            path: path.to_path_buf(),
            format: "LCOV",
            reason: e.to_string(),
        })?;
        Ok(parse_text(text))
    }
}

fn parse_text(text: &str) -> CoverageReport {
    // path -> line -> summed hit count
    let mut hits: BTreeMap<String, BTreeMap<u32, u64>> = BTreeMap::new();
    let mut current_file: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            current_file = None;
            continue;
        }

        // Split on first ':'
        let Some((tag, value)) = line.split_once(':') else {
            continue; // Skip lines we don't understand
        };

        match tag {
            "SF" => {
                hits.entry(value.to_string()).or_default();
                current_file = Some(value.to_string());
            }
            "DA" => {
                // Some instrumenters use negative counts (e.g., -1) to indicate
                // non-instrumentable lines. We skip those entirely.
                let Some(file) = current_file.as_ref() else {
                    continue;
                };
                let mut parts = value.splitn(3, ',');
                let (Some(line_str), Some(count_str)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let Ok(line_number) = line_str.parse::<u32>() else {
                    continue;
                };
                match count_str.parse::<i64>() {
                    Ok(count) if count >= 0 => {
                        let entry = hits
                            .entry(file.clone())
                            .or_default()
                            .entry(line_number)
                            .or_insert(0);
                        *entry = entry.saturating_add(count as u64);
                    }
                    _ => {}
                }
            }
            // TN, FN, FNDA, BRDA and the summary records don't affect line state.
            _ => {}
        }
    }

    let files = hits
        .into_iter()
        .map(|(path, lines)| {
            let missing_lines = lines
                .into_iter()
                .filter(|(_, count)| *count == 0)
                .map(|(line, _)| line)
                .collect();
            (
                path,
                FileRecord {
                    missing_lines,
                    excluded_lines: Default::default(),
                },
            )
        })
        .collect();

    CoverageReport { files }
}
