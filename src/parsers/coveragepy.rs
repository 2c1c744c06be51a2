/// Parser for the coverage.py JSON export (`coverage json`).
///
/// Reference: https://coverage.readthedocs.io/en/latest/cmd.html#json-reporting-coverage-json
///
/// Only the per-file `missing_lines` and `excluded_lines` arrays are read:
///
/// ```json
/// { "meta": {...},
///   "files": { "pkg/a.py": { "executed_lines": [1, 2],
///                            "missing_lines": [3],
///                            "excluded_lines": [4],
///                            "summary": {...} } },
///   "totals": {...} }
/// ```
use std::path::Path;

use super::Parser;
use crate::error::{CovgateError, Result};
use crate::model::CoverageReport;

/// coverage.py JSON parser.
pub struct CoveragePyParser;

impl Parser for CoveragePyParser {
    fn parse(&self, path: &Path, input: &[u8]) -> Result<CoverageReport> {
        serde_json::from_slice(input).map_err(|e| CovgateError::MalformedReport {
            path: path.to_path_buf(),
            format: "JSON",
            reason: e.to_string(),
        })
    }
}
