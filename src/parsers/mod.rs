pub mod coveragepy;
pub mod lcov;

use std::path::Path;

use tracing::debug;

use crate::detect::{detect_format, Format};
use crate::error::{CovgateError, Result};
use crate::model::CoverageReport;

/// Every report format parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into the uniform report model. `path` is only
    /// used to name the report in errors.
    fn parse(&self, path: &Path, input: &[u8]) -> Result<CoverageReport>;
}

/// Read a coverage report, auto-detect its format (or use the override)
/// and parse it. Returns the report and the format it was read as.
pub fn load_report(path: &Path, format_override: Option<&str>) -> Result<(CoverageReport, Format)> {
    let content = std::fs::read(path).map_err(|e| CovgateError::from_io(path, e))?;

    let format = if let Some(fmt_str) = format_override {
        fmt_str.parse::<Format>()?
    } else {
        detect_format(path, &content)
            .ok_or_else(|| CovgateError::UnknownFormat(path.display().to_string()))?
    };

    let report = parse_with_format(format, path, &content)?;
    debug!(
        path = %path.display(),
        %format,
        files = report.files.len(),
        "loaded coverage report"
    );
    Ok((report, format))
}

fn parse_with_format(format: Format, path: &Path, content: &[u8]) -> Result<CoverageReport> {
    match format {
        Format::CoveragePy => coveragepy::CoveragePyParser.parse(path, content),
        Format::Lcov => lcov::LcovParser.parse(path, content),
    }
}
