/// Auto-detection of coverage report formats.
///
/// Strategy:
///   1. Check file extension for strong hints
///   2. Peek at the first bytes of the file content
///   3. Fall back to the CLI --format override (handled by caller)
use std::path::Path;

use crate::error::CovgateError;

/// Supported coverage report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `coverage json` output from coverage.py.
    CoveragePy,
    Lcov,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::CoveragePy => "coveragepy",
            Format::Lcov => "lcov",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovgateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coveragepy" | "coverage.py" | "json" => Ok(Format::CoveragePy),
            "lcov" => Ok(Format::Lcov),
            _ => Err(CovgateError::UnknownFormat(format!(
                "'{}'. Supported: coveragepy, lcov",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the report format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    // 1. Try extension-based detection
    if let Some(fmt) = detect_by_extension(path) {
        return Some(fmt);
    }

    // 2. Content-based detection
    detect_by_content(content)
}

fn detect_by_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "json" => Some(Format::CoveragePy),
        "info" | "lcov" => Some(Format::Lcov),
        _ => None,
    }
}

fn detect_by_content(content: &[u8]) -> Option<Format> {
    // We only need to look at the first few KB
    let head_len = content.len().min(4096);
    let head = String::from_utf8_lossy(&content[..head_len]);

    if head.trim_start().starts_with('{') {
        return Some(Format::CoveragePy);
    }

    // LCOV: lines start with SF:, DA:, etc.
    let has_sf = head.lines().any(|l| l.starts_with("SF:"));
    let has_da = head.lines().any(|l| l.starts_with("DA:"));
    if has_sf && has_da {
        return Some(Format::Lcov);
    }

    None
}
