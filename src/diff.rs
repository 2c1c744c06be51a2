/// Parse a unified diff to extract the lines added to each file, together
/// with their text. This is the input side of the coverage gate: every
/// added line is later checked against the coverage report.
///
/// Also provides a [`DiffSource`] trait that abstracts over different
/// ways to obtain a diff (stdin, a file, git).
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{CovgateError, Result};
use crate::model::AdditionMap;

// ---------------------------------------------------------------------------
// Diff sources
// ---------------------------------------------------------------------------

/// A source for obtaining a unified diff.
pub trait DiffSource {
    /// Fetch the diff text.
    fn fetch_diff(&self) -> Result<String>;
}

/// Diff from stdin.
pub struct StdinDiff;

impl DiffSource for StdinDiff {
    fn fetch_diff(&self) -> Result<String> {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| CovgateError::from_io("<stdin>", e))
    }
}

/// Diff stored in a file on disk.
pub struct FileDiff {
    pub path: PathBuf,
}

impl DiffSource for FileDiff {
    fn fetch_diff(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| CovgateError::from_io(&self.path, e))
    }
}

/// Diff from a git command (e.g., `git diff HEAD~1`).
pub struct GitDiff {
    /// Arguments to pass to `git diff`.
    pub args: String,
}

impl DiffSource for GitDiff {
    fn fetch_diff(&self) -> Result<String> {
        let diff_args: Vec<&str> = self.args.split_whitespace().collect();
        debug!(args = ?diff_args, "running git diff");
        let output = Command::new("git")
            .arg("diff")
            .args(&diff_args)
            .output()
            .map_err(|e| CovgateError::Git(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CovgateError::Git(stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| CovgateError::Git("output not valid UTF-8".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Diff parsing
// ---------------------------------------------------------------------------

/// Per-file header that starts every file section (`diff --git a/x b/x`).
static FILE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^diff .*$").unwrap());

/// Prepend a path prefix to all file paths in an addition map.
pub fn apply_path_prefix(additions: AdditionMap, prefix: &str) -> AdditionMap {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return additions;
    }
    additions
        .into_iter()
        .map(|(path, lines)| (format!("{prefix}/{path}"), lines))
        .collect()
}

/// Parse a unified diff (e.g., `git diff`) and return a map of
/// file path -> (added line number in the new file -> added text).
///
/// Files that gain no lines (deletions, renames, binary or mode-only
/// changes) do not appear in the result. A hunk header whose new-file
/// start cannot be read is fatal, since every line number after it in
/// that file would be wrong.
pub fn extract_additions(diff_text: &str) -> Result<AdditionMap> {
    let mut additions = AdditionMap::new();

    // Anything ahead of the first file header is commit metadata.
    for section in FILE_HEADER_RE.split(diff_text).skip(1) {
        if section.trim().is_empty() {
            continue;
        }
        let Some((path, lines)) = parse_section(section)? else {
            continue;
        };
        if lines.is_empty() {
            debug!(path = %path, "no added lines");
            continue;
        }
        additions.entry(path).or_default().extend(lines);
    }

    debug!(files = additions.len(), "extracted diff additions");
    Ok(additions)
}

/// Parse one file section. Returns `None` when the section has no
/// new-file marker or the new side is `/dev/null`.
fn parse_section(section: &str) -> Result<Option<(String, BTreeMap<u32, String>)>> {
    let mut lines = section.lines();

    let Some(marker) = lines.by_ref().find_map(|l| l.strip_prefix("+++ ")) else {
        debug!("skipping file section without a new-file marker");
        return Ok(None);
    };
    let Some(path) = new_file_path(marker) else {
        return Ok(None);
    };

    let mut added = BTreeMap::new();
    // Lines before the first hunk header carry no position.
    let mut line_number: Option<u32> = None;

    for line in lines {
        if line.starts_with("@@") {
            let start = parse_hunk_header(line)
                .ok_or_else(|| CovgateError::InvalidHunkHeader(line.to_string()))?;
            line_number = Some(start);
            continue;
        }
        let Some(current) = line_number.as_mut() else {
            continue;
        };
        if let Some(text) = line.strip_prefix('+') {
            added.insert(*current, text.to_string());
            *current = current.saturating_add(1);
        } else if line.starts_with('-') || line.starts_with('\\') {
            // Deleted line, or "\ No newline at end of file"
        } else {
            // Context line
            *current = current.saturating_add(1);
        }
    }

    Ok(Some((path, added)))
}

/// Resolve the path from the text following `+++ `.
fn new_file_path(rest: &str) -> Option<String> {
    // `diff -u` appends a tab and a timestamp.
    let rest = rest.split('\t').next().unwrap_or(rest).trim_end();
    if rest == "/dev/null" {
        return None; // File was deleted
    }
    // git quotes paths containing unusual characters.
    let rest = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(rest);
    // Strip common VCS prefixes: "b/" (default git), "a/" (some tools).
    // Also handles --no-prefix diffs where no prefix is present.
    let path = rest
        .strip_prefix("b/")
        .or_else(|| rest.strip_prefix("a/"))
        .unwrap_or(rest);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Parse "new" start line from a hunk header like "@@ -10,5 +20,8 @@"
fn parse_hunk_header(line: &str) -> Option<u32> {
    let after_at = line.strip_prefix("@@")?;
    let mut parts = after_at.split_whitespace();
    // parts[0] = "-old_start,old_count"
    // parts[1] = "+new_start,new_count" or "+new_start"
    parts.next()?;
    let new_part = parts.next()?.strip_prefix('+')?;
    let start_str = new_part.split(',').next()?;
    start_str.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(additions: &AdditionMap, path: &str) -> Vec<u32> {
        additions.get(path).unwrap().keys().copied().collect()
    }

    #[test]
    fn test_parse_hunk_header() {
        assert_eq!(parse_hunk_header("@@ -10,5 +20,8 @@"), Some(20));
        assert_eq!(parse_hunk_header("@@ -0,0 +1,3 @@"), Some(1));
        assert_eq!(parse_hunk_header("@@ -5 +5 @@"), Some(5));
        assert_eq!(parse_hunk_header("@@ -1,2 +3,4 @@ def f(a+b):"), Some(3));
        assert_eq!(parse_hunk_header("@@ -1,2 +x,3 @@"), None);
        assert_eq!(parse_hunk_header("@@"), None);
    }

    #[test]
    fn test_new_file_path() {
        assert_eq!(new_file_path("b/src/a.py").as_deref(), Some("src/a.py"));
        assert_eq!(new_file_path("src/a.py").as_deref(), Some("src/a.py"));
        assert_eq!(
            new_file_path("b/a.py\t2024-01-01 00:00:00.000000000 +0000").as_deref(),
            Some("a.py")
        );
        assert_eq!(new_file_path("\"b/my file.py\"").as_deref(), Some("my file.py"));
        assert_eq!(new_file_path("/dev/null"), None);
    }

    #[test]
    fn test_extract_modified_file() {
        let diff = include_str!("../tests/fixtures/diffs/modified_file.diff");
        let result = extract_additions(diff).unwrap();
        assert_eq!(result.len(), 1);
        let lines = result.get("src/app/service.py").unwrap();
        assert_eq!(lines.keys().copied().collect::<Vec<_>>(), vec![11, 12, 14]);
        assert_eq!(lines[&11], "        total = 2");
        assert_eq!(lines[&14], "        print(result)");
    }

    #[test]
    fn test_extract_new_file() {
        let diff = include_str!("../tests/fixtures/diffs/new_file.diff");
        let result = extract_additions(diff).unwrap();
        assert_eq!(lines_of(&result, "pkg/new_module.py"), vec![1, 2, 3]);
    }

    #[test]
    fn test_extract_deleted_file() {
        let diff = include_str!("../tests/fixtures/diffs/deleted_file.diff");
        let result = extract_additions(diff).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_extract_no_newline_at_eof() {
        let diff = include_str!("../tests/fixtures/diffs/no_newline_at_eof.diff");
        let result = extract_additions(diff).unwrap();
        assert_eq!(result.len(), 1);
        // The "\ No newline at end of file" marker must not shift line numbers.
        assert_eq!(lines_of(&result, "pkg/lib.py"), vec![2, 3]);
    }

    #[test]
    fn test_each_hunk_header_resets_counter() {
        let diff = include_str!("../tests/fixtures/diffs/multi_hunk.diff");
        let result = extract_additions(diff).unwrap();
        assert_eq!(lines_of(&result, "pkg/util.py"), vec![2, 43, 44]);
    }

    #[test]
    fn test_extract_multiple_files_keeps_directories() {
        let diff = include_str!("../tests/fixtures/diffs/multiple_files.diff");
        let result = extract_additions(diff).unwrap();
        // Binary change and pure rename contribute nothing.
        assert_eq!(
            result.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["README.md", "pkg/a.py", "pkg/sub/a.py"]
        );
        assert_eq!(lines_of(&result, "pkg/a.py"), vec![2]);
        assert_eq!(lines_of(&result, "pkg/sub/a.py"), vec![6]);
    }

    #[test]
    fn test_invalid_hunk_header_is_fatal() {
        let diff = include_str!("../tests/fixtures/diffs/bad_hunk_header.diff");
        let err = extract_additions(diff).unwrap_err();
        match err {
            CovgateError::InvalidHunkHeader(line) => assert_eq!(line, "@@ -1,2 +x,3 @@"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_diff() {
        assert!(extract_additions("").unwrap().is_empty());
        assert!(extract_additions("commit abc\nAuthor: someone\n").unwrap().is_empty());
    }

    #[test]
    fn test_plus_plus_plus_inside_hunk_is_an_addition() {
        let diff = "\
diff --git a/counter.py b/counter.py
--- a/counter.py
+++ b/counter.py
@@ -1,1 +1,2 @@
 x = 1
+++ not a header
";
        let result = extract_additions(diff).unwrap();
        assert_eq!(result["counter.py"][&2], "++ not a header");
    }

    #[test]
    fn test_line_numbers_start_at_one_and_increase() {
        let diff = include_str!("../tests/fixtures/diffs/multiple_files.diff");
        let result = extract_additions(diff).unwrap();
        for lines in result.values() {
            let numbers: Vec<u32> = lines.keys().copied().collect();
            assert!(numbers.iter().all(|n| *n >= 1));
            assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_apply_path_prefix() {
        let diff = include_str!("../tests/fixtures/diffs/new_file.diff");
        let result = apply_path_prefix(extract_additions(diff).unwrap(), "backend/");
        assert!(result.contains_key("backend/pkg/new_module.py"));

        let unchanged = apply_path_prefix(result.clone(), "");
        assert_eq!(unchanged, result);
    }
}
