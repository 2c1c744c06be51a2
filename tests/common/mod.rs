#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Read a diff fixture from `tests/fixtures/diffs`.
pub fn diff_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/diffs")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

/// Path to a report fixture in `tests/fixtures/reports`.
pub fn report_fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/reports")
        .join(name)
}

/// Write a diff and a coverage.py report into a fresh temporary directory,
/// returning the dir handle and both paths. The caller must hold onto
/// `TempDir` to keep the files alive.
pub fn write_inputs(diff: &str, report: &str) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let diff_path = dir.path().join("changes.diff");
    let report_path = dir.path().join("coverage.json");
    std::fs::write(&diff_path, diff).unwrap();
    std::fs::write(&report_path, report).unwrap();
    (dir, diff_path, report_path)
}

/// Run the compiled binary with `args`, feeding `stdin` when given.
pub fn run_covgate(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_covgate"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            // The binary may exit before reading stdin.
            let _ = pipe.write_all(input.as_bytes());
        }
    }
    child.wait_with_output().unwrap()
}
