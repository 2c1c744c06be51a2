use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovgateError {
    #[error("file {} does not exist", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} must be in valid {format} format: {reason}", path.display())]
    MalformedReport {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("Invalid diff line format: {0}")]
    InvalidHunkHeader(String),

    #[error("Unknown coverage format: {0}")]
    UnknownFormat(String),

    #[error("git diff failed: {0}")]
    Git(String),
}

impl CovgateError {
    /// Map an I/O failure on `path` to `InputNotFound` when the file is
    /// missing, or a generic read error otherwise.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CovgateError::InputNotFound(path)
        } else {
            CovgateError::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, CovgateError>;
