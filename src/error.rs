use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HofError>;

#[derive(Debug, Error)]
pub enum HofError {
    #[error("{0}")]
    String(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(
        "No measurement chunk files found in '{}' (expected: {})",
        dir.display(),
        patterns.join(", ")
    )]
    NoMeasurementFiles { dir: PathBuf, patterns: Vec<String> },

    #[error("Unsupported metadata file format: '{}'", .0.display())]
    UnsupportedMetadataFormat(PathBuf),
}

impl From<String> for HofError {
    fn from(err: String) -> Self {
        HofError::String(err)
    }
}
