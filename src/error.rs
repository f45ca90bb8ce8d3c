use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchStoreError {
    #[error("run has an empty commit id")]
    MissingCommitId,

    #[error("malformed measurement at index {index} ({name:?}): {reason}")]
    MalformedMeasurement {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("commit {0:?} already present in history")]
    DuplicateCommit(String),

    #[error("corrupt store file {path}: {reason}")]
    CorruptStore { path: String, reason: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BenchStoreError>;
