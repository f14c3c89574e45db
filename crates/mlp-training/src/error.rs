use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

/// Which job input a missing-file error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Dataset,
    Schema,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dataset => f.write_str("dataset"),
            Self::Schema => f.write_str("schema"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("{kind} file not found: {}", path.display())]
    InputNotFound { kind: InputKind, path: PathBuf },

    #[error("malformed schema: {0}")]
    SchemaMalformed(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("label column '{0}' is not a text column (already encoded?)")]
    LabelNotText(String),

    #[error("unknown label '{0}' not in metadata classes")]
    UnknownLabelValue(String),

    #[error("training failed: {0}")]
    TrainingFailed(String),

    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    #[error("invalid model id '{id}': {reason}")]
    InvalidModelId { id: String, reason: String },

    #[error("object store unavailable: {0}")]
    StorageUnavailable(String),

    #[error("upload of '{key}' failed: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
