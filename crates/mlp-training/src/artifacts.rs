use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const CONTENT_TYPE_MODEL: &str = "application/octet-stream";
pub const CONTENT_TYPE_SCHEMA: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Schema,
}

impl ArtifactKind {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Model => CONTENT_TYPE_MODEL,
            Self::Schema => CONTENT_TYPE_SCHEMA,
        }
    }
}

/// One object written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub kind: ArtifactKind,
    pub key: String,
    pub size: usize,
    pub sha256: String,
}

impl PublishedArtifact {
    #[must_use]
    pub fn new(kind: ArtifactKind, key: String, bytes: &[u8]) -> Self {
        Self { kind, key, size: bytes.len(), sha256: sha256_bytes(bytes) }
    }
}

/// Record of a completed artifact-pair publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub bucket: String,
    pub model_id: String,
    pub published_at: DateTime<Utc>,
    pub artifacts: Vec<PublishedArtifact>,
}

impl PublishReceipt {
    #[must_use]
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&PublishedArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

#[must_use]
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_bytes_known_value() {
        assert_eq!(
            sha256_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_artifact_content_types() {
        assert_eq!(ArtifactKind::Model.content_type(), "application/octet-stream");
        assert_eq!(ArtifactKind::Schema.content_type(), "application/json");
    }
}
