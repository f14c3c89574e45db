use crate::error::{InputKind, TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Description of the target label: which column holds it and the ordered
/// class vocabulary. Position in `classes` is the class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub name: String,
    pub classes: Vec<String>,
}

/// Model schema document (`schema.json`).
///
/// Unknown top-level fields are ignored so schema documents can carry extra
/// information for inference consumers; the document is always published
/// verbatim, never re-serialized from this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub label: LabelSpec,
}

impl ModelMetadata {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.label.name.trim().is_empty() {
            return Err(TrainingError::SchemaMalformed("label.name must not be empty".to_string()));
        }
        if self.label.classes.is_empty() {
            return Err(TrainingError::SchemaMalformed("label.classes must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for class in &self.label.classes {
            if !seen.insert(class.as_str()) {
                return Err(TrainingError::SchemaMalformed(format!(
                    "label.classes contains duplicate value '{class}'"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn label_column(&self) -> &str {
        &self.label.name
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.label.classes
    }
}

/// Parse and validate a schema document from raw bytes.
pub fn parse_schema(bytes: &[u8]) -> TrainingResult<ModelMetadata> {
    let metadata: ModelMetadata = serde_json::from_slice(bytes)
        .map_err(|e| TrainingError::SchemaMalformed(e.to_string()))?;
    metadata.validate()?;
    Ok(metadata)
}

/// Load the schema document at `path`.
pub fn load_schema(path: &Path) -> TrainingResult<ModelMetadata> {
    if !path.exists() {
        return Err(TrainingError::InputNotFound { kind: InputKind::Schema, path: path.to_path_buf() });
    }
    let bytes = std::fs::read(path)?;
    parse_schema(&bytes)
}
