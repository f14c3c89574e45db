use crate::error::{TrainingError, TrainingResult};

pub const MODEL_OBJECT: &str = "model.bin";
pub const SCHEMA_OBJECT: &str = "schema.json";

/// Object-store key layout for one model's artifact pair.
///
/// Both artifacts live under `<model_id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    model_id: String,
}

impl ArtifactLayout {
    pub fn new(model_id: &str) -> TrainingResult<Self> {
        validate_model_id(model_id)?;
        Ok(Self { model_id: model_id.to_string() })
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    #[must_use]
    pub fn model_key(&self) -> String {
        format!("{}/{MODEL_OBJECT}", self.model_id)
    }

    #[must_use]
    pub fn schema_key(&self) -> String {
        format!("{}/{SCHEMA_OBJECT}", self.model_id)
    }
}

pub fn validate_model_id(model_id: &str) -> TrainingResult<()> {
    let invalid = |reason: &str| TrainingError::InvalidModelId { id: model_id.to_string(), reason: reason.to_string() };

    if model_id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if model_id.starts_with('/') || model_id.ends_with('/') {
        return Err(invalid("must not start or end with '/'"));
    }
    if model_id.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    if model_id.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(invalid("must not contain empty, '.' or '..' segments"));
    }
    Ok(())
}
