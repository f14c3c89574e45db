use crate::error::{TrainingError, TrainingResult};
use crate::trainer::TrainedModel;
use serde::{Deserialize, Serialize};

/// Format tag written at the head of every serialized model.
pub const MODEL_FORMAT: &str = "mlp-model";
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    model: TrainedModel,
}

/// Serialize a trained model into a self-contained byte stream.
pub fn serialize_model(model: &TrainedModel) -> TrainingResult<Vec<u8>> {
    let envelope = EnvelopeRef { format: MODEL_FORMAT, version: MODEL_FORMAT_VERSION, model };
    serde_json::to_vec(&envelope).map_err(|e| TrainingError::SerializationFailed(e.to_string()))
}

/// Counterpart of [`serialize_model`] for consumers loading `model.bin`.
pub fn deserialize_model(bytes: &[u8]) -> TrainingResult<TrainedModel> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| TrainingError::SerializationFailed(e.to_string()))?;

    if envelope.format != MODEL_FORMAT {
        return Err(TrainingError::SerializationFailed(format!("unknown model format '{}'", envelope.format)));
    }
    if envelope.version != MODEL_FORMAT_VERSION {
        return Err(TrainingError::SerializationFailed(format!(
            "unsupported model format version {} (expected {MODEL_FORMAT_VERSION})",
            envelope.version
        )));
    }
    Ok(envelope.model)
}
