use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Linear pipeline states. `Failed` is reachable from any other state and
/// is terminal, as is `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    SchemaLoaded,
    DatasetParsed,
    LabelEncoded,
    Trained,
    Serialized,
    ModelPublished,
    SchemaPublished,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::SchemaLoaded => "schema loaded",
            Self::DatasetParsed => "dataset parsed",
            Self::LabelEncoded => "label encoded",
            Self::Trained => "trained",
            Self::Serialized => "serialized",
            Self::ModelPublished => "model published",
            Self::SchemaPublished => "schema published",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub trait StageSink {
    fn on_stage(&self, model_id: &str, stage: PipelineStage);
}

#[derive(Debug, Default)]
pub struct TracingStageSink;

impl StageSink for TracingStageSink {
    fn on_stage(&self, model_id: &str, stage: PipelineStage) {
        match stage {
            PipelineStage::Failed => error!("[train:{model_id}] {stage}"),
            _ => info!("[train:{model_id}] {stage}"),
        }
    }
}
