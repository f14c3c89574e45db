use crate::artifacts::{ArtifactKind, PublishReceipt, PublishedArtifact};
use crate::config::OrphanPolicy;
use crate::error::{TrainingError, TrainingResult};
use crate::layout::ArtifactLayout;
use crate::progress::{PipelineStage, StageSink};
use crate::storage::ObjectStore;
use std::path::Path;
use tracing::{error, info, warn};

/// Uploads the artifact pair: `model.bin` first, then `schema.json`.
///
/// Each upload is one object write; nothing spans both. When the schema
/// step fails after the model landed, the configured [`OrphanPolicy`]
/// decides whether the model object is deleted again.
pub struct ArtifactPublisher<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
    orphan_policy: OrphanPolicy,
}

impl<'a> ArtifactPublisher<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: impl Into<String>, orphan_policy: OrphanPolicy) -> Self {
        Self { store, bucket: bucket.into(), orphan_policy }
    }

    pub fn publish(
        &self,
        model_id: &str,
        model_bytes: Vec<u8>,
        schema_path: &Path,
        stages: &dyn StageSink,
    ) -> TrainingResult<PublishReceipt> {
        let layout = ArtifactLayout::new(model_id)?;
        info!("Uploading artifacts to bucket: {}/{}", self.bucket, layout.model_id());

        let model = self.upload(ArtifactKind::Model, layout.model_key(), model_bytes)?;
        stages.on_stage(model_id, PipelineStage::ModelPublished);

        // The schema is re-read so the published copy is the file byte-for-byte.
        let schema = std::fs::read(schema_path)
            .map_err(TrainingError::from)
            .and_then(|bytes| self.upload(ArtifactKind::Schema, layout.schema_key(), bytes));

        let schema = match schema {
            Ok(artifact) => artifact,
            Err(err) => {
                self.handle_orphan(&model.key);
                return Err(err);
            }
        };
        stages.on_stage(model_id, PipelineStage::SchemaPublished);

        Ok(PublishReceipt {
            bucket: self.bucket.clone(),
            model_id: layout.model_id().to_string(),
            published_at: chrono::Utc::now(),
            artifacts: vec![model, schema],
        })
    }

    fn upload(&self, kind: ArtifactKind, key: String, bytes: Vec<u8>) -> TrainingResult<PublishedArtifact> {
        let artifact = PublishedArtifact::new(kind, key, &bytes);
        self.store.put(&self.bucket, &artifact.key, bytes, kind.content_type())?;
        info!("Uploaded {} ({} bytes, sha256 {})", artifact.key, artifact.size, artifact.sha256);
        Ok(artifact)
    }

    fn handle_orphan(&self, model_key: &str) {
        match self.orphan_policy {
            OrphanPolicy::Leave => {
                warn!("Schema upload failed; leaving orphaned {}/{model_key} for reconciliation", self.bucket);
            }
            OrphanPolicy::Rollback => match self.store.delete(&self.bucket, model_key) {
                Ok(()) => warn!("Schema upload failed; removed {}/{model_key}", self.bucket),
                Err(e) => error!("Schema upload failed and removing {}/{model_key} also failed: {e}", self.bucket),
            },
        }
    }
}
