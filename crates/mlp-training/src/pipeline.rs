use crate::artifacts::PublishReceipt;
use crate::dataset::{compute_dataset_id, read_csv_dataset, CsvOptions, DatasetId};
use crate::encoder::encode_labels;
use crate::error::{InputKind, TrainingError, TrainingResult};
use crate::layout::validate_model_id;
use crate::progress::{PipelineStage, StageSink, TracingStageSink};
use crate::publisher::ArtifactPublisher;
use crate::schema::load_schema;
use crate::serializer::serialize_model;
use crate::trainer::Trainer;
use std::cell::RefCell;
use std::path::PathBuf;
use tracing::info;

/// The three invocation arguments of a training job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInputs {
    pub dataset_path: PathBuf,
    pub schema_path: PathBuf,
    pub model_id: String,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub model_id: String,
    pub dataset_id: DatasetId,
    pub rows: usize,
    pub columns: Vec<String>,
    /// `(class, index)` in schema order.
    pub class_mapping: Vec<(String, u32)>,
    pub stages: Vec<PipelineStage>,
    pub receipt: PublishReceipt,
}

/// Records every stage and forwards it to the caller's sink.
struct StageTrail<'a> {
    inner: &'a dyn StageSink,
    stages: RefCell<Vec<PipelineStage>>,
}

impl<'a> StageTrail<'a> {
    fn new(inner: &'a dyn StageSink) -> Self {
        Self { inner, stages: RefCell::new(Vec::new()) }
    }

    fn into_stages(self) -> Vec<PipelineStage> {
        self.stages.into_inner()
    }
}

impl StageSink for StageTrail<'_> {
    fn on_stage(&self, model_id: &str, stage: PipelineStage) {
        self.stages.borrow_mut().push(stage);
        self.inner.on_stage(model_id, stage);
    }
}

/// Single-pass training job: schema → dataset → encode → train → serialize → publish.
///
/// Stops at the first error; nothing is retried.
pub struct TrainingPipeline<'a> {
    trainer: &'a dyn Trainer,
    publisher: ArtifactPublisher<'a>,
    stages: &'a dyn StageSink,
}

impl<'a> TrainingPipeline<'a> {
    pub fn new(trainer: &'a dyn Trainer, publisher: ArtifactPublisher<'a>) -> Self {
        Self { trainer, publisher, stages: &TracingStageSink }
    }

    #[must_use]
    pub fn with_stage_sink(mut self, stages: &'a dyn StageSink) -> Self {
        self.stages = stages;
        self
    }

    pub fn run(&self, inputs: &JobInputs) -> TrainingResult<PipelineReport> {
        let trail = StageTrail::new(self.stages);
        trail.on_stage(&inputs.model_id, PipelineStage::Start);

        match self.run_stages(inputs, &trail) {
            Ok(mut report) => {
                trail.on_stage(&inputs.model_id, PipelineStage::Done);
                report.stages = trail.into_stages();
                Ok(report)
            }
            Err(err) => {
                trail.on_stage(&inputs.model_id, PipelineStage::Failed);
                Err(err)
            }
        }
    }

    fn run_stages(&self, inputs: &JobInputs, trail: &StageTrail<'_>) -> TrainingResult<PipelineReport> {
        let model_id = inputs.model_id.as_str();
        validate_model_id(model_id)?;

        if !inputs.dataset_path.exists() {
            return Err(TrainingError::InputNotFound { kind: InputKind::Dataset, path: inputs.dataset_path.clone() });
        }
        if !inputs.schema_path.exists() {
            return Err(TrainingError::InputNotFound { kind: InputKind::Schema, path: inputs.schema_path.clone() });
        }

        let metadata = load_schema(&inputs.schema_path)?;
        trail.on_stage(model_id, PipelineStage::SchemaLoaded);

        info!("Reading CSV from: {}", inputs.dataset_path.display());
        let options = CsvOptions { text_columns: vec![metadata.label_column().to_string()] };
        let dataset = read_csv_dataset(&inputs.dataset_path, &options)?;
        let dataset_id = compute_dataset_id(&dataset);
        let rows = dataset.n_rows();
        let columns: Vec<String> = dataset.names().into_iter().map(str::to_string).collect();
        info!("Columns found: [{}] ({rows} rows, dataset {dataset_id})", columns.join(", "));
        trail.on_stage(model_id, PipelineStage::DatasetParsed);

        let (encoded, mapping) = encode_labels(dataset, &metadata)?;
        trail.on_stage(model_id, PipelineStage::LabelEncoded);

        info!("Training {} model...", self.trainer.id());
        let model = self.trainer.train(encoded, metadata.label_column(), mapping.len())?;
        trail.on_stage(model_id, PipelineStage::Trained);

        let model_bytes = serialize_model(&model)?;
        drop(model);
        trail.on_stage(model_id, PipelineStage::Serialized);

        let receipt = self.publisher.publish(model_id, model_bytes, &inputs.schema_path, trail)?;

        Ok(PipelineReport {
            model_id: model_id.to_string(),
            dataset_id,
            rows,
            columns,
            class_mapping: mapping.iter().map(|(c, i)| (c.to_string(), i)).collect(),
            stages: Vec::new(),
            receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrphanPolicy;
    use crate::forest::ForestParams;
    use crate::storage::InMemoryObjectStore;
    use crate::trainer::RandomForestTrainer;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"{"label":{"name":"species","classes":["cat","dog","bird"]}}"#;
    const CSV: &str = "weight,wings,species\n4.0,0,dog\n3.5,0,cat\n20.0,0,dog\n0.3,2,bird\n4.2,0,cat\n0.4,2,bird\n";

    fn inputs(temp: &TempDir, csv: &str) -> JobInputs {
        let dataset_path = temp.path().join("data.csv");
        let schema_path = temp.path().join("schema.json");
        std::fs::write(&dataset_path, csv).unwrap();
        std::fs::write(&schema_path, SCHEMA).unwrap();
        JobInputs { dataset_path, schema_path, model_id: "species-v1".to_string() }
    }

    fn trainer() -> RandomForestTrainer {
        RandomForestTrainer::new(ForestParams { n_trees: 5, ..ForestParams::default() })
    }

    #[test]
    fn test_run_walks_every_stage() {
        let temp = TempDir::new().unwrap();
        let store = InMemoryObjectStore::new();
        let trainer = trainer();
        let pipeline = TrainingPipeline::new(&trainer, ArtifactPublisher::new(&store, "model", OrphanPolicy::Rollback));

        let report = pipeline.run(&inputs(&temp, CSV)).unwrap();

        assert_eq!(
            report.stages,
            [
                PipelineStage::Start,
                PipelineStage::SchemaLoaded,
                PipelineStage::DatasetParsed,
                PipelineStage::LabelEncoded,
                PipelineStage::Trained,
                PipelineStage::Serialized,
                PipelineStage::ModelPublished,
                PipelineStage::SchemaPublished,
                PipelineStage::Done,
            ]
        );
        assert_eq!(report.rows, 6);
        assert_eq!(
            report.class_mapping,
            [("cat".to_string(), 0), ("dog".to_string(), 1), ("bird".to_string(), 2)]
        );
        assert_eq!(store.keys("model"), ["species-v1/model.bin", "species-v1/schema.json"]);
    }

    #[test]
    fn test_unknown_label_publishes_nothing() {
        let temp = TempDir::new().unwrap();
        let store = InMemoryObjectStore::new();
        let trainer = trainer();
        let pipeline = TrainingPipeline::new(&trainer, ArtifactPublisher::new(&store, "model", OrphanPolicy::Rollback));

        let csv = format!("{CSV}1.0,0,fish\n");
        let err = pipeline.run(&inputs(&temp, &csv)).unwrap_err();

        assert!(matches!(err, TrainingError::UnknownLabelValue(ref v) if v == "fish"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_dataset_fails_before_training() {
        let temp = TempDir::new().unwrap();
        let store = InMemoryObjectStore::new();
        let trainer = trainer();
        let pipeline = TrainingPipeline::new(&trainer, ArtifactPublisher::new(&store, "model", OrphanPolicy::Rollback));

        let mut job = inputs(&temp, CSV);
        job.dataset_path = temp.path().join("missing.csv");
        let err = pipeline.run(&job).unwrap_err();

        assert!(matches!(err, TrainingError::InputNotFound { kind: InputKind::Dataset, .. }));
        assert!(store.is_empty());
    }
}
