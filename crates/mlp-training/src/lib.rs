//! Mini ML Platform training
//!
//! Batch training job primitives:
//! - Loading the model schema (`ModelMetadata`) and the CSV dataset
//! - Encoding the label column in schema class order (`encode_labels`)
//! - Fitting a classifier behind the `Trainer` seam and serializing it
//! - Publishing `model.bin` + `schema.json` through an `ObjectStore`
//! - Driving all of the above as one linear pipeline (`TrainingPipeline`)

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod forest;
pub mod layout;
pub mod pipeline;
pub mod progress;
pub mod publisher;
pub mod schema;
pub mod serializer;
pub mod storage;
pub mod trainer;

pub use artifacts::{ArtifactKind, PublishReceipt, PublishedArtifact};
pub use config::{OrphanPolicy, PublishConfig};
pub use dataset::{read_csv_dataset, Column, ColumnData, CsvOptions, Dataset, DatasetId};
pub use encoder::{encode_labels, ClassIndexMap};
pub use error::{InputKind, TrainingError, TrainingResult};
pub use forest::{ForestParams, RandomForest};
pub use layout::ArtifactLayout;
pub use pipeline::{JobInputs, PipelineReport, TrainingPipeline};
pub use progress::{PipelineStage, StageSink, TracingStageSink};
pub use publisher::ArtifactPublisher;
pub use schema::{load_schema, LabelSpec, ModelMetadata};
pub use serializer::{deserialize_model, serialize_model};
pub use storage::{InMemoryObjectStore, ObjectStore, S3ObjectStore};
pub use trainer::{Classifier, RandomForestTrainer, TrainedModel, Trainer};
