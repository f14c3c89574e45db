use crate::dataset::{ColumnData, Dataset};
use crate::error::{TrainingError, TrainingResult};
use crate::forest::{ForestParams, RandomForest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Fitted classifier, tagged by algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "params", rename_all = "snake_case")]
pub enum Classifier {
    RandomForest(RandomForest),
}

/// Trained model handle: the classifier plus what is needed to apply it
/// without the training dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub label: String,
    pub features: Vec<String>,
    pub n_classes: usize,
    pub classifier: Classifier,
}

impl TrainedModel {
    /// Predict the class index for one row of features, ordered as `features`.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> u32 {
        match &self.classifier {
            Classifier::RandomForest(forest) => forest.predict(row),
        }
    }
}

/// Fits a classifier predicting `label_column` from every other column.
pub trait Trainer {
    fn id(&self) -> &'static str;

    fn train(&self, dataset: Dataset, label_column: &str, n_classes: usize) -> TrainingResult<TrainedModel>;
}

#[derive(Debug, Clone, Default)]
pub struct RandomForestTrainer {
    params: ForestParams,
}

impl RandomForestTrainer {
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }
}

struct TrainingMatrix {
    features: Vec<String>,
    x: Vec<Vec<f64>>,
    y: Vec<u32>,
}

fn to_matrix(dataset: &Dataset, label_column: &str) -> TrainingResult<TrainingMatrix> {
    let label = dataset
        .column(label_column)
        .ok_or_else(|| TrainingError::TrainingFailed(format!("label column '{label_column}' not found")))?;
    let ColumnData::Encoded(y) = &label.data else {
        return Err(TrainingError::TrainingFailed(format!(
            "label column '{label_column}' must be encoded, found {}",
            label.data.kind()
        )));
    };

    let rows = dataset.n_rows();
    let mut features = Vec::new();
    let mut x = vec![Vec::with_capacity(dataset.n_columns() - 1); rows];

    for column in dataset.columns().iter().filter(|c| c.name != label_column) {
        match &column.data {
            ColumnData::Numeric(values) => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(TrainingError::TrainingFailed(format!(
                        "feature column '{}' contains non-finite values",
                        column.name
                    )));
                }
                for (row, v) in x.iter_mut().zip(values) {
                    row.push(*v);
                }
            }
            ColumnData::Encoded(values) => {
                for (row, v) in x.iter_mut().zip(values) {
                    row.push(f64::from(*v));
                }
            }
            ColumnData::Text(_) => {
                return Err(TrainingError::TrainingFailed(format!(
                    "feature column '{}' is not numeric",
                    column.name
                )));
            }
        }
        features.push(column.name.clone());
    }

    Ok(TrainingMatrix { features, x, y: y.clone() })
}

impl Trainer for RandomForestTrainer {
    fn id(&self) -> &'static str {
        "random-forest"
    }

    fn train(&self, dataset: Dataset, label_column: &str, n_classes: usize) -> TrainingResult<TrainedModel> {
        let matrix = to_matrix(&dataset, label_column)?;
        drop(dataset);

        if matrix.x.len() < 2 {
            return Err(TrainingError::TrainingFailed(format!("insufficient rows: {}", matrix.x.len())));
        }
        let present: BTreeSet<u32> = matrix.y.iter().copied().collect();
        if present.len() < 2 {
            return Err(TrainingError::TrainingFailed(
                "degenerate data: fewer than 2 distinct classes present".to_string(),
            ));
        }

        debug!(
            "Fitting {} trees on {} rows x {} features",
            self.params.n_trees,
            matrix.x.len(),
            matrix.features.len()
        );
        let forest = RandomForest::fit(&matrix.x, &matrix.y, n_classes, &self.params)?;
        info!("Random forest fitted: {} trees, {} classes", forest.n_trees(), n_classes);

        Ok(TrainedModel {
            label: label_column.to_string(),
            features: matrix.features,
            n_classes,
            classifier: Classifier::RandomForest(forest),
        })
    }
}
