use crate::dataset::{ColumnData, Dataset};
use crate::error::{TrainingError, TrainingResult};
use crate::schema::ModelMetadata;
use std::collections::HashMap;
use tracing::info;

/// Class name → index mapping built from the declared class vocabulary.
///
/// Index is the position in `label.classes`; iteration follows the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassIndexMap {
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl ClassIndexMap {
    pub fn from_classes(classes: &[String]) -> TrainingResult<Self> {
        let mut index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            let i = u32::try_from(i)
                .map_err(|_| TrainingError::SchemaMalformed("too many classes".to_string()))?;
            if index.insert(class.clone(), i).is_some() {
                return Err(TrainingError::SchemaMalformed(format!(
                    "label.classes contains duplicate value '{class}'"
                )));
            }
        }
        Ok(Self { classes: classes.to_vec(), index })
    }

    #[must_use]
    pub fn get(&self, class: &str) -> Option<u32> {
        self.index.get(class).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `(class, index)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.classes.iter().zip(0u32..).map(|(c, i)| (c.as_str(), i))
    }
}

impl std::fmt::Display for ClassIndexMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (n, (class, idx)) in self.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{class}={idx}")?;
        }
        f.write_str("}")
    }
}

/// Rewrite the label column from class names to class indices.
///
/// The whole dataset is rejected on the first value missing from the
/// vocabulary. Only text label columns are accepted, so encoding an
/// already-encoded dataset fails with [`TrainingError::LabelNotText`].
pub fn encode_labels(mut dataset: Dataset, metadata: &ModelMetadata) -> TrainingResult<(Dataset, ClassIndexMap)> {
    let mapping = ClassIndexMap::from_classes(metadata.classes())?;
    let label = metadata.label_column();

    let column = dataset.column(label).ok_or_else(|| {
        TrainingError::Dataset(format!(
            "label column '{label}' not found in dataset (columns: {})",
            dataset.names().join(", ")
        ))
    })?;

    let ColumnData::Text(values) = &column.data else {
        return Err(TrainingError::LabelNotText(label.to_string()));
    };

    let indices = values
        .iter()
        .map(|value| mapping.get(value).ok_or_else(|| TrainingError::UnknownLabelValue(value.clone())))
        .collect::<TrainingResult<Vec<u32>>>()?;

    dataset.replace_column(label, ColumnData::Encoded(indices))?;
    info!("Label mapping applied (metadata order): {mapping}");

    Ok((dataset, mapping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::schema::LabelSpec;

    fn metadata(classes: &[&str]) -> ModelMetadata {
        ModelMetadata {
            label: LabelSpec {
                name: "species".to_string(),
                classes: classes.iter().map(|c| (*c).to_string()).collect(),
            },
        }
    }

    fn dataset(labels: &[&str]) -> Dataset {
        Dataset::new(vec![
            Column::new("weight", ColumnData::Numeric((0..labels.len()).map(|i| i as f64).collect())),
            Column::new("species", ColumnData::Text(labels.iter().map(|l| (*l).to_string()).collect())),
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_follows_metadata_order() {
        let (encoded, mapping) =
            encode_labels(dataset(&["dog", "cat", "dog", "bird"]), &metadata(&["cat", "dog", "bird"])).unwrap();

        assert_eq!(encoded.column("species").unwrap().data, ColumnData::Encoded(vec![1, 0, 1, 2]));
        assert_eq!(mapping.to_string(), "{cat=0, dog=1, bird=2}");
    }

    #[test]
    fn test_encode_maps_every_class_to_its_position() {
        let classes = ["c0", "c1", "c2", "c3", "c4"];
        let rows = ["c4", "c2", "c0", "c3", "c1", "c4", "c0"];
        let (encoded, _) = encode_labels(dataset(&rows), &metadata(&classes)).unwrap();

        let ColumnData::Encoded(indices) = &encoded.column("species").unwrap().data else {
            panic!("label column should be encoded");
        };
        for (row, idx) in rows.iter().zip(indices) {
            assert_eq!(classes[*idx as usize], *row);
        }
    }

    #[test]
    fn test_encode_does_not_depend_on_observed_classes() {
        // "cat" never appears; "bird" keeps index 2.
        let (encoded, _) = encode_labels(dataset(&["bird", "dog"]), &metadata(&["cat", "dog", "bird"])).unwrap();
        assert_eq!(encoded.column("species").unwrap().data, ColumnData::Encoded(vec![2, 1]));
    }

    #[test]
    fn test_encode_preserves_other_columns() {
        let original = dataset(&["dog", "cat"]);
        let (encoded, _) = encode_labels(original.clone(), &metadata(&["cat", "dog"])).unwrap();

        assert_eq!(encoded.names(), original.names());
        assert_eq!(encoded.column("weight"), original.column("weight"));
    }

    #[test]
    fn test_encode_rejects_unknown_label() {
        let err = encode_labels(dataset(&["dog", "fish", "cat"]), &metadata(&["cat", "dog", "bird"])).unwrap_err();
        match err {
            TrainingError::UnknownLabelValue(value) => assert_eq!(value, "fish"),
            other => panic!("expected UnknownLabelValue, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_does_not_trim_labels() {
        let err = encode_labels(dataset(&["dog", " cat"]), &metadata(&["cat", "dog"])).unwrap_err();
        assert!(matches!(err, TrainingError::UnknownLabelValue(ref v) if v == " cat"));

        let (encoded, _) = encode_labels(dataset(&["cat ", "dog"]), &metadata(&["cat ", "dog"])).unwrap();
        assert_eq!(encoded.column("species").unwrap().data, ColumnData::Encoded(vec![0, 1]));
    }

    #[test]
    fn test_encode_rejects_already_encoded_dataset() {
        let meta = metadata(&["cat", "dog"]);
        let (encoded, _) = encode_labels(dataset(&["dog", "cat"]), &meta).unwrap();

        let err = encode_labels(encoded, &meta).unwrap_err();
        assert!(matches!(err, TrainingError::LabelNotText(ref name) if name == "species"));
    }

    #[test]
    fn test_encode_missing_label_column() {
        let mut meta = metadata(&["cat"]);
        meta.label.name = "kind".to_string();
        let err = encode_labels(dataset(&["cat"]), &meta).unwrap_err();
        assert!(err.to_string().contains("'kind' not found"));
    }
}
