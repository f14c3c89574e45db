use crate::error::{InputKind, TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// Stable identifier for a parsed dataset (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Homogeneous values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
    /// Class indices produced by the label encoder.
    Encoded(Vec<u32>),
}

impl ColumnData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Encoded(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Text(_) => "text",
            Self::Encoded(_) => "encoded",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }
}

/// Ordered collection of named, equally long columns.
///
/// Always holds at least two columns: one feature plus the label.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> TrainingResult<Self> {
        if columns.len() < 2 {
            return Err(TrainingError::Dataset(format!(
                "dataset needs at least 2 columns (features + label), found {}",
                columns.len()
            )));
        }

        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(TrainingError::Dataset(format!("duplicate column name '{}'", column.name)));
            }
        }

        let rows = columns[0].data.len();
        if let Some(bad) = columns.iter().find(|c| c.data.len() != rows) {
            return Err(TrainingError::Dataset(format!(
                "column '{}' has {} rows, expected {rows}",
                bad.name,
                bad.data.len()
            )));
        }

        Ok(Self { columns })
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Replace the values of column `name`, keeping its position.
    pub fn replace_column(&mut self, name: &str, data: ColumnData) -> TrainingResult<()> {
        let rows = self.n_rows();
        if data.len() != rows {
            return Err(TrainingError::Dataset(format!(
                "replacement for column '{name}' has {} rows, expected {rows}",
                data.len()
            )));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| TrainingError::Dataset(format!("column '{name}' not found")))?;
        column.data = data;
        Ok(())
    }
}

/// Options for CSV parsing.
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// Columns kept as text even when every cell looks numeric
    /// (e.g. a label column whose classes are "0" and "1").
    pub text_columns: Vec<String>,
}

/// Parse a CSV file with a header row into a [`Dataset`].
///
/// A column is numeric when every cell parses as `f64` (surrounding
/// whitespace ignored), text otherwise. Text cells are kept verbatim.
pub fn read_csv_dataset(path: &Path, options: &CsvOptions) -> TrainingResult<Dataset> {
    if !path.exists() {
        return Err(TrainingError::InputNotFound { kind: InputKind::Dataset, path: path.to_path_buf() });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (idx, value) in record.iter().enumerate() {
            cells[idx].push(value.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| {
            let data = if options.text_columns.contains(&name) {
                ColumnData::Text(values)
            } else {
                infer_column(values)
            };
            Column::new(name, data)
        })
        .collect();

    Dataset::new(columns)
}

fn infer_column(values: Vec<String>) -> ColumnData {
    let parsed: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
    match parsed {
        Some(numbers) => ColumnData::Numeric(numbers),
        None => ColumnData::Text(values),
    }
}

pub fn compute_dataset_id(dataset: &Dataset) -> DatasetId {
    let mut hasher = Sha256::new();

    for column in dataset.columns() {
        hasher.update(column.name.as_bytes());
        hasher.update(b"\n");
        match &column.data {
            ColumnData::Numeric(values) => {
                for v in values {
                    hasher.update(v.to_le_bytes());
                }
            }
            ColumnData::Text(values) => {
                for v in values {
                    hasher.update(v.as_bytes());
                    hasher.update(b"\x1f");
                }
            }
            ColumnData::Encoded(values) => {
                for v in values {
                    hasher.update(v.to_le_bytes());
                }
            }
        }
        hasher.update(b"\n");
    }

    DatasetId(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("data.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_csv_infers_column_types() {
        let temp = TempDir::new().unwrap();
        let path = write_csv(&temp, "weight,height,species\n4.2,30,cat\n12.5,55,dog\n");

        let dataset = read_csv_dataset(&path, &CsvOptions::default()).unwrap();
        assert_eq!(dataset.names(), ["weight", "height", "species"]);
        assert_eq!(dataset.n_rows(), 2);
        assert_eq!(dataset.column("weight").unwrap().data, ColumnData::Numeric(vec![4.2, 12.5]));
        assert_eq!(
            dataset.column("species").unwrap().data,
            ColumnData::Text(vec!["cat".to_string(), "dog".to_string()])
        );
    }

    #[test]
    fn test_read_csv_keeps_forced_text_columns() {
        let temp = TempDir::new().unwrap();
        let path = write_csv(&temp, "x,y\n1.0,0\n2.0,1\n");
        let options = CsvOptions { text_columns: vec!["y".to_string()] };

        let dataset = read_csv_dataset(&path, &options).unwrap();
        assert_eq!(dataset.column("y").unwrap().data, ColumnData::Text(vec!["0".to_string(), "1".to_string()]));
    }

    #[test]
    fn test_read_csv_keeps_text_whitespace_verbatim() {
        let temp = TempDir::new().unwrap();
        let path = write_csv(&temp, "w , species\n 1.5 ,\" cat\"\n2,dog \n");
        let options = CsvOptions { text_columns: vec!["species".to_string()] };

        let dataset = read_csv_dataset(&path, &options).unwrap();
        assert_eq!(dataset.names(), ["w", "species"]);
        assert_eq!(dataset.column("w").unwrap().data, ColumnData::Numeric(vec![1.5, 2.0]));
        assert_eq!(
            dataset.column("species").unwrap().data,
            ColumnData::Text(vec![" cat".to_string(), "dog ".to_string()])
        );
    }

    #[test]
    fn test_read_csv_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_csv_dataset(&temp.path().join("missing.csv"), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, TrainingError::InputNotFound { kind: InputKind::Dataset, .. }));
    }

    #[test]
    fn test_read_csv_rejects_single_column() {
        let temp = TempDir::new().unwrap();
        let path = write_csv(&temp, "species\ncat\n");
        let err = read_csv_dataset(&path, &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
    }

    #[test]
    fn test_read_csv_rejects_ragged_rows() {
        let temp = TempDir::new().unwrap();
        let path = write_csv(&temp, "a,b\n1,2\n3\n");
        assert!(read_csv_dataset(&path, &CsvOptions::default()).is_err());
    }

    #[test]
    fn test_replace_column_checks_length() {
        let mut dataset = Dataset::new(vec![
            Column::new("a", ColumnData::Numeric(vec![1.0, 2.0])),
            Column::new("b", ColumnData::Text(vec!["x".to_string(), "y".to_string()])),
        ])
        .unwrap();

        assert!(dataset.replace_column("b", ColumnData::Encoded(vec![0])).is_err());
        dataset.replace_column("b", ColumnData::Encoded(vec![0, 1])).unwrap();
        assert_eq!(dataset.names(), ["a", "b"]);
    }

    #[test]
    fn test_compute_dataset_id_stable_for_same_content() {
        let dataset = Dataset::new(vec![
            Column::new("a", ColumnData::Numeric(vec![1.0])),
            Column::new("b", ColumnData::Text(vec!["x".to_string()])),
        ])
        .unwrap();

        assert_eq!(compute_dataset_id(&dataset), compute_dataset_id(&dataset.clone()));
    }
}
