//! Feature schema extraction from the reference dataset.
//!
//! The schema is the ordered list of feature names the scaler and classifier
//! were fitted on. It is read from the header of the training dataset, minus
//! the target column.

use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Default name of the target column in the reference dataset
pub const DEFAULT_TARGET_COLUMN: &str = "Status";

/// Ordered, duplicate-free feature names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    features: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from column names, dropping `target` if present.
    ///
    /// Duplicate names keep their first position.
    pub fn extract<I, S>(columns: I, target: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let features = columns
            .into_iter()
            .map(Into::into)
            .filter(|name| name != target)
            .filter(|name| {
                let first = seen.insert(name.clone());
                if !first {
                    warn!(feature = %name, "Duplicate column in reference dataset, keeping first");
                }
                first
            })
            .collect();

        Self { features }
    }

    /// Feature names in fit order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(String::as_str)
    }
}

/// Column names of a CSV file, in header order.
///
/// Only the header matters: every column is read as a string and at most one
/// data row is parsed, so cell contents never fail the load.
pub fn read_dataset_columns(path: &Path) -> PolarsResult<Vec<String>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(Some(1))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect())
}
