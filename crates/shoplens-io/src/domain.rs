//! Domain types for shoplens-io.

use std::borrow::Cow;
use std::collections::BTreeMap;

use tracing::debug;

use crate::DatasetError;

/// One typed column of the loaded table.
///
/// A column is `Numeric` when every cell parsed as a finite float at load
/// time; otherwise the raw strings are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl Column {
    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    /// Whether the column has zero cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every cell is a finite float.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    /// Borrow the values of a numeric column.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric(v) => Some(v),
            Self::Categorical(_) => None,
        }
    }

    /// Render one cell as text. Whole floats print without a fraction.
    #[must_use]
    pub fn cell(&self, row: usize) -> Cow<'_, str> {
        match self {
            Self::Numeric(v) => Cow::Owned(v[row].to_string()),
            Self::Categorical(v) => Cow::Borrowed(&v[row]),
        }
    }
}

/// The loaded table: named, typed columns of equal length.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). Column order follows
/// the CSV header.
#[derive(Debug, Clone)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

/// Features and labels separated from a [`Dataset`].
#[derive(Debug, Clone)]
pub struct LabeledData {
    /// Feature column names, in header order without the label.
    pub feature_names: Vec<String>,
    /// Feature values: `features[row][feature]`.
    pub features: Vec<Vec<f64>>,
    /// Zero-based class labels, one per row.
    pub labels: Vec<usize>,
}

impl LabeledData {
    /// Number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Gather the rows at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<usize>) {
        indices
            .iter()
            .map(|&i| (self.features[i].clone(), self.labels[i]))
            .unzip()
    }
}

impl Dataset {
    pub(crate) fn new(names: Vec<String>, columns: Vec<Column>, n_rows: usize) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Self {
            names,
            columns,
            n_rows,
        }
    }

    /// Return the column names in header order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Return the number of data rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Look up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Borrow a column, failing with [`DatasetError::MissingColumn`].
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingColumn`] if no column has this name.
    pub fn require(&self, name: &str) -> Result<&Column, DatasetError> {
        self.column(name).ok_or_else(|| DatasetError::MissingColumn {
            name: name.to_string(),
        })
    }

    /// Borrow the values of a numeric column.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DatasetError::MissingColumn`] | No column has this name |
    /// | [`DatasetError::NonNumericFeature`] | The column holds text |
    pub fn numeric(&self, name: &str) -> Result<&[f64], DatasetError> {
        self.require(name)?
            .as_numeric()
            .ok_or_else(|| DatasetError::NonNumericFeature {
                column: name.to_string(),
            })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Replace a categorical column with ordinal codes.
    ///
    /// Distinct values are sorted and numbered `0..k`; the sorted levels are
    /// returned so codes can be mapped back. A column that is already
    /// numeric is left untouched and yields no levels.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingColumn`] if no column has this name.
    pub fn encode_categorical(&mut self, name: &str) -> Result<Vec<String>, DatasetError> {
        let index = self.position(name).ok_or_else(|| DatasetError::MissingColumn {
            name: name.to_string(),
        })?;
        let Column::Categorical(values) = &self.columns[index] else {
            return Ok(Vec::new());
        };

        let codes: BTreeMap<&str, usize> = values
            .iter()
            .map(String::as_str)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value, code))
            .collect();
        let encoded: Vec<f64> = values.iter().map(|v| codes[v.as_str()] as f64).collect();
        let levels: Vec<String> = codes.keys().map(|s| (*s).to_string()).collect();

        debug!(column = name, n_levels = levels.len(), "encoded categorical column");
        self.columns[index] = Column::Numeric(encoded);
        Ok(levels)
    }

    /// Encode every categorical column except `label`.
    ///
    /// Returns the names of the columns that were encoded.
    ///
    /// # Errors
    ///
    /// Propagates [`Dataset::encode_categorical`] failures.
    pub fn encode_all_categoricals(&mut self, label: &str) -> Result<Vec<String>, DatasetError> {
        let targets: Vec<String> = self
            .names
            .iter()
            .zip(&self.columns)
            .filter(|(name, column)| name.as_str() != label && !column.is_numeric())
            .map(|(name, _)| name.clone())
            .collect();
        for name in &targets {
            self.encode_categorical(name)?;
        }
        Ok(targets)
    }

    /// Separate the label column from the feature columns.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DatasetError::MissingColumn`] | `label` is not a column |
    /// | [`DatasetError::InvalidLabel`] | A label cell is not a non-negative integer |
    /// | [`DatasetError::NonNumericFeature`] | A feature column holds text |
    pub fn split_features(&self, label: &str) -> Result<LabeledData, DatasetError> {
        let label_index = self.position(label).ok_or_else(|| DatasetError::MissingColumn {
            name: label.to_string(),
        })?;
        let labels = parse_labels(label, &self.columns[label_index])?;

        let mut feature_names = Vec::with_capacity(self.names.len() - 1);
        let mut feature_columns = Vec::with_capacity(self.names.len() - 1);
        for (i, (name, column)) in self.names.iter().zip(&self.columns).enumerate() {
            if i == label_index {
                continue;
            }
            let values = column
                .as_numeric()
                .ok_or_else(|| DatasetError::NonNumericFeature {
                    column: name.clone(),
                })?;
            feature_names.push(name.clone());
            feature_columns.push(values);
        }

        let features = (0..self.n_rows)
            .map(|row| feature_columns.iter().map(|col| col[row]).collect())
            .collect();

        Ok(LabeledData {
            feature_names,
            features,
            labels,
        })
    }
}

/// Largest class id accepted in the label column.
pub const MAX_LABEL: usize = 255;

fn parse_labels(column_name: &str, column: &Column) -> Result<Vec<usize>, DatasetError> {
    let invalid = |row_index: usize| DatasetError::InvalidLabel {
        column: column_name.to_string(),
        row_index,
        raw: column.cell(row_index).into_owned(),
    };
    match column {
        Column::Numeric(values) => values
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                if v >= 0.0 && v.fract() == 0.0 && v <= MAX_LABEL as f64 {
                    Ok(v as usize)
                } else {
                    Err(invalid(row))
                }
            })
            .collect(),
        Column::Categorical(_) => Err(invalid(0)),
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, DatasetError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DatasetError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
