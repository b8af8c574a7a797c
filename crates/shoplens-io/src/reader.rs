//! CSV dataset reader with required-column validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::DatasetError;
use crate::domain::{Column, Dataset};

/// Name of the binary purchase indicator.
pub const LABEL_COLUMN: &str = "PurchaseStatus";

/// Columns the dashboard cannot run without.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    LABEL_COLUMN,
    "Age",
    "ProductCategory",
    "AnnualIncome",
    "TimeSpentOnWebsite",
    "NumberOfPurchases",
];

/// Reads a purchase dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required; names must be unique
/// - One record per row, every row as wide as the header
/// - Cells are trimmed; a column whose every cell is a finite float becomes
///   [`Column::Numeric`], anything else [`Column::Categorical`]
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DatasetError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`DatasetError::CsvParse`] | Malformed CSV record |
/// | [`DatasetError::DuplicateColumn`] | Header repeats a name |
/// | [`DatasetError::InconsistentRowLength`] | Row has different column count than header |
/// | [`DatasetError::EmptyDataset`] | Zero data rows after header |
/// | [`DatasetError::MissingColumn`] | A required column is absent |
pub struct DatasetReader {
    path: PathBuf,
    required: Vec<String>,
}

impl DatasetReader {
    /// Create a reader for the given CSV path requiring [`REQUIRED_COLUMNS`].
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            required: REQUIRED_COLUMNS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Replace the set of columns that must be present.
    #[must_use]
    pub fn with_required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, DatasetError> {
        let file = std::fs::File::open(&self.path).map_err(|e| DatasetError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so a short row surfaces as InconsistentRowLength
        // rather than a generic CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?;
        let names: Vec<String> = header.iter().map(str::to_string).collect();
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DatasetError::DuplicateColumn {
                    path: self.path.clone(),
                    name: name.clone(),
                });
            }
        }
        debug!(n_columns = names.len(), "read CSV header");

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;
            if record.len() != names.len() {
                return Err(DatasetError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: names.len(),
                    got: record.len(),
                });
            }
            for (column, value) in cells.iter_mut().zip(record.iter()) {
                column.push(value.to_string());
            }
        }

        let n_rows = cells.first().map_or(0, Vec::len);
        if n_rows == 0 {
            return Err(DatasetError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        for name in &self.required {
            if !names.contains(name) {
                return Err(DatasetError::MissingColumn { name: name.clone() });
            }
        }

        let columns: Vec<Column> = cells.into_iter().map(type_column).collect();
        let n_categorical = columns.iter().filter(|c| !c.is_numeric()).count();

        info!(
            n_rows,
            n_columns = names.len(),
            n_categorical,
            "dataset loaded"
        );

        Ok(Dataset::new(names, columns, n_rows))
    }

    fn parse_error(&self, e: csv::Error) -> DatasetError {
        DatasetError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Promote a column to numeric when every cell is a finite float.
fn type_column(raw: Vec<String>) -> Column {
    let parsed: Option<Vec<f64>> = raw
        .iter()
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();
    match parsed {
        Some(values) => Column::Numeric(values),
        None => Column::Categorical(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "Age,Gender,AnnualIncome,NumberOfPurchases,ProductCategory,TimeSpentOnWebsite,PurchaseStatus";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_purchases() {
        let csv = format!(
            "{HEADER}\n40,1,66120.26,8,0,30.57,1\n20,1,23579.77,4,2,38.24,0\n27,1,127821.30,11,2,31.63,1\n"
        );
        let f = write_csv(&csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.n_columns(), 7);
        assert_eq!(ds.numeric("Age").unwrap(), &[40.0, 20.0, 27.0]);
        assert!((ds.numeric("AnnualIncome").unwrap()[2] - 127_821.30).abs() < 1e-9);
    }

    #[test]
    fn text_column_is_categorical() {
        let csv = format!("{HEADER},Region\n40,1,66120,8,0,30.5,1,north\n20,0,23579,4,2,38.2,0,south\n");
        let f = write_csv(&csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        let region = ds.column("Region").unwrap();
        assert!(!region.is_numeric());
        assert_eq!(region.cell(1), "south");
    }

    #[test]
    fn cells_are_trimmed() {
        let csv = format!("{HEADER}\n 40 ,1,66120,8,0,30.5,1\n");
        let f = write_csv(&csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.numeric("Age").unwrap(), &[40.0]);
    }

    #[test]
    fn custom_required_columns() {
        let f = write_csv("x,y\n1,0\n2,1\n");
        let ds = DatasetReader::new(f.path())
            .with_required_columns(["x", "y"])
            .read()
            .unwrap();
        assert_eq!(ds.column_names(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn error_file_not_found() {
        let result = DatasetReader::new(Path::new("/nonexistent/dataset.csv")).read();
        assert!(matches!(result, Err(DatasetError::FileNotFound { .. })));
    }

    #[test]
    fn error_empty_dataset() {
        let f = write_csv(&format!("{HEADER}\n"));
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(DatasetError::EmptyDataset { .. })));
    }

    #[test]
    fn error_missing_label_column() {
        let f = write_csv("Age,AnnualIncome,NumberOfPurchases,ProductCategory,TimeSpentOnWebsite\n1,2,3,4,5\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(DatasetError::MissingColumn { name }) if name == LABEL_COLUMN
        ));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let csv = format!("{HEADER}\n40,1,66120,8,0,30.5,1\n20,1,23579\n");
        let f = write_csv(&csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(DatasetError::InconsistentRowLength {
                row_index: 1,
                expected: 7,
                got: 3,
                ..
            })
        ));
    }

    #[test]
    fn error_duplicate_column() {
        let f = write_csv("a,b,a\n1,2,3\n");
        let result = DatasetReader::new(f.path())
            .with_required_columns(Vec::<String>::new())
            .read();
        assert!(matches!(
            result,
            Err(DatasetError::DuplicateColumn { name, .. }) if name == "a"
        ));
    }
}
