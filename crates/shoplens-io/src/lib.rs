//! Dataset loading, validation, and report serialization for shoplens.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Column, Dataset, ExperimentName, LabeledData, MAX_LABEL};
pub use error::DatasetError;
pub use reader::{DatasetReader, LABEL_COLUMN, REQUIRED_COLUMNS};
pub use writer::{ReportWriter, SplitSizes};
