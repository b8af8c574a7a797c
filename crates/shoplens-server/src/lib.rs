//! The shoplens dashboard: a one-shot training pipeline run at startup and
//! an HTTP surface that renders its results.
//!
//! [`initialize`] loads the dataset, trains and evaluates the classifier and
//! computes the descriptive statistics. The resulting [`Context`] is
//! immutable and shared with every request through [`build_router`].

mod charts;
mod config;
mod context;
mod pages;
mod routes;
mod stats;

pub use charts::{ChartSpec, least_squares};
pub use config::PipelineConfig;
pub use context::{Context, InitError, initialize};
pub use routes::{AppState, build_router};
pub use stats::{AGE_BUCKETS, DescriptiveStats};
