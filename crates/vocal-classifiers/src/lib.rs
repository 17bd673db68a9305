//! vocal-classifiers: cross-validated model selection for voice-feature
//! binary classification.
//!
//! The crate partitions a labeled feature table into deterministic folds,
//! grid-searches each configured model family under cross-validation, re-scores
//! the selected hyperparameters on the same folds and ranks the most
//! influential features of the selected estimator. [`orchestrator::ModelComparison`]
//! runs the whole comparison; the `io` and `report` modules read feature
//! tables and write results.
//!
//! The kernel SVM family depends on linfa and sits behind the default `svm`
//! feature.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod importance;
pub mod io;
pub mod math;
pub mod models;
pub mod orchestrator;
pub mod partition;
pub mod preprocessing;
pub mod report;
pub mod scorer;
pub mod search;
pub mod stats;

pub use config::{ModelFamily, ModelSpec, ModelType, ParamGrid, PipelineConfig};
pub use data_handling::Dataset;
pub use error::{FitError, SelectionError};
pub use orchestrator::{ComparisonReport, ModelComparison};
