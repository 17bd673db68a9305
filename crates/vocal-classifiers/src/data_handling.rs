//! The labeled sample matrix consumed by the selection pipeline.
//!
//! `Dataset` owns the feature matrix (one row per recording), the binary
//! labels (`true` = positive class), the feature names and, optionally, an
//! identifier per sample. Construction validates the invariants the
//! pipeline relies on, so downstream code never re-checks them.
use log::info;

use crate::error::SelectionError;
use crate::math::{Array1, Array2};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Array1<bool>,
    pub feature_names: Vec<String>,
    pub sample_ids: Option<Vec<String>>,
}

impl Dataset {
    /// Build a dataset, checking that
    /// - `x` has one row per label and one column per feature name,
    /// - there is at least one feature,
    /// - every value is finite,
    /// - both classes are present.
    pub fn new(
        x: Array2<f64>,
        y: Array1<bool>,
        feature_names: Vec<String>,
    ) -> Result<Self, SelectionError> {
        if x.nrows() != y.len() {
            return Err(SelectionError::configuration(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.ncols() == 0 {
            return Err(SelectionError::configuration("dataset has no feature columns"));
        }
        if feature_names.len() != x.ncols() {
            return Err(SelectionError::configuration(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                x.ncols()
            )));
        }
        if let Some(pos) = x.as_slice().iter().position(|v| !v.is_finite()) {
            let (row, col) = (pos / x.ncols(), pos % x.ncols());
            return Err(SelectionError::configuration(format!(
                "non-finite value in row {} of feature '{}'",
                row, feature_names[col]
            )));
        }
        let n_pos = y.count_true();
        if n_pos == 0 || n_pos == y.len() {
            return Err(SelectionError::configuration(
                "labels must contain both classes",
            ));
        }
        Ok(Dataset {
            x,
            y,
            feature_names,
            sample_ids: None,
        })
    }

    pub fn with_sample_ids(mut self, ids: Vec<String>) -> Result<Self, SelectionError> {
        if ids.len() != self.n_samples() {
            return Err(SelectionError::configuration(format!(
                "{} sample ids for {} samples",
                ids.len(),
                self.n_samples()
            )));
        }
        self.sample_ids = Some(ids);
        Ok(self)
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// `(positives, negatives)`
    pub fn class_counts(&self) -> (usize, usize) {
        let n_pos = self.y.count_true();
        (n_pos, self.y.len() - n_pos)
    }

    /// Identifier of sample `i`, falling back to its row number.
    pub fn sample_id(&self, i: usize) -> String {
        match &self.sample_ids {
            Some(ids) => ids[i].clone(),
            None => i.to_string(),
        }
    }

    /// Replace the feature matrix, keeping labels and names.
    pub fn with_features(&self, x: Array2<f64>) -> Result<Self, SelectionError> {
        let dataset = Dataset::new(x, self.y.clone(), self.feature_names.clone())?;
        match &self.sample_ids {
            Some(ids) => dataset.with_sample_ids(ids.clone()),
            None => Ok(dataset),
        }
    }

    pub fn log_input_data_summary(&self) {
        let (n_pos, n_neg) = self.class_counts();
        info!("----- Input Data Summary -----");
        info!("{} positive and {} negative samples", n_pos, n_neg);
        info!("{} feature columns", self.n_features());
        info!("-------------------------------");
    }
}
