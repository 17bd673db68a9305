//! Exhaustive hyperparameter search under cross-validation.
//!
//! Every point of a model's grid is scored by its mean held-out AUC over the
//! shared fold assignment. Folds whose fit fails or whose AUC is undefined are
//! left out of that point's mean; points without any scored fold are not
//! eligible. The highest mean wins and ties go to the point enumerated first.
//! The winner is then refitted on the full dataset.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{HyperparameterPoint, ModelSpec, ModelType};
use crate::data_handling::Dataset;
use crate::error::SelectionError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;
use crate::partition::FoldAssignment;
use crate::scorer::run_folds;
use crate::stats::FoldStatistics;

/// Cooperative cancellation flag, checked between grid points and between folds.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Base seed for stochastic estimators.
    pub seed: u64,
    /// Evaluate grid points on the current rayon pool.
    pub parallel: bool,
    pub cancel: Option<CancellationToken>,
}

impl SearchOptions {
    pub(crate) fn check_cancelled(&self) -> Result<(), SelectionError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(SelectionError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Cross-validation record of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointEvaluation {
    pub point: HyperparameterPoint,
    pub model_type: ModelType,
    pub fold_scores: Vec<Option<f64>>,
    /// `None` when no fold could be scored.
    pub statistics: Option<FoldStatistics>,
    pub failures: Vec<String>,
}

impl PointEvaluation {
    pub fn mean(&self) -> Option<f64> {
        self.statistics.map(|s| s.mean)
    }
}

pub struct SearchOutcome {
    pub best_index: usize,
    pub best_point: HyperparameterPoint,
    pub best_model_type: ModelType,
    /// Mean AUC of the best point during the search.
    pub best_mean: f64,
    /// Every grid point, in enumeration order.
    pub candidates: Vec<PointEvaluation>,
    /// The best point refitted on the full dataset.
    pub estimator: Box<dyn ClassifierModel>,
}

fn evaluate_point(
    point: &HyperparameterPoint,
    model_type: &ModelType,
    dataset: &Dataset,
    folds: &FoldAssignment,
    options: &SearchOptions,
) -> Result<PointEvaluation, SelectionError> {
    options.check_cancelled()?;
    let run = run_folds(model_type, dataset, folds, options)?;
    let statistics = FoldStatistics::from_folds(&run.fold_scores);
    match statistics {
        Some(s) => debug!(
            "{}: mean auc {:.4} over {}/{} folds",
            point, s.mean, s.n_defined, s.n_folds
        ),
        None => debug!("{}: no fold could be scored", point),
    }
    Ok(PointEvaluation {
        point: point.clone(),
        model_type: model_type.clone(),
        fold_scores: run.fold_scores,
        statistics,
        failures: run.failures.into_iter().flatten().collect(),
    })
}

/// Index and mean of the point with the highest mean; the earliest wins ties.
pub fn select_best(candidates: &[PointEvaluation]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if let Some(mean) = candidate.mean() {
            if best.map_or(true, |(_, m)| mean > m) {
                best = Some((i, mean));
            }
        }
    }
    best
}

/// Search `spec`'s grid on `dataset` using the given folds.
pub fn grid_search(
    spec: &ModelSpec,
    dataset: &Dataset,
    folds: &FoldAssignment,
    options: &SearchOptions,
) -> Result<SearchOutcome, SelectionError> {
    if folds.n_samples() != dataset.n_samples() {
        return Err(SelectionError::configuration(format!(
            "fold assignment covers {} samples but the dataset has {}",
            folds.n_samples(),
            dataset.n_samples()
        )));
    }
    let points = spec.resolve_points()?;
    info!(
        "Searching {} point(s) x {} folds for '{}'",
        points.len(),
        folds.k(),
        spec.name
    );

    let candidates: Vec<PointEvaluation> = if options.parallel {
        points
            .par_iter()
            .map(|(point, model_type)| evaluate_point(point, model_type, dataset, folds, options))
            .collect::<Result<Vec<_>, SelectionError>>()?
    } else {
        points
            .iter()
            .map(|(point, model_type)| evaluate_point(point, model_type, dataset, folds, options))
            .collect::<Result<Vec<_>, SelectionError>>()?
    };

    let (best_index, best_mean) =
        select_best(&candidates).ok_or_else(|| SelectionError::NoViableModel {
            model: spec.name.clone(),
            points_tried: candidates.len(),
        })?;
    let best = &candidates[best_index];
    info!(
        "'{}': selected {} (mean auc {:.4})",
        spec.name, best.point, best_mean
    );

    options.check_cancelled()?;
    let refit_error = |source| SelectionError::Fit {
        model: spec.name.clone(),
        source,
    };
    let mut estimator = build_model(&best.model_type, options.seed).map_err(refit_error)?;
    estimator
        .fit(&dataset.x, &dataset.y)
        .map_err(refit_error)?;

    Ok(SearchOutcome {
        best_index,
        best_point: best.point.clone(),
        best_model_type: best.model_type.clone(),
        best_mean,
        candidates,
        estimator,
    })
}
