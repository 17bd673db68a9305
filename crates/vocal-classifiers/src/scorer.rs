//! K-fold fit/predict/score loop and the cross-validated scorer.
//!
//! The reported score of a model reuses the folds that selected its
//! hyperparameters (no nested resampling), so it is optimistically biased
//! relative to a truly held-out estimate.
use log::trace;
use serde::Serialize;

use crate::config::ModelType;
use crate::data_handling::Dataset;
use crate::error::{FitError, SelectionError};
use crate::models::factory::build_model;
use crate::partition::{FoldAssignment, FoldSplit};
use crate::search::SearchOptions;
use crate::stats::{roc_auc, FoldStatistics};

/// Outcome of one pass over every fold for a fixed hyperparameter set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FoldRun {
    pub fold_scores: Vec<Option<f64>>,
    pub failures: Vec<Option<String>>,
    pub oof_scores: Vec<Option<f64>>,
    pub oof_margins: Vec<Option<f64>>,
}

/// Held-out output of one fitted fold.
struct FoldPredictions {
    probabilities: Vec<f64>,
    margins: Vec<f64>,
}

/// Seed handed to the estimator of one fold.
pub(crate) fn fold_seed(seed: u64, fold: usize) -> u64 {
    seed.wrapping_add(fold as u64)
}

/// Held-out predictions of one fold plus the AUC of its decision values.
///
/// The AUC is ranked on the f64 margins from `predict`, which keep their
/// order where the probabilities saturate to 0 or 1. Predictions survive an
/// undefined AUC (e.g. a single-class validation fold).
fn score_fold(
    model_type: &ModelType,
    dataset: &Dataset,
    split: &FoldSplit,
    seed: u64,
) -> Result<(FoldPredictions, Result<f64, FitError>), FitError> {
    let x_train = dataset.x.select_rows(&split.train);
    let y_train = dataset.y.select(&split.train);
    let x_valid = dataset.x.select_rows(&split.validation);
    let y_valid = dataset.y.select(&split.validation);

    let mut model = build_model(model_type, fold_seed(seed, split.fold))?;
    model.fit(&x_train, &y_train)?;
    let margins = model.predict(&x_valid)?;
    let probabilities = model.predict_proba(&x_valid)?;
    let auc = roc_auc(&margins, y_valid.as_slice());
    Ok((
        FoldPredictions {
            probabilities,
            margins,
        },
        auc,
    ))
}

/// Fit on each training split, score the held-out fold, and collect
/// per-fold AUCs plus out-of-fold probabilities and margins.
pub(crate) fn run_folds(
    model_type: &ModelType,
    dataset: &Dataset,
    folds: &FoldAssignment,
    options: &SearchOptions,
) -> Result<FoldRun, SelectionError> {
    let mut run = FoldRun {
        fold_scores: Vec::with_capacity(folds.k()),
        failures: Vec::with_capacity(folds.k()),
        oof_scores: vec![None; dataset.n_samples()],
        oof_margins: vec![None; dataset.n_samples()],
    };
    for split in folds.splits() {
        options.check_cancelled()?;
        let outcome = score_fold(model_type, dataset, &split, options.seed).and_then(
            |(predictions, auc)| {
                let held_out = predictions.probabilities.into_iter().zip(predictions.margins);
                for (&i, (p, m)) in split.validation.iter().zip(held_out) {
                    run.oof_scores[i] = Some(p);
                    run.oof_margins[i] = Some(m);
                }
                auc
            },
        );
        match outcome {
            Ok(auc) => {
                trace!("fold {}: auc {:.4}", split.fold, auc);
                run.fold_scores.push(Some(auc));
                run.failures.push(None);
            }
            Err(e) => {
                trace!("fold {} excluded: {}", split.fold, e);
                run.fold_scores.push(None);
                run.failures.push(Some(e.to_string()));
            }
        }
    }
    Ok(run)
}

/// Reported cross-validation result of one hyperparameter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidation {
    /// AUC per fold, `None` where the fold was excluded.
    pub fold_scores: Vec<Option<f64>>,
    pub fold_failures: Vec<Option<String>>,
    pub mean: f64,
    pub std: f64,
    /// Held-out probability of every sample, in the original sample order.
    pub oof_scores: Vec<Option<f64>>,
    /// Held-out decision value of every sample, same order.
    pub oof_margins: Vec<Option<f64>>,
}

impl CrossValidation {
    pub fn n_defined(&self) -> usize {
        self.fold_scores.iter().flatten().count()
    }
}

/// Re-run K-fold evaluation of an already selected hyperparameter set.
pub fn cross_validate(
    model_type: &ModelType,
    dataset: &Dataset,
    folds: &FoldAssignment,
    options: &SearchOptions,
) -> Result<CrossValidation, SelectionError> {
    if folds.n_samples() != dataset.n_samples() {
        return Err(SelectionError::configuration(format!(
            "fold assignment covers {} samples but the dataset has {}",
            folds.n_samples(),
            dataset.n_samples()
        )));
    }
    let run = run_folds(model_type, dataset, folds, options)?;
    let stats = FoldStatistics::from_folds(&run.fold_scores).ok_or_else(|| {
        SelectionError::NoViableModel {
            model: model_type.family().to_string(),
            points_tried: 1,
        }
    })?;
    Ok(CrossValidation {
        fold_scores: run.fold_scores,
        fold_failures: run.failures,
        mean: stats.mean,
        std: stats.std,
        oof_scores: run.oof_scores,
        oof_margins: run.oof_margins,
    })
}
