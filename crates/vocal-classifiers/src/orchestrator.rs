//! Best-effort comparison of several model specifications on one dataset.
//!
//! The fold assignment is built once and shared by every specification. Each
//! specification is searched, re-scored on the same folds and, when the
//! selected estimator supports it, turned into a feature ranking. A failing
//! specification is recorded in the report and the sweep moves on; only
//! invalid run settings and cancellation end the run early.
use log::{info, warn};
use serde::Serialize;

use crate::config::{HyperparameterPoint, ModelFamily, ModelSpec, ModelType, PipelineConfig};
use crate::data_handling::Dataset;
use crate::error::SelectionError;
use crate::importance::{rank_features, FeatureRanking};
use crate::partition::FoldAssignment;
use crate::preprocessing::{fit_transform, Scaler};
use crate::scorer::cross_validate;
use crate::search::{grid_search, CancellationToken, PointEvaluation, SearchOptions};
use crate::stats::{roc_curve, RocCurve};

/// Everything recorded for a specification that produced a reported score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub best_point: HyperparameterPoint,
    pub best_model_type: ModelType,
    /// Mean AUC of the selected point during the search.
    pub search_mean_auc: f64,
    /// Reported per-fold AUCs from the post-selection pass.
    pub fold_aucs: Vec<Option<f64>>,
    pub fold_failures: Vec<Option<String>>,
    pub mean_auc: f64,
    pub std_auc: f64,
    /// Held-out probability per sample, original order.
    pub oof_scores: Vec<Option<f64>>,
    /// Held-out decision value per sample, original order.
    pub oof_margins: Vec<Option<f64>>,
    /// ROC curve of the pooled out-of-fold decision values.
    pub roc: Option<RocCurve>,
    pub pooled_auc: Option<f64>,
    pub ranking: Option<FeatureRanking>,
    /// Why `ranking` is absent.
    pub ranking_note: Option<String>,
    pub candidates: Vec<PointEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Evaluated(EvaluationResult),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub name: String,
    pub family: ModelFamily,
    #[serde(flatten)]
    pub outcome: ModelOutcome,
}

impl ModelReport {
    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        match &self.outcome {
            ModelOutcome::Evaluated(result) => Some(result),
            ModelOutcome::Failed { .. } => None,
        }
    }

    pub fn summary_line(&self) -> String {
        match &self.outcome {
            ModelOutcome::Evaluated(result) => {
                let mut line = format!(
                    "{}: evaluated, mean AUC {:.4} (std {:.4}) with {}",
                    self.name, result.mean_auc, result.std_auc, result.best_point
                );
                if let Some(note) = &result.ranking_note {
                    line.push_str(&format!("; no feature ranking: {}", note));
                }
                line
            }
            ModelOutcome::Failed { reason } => format!("{}: failed: {}", self.name, reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub k_folds: usize,
    pub seed: u64,
    pub n_samples: usize,
    pub feature_names: Vec<String>,
    pub fold_sizes: Vec<usize>,
    /// Present when the features were standardized before evaluation.
    pub scaler: Option<Scaler>,
    /// One entry per specification, in declared order.
    pub models: Vec<ModelReport>,
}

impl ComparisonReport {
    /// The evaluated model with the highest reported mean AUC; the first declared wins ties.
    pub fn best(&self) -> Option<&ModelReport> {
        let mut best: Option<(&ModelReport, f64)> = None;
        for report in &self.models {
            if let Some(result) = report.evaluation() {
                if best.map_or(true, |(_, m)| result.mean_auc > m) {
                    best = Some((report, result.mean_auc));
                }
            }
        }
        best.map(|(report, _)| report)
    }

    pub fn get(&self, name: &str) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.models.iter().map(ModelReport::summary_line).collect()
    }
}

/// Drives the comparison of every configured model specification.
pub struct ModelComparison {
    config: PipelineConfig,
    cancel: Option<CancellationToken>,
}

impl ModelComparison {
    pub fn new(config: PipelineConfig) -> Self {
        ModelComparison {
            config,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, dataset: &Dataset) -> Result<ComparisonReport, SelectionError> {
        self.config.validate()?;
        match self.config.n_threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        SelectionError::configuration(format!("cannot build thread pool: {}", e))
                    })?;
                pool.install(|| self.run_all(dataset))
            }
            None => self.run_all(dataset),
        }
    }

    fn run_all(&self, dataset: &Dataset) -> Result<ComparisonReport, SelectionError> {
        let config = &self.config;
        let folds = FoldAssignment::new(dataset.n_samples(), config.k_folds, config.seed)?;
        info!(
            "{} samples split into {} folds of sizes {:?}",
            dataset.n_samples(),
            folds.k(),
            folds.fold_sizes()
        );

        let (scaled, scaler) = if config.scale_features {
            info!("Standardizing {} feature columns", dataset.n_features());
            let (x, scaler) = fit_transform(&dataset.x)
                .map_err(|e| SelectionError::configuration(e.to_string()))?;
            (Some(dataset.with_features(x)?), Some(scaler))
        } else {
            (None, None)
        };
        let dataset = scaled.as_ref().unwrap_or(dataset);

        let options = SearchOptions {
            seed: config.seed,
            parallel: config.parallel,
            cancel: self.cancel.clone(),
        };

        let mut models = Vec::with_capacity(config.models.len());
        for spec in &config.models {
            info!("Evaluating '{}' ({})", spec.name, spec.family);
            let outcome = match self.evaluate_spec(spec, dataset, &folds, &options) {
                Ok(result) => {
                    info!("'{}': mean AUC {:.4}", spec.name, result.mean_auc);
                    ModelOutcome::Evaluated(result)
                }
                Err(SelectionError::Cancelled) => return Err(SelectionError::Cancelled),
                Err(e) => {
                    warn!("'{}' failed: {}", spec.name, e);
                    ModelOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            models.push(ModelReport {
                name: spec.name.clone(),
                family: spec.family,
                outcome,
            });
        }

        Ok(ComparisonReport {
            k_folds: folds.k(),
            seed: config.seed,
            n_samples: dataset.n_samples(),
            feature_names: dataset.feature_names.clone(),
            fold_sizes: folds.fold_sizes(),
            scaler,
            models,
        })
    }

    fn evaluate_spec(
        &self,
        spec: &ModelSpec,
        dataset: &Dataset,
        folds: &FoldAssignment,
        options: &SearchOptions,
    ) -> Result<EvaluationResult, SelectionError> {
        let search = grid_search(spec, dataset, folds, options)?;

        let cv = cross_validate(&search.best_model_type, dataset, folds, options).map_err(
            |e| match e {
                SelectionError::NoViableModel { points_tried, .. } => {
                    SelectionError::NoViableModel {
                        model: spec.name.clone(),
                        points_tried,
                    }
                }
                other => other,
            },
        )?;

        let (ranking, ranking_note) = match rank_features(
            &*search.estimator,
            &dataset.feature_names,
            self.config.top_n_features,
        ) {
            Ok(ranking) => (Some(ranking), None),
            Err(SelectionError::UnsupportedCapability { capability, .. }) => {
                info!("'{}' exposes no {}", spec.name, capability);
                (
                    None,
                    Some(format!(
                        "'{}' with {} does not support {}",
                        spec.name, search.best_point, capability
                    )),
                )
            }
            Err(e) => return Err(e),
        };

        let (margins, labels): (Vec<f64>, Vec<bool>) = cv
            .oof_margins
            .iter()
            .zip(dataset.y.iter())
            .filter_map(|(s, &l)| s.map(|s| (s, l)))
            .unzip();
        let roc = roc_curve(&margins, &labels).ok();
        let pooled_auc = roc.as_ref().map(RocCurve::auc);

        Ok(EvaluationResult {
            best_point: search.best_point,
            best_model_type: search.best_model_type,
            search_mean_auc: search.best_mean,
            fold_aucs: cv.fold_scores,
            fold_failures: cv.fold_failures,
            mean_auc: cv.mean,
            std_auc: cv.std,
            oof_scores: cv.oof_scores,
            oof_margins: cv.oof_margins,
            roc,
            pooled_auc,
            ranking,
            ranking_note,
            candidates: search.candidates,
        })
    }
}
