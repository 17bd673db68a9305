use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::{Array1, Array2};

/// The importance concept a fitted model can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceKind {
    /// Non-negative, normalized to sum to 1.
    SplitGain,
    /// Signed linear weights; the sign gives the direction towards the positive class.
    Coefficients,
}

/// Per-feature weights reported by a fitted model.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureWeights {
    /// Average split gain per feature, normalized to sum to 1.
    SplitGain(Vec<f64>),
    /// Weights `w` of a linear decision function `w . x + b`, in the units of
    /// that model's margin: log-odds for logistic regression, the perceptron
    /// score, or the SVM decision value `w . x - rho`. Magnitudes are only
    /// comparable within one model.
    Coefficients(Vec<f64>),
}

impl FeatureWeights {
    pub fn kind(&self) -> ImportanceKind {
        match self {
            FeatureWeights::SplitGain(_) => ImportanceKind::SplitGain,
            FeatureWeights::Coefficients(_) => ImportanceKind::Coefficients,
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            FeatureWeights::SplitGain(v) | FeatureWeights::Coefficients(v) => v,
        }
    }
}

/// Common contract of every model family.
///
/// Labels use `true` for the positive class. Models are created by
/// [`crate::models::factory::build_model`], fitted once and then only read.
pub trait ClassifierModel: Send {
    /// Fit the model on `x` (one row per sample) and labels `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<bool>) -> Result<(), FitError>;

    /// Raw decision scores (margins); larger means more likely positive.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError>;

    /// Probability of the positive class, in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError>;

    /// Hard class predictions at the 0.5 probability threshold.
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Vec<bool>, FitError> {
        Ok(self.predict_proba(x)?.into_iter().map(|p| p >= 0.5).collect())
    }

    /// Importance capability of the fitted model, `None` when it has none.
    fn feature_weights(&self) -> Option<FeatureWeights>;

    fn name(&self) -> &str {
        "classifier"
    }
}
