use std::error::Error;
use std::fmt;

/// Failure of a single fit/predict/score cell.
///
/// These are absorbed by the cross-validation loop: the fold is marked as
/// undefined and excluded from the mean.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Training labels contain only one class.
    SingleClass,
    EmptyTrainingSet,
    DimensionMismatch { expected: usize, found: usize },
    NotFitted,
    /// Optimisation produced NaN or infinite parameters.
    NonFinite(String),
    /// Error reported by an external solver.
    Backend(String),
    /// The evaluation metric is not defined on this fold (e.g. one class only).
    UndefinedMetric(String),
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FitError::SingleClass => write!(f, "training labels contain a single class"),
            FitError::EmptyTrainingSet => write!(f, "training set is empty"),
            FitError::DimensionMismatch { expected, found } => write!(
                f,
                "expected {} features but received {}",
                expected, found
            ),
            FitError::NotFitted => write!(f, "model has not been fitted"),
            FitError::NonFinite(what) => write!(f, "non-finite values in {}", what),
            FitError::Backend(msg) => write!(f, "solver error: {}", msg),
            FitError::UndefinedMetric(msg) => write!(f, "metric undefined: {}", msg),
        }
    }
}

impl Error for FitError {}

/// Errors surfaced by the selection pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// Invalid fold count, sample count, grid, dataset or pipeline setting.
    Configuration(String),
    /// Every hyperparameter point failed on every fold.
    NoViableModel { model: String, points_tried: usize },
    /// The estimator exposes neither split-gain importance nor coefficients.
    UnsupportedCapability { model: String, capability: String },
    /// Refitting an already selected point on the full dataset failed.
    Fit { model: String, source: FitError },
    Cancelled,
}

impl SelectionError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        SelectionError::Configuration(msg.into())
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SelectionError::NoViableModel { model, points_tried } => write!(
                f,
                "no viable model for '{}': all {} hyperparameter point(s) failed on every fold",
                model, points_tried
            ),
            SelectionError::UnsupportedCapability { model, capability } => write!(
                f,
                "'{}' does not support {}",
                model, capability
            ),
            SelectionError::Fit { model, source } => {
                write!(f, "refitting '{}' on the full dataset failed: {}", model, source)
            }
            SelectionError::Cancelled => write!(f, "evaluation cancelled"),
        }
    }
}

impl Error for SelectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SelectionError::Fit { source, .. } => Some(source),
            _ => None,
        }
    }
}
