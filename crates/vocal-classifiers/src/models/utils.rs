//! Helpers shared by the model implementations.
use crate::error::FitError;
use crate::math::{Array1, Array2};

/// Logistic function, stable for large |z|.
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Log-odds of `p`, with `p` clamped away from 0 and 1.
#[inline]
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-12, 1.0 - 1e-12);
    (p / (1.0 - p)).ln()
}

/// Validate a training set and return the number of positive samples.
pub fn check_training_data(x: &Array2<f64>, y: &Array1<bool>) -> Result<usize, FitError> {
    if x.nrows() == 0 || y.is_empty() {
        return Err(FitError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(FitError::DimensionMismatch {
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if !x.all_finite() {
        return Err(FitError::NonFinite("training features".to_string()));
    }
    let n_pos = y.count_true();
    if n_pos == 0 || n_pos == y.len() {
        return Err(FitError::SingleClass);
    }
    Ok(n_pos)
}

/// Check that a prediction matrix has the number of features seen during fit.
pub fn check_n_features(x: &Array2<f64>, expected: usize) -> Result<(), FitError> {
    if x.ncols() != expected {
        return Err(FitError::DimensionMismatch {
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}

/// Labels as {0, 1} targets.
pub fn targets(y: &Array1<bool>) -> Vec<f64> {
    y.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect()
}

/// Copy into an `ndarray` matrix for the linfa solvers.
#[cfg(feature = "svm")]
pub fn to_ndarray(x: &Array2<f64>) -> Result<ndarray::Array2<f64>, FitError> {
    ndarray::Array2::from_shape_vec(x.shape(), x.to_vec())
        .map_err(|e| FitError::Backend(e.to_string()))
}
