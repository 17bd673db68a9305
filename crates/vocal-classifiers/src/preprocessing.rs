//! Per-column standardization of the feature matrix.
//!
//! The scaler is fitted on the full table before the selection pipeline
//! runs, which is how the features are prepared for comparison.
use serde::Serialize;

use crate::math::{Array2, ShapeError};

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Columns with a smaller spread are only centered.
    const MIN_STD: f64 = 1e-12;
}

/// Fit a `Scaler` on `x` (rows are samples, columns are features).
pub fn fit_scaler(x: &Array2<f64>) -> Scaler {
    let (nrows, ncols) = x.shape();
    let n = nrows.max(1) as f64;

    let mut mean = Vec::with_capacity(ncols);
    let mut std = Vec::with_capacity(ncols);
    for col in 0..ncols {
        let values = x.column(col);
        let m = values.mean().unwrap_or(0.0);
        let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n;
        let sd = var.sqrt();
        mean.push(m);
        std.push(if sd < Scaler::MIN_STD { 1.0 } else { sd });
    }

    Scaler { mean, std }
}

/// Apply `sc` to every row of `x`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>, ShapeError> {
    let (nrows, ncols) = x.shape();
    if sc.mean.len() != ncols {
        return Err(ShapeError::Length {
            rows: 1,
            cols: ncols,
            len: sc.mean.len(),
        });
    }
    let mut out = Vec::with_capacity(nrows * ncols);
    for row in x.rows() {
        for ((v, m), s) in row.iter().zip(&sc.mean).zip(&sc.std) {
            out.push((v - m) / s);
        }
    }
    Array2::from_shape_vec((nrows, ncols), out)
}

/// Fit a scaler on `x` and return the transformed matrix with it.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Array2<f64>, Scaler), ShapeError> {
    let sc = fit_scaler(x);
    let scaled = transform_all(x, &sc)?;
    Ok((scaled, sc))
}
