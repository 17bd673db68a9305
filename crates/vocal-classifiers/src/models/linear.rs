//! L1/L2-regularized logistic regression.
//!
//! Minimizes `mean(log_loss) + penalty(w) / (C * n)` with accelerated proximal
//! gradient descent (FISTA with gradient restarts). The intercept is not
//! penalized. The L1 penalty is handled by soft-thresholding, the L2 penalty
//! (`0.5 * |w|^2`) is part of the smooth term.
use log::trace;

use crate::config::{ModelType, Penalty};
use crate::error::FitError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::{ClassifierModel, FeatureWeights};
use crate::models::utils::{check_n_features, check_training_data, sigmoid, targets};

#[derive(Debug, Clone, Copy)]
struct SolverParams {
    c: f64,
    penalty: Penalty,
    max_iter: usize,
    tol: f64,
}

pub struct LogisticRegression {
    params: ModelType,
    coefficients: Vec<f64>,
    intercept: f64,
    n_iter: usize,
    fitted: bool,
}

impl LogisticRegression {
    pub fn new(params: ModelType) -> Self {
        LogisticRegression {
            params,
            coefficients: Vec::new(),
            intercept: 0.0,
            n_iter: 0,
            fitted: false,
        }
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Iterations used by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn solver_params(&self) -> Result<SolverParams, FitError> {
        match &self.params {
            ModelType::RegularizedLinear {
                c,
                penalty,
                max_iter,
                tol,
            } => Ok(SolverParams {
                c: *c,
                penalty: *penalty,
                max_iter: *max_iter,
                tol: *tol,
            }),
            other => Err(FitError::Backend(format!(
                "expected regularized_linear parameters, got {}",
                other.family()
            ))),
        }
    }
}

/// Gradient of the mean log loss (plus the L2 term) at `(w, b)`.
fn smooth_gradient(
    x: &Array2<f64>,
    y: &[f64],
    w: &[f64],
    b: f64,
    l2: f64,
    grad_w: &mut [f64],
) -> f64 {
    let n = x.nrows() as f64;
    grad_w.iter_mut().zip(w).for_each(|(g, wj)| *g = l2 * wj);
    let mut grad_b = 0.0;
    for (i, row) in x.rows().enumerate() {
        let residual = (sigmoid(x.row_dot(i, w, b)) - y[i]) / n;
        grad_b += residual;
        for (g, xij) in grad_w.iter_mut().zip(row) {
            *g += residual * xij;
        }
    }
    grad_b
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

impl ClassifierModel for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<bool>) -> Result<(), FitError> {
        let params = self.solver_params()?;
        check_training_data(x, y)?;
        let y = targets(y);
        let n = x.nrows() as f64;
        let d = x.ncols();

        let penalty_scale = 1.0 / (params.c * n);
        let l2 = if params.penalty == Penalty::L2 { penalty_scale } else { 0.0 };
        let l1 = if params.penalty == Penalty::L1 { penalty_scale } else { 0.0 };

        // Lipschitz bound of the smooth part, intercept column included.
        let frobenius: f64 = x.as_slice().iter().map(|v| v * v).sum::<f64>() + n;
        let lipschitz = 0.25 * frobenius / n + l2;
        let step = 1.0 / lipschitz;

        let mut w = vec![0.0; d];
        let mut b = 0.0;
        let mut z_w = w.clone();
        let mut z_b = b;
        let mut t: f64 = 1.0;
        let mut grad_w = vec![0.0; d];
        let mut w_next = vec![0.0; d];
        self.n_iter = params.max_iter;

        for iter in 0..params.max_iter {
            let grad_b = smooth_gradient(x, &y, &z_w, z_b, l2, &mut grad_w);
            for j in 0..d {
                w_next[j] = soft_threshold(z_w[j] - step * grad_w[j], step * l1);
            }
            let b_next = z_b - step * grad_b;

            let mut delta = (b_next - b).abs();
            let mut restart = (z_b - b_next) * (b_next - b);
            for j in 0..d {
                delta = delta.max((w_next[j] - w[j]).abs());
                restart += (z_w[j] - w_next[j]) * (w_next[j] - w[j]);
            }

            if restart > 0.0 {
                t = 1.0;
                z_w.copy_from_slice(&w_next);
                z_b = b_next;
            } else {
                let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
                let momentum = (t - 1.0) / t_next;
                for j in 0..d {
                    z_w[j] = w_next[j] + momentum * (w_next[j] - w[j]);
                }
                z_b = b_next + momentum * (b_next - b);
                t = t_next;
            }

            w.copy_from_slice(&w_next);
            b = b_next;

            if !b.is_finite() || w.iter().any(|v| !v.is_finite()) {
                return Err(FitError::NonFinite("logistic regression weights".to_string()));
            }
            if delta < params.tol {
                self.n_iter = iter + 1;
                break;
            }
        }
        trace!("logistic regression stopped after {} iterations", self.n_iter);

        self.coefficients = w;
        self.intercept = b;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        if !self.fitted {
            return Err(FitError::NotFitted);
        }
        check_n_features(x, self.coefficients.len())?;
        Ok((0..x.nrows())
            .map(|i| x.row_dot(i, &self.coefficients, self.intercept))
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        Ok(self.predict(x)?.into_iter().map(sigmoid).collect())
    }

    fn feature_weights(&self) -> Option<FeatureWeights> {
        if !self.fitted {
            return None;
        }
        Some(FeatureWeights::Coefficients(self.coefficients.clone()))
    }

    fn name(&self) -> &str {
        "regularized_linear"
    }
}
