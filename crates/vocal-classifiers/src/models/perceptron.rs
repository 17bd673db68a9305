//! Linear threshold unit trained with stochastic gradient steps on the perceptron loss.
//!
//! Samples are visited in a freshly shuffled order each epoch; the shuffle
//! stream is seeded, so fits are reproducible. Training stops early once the
//! epoch loss has failed to improve by `tol * n` for five consecutive epochs.
use log::trace;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{ModelType, Penalty};
use crate::error::FitError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::{ClassifierModel, FeatureWeights};
use crate::models::utils::{check_n_features, check_training_data, sigmoid};

const N_ITER_NO_CHANGE: usize = 5;

pub struct Perceptron {
    params: ModelType,
    seed: u64,
    coefficients: Vec<f64>,
    intercept: f64,
    n_epochs: usize,
    fitted: bool,
}

impl Perceptron {
    pub fn new(params: ModelType, seed: u64) -> Self {
        Perceptron {
            params,
            seed,
            coefficients: Vec::new(),
            intercept: 0.0,
            n_epochs: 0,
            fitted: false,
        }
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl ClassifierModel for Perceptron {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<bool>) -> Result<(), FitError> {
        let (alpha, penalty, l1_ratio, eta0, max_iter, tol) = match &self.params {
            ModelType::LinearThresholdUnit {
                alpha,
                penalty,
                l1_ratio,
                eta0,
                max_iter,
                tol,
            } => (*alpha, *penalty, *l1_ratio, *eta0, *max_iter, *tol),
            other => {
                return Err(FitError::Backend(format!(
                    "expected linear_threshold_unit parameters, got {}",
                    other.family()
                )))
            }
        };
        check_training_data(x, y)?;

        let l1_ratio = match penalty {
            Penalty::None => 0.0,
            Penalty::L1 => 1.0,
            Penalty::L2 => 0.0,
            Penalty::ElasticNet => l1_ratio,
        };
        let alpha = if penalty == Penalty::None { 0.0 } else { alpha };
        let shrink = 1.0 - eta0 * alpha * (1.0 - l1_ratio);
        let l1_step = eta0 * alpha * l1_ratio;

        let n = x.nrows();
        let signs: Vec<f64> = y.iter().map(|&v| if v { 1.0 } else { -1.0 }).collect();
        let mut w = vec![0.0; x.ncols()];
        let mut b = 0.0;
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0;
        self.n_epochs = 0;

        for epoch in 0..max_iter {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;
            for &i in &order {
                let margin = signs[i] * x.row_dot(i, &w, b);
                if shrink != 1.0 {
                    w.iter_mut().for_each(|wj| *wj *= shrink);
                }
                if margin <= 0.0 {
                    epoch_loss -= margin;
                    for (wj, xij) in w.iter_mut().zip(x.row_slice(i)) {
                        *wj += eta0 * signs[i] * xij;
                    }
                    b += eta0 * signs[i];
                }
                if l1_step > 0.0 {
                    for wj in w.iter_mut() {
                        *wj = wj.signum() * (wj.abs() - l1_step).max(0.0);
                    }
                }
            }
            self.n_epochs = epoch + 1;

            if !b.is_finite() || w.iter().any(|v| !v.is_finite()) {
                return Err(FitError::NonFinite("perceptron weights".to_string()));
            }
            if epoch_loss > best_loss - tol * n as f64 {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(epoch_loss);
            if no_improvement >= N_ITER_NO_CHANGE {
                break;
            }
        }
        trace!("perceptron stopped after {} epochs", self.n_epochs);

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

    /// Coefficients, unless the penalty drove every one of them to exactly zero.
    fn feature_weights(&self) -> Option<FeatureWeights> {
        if !self.fitted || self.coefficients.iter().all(|w| *w == 0.0) {
            return None;
        }
        Some(FeatureWeights::Coefficients(self.coefficients.clone()))
    }

    fn name(&self) -> &str {
        "linear_threshold_unit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelFamily;

    fn separable() -> (Array2<f64>, Array1<bool>) {
        let x = Array2::from_rows(vec![
            vec![2.0, 0.3],
            vec![1.5, -0.2],
            vec![1.0, 0.1],
            vec![-1.0, 0.2],
            vec![-1.5, -0.1],
            vec![-2.0, 0.0],
        ])
        .unwrap();
        let y = Array1::from_vec(vec![true, true, true, false, false, false]);
        (x, y)
    }

    #[test]
    fn learns_a_separating_hyperplane() {
        let (x, y) = separable();
        let mut model = Perceptron::new(ModelType::default_for(ModelFamily::LinearThresholdUnit), 7);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict_labels(&x).unwrap(), y.to_vec());
        let w = model.feature_weights().unwrap();
        assert!(w.values()[0] > 0.0);
    }

    #[test]
    fn same_seed_gives_identical_weights() {
        let (x, y) = separable();
        let params = ModelType::LinearThresholdUnit {
            alpha: 0.001,
            penalty: Penalty::ElasticNet,
            l1_ratio: 0.15,
            eta0: 1.0,
            max_iter: 50,
            tol: 1e-3,
        };
        let mut a = Perceptron::new(params.clone(), 11);
        let mut b = Perceptron::new(params, 11);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.feature_weights(), b.feature_weights());
        assert_eq!(a.intercept(), b.intercept());
    }

    #[test]
    fn all_zero_weights_expose_no_capability() {
        let (x, y) = separable();
        // The L1 step wipes out every update immediately.
        let params = ModelType::LinearThresholdUnit {
            alpha: 100.0,
            penalty: Penalty::L1,
            l1_ratio: 0.15,
            eta0: 1.0,
            max_iter: 10,
            tol: 1e-3,
        };
        let mut model = Perceptron::new(params, 3);
        model.fit(&x, &y).unwrap();
        assert!(model.feature_weights().is_none());
    }
}
