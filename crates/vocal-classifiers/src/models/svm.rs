use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};

use crate::config::{Kernel, ModelType};
use crate::error::FitError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::{ClassifierModel, FeatureWeights};
use crate::models::utils::{check_n_features, check_training_data, to_ndarray};

/// Support vector classifier with Platt-calibrated outputs (linfa-svm).
pub struct SVMClassifier {
    model: Option<Svm<f64, Pr>>,
    params: ModelType,
    n_features: usize,
    coefficients: Option<Vec<f64>>,
}

impl SVMClassifier {
    pub fn new(params: ModelType) -> Self {
        SVMClassifier {
            model: None,
            params,
            n_features: 0,
            coefficients: None,
        }
    }

    fn solver_params(&self) -> Result<(SvmParams<f64, Pr>, Kernel), FitError> {
        match &self.params {
            ModelType::KernelSvm {
                c,
                kernel,
                gamma,
                degree,
                coef0,
                eps,
            } => {
                let params = Svm::<f64, Pr>::params().eps(*eps).pos_neg_weights(*c, *c);
                let params = match kernel {
                    Kernel::Linear => params.linear_kernel(),
                    // linfa's gaussian kernel is exp(-|x - y|^2 / eps)
                    Kernel::Rbf => params.gaussian_kernel(1.0 / *gamma),
                    Kernel::Poly => params.polynomial_kernel(*coef0, *degree),
                };
                Ok((params, *kernel))
            }
            other => Err(FitError::Backend(format!(
                "expected kernel_svm parameters, got {}",
                other.family()
            ))),
        }
    }

    fn probabilities(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        let model = self.model.as_ref().ok_or(FitError::NotFitted)?;
        check_n_features(x, self.n_features)?;
        let records = to_ndarray(x)?;
        let predictions: ndarray::Array1<Pr> = model.predict(&records);
        Ok(predictions.iter().map(|p| **p as f64).collect())
    }

    /// Signed distance to the separating surface, `weighted_sum - rho`.
    ///
    /// Positive values are predicted positive; the Platt output is a monotone
    /// f32 map of this value.
    fn decision_values(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        let model = self.model.as_ref().ok_or(FitError::NotFitted)?;
        check_n_features(x, self.n_features)?;
        let records = to_ndarray(x)?;
        Ok(records
            .outer_iter()
            .map(|row| model.weighted_sum(&row) - model.rho)
            .collect())
    }

    /// Primal weights `w` of a linear-kernel model, read from its decision function.
    ///
    /// The decision value is `w . x - rho`, so `w_j` is the value at the unit
    /// vector `e_j` minus the value at the origin.
    fn linear_coefficients(&self) -> Result<Vec<f64>, FitError> {
        let d = self.n_features;
        let mut basis = vec![0.0; (d + 1) * d];
        for j in 0..d {
            basis[(j + 1) * d + j] = 1.0;
        }
        let basis = Array2::from_shape_vec((d + 1, d), basis)
            .map_err(|e| FitError::Backend(e.to_string()))?;
        let values = self.decision_values(&basis)?;
        let origin = values[0];
        Ok(values[1..].iter().map(|v| v - origin).collect())
    }
}

impl ClassifierModel for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<bool>) -> Result<(), FitError> {
        let (params, kernel) = self.solver_params()?;
        check_training_data(x, y)?;

        let records = to_ndarray(x)?;
        let targets = ndarray::Array1::from_vec(y.to_vec());
        let dataset = Dataset::new(records, targets);

        let model = params
            .fit(&dataset)
            .map_err(|e| FitError::Backend(e.to_string()))?;
        self.model = Some(model);
        self.n_features = x.ncols();
        self.coefficients = match kernel {
            Kernel::Linear => Some(self.linear_coefficients()?),
            Kernel::Rbf | Kernel::Poly => None,
        };
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        self.decision_values(x)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        self.probabilities(x)
    }

    fn feature_weights(&self) -> Option<FeatureWeights> {
        self.coefficients.clone().map(FeatureWeights::Coefficients)
    }

    fn name(&self) -> &str {
        "kernel_svm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelFamily;

    fn blobs() -> (Array2<f64>, Array1<bool>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let positive = i % 2 == 0;
            let s = if positive { 1.5 } else { -1.5 };
            let offset = ((i * 5) % 7) as f64 * 0.1 - 0.3;
            rows.push(vec![s + offset, offset, -0.5 * s + offset]);
            labels.push(positive);
        }
        (Array2::from_rows(rows).unwrap(), Array1::from_vec(labels))
    }

    fn linear(c: f64) -> ModelType {
        ModelType::KernelSvm {
            c,
            kernel: Kernel::Linear,
            gamma: 0.1,
            degree: 3.0,
            coef0: 1.0,
            eps: 1e-3,
        }
    }

    #[test]
    fn test_svm_classifier() {
        let (x, y) = blobs();
        let mut model = SVMClassifier::new(linear(1.0));
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), 30);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        let auc = crate::stats::roc_auc(&proba, y.as_slice()).unwrap();
        assert!(auc > 0.95, "auc {}", auc);
    }

    #[test]
    fn linear_kernel_exposes_signed_coefficients() {
        let (x, y) = blobs();
        let mut model = SVMClassifier::new(linear(1.0));
        model.fit(&x, &y).unwrap();
        let w = model.feature_weights().unwrap();
        assert!(w.values()[0] > 0.0);
        assert!(w.values()[2] < 0.0);
    }

    #[test]
    fn linear_coefficients_reproduce_the_decision_function() {
        let (x, y) = blobs();
        let mut model = SVMClassifier::new(linear(1.0));
        model.fit(&x, &y).unwrap();
        let w = model.feature_weights().unwrap();
        let origin = Array2::from_shape_vec((1, 3), vec![0.0; 3]).unwrap();
        let offset = model.predict(&origin).unwrap()[0];
        let margins = model.predict(&x).unwrap();
        for (i, margin) in margins.iter().enumerate() {
            let expected = x.row_dot(i, w.values(), offset);
            assert!((margin - expected).abs() < 1e-9, "{} vs {}", margin, expected);
        }
    }

    #[test]
    fn decision_values_order_like_probabilities() {
        let (x, y) = blobs();
        let mut model = SVMClassifier::new(linear(1.0));
        model.fit(&x, &y).unwrap();
        let margins = model.predict(&x).unwrap();
        let labels = model.predict_labels(&x).unwrap();
        for (m, (&label, &truth)) in margins.iter().zip(labels.iter().zip(y.iter())) {
            assert_eq!(*m > 0.0, truth, "margin {}", m);
            assert_eq!(label, truth);
        }
    }

    #[test]
    fn rbf_kernel_exposes_nothing() {
        let (x, y) = blobs();
        let mut model = SVMClassifier::new(ModelType::default_for(ModelFamily::KernelSvm));
        model.fit(&x, &y).unwrap();
        assert!(model.feature_weights().is_none());
    }
}
