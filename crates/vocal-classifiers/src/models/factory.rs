use crate::config::ModelType;
use crate::error::FitError;
use crate::models::classifier_trait::ClassifierModel;

/// Build an unfitted classifier for a resolved hyperparameter set.
///
/// `seed` feeds the families with a stochastic fit; the others ignore it.
pub fn build_model(
    params: &ModelType,
    seed: u64,
) -> Result<Box<dyn ClassifierModel>, FitError> {
    match params {
        ModelType::GradientBoostedTrees { .. } => Ok(Box::new(
            crate::models::gbdt::GBDTClassifier::new(params.clone()),
        )),

        #[cfg(feature = "svm")]
        ModelType::KernelSvm { .. } => Ok(Box::new(crate::models::svm::SVMClassifier::new(
            params.clone(),
        ))),
        #[cfg(not(feature = "svm"))]
        ModelType::KernelSvm { .. } => Err(FitError::Backend(
            "kernel_svm requires the `svm` feature".to_string(),
        )),

        ModelType::RegularizedLinear { .. } => Ok(Box::new(
            crate::models::linear::LogisticRegression::new(params.clone()),
        )),

        ModelType::LinearThresholdUnit { .. } => Ok(Box::new(
            crate::models::perceptron::Perceptron::new(params.clone(), seed),
        )),
    }
}
