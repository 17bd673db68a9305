pub mod gbdt;
pub mod linear;
pub mod perceptron;
#[cfg(feature = "svm")]
pub mod svm;
pub mod utils;

pub mod classifier_trait;
pub mod factory;

pub use classifier_trait::{ClassifierModel, FeatureWeights, ImportanceKind};
