//! Pipeline configuration: model families, hyperparameter schema and grids.
//!
//! Everything the orchestrator needs is carried by [`PipelineConfig`], which
//! deserializes from JSON. Grids keep their declared key order so that grid
//! enumeration (and therefore tie-breaking) is reproducible.
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SelectionError;
use crate::models::classifier_trait::ImportanceKind;

/// Supported model families.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    GradientBoostedTrees,
    KernelSvm,
    RegularizedLinear,
    LinearThresholdUnit,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::GradientBoostedTrees,
        ModelFamily::KernelSvm,
        ModelFamily::RegularizedLinear,
        ModelFamily::LinearThresholdUnit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::GradientBoostedTrees => "gradient_boosted_trees",
            ModelFamily::KernelSvm => "kernel_svm",
            ModelFamily::RegularizedLinear => "regularized_linear",
            ModelFamily::LinearThresholdUnit => "linear_threshold_unit",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "gradient_boosted_trees" | "gbdt" | "xgboost" | "gbt" => {
                Ok(ModelFamily::GradientBoostedTrees)
            }
            "kernel_svm" | "svm" | "svc" => Ok(ModelFamily::KernelSvm),
            "regularized_linear" | "logreg" | "logistic_regression" | "logistic" => {
                Ok(ModelFamily::RegularizedLinear)
            }
            "linear_threshold_unit" | "perceptron" | "ltu" => {
                Ok(ModelFamily::LinearThresholdUnit)
            }
            _ => Err(format!(
                "Unknown model family: {}. Valid options are: gradient_boosted_trees, kernel_svm, regularized_linear, linear_threshold_unit",
                s
            )),
        }
    }
}

/// One candidate value of a hyperparameter.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Non-negative integers; floats are accepted when they hold an integral value.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            ParamValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Ordered name/value pairs, serialized as a JSON object in insertion order.
fn serialize_pairs<S, V>(pairs: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (name, value) in pairs {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

struct OrderedPairsVisitor<V>(std::marker::PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedPairsVisitor<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of hyperparameter names")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            pairs.push((name, value));
        }
        Ok(pairs)
    }
}

/// A hyperparameter grid: each axis is a name plus its ordered candidate values.
///
/// Points are enumerated in declared axis order with the last axis varying
/// fastest. An empty grid has exactly one point (the family defaults).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis; builder style.
    pub fn with<V: Into<ParamValue>>(mut self, name: &str, values: Vec<V>) -> Self {
        self.axes
            .push((name.to_string(), values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn axes(&self) -> &[(String, Vec<ParamValue>)] {
        &self.axes
    }

    /// Number of points in the Cartesian product.
    pub fn n_points(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    /// Enumerate every point of the grid in odometer order.
    pub fn points(&self) -> Result<Vec<HyperparameterPoint>, SelectionError> {
        let mut seen = HashSet::new();
        for (name, values) in &self.axes {
            if !seen.insert(name.as_str()) {
                return Err(SelectionError::configuration(format!(
                    "hyperparameter '{}' appears twice in the grid",
                    name
                )));
            }
            if values.is_empty() {
                return Err(SelectionError::configuration(format!(
                    "hyperparameter '{}' has no candidate values",
                    name
                )));
            }
        }

        let mut points = Vec::with_capacity(self.n_points());
        let mut cursor = vec![0usize; self.axes.len()];
        loop {
            points.push(HyperparameterPoint {
                values: self
                    .axes
                    .iter()
                    .zip(&cursor)
                    .map(|((name, values), &i)| (name.clone(), values[i].clone()))
                    .collect(),
            });

            // Advance the odometer from the last axis.
            let mut axis = self.axes.len();
            loop {
                if axis == 0 {
                    return Ok(points);
                }
                axis -= 1;
                cursor[axis] += 1;
                if cursor[axis] < self.axes[axis].1.len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }
    }
}

impl Serialize for ParamGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.axes, serializer)
    }
}

impl<'de> Deserialize<'de> for ParamGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let axes = deserializer.deserialize_map(OrderedPairsVisitor(std::marker::PhantomData))?;
        Ok(ParamGrid { axes })
    }
}

/// One concrete assignment of values to the grid's hyperparameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HyperparameterPoint {
    values: Vec<(String, ParamValue)>,
}

impl HyperparameterPoint {
    pub fn new(values: Vec<(String, ParamValue)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn values(&self) -> &[(String, ParamValue)] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for HyperparameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "(defaults)");
        }
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

impl Serialize for HyperparameterPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.values, serializer)
    }
}

impl<'de> Deserialize<'de> for HyperparameterPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values =
            deserializer.deserialize_map(OrderedPairsVisitor(std::marker::PhantomData))?;
        Ok(HyperparameterPoint { values })
    }
}

/// SVM kernels.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    Rbf,
    Poly,
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Kernel::Linear),
            "rbf" | "gauss" | "gaussian" => Ok(Kernel::Rbf),
            "poly" | "polynomial" => Ok(Kernel::Poly),
            _ => Err(format!(
                "Unsupported kernel type: {}. Valid options are: linear, rbf, poly",
                s
            )),
        }
    }
}

/// Weight penalties for the linear families.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    None,
    L1,
    L2,
    ElasticNet,
}

impl FromStr for Penalty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Penalty::None),
            "l1" => Ok(Penalty::L1),
            "l2" => Ok(Penalty::L2),
            "elasticnet" | "elastic_net" => Ok(Penalty::ElasticNet),
            _ => Err(format!(
                "Unsupported penalty: {}. Valid options are: none, l1, l2, elasticnet",
                s
            )),
        }
    }
}

/// Fully resolved hyperparameters of one model family.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelType {
    GradientBoostedTrees {
        n_estimators: usize,
        max_depth: usize,
        learning_rate: f64,
        min_child_weight: f64,
        reg_lambda: f64,
    },
    KernelSvm {
        c: f64,
        kernel: Kernel,
        gamma: f64,
        degree: f64,
        coef0: f64,
        eps: f64,
    },
    RegularizedLinear {
        c: f64,
        penalty: Penalty,
        max_iter: usize,
        tol: f64,
    },
    LinearThresholdUnit {
        alpha: f64,
        penalty: Penalty,
        l1_ratio: f64,
        eta0: f64,
        max_iter: usize,
        tol: f64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::default_for(ModelFamily::GradientBoostedTrees)
    }
}

impl ModelType {
    pub fn default_for(family: ModelFamily) -> Self {
        match family {
            ModelFamily::GradientBoostedTrees => ModelType::GradientBoostedTrees {
                n_estimators: 100,
                max_depth: 6,
                learning_rate: 0.3,
                min_child_weight: 1.0,
                reg_lambda: 1.0,
            },
            ModelFamily::KernelSvm => ModelType::KernelSvm {
                c: 1.0,
                kernel: Kernel::Rbf,
                gamma: 0.1,
                degree: 3.0,
                coef0: 1.0,
                eps: 1e-3,
            },
            ModelFamily::RegularizedLinear => ModelType::RegularizedLinear {
                c: 1.0,
                penalty: Penalty::L2,
                max_iter: 5000,
                tol: 1e-4,
            },
            ModelFamily::LinearThresholdUnit => ModelType::LinearThresholdUnit {
                alpha: 1e-4,
                penalty: Penalty::None,
                l1_ratio: 0.15,
                eta0: 1.0,
                max_iter: 1000,
                tol: 1e-3,
            },
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelType::GradientBoostedTrees { .. } => ModelFamily::GradientBoostedTrees,
            ModelType::KernelSvm { .. } => ModelFamily::KernelSvm,
            ModelType::RegularizedLinear { .. } => ModelFamily::RegularizedLinear,
            ModelType::LinearThresholdUnit { .. } => ModelFamily::LinearThresholdUnit,
        }
    }

    /// Which importance concept a model of this configuration exposes.
    pub fn importance_kind(&self) -> Option<ImportanceKind> {
        match self {
            ModelType::GradientBoostedTrees { .. } => Some(ImportanceKind::SplitGain),
            ModelType::KernelSvm { kernel, .. } => match kernel {
                Kernel::Linear => Some(ImportanceKind::Coefficients),
                Kernel::Rbf | Kernel::Poly => None,
            },
            ModelType::RegularizedLinear { .. } | ModelType::LinearThresholdUnit { .. } => {
                Some(ImportanceKind::Coefficients)
            }
        }
    }

    /// Overlay a grid point onto the family defaults.
    pub fn from_point(
        family: ModelFamily,
        point: &HyperparameterPoint,
    ) -> Result<Self, SelectionError> {
        let mut model_type = ModelType::default_for(family);
        for (name, value) in point.values() {
            model_type.set(name, value)?;
        }
        model_type.validate()?;
        Ok(model_type)
    }

    fn set(&mut self, name: &str, value: &ParamValue) -> Result<(), SelectionError> {
        let family = self.family();
        let bad_value = |expected: &str| {
            SelectionError::configuration(format!(
                "{}: '{}' expects {}, got '{}'",
                family, name, expected, value
            ))
        };
        let float = || value.as_f64().ok_or_else(|| bad_value("a number"));
        let count = || value.as_usize().ok_or_else(|| bad_value("a non-negative integer"));
        let text = || value.as_str().ok_or_else(|| bad_value("a string"));

        match (self, name) {
            (ModelType::GradientBoostedTrees { n_estimators, .. }, "n_estimators") => {
                *n_estimators = count()?
            }
            (ModelType::GradientBoostedTrees { max_depth, .. }, "max_depth") => {
                *max_depth = count()?
            }
            (ModelType::GradientBoostedTrees { learning_rate, .. }, "learning_rate" | "eta") => {
                *learning_rate = float()?
            }
            (ModelType::GradientBoostedTrees { min_child_weight, .. }, "min_child_weight") => {
                *min_child_weight = float()?
            }
            (ModelType::GradientBoostedTrees { reg_lambda, .. }, "reg_lambda" | "lambda") => {
                *reg_lambda = float()?
            }

            (ModelType::KernelSvm { c, .. }, "c" | "C") => *c = float()?,
            (ModelType::KernelSvm { kernel, .. }, "kernel") => {
                *kernel = text()?.parse().map_err(SelectionError::Configuration)?
            }
            (ModelType::KernelSvm { gamma, .. }, "gamma") => *gamma = float()?,
            (ModelType::KernelSvm { degree, .. }, "degree") => *degree = float()?,
            (ModelType::KernelSvm { coef0, .. }, "coef0") => *coef0 = float()?,
            (ModelType::KernelSvm { eps, .. }, "eps" | "tol") => *eps = float()?,

            (ModelType::RegularizedLinear { c, .. }, "c" | "C") => *c = float()?,
            (ModelType::RegularizedLinear { penalty, .. }, "penalty") => {
                *penalty = text()?.parse().map_err(SelectionError::Configuration)?
            }
            (ModelType::RegularizedLinear { max_iter, .. }, "max_iter") => *max_iter = count()?,
            (ModelType::RegularizedLinear { tol, .. }, "tol") => *tol = float()?,

            (ModelType::LinearThresholdUnit { alpha, .. }, "alpha") => *alpha = float()?,
            (ModelType::LinearThresholdUnit { penalty, .. }, "penalty") => {
                *penalty = text()?.parse().map_err(SelectionError::Configuration)?
            }
            (ModelType::LinearThresholdUnit { l1_ratio, .. }, "l1_ratio") => {
                *l1_ratio = float()?
            }
            (ModelType::LinearThresholdUnit { eta0, .. }, "eta0") => *eta0 = float()?,
            (ModelType::LinearThresholdUnit { max_iter, .. }, "max_iter") => {
                *max_iter = count()?
            }
            (ModelType::LinearThresholdUnit { tol, .. }, "tol") => *tol = float()?,

            _ => {
                return Err(SelectionError::configuration(format!(
                    "unknown hyperparameter '{}' for {}",
                    name, family
                )))
            }
        }
        Ok(())
    }

    /// Range checks shared by grid resolution and direct construction.
    pub fn validate(&self) -> Result<(), SelectionError> {
        let family = self.family();
        let check = |ok: bool, what: &str| {
            if ok {
                Ok(())
            } else {
                Err(SelectionError::configuration(format!("{}: {}", family, what)))
            }
        };
        match self {
            ModelType::GradientBoostedTrees {
                n_estimators,
                max_depth,
                learning_rate,
                min_child_weight,
                reg_lambda,
            } => {
                check(*n_estimators >= 1, "n_estimators must be at least 1")?;
                check(*max_depth >= 1, "max_depth must be at least 1")?;
                check(*learning_rate > 0.0, "learning_rate must be positive")?;
                check(*min_child_weight >= 0.0, "min_child_weight must be non-negative")?;
                check(*reg_lambda >= 0.0, "reg_lambda must be non-negative")
            }
            ModelType::KernelSvm {
                c,
                gamma,
                degree,
                eps,
                ..
            } => {
                check(cfg!(feature = "svm"), "built without the `svm` feature")?;
                check(*c > 0.0, "c must be positive")?;
                check(*gamma > 0.0, "gamma must be positive")?;
                check(*degree >= 1.0, "degree must be at least 1")?;
                check(*eps > 0.0, "eps must be positive")
            }
            ModelType::RegularizedLinear {
                c,
                penalty,
                max_iter,
                tol,
            } => {
                check(*c > 0.0, "c must be positive")?;
                check(
                    matches!(penalty, Penalty::L1 | Penalty::L2),
                    "penalty must be l1 or l2",
                )?;
                check(*max_iter >= 1, "max_iter must be at least 1")?;
                check(*tol > 0.0, "tol must be positive")
            }
            ModelType::LinearThresholdUnit {
                alpha,
                l1_ratio,
                eta0,
                max_iter,
                tol,
                ..
            } => {
                check(*alpha >= 0.0, "alpha must be non-negative")?;
                check((0.0..=1.0).contains(l1_ratio), "l1_ratio must lie in [0, 1]")?;
                check(*eta0 > 0.0, "eta0 must be positive")?;
                check(*max_iter >= 1, "max_iter must be at least 1")?;
                check(*tol >= 0.0, "tol must be non-negative")
            }
        }
    }
}

/// A named model family plus the grid it is searched over.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub family: ModelFamily,
    #[serde(default)]
    pub grid: ParamGrid,
}

impl ModelSpec {
    pub fn new(name: &str, family: ModelFamily, grid: ParamGrid) -> Self {
        Self {
            name: name.to_string(),
            family,
            grid,
        }
    }

    /// Every grid point paired with its resolved hyperparameters, in enumeration order.
    pub fn resolve_points(&self) -> Result<Vec<(HyperparameterPoint, ModelType)>, SelectionError> {
        self.grid
            .points()?
            .into_iter()
            .map(|point| {
                let model_type = ModelType::from_point(self.family, &point).map_err(|e| match e {
                    SelectionError::Configuration(msg) => {
                        SelectionError::Configuration(format!("model '{}': {}", self.name, msg))
                    }
                    other => other,
                })?;
                Ok((point, model_type))
            })
            .collect()
    }
}

/// Everything one comparison run needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub k_folds: usize,
    pub seed: u64,
    pub top_n_features: usize,
    /// Standardize feature columns before evaluation.
    pub scale_features: bool,
    pub parallel: bool,
    /// Size of a dedicated worker pool; `None` uses the global rayon pool.
    pub n_threads: Option<usize>,
    pub models: Vec<ModelSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            k_folds: 5,
            seed: 41,
            top_n_features: 5,
            scale_features: true,
            parallel: true,
            n_threads: None,
            models: default_model_specs(),
        }
    }
}

impl PipelineConfig {
    /// Load a pipeline configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.k_folds < 2 {
            return Err(SelectionError::configuration(format!(
                "k_folds must be at least 2, got {}",
                self.k_folds
            )));
        }
        if self.top_n_features == 0 {
            return Err(SelectionError::configuration("top_n_features must be at least 1"));
        }
        if self.n_threads == Some(0) {
            return Err(SelectionError::configuration("n_threads must be at least 1"));
        }
        if self.models.is_empty() {
            return Err(SelectionError::configuration("no model specifications given"));
        }
        let mut names = HashSet::new();
        for spec in &self.models {
            if !names.insert(spec.name.as_str()) {
                return Err(SelectionError::configuration(format!(
                    "duplicate model name '{}'",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

/// The four model families and grids compared by default.
pub fn default_model_specs() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new(
            "XGBoost",
            ModelFamily::GradientBoostedTrees,
            ParamGrid::new()
                .with("n_estimators", vec![50i64, 100, 200])
                .with("max_depth", vec![3i64, 5, 9]),
        ),
        ModelSpec::new(
            "SVM",
            ModelFamily::KernelSvm,
            ParamGrid::new()
                .with("c", vec![0.01, 0.1, 1.0, 10.0])
                .with("gamma", vec![0.001, 0.01, 0.1, 1.0])
                .with("kernel", vec!["linear", "rbf"]),
        ),
        ModelSpec::new(
            "Logistic Regression",
            ModelFamily::RegularizedLinear,
            ParamGrid::new()
                .with("c", vec![0.1, 1.0, 10.0])
                .with("penalty", vec!["l1", "l2"]),
        ),
        ModelSpec::new(
            "Perceptron",
            ModelFamily::LinearThresholdUnit,
            ParamGrid::new()
                .with("alpha", vec![0.0001, 0.001, 0.1])
                .with("penalty", vec!["l1", "l2", "elasticnet"]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "svm"))]
    #[test]
    fn kernel_svm_without_backend_is_a_configuration_error() {
        let spec = ModelSpec::new("SVM", ModelFamily::KernelSvm, ParamGrid::new());
        match spec.resolve_points() {
            Err(SelectionError::Configuration(msg)) => assert!(msg.contains("svm")),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[cfg(feature = "svm")]
    #[test]
    fn kernel_svm_resolves_with_backend() {
        let spec = ModelSpec::new("SVM", ModelFamily::KernelSvm, ParamGrid::new());
        assert_eq!(spec.resolve_points().unwrap().len(), 1);
    }

    #[test]
    fn grid_enumerates_last_axis_fastest() {
        let grid = ParamGrid::new()
            .with("a", vec![1i64, 2])
            .with("b", vec!["x", "y", "z"]);
        let points = grid.points().unwrap();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].to_string(), "a=1, b=x");
        assert_eq!(points[1].to_string(), "a=1, b=y");
        assert_eq!(points[3].to_string(), "a=2, b=x");
    }

    #[test]
    fn empty_grid_has_a_single_default_point() {
        let points = ParamGrid::new().points().unwrap();
        assert_eq!(points.len(), 1);
        assert!(points[0].is_empty());
    }

    #[test]
    fn empty_axis_is_rejected() {
        let grid = ParamGrid::new().with::<i64>("max_depth", vec![]);
        assert!(matches!(grid.points(), Err(SelectionError::Configuration(_))));
    }

    #[test]
    fn unknown_hyperparameter_is_rejected() {
        let point = HyperparameterPoint::new(vec![("depth".to_string(), ParamValue::Int(3))]);
        let err = ModelType::from_point(ModelFamily::GradientBoostedTrees, &point).unwrap_err();
        assert!(err.to_string().contains("unknown hyperparameter 'depth'"));
    }

    #[test]
    fn integer_values_are_accepted_for_float_parameters() {
        let point = HyperparameterPoint::new(vec![("c".to_string(), ParamValue::Int(10))]);
        match ModelType::from_point(ModelFamily::RegularizedLinear, &point).unwrap() {
            ModelType::RegularizedLinear { c, .. } => assert_eq!(c, 10.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn logistic_penalty_must_be_l1_or_l2() {
        let point =
            HyperparameterPoint::new(vec![("penalty".to_string(), ParamValue::from("elasticnet"))]);
        assert!(ModelType::from_point(ModelFamily::RegularizedLinear, &point).is_err());
    }

    #[test]
    fn grid_json_keeps_declared_order() {
        let json = r#"{"n_estimators": [50, 100], "max_depth": [9, 3], "learning_rate": [0.1]}"#;
        let grid: ParamGrid = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = grid.axes().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["n_estimators", "max_depth", "learning_rate"]);
        assert_eq!(grid.axes()[1].1, vec![ParamValue::Int(9), ParamValue::Int(3)]);
    }

    #[test]
    fn svm_capability_depends_on_kernel() {
        let rbf = ModelType::default_for(ModelFamily::KernelSvm);
        assert_eq!(rbf.importance_kind(), None);
        let point =
            HyperparameterPoint::new(vec![("kernel".to_string(), ParamValue::from("linear"))]);
        let linear = ModelType::from_point(ModelFamily::KernelSvm, &point).unwrap();
        assert_eq!(linear.importance_kind(), Some(ImportanceKind::Coefficients));
    }

    #[test]
    fn default_config_validates() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        for spec in &cfg.models {
            assert!(spec.resolve_points().is_ok(), "grid of {} should resolve", spec.name);
        }
    }
}
