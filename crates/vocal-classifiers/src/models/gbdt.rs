//! Gradient boosted regression trees on the logistic loss.
//!
//! Each round fits one tree to the gradient and hessian of the log loss
//! (second-order boosting with exact greedy splits). Leaf weights are
//! `-G / (H + lambda)` scaled by the learning rate. Split-gain importance is
//! the average gain of the splits made on each feature, normalized to sum to 1.
use log::trace;

use crate::config::ModelType;
use crate::error::FitError;
use crate::math::{Array1, Array2};
use crate::models::classifier_trait::{ClassifierModel, FeatureWeights};
use crate::models::utils::{check_n_features, check_training_data, logit, sigmoid, targets};

const MIN_HESSIAN: f64 = 1e-16;

#[derive(Debug, Clone, Copy)]
struct TreeParams {
    max_depth: usize,
    learning_rate: f64,
    min_child_weight: f64,
    reg_lambda: f64,
}

#[derive(Debug, Clone)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        weight: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Accumulated gain and split count per feature across the ensemble.
struct GainTally {
    gain: Vec<f64>,
    splits: Vec<usize>,
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn grow(
        x: &Array2<f64>,
        grad: &[f64],
        hess: &[f64],
        params: &TreeParams,
        tally: &mut GainTally,
    ) -> Self {
        let mut tree = RegressionTree { nodes: Vec::new() };
        let indices: Vec<usize> = (0..x.nrows()).collect();
        tree.build(x, grad, hess, indices, 0, params, tally);
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &mut self,
        x: &Array2<f64>,
        grad: &[f64],
        hess: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        tally: &mut GainTally,
    ) -> usize {
        let g: f64 = indices.iter().map(|&i| grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| hess[i]).sum();
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            weight: -g / (h + params.reg_lambda) * params.learning_rate,
        });

        if depth >= params.max_depth || indices.len() < 2 {
            return node_id;
        }
        let Some(split) = best_split(x, grad, hess, &indices, g, h, params) else {
            return node_id;
        };

        tally.gain[split.feature] += split.gain;
        tally.splits[split.feature] += 1;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[(i, split.feature)] < split.threshold);
        let left = self.build(x, grad, hess, left_idx, depth + 1, params, tally);
        let right = self.build(x, grad, hess, right_idx, depth + 1, params, tally);
        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { weight } => return *weight,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Exact greedy search over every feature and every boundary between distinct values.
fn best_split(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    indices: &[usize],
    g_total: f64,
    h_total: f64,
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let lambda = params.reg_lambda;
    let parent_score = g_total * g_total / (h_total + lambda);
    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..x.ncols() {
        sorted.sort_by(|&a, &b| x[(a, feature)].total_cmp(&x[(b, feature)]));
        let mut g_left = 0.0;
        let mut h_left = 0.0;
        for pos in 0..sorted.len() - 1 {
            let i = sorted[pos];
            g_left += grad[i];
            h_left += hess[i];
            let value = x[(i, feature)];
            let next = x[(sorted[pos + 1], feature)];
            if value == next {
                continue;
            }
            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < params.min_child_weight || h_right < params.min_child_weight {
                continue;
            }
            let gain = 0.5
                * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
                    - parent_score);
            if gain > 0.0 && best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: 0.5 * (value + next),
                    gain,
                });
            }
        }
    }
    best
}

/// Gradient boosted trees classifier.
pub struct GBDTClassifier {
    params: ModelType,
    trees: Vec<RegressionTree>,
    base_score: f64,
    n_features: Option<usize>,
    importance: Vec<f64>,
}

impl GBDTClassifier {
    pub fn new(params: ModelType) -> Self {
        GBDTClassifier {
            params,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: None,
            importance: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<bool>) -> Result<(), FitError> {
        let (n_estimators, tree_params) = match &self.params {
            ModelType::GradientBoostedTrees {
                n_estimators,
                max_depth,
                learning_rate,
                min_child_weight,
                reg_lambda,
            } => (
                *n_estimators,
                TreeParams {
                    max_depth: *max_depth,
                    learning_rate: *learning_rate,
                    min_child_weight: *min_child_weight,
                    reg_lambda: *reg_lambda,
                },
            ),
            other => {
                return Err(FitError::Backend(format!(
                    "expected gradient_boosted_trees parameters, got {}",
                    other.family()
                )))
            }
        };

        let n_pos = check_training_data(x, y)?;
        let n = x.nrows();
        let y = targets(y);

        self.base_score = logit(n_pos as f64 / n as f64);
        self.trees.clear();
        let mut tally = GainTally {
            gain: vec![0.0; x.ncols()],
            splits: vec![0; x.ncols()],
        };
        let mut margin = vec![self.base_score; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for round in 0..n_estimators {
            for i in 0..n {
                let p = sigmoid(margin[i]);
                grad[i] = p - y[i];
                hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }
            let tree = RegressionTree::grow(x, &grad, &hess, &tree_params, &mut tally);
            for (i, m) in margin.iter_mut().enumerate() {
                *m += tree.predict_row(x.row_slice(i));
            }
            trace!("boosting round {}: {} nodes", round, tree.nodes.len());
            self.trees.push(tree);
        }

        if margin.iter().any(|m| !m.is_finite()) {
            return Err(FitError::NonFinite("boosted margins".to_string()));
        }

        let mut importance: Vec<f64> = tally
            .gain
            .iter()
            .zip(&tally.splits)
            .map(|(&g, &c)| if c > 0 { g / c as f64 } else { 0.0 })
            .collect();
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        }
        self.importance = importance;
        self.n_features = Some(x.ncols());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        let n_features = self.n_features.ok_or(FitError::NotFitted)?;
        check_n_features(x, n_features)?;
        Ok(x
            .rows()
            .map(|row| {
                self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, FitError> {
        Ok(self.predict(x)?.into_iter().map(sigmoid).collect())
    }

    fn feature_weights(&self) -> Option<FeatureWeights> {
        self.n_features?;
        Some(FeatureWeights::SplitGain(self.importance.clone()))
    }

    fn name(&self) -> &str {
        "gradient_boosted_trees"
    }
}
