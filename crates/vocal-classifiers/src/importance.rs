//! Family-agnostic feature rankings.
//!
//! Tree ensembles report non-negative split gain, linear models report signed
//! coefficients. Both are ranked by magnitude and reported with their sign, so
//! a negative coefficient stays negative in the output.
use serde::Serialize;

use crate::error::SelectionError;
use crate::models::classifier_trait::{ClassifierModel, FeatureWeights, ImportanceKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    pub feature: String,
    pub importance: f64,
}

/// Features sorted by decreasing |importance|, truncated to the requested length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRanking {
    pub kind: ImportanceKind,
    pub entries: Vec<RankedFeature>,
}

impl FeatureRanking {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<(&str, f64)> {
        self.entries
            .first()
            .map(|e| (e.feature.as_str(), e.importance))
    }
}

/// Rank raw feature weights. Ties keep the feature order.
pub fn rank_weights(
    weights: &FeatureWeights,
    feature_names: &[String],
    top_n: usize,
) -> Result<FeatureRanking, SelectionError> {
    let values = weights.values();
    if values.len() != feature_names.len() {
        return Err(SelectionError::configuration(format!(
            "{} importance values for {} feature names",
            values.len(),
            feature_names.len()
        )));
    }
    if top_n == 0 {
        return Err(SelectionError::configuration("top_n must be at least 1"));
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort, so equal magnitudes keep the lower feature index first.
    order.sort_by(|&a, &b| values[b].abs().total_cmp(&values[a].abs()));
    let entries = order
        .into_iter()
        .take(top_n)
        .map(|j| RankedFeature {
            feature: feature_names[j].clone(),
            importance: values[j],
        })
        .collect();

    Ok(FeatureRanking {
        kind: weights.kind(),
        entries,
    })
}

/// Rank the features of a fitted model by the importance concept it exposes.
pub fn rank_features(
    model: &dyn ClassifierModel,
    feature_names: &[String],
    top_n: usize,
) -> Result<FeatureRanking, SelectionError> {
    let weights = model
        .feature_weights()
        .ok_or_else(|| SelectionError::UnsupportedCapability {
            model: model.name().to_string(),
            capability: "feature importance (split gain or coefficients)".to_string(),
        })?;
    rank_weights(&weights, feature_names, top_n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn coefficients_rank_by_magnitude_and_keep_sign() {
        let weights = FeatureWeights::Coefficients(vec![0.4, -2.3, 1.1, 0.0]);
        let ranking = rank_weights(
            &weights,
            &names(&["shimmer_local", "jitter_local", "hnr", "f0_mean"]),
            3,
        )
        .unwrap();
        assert_eq!(ranking.kind, ImportanceKind::Coefficients);
        assert_eq!(ranking.first(), Some(("jitter_local", -2.3)));
        let order: Vec<&str> = ranking.entries.iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(order, vec!["jitter_local", "hnr", "shimmer_local"]);
    }

    #[test]
    fn split_gain_ties_keep_feature_order() {
        let weights = FeatureWeights::SplitGain(vec![0.25, 0.5, 0.25]);
        let ranking = rank_weights(&weights, &names(&["a", "b", "c"]), 5).unwrap();
        assert_eq!(ranking.len(), 3);
        let order: Vec<&str> = ranking.entries.iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn length_mismatch_is_a_configuration_error() {
        let weights = FeatureWeights::SplitGain(vec![1.0]);
        assert!(matches!(
            rank_weights(&weights, &names(&["a", "b"]), 1),
            Err(SelectionError::Configuration(_))
        ));
    }
}
