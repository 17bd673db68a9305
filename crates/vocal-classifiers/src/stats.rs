//! Ranking metrics and fold aggregation.
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::error::FitError;

fn check_binary(scores: &[f64], labels: &[bool]) -> Result<(usize, usize), FitError> {
    if scores.len() != labels.len() {
        return Err(FitError::UndefinedMetric(format!(
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(FitError::UndefinedMetric(format!("non-finite score {}", bad)));
    }
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(FitError::UndefinedMetric(
            "ROC AUC needs both classes in the evaluated samples".to_string(),
        ));
    }
    Ok((n_pos, n_neg))
}

/// Area under the ROC curve.
///
/// Computed as the Mann-Whitney U statistic of the positive-class scores,
/// with tied scores given their average rank (a tie counts as half a correct
/// ordering).
///
/// # Arguments
///
/// * `scores` - Predicted scores; larger means more likely positive.
/// * `labels` - True labels, `true` for the positive class.
///
/// # Returns
///
/// The AUC in [0, 1], or `FitError::UndefinedMetric` when only one class is
/// present or the inputs disagree in length.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Result<f64, FitError> {
    let (n_pos, n_neg) = check_binary(scores, labels)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group [start, end) shares the average rank.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let pos_in_group = order[start..end].iter().filter(|&&i| labels[i]).count();
        rank_sum_pos += avg_rank * pos_in_group as f64;
        start = end;
    }

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos as f64 * n_neg as f64))
}

/// Points of an ROC curve, ordered by decreasing threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// The first threshold is `+inf` (nothing predicted positive).
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    pub fn auc(&self) -> f64 {
        trapezoid_auc(&self.fpr, &self.tpr)
    }
}

/// ROC curve with one point per distinct score, starting at (0, 0) and ending at (1, 1).
pub fn roc_curve(scores: &[f64], labels: &[bool]) -> Result<RocCurve, FitError> {
    let (n_pos, n_neg) = check_binary(scores, labels)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if labels[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_group = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_group {
            curve.fpr.push(fp as f64 / n_neg as f64);
            curve.tpr.push(tp as f64 / n_pos as f64);
            curve.thresholds.push(scores[i]);
        }
    }
    Ok(curve)
}

/// Trapezoidal integral of `y` over `x`. `x` must be sorted ascending.
pub fn trapezoid_auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Mean and spread of the defined fold scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FoldStatistics {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub n_defined: usize,
    pub n_folds: usize,
}

impl FoldStatistics {
    /// `None` when no fold produced a score.
    pub fn from_folds(fold_scores: &[Option<f64>]) -> Option<Self> {
        let defined: Vec<f64> = fold_scores.iter().flatten().copied().collect();
        if defined.is_empty() {
            return None;
        }
        let std = if defined.len() > 1 {
            defined.iter().population_std_dev()
        } else {
            0.0
        };
        Some(FoldStatistics {
            mean: defined.iter().mean(),
            std,
            n_defined: defined.len(),
            n_folds: fold_scores.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_and_inverted_rankings() {
        let labels = [false, false, true, true];
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &labels).unwrap(), 1.0);
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &labels).unwrap(), 0.0);
    }

    #[test]
    fn ties_count_half() {
        let labels = [false, true];
        assert_eq!(roc_auc(&[0.5, 0.5], &labels).unwrap(), 0.5);
        // One of the four positive/negative pairs is tied.
        let auc = roc_auc(&[0.1, 0.4, 0.4, 0.8], &[false, true, false, true]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn single_class_is_undefined() {
        assert!(matches!(
            roc_auc(&[0.3], &[true]),
            Err(FitError::UndefinedMetric(_))
        ));
        assert!(roc_curve(&[0.3, 0.4], &[false, false]).is_err());
    }

    #[test]
    fn curve_area_matches_rank_statistic() {
        let scores = [0.1, 0.35, 0.4, 0.4, 0.8, 0.7, 0.2];
        let labels = [false, true, false, true, true, false, false];
        let curve = roc_curve(&scores, &labels).unwrap();
        assert_eq!(curve.fpr.first(), Some(&0.0));
        assert_eq!(curve.tpr.last(), Some(&1.0));
        assert_eq!(curve.fpr.len(), curve.thresholds.len());
        let direct = roc_auc(&scores, &labels).unwrap();
        assert!((curve.auc() - direct).abs() < 1e-12);
    }

    #[test]
    fn fold_statistics_skip_undefined_folds() {
        let stats = FoldStatistics::from_folds(&[Some(0.8), None, Some(0.6)]).unwrap();
        assert!((stats.mean - 0.7).abs() < 1e-12);
        assert!((stats.std - 0.1).abs() < 1e-12);
        assert_eq!(stats.n_defined, 2);
        assert_eq!(stats.n_folds, 3);
        assert!(FoldStatistics::from_folds(&[None, None]).is_none());
    }
}
