mod common;

use vocal_classifiers::config::{ModelFamily, ModelSpec, ModelType, ParamGrid, ParamValue};
use vocal_classifiers::math::{Array1, Array2};
use vocal_classifiers::models::factory::build_model;
use vocal_classifiers::partition::FoldAssignment;
use vocal_classifiers::scorer::cross_validate;
use vocal_classifiers::search::{
    grid_search, select_best, CancellationToken, PointEvaluation, SearchOptions,
};
use vocal_classifiers::stats::{roc_auc, FoldStatistics};
use vocal_classifiers::{Dataset, SelectionError};

fn options(parallel: bool) -> SearchOptions {
    SearchOptions {
        seed: 41,
        parallel,
        cancel: None,
    }
}

fn candidate(label: &str, mean: Option<f64>) -> PointEvaluation {
    let point = ParamGrid::new()
        .with("label", vec![label])
        .points()
        .unwrap()
        .remove(0);
    PointEvaluation {
        point,
        model_type: ModelType::default_for(ModelFamily::RegularizedLinear),
        fold_scores: vec![mean; 5],
        statistics: mean.map(|m| FoldStatistics {
            mean: m,
            std: 0.0,
            n_defined: 5,
            n_folds: 5,
        }),
        failures: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Selection rule
// ---------------------------------------------------------------------------

#[test]
fn highest_mean_wins() {
    let candidates = vec![
        candidate("A", Some(0.81)),
        candidate("B", Some(0.87)),
        candidate("C", Some(0.79)),
    ];
    assert_eq!(select_best(&candidates), Some((1, 0.87)));
}

#[test]
fn ties_go_to_the_first_declared_point() {
    let candidates = vec![
        candidate("A", Some(0.81)),
        candidate("B", Some(0.70)),
        candidate("C", Some(0.81)),
    ];
    assert_eq!(select_best(&candidates).map(|(i, _)| i), Some(0));
}

#[test]
fn points_without_any_scored_fold_are_skipped() {
    let candidates = vec![candidate("A", None), candidate("B", Some(0.6))];
    assert_eq!(select_best(&candidates).map(|(i, _)| i), Some(1));
    assert_eq!(select_best(&[candidate("A", None)]), None);
}

// ---------------------------------------------------------------------------
// Grid search on data
// ---------------------------------------------------------------------------

/// A tiny `c` under the L1 penalty zeroes every weight, giving constant scores (AUC 0.5).
fn logistic_spec(cs: Vec<f64>) -> ModelSpec {
    ModelSpec::new(
        "logistic",
        ModelFamily::RegularizedLinear,
        ParamGrid::new()
            .with("c", cs)
            .with("penalty", vec!["l1"]),
    )
}

#[test]
fn informative_point_is_selected() {
    let dataset = common::voice_dataset(60, 3);
    let folds = FoldAssignment::new(60, 5, 41).unwrap();
    let spec = logistic_spec(vec![1e-4, 1.0, 1e-4]);

    let outcome = grid_search(&spec, &dataset, &folds, &options(true)).unwrap();
    assert_eq!(outcome.best_index, 1);
    assert_eq!(outcome.best_point.get("c"), Some(&ParamValue::Float(1.0)));
    assert_eq!(outcome.candidates.len(), 3);
    assert_eq!(outcome.candidates[0].mean(), Some(0.5));
    assert_eq!(outcome.candidates[0].mean(), outcome.candidates[2].mean());
    assert!(outcome.best_mean > 0.8);
}

#[test]
fn tied_points_resolve_to_the_first() {
    let dataset = common::voice_dataset(40, 9);
    let folds = FoldAssignment::new(40, 4, 41).unwrap();
    let spec = logistic_spec(vec![1e-4, 2e-4]);
    let outcome = grid_search(&spec, &dataset, &folds, &options(false)).unwrap();
    assert_eq!(outcome.best_index, 0);
}

#[test]
fn parallel_and_sequential_search_agree() {
    let dataset = common::voice_dataset(50, 5);
    let folds = FoldAssignment::new(50, 5, 7).unwrap();
    let spec = ModelSpec::new(
        "perceptron",
        ModelFamily::LinearThresholdUnit,
        ParamGrid::new()
            .with("alpha", vec![0.0001, 0.001, 0.1])
            .with("penalty", vec!["l1", "l2", "elasticnet"]),
    );
    let seq = grid_search(&spec, &dataset, &folds, &options(false)).unwrap();
    let par = grid_search(&spec, &dataset, &folds, &options(true)).unwrap();
    assert_eq!(seq.best_index, par.best_index);
    assert_eq!(seq.candidates, par.candidates);
}

#[test]
fn singleton_grid_matches_the_scorer() {
    let dataset = common::voice_dataset(45, 11);
    let folds = FoldAssignment::new(45, 5, 41).unwrap();
    let spec = ModelSpec::new(
        "trees",
        ModelFamily::GradientBoostedTrees,
        ParamGrid::new()
            .with("n_estimators", vec![20i64])
            .with("max_depth", vec![2i64]),
    );

    let outcome = grid_search(&spec, &dataset, &folds, &options(true)).unwrap();
    assert_eq!(outcome.best_index, 0);
    assert_eq!(outcome.best_point, spec.grid.points().unwrap()[0]);

    // The reported score reuses the selection folds, so it carries the same
    // optimistic bias as the search score.
    let cv = cross_validate(&outcome.best_model_type, &dataset, &folds, &options(false)).unwrap();
    assert!((cv.mean - outcome.best_mean).abs() < 1e-12);
    assert_eq!(cv.fold_scores, outcome.candidates[0].fold_scores);
    assert!(cv.oof_scores.iter().all(Option::is_some));
}

#[test]
fn empty_grid_searches_family_defaults() {
    let dataset = common::voice_dataset(30, 2);
    let folds = FoldAssignment::new(30, 3, 41).unwrap();
    let spec = ModelSpec::new("logistic", ModelFamily::RegularizedLinear, ParamGrid::new());
    let outcome = grid_search(&spec, &dataset, &folds, &options(false)).unwrap();
    assert!(outcome.best_point.is_empty());
    assert_eq!(
        outcome.best_model_type,
        ModelType::default_for(ModelFamily::RegularizedLinear)
    );
}

#[test]
fn every_fold_failing_is_no_viable_model() {
    // Leave-one-out: every validation fold holds a single class.
    let dataset = common::voice_dataset(8, 1);
    let folds = FoldAssignment::new(8, 8, 41).unwrap();
    let spec = logistic_spec(vec![1.0, 10.0]);
    match grid_search(&spec, &dataset, &folds, &options(false)) {
        Err(SelectionError::NoViableModel {
            model,
            points_tried,
        }) => {
            assert_eq!(model, "logistic");
            assert_eq!(points_tried, 2);
        }
        other => panic!("expected NoViableModel, got {:?}", other.err()),
    }
}

/// Fold 0 holds positives only; the other folds alternate labels.
fn dataset_with_single_class_fold(folds: &FoldAssignment) -> Dataset {
    let n = folds.n_samples();
    let mut labels = vec![false; n];
    for fold in 0..folds.k() {
        for (pos, &i) in folds.fold(fold).iter().enumerate() {
            labels[i] = fold == 0 || pos % 2 == 0;
        }
    }
    let rows = (0..n)
        .map(|i| {
            let s = if labels[i] { 1.0 } else { -1.0 };
            vec![s + ((i * 7) % 5) as f64 * 0.3 - 0.6, ((i * 3) % 4) as f64 * 0.25]
        })
        .collect();
    Dataset::new(
        Array2::from_rows(rows).unwrap(),
        Array1::from_vec(labels),
        vec!["hnr".to_string(), "shimmer_local".to_string()],
    )
    .unwrap()
}

#[test]
fn single_class_fold_is_left_out_of_the_mean() {
    let folds = FoldAssignment::new(20, 4, 41).unwrap();
    let dataset = dataset_with_single_class_fold(&folds);
    let spec = ModelSpec::new(
        "logistic",
        ModelFamily::RegularizedLinear,
        ParamGrid::new().with("c", vec![1.0]).with("penalty", vec!["l2"]),
    );

    let outcome = grid_search(&spec, &dataset, &folds, &options(false)).unwrap();
    let point = &outcome.candidates[0];
    assert_eq!(point.fold_scores[0], None);
    assert!(point.fold_scores[1..].iter().all(Option::is_some));
    assert_eq!(point.failures.len(), 1);
    assert!(point.failures[0].contains("both classes"));

    let stats = point.statistics.unwrap();
    assert_eq!(stats.n_defined, 3);
    assert_eq!(stats.n_folds, 4);
    let defined: Vec<f64> = point.fold_scores.iter().flatten().copied().collect();
    let expected = defined.iter().sum::<f64>() / 3.0;
    assert!((stats.mean - expected).abs() < 1e-12);
    assert!((outcome.best_mean - expected).abs() < 1e-12);
}

#[test]
fn fold_auc_ranks_decision_values_not_saturated_probabilities() {
    // Unscaled, large-valued features push perceptron margins far past the
    // range where the logistic map still separates them in f64.
    let base = common::voice_dataset(80, 4);
    let rows = base
        .x
        .rows()
        .map(|r| r.iter().map(|v| v * 100.0).collect())
        .collect();
    let dataset = base.with_features(Array2::from_rows(rows).unwrap()).unwrap();
    let folds = FoldAssignment::new(80, 5, 41).unwrap();
    let model_type = ModelType::default_for(ModelFamily::LinearThresholdUnit);

    let cv = cross_validate(&model_type, &dataset, &folds, &options(false)).unwrap();

    let mut largest_margin: f64 = 0.0;
    for split in folds.splits() {
        let mut model = build_model(&model_type, 41 + split.fold as u64).unwrap();
        model
            .fit(
                &dataset.x.select_rows(&split.train),
                &dataset.y.select(&split.train),
            )
            .unwrap();
        let margins = model.predict(&dataset.x.select_rows(&split.validation)).unwrap();
        largest_margin = margins.iter().fold(largest_margin, |m, v| m.max(v.abs()));
        let labels = dataset.y.select(&split.validation);
        let expected = roc_auc(&margins, labels.as_slice()).unwrap();
        assert_eq!(cv.fold_scores[split.fold], Some(expected));
        for (&i, m) in split.validation.iter().zip(&margins) {
            assert_eq!(cv.oof_margins[i], Some(*m));
        }
    }
    assert!(largest_margin > 40.0, "largest margin {}", largest_margin);
}

#[test]
fn bad_grid_fails_before_fitting() {
    let dataset = common::voice_dataset(20, 1);
    let folds = FoldAssignment::new(20, 2, 41).unwrap();
    let spec = ModelSpec::new(
        "trees",
        ModelFamily::GradientBoostedTrees,
        ParamGrid::new().with("depth", vec![3i64]),
    );
    assert!(matches!(
        grid_search(&spec, &dataset, &folds, &options(false)),
        Err(SelectionError::Configuration(_))
    ));
}

#[test]
fn cancelled_search_stops() {
    let dataset = common::voice_dataset(20, 1);
    let folds = FoldAssignment::new(20, 2, 41).unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let opts = SearchOptions {
        seed: 41,
        parallel: true,
        cancel: Some(token),
    };
    assert!(matches!(
        grid_search(&logistic_spec(vec![1.0]), &dataset, &folds, &opts),
        Err(SelectionError::Cancelled)
    ));
}
