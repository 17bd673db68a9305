use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::orchestrator::ComparisonReport;
use crate::stats::RocCurve;

fn chance_line() -> Box<Scatter<f64, f64>> {
    Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Chance")
        .line(Line::new().color("grey").dash(DashType::Dash))
}

fn roc_layout(title: &str) -> Layout {
    Layout::new()
        .title(title)
        .x_axis(Axis::new().title("False positive rate").range(vec![0.0, 1.0]))
        .y_axis(Axis::new().title("True positive rate").range(vec![0.0, 1.0]))
}

/// ROC curve of one model's pooled out-of-fold decision values.
pub fn plot_roc_curve(curve: &RocCurve, name: &str, title: &str) -> Plot {
    let trace = Scatter::new(curve.fpr.clone(), curve.tpr.clone())
        .mode(Mode::Lines)
        .name(&format!("{} (AUC = {:.3})", name, curve.auc()));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.add_trace(chance_line());
    plot.set_layout(roc_layout(title));
    plot
}

/// ROC curves of every evaluated model on one set of axes.
pub fn plot_roc_curves(report: &ComparisonReport, title: &str) -> Plot {
    let mut plot = Plot::new();
    for model in &report.models {
        let Some(curve) = model.evaluation().and_then(|e| e.roc.as_ref()) else {
            continue;
        };
        let trace = Scatter::new(curve.fpr.clone(), curve.tpr.clone())
            .mode(Mode::Lines)
            .name(&format!("{} (AUC = {:.3})", model.name, curve.auc()));
        plot.add_trace(trace);
    }
    plot.add_trace(chance_line());
    plot.set_layout(roc_layout(title));
    plot
}

/// Grouped bars of the reported AUC per fold, one group per fold.
pub fn plot_fold_aucs(report: &ComparisonReport, title: &str) -> Plot {
    let mut plot = Plot::new();
    for model in &report.models {
        let Some(result) = model.evaluation() else {
            continue;
        };
        let (folds, aucs): (Vec<String>, Vec<f64>) = result
            .fold_aucs
            .iter()
            .enumerate()
            .filter_map(|(i, auc)| auc.map(|a| (format!("Fold {}", i + 1), a)))
            .unzip();
        plot.add_trace(Bar::new(folds, aucs).name(model.name.as_str()));
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Group)
            .x_axis(Axis::new().title("Fold"))
            .y_axis(Axis::new().title("AUC").range(vec![0.0, 1.0])),
    );
    plot
}
