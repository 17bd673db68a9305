//! Self-contained HTML report (maud markup with inline plotly figures).
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::orchestrator::{ComparisonReport, ModelOutcome};
use crate::report::plots::{plot_fold_aucs, plot_roc_curve, plot_roc_curves};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

enum Block {
    Content(Markup),
    Plot(Plot),
}

pub struct ReportSection {
    title: String,
    blocks: Vec<Block>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(Block::Content(content));
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.blocks.push(Block::Plot(plot));
    }

    fn render(&self, section_idx: usize) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for (i, block) in self.blocks.iter().enumerate() {
                    @match block {
                        Block::Content(markup) => {
                            div.content { (markup) }
                        }
                        Block::Plot(plot) => {
                            @let div_id = format!("plot-{}-{}", section_idx, i);
                            div.plot { (PreEscaped(plot.to_inline_html(Some(div_id.as_str())))) }
                        }
                    }
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    description: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { "body{font-family:sans-serif;margin:2em;} table{border-collapse:collapse;} td,th{border:1px solid #ccc;padding:4px 8px;} .failed{color:#b00;}" }
                }
                body {
                    h1 { (self.title) }
                    p { (self.description) }
                    p { "Generated " (Local::now().format("%Y-%m-%d %H:%M:%S")) }
                    @for (i, section) in self.sections.iter().enumerate() {
                        (section.render(i))
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))
    }
}

fn fmt_auc(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

fn summary_section(report: &ComparisonReport) -> ReportSection {
    let mut section = ReportSection::new("Model comparison");
    section.add_content(html! {
        p {
            (report.n_samples) " samples, " (report.feature_names.len()) " features, "
            (report.k_folds) "-fold cross-validation (seed " (report.seed) ", fold sizes "
            (format!("{:?}", report.fold_sizes)) ")."
        }
        p {
            "Reported scores reuse the folds that selected the hyperparameters, "
            "so they are optimistically biased."
        }
        table {
            tr { th { "Model" } th { "Status" } th { "Mean AUC" } th { "Std" } th { "Pooled AUC" } th { "Selected hyperparameters" } }
            @for model in &report.models {
                @match &model.outcome {
                    ModelOutcome::Evaluated(result) => {
                        tr {
                            td { (model.name) }
                            td { "evaluated" }
                            td { (format!("{:.4}", result.mean_auc)) }
                            td { (format!("{:.4}", result.std_auc)) }
                            td { (fmt_auc(result.pooled_auc)) }
                            td { (result.best_point.to_string()) }
                        }
                    }
                    ModelOutcome::Failed { reason } => {
                        tr.failed {
                            td { (model.name) }
                            td { "failed" }
                            td colspan="4" { (reason) }
                        }
                    }
                }
            }
        }
    });
    section
}

fn features_section(report: &ComparisonReport) -> ReportSection {
    let mut section = ReportSection::new("Top features");
    for model in &report.models {
        let Some(result) = model.evaluation() else {
            continue;
        };
        section.add_content(html! {
            h3 { (model.name) }
            @if let Some(ranking) = &result.ranking {
                table {
                    tr { th { "Rank" } th { "Feature" } th { "Importance" } }
                    @for (i, entry) in ranking.entries.iter().enumerate() {
                        tr {
                            td { (i + 1) }
                            td { (entry.feature) }
                            td { (format!("{:.4}", entry.importance)) }
                        }
                    }
                }
            } @else {
                p { (result.ranking_note.as_deref().unwrap_or("No feature ranking available.")) }
            }
        });
    }
    section
}

fn fold_section(report: &ComparisonReport) -> ReportSection {
    let mut section = ReportSection::new("Per-fold AUC");
    section.add_content(html! {
        table {
            tr {
                th { "Model" }
                @for i in 0..report.k_folds { th { "Fold " (i + 1) } }
            }
            @for model in &report.models {
                @if let Some(result) = model.evaluation() {
                    tr {
                        td { (model.name) }
                        @for auc in &result.fold_aucs { td { (fmt_auc(*auc)) } }
                    }
                }
            }
        }
    });
    section.add_plot(plot_fold_aucs(report, "Reported AUC per fold"));
    section
}

fn roc_section(report: &ComparisonReport) -> ReportSection {
    let mut section = ReportSection::new("ROC curves");
    section.add_content(html! { "ROC curves of the pooled out-of-fold decision values." });
    section.add_plot(plot_roc_curves(report, "Out-of-fold ROC"));
    for model in &report.models {
        if let Some(curve) = model.evaluation().and_then(|e| e.roc.as_ref()) {
            let title = format!("{}: out-of-fold ROC", model.name);
            section.add_plot(plot_roc_curve(curve, &model.name, &title));
        }
    }
    section
}

fn build_report(report: &ComparisonReport) -> Report {
    let mut html_report = Report::new(
        "Voice feature model comparison",
        "Cross-validated model selection and feature ranking.",
    );
    html_report.add_section(summary_section(report));
    html_report.add_section(roc_section(report));
    html_report.add_section(fold_section(report));
    html_report.add_section(features_section(report));
    html_report
}

/// Render the full comparison report as an HTML document.
pub fn render_html_report(report: &ComparisonReport) -> String {
    build_report(report).render().into_string()
}

pub fn write_html_report<P: AsRef<Path>>(path: P, report: &ComparisonReport) -> Result<()> {
    build_report(report).save_to_file(path)
}
