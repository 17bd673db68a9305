//! Writers for comparison results.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::data_handling::Dataset;
use crate::orchestrator::ComparisonReport;

/// Write the comparison report as pretty-printed JSON.
pub fn write_report_json<P: AsRef<Path>>(path: P, report: &ComparisonReport) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
    Ok(())
}

/// Write out-of-fold probabilities as TSV: sample id, label, one column per evaluated model.
///
/// Cells are empty where a sample's fold could not be fitted.
pub fn write_oof_scores<P: AsRef<Path>>(
    path: P,
    dataset: &Dataset,
    report: &ComparisonReport,
) -> Result<()> {
    let evaluated: Vec<(&str, &Vec<Option<f64>>)> = report
        .models
        .iter()
        .filter_map(|m| m.evaluation().map(|e| (m.name.as_str(), &e.oof_scores)))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;

    let mut header = vec!["sample_id".to_string(), "label".to_string()];
    header.extend(evaluated.iter().map(|(name, _)| name.to_string()));
    writer.write_record(&header)?;

    for i in 0..dataset.n_samples() {
        let mut row = vec![
            dataset.sample_id(i),
            String::from(if dataset.y[i] { "1" } else { "0" }),
        ];
        for (_, scores) in &evaluated {
            row.push(scores[i].map(|s| s.to_string()).unwrap_or_default());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the report's human-readable summary, one line per model.
pub fn write_summary<W: Write>(mut out: W, report: &ComparisonReport) -> Result<()> {
    for line in report.summary_lines() {
        writeln!(out, "{}", line)?;
    }
    if let Some(best) = report.best() {
        writeln!(out, "best: {}", best.name)?;
    }
    Ok(())
}
