//! `vocal compare`: load a feature table, run the model comparison and write results.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use vocal_classifiers::config::{ModelFamily, PipelineConfig};
use vocal_classifiers::io::{
    read_feature_table, write_oof_scores, write_report_json, write_summary, FeatureTableConfig,
};
use vocal_classifiers::orchestrator::{ComparisonReport, ModelComparison};
use vocal_classifiers::report::report::write_html_report;

use crate::util::ensure_output_dir;

pub const REPORT_JSON: &str = "comparison.json";
pub const OOF_TSV: &str = "oof_scores.tsv";
pub const REPORT_HTML: &str = "vocal_report.html";

/// Command line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CompareOverrides {
    pub k_folds: Option<usize>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
    /// Model names or family aliases to keep.
    pub models: Option<Vec<String>>,
    pub no_scale: bool,
}

/// Everything `compare` needs besides the pipeline configuration.
#[derive(Debug, Clone)]
pub struct CompareArgs {
    pub data: PathBuf,
    pub out_dir: PathBuf,
    pub table: FeatureTableConfig,
    pub write_report: bool,
}

/// Load a pipeline configuration, or the defaults when no path is given.
pub fn load_pipeline_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            log::info!("[vocal::compare] Using config: {:?}", path);
            PipelineConfig::from_json_file(path)
        }
        None => {
            log::info!("[vocal::compare] No config provided; using defaults.");
            Ok(PipelineConfig::default())
        }
    }
}

pub fn apply_overrides(config: &mut PipelineConfig, overrides: &CompareOverrides) -> Result<()> {
    if let Some(k) = overrides.k_folds {
        config.k_folds = k;
    }
    if let Some(seed) = overrides.seed {
        config.seed = seed;
    }
    if let Some(threads) = overrides.threads {
        config.n_threads = Some(threads);
    }
    if overrides.no_scale {
        config.scale_features = false;
    }
    if let Some(selection) = &overrides.models {
        filter_models(config, selection)?;
    }
    Ok(())
}

/// Keep only the model specs named in `selection`.
///
/// A token matches a spec by its display name (case-insensitive) or by any
/// family alias accepted by [`ModelFamily::from_str`].
pub fn filter_models(config: &mut PipelineConfig, selection: &[String]) -> Result<()> {
    let mut keep = vec![false; config.models.len()];
    for token in selection.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let family = ModelFamily::from_str(token).ok();
        let mut matched = false;
        for (i, spec) in config.models.iter().enumerate() {
            if spec.name.eq_ignore_ascii_case(token) || Some(spec.family) == family {
                keep[i] = true;
                matched = true;
            }
        }
        if !matched {
            anyhow::bail!("No configured model matches '{}'", token);
        }
    }
    let mut flags = keep.into_iter();
    config.models.retain(|_| flags.next().unwrap_or(false));
    if config.models.is_empty() {
        anyhow::bail!("--models selected no models");
    }
    Ok(())
}

/// Run the comparison, print the summary to stdout and write `comparison.json`,
/// `oof_scores.tsv` and the HTML report.
pub fn run_compare(args: &CompareArgs, config: PipelineConfig) -> Result<ComparisonReport> {
    let dataset = read_feature_table(&args.data, &args.table)?;
    dataset.log_input_data_summary();

    let comparison = ModelComparison::new(config);
    let report = comparison
        .run(&dataset)
        .with_context(|| format!("Model comparison failed for {}", args.data.display()))?;

    for line in report.summary_lines() {
        log::info!("[vocal::compare] {}", line);
    }
    write_summary(std::io::stdout().lock(), &report)?;

    ensure_output_dir(&args.out_dir)?;
    write_report_json(args.out_dir.join(REPORT_JSON), &report)?;
    write_oof_scores(args.out_dir.join(OOF_TSV), &dataset, &report)?;
    if args.write_report {
        write_html_report(args.out_dir.join(REPORT_HTML), &report)?;
    }
    Ok(report)
}
