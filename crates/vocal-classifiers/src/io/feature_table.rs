//! CSV/TSV feature table reader.
use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;

use crate::data_handling::Dataset;
use crate::math::{Array1, Array2};

/// Which columns of the table hold the label, identifiers and features.
#[derive(Debug, Clone)]
pub struct FeatureTableConfig {
    pub label_column: String,
    /// Label value of the positive class.
    pub positive_label: String,
    /// Column used as sample identifier, when present.
    pub id_column: Option<String>,
    /// Optional explicit list of feature columns (in order).
    /// When `None`, every column that is not the label or ignored is a feature.
    pub feature_columns: Option<Vec<String>>,
    /// Columns never used as features.
    pub ignore_columns: Vec<String>,
}

impl Default for FeatureTableConfig {
    fn default() -> Self {
        Self {
            label_column: "Status".to_string(),
            positive_label: "1".to_string(),
            id_column: Some("Filename".to_string()),
            feature_columns: None,
            ignore_columns: vec![
                "Filename".to_string(),
                "Subject".to_string(),
                "name".to_string(),
            ],
        }
    }
}

/// Tab for `.tsv`/`.tab`, comma otherwise.
pub fn delimiter_for<P: AsRef<Path>>(path: P) -> u8 {
    match path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Read a labeled feature table into a [`Dataset`].
pub fn read_feature_table<P: AsRef<Path>>(path: P, config: &FeatureTableConfig) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(&path))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open feature table: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read feature table header row")?
        .clone();

    let label_idx = find_column(&headers, &config.label_column)
        .ok_or_else(|| anyhow!("Missing label column '{}'", config.label_column))?;
    let id_idx = config
        .id_column
        .as_deref()
        .and_then(|name| find_column(&headers, name));

    let feature_indices = resolve_feature_indices(&headers, config, label_idx, id_idx)?;
    if feature_indices.is_empty() {
        bail!("No feature columns detected in feature table header");
    }

    let mut features = Vec::new();
    let mut raw_labels = Vec::new();
    let mut ids = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let line = row_idx + 2;
        let record = result.with_context(|| format!("Failed to read line {}", line))?;

        let label = record
            .get(label_idx)
            .ok_or_else(|| anyhow!("Missing label value at line {}", line))?;
        raw_labels.push(label.to_string());

        if let Some(idx) = id_idx {
            ids.push(record.get(idx).unwrap_or_default().to_string());
        }

        for &idx in &feature_indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing feature value at line {}", line))?;
            let parsed = value.parse::<f64>().with_context(|| {
                format!(
                    "Invalid value '{}' for feature '{}' at line {}",
                    value,
                    headers.get(idx).unwrap_or(""),
                    line
                )
            })?;
            features.push(parsed);
        }
    }

    let y = parse_labels(&raw_labels, &config.positive_label)?;
    let n_samples = raw_labels.len();
    let x = Array2::from_shape_vec((n_samples, feature_indices.len()), features)
        .context("Failed to build feature matrix")?;
    let feature_names = feature_indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").to_string())
        .collect();

    let dataset = Dataset::new(x, y, feature_names)?;
    let dataset = if id_idx.is_some() {
        dataset.with_sample_ids(ids)?
    } else {
        dataset
    };
    Ok(dataset)
}

/// Map raw label values to booleans; exactly two distinct values are allowed.
fn parse_labels(raw: &[String], positive: &str) -> Result<Array1<bool>> {
    let distinct: HashSet<&str> = raw.iter().map(String::as_str).collect();
    if distinct.len() != 2 {
        let mut values: Vec<&str> = distinct.into_iter().collect();
        values.sort_unstable();
        bail!(
            "Expected exactly two label values, found {}: {:?}",
            values.len(),
            values
        );
    }
    if !distinct.contains(positive) {
        bail!("Positive label '{}' does not occur in the label column", positive);
    }
    Ok(raw.iter().map(|v| v == positive).collect())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn resolve_feature_indices(
    headers: &StringRecord,
    config: &FeatureTableConfig,
    label_idx: usize,
    id_idx: Option<usize>,
) -> Result<Vec<usize>> {
    if let Some(names) = &config.feature_columns {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = find_column(headers, name)
                .ok_or_else(|| anyhow!("Missing feature column '{}'", name))?;
            indices.push(idx);
        }
        return Ok(indices);
    }

    let ignore: HashSet<String> = config
        .ignore_columns
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect();

    Ok(headers
        .iter()
        .enumerate()
        .filter(|(idx, header)| {
            *idx != label_idx
                && Some(*idx) != id_idx
                && !ignore.contains(&header.to_ascii_lowercase())
        })
        .map(|(idx, _)| idx)
        .collect())
}
