//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `vocal` binary: argument parsing, help
//! text, error handling and one small end-to-end comparison.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("vocal").unwrap()
}

/// Forty recordings; `hnr` separates the classes, `shimmer` is noise.
fn write_table(path: &Path) {
    let mut text = String::from("Filename,hnr,shimmer,Status\n");
    for i in 0..40 {
        let positive = i % 2 == 0;
        let s = if positive { 1.0 } else { -1.0 };
        let hnr = s + ((i * 37) % 11) as f64 / 10.0 - 0.5;
        let shimmer = ((i * 53) % 17) as f64 / 17.0;
        text.push_str(&format!(
            "rec_{:02}.wav,{},{},{}\n",
            i,
            hnr,
            shimmer,
            if positive { 1 } else { 0 }
        ));
    }
    fs::write(path, text).unwrap();
}

fn write_small_config(path: &Path) {
    fs::write(
        path,
        r#"{
            "k_folds": 4,
            "parallel": false,
            "models": [
                {"name": "Logistic Regression", "family": "regularized_linear",
                 "grid": {"c": [0.1, 1.0], "penalty": ["l2"]}},
                {"name": "Perceptron", "family": "linear_threshold_unit",
                 "grid": {"alpha": [0.0001]}}
            ]
        }"#,
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vocal"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_prints_default_json() {
    cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"k_folds\": 5"))
        .stdout(predicate::str::contains("\"seed\": 41"))
        .stdout(predicate::str::contains("XGBoost"));
}

#[test]
fn config_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    cmd()
        .args(["config", "-o", path.to_str().unwrap()])
        .assert()
        .success();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["models"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

#[test]
fn compare_requires_data_argument() {
    cmd().arg("compare").assert().failure();
}

#[test]
fn compare_nonexistent_table_errors() {
    cmd()
        .args(["compare", "/nonexistent/voice.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn compare_rejects_wrong_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voice.txt");
    fs::write(&path, "hnr,Status\n1,1\n").unwrap();
    cmd()
        .args(["compare", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".tsv or .csv"));
}

#[test]
fn compare_unknown_model_filter_errors() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("voice.csv");
    write_table(&data);
    cmd()
        .args(["compare", data.to_str().unwrap(), "--models", "random_forest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("random_forest"));
}

#[test]
fn compare_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("voice.csv");
    let config = dir.path().join("config.json");
    let out = dir.path().join("out");
    write_table(&data);
    write_small_config(&config);

    cmd()
        .args([
            "compare",
            data.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logistic Regression: evaluated, mean AUC"))
        .stdout(predicate::str::contains("best: "));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("comparison.json")).unwrap()).unwrap();
    assert_eq!(json["k_folds"], 4);
    assert_eq!(json["n_samples"], 40);
    assert_eq!(json["models"][0]["status"], "evaluated");
    assert_eq!(json["models"][0]["ranking"]["entries"][0]["feature"], "hnr");

    let oof = fs::read_to_string(out.join("oof_scores.tsv")).unwrap();
    let mut lines = oof.lines();
    assert_eq!(
        lines.next().unwrap(),
        "sample_id\tlabel\tLogistic Regression\tPerceptron"
    );
    assert!(lines.next().unwrap().starts_with("rec_00.wav\t1\t"));
    assert!(out.join("vocal_report.html").exists());
}

#[test]
fn compare_no_report_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("voice.csv");
    let config = dir.path().join("config.json");
    let out = dir.path().join("out");
    write_table(&data);
    write_small_config(&config);

    cmd()
        .args([
            "compare",
            data.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--k-folds",
            "5",
            "--seed",
            "3",
            "--models",
            "logreg",
            "--no-report",
            "--no-scale",
        ])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("comparison.json")).unwrap()).unwrap();
    assert_eq!(json["k_folds"], 5);
    assert_eq!(json["seed"], 3);
    assert!(json["scaler"].is_null());
    assert_eq!(json["models"].as_array().unwrap().len(), 1);
    assert!(!out.join("vocal_report.html").exists());
}
