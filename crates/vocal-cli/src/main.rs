use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use vocal_classifiers::config::PipelineConfig;
use vocal_classifiers::io::FeatureTableConfig;
use vocal_cli::compare::{apply_overrides, load_pipeline_config, run_compare, CompareArgs, CompareOverrides};
use vocal_cli::util::validate_tsv_or_csv_file;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("VOCAL_LOG", "error,vocal=info"))
        .init();

    let matches = Command::new("vocal")
        .version(clap::crate_version!())
        .about("Cross-validated model comparison for voice-feature classification")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compare")
                .about("Grid-search, cross-validate and rank features for each configured model")
                .arg(
                    Arg::new("data")
                        .help("Path to the labeled feature table (*.csv or *.tsv)")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to a pipeline configuration file (JSON). Defaults are used otherwise.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("out_dir")
                        .short('o')
                        .long("out-dir")
                        .help("Directory the results are written to.")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("k_folds")
                        .long("k-folds")
                        .help("Number of cross-validation folds. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Random seed for fold assignment and stochastic models.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("label_column")
                        .long("label-column")
                        .help("Name of the label column.")
                        .default_value("Status")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("positive_label")
                        .long("positive-label")
                        .help("Label value of the positive class.")
                        .default_value("1")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("models")
                        .long("models")
                        .help("Comma-separated model names or families to evaluate (e.g. svm,logreg).")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("threads")
                        .long("threads")
                        .help("Size of a dedicated worker pool for the grid search.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("no_scale")
                        .long("no-scale")
                        .help("Disable feature standardization.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print or write the default pipeline configuration")
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Write the configuration to this file instead of stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("compare", sub_m)) => handle_compare(sub_m),
        Some(("config", sub_m)) => handle_config(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_compare(matches: &ArgMatches) -> Result<()> {
    let data = matches
        .get_one::<String>("data")
        .ok_or_else(|| anyhow::anyhow!("missing feature table path"))?;
    validate_tsv_or_csv_file(data)?;
    log::info!("[vocal::compare] Reading feature table: {}", data);

    let mut config = load_pipeline_config(matches.get_one::<PathBuf>("config").map(|p| p.as_path()))?;
    let overrides = CompareOverrides {
        k_folds: matches.get_one::<usize>("k_folds").copied(),
        seed: matches.get_one::<u64>("seed").copied(),
        threads: matches.get_one::<usize>("threads").copied(),
        models: matches
            .get_many::<String>("models")
            .map(|vals| vals.cloned().collect()),
        no_scale: matches.get_flag("no_scale"),
    };
    apply_overrides(&mut config, &overrides)?;

    let mut table = FeatureTableConfig::default();
    if let Some(label) = matches.get_one::<String>("label_column") {
        table.label_column = label.clone();
    }
    if let Some(positive) = matches.get_one::<String>("positive_label") {
        table.positive_label = positive.clone();
    }

    let args = CompareArgs {
        data: PathBuf::from(data),
        out_dir: matches
            .get_one::<PathBuf>("out_dir")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
        table,
        write_report: !matches.get_flag("no_report"),
    };

    match run_compare(&args, config) {
        Ok(report) => {
            eprintln!(
                "[vocal::compare] Compared {} model(s) on {} samples; results in {:?}",
                report.models.len(),
                report.n_samples,
                args.out_dir
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Comparison failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_config(matches: &ArgMatches) -> Result<()> {
    let json = serde_json::to_string_pretty(&PipelineConfig::default())?;
    match matches.get_one::<PathBuf>("output_file") {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("[vocal::config] Wrote default configuration to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
