use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use diabetes_cli::commands::{run_metrics, run_predict, run_summary, run_train};
use diabetes_cli::input::config_from_arguments;
use diabetes_cli::util::print_json;

fn config_arg(positional: bool) -> Arg {
    let arg = Arg::new("config")
        .help("Path to pipeline JSON configuration file")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath);
    if positional {
        arg
    } else {
        arg.short('c').long("config")
    }
}

fn dataset_arg() -> Arg {
    Arg::new("dataset")
        .short('d')
        .long("dataset")
        .help(
            "Path to the labelled dataset (*.csv or *.tsv). \
             Overrides the dataset specified in the configuration file.",
        )
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn model_dir_arg() -> Arg {
    Arg::new("model_dir")
        .short('o')
        .long("model-dir")
        .help(
            "Directory holding the model and scaler artifacts. \
             Overrides the directory specified in the configuration file.",
        )
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::DirPath)
}

/// Saved artifacts only load when they were built from this model type.
fn model_type_arg() -> Arg {
    Arg::new("model_type")
        .long("model-type")
        .help("Override the model type from the JSON config.")
        .value_parser(["random_forest", "rule_based"])
        .value_hint(ValueHint::Other)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("DIABETES_LOG", "error,diabetes=info"))
        .init();

    let matches = Command::new("diabetes")
        .version(clap::crate_version!())
        .about("Diabetes risk classifier: train, evaluate and predict from clinical measurements")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a model on the configured dataset and save it")
                .arg(config_arg(true))
                .arg(dataset_arg())
                .arg(model_dir_arg())
                .arg(model_type_arg()),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict diabetes risk for one patient")
                .arg(
                    Arg::new("features")
                        .help(
                            "Pregnancies Glucose BloodPressure SkinThickness Insulin BMI \
                             DiabetesPedigreeFunction Age",
                        )
                        .required(true)
                        .num_args(1..)
                        .allow_negative_numbers(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(config_arg(false))
                .arg(dataset_arg())
                .arg(model_dir_arg())
                .arg(model_type_arg())
                .arg(
                    Arg::new("explain")
                        .long("explain")
                        .help("Report per-feature values, importances and class probabilities.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("metrics")
                .about("Evaluate the saved model on the held-out split")
                .arg(config_arg(false))
                .arg(dataset_arg())
                .arg(model_dir_arg())
                .arg(model_type_arg()),
        )
        .subcommand(
            Command::new("summary")
                .about("Print per-feature statistics and class balance of the dataset")
                .arg(config_arg(false))
                .arg(dataset_arg()),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("metrics", sub_m)) => handle_metrics(sub_m),
        Some(("summary", sub_m)) => handle_summary(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = config_from_arguments(matches)?;
    log::info!(
        "[Diabetes::Train] Training {} on {:?}",
        config.model.name(),
        config.dataset_path
    );

    match run_train(&config) {
        Ok(report) => print_json(&report),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let config = config_from_arguments(matches)?;
    let fields: Vec<&String> = matches
        .get_many::<String>("features")
        .map(|values| values.collect())
        .unwrap_or_default();
    let fields: Vec<&str> = fields.into_iter().map(String::as_str).collect();

    match run_predict(&config, &fields, matches.get_flag("explain")) {
        Ok(output) => print_json(&output),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_metrics(matches: &ArgMatches) -> Result<()> {
    let config = config_from_arguments(matches)?;
    match run_metrics(&config) {
        Ok(output) => print_json(&output),
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_summary(matches: &ArgMatches) -> Result<()> {
    let config = config_from_arguments(matches)?;
    log::info!("[Diabetes::Summary] Summarizing {:?}", config.dataset_path);
    match run_summary(&config) {
        Ok(summary) => print_json(&summary),
        Err(e) => {
            log::error!("Summary failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
