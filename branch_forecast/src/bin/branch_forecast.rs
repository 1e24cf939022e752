//! # branch-forecast
//!
//! Command-line entry point: reads a daily revenue export, forecasts the
//! 14-day window around today and writes the output document set.

use branch_forecast::config::ForecastConfig;
use branch_forecast::data::DataLoader;
use branch_forecast::output::write_output_json;
use branch_forecast::pipeline::{run_forecast, ForecastInputs};
use branch_forecast::sink::{publish, JsonFileSink};
use branch_forecast::tiers::TierCapabilities;
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "branch-forecast")]
#[command(about = "Walk-forward daily revenue forecast per branch", long_about = None)]
#[command(version)]
#[command(after_help = "Model fits run under a wall-clock budget (engine.fit_timeout_ms, \
default 2000). A fit that overruns falls through to the next tier, so the tier \
chosen can depend on machine load. Set fit_timeout_ms = 0 (or pass \
--fit-timeout-ms 0) for reproducible runs.")]
struct Cli {
    /// Daily revenue records (JSON array)
    input: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference day, YYYY-MM-DD (defaults to the local date)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Primary output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip writing to the result store
    #[arg(long)]
    no_sink: bool,

    /// Only use the moving average tier
    #[arg(long)]
    average_only: bool,

    /// Per-fit time budget in milliseconds; 0 disables it for reproducible runs
    #[arg(long, value_name = "MS")]
    fit_timeout_ms: Option<u64>,

    /// Evaluate branches in parallel
    #[arg(long)]
    parallel: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match ForecastConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => match &cli.config {
            Some(path) => {
                error!(path = %path.display(), error = %err, "cannot load configuration");
                return ExitCode::from(2);
            }
            None => {
                warn!(error = %err, "using default configuration");
                ForecastConfig::default()
            }
        },
    };
    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if cli.average_only {
        let caps = TierCapabilities::average_only();
        config.tiers.regression = caps.regression;
        config.tiers.smoothing = caps.smoothing;
    }
    if let Some(fit_timeout_ms) = cli.fit_timeout_ms {
        config.engine.fit_timeout_ms = fit_timeout_ms;
    }
    if cli.parallel {
        config.engine.parallel = true;
    }
    if cli.no_sink {
        config.sink.enabled = false;
    }

    let records = match DataLoader::from_json_file(&cli.input) {
        Ok(records) => records,
        Err(err) => {
            error!(path = %cli.input.display(), error = %err, "cannot read daily records");
            return ExitCode::from(2);
        }
    };
    let (promos, unavailability) = DataLoader::load_sibling_events(&cli.input);

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    info!(%today, "forecasting window");

    let inputs = ForecastInputs {
        records,
        promos,
        unavailability,
    };
    let run = run_forecast(&inputs, today, &config);

    if let Err(err) = write_output_json(&config.output.path, &run.records) {
        error!(path = %config.output.path.display(), error = %err, "cannot write forecast output");
        return ExitCode::from(1);
    }

    if config.sink.enabled {
        match JsonFileSink::new(config.sink_dir(), config.sink.collection.clone()) {
            Ok(mut sink) => {
                publish(&mut sink, &run.records);
            }
            Err(err) => warn!(error = %err, "result store not configured"),
        }
    }

    ExitCode::SUCCESS
}
