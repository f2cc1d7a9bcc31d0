//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the pipeline for the chosen subcommand
//! - prints reports

use clap::{CommandFactory, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, InspectArgs, RunArgs, SummaryArgs};
use crate::domain::{ForestParams, InspectConfig, RunConfig, SummaryConfig};
use crate::error::AppError;

pub mod pipeline;

/// Environment variable holding a `tracing` filter (e.g. `sst_ml=debug`).
pub const LOG_ENV: &str = "SST_ML_LOG";

/// Entry point for the `sst-ml` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is normal.
    let dotenv = dotenvy::dotenv();

    // `sst-ml --n-lags 4` should behave like `sst-ml run --n-lags 4`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    init_tracing(cli.quiet, cli.verbose)?;
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    if let Some(shell) = cli.install_completion {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    match cli.command {
        Some(Command::Run(args)) => handle_run(&args),
        Some(Command::Summary(args)) => handle_summary(&args),
        Some(Command::Inspect(args)) => handle_inspect(&args),
        None => handle_run(&RunArgs::parse_from(["run"])),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), AppError> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::internal(format!("Failed to initialize logging: {e}")))
}

fn handle_run(args: &RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args);
    let run = pipeline::run_pipeline(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.stats, &config, &run.model)
    );

    let a = &run.artifacts;
    for path in [&a.predictions_csv, &a.importance_csv, &a.figure_png, &a.model_json] {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_summary(args: &SummaryArgs) -> Result<(), AppError> {
    let config = SummaryConfig {
        sst_path: args.input.sst.clone(),
        enso_path: args.input.enso.clone(),
        out_dir: args.out_dir.clone(),
        start: Some(args.start),
    };
    let out = pipeline::run_summary(&config)?;

    println!("{}", crate::report::format_climate_summary(&out.stats, &out.summary));
    println!("Wrote {}", out.summary_csv.display());
    println!("Wrote {}", out.trends_png.display());
    Ok(())
}

fn handle_inspect(args: &InspectArgs) -> Result<(), AppError> {
    let config = InspectConfig {
        model_path: args.model.clone(),
        sst_path: args.input.sst.clone(),
        enso_path: args.input.enso.clone(),
        start: args.start,
        examples: args.examples,
    };
    let out = pipeline::run_inspect(&config)?;
    info!(rows = out.predictions.len(), "predicted every lagged row");

    println!(
        "{}",
        crate::report::format_inspect_report(
            &config.model_path,
            &out.model,
            &out.stats,
            &out.metrics,
            &out.ranked,
            &out.predictions,
            config.examples,
        )
    );
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        sst_path: args.input.sst.clone(),
        enso_path: args.input.enso.clone(),
        out_dir: args.out_dir.clone(),
        start: Some(args.start),
        n_lags: args.n_lags,
        test_size: args.test_size,
        forest: ForestParams {
            n_estimators: args.n_estimators,
            max_depth: args.max_depth,
            seed: args.seed,
            ..ForestParams::default()
        },
    }
}

/// Rewrite argv so bare flags default to `sst-ml run`.
///
/// Rules:
/// - `sst-ml`                          -> `sst-ml run`
/// - `sst-ml --n-lags 4 ...`           -> `sst-ml run --n-lags 4 ...`
/// - `sst-ml -v --seed 7`              -> `sst-ml -v run --seed 7`
/// - `sst-ml --help/--version/-h`      -> unchanged
/// - anything with `--install-completion` -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    if argv
        .iter()
        .skip(1)
        .any(|a| a == "--install-completion" || a.starts_with("--install-completion="))
    {
        return argv;
    }

    // Leading global flags may precede the subcommand.
    let pos = argv
        .iter()
        .skip(1)
        .position(|a| !matches!(a.as_str(), "-v" | "--verbose" | "-q" | "--quiet"))
        .map(|i| i + 1);

    let Some(pos) = pos else {
        argv.push("run".to_string());
        return argv;
    };

    let arg = argv[pos].as_str();
    let is_help_or_version = matches!(arg, "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(arg, "run" | "summary" | "inspect");
    if is_help_or_version || is_subcommand {
        return argv;
    }

    // A flag in subcommand position is a `run` flag.
    if arg.starts_with('-') {
        argv.insert(pos, "run".to_string());
    }
    argv
}
