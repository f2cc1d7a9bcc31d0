//! Command-line parsing for `sst-ml`.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code. Args are turned into plain config structs in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sst-ml",
    version,
    about = "Predict the ENSO index from lagged sea-surface temperature (Random Forest)"
)]
pub struct Cli {
    /// Debug-level logs on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only on stderr.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print a shell completion script to stdout and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub install_completion: Option<Shell>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train the forest and write predictions, importances, figure and model.
    ///
    /// This is the default: `sst-ml --n-lags 4` is `sst-ml run --n-lags 4`.
    Run(RunArgs),
    /// Write climate summary statistics and a rolling trend plot.
    Summary(SummaryArgs),
    /// Reload a saved model and evaluate it on the input data.
    Inspect(InspectArgs),
}

/// Input files shared by every subcommand.
#[derive(Debug, Parser, Clone)]
pub struct InputArgs {
    /// SST CSV (`date,sst_c`).
    #[arg(long, default_value = "data/sst_sample.csv")]
    pub sst: PathBuf,

    /// Niño 3.4 CSV (`date,nino34`).
    #[arg(long, default_value = "data/nino34_sample.csv")]
    pub enso: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory (created if missing).
    #[arg(long, default_value = "artifacts")]
    pub out_dir: PathBuf,

    /// First month kept after smoothing (YYYY-MM).
    #[arg(long, default_value = "2000-01", value_parser = parse_month_arg)]
    pub start: NaiveDate,

    /// Number of lagged SST features.
    #[arg(long, default_value_t = 3)]
    pub n_lags: usize,

    /// Fraction of rows held out for testing, in (0, 1).
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Number of trees in the forest.
    #[arg(long, default_value_t = 200)]
    pub n_estimators: usize,

    /// Maximum tree depth (unbounded if omitted).
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Seed for the split and the forest.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory (created if missing).
    #[arg(long, default_value = "artifacts")]
    pub out_dir: PathBuf,

    /// First month kept after smoothing (YYYY-MM).
    #[arg(long, default_value = "2000-01", value_parser = parse_month_arg)]
    pub start: NaiveDate,
}

#[derive(Debug, Parser, Clone)]
pub struct InspectArgs {
    /// Model file written by `sst-ml run`.
    #[arg(long, default_value = "artifacts/model.json")]
    pub model: PathBuf,

    #[command(flatten)]
    pub input: InputArgs,

    /// First month kept (defaults to the start the model was trained with).
    #[arg(long, value_parser = parse_month_arg)]
    pub start: Option<NaiveDate>,

    /// Number of example predictions to print.
    #[arg(long, default_value_t = 10)]
    pub examples: usize,
}

fn parse_month_arg(s: &str) -> Result<NaiveDate, String> {
    crate::io::ingest::parse_month(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["sst-ml", "run"]).unwrap();
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.n_lags, 3);
        assert_eq!(args.test_size, 0.2);
        assert_eq!(args.n_estimators, 200);
        assert_eq!(args.max_depth, None);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(args.input.sst, PathBuf::from("data/sst_sample.csv"));
    }

    #[test]
    fn bad_start_is_usage_error() {
        assert!(Cli::try_parse_from(["sst-ml", "run", "--start", "soon"]).is_err());
    }

    #[test]
    fn completion_flag_without_subcommand() {
        let cli = Cli::try_parse_from(["sst-ml", "--install-completion", "bash"]).unwrap();
        assert_eq!(cli.install_completion, Some(Shell::Bash));
        assert!(cli.command.is_none());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["sst-ml", "summary", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
