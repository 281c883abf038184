use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Lumped HBV rainfall-runoff model calibration.
#[derive(Parser)]
#[command(
    name = "hbvcal",
    version,
    about = "Calibrate and validate the lumped HBV (012A) rainfall-runoff model"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Calibrate the model against reference discharge.
    Calibrate(CalibrateArgs),
    /// Score a calibrated parameter set on another period.
    Validate(ValidateArgs),
}

/// Arguments for the `calibrate` subcommand.
#[derive(clap::Args)]
pub struct CalibrateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "hbvcal.toml")]
    pub config: PathBuf,

    /// Override the calibration forcing table from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the output directory from config.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the RNG seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Arguments for the `validate` subcommand.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "hbvcal.toml")]
    pub config: PathBuf,

    /// Override the validation forcing table from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Parameter table to validate (defaults to the calibration output).
    #[arg(short, long)]
    pub parameters: Option<PathBuf>,

    /// Override the output directory from config.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
