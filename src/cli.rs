use std::path::PathBuf;

use clap::Parser;

/// Irrigation water requirements of a gradually planted scheme.
#[derive(Parser)]
#[command(
    name = "irrigation_demand",
    version,
    about = "Gross irrigation requirement per period for a staggered crop calendar"
)]
pub struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "irrigation.toml")]
    pub config: PathBuf,

    /// Override the first period from config.
    #[arg(long)]
    pub first: Option<usize>,

    /// Override the last period from config.
    #[arg(long)]
    pub last: Option<usize>,

    /// Override the spreading period from config.
    #[arg(long = "spreading-period", visible_alias = "sp")]
    pub spreading_period: Option<f64>,

    /// Override the irrigation efficiency from config.
    #[arg(long)]
    pub efficiency: Option<f64>,

    /// Also write all periods to this CSV file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
