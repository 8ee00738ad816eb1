//! CLI for weatherstation — simulated sensors and derived weather metrics.

mod commands;

use clap::{Parser, Subcommand};
use weatherstation_core::DerivedMetric;

#[derive(Parser)]
#[command(name = "weatherstation")]
#[command(about = "weatherstation — windowed dew point, heat index and wind chill")]
#[command(version = weatherstation_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulated station: four sensors feeding three derived metrics.
    /// Prints a health report on exit.
    Run {
        /// JSON station config (missing fields take their defaults)
        #[arg(long)]
        config: Option<String>,

        /// Stop after this long (e.g. 30s, 5m, 1h). Runs until Ctrl+C if omitted.
        #[arg(long)]
        duration: Option<String>,

        /// Snapshot directory (overrides the config file)
        #[arg(long)]
        output: Option<String>,

        /// Seed the simulated sensors for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Do not write snapshots
        #[arg(long, conflicts_with = "output")]
        no_snapshots: bool,
    },

    /// Evaluate one formula on the given inputs
    Compute {
        #[command(subcommand)]
        formula: Formula,
    },

    /// List the derived metrics with their inputs, alignment and window
    Metrics,

    /// List snapshot files, or print the readings of one kind
    Snapshots {
        /// Snapshot directory
        #[arg(long, default_value = "snapshots")]
        dir: String,

        /// Measurement kind to print (e.g. dew_point, "wind speed")
        kind: Option<String>,

        /// Print the snapshot as JSON instead of a table
        #[arg(long, requires = "kind")]
        json: bool,
    },
}

#[derive(Subcommand)]
enum Formula {
    /// Dew point (°F) from temperature and relative humidity
    DewPoint {
        /// Temperature in °F
        #[arg(long, allow_hyphen_values = true)]
        temp: f64,
        /// Relative humidity in percent, (0, 100]
        #[arg(long)]
        humidity: f64,
    },
    /// Heat index (°F) from temperature and relative humidity
    HeatIndex {
        /// Temperature in °F
        #[arg(long, allow_hyphen_values = true)]
        temp: f64,
        /// Relative humidity in percent, [0, 100]
        #[arg(long)]
        humidity: f64,
    },
    /// Wind chill (°F) from temperature and wind speed
    WindChill {
        /// Temperature in °F
        #[arg(long, allow_hyphen_values = true)]
        temp: f64,
        /// Wind speed in mph, at least 3
        #[arg(long)]
        wind: f64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            duration,
            output,
            seed,
            no_snapshots,
        } => commands::run::run(commands::run::RunCommandConfig {
            config_path: config.as_deref(),
            duration: duration.as_deref(),
            output: output.as_deref(),
            seed,
            no_snapshots,
        }),
        Commands::Compute { formula } => match formula {
            Formula::DewPoint { temp, humidity } => {
                commands::compute::run(DerivedMetric::DewPoint, temp, humidity)
            }
            Formula::HeatIndex { temp, humidity } => {
                commands::compute::run(DerivedMetric::HeatIndex, temp, humidity)
            }
            Formula::WindChill { temp, wind } => {
                commands::compute::run(DerivedMetric::WindChill, temp, wind)
            }
        },
        Commands::Metrics => commands::metrics::run(),
        Commands::Snapshots { dir, kind, json } => {
            commands::snapshots::run(&dir, kind.as_deref(), json)
        }
    }
}
