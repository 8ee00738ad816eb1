//! `weatherstation run` — run the simulated station.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use weatherstation_core::{MeasurementKind, Station, StationConfig, SystemClock};

use super::{fail, parse_duration};

/// Arguments of the run command.
pub struct RunCommandConfig<'a> {
    pub config_path: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub output: Option<&'a str>,
    pub seed: Option<u64>,
    pub no_snapshots: bool,
}

/// Run the run command.
pub fn run(args: RunCommandConfig<'_>) {
    let config = build_config(&args).unwrap_or_else(|e| fail(e));
    let max_duration = args
        .duration
        .map(|d| parse_duration(d).unwrap_or_else(|e| fail(e)));

    let station = match Station::from_config(&config, Arc::new(SystemClock)) {
        Ok(s) => Arc::new(s),
        Err(e) => fail(format!("could not start station: {e}")),
    };

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    println!("Weather station running");
    println!("  Producers: {}", station.producer_count());
    match max_duration {
        Some(d) => println!("  Duration:  {}s", d.as_secs_f64()),
        None => println!("  Duration:  until Ctrl+C"),
    }
    match &config.snapshot_dir {
        Some(dir) => println!("  Snapshots: {}", dir.display()),
        None => println!("  Snapshots: disabled"),
    }
    if let Some(seed) = config.seed {
        println!("  Seed:      {seed}");
    }
    println!();

    let start = Instant::now();
    let handle = Arc::clone(&station).spawn();

    while running.load(Ordering::SeqCst) {
        if let Some(max) = max_duration {
            if start.elapsed() >= max {
                break;
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    log::info!("stopping after {:.1}s", start.elapsed().as_secs_f64());
    handle.stop();

    station.print_health();
    print_latest(&station);
}

fn build_config(args: &RunCommandConfig<'_>) -> weatherstation_core::Result<StationConfig> {
    let mut config = match args.config_path {
        Some(path) => StationConfig::load(Path::new(path))?,
        None => StationConfig::default(),
    };
    if let Some(dir) = args.output {
        config.snapshot_dir = Some(PathBuf::from(dir));
    }
    if args.no_snapshots {
        config.snapshot_dir = None;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn print_latest(station: &Station) {
    println!("\nLatest readings");
    for kind in MeasurementKind::ALL {
        let Some(store) = station.store(kind) else {
            continue;
        };
        let name = kind.to_string();
        match store.latest() {
            Some(r) => println!("  {name:<12} {:>8.2} {}", r.value, kind.unit()),
            None => println!("  {name:<12} {:>8}", "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>() -> RunCommandConfig<'a> {
        RunCommandConfig {
            config_path: None,
            duration: None,
            output: None,
            seed: None,
            no_snapshots: false,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = build_config(&RunCommandConfig {
            output: Some("out"),
            seed: Some(3),
            ..args()
        })
        .unwrap();
        assert_eq!(config.snapshot_dir, Some(PathBuf::from("out")));
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_no_snapshots_disables_persistence() {
        let config = build_config(&RunCommandConfig {
            no_snapshots: true,
            ..args()
        })
        .unwrap();
        assert!(config.snapshot_dir.is_none());
    }

    #[test]
    fn test_flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("station.json");
        std::fs::write(&path, r#"{ "seed": 1, "wind_chill_interval_secs": 30 }"#).unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = build_config(&RunCommandConfig {
            config_path: Some(&path),
            seed: Some(9),
            ..args()
        })
        .unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.wind_chill_interval_secs, 30);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = build_config(&RunCommandConfig {
            config_path: Some("/nonexistent/station.json"),
            ..args()
        });
        assert!(result.is_err());
    }
}
