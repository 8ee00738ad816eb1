//! Station configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "wind_chill_interval_secs": 20, "seed": 7, "snapshot_dir": "out" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metric::DerivedMetric;
use crate::reading::MeasurementKind;

/// Configuration for a [`crate::station::Station`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Milliseconds between temperature samples.
    pub temperature_cadence_ms: u64,
    /// Milliseconds between humidity samples.
    pub humidity_cadence_ms: u64,
    /// Milliseconds between wind samples. Three wind samples per temperature
    /// sample keeps the wind chill grouping balanced.
    pub wind_cadence_ms: u64,
    /// Milliseconds between rain gauge samples.
    pub rain_cadence_ms: u64,

    /// Dew point window; also the dew point runner's cadence.
    pub dew_point_interval_secs: u64,
    /// Heat index window; also the heat index runner's cadence.
    pub heat_index_interval_secs: u64,
    /// Wind chill window; also the wind chill runner's cadence.
    pub wind_chill_interval_secs: u64,

    /// Directory for snapshot files. `None` disables persistence.
    pub snapshot_dir: Option<PathBuf>,
    /// Span of the tail each sensor persists after sampling.
    pub snapshot_window_secs: u64,
    /// Readings older than this are pruned from every store. `None` keeps
    /// everything.
    pub retention_secs: Option<u64>,
    /// Seed for the simulated sensors. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            temperature_cadence_ms: 3000,
            humidity_cadence_ms: 3000,
            wind_cadence_ms: 1000,
            rain_cadence_ms: 5000,
            dew_point_interval_secs: DerivedMetric::DewPoint.default_interval().as_secs(),
            heat_index_interval_secs: DerivedMetric::HeatIndex.default_interval().as_secs(),
            wind_chill_interval_secs: DerivedMetric::WindChill.default_interval().as_secs(),
            snapshot_dir: Some(PathBuf::from("snapshots")),
            snapshot_window_secs: 60,
            retention_secs: Some(600),
            seed: None,
        }
    }
}

impl StationConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: StationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero cadences, zero windows and a retention that would prune
    /// readings a window still needs.
    pub fn validate(&self) -> Result<()> {
        let cadences = [
            ("temperature_cadence_ms", self.temperature_cadence_ms),
            ("humidity_cadence_ms", self.humidity_cadence_ms),
            ("wind_cadence_ms", self.wind_cadence_ms),
            ("rain_cadence_ms", self.rain_cadence_ms),
            ("dew_point_interval_secs", self.dew_point_interval_secs),
            ("heat_index_interval_secs", self.heat_index_interval_secs),
            ("wind_chill_interval_secs", self.wind_chill_interval_secs),
        ];
        for (name, value) in cadences {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }

        // Pruning inside a runner's window would starve it of inputs.
        if let Some(retention) = self.retention_secs {
            let widest = self.widest_interval_secs();
            if retention < widest {
                return Err(Error::Config(format!(
                    "retention_secs ({retention}) is shorter than the widest window ({widest}s)"
                )));
            }
        }
        Ok(())
    }

    /// Largest of the three window intervals, in seconds.
    pub fn widest_interval_secs(&self) -> u64 {
        self.dew_point_interval_secs
            .max(self.heat_index_interval_secs)
            .max(self.wind_chill_interval_secs)
    }

    /// Sampling cadence of the sensor producing `kind`.
    pub fn sensor_cadence(&self, kind: MeasurementKind) -> Option<Duration> {
        let ms = match kind {
            MeasurementKind::Temperature => self.temperature_cadence_ms,
            MeasurementKind::Humidity => self.humidity_cadence_ms,
            MeasurementKind::WindSpeed => self.wind_cadence_ms,
            MeasurementKind::Rainfall => self.rain_cadence_ms,
            _ => return None,
        };
        Some(Duration::from_millis(ms))
    }

    /// Window interval of `metric`.
    pub fn interval(&self, metric: DerivedMetric) -> Duration {
        let secs = match metric {
            DerivedMetric::DewPoint => self.dew_point_interval_secs,
            DerivedMetric::HeatIndex => self.heat_index_interval_secs,
            DerivedMetric::WindChill => self.wind_chill_interval_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn snapshot_window(&self) -> Duration {
        Duration::from_secs(self.snapshot_window_secs)
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_secs.map(Duration::from_secs)
    }
}
