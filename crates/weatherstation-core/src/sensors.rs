//! Simulated sensors.
//!
//! A [`SensorProducer`] draws uniformly random values on a fixed resolution
//! grid, stamps them with the clock's current time and inserts them into its
//! stream store. After every sample it hands the recent tail of its store
//! (60 s by default) to the snapshot sink, if one is attached.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Clock;
use crate::error::Result;
use crate::producer::{Batch, Producer, ProducerInfo, ProducerRole};
use crate::reading::{MeasurementKind, Reading};
use crate::snapshot::SnapshotSink;
use crate::store::StreamStore;
use crate::window::window_start;

/// Default span of the tail persisted after each sample.
pub const DEFAULT_SNAPSHOT_WINDOW: Duration = Duration::from_secs(60);

/// Value range and resolution of a simulated instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSpec {
    pub name: &'static str,
    pub kind: MeasurementKind,
    pub min: f64,
    pub max: f64,
    /// Smallest step between two possible values.
    pub resolution: f64,
    /// Values below this read as zero.
    pub floor: f64,
}

impl SensorSpec {
    pub const TEMPERATURE: SensorSpec = SensorSpec {
        name: "Temperature",
        kind: MeasurementKind::Temperature,
        min: -20.0,
        max: 110.0,
        resolution: 0.1,
        floor: f64::NEG_INFINITY,
    };

    pub const HUMIDITY: SensorSpec = SensorSpec {
        name: "Humidity",
        kind: MeasurementKind::Humidity,
        min: 1.0,
        max: 100.0,
        resolution: 0.1,
        floor: f64::NEG_INFINITY,
    };

    pub const WIND_SPEED: SensorSpec = SensorSpec {
        name: "Wind",
        kind: MeasurementKind::WindSpeed,
        min: 0.0,
        max: 60.0,
        resolution: 0.1,
        floor: f64::NEG_INFINITY,
    };

    /// Rain gauge: 0–99.99" at 0.01" resolution; anything under 0.04" is
    /// reported as no rain.
    pub const RAINFALL: SensorSpec = SensorSpec {
        name: "Rain",
        kind: MeasurementKind::Rainfall,
        min: 0.0,
        max: 99.99,
        resolution: 0.01,
        floor: 0.04,
    };

    /// Built-in spec for a raw kind.
    pub fn for_kind(kind: MeasurementKind) -> Option<SensorSpec> {
        match kind {
            MeasurementKind::Temperature => Some(Self::TEMPERATURE),
            MeasurementKind::Humidity => Some(Self::HUMIDITY),
            MeasurementKind::WindSpeed => Some(Self::WIND_SPEED),
            MeasurementKind::Rainfall => Some(Self::RAINFALL),
            _ => None,
        }
    }

    /// Draw one value.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        let steps = ((self.max - self.min) / self.resolution).round().max(0.0) as u64;
        let step = rng.random_range(0..=steps);
        let value = (self.min + step as f64 * self.resolution).min(self.max);
        if value < self.floor { 0.0 } else { value }
    }
}

/// A simulated instrument writing into its own stream store.
pub struct SensorProducer {
    info: ProducerInfo,
    spec: SensorSpec,
    rng: Mutex<StdRng>,
    clock: Arc<dyn Clock>,
    output: Arc<StreamStore>,
    sink: Option<Arc<dyn SnapshotSink>>,
    snapshot_window: Duration,
}

impl SensorProducer {
    /// Create a sensor seeded from the OS.
    pub fn new(spec: SensorSpec, output: Arc<StreamStore>, clock: Arc<dyn Clock>) -> Self {
        debug_assert_eq!(spec.kind, output.kind());
        Self {
            info: ProducerInfo {
                name: spec.name.to_string(),
                role: ProducerRole::Sensor,
                output: spec.kind,
                inputs: Vec::new(),
            },
            spec,
            rng: Mutex::new(StdRng::from_os_rng()),
            clock,
            output,
            sink: None,
            snapshot_window: DEFAULT_SNAPSHOT_WINDOW,
        }
    }

    /// Use a deterministic RNG.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_snapshot_window(mut self, window: Duration) -> Self {
        self.snapshot_window = window;
        self
    }

    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }
}

impl Producer for SensorProducer {
    fn info(&self) -> &ProducerInfo {
        &self.info
    }

    fn output(&self) -> &Arc<StreamStore> {
        &self.output
    }

    fn run(&self) -> Result<Batch> {
        let now = self.clock.now();
        let value = self.spec.sample(&mut *self.rng.lock().unwrap());
        let reading = Reading::new(now, self.spec.name, self.spec.kind, value);
        self.output.insert(reading.clone());

        let mut batch = Batch {
            readings: vec![reading],
            ..Default::default()
        };

        if let Some(sink) = &self.sink {
            let since = window_start(now, self.snapshot_window);
            let tail = self.output.tail_from(since);
            if let Err(e) = sink.persist(self.spec.kind, &tail) {
                log::warn!("{}: failed to persist snapshot: {e}", self.spec.name);
                batch.persist_failed = true;
            }
        }

        Ok(batch)
    }
}
