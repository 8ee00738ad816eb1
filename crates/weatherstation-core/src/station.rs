//! Station scheduler: sensors and calculation runners driven together.
//!
//! Architecture:
//! 1. Four simulated sensors write into their own stream stores
//! 2. Three calculation runners read those stores through shared handles
//! 3. Each producer sits behind its own mutex with its runtime statistics
//! 4. `tick_all` runs every producer once (sensors first, each group in parallel)
//! 5. `spawn` gives every producer its own thread looping on its cadence
//! 6. A failing or panicking producer is marked unhealthy; the rest carry on

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::StationConfig;
use crate::error::{Error, Result};
use crate::metric::DerivedMetric;
use crate::producer::{Producer, ProducerRole, ProducerState};
use crate::reading::MeasurementKind;
use crate::runner::CalculationRunner;
use crate::sensors::{SensorProducer, SensorSpec};
use crate::snapshot::{SnapshotSink, SnapshotWriter};
use crate::store::StreamStore;
use crate::window::window_start;

/// Longest a spawned producer thread sleeps before rechecking the stop flag.
const STOP_POLL: Duration = Duration::from_millis(50);

/// A set of producers sharing one clock and one store per measurement kind.
pub struct Station {
    producers: Vec<Mutex<ProducerState>>,
    stores: HashMap<MeasurementKind, Arc<StreamStore>>,
    clock: Arc<dyn Clock>,
    retention: Option<Duration>,
}

impl Station {
    /// Create an empty station.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            producers: Vec::new(),
            stores: HashMap::new(),
            clock,
            retention: None,
        }
    }

    /// Prune readings older than `retention` from a producer's store after
    /// each of its runs.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Build the full station described by `config`, persisting into
    /// `config.snapshot_dir` when it is set.
    pub fn from_config(config: &StationConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let sink = match &config.snapshot_dir {
            Some(dir) => {
                let writer = SnapshotWriter::new(dir)?.with_clock(clock.clone());
                Some(Arc::new(writer) as Arc<dyn SnapshotSink>)
            }
            None => None,
        };
        Self::from_config_with_sink(config, clock, sink)
    }

    /// Build the full station described by `config` around an explicit sink.
    pub fn from_config_with_sink(
        config: &StationConfig,
        clock: Arc<dyn Clock>,
        sink: Option<Arc<dyn SnapshotSink>>,
    ) -> Result<Self> {
        config.validate()?;
        let mut station = Self::new(clock.clone());
        station.retention = config.retention();

        let raw = [
            SensorSpec::TEMPERATURE,
            SensorSpec::HUMIDITY,
            SensorSpec::WIND_SPEED,
            SensorSpec::RAINFALL,
        ];
        for (i, spec) in raw.into_iter().enumerate() {
            let missing = || Error::Config(format!("no cadence configured for {}", spec.kind));
            let cadence = config.sensor_cadence(spec.kind).ok_or_else(missing)?;
            let store = Arc::new(StreamStore::new(spec.kind));
            let mut sensor = SensorProducer::new(spec, store, clock.clone())
                .with_snapshot_window(config.snapshot_window());
            if let Some(seed) = config.seed {
                sensor = sensor.with_seed(seed.wrapping_add(i as u64));
            }
            if let Some(sink) = &sink {
                sensor = sensor.with_sink(sink.clone());
            }
            station.add_producer(Box::new(sensor), cadence)?;
        }

        for metric in DerivedMetric::ALL {
            let (p_kind, s_kind) = metric.inputs();
            let interval = config.interval(metric);
            let mut runner = CalculationRunner::new(
                metric,
                station.require_store(p_kind)?,
                station.require_store(s_kind)?,
                clock.clone(),
            )
            .with_interval(interval);
            if let Some(sink) = &sink {
                runner = runner.with_sink(sink.clone());
            }
            // A runner firing once per window never sees the same input twice.
            station.add_producer(Box::new(runner), interval)?;
        }

        log::info!(
            "station ready: {} producers, snapshots {}",
            station.producer_count(),
            match &config.snapshot_dir {
                Some(dir) => dir.display().to_string(),
                None => "disabled".to_string(),
            }
        );
        Ok(station)
    }

    /// Register a producer and its output store.
    ///
    /// Each kind has exactly one writer, so a second producer for a kind that
    /// already has one is rejected.
    pub fn add_producer(&mut self, producer: Box<dyn Producer>, cadence: Duration) -> Result<()> {
        let kind = producer.info().output;
        if self.stores.contains_key(&kind) {
            return Err(Error::Config(format!(
                "{kind} already has a producer; refusing to register {}",
                producer.name()
            )));
        }
        self.stores.insert(kind, producer.output().clone());
        self.producers
            .push(Mutex::new(ProducerState::new(producer, cadence)));
        Ok(())
    }

    /// Number of registered producers.
    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    /// Shared store holding readings of `kind`.
    pub fn store(&self, kind: MeasurementKind) -> Option<Arc<StreamStore>> {
        self.stores.get(&kind).cloned()
    }

    fn require_store(&self, kind: MeasurementKind) -> Result<Arc<StreamStore>> {
        self.store(kind)
            .ok_or_else(|| Error::Config(format!("no producer writes {kind} readings")))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // -----------------------------------------------------------------------
    // Driving producers
    // -----------------------------------------------------------------------

    /// Run every producer once and return the number of readings emitted.
    ///
    /// Sensors run first, in parallel, so runners in the same tick see their
    /// fresh samples; runners then run in parallel.
    pub fn tick_all(&self) -> usize {
        self.tick_role(ProducerRole::Sensor) + self.tick_role(ProducerRole::Calculation)
    }

    fn tick_role(&self, role: ProducerRole) -> usize {
        thread::scope(|s| {
            let handles: Vec<_> = self
                .producers
                .iter()
                .filter(|state| state.lock().unwrap().producer.info().role == role)
                .map(|state| s.spawn(move || self.run_one(state)))
                .collect();

            handles.into_iter().map(|h| h.join().unwrap_or(0)).sum()
        })
    }

    fn run_one(&self, state: &Mutex<ProducerState>) -> usize {
        let mut ps = state.lock().unwrap();
        let t0 = Instant::now();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ps.producer.run()));
        let elapsed = t0.elapsed();

        let emitted = match outcome {
            Ok(result) => {
                if let Err(e) = &result {
                    log::warn!("{}: {e}", ps.producer.name());
                }
                ps.stats.record(&result, elapsed);
                result.map(|b| b.len()).unwrap_or(0)
            }
            Err(_) => {
                log::error!("{}: producer panicked", ps.producer.name());
                ps.stats.runs += 1;
                ps.stats.failures += 1;
                ps.stats.last_batch = 0;
                ps.stats.last_duration = elapsed;
                ps.stats.last_error = Some("panicked".to_string());
                ps.stats.healthy = false;
                0
            }
        };

        if let Some(retention) = self.retention {
            let cutoff = window_start(self.clock.now(), retention);
            let pruned = ps.producer.output().prune_before(cutoff);
            if pruned > 0 {
                log::debug!("{}: pruned {pruned} readings", ps.producer.name());
            }
        }
        emitted
    }

    /// Start one thread per producer, each running on its own cadence.
    ///
    /// Sensors fire immediately; runners wait one cadence first so their
    /// initial window has something in it.
    pub fn spawn(self: Arc<Self>) -> StationHandle {
        let running = Arc::new(AtomicBool::new(true));
        let threads = (0..self.producers.len())
            .map(|index| {
                let station = Arc::clone(&self);
                let running = Arc::clone(&running);
                thread::spawn(move || station.drive(index, &running))
            })
            .collect();
        StationHandle { running, threads }
    }

    fn drive(&self, index: usize, running: &AtomicBool) {
        let state = &self.producers[index];
        let (cadence, role) = {
            let ps = state.lock().unwrap();
            (ps.cadence, ps.producer.info().role)
        };
        let mut next = match role {
            ProducerRole::Sensor => Instant::now(),
            ProducerRole::Calculation => Instant::now() + cadence,
        };

        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= next {
                self.run_one(state);
                next += cadence;
                // Skip missed slots instead of bursting to catch up.
                if next <= Instant::now() {
                    next = Instant::now() + cadence;
                }
                continue;
            }
            thread::sleep((next - now).min(STOP_POLL));
        }
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    /// Health report as structured data.
    pub fn health_report(&self) -> HealthReport {
        let mut producers = Vec::with_capacity(self.producers.len());
        let mut healthy = 0;
        let mut emitted = 0;

        for state in &self.producers {
            let ps = state.lock().unwrap();
            let info = ps.producer.info();
            if ps.stats.healthy {
                healthy += 1;
            }
            emitted += ps.stats.emitted;
            producers.push(ProducerHealth {
                name: info.name.clone(),
                role: info.role,
                output: info.output,
                healthy: ps.stats.healthy,
                runs: ps.stats.runs,
                failures: ps.stats.failures,
                emitted: ps.stats.emitted,
                skipped: ps.stats.skipped,
                persist_failures: ps.stats.persist_failures,
                stored: ps.producer.output().len(),
                last_batch: ps.stats.last_batch,
                time: ps.stats.last_duration.as_secs_f64(),
                last_error: ps.stats.last_error.clone(),
            });
        }

        HealthReport {
            healthy,
            total: self.producers.len(),
            emitted,
            producers,
        }
    }

    /// Pretty-print health report.
    pub fn print_health(&self) {
        let r = self.health_report();
        println!("\n{}", "=".repeat(72));
        println!("WEATHER STATION HEALTH REPORT");
        println!("{}", "=".repeat(72));
        println!("Producers: {}/{} healthy", r.healthy, r.total);
        println!("Readings emitted: {}", r.emitted);
        println!(
            "\n{:<14} {:<12} {:>4} {:>6} {:>6} {:>8} {:>6} {:>7} {:>8}",
            "Producer", "Role", "OK", "Runs", "Fail", "Emitted", "Skip", "Stored", "Time"
        );
        println!("{}", "-".repeat(72));
        for p in &r.producers {
            let ok = if p.healthy { "✓" } else { "✗" };
            println!(
                "{:<14} {:<12} {:>4} {:>6} {:>6} {:>8} {:>6} {:>7} {:>7.3}s",
                p.name, p.role, ok, p.runs, p.failures, p.emitted, p.skipped, p.stored, p.time
            );
        }
        let errors: Vec<_> = r
            .producers
            .iter()
            .filter_map(|p| p.last_error.as_ref().map(|e| (&p.name, e)))
            .collect();
        if !errors.is_empty() {
            println!();
            for (name, e) in errors {
                println!("  {name}: {e}");
            }
        }
    }
}

/// Handle to a running station. Dropping it without calling
/// [`StationHandle::stop`] leaves the producer threads running.
pub struct StationHandle {
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl StationHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Signal every producer thread to stop and wait for them.
    pub fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        for t in self.threads {
            if t.join().is_err() {
                log::error!("producer thread panicked during shutdown");
            }
        }
    }
}

/// Overall health report for the station.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Number of healthy producers.
    pub healthy: usize,
    /// Total number of registered producers.
    pub total: usize,
    /// Readings emitted across all producers.
    pub emitted: u64,
    pub producers: Vec<ProducerHealth>,
}

/// Health status of a single producer.
#[derive(Debug, Clone)]
pub struct ProducerHealth {
    pub name: String,
    pub role: ProducerRole,
    pub output: MeasurementKind,
    /// Whether the last run succeeded and emitted at least one reading.
    pub healthy: bool,
    pub runs: u64,
    pub failures: u64,
    pub emitted: u64,
    /// Tuples dropped because a formula rejected them.
    pub skipped: u64,
    pub persist_failures: u64,
    /// Readings currently held in the producer's store.
    pub stored: usize,
    pub last_batch: usize,
    /// Duration of the last run in seconds.
    pub time: f64,
    pub last_error: Option<String>,
}
