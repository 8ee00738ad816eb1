//! The producer capability and its runtime state.
//!
//! Anything that emits a batch of readings per invocation implements
//! [`Producer`]: simulated sensors ([`crate::sensors::SensorProducer`]) and
//! derived-metric runners ([`crate::runner::CalculationRunner`]). The
//! [`crate::station::Station`] drives producers without knowing which is
//! which.

use std::sync::Arc;
use std::time::Duration;

use crate::align::AlignmentMismatch;
use crate::error::Result;
use crate::reading::{MeasurementKind, Reading};
use crate::store::StreamStore;

/// Role of a producer in the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerRole {
    /// Samples a (simulated) instrument.
    Sensor,
    /// Computes a derived metric from other streams.
    Calculation,
}

impl std::fmt::Display for ProducerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sensor => f.pad("sensor"),
            Self::Calculation => f.pad("calculation"),
        }
    }
}

/// Metadata about a producer.
#[derive(Debug, Clone)]
pub struct ProducerInfo {
    /// Unique name (e.g. `"Temperature"`, `"Dew Point"`).
    pub name: String,
    pub role: ProducerRole,
    /// Kind of the readings written to the output store.
    pub output: MeasurementKind,
    /// Kinds read from upstream stores (empty for sensors).
    pub inputs: Vec<MeasurementKind>,
}

/// Outcome of one successful [`Producer::run`].
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Readings inserted into the output store, in emission order.
    pub readings: Vec<Reading>,
    /// Tuples dropped because a formula rejected their inputs.
    pub skipped: usize,
    /// Leftovers reported by the aligner.
    pub mismatches: Vec<AlignmentMismatch>,
    /// Whether handing the batch to persistence failed.
    pub persist_failed: bool,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Capability shared by sensors and calculation runners.
pub trait Producer: Send + Sync {
    /// Producer metadata.
    fn info(&self) -> &ProducerInfo;

    /// The store this producer writes to.
    fn output(&self) -> &Arc<StreamStore>;

    /// Produce one batch, insert it into the output store and hand it to
    /// persistence.
    fn run(&self) -> Result<Batch>;

    /// Convenience: name from info.
    fn name(&self) -> &str {
        &self.info().name
    }
}

/// Runtime statistics for a registered producer.
#[derive(Debug, Clone, Default)]
pub struct ProducerStats {
    pub runs: u64,
    pub failures: u64,
    pub emitted: u64,
    pub skipped: u64,
    pub persist_failures: u64,
    pub last_batch: usize,
    pub last_duration: Duration,
    pub last_error: Option<String>,
    pub healthy: bool,
}

impl ProducerStats {
    /// Fold the outcome of one invocation into the running totals.
    pub fn record(&mut self, outcome: &Result<Batch>, elapsed: Duration) {
        self.runs += 1;
        self.last_duration = elapsed;
        match outcome {
            Ok(batch) => {
                self.emitted += batch.len() as u64;
                self.skipped += batch.skipped as u64;
                self.last_batch = batch.len();
                if batch.persist_failed {
                    self.persist_failures += 1;
                }
                self.last_error = None;
                self.healthy = !batch.is_empty();
            }
            Err(e) => {
                self.failures += 1;
                self.last_batch = 0;
                self.last_error = Some(e.to_string());
                self.healthy = false;
            }
        }
    }
}

/// Runtime state for a producer registered with the station.
pub struct ProducerState {
    pub producer: Box<dyn Producer>,
    /// Delay between invocations when the station runs continuously.
    pub cadence: Duration,
    pub stats: ProducerStats,
}

impl ProducerState {
    pub fn new(producer: Box<dyn Producer>, cadence: Duration) -> Self {
        Self {
            producer,
            cadence,
            stats: ProducerStats {
                healthy: true,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_stats_accumulate_successes_and_failures() {
        let mut stats = ProducerStats::default();
        let batch = Batch {
            readings: Vec::new(),
            skipped: 2,
            mismatches: Vec::new(),
            persist_failed: true,
        };
        stats.record(&Ok(batch), Duration::from_millis(3));
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.persist_failures, 1);
        assert!(!stats.healthy, "an empty batch is not healthy");

        let err = Err(Error::EmptyWindow {
            kind: MeasurementKind::Temperature,
            interval: Duration::from_secs(15),
        });
        stats.record(&err, Duration::from_millis(1));
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.failures, 1);
        assert!(stats.last_error.as_deref().unwrap().contains("temperature"));
    }

    #[test]
    fn test_new_state_starts_healthy() {
        struct Idle {
            info: ProducerInfo,
            out: Arc<StreamStore>,
        }
        impl Producer for Idle {
            fn info(&self) -> &ProducerInfo {
                &self.info
            }
            fn output(&self) -> &Arc<StreamStore> {
                &self.out
            }
            fn run(&self) -> Result<Batch> {
                Ok(Batch::default())
            }
        }

        let state = ProducerState::new(
            Box::new(Idle {
                info: ProducerInfo {
                    name: "idle".into(),
                    role: ProducerRole::Sensor,
                    output: MeasurementKind::Rainfall,
                    inputs: Vec::new(),
                },
                out: Arc::new(StreamStore::new(MeasurementKind::Rainfall)),
            }),
            Duration::from_secs(1),
        );
        assert!(state.stats.healthy);
        assert_eq!(state.producer.name(), "idle");
        assert!(state.producer.run().unwrap().is_empty());
    }
}
