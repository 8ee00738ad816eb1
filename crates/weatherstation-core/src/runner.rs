//! Calculation runner: windows → alignment → formula → output store →
//! persistence.
//!
//! One [`CalculationRunner`] exists per derived metric. It reads its two input
//! stores through shared handles, is the only writer of its output store, and
//! hands every computed batch to an optional [`SnapshotSink`].
//!
//! Per invocation:
//! 1. Extract a window from each input store (empty window → whole invocation
//!    fails with [`Error::EmptyWindow`](crate::Error::EmptyWindow))
//! 2. Align the windows in the metric's mode (leftovers are logged only)
//! 3. Compute one value per aligned tuple (a rejected tuple is skipped)
//! 4. Insert the derived readings, stamped with the current time
//! 5. Persist the batch (failures are logged, the in-memory output stays)

use std::sync::Arc;
use std::time::Duration;

use crate::align::{Side, align};
use crate::clock::Clock;
use crate::error::Result;
use crate::metric::DerivedMetric;
use crate::producer::{Batch, Producer, ProducerInfo, ProducerRole};
use crate::reading::Reading;
use crate::snapshot::SnapshotSink;
use crate::store::StreamStore;
use crate::window::extract_window;

/// Computes one derived metric from two upstream stores.
pub struct CalculationRunner {
    info: ProducerInfo,
    metric: DerivedMetric,
    primary: Arc<StreamStore>,
    secondary: Arc<StreamStore>,
    output: Arc<StreamStore>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl CalculationRunner {
    /// Create a runner for `metric` reading `primary` and `secondary`.
    ///
    /// The window interval starts at the metric's default and the output store
    /// is created fresh.
    pub fn new(
        metric: DerivedMetric,
        primary: Arc<StreamStore>,
        secondary: Arc<StreamStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (p_kind, s_kind) = metric.inputs();
        debug_assert_eq!(primary.kind(), p_kind);
        debug_assert_eq!(secondary.kind(), s_kind);
        Self {
            info: ProducerInfo {
                name: metric.source_name().to_string(),
                role: ProducerRole::Calculation,
                output: metric.kind(),
                inputs: vec![p_kind, s_kind],
            },
            metric,
            primary,
            secondary,
            output: Arc::new(StreamStore::new(metric.kind())),
            interval: metric.default_interval(),
            clock,
            sink: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn metric(&self) -> DerivedMetric {
        self.metric
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Compute the derived readings for the current window without touching
    /// the output store or the sink.
    pub fn calculate(&self) -> Result<Batch> {
        let now = self.clock.now();
        let primary = extract_window(&self.primary, self.interval, now)?;
        let secondary = extract_window(&self.secondary, self.interval, now)?;
        log::debug!(
            "{}: window {}s holds {} {} / {} {} readings",
            self.metric,
            self.interval.as_secs_f64(),
            primary.len(),
            self.primary.kind(),
            secondary.len(),
            self.secondary.kind()
        );

        let alignment = align(self.metric.align_mode(), primary, secondary);
        for m in alignment.mismatches() {
            let kind = match m.side {
                Side::Primary => self.primary.kind(),
                Side::Secondary => self.secondary.kind(),
            };
            log::info!(
                "{}: {} extra {kind} value(s) left unpaired",
                self.metric,
                m.count
            );
        }

        let mut readings = Vec::with_capacity(alignment.tuples.len());
        let mut skipped = 0;
        for tuple in &alignment.tuples {
            let p = tuple.primary.value;
            let s = tuple.secondary_mean();
            match self.metric.compute(p, s) {
                Ok(value) => readings.push(Reading::new(
                    self.clock.now(),
                    self.metric.source_name(),
                    self.metric.kind(),
                    value,
                )),
                Err(e) => {
                    log::warn!("{}: skipping tuple ({p}, {s}): {e}", self.metric);
                    skipped += 1;
                }
            }
        }

        Ok(Batch {
            readings,
            skipped,
            mismatches: alignment.mismatches(),
            persist_failed: false,
        })
    }
}

impl Producer for CalculationRunner {
    fn info(&self) -> &ProducerInfo {
        &self.info
    }

    fn output(&self) -> &Arc<StreamStore> {
        &self.output
    }

    fn run(&self) -> Result<Batch> {
        let mut batch = self.calculate()?;
        for r in &batch.readings {
            self.output.insert(r.clone());
        }
        log::info!(
            "{}: emitted {} reading(s), skipped {}",
            self.metric,
            batch.len(),
            batch.skipped
        );

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist(self.metric.kind(), &batch.readings) {
                log::warn!("{}: failed to persist batch: {e}", self.metric);
                batch.persist_failed = true;
            }
        }
        Ok(batch)
    }
}
