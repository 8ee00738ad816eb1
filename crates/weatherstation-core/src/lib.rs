//! # weatherstation-core
//!
//! **Time-windowed derived metrics over live sensor streams.**
//!
//! `weatherstation-core` keeps every sensor stream in a timestamp-ordered store,
//! periodically cuts the last N seconds out of two streams, pairs them up
//! positionally and turns each pair into a derived reading: dew point, heat
//! index or wind chill.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use weatherstation_core::{MeasurementKind, Station, StationConfig, SystemClock};
//!
//! let station = Station::from_config(&StationConfig::default(), Arc::new(SystemClock))?;
//!
//! // Sample every sensor once, then compute every derived metric once
//! let emitted = station.tick_all();
//! println!("{emitted} readings emitted");
//!
//! let dew = station.store(MeasurementKind::DewPoint).unwrap();
//! if let Some(latest) = dew.latest() {
//!     println!("{latest}");
//! }
//! # Ok::<(), weatherstation_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Sensors → Stream stores → Window → Align → Formula → Derived store → Snapshot
//!
//! Two alignment modes:
//! - **1:1**: the i-th primary reading pairs with the i-th secondary reading
//!   (dew point, heat index).
//! - **1:3**: the i-th primary reading pairs with the mean of the i-th group of
//!   three secondary readings (wind chill; wind is sampled three times as
//!   often as temperature).
//!
//! Leftovers on either side are logged and dropped. A window with no readings
//! fails the whole invocation; a formula rejecting one pair only skips that
//! pair.
//!
//! Sensors and runners both implement the [`Producer`] trait. The [`Station`]
//! drives them on their cadences and keeps per-producer health statistics.

pub mod align;
pub mod clock;
pub mod config;
pub mod error;
pub mod formulas;
pub mod metric;
pub mod producer;
pub mod reading;
pub mod runner;
pub mod sensors;
pub mod snapshot;
pub mod station;
pub mod store;
pub mod window;

pub use align::{AlignMode, Aligned, Alignment, AlignmentMismatch, Side, align};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StationConfig;
pub use error::{DomainError, Error, Result};
pub use formulas::{dew_point, heat_index, wind_chill};
pub use metric::DerivedMetric;
pub use producer::{Batch, Producer, ProducerInfo, ProducerRole, ProducerStats};
pub use reading::{MeasurementKind, Reading, ReadingKey};
pub use runner::CalculationRunner;
pub use sensors::{SensorProducer, SensorSpec};
pub use snapshot::{MemorySink, Snapshot, SnapshotSink, SnapshotSummary, SnapshotWriter};
pub use station::{HealthReport, ProducerHealth, Station, StationHandle};
pub use store::StreamStore;
pub use window::extract_window;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
