//! Timestamped readings and measurement kinds.
//!
//! Every value that flows through the station, raw or derived, is a
//! [`Reading`]. Readings are ordered by timestamp, with ties broken by a
//! process-wide sequence number stamped at construction, so the order key
//! `(timestamp, seq)` is unique for every reading created in one process.
//! Readings that arrive from elsewhere (a reloaded snapshot) push the counter
//! past their own numbers when they enter a store.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What a stream of readings measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Air temperature, °F.
    Temperature,
    /// Relative humidity, percent (80% is `80.0`, not `0.8`).
    Humidity,
    /// Wind speed, mph.
    WindSpeed,
    /// Rainfall, inches.
    Rainfall,
    /// Derived dew point.
    DewPoint,
    /// Derived heat index, °F.
    HeatIndex,
    /// Derived wind chill, °F.
    WindChill,
}

impl MeasurementKind {
    /// Every kind, raw kinds first.
    pub const ALL: [MeasurementKind; 7] = [
        Self::Temperature,
        Self::Humidity,
        Self::WindSpeed,
        Self::Rainfall,
        Self::DewPoint,
        Self::HeatIndex,
        Self::WindChill,
    ];

    /// Stable snake_case name, also used for snapshot file names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::WindSpeed => "wind_speed",
            Self::Rainfall => "rainfall",
            Self::DewPoint => "dew_point",
            Self::HeatIndex => "heat_index",
            Self::WindChill => "wind_chill",
        }
    }

    /// Display unit.
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Humidity => "%",
            Self::WindSpeed => "mph",
            Self::Rainfall => "in",
            _ => "°F",
        }
    }

    /// Whether readings of this kind are computed rather than sampled.
    pub const fn is_derived(&self) -> bool {
        matches!(self, Self::DewPoint | Self::HeatIndex | Self::WindChill)
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::WindSpeed => "wind speed",
            Self::Rainfall => "rainfall",
            Self::DewPoint => "dew point",
            Self::HeatIndex => "heat index",
            Self::WindChill => "wind chill",
        };
        f.pad(name)
    }
}

impl FromStr for MeasurementKind {
    type Err = Error;

    /// Accepts the snake_case name, the display name, or a kebab-case variant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Unique ordering key of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadingKey {
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
}

impl ReadingKey {
    /// Smallest key at `timestamp`; every reading at or after `timestamp`
    /// sorts at or after it.
    pub const fn lower_bound(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, seq: 0 }
    }
}

/// One timestamped scalar observation or derived value.
///
/// Equality and ordering consider only the [`ReadingKey`]; two readings with
/// the same key are the same reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
    pub source: String,
    pub kind: MeasurementKind,
    pub value: f64,
}

impl Reading {
    /// Create a reading, stamping it with the next sequence number.
    pub fn new(
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        kind: MeasurementKind,
        value: f64,
    ) -> Self {
        Self {
            timestamp,
            seq: NEXT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            source: source.into(),
            kind,
            value,
        }
    }

    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            timestamp: self.timestamp,
            seq: self.seq,
        }
    }
}

/// Move the sequence counter past `seq`.
pub(crate) fn reserve_seq(seq: u64) {
    NEXT_SEQ.fetch_max(seq.saturating_add(1), AtomicOrdering::Relaxed);
}

impl PartialEq for Reading {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Reading {}

impl PartialOrd for Reading {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reading {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:<12} {:>9.2} {:<3} ({})",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.kind.as_str(),
            self.value,
            self.kind.unit(),
            self.source
        )
    }
}
