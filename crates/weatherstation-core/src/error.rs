//! Error types for weatherstation.

use std::time::Duration;

use thiserror::Error;

use crate::reading::MeasurementKind;

/// Result type alias using weatherstation's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for weatherstation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No reading of `kind` fell inside the requested window.
    #[error("no {kind} readings in the last {}s", interval.as_secs_f64())]
    EmptyWindow {
        kind: MeasurementKind,
        interval: Duration,
    },

    /// A formula was given inputs outside its domain.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A measurement kind name could not be parsed.
    #[error("unknown measurement kind: {0}")]
    UnknownKind(String),

    /// Invalid station configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or config (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid numeric input to one of the formulas in [`crate::formulas`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{formula}: {reason}")]
pub struct DomainError {
    /// Formula that rejected its inputs (e.g. `"wind_chill"`).
    pub formula: &'static str,
    /// Human-readable description of the violated precondition.
    pub reason: String,
}

impl DomainError {
    pub fn new(formula: &'static str, reason: impl Into<String>) -> Self {
        Self {
            formula,
            reason: reason.into(),
        }
    }
}
