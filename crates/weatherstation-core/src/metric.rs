//! Derived metric catalogue.
//!
//! Each [`DerivedMetric`] declares its two input kinds, its alignment mode,
//! its default window interval and which formula it applies to an aligned
//! tuple.

use std::time::Duration;

use crate::align::AlignMode;
use crate::error::DomainError;
use crate::formulas;
use crate::reading::MeasurementKind;

/// A metric computed from two aligned input streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedMetric {
    /// Temperature + humidity, 1:1, 15 s window.
    DewPoint,
    /// Temperature + humidity, 1:1, 15 s window.
    HeatIndex,
    /// Temperature + wind speed, 1:3, 12 s window.
    WindChill,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 3] = [Self::DewPoint, Self::HeatIndex, Self::WindChill];

    /// Kind of the readings this metric emits.
    pub const fn kind(&self) -> MeasurementKind {
        match self {
            Self::DewPoint => MeasurementKind::DewPoint,
            Self::HeatIndex => MeasurementKind::HeatIndex,
            Self::WindChill => MeasurementKind::WindChill,
        }
    }

    /// Source name stamped on emitted readings.
    pub const fn source_name(&self) -> &'static str {
        match self {
            Self::DewPoint => "Dew Point",
            Self::HeatIndex => "Heat Index",
            Self::WindChill => "Wind Chill",
        }
    }

    /// `(primary, secondary)` input kinds.
    pub const fn inputs(&self) -> (MeasurementKind, MeasurementKind) {
        match self {
            Self::DewPoint | Self::HeatIndex => {
                (MeasurementKind::Temperature, MeasurementKind::Humidity)
            }
            Self::WindChill => (MeasurementKind::Temperature, MeasurementKind::WindSpeed),
        }
    }

    pub const fn align_mode(&self) -> AlignMode {
        match self {
            Self::DewPoint | Self::HeatIndex => AlignMode::OneToOne,
            Self::WindChill => AlignMode::ONE_TO_THREE,
        }
    }

    pub const fn default_interval(&self) -> Duration {
        match self {
            Self::DewPoint | Self::HeatIndex => Duration::from_secs(15),
            Self::WindChill => Duration::from_secs(12),
        }
    }

    /// Apply the metric's formula to a primary value and the (reduced)
    /// secondary value.
    pub fn compute(&self, primary: f64, secondary: f64) -> Result<f64, DomainError> {
        match self {
            Self::DewPoint => formulas::dew_point(primary, secondary),
            Self::HeatIndex => formulas::heat_index(secondary, primary),
            Self::WindChill => formulas::wind_chill(primary, secondary),
        }
    }
}

impl std::fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_intervals() {
        assert_eq!(DerivedMetric::DewPoint.default_interval().as_secs(), 15);
        assert_eq!(DerivedMetric::HeatIndex.default_interval().as_secs(), 15);
        assert_eq!(DerivedMetric::WindChill.default_interval().as_secs(), 12);
    }

    #[test]
    fn test_heat_index_passes_humidity_first() {
        let via_metric = DerivedMetric::HeatIndex.compute(90.0, 40.0).unwrap();
        assert_eq!(via_metric, formulas::heat_index(40.0, 90.0).unwrap());
    }

    #[test]
    fn test_wind_chill_routes_through_validated_formula() {
        assert!(DerivedMetric::WindChill.compute(50.0, 2.0).is_err());
        assert!(DerivedMetric::WindChill.compute(50.0, 10.0).is_ok());
    }

    #[test]
    fn test_emitted_kinds_are_derived() {
        for m in DerivedMetric::ALL {
            assert!(m.kind().is_derived());
            let (p, s) = m.inputs();
            assert!(!p.is_derived() && !s.is_derived());
        }
    }
}
