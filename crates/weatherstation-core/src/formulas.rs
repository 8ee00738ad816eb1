//! Derived-metric formulas.
//!
//! **All** derived-metric math lives here. Runners, the CLI and tests call
//! these functions; nothing else re-implements a formula, so each validity
//! precondition is enforced in exactly one place.
//!
//! Every function is pure and returns a [`DomainError`] instead of NaN or
//! infinity when its inputs are out of range.

use crate::error::DomainError;

/// Wind chill is only meaningful at or above this wind speed (mph).
pub const WIND_CHILL_MIN_WIND_MPH: f64 = 3.0;

/// Simple-equation heat index at or above which the regression is used.
pub const HEAT_INDEX_REGRESSION_THRESHOLD: f64 = 80.0;

const MAGNUS_B: f64 = 17.27;
const MAGNUS_C: f64 = 237.3;

fn require_finite(formula: &'static str, name: &str, v: f64) -> Result<(), DomainError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(DomainError::new(
            formula,
            format!("{name} is not finite ({v})"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Dew point
// ---------------------------------------------------------------------------

/// Dew point from air temperature and relative humidity (percent, `(0, 100]`).
///
/// Magnus approximation:
/// `a = ln(RH/100) + 17.27·T / (237.3 + T)`, `dp = 237.3·a / (17.27 − a)`.
pub fn dew_point(temperature: f64, relative_humidity: f64) -> Result<f64, DomainError> {
    const NAME: &str = "dew_point";
    require_finite(NAME, "temperature", temperature)?;
    require_finite(NAME, "relative humidity", relative_humidity)?;
    if relative_humidity <= 0.0 || relative_humidity > 100.0 {
        return Err(DomainError::new(
            NAME,
            format!("relative humidity must be in (0, 100], got {relative_humidity}"),
        ));
    }

    let ln_rh = (relative_humidity / 100.0).ln();
    let a = ln_rh + (MAGNUS_B * temperature) / (MAGNUS_C + temperature);
    let dp = (MAGNUS_C * a) / (MAGNUS_B - a);
    if !dp.is_finite() {
        return Err(DomainError::new(
            NAME,
            format!("no finite dew point for T={temperature}, RH={relative_humidity}"),
        ));
    }
    Ok(dp)
}

// ---------------------------------------------------------------------------
// Heat index
// ---------------------------------------------------------------------------

/// Heat index (°F) from relative humidity (percent) and temperature (°F).
///
/// Starts from the simple Steadman estimate; when that reaches 80 °F the
/// Rothfusz regression is used instead, with at most one of the NWS low- or
/// high-humidity adjustments applied.
pub fn heat_index(relative_humidity: f64, temperature: f64) -> Result<f64, DomainError> {
    const NAME: &str = "heat_index";
    require_finite(NAME, "temperature", temperature)?;
    require_finite(NAME, "relative humidity", relative_humidity)?;
    if !(0.0..=100.0).contains(&relative_humidity) {
        return Err(DomainError::new(
            NAME,
            format!("relative humidity must be in [0, 100], got {relative_humidity}"),
        ));
    }

    let simple = heat_index_simple(relative_humidity, temperature);
    if simple < HEAT_INDEX_REGRESSION_THRESHOLD {
        return Ok(simple);
    }
    let adjustment = heat_index_adjustment(relative_humidity, temperature);
    Ok(rothfusz(relative_humidity, temperature) + adjustment)
}

/// `0.5·(T + 61 + (T − 68)·1.2 + RH·0.094)`.
pub fn heat_index_simple(relative_humidity: f64, temperature: f64) -> f64 {
    0.5 * (temperature + 61.0 + (temperature - 68.0) * 1.2 + relative_humidity * 0.094)
}

/// Unadjusted Rothfusz regression.
pub fn rothfusz(relative_humidity: f64, temperature: f64) -> f64 {
    let t = temperature;
    let rh = relative_humidity;
    let t2 = t * t;
    let rh2 = rh * rh;
    -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 0.006_837_83 * t2
        - 0.054_817_17 * rh2
        + 0.001_228_74 * t2 * rh
        + 0.000_852_82 * t * rh2
        - 0.000_001_99 * t2 * rh2
}

/// Signed correction added to the regression value. The two regions cannot
/// both apply.
fn heat_index_adjustment(rh: f64, t: f64) -> f64 {
    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        -((13.0 - rh) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt()
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        ((rh - 85.0) / 10.0) * ((87.0 - t) / 5.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Wind chill
// ---------------------------------------------------------------------------

/// Wind chill (°F) from temperature (°F) and wind speed (mph).
///
/// `35.74 + 0.6215·T − 35.75·v^0.16 + 0.4275·T·v^0.16`. Wind speeds below
/// [`WIND_CHILL_MIN_WIND_MPH`] are rejected.
pub fn wind_chill(temperature: f64, wind_mph: f64) -> Result<f64, DomainError> {
    const NAME: &str = "wind_chill";
    require_finite(NAME, "temperature", temperature)?;
    require_finite(NAME, "wind speed", wind_mph)?;
    if wind_mph < WIND_CHILL_MIN_WIND_MPH {
        return Err(DomainError::new(
            NAME,
            format!("wind speed must be at least {WIND_CHILL_MIN_WIND_MPH} mph, got {wind_mph}"),
        ));
    }
    let v = wind_mph.powf(0.16);
    Ok(35.74 + 0.6215 * temperature - 35.75 * v + 0.4275 * temperature * v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    // -----------------------------------------------------------------------
    // Dew point
    // -----------------------------------------------------------------------

    #[test]
    fn test_dew_point_pinned_value() {
        // Formula value for T=68, RH=70.
        let dp = dew_point(68.0, 70.0).unwrap();
        assert!(close(dp, 60.0978, 1e-3), "got {dp}");
    }

    #[test]
    fn test_dew_point_at_saturation_equals_temperature() {
        for t in [-10.0, 0.0, 20.0, 68.0, 95.0] {
            let dp = dew_point(t, 100.0).unwrap();
            assert!(close(dp, t, 1e-9), "T={t} dp={dp}");
        }
    }

    #[test]
    fn test_dew_point_finite_over_valid_humidity() {
        for rh in [0.5, 1.0, 10.0, 33.3, 50.0, 70.0, 99.9, 100.0] {
            for t in [-20.0, 32.0, 68.0, 104.0] {
                assert!(dew_point(t, rh).unwrap().is_finite());
            }
        }
    }

    #[test]
    fn test_dew_point_below_temperature_when_unsaturated() {
        let dp = dew_point(20.0, 70.0).unwrap();
        assert!(dp < 20.0);
        assert!(close(dp, 14.3644, 1e-3), "got {dp}");
    }

    #[test]
    fn test_dew_point_rejects_zero_humidity() {
        let err = dew_point(68.0, 0.0).unwrap_err();
        assert_eq!(err.formula, "dew_point");
    }

    #[test]
    fn test_dew_point_rejects_out_of_range_and_nan() {
        assert!(dew_point(68.0, -5.0).is_err());
        assert!(dew_point(68.0, 100.1).is_err());
        assert!(dew_point(f64::NAN, 50.0).is_err());
        assert!(dew_point(68.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_dew_point_rejects_singular_temperature() {
        // T = -237.3 makes the Magnus term blow up.
        assert!(dew_point(-237.3, 50.0).is_err());
    }

    // -----------------------------------------------------------------------
    // Heat index
    // -----------------------------------------------------------------------

    #[test]
    fn test_heat_index_regression_branch_without_adjustment() {
        assert!(heat_index_simple(40.0, 90.0) >= HEAT_INDEX_REGRESSION_THRESHOLD);
        let hi = heat_index(40.0, 90.0).unwrap();
        assert_eq!(hi, rothfusz(40.0, 90.0));
        assert!(close(hi, 90.6797, 1e-3), "got {hi}");
    }

    #[test]
    fn test_heat_index_simple_branch_below_threshold() {
        let hi = heat_index(50.0, 70.0).unwrap();
        assert!(close(hi, 69.05, 1e-9), "got {hi}");
    }

    #[test]
    fn test_heat_index_low_humidity_adjustment() {
        let hi = heat_index(10.0, 100.0).unwrap();
        let expected = rothfusz(10.0, 100.0) - (3.0 / 4.0) * (12.0f64 / 17.0).sqrt();
        assert!(close(hi, expected, 1e-12));
        assert!(close(hi, 94.1225, 1e-3), "got {hi}");
    }

    #[test]
    fn test_heat_index_high_humidity_adjustment() {
        let hi = heat_index(90.0, 85.0).unwrap();
        let expected = rothfusz(90.0, 85.0) + (5.0 / 10.0) * (2.0 / 5.0);
        assert!(close(hi, expected, 1e-12));
        assert!(close(hi, 101.7808, 1e-3), "got {hi}");
    }

    #[test]
    fn test_heat_index_high_humidity_outside_band_not_adjusted() {
        let hi = heat_index(90.0, 95.0).unwrap();
        assert_eq!(hi, rothfusz(90.0, 95.0));
    }

    #[test]
    fn test_heat_index_threshold_straddle() {
        // At 50% the simple value crosses 80 between 79.9 and 80.0 °F.
        assert!(heat_index_simple(50.0, 79.9) < HEAT_INDEX_REGRESSION_THRESHOLD);
        assert!(heat_index_simple(50.0, 80.0) >= HEAT_INDEX_REGRESSION_THRESHOLD);
        let below = heat_index_simple(50.0, 79.9);
        assert_eq!(heat_index(50.0, 79.9).unwrap(), below);
        assert_eq!(heat_index(50.0, 80.0).unwrap(), rothfusz(50.0, 80.0));
    }

    #[test]
    fn test_heat_index_branch_follows_simple_value() {
        for step in 0..=200 {
            let t = 79.0 + step as f64 * 0.01;
            let simple = heat_index_simple(50.0, t);
            let hi = heat_index(50.0, t).unwrap();
            if simple < HEAT_INDEX_REGRESSION_THRESHOLD {
                assert_eq!(hi, simple, "T={t}");
            } else {
                assert_eq!(hi, rothfusz(50.0, t), "T={t}");
            }
        }
    }

    #[test]
    fn test_heat_index_high_humidity_band_edges() {
        // 80 °F is inside the band: (90 - 85) / 10 * (87 - 80) / 5 = 0.7.
        let hi = heat_index(90.0, 80.0).unwrap();
        assert!(close(hi, rothfusz(90.0, 80.0) + 0.7, 1e-12), "got {hi}");
        // At 87 °F the correction has shrunk to zero.
        assert_eq!(heat_index(90.0, 87.0).unwrap(), rothfusz(90.0, 87.0));
        // Just outside either edge nothing is added.
        assert_eq!(heat_index(90.0, 79.5).unwrap(), rothfusz(90.0, 79.5));
        assert_eq!(heat_index(90.0, 87.5).unwrap(), rothfusz(90.0, 87.5));
        // 85% itself is not "above 85%".
        assert_eq!(heat_index(85.0, 85.0).unwrap(), rothfusz(85.0, 85.0));
    }

    #[test]
    fn test_heat_index_low_humidity_band_edges() {
        // Deepest correction at 95 °F.
        let hi = heat_index(10.0, 95.0).unwrap();
        assert!(close(hi, rothfusz(10.0, 95.0) - 0.75, 1e-12), "got {hi}");
        // At 112 °F the correction is zero, past it there is none.
        assert_eq!(heat_index(10.0, 112.0).unwrap(), rothfusz(10.0, 112.0));
        assert_eq!(heat_index(10.0, 112.5).unwrap(), rothfusz(10.0, 112.5));
        // 13% itself is not "below 13%".
        assert_eq!(heat_index(13.0, 100.0).unwrap(), rothfusz(13.0, 100.0));
        // Dry air at 80 °F stays on the simple equation.
        assert!(heat_index_simple(12.9, 80.0) < HEAT_INDEX_REGRESSION_THRESHOLD);
        let dry = heat_index_simple(10.0, 80.0);
        assert_eq!(heat_index(10.0, 80.0).unwrap(), dry);
    }

    #[test]
    fn test_heat_index_rejects_bad_humidity() {
        assert!(heat_index(-1.0, 90.0).is_err());
        assert!(heat_index(101.0, 90.0).is_err());
        assert!(heat_index(f64::NAN, 90.0).is_err());
    }

    // -----------------------------------------------------------------------
    // Wind chill
    // -----------------------------------------------------------------------

    #[test]
    fn test_wind_chill_pinned_value() {
        let wc = wind_chill(50.0, 10.0).unwrap();
        assert!(close(wc, 46.0368, 1e-3), "got {wc}");
    }

    #[test]
    fn test_wind_chill_cold_and_windy() {
        let wc = wind_chill(20.0, 15.0).unwrap();
        assert!(close(wc, 6.2189, 1e-3), "got {wc}");
    }

    #[test]
    fn test_wind_chill_rejects_calm_wind() {
        let err = wind_chill(50.0, 2.0).unwrap_err();
        assert_eq!(err.formula, "wind_chill");
        assert!(err.reason.contains("at least 3"));
    }

    #[test]
    fn test_wind_chill_accepts_threshold() {
        assert!(wind_chill(40.0, WIND_CHILL_MIN_WIND_MPH).is_ok());
    }

    #[test]
    fn test_wind_chill_rejects_non_finite() {
        assert!(wind_chill(f64::NAN, 10.0).is_err());
        assert!(wind_chill(30.0, f64::INFINITY).is_err());
    }
}
