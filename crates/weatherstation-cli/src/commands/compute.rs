//! `weatherstation compute` — evaluate one formula.

use weatherstation_core::DerivedMetric;

/// Run the compute command. `secondary` is humidity for dew point and heat
/// index, wind speed for wind chill.
pub fn run(metric: DerivedMetric, temperature: f64, secondary: f64) {
    let (_, secondary_kind) = metric.inputs();
    match metric.compute(temperature, secondary) {
        Ok(value) => {
            let unit = metric.kind().unit();
            let input_unit = secondary_kind.unit();
            println!("{metric}: {value:.2} {unit}");
            println!("  temperature {temperature} °F, {secondary_kind} {secondary} {input_unit}");
        }
        Err(e) => super::fail(e),
    }
}
