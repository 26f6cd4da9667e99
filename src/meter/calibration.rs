use crate::sensor::DistanceSensor;
use crate::state::{CalibrationResult, CalibrationSource};
use tracing::{debug, info, warn};

/// Establish the zero-level reference distance by averaging up to `attempts`
/// raw readings. Invalid samples (errors, negative values) are dropped; if
/// none survive, the configured default is used. Never fails.
pub fn calibrate<S: DistanceSensor + ?Sized>(
    sensor: &mut S,
    attempts: u32,
    default_cm: f64,
) -> CalibrationResult {
    let mut samples = Vec::with_capacity(attempts as usize);

    for attempt in 1..=attempts {
        match sensor.read_distance() {
            Ok(distance) if distance >= 0.0 => {
                debug!(attempt, distance_cm = distance, "Calibration read");
                samples.push(distance);
            }
            Ok(distance) => {
                warn!(attempt, distance_cm = distance, "Calibration read invalid");
            }
            Err(err) => {
                warn!(attempt, error = %err, "Calibration read failed");
            }
        }
    }

    if samples.is_empty() {
        warn!(
            default_cm,
            "Calibration failed, falling back to default reference"
        );
        return CalibrationResult {
            reference_distance_cm: default_cm,
            source: CalibrationSource::DefaultFallback,
        };
    }

    let reference = samples.iter().sum::<f64>() / samples.len() as f64;
    info!(
        reference_cm = reference,
        samples = samples.len(),
        "Calibrated empty-vessel distance"
    );
    CalibrationResult {
        reference_distance_cm: reference,
        source: CalibrationSource::Measured,
    }
}
