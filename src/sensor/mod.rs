use crate::error::AppError;
use crate::state::EnvironmentReading;
use std::time::Duration;
use tracing::warn;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod grove;

/// Blocking ultrasonic distance read in centimeters. Negative values are
/// treated as invalid by all callers.
pub trait DistanceSensor {
    fn read_distance(&mut self) -> Result<f64, AppError>;
}

/// Blocking temperature/humidity read.
pub trait EnvironmentSensor {
    fn read(&mut self) -> Result<EnvironmentReading, AppError>;
}

/// Digital input indicating a vessel is placed on the sensing fixture.
pub trait PresenceInput {
    fn is_present(&mut self) -> bool;
}

/// Binary indicator output (LED).
pub trait Indicator {
    fn set_active(&mut self, on: bool) -> Result<(), AppError>;
}

/// Read the distance sensor up to `attempts` times, sleeping `retry_delay`
/// between failed attempts, and return the first valid (non-negative) value.
pub fn read_distance_with_retries<S: DistanceSensor + ?Sized>(
    sensor: &mut S,
    attempts: u32,
    retry_delay: Duration,
) -> Option<f64> {
    for attempt in 1..=attempts {
        match sensor.read_distance() {
            Ok(distance) if distance >= 0.0 => return Some(distance),
            Ok(distance) => {
                warn!(attempt, distance, "Sensor returned negative distance");
            }
            Err(err) => {
                warn!(attempt, error = %err, "Sensor reading attempt failed");
            }
        }
        if attempt < attempts && !retry_delay.is_zero() {
            std::thread::sleep(retry_delay);
        }
    }
    None
}
