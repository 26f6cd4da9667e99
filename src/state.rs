use time::Time;

/// Fill level recorded when the distance read failed for a tick. This is a
/// domain sentinel, not a missing value: it is persisted as-is.
pub const FILL_LEVEL_READ_ERROR_CM: f64 = -999.0;

/// One sampled measurement inside a session, insertion-ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub time: Time,
    pub temperature: f64,
    pub humidity: f64,
    pub fill_level_cm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Calibrating,
    Sampling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSource {
    Measured,
    DefaultFallback,
}

/// Zero-level reference established at session start. Immutable for the
/// lifetime of the session; no re-calibration mid-session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    pub reference_distance_cm: f64,
    pub source: CalibrationSource,
}

/// A successful temperature/humidity read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    pub humidity: f64,
    pub temperature: f64,
}

/// Last successfully read environmental values, carried forward whenever a
/// fresh read fails or is skipped by throttling. Lives for the whole process,
/// not per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentalCache {
    pub last_temperature: f64,
    pub last_humidity: f64,
}

impl EnvironmentalCache {
    pub fn new() -> Self {
        Self {
            last_temperature: -1.0,
            last_humidity: -1.0,
        }
    }

    pub fn update(&mut self, reading: EnvironmentReading) {
        self.last_temperature = reading.temperature;
        self.last_humidity = reading.humidity;
    }
}

impl Default for EnvironmentalCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_starts_with_placeholder_values() {
        let cache = EnvironmentalCache::new();

        assert_eq!(cache.last_temperature, -1.0);
        assert_eq!(cache.last_humidity, -1.0);
    }

    #[test]
    fn cache_update_overwrites_both_values() {
        let mut cache = EnvironmentalCache::new();

        cache.update(EnvironmentReading {
            humidity: 55.0,
            temperature: 22.5,
        });

        assert_eq!(cache.last_temperature, 22.5);
        assert_eq!(cache.last_humidity, 55.0);
    }

    #[test]
    fn error_sentinel_is_negative_large() {
        assert!(FILL_LEVEL_READ_ERROR_CM < 0.0);
        assert!(FILL_LEVEL_READ_ERROR_CM.abs() > 100.0);
    }
}
