use crate::error::AppError;
use crate::sensor::{DistanceSensor, EnvironmentSensor, Indicator, PresenceInput};
use crate::state::EnvironmentReading;

/// Scripted distance sensor. Each read consumes one script entry: `Some(cm)`
/// is a successful reading, `None` is a read failure. A drained script keeps
/// failing.
pub struct MockDistanceSensor {
    script: Vec<Option<f64>>,
    next_index: usize,
}

impl MockDistanceSensor {
    pub fn new(script: Vec<Option<f64>>) -> Self {
        Self {
            script,
            next_index: 0,
        }
    }

    pub fn reads_taken(&self) -> usize {
        self.next_index
    }
}

impl DistanceSensor for MockDistanceSensor {
    fn read_distance(&mut self) -> Result<f64, AppError> {
        let step = self.script.get(self.next_index).copied().flatten();
        self.next_index += 1;
        step.ok_or_else(|| AppError::Sensor("mock distance read failed".to_string()))
    }
}

/// Scripted temperature/humidity sensor. `Some((humidity, temperature))` is a
/// successful reading, `None` a failure. A drained script keeps failing.
pub struct MockEnvironmentSensor {
    script: Vec<Option<(f64, f64)>>,
    next_index: usize,
}

impl MockEnvironmentSensor {
    pub fn new(script: Vec<Option<(f64, f64)>>) -> Self {
        Self {
            script,
            next_index: 0,
        }
    }

    pub fn reads_taken(&self) -> usize {
        self.next_index
    }
}

impl EnvironmentSensor for MockEnvironmentSensor {
    fn read(&mut self) -> Result<EnvironmentReading, AppError> {
        let step = self.script.get(self.next_index).copied().flatten();
        self.next_index += 1;
        match step {
            Some((humidity, temperature)) => Ok(EnvironmentReading {
                humidity,
                temperature,
            }),
            None => Err(AppError::Sensor("mock dht read failed".to_string())),
        }
    }
}

/// Scripted presence input. A drained script repeats its last value (absent
/// when the script is empty).
pub struct MockPresenceInput {
    script: Vec<bool>,
    next_index: usize,
}

impl MockPresenceInput {
    pub fn new(script: Vec<bool>) -> Self {
        Self {
            script,
            next_index: 0,
        }
    }
}

impl PresenceInput for MockPresenceInput {
    fn is_present(&mut self) -> bool {
        let value = self
            .script
            .get(self.next_index)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(false);
        if self.next_index < self.script.len() {
            self.next_index += 1;
        }
        value
    }
}

/// Indicator that records every state it is set to.
#[derive(Default)]
pub struct MockIndicator {
    pub states: Vec<bool>,
}

impl MockIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_state(&self) -> Option<bool> {
        self.states.last().copied()
    }
}

impl Indicator for MockIndicator {
    fn set_active(&mut self, on: bool) -> Result<(), AppError> {
        self.states.push(on);
        Ok(())
    }
}
