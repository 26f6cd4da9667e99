use crate::config::Config;
use crate::sensor::{DistanceSensor, EnvironmentSensor, PresenceInput};
use crate::state::{
    CalibrationResult, EnvironmentReading, EnvironmentalCache, FILL_LEVEL_READ_ERROR_CM,
    MeasurementRecord, SessionState,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use time::{OffsetDateTime, Time};
use tracing::{error, info, warn};

pub mod calibration;
pub mod storage;

use calibration::calibrate;
use storage::SessionWriter;

/// Poll rate while waiting for a vessel to appear.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct MeterSettings {
    pub calibration_reads: u32,
    pub calibration_delay: Duration,
    pub min_interval: Duration,
    pub environment_read_interval: u32,
    pub default_reference_cm: f64,
    pub output_path: PathBuf,
}

impl MeterSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            calibration_reads: config.calibration_reads(),
            calibration_delay: config.calibration_delay(),
            min_interval: config.min_interval(),
            environment_read_interval: config.environment_read_interval(),
            default_reference_cm: config.default_reference_cm(),
            output_path: config.output_path(),
        }
    }
}

/// Liquid level meter: a presence-driven session state machine over one
/// ultrasonic, one environmental and one digital input. One vessel in flight
/// at a time; each session runs Idle → Calibrating → Sampling → Idle and
/// ends with a CSV flush.
pub struct LevelMeter<D, E, P> {
    distance: D,
    environment: E,
    presence: P,
    settings: MeterSettings,
    writer: SessionWriter,
    state: SessionState,
    buffer: Vec<MeasurementRecord>,
    cache: EnvironmentalCache,
    calibration: Option<CalibrationResult>,
    tick_counter: u32,
}

impl<D, E, P> LevelMeter<D, E, P>
where
    D: DistanceSensor,
    E: EnvironmentSensor,
    P: PresenceInput,
{
    pub fn new(distance: D, environment: E, presence: P, settings: MeterSettings) -> Self {
        let writer = SessionWriter::new(&settings.output_path);
        Self {
            distance,
            environment,
            presence,
            settings,
            writer,
            state: SessionState::Idle,
            buffer: Vec::new(),
            cache: EnvironmentalCache::new(),
            calibration: None,
            tick_counter: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn calibration(&self) -> Option<CalibrationResult> {
        self.calibration
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.buffer
    }

    /// Advance the state machine by one step. Sleeping between steps is the
    /// caller's job (see `run`); only the calibration stabilization delay is
    /// enforced here, as part of the Idle → Calibrating transition.
    pub fn poll(&mut self, now: Time) {
        match self.state {
            SessionState::Idle => self.check_for_vessel(),
            // Calibrating completes within the transition below and is never
            // observed across polls.
            SessionState::Calibrating => {}
            SessionState::Sampling => self.sample_tick(now),
        }
    }

    fn check_for_vessel(&mut self) {
        if !self.presence.is_present() {
            return;
        }

        info!("Vessel detected, starting calibration");
        self.state = SessionState::Calibrating;

        // Let the vessel settle on the fixture before taking reference reads.
        if !self.settings.calibration_delay.is_zero() {
            std::thread::sleep(self.settings.calibration_delay);
        }

        let result = calibrate(
            &mut self.distance,
            self.settings.calibration_reads,
            self.settings.default_reference_cm,
        );
        self.calibration = Some(result);
        self.tick_counter = 0;
        self.state = SessionState::Sampling;
        info!("Starting measurement session");
    }

    fn sample_tick(&mut self, now: Time) {
        if !self.presence.is_present() {
            info!("Vessel removed, stopping measurement");
            self.end_session();
            return;
        }

        let env = self.environment_values();
        let fill_level = self.fill_level();
        self.buffer.push(MeasurementRecord {
            time: now,
            temperature: env.temperature,
            humidity: env.humidity,
            fill_level_cm: fill_level,
        });
        info!(
            temperature = format_args!("{:.1}", env.temperature),
            humidity = format_args!("{:.1}", env.humidity),
            fill_cm = format_args!("{fill_level:.1}"),
            "Measurement"
        );
        self.tick_counter += 1;
    }

    /// Fresh environmental read every Nth tick; every other tick, and every
    /// tick whose fresh read fails, reuses the carried-forward cache.
    fn environment_values(&mut self) -> EnvironmentReading {
        if self.tick_counter % self.settings.environment_read_interval == 0 {
            match self.environment.read() {
                Ok(reading) => {
                    self.cache.update(reading);
                    return reading;
                }
                Err(err) => {
                    warn!(error = %err, "Environmental read failed, keeping last known values");
                }
            }
        }
        EnvironmentReading {
            humidity: self.cache.last_humidity,
            temperature: self.cache.last_temperature,
        }
    }

    fn fill_level(&mut self) -> f64 {
        let reference = match self.calibration {
            Some(calibration) => calibration.reference_distance_cm,
            None => self.settings.default_reference_cm,
        };
        match self.distance.read_distance() {
            Ok(distance) if distance >= 0.0 => reference - distance,
            Ok(distance) => {
                warn!(distance_cm = distance, "Negative distance reading");
                FILL_LEVEL_READ_ERROR_CM
            }
            Err(err) => {
                warn!(error = %err, "Distance read failed");
                FILL_LEVEL_READ_ERROR_CM
            }
        }
    }

    fn end_session(&mut self) {
        self.state = SessionState::Idle;
        self.calibration = None;
        let records = std::mem::take(&mut self.buffer);
        if let Err(err) = self.writer.flush(&records) {
            error!(error = %err, "Failed to save session data");
        }
    }

    /// Graceful-exit path: an interrupted process flushes an active session
    /// exactly like a normal vessel removal.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::Sampling {
            info!("Saving active session before shutdown");
            self.end_session();
        }
    }

    pub fn run(&mut self, stop: &AtomicBool) {
        info!("Level meter ready; place a vessel on the fixture to start");
        while !stop.load(Ordering::Relaxed) {
            let tick_start = Instant::now();
            self.poll(now_time());
            let interval = match self.state {
                SessionState::Sampling => self.settings.min_interval,
                _ => IDLE_POLL_INTERVAL,
            };
            crate::tick::sleep_remainder(interval, tick_start, stop);
        }
        self.shutdown();
        info!("Level meter stopped");
    }
}

/// Wall-clock time of day, preferring the local offset.
pub fn now_time() -> Time {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .time()
}
