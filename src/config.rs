use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

pub const DEFAULT_CALIBRATION_READS: u32 = 5;
pub const DEFAULT_CALIBRATION_DELAY_MS: u64 = 1500;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 100;
pub const DEFAULT_ENVIRONMENT_READ_INTERVAL: u32 = 2;
pub const DEFAULT_REFERENCE_CM: f64 = 15.0;
pub const DEFAULT_OUTPUT_PATH: &str = "data/tea_session_data.csv";

pub const DEFAULT_THRESHOLD_CM: f64 = 10.0;
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 200;
pub const DEFAULT_SENSOR_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

pub const DEFAULT_REPORT_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_SONAR_PIN: u8 = 12;
pub const DEFAULT_DHT_PIN: u8 = 5;
pub const DEFAULT_BUTTON_PIN: u8 = 16;
pub const DEFAULT_LED_PIN: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Meter,
    Parking,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub meter: Option<MeterSection>,
    #[serde(default)]
    pub parking: Option<ParkingSection>,
    #[serde(default)]
    pub reporting: Option<ReportingSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
    pub mode: AppMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeterSection {
    /// GPIO pins for the ultrasonic ranger, DHT sensor and presence button.
    pub sonar_pin: Option<u8>,
    pub dht_pin: Option<u8>,
    pub button_pin: Option<u8>,
    pub calibration_reads: Option<u32>,
    pub calibration_delay_ms: Option<u64>,
    pub min_interval_ms: Option<u64>,
    pub environment_read_interval: Option<u32>,
    pub default_reference_cm: Option<f64>,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParkingSection {
    pub sonar_pin: Option<u8>,
    pub led_pin: Option<u8>,
    pub threshold_cm: Option<f64>,
    pub check_interval_ms: Option<u64>,
    pub sensor_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportingSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn mode(&self) -> AppMode {
        self.app.mode
    }

    pub fn calibration_reads(&self) -> u32 {
        self.meter
            .as_ref()
            .and_then(|s| s.calibration_reads)
            .unwrap_or(DEFAULT_CALIBRATION_READS)
    }

    /// Settling delay after a vessel is detected, before calibration starts.
    pub fn calibration_delay(&self) -> Duration {
        let ms = self
            .meter
            .as_ref()
            .and_then(|s| s.calibration_delay_ms)
            .unwrap_or(DEFAULT_CALIBRATION_DELAY_MS);
        Duration::from_millis(ms)
    }

    /// Minimum wall-clock interval between sampling tick starts.
    pub fn min_interval(&self) -> Duration {
        let ms = self
            .meter
            .as_ref()
            .and_then(|s| s.min_interval_ms)
            .unwrap_or(DEFAULT_MIN_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    /// Fresh environmental reads happen every N sampling ticks.
    pub fn environment_read_interval(&self) -> u32 {
        self.meter
            .as_ref()
            .and_then(|s| s.environment_read_interval)
            .unwrap_or(DEFAULT_ENVIRONMENT_READ_INTERVAL)
            .max(1)
    }

    pub fn default_reference_cm(&self) -> f64 {
        self.meter
            .as_ref()
            .and_then(|s| s.default_reference_cm)
            .unwrap_or(DEFAULT_REFERENCE_CM)
    }

    pub fn output_path(&self) -> PathBuf {
        self.meter
            .as_ref()
            .and_then(|s| s.output_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }

    pub fn meter_sonar_pin(&self) -> u8 {
        self.meter
            .as_ref()
            .and_then(|s| s.sonar_pin)
            .unwrap_or(DEFAULT_SONAR_PIN)
    }

    pub fn dht_pin(&self) -> u8 {
        self.meter
            .as_ref()
            .and_then(|s| s.dht_pin)
            .unwrap_or(DEFAULT_DHT_PIN)
    }

    pub fn button_pin(&self) -> u8 {
        self.meter
            .as_ref()
            .and_then(|s| s.button_pin)
            .unwrap_or(DEFAULT_BUTTON_PIN)
    }

    pub fn parking_sonar_pin(&self) -> u8 {
        self.parking
            .as_ref()
            .and_then(|s| s.sonar_pin)
            .unwrap_or(DEFAULT_SONAR_PIN)
    }

    pub fn led_pin(&self) -> u8 {
        self.parking
            .as_ref()
            .and_then(|s| s.led_pin)
            .unwrap_or(DEFAULT_LED_PIN)
    }

    pub fn threshold_cm(&self) -> f64 {
        self.parking
            .as_ref()
            .and_then(|s| s.threshold_cm)
            .unwrap_or(DEFAULT_THRESHOLD_CM)
    }

    pub fn check_interval(&self) -> Duration {
        let ms = self
            .parking
            .as_ref()
            .and_then(|s| s.check_interval_ms)
            .unwrap_or(DEFAULT_CHECK_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    pub fn sensor_retries(&self) -> u32 {
        self.parking
            .as_ref()
            .and_then(|s| s.sensor_retries)
            .unwrap_or(DEFAULT_SENSOR_RETRIES)
    }

    pub fn retry_delay(&self) -> Duration {
        let ms = self
            .parking
            .as_ref()
            .and_then(|s| s.retry_delay_ms)
            .unwrap_or(DEFAULT_RETRY_DELAY_MS);
        Duration::from_millis(ms)
    }

    pub fn report_base_url(&self) -> Option<&str> {
        let url = self.reporting.as_ref()?.base_url.as_deref()?;
        if url.is_empty() { None } else { Some(url) }
    }

    pub fn report_timeout(&self) -> Duration {
        let secs = self
            .reporting
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_REPORT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}
