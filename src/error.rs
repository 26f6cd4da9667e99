use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("report error: {0}")]
    Report(String),
}
