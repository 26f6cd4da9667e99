use levelsense::config::{self, AppMode, Config};
use levelsense::error::AppError;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn init_tracing(config: &Config) {
    let level = tracing::Level::from_str(&config.logging.level).unwrap_or(tracing::Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(&config);
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        mode = ?config.mode(),
        "levelsense starting"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let mut worker = {
        let config = config.clone();
        let stop = Arc::clone(&stop);
        tokio::task::spawn_blocking(move || run(&config, &stop))
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, shutting down");
            stop.store(true, Ordering::Relaxed);
            log_worker_exit((&mut worker).await);
        }
        result = &mut worker => {
            log_worker_exit(result);
        }
    }

    tracing::info!("levelsense shutdown complete");
    Ok(())
}

fn log_worker_exit(result: Result<Result<(), AppError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "Worker exited with error"),
        Err(err) => tracing::error!(error = %err, "Worker task panicked"),
    }
}

fn run(config: &Config, stop: &AtomicBool) -> Result<(), AppError> {
    match config.mode() {
        AppMode::Meter => run_meter(config, stop),
        AppMode::Parking => run_parking(config, stop),
    }
}

#[cfg(target_os = "linux")]
fn run_meter(config: &Config, stop: &AtomicBool) -> Result<(), AppError> {
    use levelsense::meter::{LevelMeter, MeterSettings};
    use levelsense::sensor::grove::{Dht11, GpioPresenceInput, GroveUltrasonic};

    let distance = GroveUltrasonic::new(config.meter_sonar_pin())?;
    let environment = Dht11::new(config.dht_pin())?;
    let presence = GpioPresenceInput::new(config.button_pin())?;
    let mut meter = LevelMeter::new(
        distance,
        environment,
        presence,
        MeterSettings::from_config(config),
    );
    meter.run(stop);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run_meter(config: &Config, stop: &AtomicBool) -> Result<(), AppError> {
    let _ = (config, stop);
    tracing::warn!("Level meter requires Linux/Raspberry Pi GPIO - nothing to run");
    Ok(())
}

#[cfg(target_os = "linux")]
fn run_parking(config: &Config, stop: &AtomicBool) -> Result<(), AppError> {
    use levelsense::parking::{OccupancyMonitor, ParkingSettings};
    use levelsense::report::HttpReporter;
    use levelsense::sensor::grove::{GpioLed, GroveUltrasonic};

    let sensor = GroveUltrasonic::new(config.parking_sonar_pin())?;
    let indicator = GpioLed::new(config.led_pin())?;
    let reporter = config
        .report_base_url()
        .map(|url| HttpReporter::new(url, config.report_timeout()));
    if reporter.is_none() {
        tracing::warn!("No reporting.base_url configured - events will not be reported");
    }
    let mut monitor = OccupancyMonitor::new(
        sensor,
        indicator,
        reporter,
        ParkingSettings::from_config(config),
    );
    monitor.run(stop);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run_parking(config: &Config, stop: &AtomicBool) -> Result<(), AppError> {
    let _ = (config, stop);
    tracing::warn!("Parking monitor requires Linux/Raspberry Pi GPIO - nothing to run");
    Ok(())
}
