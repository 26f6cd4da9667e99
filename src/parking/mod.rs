use crate::config::Config;
use crate::report::{EventReporter, ParkingEvent};
use crate::sensor::{DistanceSensor, Indicator, read_distance_with_retries};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ParkingSettings {
    pub threshold_cm: f64,
    pub check_interval: Duration,
    pub sensor_retries: u32,
    pub retry_delay: Duration,
}

impl ParkingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold_cm: config.threshold_cm(),
            check_interval: config.check_interval(),
            sensor_retries: config.sensor_retries(),
            retry_delay: config.retry_delay(),
        }
    }
}

/// Edge-triggered occupancy monitor: classifies a single distance reading
/// against a threshold, drives the indicator (on = empty, off = taken) and
/// reports each confirmed transition exactly once.
pub struct OccupancyMonitor<D, I, R> {
    sensor: D,
    indicator: I,
    reporter: R,
    settings: ParkingSettings,
    spot_taken: bool,
}

impl<D, I, R> OccupancyMonitor<D, I, R>
where
    D: DistanceSensor,
    I: Indicator,
    R: EventReporter,
{
    pub fn new(sensor: D, indicator: I, reporter: R, settings: ParkingSettings) -> Self {
        Self {
            sensor,
            indicator,
            reporter,
            settings,
            spot_taken: false,
        }
    }

    pub fn spot_taken(&self) -> bool {
        self.spot_taken
    }

    /// Seed the previous-state value so a restarted process re-syncs remote
    /// state. When every startup read fails, the spot is assumed empty and
    /// the remote is still re-synced with a departure.
    pub fn initialize_state(&mut self) {
        info!("Initializing parking spot state");
        match read_distance_with_retries(
            &mut self.sensor,
            self.settings.sensor_retries,
            self.settings.retry_delay,
        ) {
            Some(distance) => {
                let taken = distance <= self.settings.threshold_cm;
                self.spot_taken = taken;
                self.set_indicator(taken);
                info!(
                    distance_cm = format_args!("{distance:.1}"),
                    taken, "Initial spot state"
                );
                let event = if taken {
                    ParkingEvent::Arrival
                } else {
                    ParkingEvent::Departure
                };
                self.send_event(event);
            }
            None => {
                warn!("Failed to get initial sensor reading, assuming spot is empty");
                self.spot_taken = false;
                self.set_indicator(false);
                self.send_event(ParkingEvent::Departure);
            }
        }
    }

    /// One polling tick. A reading that fails all retries skips the tick
    /// entirely; no event, no state change.
    pub fn tick(&mut self) {
        match read_distance_with_retries(
            &mut self.sensor,
            self.settings.sensor_retries,
            self.settings.retry_delay,
        ) {
            Some(distance) => self.process_reading(distance),
            None => warn!("Failed to get sensor reading, skipping this cycle"),
        }
    }

    pub fn process_reading(&mut self, distance: f64) {
        let taken = distance <= self.settings.threshold_cm;
        if taken == self.spot_taken {
            return;
        }

        info!(
            distance_cm = format_args!("{distance:.1}"),
            taken, "Spot state changed"
        );
        // Local state commits before the report attempt; a failed report
        // never rolls it back.
        self.spot_taken = taken;
        self.set_indicator(taken);
        let event = if taken {
            ParkingEvent::Arrival
        } else {
            ParkingEvent::Departure
        };
        self.send_event(event);
    }

    fn set_indicator(&mut self, taken: bool) {
        // Indicator is the logical inverse of occupancy.
        if let Err(err) = self.indicator.set_active(!taken) {
            error!(error = %err, "Failed to update indicator");
        }
    }

    fn send_event(&mut self, event: ParkingEvent) {
        match self.reporter.report(event) {
            Ok(()) => info!(event = event.endpoint(), "Event reported"),
            Err(err) => warn!(event = event.endpoint(), error = %err, "Event report failed"),
        }
    }

    pub fn run(&mut self, stop: &AtomicBool) {
        info!(
            threshold_cm = format_args!("{:.1}", self.settings.threshold_cm),
            "Parking spot monitor ready"
        );
        self.initialize_state();
        while !stop.load(Ordering::Relaxed) {
            let tick_start = Instant::now();
            self.tick();
            crate::tick::sleep_remainder(self.settings.check_interval, tick_start, stop);
        }
        // Indicator reset is part of the graceful exit path.
        if let Err(err) = self.indicator.set_active(false) {
            error!(error = %err, "Failed to reset indicator during shutdown");
        }
        info!("Parking spot monitor stopped");
    }
}
