use levelsense::error::AppError;
use levelsense::parking::{OccupancyMonitor, ParkingSettings};
use levelsense::report::{EventReporter, ParkingEvent};
use levelsense::sensor::mock::{MockDistanceSensor, MockIndicator};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Reporter backed by a shared buffer so the test can observe events while
/// the monitor owns the reporter.
#[derive(Clone, Default)]
struct SharedReporter {
    events: Rc<RefCell<Vec<ParkingEvent>>>,
}

impl EventReporter for SharedReporter {
    fn report(&mut self, event: ParkingEvent) -> Result<(), AppError> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

fn settings() -> ParkingSettings {
    ParkingSettings {
        threshold_cm: 10.0,
        check_interval: Duration::from_millis(200),
        sensor_retries: 3,
        retry_delay: Duration::ZERO,
    }
}

#[test]
fn occupancy_pipeline_reports_each_edge_once() {
    // Startup sees an empty spot, then a car arrives and later departs.
    let sensor = MockDistanceSensor::new(vec![
        Some(15.0), // initialize_state
        Some(15.0),
        Some(8.0),
        Some(8.0),
        Some(8.0),
        Some(15.0),
    ]);
    let reporter = SharedReporter::default();
    let events = Rc::clone(&reporter.events);
    let mut monitor = OccupancyMonitor::new(sensor, MockIndicator::new(), reporter, settings());

    monitor.initialize_state();
    for _ in 0..5 {
        monitor.tick();
    }

    assert!(!monitor.spot_taken());
    assert_eq!(
        *events.borrow(),
        vec![
            ParkingEvent::Departure, // initial re-sync
            ParkingEvent::Arrival,
            ParkingEvent::Departure
        ]
    );
}

#[test]
fn transient_sensor_faults_never_produce_spurious_events() {
    // A taken spot, a tick whose reads all fail, then the same taken spot
    // again: the failed tick must not emit anything or flip state.
    let sensor = MockDistanceSensor::new(vec![
        Some(8.0), // initialize_state
        None,
        None,
        None, // one tick's retries exhausted
        Some(8.0),
        Some(15.0),
    ]);
    let reporter = SharedReporter::default();
    let events = Rc::clone(&reporter.events);
    let mut monitor = OccupancyMonitor::new(sensor, MockIndicator::new(), reporter, settings());

    monitor.initialize_state();
    monitor.tick();
    monitor.tick();
    monitor.tick();

    assert!(!monitor.spot_taken());
    assert_eq!(
        *events.borrow(),
        vec![ParkingEvent::Arrival, ParkingEvent::Departure]
    );
}
