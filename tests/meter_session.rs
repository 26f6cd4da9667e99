use levelsense::meter::{LevelMeter, MeterSettings};
use levelsense::sensor::mock::{MockDistanceSensor, MockEnvironmentSensor, MockPresenceInput};
use levelsense::state::{CalibrationSource, SessionState};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use time::Time;

fn settings(tag: &str, calibration_reads: u32) -> MeterSettings {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    MeterSettings {
        calibration_reads,
        calibration_delay: Duration::ZERO,
        min_interval: Duration::from_millis(100),
        environment_read_interval: 2,
        default_reference_cm: 15.0,
        output_path: std::env::temp_dir().join(format!("levelsense-it-{tag}-{unique}/session.csv")),
    }
}

fn at(hour: u8, minute: u8, second: u8) -> Time {
    Time::from_hms(hour, minute, second).expect("valid time")
}

#[test]
fn full_session_writes_expected_csv() {
    // One calibration read of 13.2cm, then one good sample at 10.0cm and one
    // failed distance read before the vessel disappears.
    let distance = MockDistanceSensor::new(vec![Some(13.2), Some(10.0), None]);
    let environment = MockEnvironmentSensor::new(vec![Some((55.0, 22.0))]);
    let presence = MockPresenceInput::new(vec![true, true, true, false]);
    let settings = settings("full", 1);
    let output_path = settings.output_path.clone();
    let mut meter = LevelMeter::new(distance, environment, presence, settings);

    meter.poll(at(9, 0, 0));
    assert_eq!(meter.state(), SessionState::Sampling);

    meter.poll(at(9, 0, 0));
    meter.poll(at(9, 0, 1));
    meter.poll(at(9, 0, 2));

    assert_eq!(meter.state(), SessionState::Idle);
    assert!(meter.records().is_empty());

    let contents = std::fs::read_to_string(&output_path).expect("session file written");
    assert_eq!(
        contents,
        "Time,Temp,Hum,FillLevelCM\n09:00:00,22.0,55.0,3.2\n09:00:01,22.0,55.0,-999.0\n"
    );
    let _ = std::fs::remove_dir_all(output_path.parent().expect("parent dir"));
}

#[test]
fn dead_distance_sensor_still_yields_a_usable_session() {
    // Every calibration read fails, so the default reference is used; the
    // sampling reads then succeed against that fallback.
    let distance = MockDistanceSensor::new(vec![None, None, None, Some(12.0)]);
    let environment = MockEnvironmentSensor::new(vec![Some((50.0, 20.0))]);
    let presence = MockPresenceInput::new(vec![true, true, false]);
    let settings = settings("fallback", 3);
    let output_path = settings.output_path.clone();
    let mut meter = LevelMeter::new(distance, environment, presence, settings);

    meter.poll(at(10, 30, 0));
    let calibration = meter.calibration().expect("calibration set");
    assert_eq!(calibration.source, CalibrationSource::DefaultFallback);
    assert_eq!(calibration.reference_distance_cm, 15.0);

    meter.poll(at(10, 30, 0));
    meter.poll(at(10, 30, 1));

    let contents = std::fs::read_to_string(&output_path).expect("session file written");
    assert_eq!(contents, "Time,Temp,Hum,FillLevelCM\n10:30:00,20.0,50.0,3.0\n");
    let _ = std::fs::remove_dir_all(output_path.parent().expect("parent dir"));
}

#[test]
fn second_session_overwrites_the_first() {
    let distance = MockDistanceSensor::new(vec![
        Some(13.0), // first calibration
        Some(10.0), // first session sample
        Some(20.0), // second calibration
        Some(12.5), // second session sample
    ]);
    let environment =
        MockEnvironmentSensor::new(vec![Some((55.0, 22.0)), Some((61.0, 24.0))]);
    let presence = MockPresenceInput::new(vec![true, true, false, true, true, false]);
    let settings = settings("overwrite", 1);
    let output_path = settings.output_path.clone();
    let mut meter = LevelMeter::new(distance, environment, presence, settings);

    meter.poll(at(8, 0, 0));
    meter.poll(at(8, 0, 0));
    meter.poll(at(8, 0, 1));

    meter.poll(at(9, 15, 0));
    meter.poll(at(9, 15, 0));
    meter.poll(at(9, 15, 1));

    assert_eq!(meter.state(), SessionState::Idle);
    let contents = std::fs::read_to_string(&output_path).expect("session file written");
    assert_eq!(contents, "Time,Temp,Hum,FillLevelCM\n09:15:00,24.0,61.0,7.5\n");
    let _ = std::fs::remove_dir_all(output_path.parent().expect("parent dir"));
}

#[test]
fn session_without_vessel_never_touches_storage() {
    let distance = MockDistanceSensor::new(vec![]);
    let environment = MockEnvironmentSensor::new(vec![]);
    let presence = MockPresenceInput::new(vec![false]);
    let settings = settings("no-vessel", 1);
    let output_path = settings.output_path.clone();
    let mut meter = LevelMeter::new(distance, environment, presence, settings);

    for _ in 0..5 {
        meter.poll(at(7, 0, 0));
    }
    meter.shutdown();

    assert_eq!(meter.state(), SessionState::Idle);
    assert!(!output_path.exists());
}
