//! Grove hardware drivers for the Raspberry Pi, built on `rppal`.
//!
//! The ultrasonic ranger and the DHT11 share their Grove single-wire
//! protocols; both are bit-banged here with busy-wait edge timing, which is
//! good enough at the polling rates this application runs at.

use crate::error::AppError;
use crate::sensor::{DistanceSensor, EnvironmentSensor, Indicator, PresenceInput};
use crate::state::EnvironmentReading;
use rppal::gpio::{Gpio, InputPin, IoPin, Level, Mode, OutputPin};
use std::time::{Duration, Instant};

const SPEED_OF_SOUND_CM_PER_S: f64 = 34_300.0;
const ECHO_START_TIMEOUT: Duration = Duration::from_millis(100);
const ECHO_PULSE_TIMEOUT: Duration = Duration::from_millis(60);

const DHT_START_LOW: Duration = Duration::from_millis(18);
const DHT_EDGE_TIMEOUT: Duration = Duration::from_millis(1);
// High pulses longer than this encode a 1 bit (nominal 26-28us vs 70us).
const DHT_ONE_THRESHOLD: Duration = Duration::from_micros(49);

fn gpio_err(err: rppal::gpio::Error) -> AppError {
    AppError::Gpio(err.to_string())
}

/// Busy-wait until the pin reads `level`, returning the instant the edge was
/// seen.
fn wait_for_level(pin: &IoPin, level: Level, timeout: Duration) -> Result<Instant, AppError> {
    let deadline = Instant::now() + timeout;
    while pin.read() != level {
        if Instant::now() > deadline {
            return Err(AppError::Sensor(format!("timeout waiting for {level:?}")));
        }
    }
    Ok(Instant::now())
}

/// Grove single-pin ultrasonic ranger: trigger pulse out, echo pulse back on
/// the same wire.
pub struct GroveUltrasonic {
    pin: IoPin,
}

impl GroveUltrasonic {
    pub fn new(pin: u8) -> Result<Self, AppError> {
        let pin = Gpio::new()
            .map_err(gpio_err)?
            .get(pin)
            .map_err(gpio_err)?
            .into_io(Mode::Output);
        Ok(Self { pin })
    }
}

impl DistanceSensor for GroveUltrasonic {
    fn read_distance(&mut self) -> Result<f64, AppError> {
        self.pin.set_mode(Mode::Output);
        self.pin.set_low();
        std::thread::sleep(Duration::from_micros(2));
        self.pin.set_high();
        std::thread::sleep(Duration::from_micros(10));
        self.pin.set_low();

        self.pin.set_mode(Mode::Input);
        let rise = wait_for_level(&self.pin, Level::High, ECHO_START_TIMEOUT)?;
        let fall = wait_for_level(&self.pin, Level::Low, ECHO_PULSE_TIMEOUT)?;

        let round_trip_secs = (fall - rise).as_secs_f64();
        Ok(round_trip_secs * SPEED_OF_SOUND_CM_PER_S / 2.0)
    }
}

/// DHT11 temperature/humidity sensor on a single data pin.
pub struct Dht11 {
    pin: IoPin,
}

impl Dht11 {
    pub fn new(pin: u8) -> Result<Self, AppError> {
        let pin = Gpio::new()
            .map_err(gpio_err)?
            .get(pin)
            .map_err(gpio_err)?
            .into_io(Mode::Input);
        Ok(Self { pin })
    }

    fn read_bytes(&mut self) -> Result<[u8; 5], AppError> {
        // Host start signal, then hand the wire to the sensor.
        self.pin.set_mode(Mode::Output);
        self.pin.set_low();
        std::thread::sleep(DHT_START_LOW);
        self.pin.set_mode(Mode::Input);

        // Sensor response: ~80us low, ~80us high, then 40 data bits.
        wait_for_level(&self.pin, Level::Low, DHT_EDGE_TIMEOUT)?;
        wait_for_level(&self.pin, Level::High, DHT_EDGE_TIMEOUT)?;
        wait_for_level(&self.pin, Level::Low, DHT_EDGE_TIMEOUT)?;

        let mut bytes = [0u8; 5];
        for bit in 0..40 {
            let rise = wait_for_level(&self.pin, Level::High, DHT_EDGE_TIMEOUT)?;
            let fall = wait_for_level(&self.pin, Level::Low, DHT_EDGE_TIMEOUT)?;
            if fall - rise > DHT_ONE_THRESHOLD {
                bytes[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(bytes)
    }
}

impl EnvironmentSensor for Dht11 {
    fn read(&mut self) -> Result<EnvironmentReading, AppError> {
        let bytes = self.read_bytes()?;

        let checksum = bytes[0]
            .wrapping_add(bytes[1])
            .wrapping_add(bytes[2])
            .wrapping_add(bytes[3]);
        if checksum != bytes[4] {
            return Err(AppError::Sensor("dht checksum mismatch".to_string()));
        }

        Ok(EnvironmentReading {
            humidity: f64::from(bytes[0]) + f64::from(bytes[1]) / 10.0,
            temperature: f64::from(bytes[2]) + f64::from(bytes[3]) / 10.0,
        })
    }
}

/// Active-high digital presence input (Grove button module).
pub struct GpioPresenceInput {
    pin: InputPin,
}

impl GpioPresenceInput {
    pub fn new(pin: u8) -> Result<Self, AppError> {
        let pin = Gpio::new()
            .map_err(gpio_err)?
            .get(pin)
            .map_err(gpio_err)?
            .into_input();
        Ok(Self { pin })
    }
}

impl PresenceInput for GpioPresenceInput {
    fn is_present(&mut self) -> bool {
        self.pin.is_high()
    }
}

/// LED on a plain GPIO output.
pub struct GpioLed {
    pin: OutputPin,
}

impl GpioLed {
    pub fn new(pin: u8) -> Result<Self, AppError> {
        let pin = Gpio::new()
            .map_err(gpio_err)?
            .get(pin)
            .map_err(gpio_err)?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl Indicator for GpioLed {
    fn set_active(&mut self, on: bool) -> Result<(), AppError> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}
