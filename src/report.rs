use crate::error::AppError;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// Parking state transitions reported to the remote collector. A `/status`
/// endpoint also exists remotely but is never called by the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingEvent {
    Arrival,
    Departure,
}

impl ParkingEvent {
    pub fn endpoint(self) -> &'static str {
        match self {
            ParkingEvent::Arrival => "arrival",
            ParkingEvent::Departure => "departure",
        }
    }
}

pub trait EventReporter {
    fn report(&mut self, event: ParkingEvent) -> Result<(), AppError>;
}

/// Blocking HTTP reporter: `POST {base_url}/{event}` with an empty body.
/// Only a 200 response counts as success.
pub struct HttpReporter {
    base_url: String,
    timeout: Duration,
}

impl HttpReporter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl EventReporter for HttpReporter {
    fn report(&mut self, event: ParkingEvent) -> Result<(), AppError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            event.endpoint()
        );
        let status = send_empty_post(&url, self.timeout)?;
        if status == 200 {
            Ok(())
        } else {
            Err(AppError::Report(format!("http status {status}")))
        }
    }
}

/// `None` drops events, for deployments without a collector configured.
impl<R: EventReporter> EventReporter for Option<R> {
    fn report(&mut self, event: ParkingEvent) -> Result<(), AppError> {
        match self {
            Some(reporter) => reporter.report(event),
            None => {
                debug!(event = event.endpoint(), "Reporting disabled, dropping event");
                Ok(())
            }
        }
    }
}

/// Reporter that records events instead of sending them, for tests.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Vec<ParkingEvent>,
    pub fail: bool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventReporter for RecordingReporter {
    fn report(&mut self, event: ParkingEvent) -> Result<(), AppError> {
        self.events.push(event);
        if self.fail {
            Err(AppError::Report("recording reporter failure".to_string()))
        } else {
            Ok(())
        }
    }
}

struct ParsedUrl<'a> {
    host: &'a str,
    port: u16,
    path: &'a str,
}

fn parse_http_url(endpoint: &str) -> Result<ParsedUrl<'_>, AppError> {
    let rest = endpoint
        .strip_prefix("http://")
        .ok_or_else(|| AppError::Report("only http:// supported".to_string()))?;

    let (authority, path) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, "/"),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| AppError::Report(format!("invalid port {port:?}")))?;
            (host, port)
        }
        None => (authority, 80),
    };
    if host.is_empty() {
        return Err(AppError::Report("missing host".to_string()));
    }

    Ok(ParsedUrl { host, port, path })
}

fn send_empty_post(endpoint: &str, timeout: Duration) -> Result<u16, AppError> {
    let parsed = parse_http_url(endpoint)?;
    let addr = (parsed.host, parsed.port)
        .to_socket_addrs()
        .map_err(|err| AppError::Report(format!("dns error: {err}")))?
        .next()
        .ok_or_else(|| AppError::Report("no addresses resolved".to_string()))?;

    let mut stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|err| AppError::Report(format!("connect error: {err}")))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|err| AppError::Report(format!("io error: {err}")))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|err| AppError::Report(format!("io error: {err}")))?;

    let request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        parsed.path, parsed.host
    );
    stream
        .write_all(request.as_bytes())
        .map_err(|err| AppError::Report(format!("io error: {err}")))?;

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .map_err(|err| AppError::Report(format!("io error: {err}")))?;

    let status_line = response
        .lines()
        .next()
        .ok_or_else(|| AppError::Report("empty http response".to_string()))?;
    status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| AppError::Report("invalid status line".to_string()))
}
