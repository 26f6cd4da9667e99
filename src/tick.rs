use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const STOP_POLL_STEP: Duration = Duration::from_millis(20);

/// Sleep out the remainder of a tick that started at `start`, waking early
/// when the stop flag is set. A tick that overran its interval sleeps
/// nothing; the next tick starts immediately.
pub(crate) fn sleep_remainder(interval: Duration, start: Instant, stop: &AtomicBool) {
    let deadline = start + interval;
    while Instant::now() < deadline {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        std::thread::sleep(remaining.min(STOP_POLL_STEP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrun_tick_sleeps_nothing() {
        let stop = AtomicBool::new(false);
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(5));

        let before = Instant::now();
        sleep_remainder(Duration::from_millis(1), start, &stop);

        assert!(before.elapsed() < Duration::from_millis(15));
    }

    #[test]
    fn stop_flag_cuts_the_sleep_short() {
        let stop = AtomicBool::new(true);

        let before = Instant::now();
        sleep_remainder(Duration::from_millis(500), Instant::now(), &stop);

        assert!(before.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn sleep_covers_the_remaining_interval() {
        let stop = AtomicBool::new(false);
        let start = Instant::now();

        sleep_remainder(Duration::from_millis(30), start, &stop);

        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
