use std::time::{Duration, Instant};

/// Minimum gap between two repeats of the same noisy warning.
pub const LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Returns true at most once per `LOG_THROTTLE`, updating `last` when it does.
pub fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// A timestamp that lets the first warning through immediately.
pub fn log_ready() -> Instant {
    Instant::now()
        .checked_sub(LOG_THROTTLE)
        .unwrap_or_else(Instant::now)
}
