use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Guards a logging call site so that repeated occurrences of the same failure mode
/// are reported at most once per interval. Occurrences arriving while the guard is
/// closed are tallied and reported the next time it opens.
pub struct RateLimitedLogger {
    interval: Duration,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    last_log: Option<Instant>,
    suppressed: u64,
}

impl RateLimitedLogger {
    pub fn new(interval: Duration) -> Self {
        Self { interval, state: Mutex::new(State::default()) }
    }

    /// Registers an occurrence. Returns the number of occurrences suppressed since the
    /// last permitted one when logging is currently permitted, or `None` while throttled.
    pub fn acquire(&self) -> Option<u64> {
        let now = Instant::now();
        let mut state = self.state.lock();
        match state.last_log {
            Some(last) if now.duration_since(last) < self.interval => {
                state.suppressed += 1;
                None
            }
            _ => {
                state.last_log = Some(now);
                Some(std::mem::take(&mut state.suppressed))
            }
        }
    }
}
