//! Trailing-edge debounce with a maximum wait, driven by explicit instants.
//!
//! Nothing here owns a timer. The host reports calls and polls on its own
//! ticks; `poll` says whether the deferred work is due.

use std::time::Duration;

use web_time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    max_wait: Option<Duration>,
    /// First call of the pending burst.
    first_call: Option<Instant>,
    last_call: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            wait,
            max_wait: max_wait.map(|max| max.max(wait)),
            first_call: None,
            last_call: None,
        }
    }

    pub fn from_millis(wait_ms: u64, max_wait_ms: u64) -> Self {
        let max_wait = (max_wait_ms > 0).then(|| Duration::from_millis(max_wait_ms));
        Self::new(Duration::from_millis(wait_ms), max_wait)
    }

    /// Registers a call, restarting the quiet period.
    pub fn call(&mut self, now: Instant) {
        self.first_call.get_or_insert(now);
        self.last_call = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_call.is_some()
    }

    /// When the pending call fires if nothing else arrives.
    pub fn deadline(&self) -> Option<Instant> {
        let last = self.last_call? + self.wait;
        match (self.first_call, self.max_wait) {
            (Some(first), Some(max)) => Some(last.min(first + max)),
            _ => Some(last),
        }
    }

    /// Returns true once, when the pending call is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Fires a pending call immediately.
    pub fn flush(&mut self) -> bool {
        let pending = self.is_pending();
        self.cancel();
        pending
    }

    pub fn cancel(&mut self) {
        self.first_call = None;
        self.last_call = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::from_millis(500, 0);
        debouncer.call(start);
        assert!(!debouncer.poll(start + ms(499)));
        assert!(debouncer.poll(start + ms(500)));
        assert!(!debouncer.poll(start + ms(1000)));
    }

    #[test]
    fn burst_is_coalesced_until_max_wait() {
        let start = Instant::now();
        let mut debouncer = Debouncer::from_millis(500, 1500);
        for step in 0..4 {
            debouncer.call(start + ms(step * 400));
        }
        assert!(!debouncer.poll(start + ms(1400)));
        assert!(debouncer.poll(start + ms(1500)));
    }

    #[test]
    fn flush_reports_pending_work() {
        let mut debouncer = Debouncer::from_millis(500, 0);
        assert!(!debouncer.flush());
        debouncer.call(Instant::now());
        assert!(debouncer.flush());
        assert!(!debouncer.is_pending());
    }
}
