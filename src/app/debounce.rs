use std::time::{Duration, Instant};

/// Trailing-edge debounce over a single pending value.
///
/// Callers pass `now` explicitly so the draw loop can poll it once per tick.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left until the pending value fires.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(250);

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("cats", start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(249)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("cats"));
        assert_eq!(debouncer.poll(start + DELAY * 4), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn burst_collapses_to_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("e", start);
        debouncer.schedule("ex", start + Duration::from_millis(100));
        debouncer.schedule("exa", start + Duration::from_millis(200));

        // First deadline has passed, but the last keystroke restarted the window.
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(300)),
            Some(Duration::from_millis(150))
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(450)), Some("exa"));
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("x", start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + DELAY), None);
        assert_eq!(debouncer.remaining(start), None);
    }
}
