use log::debug;
use std::time::{Duration, Instant};

/// Shared rate limiter for both scroll directions
#[derive(Debug, Clone)]
pub struct ScrollGate {
    cooldown: Duration,
    last_scroll: Instant,
}

impl ScrollGate {
    /// Create a gate whose cooldown window starts at `started_at`
    #[must_use]
    pub const fn new(cooldown: Duration, started_at: Instant) -> Self {
        Self {
            cooldown,
            last_scroll: started_at,
        }
    }

    /// Instant of the last permitted scroll (or the session start)
    #[must_use]
    pub const fn last_scroll(&self) -> Instant {
        self.last_scroll
    }

    /// Permit a scroll iff strictly more than the cooldown has passed since
    /// the last permitted one. Only a permitted scroll moves the window.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        let since_last = now.saturating_duration_since(self.last_scroll);
        if since_last > self.cooldown {
            self.last_scroll = now;
            true
        } else {
            debug!(
                "Scroll suppressed, {:.2}s since last scroll",
                since_last.as_secs_f64()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_window() {
        let start = Instant::now();
        let cooldown = Duration::from_millis(1500);
        let mut gate = ScrollGate::new(cooldown, start);

        // Window opens at session start
        assert!(!gate.try_fire(start + Duration::from_secs(1)));
        assert!(!gate.try_fire(start + cooldown));
        assert!(gate.try_fire(start + Duration::from_secs(2)));
        assert_eq!(gate.last_scroll(), start + Duration::from_secs(2));

        assert!(!gate.try_fire(start + Duration::from_millis(3400)));
        assert!(gate.try_fire(start + Duration::from_millis(3600)));
    }

    #[test]
    fn test_suppression_does_not_move_window() {
        let start = Instant::now();
        let mut gate = ScrollGate::new(Duration::from_secs(1), start);
        for millis in [200, 400, 600, 800, 1000] {
            assert!(!gate.try_fire(start + Duration::from_millis(millis)));
        }
        assert_eq!(gate.last_scroll(), start);
        assert!(gate.try_fire(start + Duration::from_millis(1001)));
    }

    #[test]
    fn test_out_of_order_instant_never_rewinds() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut gate = ScrollGate::new(Duration::ZERO, start);
        assert!(!gate.try_fire(start - Duration::from_secs(5)));
        assert_eq!(gate.last_scroll(), start);
    }
}
