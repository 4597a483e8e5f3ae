use log::info;
use std::time::{Duration, Instant};

/// Face presence as seen by the last sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    /// Last sample had a face, or the grace timer was just consumed by a pause
    Present,
    /// Continuously absent since the given instant
    AbsentSince(Instant),
}

/// Playback state of the controlled video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Video is playing
    #[default]
    Playing,
    /// Video was paused because the face left
    Paused,
}

/// Playback transition requested by the presence monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Absence outlasted the grace period
    Pause,
    /// Face came back while paused
    Resume,
}

/// Tracks continuous absence and owns the playing/paused flag
#[derive(Debug, Clone)]
pub struct PresenceMonitor {
    grace_period: Duration,
    presence: PresenceState,
    playback: PlaybackState,
}

impl PresenceMonitor {
    /// Create a monitor that starts present and playing
    #[must_use]
    pub const fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            presence: PresenceState::Present,
            playback: PlaybackState::Playing,
        }
    }

    /// Current presence state
    #[must_use]
    pub const fn presence(&self) -> PresenceState {
        self.presence
    }

    /// Current playback state
    #[must_use]
    pub const fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Feed one sample's presence flag.
    ///
    /// Any present sample clears the absence timer, even a single-frame
    /// flicker in the middle of the grace window. A pause also clears the
    /// timer, so at most one pause fires per continuous absence interval.
    pub fn observe(&mut self, face_present: bool, now: Instant) -> Option<PresenceEvent> {
        if face_present {
            self.presence = PresenceState::Present;
            if self.playback == PlaybackState::Paused {
                info!("Face detected: resuming playback");
                self.playback = PlaybackState::Playing;
                return Some(PresenceEvent::Resume);
            }
            return None;
        }

        match self.presence {
            PresenceState::Present => {
                self.presence = PresenceState::AbsentSince(now);
                None
            }
            PresenceState::AbsentSince(since) => {
                let absent_for = now.saturating_duration_since(since);
                if absent_for > self.grace_period && self.playback == PlaybackState::Playing {
                    info!("No face for {:.1}s: pausing playback", absent_for.as_secs_f64());
                    self.playback = PlaybackState::Paused;
                    self.presence = PresenceState::Present;
                    Some(PresenceEvent::Pause)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_pause_after_grace() {
        let start = Instant::now();
        let mut monitor = PresenceMonitor::new(Duration::from_secs(5));

        assert_eq!(monitor.observe(false, start), None);
        assert_eq!(monitor.presence(), PresenceState::AbsentSince(start));
        assert_eq!(monitor.observe(false, at(start, 5000)), None);
        assert_eq!(monitor.observe(false, at(start, 5100)), Some(PresenceEvent::Pause));
        assert_eq!(monitor.playback(), PlaybackState::Paused);
        assert_eq!(monitor.presence(), PresenceState::Present);
    }

    #[test]
    fn test_single_pause_per_absence() {
        let start = Instant::now();
        let mut monitor = PresenceMonitor::new(Duration::from_secs(1));
        let pauses = (0..100)
            .filter_map(|i| monitor.observe(false, at(start, i * 100)))
            .count();
        assert_eq!(pauses, 1);
    }

    #[test]
    fn test_resume_once() {
        let start = Instant::now();
        let mut monitor = PresenceMonitor::new(Duration::ZERO);
        monitor.observe(false, start);
        assert_eq!(monitor.observe(false, at(start, 10)), Some(PresenceEvent::Pause));

        assert_eq!(monitor.observe(true, at(start, 20)), Some(PresenceEvent::Resume));
        assert_eq!(monitor.playback(), PlaybackState::Playing);
        assert_eq!(monitor.observe(true, at(start, 30)), None);
    }

    #[test]
    fn test_flicker_restarts_grace_timer() {
        let start = Instant::now();
        let mut monitor = PresenceMonitor::new(Duration::from_secs(5));
        monitor.observe(false, start);
        monitor.observe(false, at(start, 4000));
        assert_eq!(monitor.observe(true, at(start, 4100)), None);
        assert_eq!(monitor.observe(false, at(start, 4200)), None);
        assert_eq!(monitor.observe(false, at(start, 9000)), None);
        assert_eq!(monitor.observe(false, at(start, 9300)), Some(PresenceEvent::Pause));
    }

    #[test]
    fn test_present_without_pause_is_silent() {
        let mut monitor = PresenceMonitor::new(Duration::from_secs(5));
        assert_eq!(monitor.observe(true, Instant::now()), None);
        assert_eq!(monitor.playback(), PlaybackState::Playing);
    }
}
