use super::{
    calibration::{CalibrationController, CalibrationEvent, CalibrationState},
    classifier::{classify, Gesture},
    cooldown::ScrollGate,
    presence::{PlaybackState, PresenceEvent, PresenceMonitor, PresenceState},
    Intent, Sample, SessionConfig,
};
use log::{debug, info};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Outcome of processing one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Intent emitted for this sample, if any
    pub intent: Option<Intent>,
    /// Classification of the sample, reported even when the scroll was
    /// rate-limited or outranked by another intent
    pub gesture: Option<Gesture>,
    /// Landmark position that was classified
    pub position: Option<f64>,
}

impl Step {
    /// A scroll was classified but did not fire
    #[must_use]
    pub fn scroll_suppressed(&self) -> bool {
        matches!(self.gesture, Some(Gesture::ScrollUp | Gesture::ScrollDown)) && self.intent.is_none()
    }
}

/// Complete gesture session state, advanced one sample at a time
#[derive(Debug, Clone)]
pub struct GestureEngine {
    config: SessionConfig,
    calibration: CalibrationController,
    gate: ScrollGate,
    presence: PresenceMonitor,
    last_sample: Option<Instant>,
    /// Calibration intents outranked by pause/resume, oldest first
    backlog: VecDeque<Intent>,
}

impl GestureEngine {
    /// Create a fresh session; the scroll cooldown window starts at `started_at`
    #[must_use]
    pub const fn new(config: SessionConfig, started_at: Instant) -> Self {
        Self {
            config,
            calibration: CalibrationController::new(config.countdown_duration),
            gate: ScrollGate::new(config.cooldown_period, started_at),
            presence: PresenceMonitor::new(config.absence_grace_period),
            last_sample: None,
            backlog: VecDeque::new(),
        }
    }

    /// Session configuration
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current calibration state
    #[must_use]
    pub const fn calibration(&self) -> CalibrationState {
        self.calibration.state()
    }

    /// Captured baseline, if calibrated
    #[must_use]
    pub const fn baseline(&self) -> Option<f64> {
        self.calibration.baseline()
    }

    /// Current presence state
    #[must_use]
    pub const fn presence(&self) -> PresenceState {
        self.presence.presence()
    }

    /// Current playback state
    #[must_use]
    pub const fn playback(&self) -> PlaybackState {
        self.presence.playback()
    }

    /// Instant of the last fired scroll
    #[must_use]
    pub const fn last_scroll(&self) -> Instant {
        self.gate.last_scroll()
    }

    /// Calibration intents waiting to be emitted
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.backlog.len()
    }

    /// Drop the baseline; presence, cooldown and playback are untouched.
    ///
    /// Queued countdown ticks are discarded; a queued completion is kept.
    pub fn reset(&mut self) {
        info!("Calibration reset");
        self.calibration.reset();
        self.backlog.retain(|intent| matches!(intent, Intent::CalibrationComplete { .. }));
    }

    /// Process one sample.
    ///
    /// At most one intent is emitted. Pause/resume outrank calibration
    /// events, which outrank the classified gesture. A calibration intent
    /// outranked by pause/resume is queued and emitted in order on later
    /// samples, ahead of any gesture.
    pub fn step(&mut self, sample: &Sample) -> Step {
        let elapsed = self
            .last_sample
            .map_or(Duration::ZERO, |last| sample.timestamp.saturating_duration_since(last));
        self.last_sample = Some(sample.timestamp);

        let calibration_event = self.calibration.advance(sample.position, elapsed);
        let presence_event = self.presence.observe(sample.face_present(), sample.timestamp);

        let gesture = match (sample.position, self.calibration.baseline()) {
            (Some(position), Some(baseline)) => Some(classify(position, baseline, self.config.movement_threshold)),
            _ => None,
        };

        if let Some(event) = calibration_event {
            self.backlog.push_back(match event {
                CalibrationEvent::Countdown(remaining) => Intent::CalibrationStarted { remaining },
                CalibrationEvent::Complete(baseline) => Intent::CalibrationComplete { baseline },
            });
        }

        let intent = match presence_event {
            Some(PresenceEvent::Pause) => Some(Intent::Pause),
            Some(PresenceEvent::Resume) => Some(Intent::Resume),
            None => match (self.backlog.pop_front(), gesture) {
                (Some(calibration), _) => Some(calibration),
                (None, Some(Gesture::Still)) => Some(Intent::Still),
                (None, Some(scroll)) => self.gate.try_fire(sample.timestamp).then(|| Intent::from(scroll)),
                (None, None) => None,
            },
        };

        debug!(
            "position={:?} baseline={:?} gesture={:?} intent={:?}",
            sample.position,
            self.calibration.baseline(),
            gesture,
            intent
        );

        Step {
            intent,
            gesture,
            position: sample.position,
        }
    }
}
