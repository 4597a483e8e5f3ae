use log::info;
use std::time::Duration;

/// Calibration progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// No face seen since start or the last reset
    Uncalibrated,
    /// Countdown running; the baseline is captured when it reaches zero
    CountingDown {
        /// Time left before capture
        remaining: Duration,
    },
    /// Baseline captured
    Baseline(f64),
}

/// Event produced by a calibration transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationEvent {
    /// Countdown entered or advanced
    Countdown(Duration),
    /// Baseline latched
    Complete(f64),
}

/// One-shot countdown followed by baseline capture
#[derive(Debug, Clone)]
pub struct CalibrationController {
    countdown: Duration,
    state: CalibrationState,
}

impl CalibrationController {
    /// Create an uncalibrated controller
    #[must_use]
    pub const fn new(countdown: Duration) -> Self {
        Self {
            countdown,
            state: CalibrationState::Uncalibrated,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> CalibrationState {
        self.state
    }

    /// Captured baseline, if any
    #[must_use]
    pub const fn baseline(&self) -> Option<f64> {
        match self.state {
            CalibrationState::Baseline(value) => Some(value),
            _ => None,
        }
    }

    /// Advance with one sample and the time elapsed since the previous one.
    ///
    /// The countdown keeps running while the face is missing; when it has
    /// expired, the first sample with a face is latched as the baseline.
    pub fn advance(&mut self, position: Option<f64>, elapsed: Duration) -> Option<CalibrationEvent> {
        match self.state {
            CalibrationState::Uncalibrated => {
                position?;
                info!("Face detected, capturing baseline in {:.1}s", self.countdown.as_secs_f64());
                self.state = CalibrationState::CountingDown {
                    remaining: self.countdown,
                };
                Some(CalibrationEvent::Countdown(self.countdown))
            }
            CalibrationState::CountingDown { remaining } => {
                let remaining = remaining.saturating_sub(elapsed);
                match position {
                    Some(baseline) if remaining.is_zero() => {
                        info!("Baseline set for nose position: {baseline:.1}");
                        self.state = CalibrationState::Baseline(baseline);
                        Some(CalibrationEvent::Complete(baseline))
                    }
                    _ => {
                        self.state = CalibrationState::CountingDown { remaining };
                        Some(CalibrationEvent::Countdown(remaining))
                    }
                }
            }
            CalibrationState::Baseline(_) => None,
        }
    }

    /// Forget the baseline and wait for the next face
    pub fn reset(&mut self) {
        self.state = CalibrationState::Uncalibrated;
    }
}
