//! Gesture interpretation state machine.
//!
//! Turns a stream of per-frame nose positions into scroll, still,
//! pause/resume and calibration intents. Every component is a plain state
//! transition driven by sample timestamps, so the whole pipeline can be
//! exercised deterministically without sleeping.
//!
//! Per sample the [`GestureEngine`] runs:
//! 1. [`calibration::CalibrationController`] (countdown, then baseline capture)
//! 2. [`presence::PresenceMonitor`] (absence grace timer, pause/resume)
//! 3. [`classifier::classify`] against the baseline
//! 4. [`cooldown::ScrollGate`] for scroll intents

/// Countdown and baseline capture
pub mod calibration;

/// Dead-zone classification of a position against the baseline
pub mod classifier;

/// Rate limiting of scroll intents
pub mod cooldown;

/// Face absence tracking and playback state
pub mod presence;

/// Per-sample pipeline tying the components together
pub mod engine;

pub use calibration::{CalibrationController, CalibrationEvent, CalibrationState};
pub use classifier::{classify, Gesture};
pub use cooldown::ScrollGate;
pub use engine::{GestureEngine, Step};
pub use presence::{PlaybackState, PresenceEvent, PresenceMonitor, PresenceState};

use crate::{
    constants::{DEFAULT_ABSENCE_GRACE_SECS, DEFAULT_COOLDOWN_SECS, DEFAULT_COUNTDOWN_SECS, DEFAULT_MOVEMENT_THRESHOLD},
    Error, Result,
};
use std::time::{Duration, Instant};

/// Immutable gesture configuration fixed at session start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Half-width of the dead zone around the baseline, in pixel rows
    pub movement_threshold: f64,
    /// Minimum time between two fired scroll intents
    pub cooldown_period: Duration,
    /// Continuous absence required before pausing
    pub absence_grace_period: Duration,
    /// Countdown between first face sighting and baseline capture
    pub countdown_duration: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            cooldown_period: Duration::from_secs_f64(DEFAULT_COOLDOWN_SECS),
            absence_grace_period: Duration::from_secs_f64(DEFAULT_ABSENCE_GRACE_SECS),
            countdown_duration: Duration::from_secs_f64(DEFAULT_COUNTDOWN_SECS),
        }
    }
}

/// Raw per-frame report from a landmark sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Whether a face was found in the frame
    pub face_present: bool,
    /// Vertical position of the tracked landmark, if a face was found
    pub position: Option<f64>,
    /// Acquisition time of the frame
    pub timestamp: Instant,
}

impl Observation {
    /// Observation of a face with the landmark at `position`
    #[must_use]
    pub const fn present(position: f64, timestamp: Instant) -> Self {
        Self {
            face_present: true,
            position: Some(position),
            timestamp,
        }
    }

    /// Observation of a frame without a face
    #[must_use]
    pub const fn absent(timestamp: Instant) -> Self {
        Self {
            face_present: false,
            position: None,
            timestamp,
        }
    }
}

/// One validated frame observation fed into the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Landmark position, `None` when no face was seen
    pub position: Option<f64>,
    /// Acquisition time of the frame
    pub timestamp: Instant,
}

impl Sample {
    /// Validate an observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSample`] when the presence flag and the
    /// position disagree, or the position is not finite.
    pub fn try_from_observation(observation: Observation) -> Result<Self> {
        match (observation.face_present, observation.position) {
            (true, Some(position)) if position.is_finite() => Ok(Self {
                position: Some(position),
                timestamp: observation.timestamp,
            }),
            (true, Some(position)) => Err(Error::InvalidSample(format!("non-finite position {position}"))),
            (true, None) => Err(Error::InvalidSample("face reported without a position".to_string())),
            (false, Some(position)) => Err(Error::InvalidSample(format!(
                "position {position} reported without a face"
            ))),
            (false, None) => Ok(Self {
                position: None,
                timestamp: observation.timestamp,
            }),
        }
    }

    /// Validate an observation, treating contract violations as "no face"
    #[must_use]
    pub fn from_observation(observation: Observation) -> Self {
        Self::try_from_observation(observation).unwrap_or_else(|e| {
            log::warn!("Rejecting sample: {e}");
            Self {
                position: None,
                timestamp: observation.timestamp,
            }
        })
    }

    /// Whether this sample saw a face
    #[must_use]
    pub const fn face_present(&self) -> bool {
        self.position.is_some()
    }
}

/// Abstract output event of the gesture state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Head moved down past the dead zone
    ScrollUp,
    /// Head moved up past the dead zone
    ScrollDown,
    /// Head inside the dead zone
    Still,
    /// Face absent for longer than the grace period
    Pause,
    /// Face back after a pause
    Resume,
    /// Calibration countdown is running
    CalibrationStarted {
        /// Time left before the baseline is captured
        remaining: Duration,
    },
    /// Baseline captured
    CalibrationComplete {
        /// Captured baseline position
        baseline: f64,
    },
}

impl Intent {
    /// Human readable status line for this intent
    #[must_use]
    pub fn status_message(&self) -> String {
        match self {
            Self::ScrollUp => "Scrolling Up".to_string(),
            Self::ScrollDown => "Scrolling Down".to_string(),
            Self::Still => "Head still: Enjoy your Reel!".to_string(),
            Self::Pause => "No face detected: Pausing video".to_string(),
            Self::Resume => "Face detected: Resuming video".to_string(),
            Self::CalibrationStarted { remaining } => {
                format!("Adjust your face - Capturing in {} seconds", remaining.as_secs_f64().ceil())
            }
            Self::CalibrationComplete { .. } => "Baseline set for nose position.".to_string(),
        }
    }
}

impl From<Gesture> for Intent {
    fn from(gesture: Gesture) -> Self {
        match gesture {
            Gesture::ScrollUp => Self::ScrollUp,
            Gesture::ScrollDown => Self::ScrollDown,
            Gesture::Still => Self::Still,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_observations() {
        let now = Instant::now();
        let sample = Sample::try_from_observation(Observation::present(120.0, now)).unwrap();
        assert_eq!(sample.position, Some(120.0));
        assert!(sample.face_present());

        let sample = Sample::try_from_observation(Observation::absent(now)).unwrap();
        assert!(!sample.face_present());
    }

    #[test]
    fn test_contradictory_observations_become_absent() {
        let now = Instant::now();
        let cases = [
            Observation {
                face_present: false,
                position: Some(100.0),
                timestamp: now,
            },
            Observation {
                face_present: true,
                position: None,
                timestamp: now,
            },
            Observation {
                face_present: true,
                position: Some(f64::NAN),
                timestamp: now,
            },
        ];

        for observation in cases {
            assert!(matches!(
                Sample::try_from_observation(observation),
                Err(Error::InvalidSample(_))
            ));
            let sample = Sample::from_observation(observation);
            assert!(!sample.face_present());
            assert_eq!(sample.timestamp, now);
        }
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(Intent::ScrollUp.status_message(), "Scrolling Up");
        assert_eq!(Intent::Still.status_message(), "Head still: Enjoy your Reel!");
        assert_eq!(
            Intent::CalibrationStarted {
                remaining: Duration::from_millis(2500)
            }
            .status_message(),
            "Adjust your face - Capturing in 3 seconds"
        );
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.movement_threshold, 13.0);
        assert_eq!(config.cooldown_period, Duration::from_millis(1500));
        assert_eq!(config.absence_grace_period, Duration::from_secs(5));
        assert_eq!(config.countdown_duration, Duration::from_secs(4));
    }
}
