//! Helper functions and utilities for tests

#![allow(dead_code)]

use head_scroll::{
    dispatch::ActionDispatcher,
    gesture::{Intent, Observation, PlaybackState, SessionConfig},
    sampler::LandmarkSampler,
    Error, Result,
};
use std::time::{Duration, Instant};

/// Configuration used by the documented scenarios
pub fn scenario_config() -> SessionConfig {
    SessionConfig {
        movement_threshold: 13.0,
        cooldown_period: Duration::from_millis(1500),
        absence_grace_period: Duration::from_secs(5),
        countdown_duration: Duration::from_secs(4),
    }
}

/// Observations on a millisecond timeline relative to a fixed start
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    pub start: Instant,
}

impl Timeline {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn at(&self, millis: u64) -> Instant {
        self.start + Duration::from_millis(millis)
    }

    pub fn face(&self, millis: u64, position: f64) -> Observation {
        Observation::present(position, self.at(millis))
    }

    pub fn no_face(&self, millis: u64) -> Observation {
        Observation::absent(self.at(millis))
    }

    /// One present sample per second from 0 to `countdown_secs` inclusive;
    /// the last one captures the baseline
    pub fn calibration(&self, countdown_secs: u64, position: f64) -> Vec<Observation> {
        (0..=countdown_secs).map(|s| self.face(s * 1000, position)).collect()
    }
}

/// Dispatcher that records every intent it receives
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub received: Vec<(Intent, PlaybackState)>,
    pub fail_on: Option<Intent>,
}

impl RecordingDispatcher {
    pub fn intents(&self) -> Vec<Intent> {
        self.received.iter().map(|(intent, _)| *intent).collect()
    }

    pub fn count(&self, wanted: &Intent) -> usize {
        self.received.iter().filter(|(intent, _)| intent == wanted).count()
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, intent: &Intent, playback: PlaybackState) -> Result<()> {
        if self.fail_on.as_ref() == Some(intent) {
            return Err(Error::Dispatch(format!("refusing {intent:?}")));
        }
        self.received.push((*intent, playback));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Sampler that yields some observations and then fails like an unplugged camera
pub struct FailingSampler {
    pub before_failure: Vec<Observation>,
}

impl LandmarkSampler for FailingSampler {
    fn next_observation(&mut self) -> Result<Option<Observation>> {
        if self.before_failure.is_empty() {
            Err(Error::SampleUnavailable("camera disconnected".to_string()))
        } else {
            Ok(Some(self.before_failure.remove(0)))
        }
    }
}
