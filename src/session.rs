//! Session driver: pumps samples through the gesture engine and hands the
//! resulting intents to a dispatcher.

use crate::{
    dispatch::ActionDispatcher,
    error::{Error, Result},
    filters::{NoFilter, PositionFilter},
    gesture::{GestureEngine, Intent, Observation, Sample, SessionConfig, Step},
    sampler::LandmarkSampler,
};
use log::{info, warn};
use std::{collections::VecDeque, ops::ControlFlow, time::Instant};

/// External session triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Drop the baseline and calibrate again
    Reset,
    /// End the session
    Quit,
}

impl Control {
    /// Map a key code from the GUI to a control
    #[must_use]
    pub fn from_key(key: i32) -> Option<Self> {
        match key {
            k if k == i32::from(b'r') || k == i32::from(b'R') => Some(Self::Reset),
            k if k == i32::from(b'q') || k == i32::from(b'Q') || k == crate::constants::KEY_ESCAPE => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Source of control triggers, polled once before every step
pub trait ControlSource {
    /// Next pending control, if any
    fn poll(&mut self) -> Option<Control>;
}

/// No external controls; the session ends with the sample stream
#[derive(Debug, Default)]
pub struct NoControls;

impl ControlSource for NoControls {
    fn poll(&mut self) -> Option<Control> {
        None
    }
}

/// Controls delivered at fixed step indices
#[derive(Debug, Clone, Default)]
pub struct ScriptedControls {
    schedule: VecDeque<(u64, Control)>,
    polls: u64,
}

impl ScriptedControls {
    /// Deliver each control just before the step with the given index
    pub fn new(schedule: impl IntoIterator<Item = (u64, Control)>) -> Self {
        let mut schedule: Vec<_> = schedule.into_iter().collect();
        schedule.sort_by_key(|&(step, _)| step);
        Self {
            schedule: schedule.into(),
            polls: 0,
        }
    }
}

impl ControlSource for ScriptedControls {
    fn poll(&mut self) -> Option<Control> {
        let current = self.polls;
        self.polls += 1;
        match self.schedule.front() {
            Some(&(step, control)) if step <= current => {
                self.schedule.pop_front();
                Some(control)
            }
            _ => None,
        }
    }
}

/// Counters for a finished or running session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Samples processed
    pub samples: u64,
    /// Samples without a face
    pub absent_samples: u64,
    /// Fired scroll-up intents
    pub scrolls_up: u64,
    /// Fired scroll-down intents
    pub scrolls_down: u64,
    /// Scrolls classified but held back by the cooldown
    pub scrolls_suppressed: u64,
    /// Pause intents
    pub pauses: u64,
    /// Resume intents
    pub resumes: u64,
    /// Completed calibrations
    pub calibrations: u64,
    /// Resets applied
    pub resets: u64,
}

impl SessionStats {
    fn record(&mut self, sample: &Sample, step: &Step) {
        self.samples += 1;
        if !sample.face_present() {
            self.absent_samples += 1;
        }
        if step.scroll_suppressed() {
            self.scrolls_suppressed += 1;
        }
        match step.intent {
            Some(Intent::ScrollUp) => self.scrolls_up += 1,
            Some(Intent::ScrollDown) => self.scrolls_down += 1,
            Some(Intent::Pause) => self.pauses += 1,
            Some(Intent::Resume) => self.resumes += 1,
            Some(Intent::CalibrationComplete { .. }) => self.calibrations += 1,
            Some(Intent::Still | Intent::CalibrationStarted { .. }) | None => {}
        }
    }
}

/// One gesture session: engine, smoothing, dispatcher and statistics
pub struct Session<D: ActionDispatcher> {
    engine: GestureEngine,
    dispatcher: D,
    filter: Box<dyn PositionFilter>,
    stats: SessionStats,
}

impl<D: ActionDispatcher> Session<D> {
    /// Start a session at `started_at` without position smoothing
    pub fn new(config: SessionConfig, dispatcher: D, started_at: Instant) -> Self {
        Self::with_filter(config, dispatcher, Box::new(NoFilter), started_at)
    }

    /// Start a session that smooths positions with `filter`
    pub fn with_filter(
        config: SessionConfig,
        dispatcher: D,
        filter: Box<dyn PositionFilter>,
        started_at: Instant,
    ) -> Self {
        info!(
            "Session started: threshold {:.1}, cooldown {:.2}s, grace {:.1}s, countdown {:.1}s, filter {}, dispatcher {}",
            config.movement_threshold,
            config.cooldown_period.as_secs_f64(),
            config.absence_grace_period.as_secs_f64(),
            config.countdown_duration.as_secs_f64(),
            filter.name(),
            dispatcher.name()
        );
        Self {
            engine: GestureEngine::new(config, started_at),
            dispatcher,
            filter,
            stats: SessionStats::default(),
        }
    }

    /// Gesture engine state
    pub const fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    /// Dispatcher
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Counters so far
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Apply an external trigger
    pub fn apply_control(&mut self, control: Control) -> ControlFlow<()> {
        match control {
            Control::Reset => {
                info!("Script reset. Please adjust your face again.");
                self.engine.reset();
                self.filter.reset();
                self.stats.resets += 1;
                ControlFlow::Continue(())
            }
            Control::Quit => {
                info!("Exit requested by user");
                ControlFlow::Break(())
            }
        }
    }

    /// Process one observation and dispatch the resulting intent
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher fails.
    pub fn process(&mut self, observation: Observation) -> Result<Step> {
        let mut sample = Sample::from_observation(observation);
        sample.position = sample.position.map(|position| self.filter.apply(position));

        let step = self.engine.step(&sample);
        self.stats.record(&sample, &step);

        if let Some(intent) = &step.intent {
            self.dispatcher
                .dispatch(intent, self.engine.playback())
                .map_err(|e| match e {
                    Error::Dispatch(_) => e,
                    other => Error::Dispatch(other.to_string()),
                })?;
        }

        Ok(step)
    }

    /// Run until the sampler ends, a quit control arrives or a boundary fails
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleUnavailable`] if the sampler fails and
    /// [`Error::Dispatch`] if the dispatcher fails.
    pub fn run<S, C>(&mut self, sampler: &mut S, controls: &mut C) -> Result<SessionStats>
    where
        S: LandmarkSampler + ?Sized,
        C: ControlSource + ?Sized,
    {
        self.run_with(sampler, controls, |_, _, _| Ok(None))
    }

    /// Like [`Session::run`], calling `after_step` once each sample has been
    /// processed and dispatched. A control it returns is applied before the
    /// next sample, ahead of the one polled from `controls`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleUnavailable`] if the sampler fails,
    /// [`Error::Dispatch`] if the dispatcher fails and any error from
    /// `after_step`.
    pub fn run_with<S, C, F>(&mut self, sampler: &mut S, controls: &mut C, mut after_step: F) -> Result<SessionStats>
    where
        S: LandmarkSampler + ?Sized,
        C: ControlSource + ?Sized,
        F: FnMut(&S, &GestureEngine, &Step) -> Result<Option<Control>>,
    {
        let mut pending: Option<Control> = None;

        'samples: loop {
            for control in [pending.take(), controls.poll()].into_iter().flatten() {
                if self.apply_control(control).is_break() {
                    break 'samples;
                }
            }

            let observation = match sampler.next_observation() {
                Ok(Some(observation)) => observation,
                Ok(None) => break,
                Err(Error::SampleUnavailable(reason)) => return Err(Error::SampleUnavailable(reason)),
                Err(e) => {
                    warn!("Landmark sampler failed: {e}");
                    return Err(Error::SampleUnavailable(e.to_string()));
                }
            };

            let step = self.process(observation)?;
            pending = after_step(sampler, &self.engine, &step)?;
        }

        info!("Session finished: {:?}", self.stats);
        Ok(self.stats)
    }
}
