//! Hands-free video control driven by vertical head movement.
//!
//! This library turns the vertical position of the nose tip into video
//! control actions:
//! - ONNX Runtime for face and landmark detection
//! - `OpenCV` for capture and the feedback window
//! - X11 XTEST for wheel and click injection
//!
//! The pipeline consists of:
//! 1. A landmark sampler that reports the nose row of the single tracked face
//! 2. Optional smoothing of that position
//! 3. The gesture engine: calibration countdown, dead-zone classification,
//!    scroll cooldown and absence handling
//! 4. A dispatcher that performs the resulting intent
//!
//! # Examples
//!
//! ## Driving the Engine
//!
//! ```
//! use head_scroll::gesture::{GestureEngine, Intent, Observation, Sample, SessionConfig};
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut engine = GestureEngine::new(SessionConfig::default(), start);
//!
//! // Hold still through the four second countdown
//! for second in 0..=4 {
//!     let at = start + Duration::from_secs(second);
//!     engine.step(&Sample::from_observation(Observation::present(240.0, at)));
//! }
//! assert_eq!(engine.baseline(), Some(240.0));
//!
//! // Nose moves down past the dead zone
//! let at = start + Duration::from_secs(6);
//! let step = engine.step(&Sample::from_observation(Observation::present(260.0, at)));
//! assert_eq!(step.intent, Some(Intent::ScrollUp));
//! ```
//!
//! ## Running a Session
//!
//! ```
//! use head_scroll::{
//!     dispatch::LogDispatcher,
//!     gesture::{Observation, SessionConfig},
//!     sampler::ScriptedSampler,
//!     session::{NoControls, Session},
//! };
//! use std::time::{Duration, Instant};
//!
//! # fn main() -> head_scroll::Result<()> {
//! let start = Instant::now();
//! let mut sampler = ScriptedSampler::new(
//!     (0..10).map(|i| Observation::present(240.0, start + Duration::from_millis(i * 500))),
//! );
//!
//! let mut session = Session::new(SessionConfig::default(), LogDispatcher, start);
//! let stats = session.run(&mut sampler, &mut NoControls)?;
//! assert_eq!(stats.samples, 10);
//! assert_eq!(stats.calibrations, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Camera Pipeline
//!
//! ```no_run
//! use head_scroll::{
//!     dispatch::X11Dispatcher,
//!     filters::create_filter,
//!     gesture::SessionConfig,
//!     sampler::{CameraSampler, VideoSource},
//!     session::{NoControls, Session},
//! };
//! use std::time::Instant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sampler = CameraSampler::new(
//!     VideoSource::Camera(0),
//!     "assets/face_detector.onnx",
//!     "assets/face_landmarks.onnx",
//!     0.5,
//!     0.4,
//!     true,
//! )?;
//! let dispatcher = X11Dispatcher::new(100)?;
//! let filter = create_filter("median:5")?;
//!
//! let mut session = Session::with_filter(SessionConfig::default(), dispatcher, filter, Instant::now());
//! let stats = session.run(&mut sampler, &mut NoControls)?;
//! println!("{} scrolls", stats.scrolls_up + stats.scrolls_down);
//! # Ok(())
//! # }
//! ```

/// Gesture state machine: calibration, classification, cooldown, presence
pub mod gesture;

/// Face detection module for finding faces in images
pub mod face_detection;

/// Facial landmark detection module for finding 68 key points
pub mod mark_detection;

/// Per-frame nose position sources
pub mod sampler;

/// Side effects for emitted intents
pub mod dispatch;

/// Session driver tying sampler, engine and dispatcher together
pub mod session;

/// Feedback window
pub mod overlay;

/// Smoothing filters for the tracked position
pub mod filters;

/// Utility functions for coordinate handling
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
