//! Main application module for hands-free video control.

use crate::{
    config::Config,
    dispatch::{create_dispatcher, ActionDispatcher, LogDispatcher},
    error::{Error, Result},
    filters::create_filter,
    overlay::Overlay,
    sampler::{CameraSampler, VideoSource},
    session::{NoControls, Session, SessionStats},
};
use log::{info, warn};
use std::time::Instant;

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMode {
    /// Show the camera window
    Camera,
    /// No GUI (headless)
    None,
}

impl GuiMode {
    /// Parse a GUI mode name
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "cam" | "camera" => Ok(Self::Camera),
            "none" => Ok(Self::None),
            other => Err(Error::ConfigError(format!("Unknown GUI mode: {other}"))),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera index or video file path
    pub video_source: VideoSource,
    /// GUI display mode
    pub gui_mode: GuiMode,
    /// Validated settings from file and command line
    pub settings: Config,
}

impl AppConfig {
    /// Combine a video source with validated settings
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(video_source: VideoSource, settings: Config) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            video_source,
            gui_mode: GuiMode::parse(&settings.display.gui_mode)?,
            settings,
        })
    }
}

/// Main application struct
pub struct HeadScrollApp {
    sampler: CameraSampler,
    session: Session<Box<dyn ActionDispatcher>>,
    overlay: Option<Overlay>,
}

impl HeadScrollApp {
    /// Create a new head scroll application
    ///
    /// # Errors
    ///
    /// Returns an error if the models, the video source or the window cannot be set up.
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing Head Scroll application");
        let settings = &config.settings;
        settings.validate_models()?;

        let sampler = CameraSampler::new(
            config.video_source.clone(),
            &settings.models.face_detector,
            &settings.models.face_landmarks,
            settings.face_detection.confidence_threshold,
            settings.face_detection.iou_threshold,
            settings.display.mirror,
        )?;

        let dispatcher = match create_dispatcher(&settings.actions) {
            Ok(dispatcher) => dispatcher,
            Err(Error::Dispatch(e)) => {
                warn!("Failed to initialize {} dispatcher: {e}. Falling back to log output", settings.actions.dispatcher);
                Box::new(LogDispatcher)
            }
            Err(e) => return Err(e),
        };

        let filter = create_filter(&settings.filter.position_filter)?;
        let session = Session::with_filter(settings.gesture.session_config()?, dispatcher, filter, Instant::now());

        let overlay = match config.gui_mode {
            GuiMode::Camera => Some(Overlay::new(settings.display.show_fps)?),
            GuiMode::None => None,
        };

        Ok(Self {
            sampler,
            session,
            overlay,
        })
    }

    /// Run the main application loop
    ///
    /// Keys read after a frame is shown take effect before the next one.
    ///
    /// # Errors
    ///
    /// Returns an error if the sampler, the dispatcher or the window fails.
    pub fn run(&mut self) -> Result<SessionStats> {
        info!("Starting main application loop");
        let overlay = &mut self.overlay;

        let stats = self
            .session
            .run_with(&mut self.sampler, &mut NoControls, |sampler, engine, step| match overlay.as_mut() {
                Some(overlay) => {
                    overlay.render(sampler.frame(), sampler.face(), engine, step)?;
                    overlay.poll_control()
                }
                None => Ok(None),
            })?;

        info!("Application shutting down: {stats:?}");
        Ok(stats)
    }
}
