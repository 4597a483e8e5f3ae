//! Action dispatchers: perform the side effects of emitted intents.
//!
//! Scrolling is sent as mouse wheel button presses and pause/resume as a
//! left click, the same input a user would give a video page by hand.

use crate::{
    config::ActionConfig,
    constants::{BUTTON_LEFT, BUTTON_WHEEL_DOWN, BUTTON_WHEEL_UP},
    error::{Error, Result},
    gesture::{Intent, PlaybackState},
};
use log::{debug, info};
use x11rb::{
    connection::{Connection, RequestConnection},
    protocol::{
        xproto::{Window, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT},
        xtest::{self, ConnectionExt as _},
    },
    rust_connection::RustConnection,
};

/// Performs the side effect associated with an intent
pub trait ActionDispatcher {
    /// Perform the action for `intent`. `playback` is the state after the
    /// engine processed the sample that produced it.
    ///
    /// # Errors
    ///
    /// Returns an error if the side effect could not be performed.
    fn dispatch(&mut self, intent: &Intent, playback: PlaybackState) -> Result<()>;

    /// Get dispatcher name
    fn name(&self) -> &str;
}

/// Dry-run dispatcher that only logs status text
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl ActionDispatcher for LogDispatcher {
    fn dispatch(&mut self, intent: &Intent, _playback: PlaybackState) -> Result<()> {
        match intent {
            Intent::Still | Intent::CalibrationStarted { .. } => debug!("{}", intent.status_message()),
            _ => info!("{}", intent.status_message()),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Injects wheel and click events through the X11 XTEST extension
pub struct X11Dispatcher {
    connection: RustConnection,
    root: Window,
    scroll_clicks: u32,
}

impl X11Dispatcher {
    /// Connect to the X server and check for XTEST
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be opened or lacks XTEST.
    pub fn new(scroll_clicks: u32) -> Result<Self> {
        info!("Initializing X11 input dispatcher");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| Error::Dispatch(format!("Failed to connect to X11: {e}")))?;

        let root = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::Dispatch("Failed to get screen".to_string()))?
            .root;

        connection
            .extension_information(xtest::X11_EXTENSION_NAME)
            .map_err(|e| Error::Dispatch(format!("Failed to query XTEST: {e}")))?
            .ok_or_else(|| Error::Dispatch("X server does not support XTEST".to_string()))?;

        info!("Connected to X11 display, {scroll_clicks} wheel clicks per scroll");

        Ok(Self {
            connection,
            root,
            scroll_clicks,
        })
    }

    fn fake_button(&self, event: u8, button: u8) -> Result<()> {
        self.connection
            .xtest_fake_input(event, button, x11rb::CURRENT_TIME, self.root, 0, 0, 0)
            .map_err(|e| Error::Dispatch(format!("Failed to send button {button} event: {e}")))?;
        Ok(())
    }

    /// Press and release `button` `times` times
    fn click(&self, button: u8, times: u32) -> Result<()> {
        for _ in 0..times {
            self.fake_button(BUTTON_PRESS_EVENT, button)?;
            self.fake_button(BUTTON_RELEASE_EVENT, button)?;
        }

        self.connection
            .flush()
            .map_err(|e| Error::Dispatch(format!("Failed to flush connection: {e}")))?;

        Ok(())
    }
}

impl ActionDispatcher for X11Dispatcher {
    fn dispatch(&mut self, intent: &Intent, playback: PlaybackState) -> Result<()> {
        match (intent, playback) {
            (Intent::ScrollUp, _) => {
                info!("{}", intent.status_message());
                self.click(BUTTON_WHEEL_UP, self.scroll_clicks)
            }
            (Intent::ScrollDown, _) => {
                info!("{}", intent.status_message());
                self.click(BUTTON_WHEEL_DOWN, self.scroll_clicks)
            }
            // Only click when the engine actually changed playback state
            (Intent::Pause, PlaybackState::Paused) | (Intent::Resume, PlaybackState::Playing) => {
                info!("{}", intent.status_message());
                self.click(BUTTON_LEFT, 1)
            }
            _ => {
                debug!("{}", intent.status_message());
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        "x11"
    }
}

/// Dispatcher backend selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherKind {
    /// XTEST wheel and click injection
    X11,
    /// Log intents only
    Log,
}

impl DispatcherKind {
    /// Parse a backend name
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "x11" => Ok(Self::X11),
            "log" | "none" => Ok(Self::Log),
            other => Err(Error::ConfigError(format!(
                "Unknown dispatcher '{other}', expected 'x11' or 'log'"
            ))),
        }
    }
}

/// Create a dispatcher by backend name
///
/// # Errors
///
/// Returns an error for unknown names or if the backend cannot start.
pub fn create_dispatcher(config: &ActionConfig) -> Result<Box<dyn ActionDispatcher>> {
    match DispatcherKind::parse(&config.dispatcher)? {
        DispatcherKind::X11 => Ok(Box::new(X11Dispatcher::new(config.scroll_clicks)?)),
        DispatcherKind::Log => Ok(Box::new(LogDispatcher)),
    }
}

impl<D: ActionDispatcher + ?Sized> ActionDispatcher for Box<D> {
    fn dispatch(&mut self, intent: &Intent, playback: PlaybackState) -> Result<()> {
        (**self).dispatch(intent, playback)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
