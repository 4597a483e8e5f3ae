//! Constants used throughout the application

/// Number of facial landmarks produced by the landmark model
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Index of the nose tip in the 68-point annotation scheme
pub const NOSE_TIP_LANDMARK: usize = 30;

/// Image normalization constants for face detection
pub const IMAGE_NORMALIZATION_OFFSET: f32 = 127.5;
pub const IMAGE_NORMALIZATION_SCALE: f32 = 128.0;

/// Fraction of the face box added on each side before landmark detection
pub const FACE_BOX_EXPANSION: f32 = 0.2;

/// Gesture defaults
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 13.0;
pub const DEFAULT_COOLDOWN_SECS: f64 = 1.5;
pub const DEFAULT_ABSENCE_GRACE_SECS: f64 = 5.0;
pub const DEFAULT_COUNTDOWN_SECS: f64 = 4.0;

/// Wheel clicks sent per scroll intent
pub const DEFAULT_SCROLL_CLICKS: u32 = 100;

/// X11 pointer buttons
pub const BUTTON_LEFT: u8 = 1;
pub const BUTTON_WHEEL_UP: u8 = 4;
pub const BUTTON_WHEEL_DOWN: u8 = 5;

/// Default filter parameters
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Window titles
pub const CAMERA_WINDOW: &str = "Head Scroll";

/// Key codes returned by `highgui::wait_key`
pub const KEY_ESCAPE: i32 = 27;
