//! On-screen feedback window.
//!
//! Draws the tracked face, the calibration target and the current status
//! on top of the camera frame, and turns key presses into session controls.

use crate::{
    constants::{CAMERA_WINDOW, DEFAULT_FPS},
    error::Result,
    gesture::{GestureEngine, Step},
    sampler::TrackedFace,
    session::Control,
    utils::safe_cast::{f32_to_i32_clamp, f64_to_i32_clamp},
};
use opencv::{
    core::{Mat, Point, Scalar},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use std::time::{Duration, Instant};

/// BGR color
fn bgr(blue: f64, green: f64, red: f64) -> Scalar {
    Scalar::new(blue, green, red, 0.0)
}

/// Top status line describing the nose row relative to the target
#[must_use]
pub fn position_line(position: Option<f64>, baseline: Option<f64>) -> String {
    let position = position.map_or_else(|| "-".to_string(), |y| format!("{y:.0}"));
    match baseline {
        Some(baseline) => format!("Nose Y Position: {position} | Adjust to: {baseline:.0} for best experience"),
        None => format!("Nose Y Position: {position} | Restart to set baseline"),
    }
}

/// Row of the target circle: the baseline once captured, the frame middle before
#[must_use]
pub fn target_row(baseline: Option<f64>, frame_rows: i32) -> i32 {
    baseline.map_or(frame_rows / 2, |row| f64_to_i32_clamp(row, 0, frame_rows.max(0)))
}

/// Frames-per-second estimate refreshed once a second
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f64,
}

impl FpsCounter {
    /// Start counting at `now`
    #[must_use]
    pub const fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: DEFAULT_FPS,
        }
    }

    /// Count one frame shown at `now` and return the current estimate
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = f64::from(self.frames) / elapsed.as_secs_f64();
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }
}

/// OpenCV window with the session feedback
pub struct Overlay {
    show_fps: bool,
    fps: FpsCounter,
    status: String,
}

impl Overlay {
    /// Create the window
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn new(show_fps: bool) -> Result<Self> {
        highgui::named_window(CAMERA_WINDOW, WINDOW_NORMAL)?;
        Ok(Self {
            show_fps,
            fps: FpsCounter::new(Instant::now()),
            status: String::new(),
        })
    }

    /// Draw one frame with the outcome of its step
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or displaying fails.
    pub fn render(
        &mut self,
        frame: &Mat,
        face: Option<&TrackedFace>,
        engine: &GestureEngine,
        step: &Step,
    ) -> Result<()> {
        // Keep the last status on screen until something new happens
        if let Some(intent) = &step.intent {
            self.status = intent.status_message();
        }
        let fps = self.fps.tick(Instant::now());

        let mut display = frame.try_clone()?;
        let width = display.cols();
        let height = display.rows();

        if let Some(face) = face {
            imgproc::rectangle(&mut display, face.bbox, bgr(0.0, 255.0, 0.0), 2, LINE_8, 0)?;
            for landmark in &face.landmarks {
                let center = Point::new(
                    f32_to_i32_clamp(landmark.x, 0, width),
                    f32_to_i32_clamp(landmark.y, 0, height),
                );
                imgproc::circle(&mut display, center, 2, bgr(255.0, 0.0, 0.0), -1, LINE_8, 0)?;
            }
        }

        let baseline = engine.baseline();
        let radius = f64_to_i32_clamp(engine.config().movement_threshold, 1, height.max(1));
        imgproc::circle(
            &mut display,
            Point::new(width / 2, target_row(baseline, height)),
            radius,
            bgr(0.0, 0.0, 255.0),
            2,
            LINE_8,
            0,
        )?;

        put_line(&mut display, &position_line(step.position, baseline), Point::new(10, 30), 0.6, bgr(0.0, 255.0, 0.0))?;

        if !self.status.is_empty() {
            let text_size = imgproc::get_text_size(&self.status, FONT_HERSHEY_SIMPLEX, 0.8, 2, &mut 0)?;
            let origin = Point::new(((width - text_size.width) / 2).max(0), height - 30);
            put_line(&mut display, &self.status, origin, 0.8, bgr(255.0, 255.0, 255.0))?;
        }

        if baseline.is_some() {
            put_line(&mut display, "Press 'r' to reset", Point::new(10, height - 60), 0.6, bgr(0.0, 255.0, 0.0))?;
        }

        if self.show_fps {
            put_line(&mut display, &format!("FPS: {fps:.1}"), Point::new(10, 60), 0.6, bgr(0.0, 255.0, 0.0))?;
        }

        highgui::imshow(CAMERA_WINDOW, &display)?;
        Ok(())
    }

    /// Pump window events and map a pressed key to a control
    ///
    /// # Errors
    ///
    /// Returns an error if the GUI event loop fails.
    pub fn poll_control(&self) -> Result<Option<Control>> {
        Ok(Control::from_key(highgui::wait_key(1)?))
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(CAMERA_WINDOW);
    }
}

fn put_line(display: &mut Mat, text: &str, origin: Point, scale: f64, color: Scalar) -> Result<()> {
    imgproc::put_text(display, text, origin, FONT_HERSHEY_SIMPLEX, scale, color, 2, LINE_8, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_line() {
        assert_eq!(
            position_line(Some(241.6), Some(240.0)),
            "Nose Y Position: 242 | Adjust to: 240 for best experience"
        );
        assert_eq!(
            position_line(Some(200.0), None),
            "Nose Y Position: 200 | Restart to set baseline"
        );
        assert_eq!(position_line(None, None), "Nose Y Position: - | Restart to set baseline");
    }

    #[test]
    fn test_target_row() {
        assert_eq!(target_row(None, 480), 240);
        assert_eq!(target_row(Some(300.4), 480), 300);
        assert_eq!(target_row(Some(900.0), 480), 480);
    }

    #[test]
    fn test_fps_counter() {
        let start = Instant::now();
        let mut counter = FpsCounter::new(start);
        assert_eq!(counter.tick(start), DEFAULT_FPS);

        for i in 1..20 {
            counter.tick(start + Duration::from_millis(i * 50));
        }
        let fps = counter.tick(start + Duration::from_secs(1));
        assert!((fps - 21.0).abs() < 1e-9, "fps = {fps}");
    }
}
