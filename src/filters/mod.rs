//! Smoothing filters for the tracked landmark position.
//!
//! Landmark detectors jitter by a pixel or two between frames. These filters
//! optionally smooth the nose row before it reaches the gesture engine.
//! The default is `none`, which leaves positions untouched.

/// Kalman filter with a constant-velocity model
pub mod kalman;

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{
    constants::{DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW},
    Error, Result,
};

/// Trait for all position filters
pub trait PositionFilter: Send + Sync {
    /// Apply filter to a new position
    fn apply(&mut self, position: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl PositionFilter for NoFilter {
    fn apply(&mut self, position: f64) -> f64 {
        position
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_param<T: std::str::FromStr>(spec: &str, value: Option<&str>, default: T) -> Result<T> {
    value.map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' in filter '{spec}'")))
    })
}

fn parse_window(spec: &str, value: Option<&str>, default: usize) -> Result<usize> {
    let window = parse_param(spec, value, default)?;
    if window == 0 {
        return Err(Error::FilterError(format!("Window size must be greater than 0 in '{spec}'")));
    }
    Ok(window)
}

/// Create a position filter from a spec string such as `median:5` or
/// `exponential:0.3`. Parameters after the colon are optional.
///
/// # Errors
///
/// Returns [`Error::FilterError`] for unknown names or invalid parameters.
pub fn create_filter(spec: &str) -> Result<Box<dyn PositionFilter>> {
    let lowered = spec.trim().to_lowercase();
    let mut parts = lowered.splitn(2, ':');
    let name = parts.next().unwrap_or_default();
    let param = parts.next();

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "kalman" => Ok(Box::new(kalman::KalmanFilter::new())),
        "moving_average" | "movingaverage" => {
            let window = parse_window(spec, param, DEFAULT_MOVING_AVERAGE_WINDOW)?;
            Ok(Box::new(moving_average::MovingAverageFilter::new(window)))
        }
        "median" => {
            let window = parse_window(spec, param, DEFAULT_MEDIAN_WINDOW)?;
            Ok(Box::new(median::MedianFilter::new(window)))
        }
        "exponential" => {
            let alpha: f64 = parse_param(spec, param, DEFAULT_EXPONENTIAL_ALPHA)?;
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        assert_eq!(filter.apply(123.0), 123.0);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("kalman").is_ok());
        assert!(create_filter("median").is_ok());
        assert!(create_filter("Moving_Average:3").is_ok());
        assert!(create_filter("exponential:0.25").is_ok());
        assert!(create_filter("unknown").is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        for spec in ["median:0", "median:abc", "movingaverage:-5", "exponential:0", "exponential:1.5"] {
            assert!(
                matches!(create_filter(spec), Err(Error::FilterError(_))),
                "expected error for {spec}"
            );
        }
    }
}
