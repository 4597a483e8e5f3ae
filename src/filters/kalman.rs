use super::PositionFilter;
use crate::constants::DEFAULT_FPS;
use nalgebra::{Matrix1, Matrix1x2, Matrix2, Vector2};

/// Kalman filter tracking the landmark row and its velocity
pub struct KalmanFilter {
    // State: [y, vy]
    state: Vector2<f64>,
    covariance: Matrix2<f64>,
    process_noise: Matrix2<f64>,
    measurement_noise: Matrix1<f64>,
    transition: Matrix2<f64>,
    measurement: Matrix1x2<f64>,
    initialized: bool,
}

impl KalmanFilter {
    #[must_use]
    pub fn new() -> Self {
        let dt = 1.0 / DEFAULT_FPS;

        let transition = Matrix2::new(
            1.0, dt,
            0.0, 1.0,
        );

        // Only the position is measured
        let measurement = Matrix1x2::new(1.0, 0.0);

        let q = 50.0;
        let process_noise = Matrix2::new(
            q * dt.powi(4) / 4.0, q * dt.powi(3) / 2.0,
            q * dt.powi(3) / 2.0, q * dt.powi(2),
        );

        // Pixel-level detector jitter
        let measurement_noise = Matrix1::new(4.0);

        Self {
            state: Vector2::zeros(),
            covariance: Matrix2::identity() * 1000.0,
            process_noise,
            measurement_noise,
            transition,
            measurement,
            initialized: false,
        }
    }

    fn predict(&mut self) {
        self.state = self.transition * self.state;
        self.covariance = self.transition * self.covariance * self.transition.transpose() + self.process_noise;
    }

    fn update(&mut self, position: f64) {
        let innovation = Matrix1::new(position) - self.measurement * self.state;
        let innovation_cov = self.measurement * self.covariance * self.measurement.transpose() + self.measurement_noise;

        // Innovation covariance is a positive scalar; skip the update if it degenerates
        let Some(inverse) = innovation_cov.try_inverse() else {
            return;
        };
        let gain = self.covariance * self.measurement.transpose() * inverse;

        self.state += gain * innovation;
        self.covariance = (Matrix2::identity() - gain * self.measurement) * self.covariance;
    }
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionFilter for KalmanFilter {
    fn apply(&mut self, position: f64) -> f64 {
        if !self.initialized {
            self.state = Vector2::new(position, 0.0);
            self.initialized = true;
            return position;
        }

        self.predict();
        self.update(position);
        self.state[0]
    }

    fn reset(&mut self) {
        self.state = Vector2::zeros();
        self.covariance = Matrix2::identity() * 1000.0;
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "KalmanFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kalman_filter() {
        let mut filter = KalmanFilter::new();

        // First measurement initializes the filter
        assert_eq!(filter.apply(100.0), 100.0);

        // Subsequent measurements are pulled towards the prediction
        let second = filter.apply(104.0);
        assert!(second > 100.0 && second <= 104.0);
    }

    #[test]
    fn test_converges_on_constant_input() {
        let mut filter = KalmanFilter::new();
        let mut last = 0.0;
        for _ in 0..200 {
            last = filter.apply(250.0);
        }
        assert!((last - 250.0).abs() < 0.5);
    }

    #[test]
    fn test_reset() {
        let mut filter = KalmanFilter::new();
        filter.apply(10.0);
        filter.apply(12.0);
        filter.reset();
        assert_eq!(filter.apply(300.0), 300.0);
    }
}
