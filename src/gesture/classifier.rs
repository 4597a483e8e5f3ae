/// Classified head movement relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// Landmark moved further down the image than the dead zone allows
    ScrollUp,
    /// Landmark moved further up the image than the dead zone allows
    ScrollDown,
    /// Landmark inside the dead zone (boundaries included)
    Still,
}

/// Classify a position against the baseline.
///
/// `delta = position - baseline`; `delta > threshold` scrolls up,
/// `delta < -threshold` scrolls down, everything else is still. A NaN delta
/// falls through to `Still`.
#[must_use]
pub fn classify(position: f64, baseline: f64, threshold: f64) -> Gesture {
    let delta = position - baseline;
    if delta > threshold {
        Gesture::ScrollUp
    } else if delta < -threshold {
        Gesture::ScrollDown
    } else {
        Gesture::Still
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions() {
        assert_eq!(classify(120.0, 100.0, 13.0), Gesture::ScrollUp);
        assert_eq!(classify(80.0, 100.0, 13.0), Gesture::ScrollDown);
        assert_eq!(classify(105.0, 100.0, 13.0), Gesture::Still);
        assert_eq!(classify(95.0, 100.0, 13.0), Gesture::Still);
    }

    #[test]
    fn test_boundaries_are_still() {
        assert_eq!(classify(113.0, 100.0, 13.0), Gesture::Still);
        assert_eq!(classify(87.0, 100.0, 13.0), Gesture::Still);
        assert_eq!(classify(113.000_001, 100.0, 13.0), Gesture::ScrollUp);
        assert_eq!(classify(86.999_999, 100.0, 13.0), Gesture::ScrollDown);
    }

    #[test]
    fn test_zero_threshold() {
        assert_eq!(classify(100.0, 100.0, 0.0), Gesture::Still);
        assert_eq!(classify(100.5, 100.0, 0.0), Gesture::ScrollUp);
        assert_eq!(classify(99.5, 100.0, 0.0), Gesture::ScrollDown);
    }

    #[test]
    fn test_partition_is_exhaustive() {
        let threshold = 13.0;
        for i in -400..=400 {
            let position = 100.0 + f64::from(i) * 0.25;
            let delta = position - 100.0;
            let gesture = classify(position, 100.0, threshold);
            let expected = [delta > threshold, delta < -threshold, (-threshold..=threshold).contains(&delta)];
            assert_eq!(expected.iter().filter(|&&hit| hit).count(), 1);
            match gesture {
                Gesture::ScrollUp => assert!(expected[0]),
                Gesture::ScrollDown => assert!(expected[1]),
                Gesture::Still => assert!(expected[2]),
            }
        }
    }

    #[test]
    fn test_extreme_values() {
        assert_eq!(classify(f64::MAX, 0.0, 13.0), Gesture::ScrollUp);
        assert_eq!(classify(f64::MIN, 0.0, 13.0), Gesture::ScrollDown);
        assert_eq!(classify(f64::NAN, 0.0, 13.0), Gesture::Still);
    }
}
