//! Clamped float to pixel coordinate conversions

/// Clamp and convert f32 to i32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f32_to_i32_clamp(value: f32, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(min as f32, max as f32);
    (clamped as i32).clamp(min, max)
}

/// Clamp and convert f64 to i32 for pixel coordinates
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i32_clamp(value: f64, min: i32, max: i32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    value.round().clamp(f64::from(min), f64::from(max)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_f32_to_i32_clamp() {
        assert_eq!(f32_to_i32_clamp(50.0, 0, 100), 50);
        assert_eq!(f32_to_i32_clamp(-10.0, 0, 100), 0);
        assert_eq!(f32_to_i32_clamp(150.0, 0, 100), 100);
        assert_eq!(f32_to_i32_clamp(f32::NAN, 0, 100), 0);
        assert_eq!(f32_to_i32_clamp(f32::INFINITY, 0, 100), 0);
    }

    #[test]
    fn test_f64_to_i32_clamp() {
        assert_eq!(f64_to_i32_clamp(239.6, 0, 480), 240);
        assert_eq!(f64_to_i32_clamp(-3.0, 0, 480), 0);
        assert_eq!(f64_to_i32_clamp(1e12, 0, 480), 480);
        assert_eq!(f64_to_i32_clamp(f64::NAN, 0, 480), 0);
        assert_eq!(f64_to_i32_clamp(5.0, 10, -10), 5);
    }

    proptest! {
        #[test]
        fn prop_f32_to_i32_clamp_always_within_bounds(
            value in any::<f32>(),
            min in any::<i32>(),
            max in any::<i32>()
        ) {
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            let result = f32_to_i32_clamp(value, min, max);
            prop_assert!(result >= min);
            prop_assert!(result <= max);
        }

        #[test]
        fn prop_f64_to_i32_clamp_always_within_bounds(
            value in any::<f64>(),
            min in any::<i32>(),
            max in any::<i32>()
        ) {
            let (min, max) = if min <= max { (min, max) } else { (max, min) };
            let result = f64_to_i32_clamp(value, min, max);
            prop_assert!(result >= min);
            prop_assert!(result <= max);
        }
    }
}
