use crate::{
    constants::{NOSE_TIP_LANDMARK, NUM_FACIAL_LANDMARKS},
    Error, Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Point2f, Size, Vec3b};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Default landmark detector input size
const DEFAULT_LANDMARK_INPUT_SIZE: i32 = 128;

/// Facial landmark detector using `ONNX` Runtime
pub struct MarkDetector {
    session: Session,
    input_size: i32,
}

impl MarkDetector {
    /// Create a new landmark detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(Error::ModelError(format!("Model file not found: {}", model_path.display())));
        }
        log::info!("Loading landmark model: {}", model_path.display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("mark_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        Ok(Self {
            session,
            input_size: DEFAULT_LANDMARK_INPUT_SIZE,
        })
    }

    /// Detect the 68 facial landmarks in a face crop, in crop coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails, or the model
    /// returns fewer values than expected.
    pub fn detect(&self, face_image: &Mat) -> Result<Vec<Point2f>> {
        let input = self.preprocess(face_image)?;
        let marks = self.forward(input)?;
        #[allow(clippy::cast_precision_loss)]
        let scale = (
            face_image.cols() as f32 / self.input_size as f32,
            face_image.rows() as f32 / self.input_size as f32,
        );
        scale_marks(&marks, scale)
    }

    /// Resize to the model input and convert BGR u8 to RGB in [0, 1], NHWC
    #[allow(clippy::cast_sign_loss)]
    fn preprocess(&self, image: &Mat) -> Result<Array4<f32>> {
        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let size = self.input_size as usize;
        let mut input = Array4::<f32>::zeros((1, size, size, 3));
        for row in 0..self.input_size {
            for col in 0..self.input_size {
                let pixel = resized.at_2d::<Vec3b>(row, col)?;
                for ch in 0..3 {
                    input[[0, row as usize, col as usize, ch]] = f32::from(pixel[2 - ch]) / 255.0;
                }
            }
        }

        Ok(input)
    }

    /// Run forward pass through the model
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let marks_output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelOutputError("No output from landmark model".to_string()))?;

        let marks_tensor = marks_output.try_extract::<f32>()?;
        let marks_view = marks_tensor.view();
        let marks = marks_view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get landmark data".to_string()))?;

        Ok(marks.to_vec())
    }
}

/// Turn the flat `[x0, y0, x1, y1, ...]` model output, normalised to the
/// model input size, into points in crop coordinates
fn scale_marks(marks: &[f32], (scale_x, scale_y): (f32, f32)) -> Result<Vec<Point2f>> {
    if marks.len() < NUM_FACIAL_LANDMARKS * 2 {
        return Err(Error::ModelDataFormatError(format!(
            "Expected {} landmark values, got {}",
            NUM_FACIAL_LANDMARKS * 2,
            marks.len()
        )));
    }

    Ok(marks
        .chunks_exact(2)
        .take(NUM_FACIAL_LANDMARKS)
        .map(|xy| Point2f::new(xy[0] * scale_x, xy[1] * scale_y))
        .collect())
}

/// Nose tip of a full 68-point landmark set
#[must_use]
pub fn nose_tip(landmarks: &[Point2f]) -> Option<Point2f> {
    if landmarks.len() == NUM_FACIAL_LANDMARKS {
        landmarks.get(NOSE_TIP_LANDMARK).copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_input_size() {
        assert_eq!(DEFAULT_LANDMARK_INPUT_SIZE, 128);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_scale_marks() {
        let marks: Vec<f32> = (0..NUM_FACIAL_LANDMARKS * 2).map(|i| i as f32).collect();
        let points = scale_marks(&marks, (2.0, 0.5)).unwrap();

        assert_eq!(points.len(), NUM_FACIAL_LANDMARKS);
        assert_eq!(points[0], Point2f::new(0.0, 0.5));
        assert_eq!(points[NOSE_TIP_LANDMARK], Point2f::new(120.0, 30.5));
    }

    #[test]
    fn test_scale_marks_rejects_short_output() {
        assert!(matches!(
            scale_marks(&[0.0; 10], (1.0, 1.0)),
            Err(Error::ModelDataFormatError(_))
        ));
    }

    #[test]
    fn test_nose_tip() {
        let mut landmarks = vec![Point2f::new(0.0, 0.0); NUM_FACIAL_LANDMARKS];
        landmarks[NOSE_TIP_LANDMARK] = Point2f::new(64.0, 80.0);
        assert_eq!(nose_tip(&landmarks), Some(Point2f::new(64.0, 80.0)));

        // Partial landmark sets are not trusted
        assert_eq!(nose_tip(&landmarks[..40]), None);
    }
}
