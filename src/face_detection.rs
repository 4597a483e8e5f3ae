//! SCRFD face detector running on ONNX Runtime.
//!
//! Only bounding boxes are decoded; the landmark model provides the points.

use crate::{
    constants::{IMAGE_NORMALIZATION_OFFSET, IMAGE_NORMALIZATION_SCALE},
    utils::safe_cast::f32_to_i32_clamp,
    Error, Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Scalar, Size, Vec3b, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Default SCRFD input size
const DEFAULT_INPUT_SIZE: i32 = 640;

/// Face detection result
#[derive(Debug, Clone)]
pub struct FaceDetection {
    /// Bounding box of the detected face
    pub bbox: Rect,
    /// Confidence score of the detection
    pub score: f32,
}

/// Decoded candidate box in model input coordinates: `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    bbox: [f32; 4],
    score: f32,
}

/// SCRFD face detector
pub struct FaceDetector {
    session: Session,
    input_size: (i32, i32),
    conf_threshold: f32,
    nms_threshold: f32,
    strides: Vec<i32>,
    num_anchors: usize,
}

impl FaceDetector {
    /// Load the detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has no inputs.
    pub fn new<P: AsRef<Path>>(model_path: P, conf_threshold: f32, nms_threshold: f32) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(Error::ModelError(format!("Model file not found: {}", model_path.display())));
        }
        log::info!("Loading face detector: {}", model_path.display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelError("Face detector has no inputs".to_string()))?;

        // [batch, channels, height, width]; dynamic axes fall back to 640
        let dims = &input_meta.dimensions;
        #[allow(clippy::cast_possible_truncation)]
        let input_size = if dims.len() >= 4 {
            (
                dims[3].map_or(DEFAULT_INPUT_SIZE, |w| w as i32),
                dims[2].map_or(DEFAULT_INPUT_SIZE, |h| h as i32),
            )
        } else {
            (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
        };

        // Score/box(/keypoint) tensors per stride
        let (strides, num_anchors) = match session.outputs.len() {
            6 | 9 => (vec![8, 16, 32], 2),
            10 | 15 => (vec![8, 16, 32, 64, 128], 1),
            n => {
                log::warn!("Unknown face detector layout with {n} outputs, assuming 3 strides");
                (vec![8, 16, 32], 2)
            }
        };

        Ok(Self {
            session,
            input_size,
            conf_threshold,
            nms_threshold,
            strides,
            num_anchors,
        })
    }

    /// Detect faces, best score first
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn detect(&self, image: &Mat) -> Result<Vec<FaceDetection>> {
        let (input_width, input_height) = self.input_size;
        let img_ratio = image.rows() as f32 / image.cols() as f32;
        let model_ratio = input_height as f32 / input_width as f32;

        let (new_width, new_height) = if img_ratio > model_ratio {
            ((input_height as f32 / img_ratio) as i32, input_height)
        } else {
            (input_width, (input_width as f32 * img_ratio) as i32)
        };
        let scale = new_height as f32 / image.rows() as f32;

        // Letterbox into the top-left corner of the model input
        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(new_width, new_height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;
        let mut padded = Mat::new_rows_cols_with_default(input_height, input_width, CV_8UC3, Scalar::all(0.0))?;
        let mut roi = padded.roi_mut(Rect::new(0, 0, new_width, new_height))?;
        resized.copy_to(&mut roi)?;

        let input = Self::preprocess(&padded)?;
        let mut candidates = self.forward(input)?;
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        let kept = nms(&candidates, self.nms_threshold);

        Ok(kept
            .into_iter()
            .map(|candidate| {
                let [x1, y1, x2, y2] = candidate.bbox.map(|v| v / scale);
                FaceDetection {
                    bbox: Rect::new(
                        f32_to_i32_clamp(x1, 0, image.cols()),
                        f32_to_i32_clamp(y1, 0, image.rows()),
                        f32_to_i32_clamp(x2 - x1, 0, image.cols()),
                        f32_to_i32_clamp(y2 - y1, 0, image.rows()),
                    ),
                    score: candidate.score,
                }
            })
            .collect())
    }

    /// BGR u8 image to normalised RGB NCHW tensor
    #[allow(clippy::cast_sign_loss)]
    fn preprocess(image: &Mat) -> Result<Array4<f32>> {
        let height = image.rows() as usize;
        let width = image.cols() as usize;
        let mut input = Array4::<f32>::zeros((1, 3, height, width));

        for row in 0..height {
            for col in 0..width {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let pixel = image.at_2d::<Vec3b>(row as i32, col as i32)?;
                for ch in 0..3 {
                    // BGR -> RGB
                    let value = f32::from(pixel[2 - ch]);
                    input[[0, ch, row, col]] = (value - IMAGE_NORMALIZATION_OFFSET) / IMAGE_NORMALIZATION_SCALE;
                }
            }
        }

        Ok(input)
    }

    /// Run the model and decode candidates above the score threshold
    fn forward(&self, input: Array4<f32>) -> Result<Vec<Candidate>> {
        let (input_width, input_height) = self.input_size;
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let level_count = self.strides.len();
        if outputs.len() < level_count * 2 {
            return Err(Error::ModelOutputError(format!(
                "Expected at least {} outputs, got {}",
                level_count * 2,
                outputs.len()
            )));
        }

        let mut candidates = Vec::new();
        for (level, &stride) in self.strides.iter().enumerate() {
            let scores = outputs[level].try_extract::<f32>()?;
            let scores = scores.view();
            let scores = scores
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Non-contiguous score tensor".to_string()))?;

            let distances = outputs[level + level_count].try_extract::<f32>()?;
            let distances = distances.view();
            let distances = distances
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Non-contiguous box tensor".to_string()))?;

            candidates.extend(decode_level(
                scores,
                distances,
                stride,
                (input_width / stride, input_height / stride),
                self.num_anchors,
                self.conf_threshold,
            )?);
        }

        Ok(candidates)
    }
}

/// Decode one stride level: every anchor predicts distances from its centre
/// to the four box edges, in units of the stride.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn decode_level(
    scores: &[f32],
    distances: &[f32],
    stride: i32,
    grid: (i32, i32),
    num_anchors: usize,
    threshold: f32,
) -> Result<Vec<Candidate>> {
    let (grid_width, grid_height) = grid;
    let anchors = grid_width.max(0) as usize * grid_height.max(0) as usize * num_anchors;
    if scores.len() < anchors || distances.len() < anchors * 4 {
        return Err(Error::ModelDataFormatError(format!(
            "Stride {stride}: expected {anchors} anchors, got {} scores and {} distances",
            scores.len(),
            distances.len()
        )));
    }

    let stride_f = stride as f32;
    let mut candidates = Vec::new();
    for (index, &score) in scores.iter().take(anchors).enumerate() {
        if score < threshold {
            continue;
        }
        let cell = index / num_anchors;
        let cx = (cell % grid_width as usize) as f32 * stride_f;
        let cy = (cell / grid_width as usize) as f32 * stride_f;
        let d = &distances[index * 4..index * 4 + 4];
        candidates.push(Candidate {
            bbox: [
                cx - d[0] * stride_f,
                cy - d[1] * stride_f,
                cx + d[2] * stride_f,
                cy + d[3] * stride_f,
            ],
            score,
        });
    }

    Ok(candidates)
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let area = |r: &[f32; 4]| (r[2] - r[0] + 1.0).max(0.0) * (r[3] - r[1] + 1.0).max(0.0);
    let w = (a[2].min(b[2]) - a[0].max(b[0]) + 1.0).max(0.0);
    let h = (a[3].min(b[3]) - a[1].max(b[1]) + 1.0).max(0.0);
    let inter = w * h;
    inter / (area(a) + area(b) - inter)
}

/// Greedy non-maximum suppression over candidates sorted by score
fn nms(sorted: &[Candidate], threshold: f32) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in sorted {
        if kept.iter().all(|k| iou(&k.bbox, &candidate.bbox) <= threshold) {
            kept.push(*candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_level() {
        // 2x2 grid, one anchor per cell, stride 8
        let scores = [0.1, 0.9, 0.2, 0.6];
        let distances = [
            1.0, 1.0, 1.0, 1.0, //
            1.0, 1.0, 2.0, 2.0, //
            1.0, 1.0, 1.0, 1.0, //
            0.5, 0.5, 0.5, 0.5,
        ];

        let candidates = decode_level(&scores, &distances, 8, (2, 2), 1, 0.5).unwrap();
        assert_eq!(candidates.len(), 2);

        // Cell 1 sits at (8, 0)
        assert_eq!(candidates[0].bbox, [0.0, -8.0, 24.0, 16.0]);
        assert_eq!(candidates[0].score, 0.9);

        // Cell 3 sits at (8, 8)
        assert_eq!(candidates[1].bbox, [4.0, 4.0, 12.0, 12.0]);
    }

    #[test]
    fn test_decode_level_two_anchors_share_centre() {
        let scores = [0.9, 0.9];
        let distances = [1.0; 8];
        let candidates = decode_level(&scores, &distances, 16, (1, 1), 2, 0.5).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].bbox, candidates[1].bbox);
    }

    #[test]
    fn test_decode_level_rejects_short_tensors() {
        assert!(decode_level(&[0.9], &[1.0; 4], 8, (2, 2), 1, 0.5).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlaps() {
        let sorted = [
            Candidate {
                bbox: [10.0, 10.0, 110.0, 110.0],
                score: 0.95,
            },
            Candidate {
                bbox: [12.0, 12.0, 112.0, 112.0],
                score: 0.9,
            },
            Candidate {
                bbox: [300.0, 300.0, 350.0, 350.0],
                score: 0.8,
            },
        ];

        let kept = nms(&sorted, 0.4);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.95);
        assert_eq!(kept[1].score, 0.8);
    }

    #[test]
    fn test_iou_identity_and_disjoint() {
        let a = [0.0, 0.0, 9.0, 9.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &[100.0, 100.0, 109.0, 109.0]), 0.0);
    }
}
