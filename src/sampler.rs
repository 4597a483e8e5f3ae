//! Landmark samplers: the boundary that turns frames into nose positions.
//!
//! The gesture engine only needs one vertical coordinate per frame. A
//! sampler reports it together with the acquisition time. Exactly one face
//! is considered per frame: when the detector finds several, the one with
//! the highest score is used.

use crate::{
    constants::FACE_BOX_EXPANSION,
    face_detection::{FaceDetection, FaceDetector},
    gesture::Observation,
    mark_detection::{nose_tip, MarkDetector},
    utils::square_face_box,
    Error, Result,
};
use log::{debug, info};
use opencv::{
    core::{Mat, Point2f, Rect},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::{collections::VecDeque, path::Path, time::Instant};

/// Source of per-frame landmark observations
pub trait LandmarkSampler {
    /// Acquire the next frame and report the tracked landmark.
    ///
    /// Returns `Ok(None)` when the stream ended normally.
    ///
    /// # Errors
    ///
    /// Returns an error if no further frame can be produced.
    fn next_observation(&mut self) -> Result<Option<Observation>>;
}

/// Replays a prepared list of observations
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    observations: VecDeque<Observation>,
}

impl ScriptedSampler {
    /// Create a sampler that yields `observations` in order, then ends
    pub fn new(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            observations: observations.into_iter().collect(),
        }
    }

    /// Observations not yet handed out
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.observations.len()
    }
}

impl LandmarkSampler for ScriptedSampler {
    fn next_observation(&mut self) -> Result<Option<Observation>> {
        Ok(self.observations.pop_front())
    }
}

/// Video source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// Face found in the last frame, in frame coordinates
#[derive(Debug, Clone)]
pub struct TrackedFace {
    /// Detector bounding box
    pub bbox: Rect,
    /// All 68 landmarks
    pub landmarks: Vec<Point2f>,
    /// Nose tip landmark
    pub nose: Point2f,
}

/// Camera or video file sampler backed by the ONNX face and landmark models
pub struct CameraSampler {
    source: VideoSource,
    capture: VideoCapture,
    face_detector: FaceDetector,
    mark_detector: MarkDetector,
    mirror: bool,
    frame: Mat,
    face: Option<TrackedFace>,
}

impl CameraSampler {
    /// Open the video source and load both models
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened or a model fails to load.
    pub fn new(
        source: VideoSource,
        face_model: impl AsRef<Path>,
        landmark_model: impl AsRef<Path>,
        conf_threshold: f32,
        nms_threshold: f32,
        mirror: bool,
    ) -> Result<Self> {
        let capture = match &source {
            VideoSource::Camera(index) => {
                info!("Opening camera {index}");
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                // Reduce buffer size for lower latency (webcam only)
                cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {path}");
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
        };

        if !capture.is_opened()? {
            return Err(Error::SampleUnavailable(format!("cannot open video source {source:?}")));
        }

        Ok(Self {
            source,
            capture,
            face_detector: FaceDetector::new(face_model, conf_threshold, nms_threshold)?,
            mark_detector: MarkDetector::new(landmark_model)?,
            mirror,
            frame: Mat::default(),
            face: None,
        })
    }

    /// Last acquired frame (mirrored if configured)
    #[must_use]
    pub const fn frame(&self) -> &Mat {
        &self.frame
    }

    /// Face tracked in the last frame
    #[must_use]
    pub const fn face(&self) -> Option<&TrackedFace> {
        self.face.as_ref()
    }

    fn read_frame(&mut self) -> Result<bool> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(false);
        }

        if self.mirror {
            opencv::core::flip(&frame, &mut self.frame, 1)?;
        } else {
            self.frame = frame;
        }
        Ok(true)
    }

    fn track_face(&self) -> Result<Option<TrackedFace>> {
        let faces = self.face_detector.detect(&self.frame)?;
        let Some(FaceDetection { bbox, score }) = faces.into_iter().next() else {
            return Ok(None);
        };
        if bbox.width <= 0 || bbox.height <= 0 {
            return Ok(None);
        }
        debug!("Face at {bbox:?} (score {score:.2})");

        let crop = square_face_box(bbox, self.frame.cols(), self.frame.rows(), FACE_BOX_EXPANSION);
        if crop.width <= 0 {
            return Ok(None);
        }
        let face_roi = Mat::roi(&self.frame, crop)?;
        let face_roi_mat = face_roi.try_clone()?;

        #[allow(clippy::cast_precision_loss)]
        let landmarks: Vec<Point2f> = self
            .mark_detector
            .detect(&face_roi_mat)?
            .into_iter()
            .map(|p| Point2f::new(p.x + crop.x as f32, p.y + crop.y as f32))
            .collect();

        Ok(nose_tip(&landmarks).map(|nose| TrackedFace { bbox, landmarks, nose }))
    }
}

impl LandmarkSampler for CameraSampler {
    fn next_observation(&mut self) -> Result<Option<Observation>> {
        if !self.read_frame()? {
            return match self.source {
                VideoSource::File(_) => {
                    info!("End of video file reached");
                    Ok(None)
                }
                VideoSource::Camera(index) => Err(Error::SampleUnavailable(format!(
                    "camera {index} stopped delivering frames"
                ))),
            };
        }
        let timestamp = Instant::now();

        self.face = self.track_face()?;
        Ok(Some(match &self.face {
            Some(face) => Observation::present(f64::from(face.nose.y), timestamp),
            None => Observation::absent(timestamp),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_scripted_sampler_replays_in_order() {
        let start = Instant::now();
        let mut sampler = ScriptedSampler::new([
            Observation::present(100.0, start),
            Observation::absent(start + Duration::from_millis(33)),
        ]);
        assert_eq!(sampler.remaining(), 2);

        assert_eq!(sampler.next_observation().unwrap(), Some(Observation::present(100.0, start)));
        assert_eq!(
            sampler.next_observation().unwrap(),
            Some(Observation::absent(start + Duration::from_millis(33)))
        );
        assert_eq!(sampler.next_observation().unwrap(), None);
    }
}
