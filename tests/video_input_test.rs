//! Tests for the camera sampler reading video files

use head_scroll::{
    dispatch::LogDispatcher,
    gesture::SessionConfig,
    sampler::{CameraSampler, LandmarkSampler, VideoSource},
    session::{NoControls, Session},
    Error,
};
use std::{fs, process::Command, time::Instant};

/// Generate a test video without faces using ffmpeg
fn generate_test_video(output_path: &str, duration_seconds: u32, fps: u32) -> Result<(), String> {
    fs::create_dir_all("test_videos").map_err(|e| format!("Failed to create test_videos dir: {e}"))?;

    let output = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={duration_seconds}:size=320x240:rate={fps}"),
            "-vf",
            "format=yuv420p",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            output_path,
        ])
        .output()
        .map_err(|e| format!("Failed to execute ffmpeg: {e}"))?;

    if !output.status.success() {
        return Err(format!("ffmpeg failed: {}", String::from_utf8_lossy(&output.stderr)));
    }

    Ok(())
}

fn open(path: &str) -> head_scroll::Result<CameraSampler> {
    CameraSampler::new(
        VideoSource::File(path.to_string()),
        "assets/face_detector.onnx",
        "assets/face_landmarks.onnx",
        0.5,
        0.4,
        false,
    )
}

#[test]
fn test_missing_video_file() {
    let result = open("test_videos/does_not_exist.mp4");
    assert!(matches!(result, Err(Error::SampleUnavailable(_) | Error::OpenCV(_))));
}

#[test]
#[ignore = "Requires ONNX models and ffmpeg"]
fn test_video_without_faces_runs_to_end() {
    let path = "test_videos/no_faces.mp4";
    generate_test_video(path, 2, 10).expect("Failed to generate test video");

    let mut sampler = open(path).expect("Failed to open video");
    let mut session = Session::new(SessionConfig::default(), LogDispatcher, Instant::now());
    let stats = session.run(&mut sampler, &mut NoControls).expect("Session failed");

    assert!(stats.samples >= 15, "only {} frames read", stats.samples);
    assert_eq!(stats.absent_samples, stats.samples);
    assert_eq!(stats.calibrations, 0);
    assert!(sampler.face().is_none());
    assert!(sampler.next_observation().expect("End of file is not an error").is_none());

    let _ = fs::remove_file(path);
}
