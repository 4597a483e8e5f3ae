//! Hands-free video control: scroll, pause and resume with head movement.

use anyhow::{Context, Result};
use clap::Parser;
use head_scroll::{
    app::{AppConfig, HeadScrollApp},
    config::{Config, EXAMPLE_CONFIG},
    sampler::VideoSource,
};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Video file to process instead of a camera
    #[arg(short, long)]
    video: Option<String>,

    /// GUI display mode (cam, none)
    #[arg(short, long)]
    gui: Option<String>,

    /// Action dispatcher (x11, log)
    #[arg(long)]
    dispatcher: Option<String>,

    /// Nose position filter (none, moving_average:N, median:N, exponential:A, kalman)
    #[arg(short, long)]
    filter: Option<String>,

    /// Dead-zone half-width around the baseline, in pixels
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Minimum seconds between scrolls
    #[arg(long)]
    cooldown: Option<f64>,

    /// Seconds without a face before pausing
    #[arg(long)]
    grace: Option<f64>,

    /// Seconds of countdown before the baseline is captured
    #[arg(long)]
    countdown: Option<f64>,

    /// Mirror the camera image horizontally
    #[arg(short, long)]
    mirror: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// Command line values take precedence over the configuration file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(gui) = &self.gui {
            config.display.gui_mode.clone_from(gui);
        }
        if let Some(dispatcher) = &self.dispatcher {
            config.actions.dispatcher.clone_from(dispatcher);
        }
        if let Some(filter) = &self.filter {
            config.filter.position_filter.clone_from(filter);
        }
        if let Some(threshold) = self.threshold {
            config.gesture.movement_threshold = threshold;
        }
        if let Some(cooldown) = self.cooldown {
            config.gesture.cooldown_period = cooldown;
        }
        if let Some(grace) = self.grace {
            config.gesture.absence_grace_period = grace;
        }
        if let Some(countdown) = self.countdown {
            config.gesture.countdown_duration = countdown;
        }
        if self.mirror {
            config.display.mirror = true;
        }
        if self.debug {
            config.display.show_fps = true;
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Head Scroll - hands-free video control");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        Config::from_file(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config file: {e}. Using defaults.");
            Config::default()
        })
    } else {
        Config::default()
    };
    args.apply_overrides(&mut config);

    let video_source = args
        .video
        .clone()
        .map_or(VideoSource::Camera(args.cam), VideoSource::File);

    let app_config = AppConfig::new(video_source, config).context("Invalid configuration")?;

    // Create and run application
    let mut app = HeadScrollApp::new(app_config).context("Failed to start")?;
    let stats = app.run().context("Session ended with an error")?;

    info!(
        "Processed {} samples: {} up, {} down, {} pauses, {} resumes",
        stats.samples, stats.scrolls_up, stats.scrolls_down, stats.pauses, stats.resumes
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["head-scroll"]).unwrap();
        assert_eq!(args.cam, 0);
        assert!(args.video.is_none());

        let mut config = Config::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.gesture.movement_threshold, 13.0);
        assert_eq!(config.display.gui_mode, "cam");
        assert!(!config.display.mirror);
    }

    #[test]
    fn test_help_argument() {
        let err = Args::try_parse_from(["head-scroll", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let args = Args::try_parse_from([
            "head-scroll",
            "--video",
            "clip.mp4",
            "--gui",
            "none",
            "--dispatcher",
            "log",
            "--filter",
            "median:3",
            "--threshold",
            "20",
            "--cooldown",
            "0.5",
            "--grace",
            "2",
            "--countdown",
            "1",
            "--mirror",
        ])
        .unwrap();

        let mut config = Config::from_yaml("gesture:\n  movement_threshold: 8.0\n").unwrap();
        args.apply_overrides(&mut config);

        assert_eq!(args.video.as_deref(), Some("clip.mp4"));
        assert_eq!(config.display.gui_mode, "none");
        assert_eq!(config.actions.dispatcher, "log");
        assert_eq!(config.filter.position_filter, "median:3");
        assert_eq!(config.gesture.movement_threshold, 20.0);
        assert_eq!(config.gesture.cooldown_period, 0.5);
        assert_eq!(config.gesture.absence_grace_period, 2.0);
        assert_eq!(config.gesture.countdown_duration, 1.0);
        assert!(config.display.mirror);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_numeric_argument() {
        assert!(Args::try_parse_from(["head-scroll", "--threshold", "high"]).is_err());
    }
}
