//! Command line flags of the `blink-mouse` binary

use crate::config::Config;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Preview window setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GuiArg {
    /// Show the camera frame with landmark markers
    Preview,
    /// No window
    None,
}

/// Webcam gaze mouse: the nose tip moves the pointer, blinks click
#[derive(Parser, Debug)]
#[command(name = "blink-mouse", author, version, about, long_about = None)]
pub struct GazeArgs {
    /// Camera index to use
    #[arg(long, value_name = "INDEX")]
    pub cam: Option<i32>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Lid distance below which an eye counts as closed
    #[arg(short, long, value_name = "VALUE")]
    pub threshold: Option<f64>,

    /// Frames an eye ignores blinks after clicking
    #[arg(long, value_name = "FRAMES")]
    pub cooldown: Option<u32>,

    /// Do not mirror the camera image
    #[arg(long)]
    pub no_mirror: bool,

    /// GUI display mode
    #[arg(short, long, value_enum)]
    pub gui: Option<GuiArg>,

    /// Log pointer actions instead of moving the real pointer
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    pub dump_config: Option<PathBuf>,
}

impl GazeArgs {
    /// Apply flags that were given on top of a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(cam) = self.cam {
            config.tracker.camera_index = cam;
        }
        if let Some(threshold) = self.threshold {
            config.tracker.blink_threshold = threshold;
        }
        if let Some(cooldown) = self.cooldown {
            config.tracker.blink_cooldown_frames = cooldown;
        }
        if self.no_mirror {
            config.tracker.mirror = false;
        }
        if let Some(gui) = self.gui {
            config.tracker.show_preview = gui == GuiArg::Preview;
        }
    }
}
