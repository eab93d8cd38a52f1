//! Webcam gaze mouse: the nose tip moves the pointer, blinks click.

use anyhow::{Context, Result};
use blink_mouse::{
    app::{AppConfig, GazeMouseApp, GuiMode},
    cli::GazeArgs,
    config::Config,
    constants::{DRY_RUN_SCREEN_HEIGHT, DRY_RUN_SCREEN_WIDTH},
    cursor_control::{CursorController, LoggingSink, PointerSink},
    cursor_mapper::ScreenSize,
    face_detection::FaceDetector,
    face_mesh::{FaceMesh, FaceMeshExtractor},
};
use clap::Parser;
use log::{info, warn};

fn load_config(args: &GazeArgs) -> Config {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config file: {e}. Using defaults.");
                    Config::default()
                }
            }
        }
        None => Config::default(),
    };
    args.apply_to(&mut config);
    config
}

fn pointer_sink(dry_run: bool) -> Box<dyn PointerSink> {
    let dry_run_screen = ScreenSize::new(DRY_RUN_SCREEN_WIDTH, DRY_RUN_SCREEN_HEIGHT);
    if dry_run {
        info!("Dry run, pointer actions are only logged");
        return Box::new(LoggingSink::new(dry_run_screen));
    }

    match CursorController::new() {
        Ok(controller) => {
            info!("X11 cursor control initialized");
            Box::new(controller)
        }
        Err(e) => {
            warn!("Failed to initialize cursor control: {e}. Falling back to dry run.");
            Box::new(LoggingSink::new(dry_run_screen))
        }
    }
}

fn main() -> Result<()> {
    let args = GazeArgs::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Nose + Blink Mouse");

    let config = load_config(&args);

    if let Some(path) = &args.dump_config {
        config
            .to_file(path)
            .with_context(|| format!("writing configuration to {}", path.display()))?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    config.validate().context("invalid configuration")?;
    config.check_model_files()?;

    let detector = FaceDetector::new(
        &config.models.face_detector,
        config.models.detection_confidence,
        config.models.nms_threshold,
    )?;
    let mesh = FaceMesh::new(&config.models.face_mesh)?;
    let extractor = FaceMeshExtractor::new(detector, mesh)
        .with_crop_expansion(config.models.crop_expansion)
        .with_presence_threshold(config.models.presence_threshold);

    let app_config = AppConfig {
        camera_index: config.tracker.camera_index,
        mirror: config.tracker.mirror,
        gui_mode: if config.tracker.show_preview {
            GuiMode::Preview
        } else {
            GuiMode::None
        },
        blink_threshold: config.tracker.blink_threshold,
        blink_cooldown_frames: config.tracker.blink_cooldown_frames,
    };

    let mut app = GazeMouseApp::new(app_config, Box::new(extractor), pointer_sink(args.dry_run))?;
    app.run()?;

    Ok(())
}
