//! Tests for command-line argument parsing

use blink_mouse::{
    cli::{GazeArgs, GuiArg},
    config::Config,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

fn parse(args: &[&str]) -> Result<GazeArgs, clap::Error> {
    GazeArgs::try_parse_from(std::iter::once("blink-mouse").chain(args.iter().copied()))
}

#[test]
fn test_command_definition_is_consistent() {
    GazeArgs::command().debug_assert();
}

#[test]
fn test_help_argument() {
    let err = parse(&["--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
}

#[test]
fn test_version_argument() {
    let err = parse(&["--version"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn test_no_arguments_leave_config_untouched() {
    let args = parse(&[]).unwrap();
    assert!(args.cam.is_none());
    assert!(args.gui.is_none());
    assert!(!args.dry_run);

    let mut config = Config::default();
    args.apply_to(&mut config);
    assert_eq!(config, Config::default());
}

#[test]
fn test_overrides_applied() {
    let args = parse(&[
        "--cam",
        "2",
        "-t",
        "0.01",
        "--cooldown",
        "5",
        "--no-mirror",
        "--gui",
        "none",
    ])
    .unwrap();

    let mut config = Config::default();
    args.apply_to(&mut config);
    assert_eq!(config.tracker.camera_index, 2);
    assert_eq!(config.tracker.blink_threshold, 0.01);
    assert_eq!(config.tracker.blink_cooldown_frames, 5);
    assert!(!config.tracker.mirror);
    assert!(!config.tracker.show_preview);
}

#[test]
fn test_gui_preview_turns_window_back_on() {
    let args = parse(&["-g", "preview"]).unwrap();
    assert_eq!(args.gui, Some(GuiArg::Preview));

    let mut config = Config::default();
    config.tracker.show_preview = false;
    args.apply_to(&mut config);
    assert!(config.tracker.show_preview);
}

#[test]
fn test_unknown_gui_mode_rejected() {
    let err = parse(&["--gui", "fullscreen"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_non_numeric_values_rejected() {
    for args in [["--cam", "front"], ["--threshold", "low"], ["--cooldown", "many"]] {
        let err = parse(&args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation, "accepted {args:?}");
    }
}

#[test]
fn test_path_and_switch_flags() {
    let args = parse(&["-C", "gaze.yaml", "--dump-config", "out.yaml", "--dry-run", "-d"]).unwrap();
    assert_eq!(args.config, Some(PathBuf::from("gaze.yaml")));
    assert_eq!(args.dump_config, Some(PathBuf::from("out.yaml")));
    assert!(args.dry_run);
    assert!(args.debug);
}

#[test]
fn test_unknown_flag_rejected() {
    let err = parse(&["--video", "clip.mp4"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}
