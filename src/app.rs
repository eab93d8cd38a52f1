//! Gaze mouse application loop.
//!
//! Reads frames from the camera, extracts landmarks, turns them into pointer
//! actions and optionally shows a preview with the tracked points.

use crate::{
    constants::{EXIT_KEY, PREVIEW_WINDOW},
    cursor_control::PointerSink,
    error::{Error, Result},
    landmarks::{EyeSide, FaceLandmarks, Landmark, LandmarkExtractor},
    tracker::{FrameActions, FrameTracker},
    utils::f32_to_i32_clamp,
};
use log::{debug, info, warn};
use opencv::{
    core::{Mat, Point, Scalar},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, LINE_8},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMode {
    /// Preview window with landmark markers
    Preview,
    /// No GUI (headless)
    None,
}

/// Runtime settings of the tracking loop
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera index
    pub camera_index: i32,
    /// Flip frames horizontally before processing
    pub mirror: bool,
    pub gui_mode: GuiMode,
    pub blink_threshold: f64,
    pub blink_cooldown_frames: u32,
}

/// Marker drawn on the preview
struct Marker {
    radius: i32,
    /// BGR
    color: [f64; 3],
}

const NOSE_MARKER: Marker = Marker {
    radius: 4,
    color: [0.0, 255.0, 0.0],
};
const LEFT_EYE_MARKER: Marker = Marker {
    radius: 3,
    color: [0.0, 255.0, 255.0],
};
const RIGHT_EYE_MARKER: Marker = Marker {
    radius: 3,
    color: [255.0, 255.0, 0.0],
};

/// Webcam-driven pointer controller
pub struct GazeMouseApp {
    config: AppConfig,
    capture: VideoCapture,
    extractor: Box<dyn LandmarkExtractor>,
    sink: Box<dyn PointerSink>,
    tracker: FrameTracker,
}

impl GazeMouseApp {
    /// Open the camera and wire the extractor and pointer sink together
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the camera cannot be opened.
    pub fn new(config: AppConfig, extractor: Box<dyn LandmarkExtractor>, sink: Box<dyn PointerSink>) -> Result<Self> {
        info!("Opening camera {}", config.camera_index);
        let mut capture = VideoCapture::new(config.camera_index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::InvalidInput(format!("Cannot open camera {}", config.camera_index)));
        }
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;

        let screen = sink.screen_size();
        info!("Pointer screen {}x{}", screen.width, screen.height);
        let tracker = FrameTracker::new(screen, config.blink_threshold, config.blink_cooldown_frames);

        Ok(Self {
            config,
            capture,
            extractor,
            sink,
            tracker,
        })
    }

    /// Run until ESC is pressed in the preview or the camera stops delivering frames
    ///
    /// # Errors
    ///
    /// Propagates extraction, pointer and display errors.
    pub fn run(&mut self) -> Result<()> {
        let preview = self.config.gui_mode == GuiMode::Preview;
        if preview {
            highgui::named_window(PREVIEW_WINDOW, WINDOW_NORMAL)?;
        }

        info!("Entering main loop");
        let mut frame_count: u64 = 0;
        loop {
            let mut frame = Mat::default();
            if !self.capture.read(&mut frame)? || frame.empty() {
                warn!("Failed to read frame, stopping");
                break;
            }
            frame_count += 1;

            let (face, actions) = self.process_frame(&mut frame)?;
            if !actions.is_empty() {
                debug!("Frame {frame_count}: {actions:?}");
            }

            if preview {
                if let Some(face) = &face {
                    draw_markers(&mut frame, face)?;
                }
                highgui::imshow(PREVIEW_WINDOW, &frame)?;

                if highgui::wait_key(1)? == EXIT_KEY {
                    info!("Exit requested by user");
                    break;
                }
            }
        }

        info!("Processed {frame_count} frames, shutting down");
        Ok(())
    }

    /// Mirror, extract and apply one frame. The frame is left mirrored.
    ///
    /// # Errors
    ///
    /// Propagates extraction and pointer errors.
    pub fn process_frame(&mut self, frame: &mut Mat) -> Result<(Option<FaceLandmarks>, FrameActions)> {
        if self.config.mirror {
            mirror(frame)?;
        }

        let face = self.extractor.extract(frame)?;
        let actions = self.tracker.process(face.as_ref());
        self.sink.apply(&actions)?;
        Ok((face, actions))
    }

    #[must_use]
    pub const fn tracker(&self) -> &FrameTracker {
        &self.tracker
    }
}

impl Drop for GazeMouseApp {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release camera: {e}");
        }
        if self.config.gui_mode == GuiMode::Preview {
            if let Err(e) = highgui::destroy_all_windows() {
                warn!("Failed to close preview windows: {e}");
            }
        }
    }
}

/// Flip a frame horizontally in place
///
/// # Errors
///
/// Propagates `OpenCV` errors.
pub fn mirror(frame: &mut Mat) -> Result<()> {
    let source = frame.try_clone()?;
    opencv::core::flip(&source, frame, 1)?;
    Ok(())
}

/// Draw the nose and both eyelid pairs onto `frame`
///
/// # Errors
///
/// Propagates `OpenCV` drawing errors.
pub fn draw_markers(frame: &mut Mat, face: &FaceLandmarks) -> Result<()> {
    let (cols, rows) = (frame.cols(), frame.rows());

    if let Some(nose) = face.nose() {
        draw_marker(frame, nose, cols, rows, &NOSE_MARKER)?;
    }
    for side in EyeSide::ALL {
        let marker = match side {
            EyeSide::Left => &LEFT_EYE_MARKER,
            EyeSide::Right => &RIGHT_EYE_MARKER,
        };
        if let Some(eye) = face.eye(side) {
            draw_marker(frame, eye.upper, cols, rows, marker)?;
            draw_marker(frame, eye.lower, cols, rows, marker)?;
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)] // normalized coordinates times frame size fit in f32
fn draw_marker(frame: &mut Mat, point: Landmark, cols: i32, rows: i32, marker: &Marker) -> Result<()> {
    let x = f32_to_i32_clamp((point.x * f64::from(cols)) as f32, 0, cols.saturating_sub(1));
    let y = f32_to_i32_clamp((point.y * f64::from(rows)) as f32, 0, rows.saturating_sub(1));
    let [b, g, r] = marker.color;
    imgproc::circle(frame, Point::new(x, y), marker.radius, Scalar::new(b, g, r, 0.0), -1, LINE_8, 0)?;
    Ok(())
}
