//! Webcam gaze mouse and metro booking flow.
//!
//! The gaze mouse follows the nose tip with the pointer and turns eye blinks
//! into clicks:
//! - ONNX Runtime for the face detector and the 468-point face mesh
//! - `OpenCV` for capture, image preparation and the preview window
//! - X11 (`warp_pointer` + XTEST) for pointer output
//!
//! The per-frame pipeline is:
//! 1. Face detection to locate the most confident face
//! 2. Face mesh inference on a square crop around it
//! 3. Nose tip to screen mapping and per-eye blink debouncing
//! 4. Pointer moves and clicks through a [`cursor_control::PointerSink`]
//!
//! The [`booking`] module is a separate terminal booking flow for metro
//! tickets with an optional cab, ending in a QR-coded ticket.
//!
//! # Examples
//!
//! ## Frame logic without a camera
//!
//! ```
//! use blink_mouse::{
//!     cursor_mapper::ScreenSize,
//!     tracker::FrameTracker,
//! };
//!
//! let mut tracker = FrameTracker::new(ScreenSize::new(1920, 1080), 0.004, 10);
//!
//! // No face in this frame: nothing happens and the cooldowns do not tick
//! let actions = tracker.process(None);
//! assert!(actions.is_empty());
//! ```
//!
//! ## Complete pipeline
//!
//! ```no_run
//! use blink_mouse::{
//!     app::{AppConfig, GazeMouseApp, GuiMode},
//!     cursor_control::CursorController,
//!     face_detection::FaceDetector,
//!     face_mesh::{FaceMesh, FaceMeshExtractor},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = FaceDetector::new("assets/face_detector.onnx", 0.5, 0.4)?;
//! let mesh = FaceMesh::new("assets/face_mesh.onnx")?;
//! let extractor = FaceMeshExtractor::new(detector, mesh);
//!
//! let config = AppConfig {
//!     camera_index: 0,
//!     mirror: true,
//!     gui_mode: GuiMode::Preview,
//!     blink_threshold: 0.004,
//!     blink_cooldown_frames: 10,
//! };
//! let mut app = GazeMouseApp::new(config, Box::new(extractor), Box::new(CursorController::new()?))?;
//! app.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Booking a ticket
//!
//! ```
//! use blink_mouse::booking::{BookingForm, BookingProfile, BookingSession, TicketView, Variant};
//!
//! # fn main() -> blink_mouse::Result<()> {
//! let mut session = BookingSession::new(BookingProfile::preset(Variant::Classic));
//! let total = session
//!     .submit(BookingForm {
//!         name: "Asha".to_string(),
//!         origin: "Ameerpet".to_string(),
//!         destination: "Kukatpally".to_string(),
//!         tickets: 2,
//!         cab: false,
//!         drop_off: String::new(),
//!     })?
//!     .total();
//! assert_eq!(total, 90);
//!
//! let booking = session.confirm()?.clone();
//! let ticket = TicketView::new(session.profile(), &booking);
//! println!("{ticket}");
//! # Ok(())
//! # }
//! ```

/// Face detection module for finding faces in images
pub mod face_detection;

/// 468-point face mesh inference
pub mod face_mesh;

/// Landmark types and the extractor trait
pub mod landmarks;

/// Landmark to screen mapping
pub mod cursor_mapper;

/// Per-eye blink debouncing
pub mod blink;

/// Per-frame pointer decisions
pub mod tracker;

/// Utility functions for image geometry and numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Cursor control module for X11 systems
pub mod cursor_control;

/// Metro ticket booking flow
pub mod booking;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

/// Command line flags for the gaze mouse
pub mod cli;

pub use error::{Error, Result};
