//! Error types for the blink mouse library.

use crate::booking::{FlowStep, ValidationError};
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// QR code could not be generated for a payload
    #[error("QR code error: {0}")]
    QrCode(#[from] qrcode::types::QrError),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model input configuration error
    #[error("Model input error: {0}")]
    ModelInputError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Model validation error (wrong number of points, etc.)
    #[error("Model validation error: {0}")]
    ModelValidationError(String),

    /// Cursor control operation failed
    #[error("Cursor control error: {0}")]
    CursorControl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Booking form rejected
    #[error("Booking rejected: {0}")]
    Validation(#[from] ValidationError),

    /// Booking flow action not allowed in the current step
    #[error("Cannot {action} while in the {from} step")]
    InvalidTransition {
        /// Step the session was in
        from: FlowStep,
        /// Action that was attempted
        action: &'static str,
    },
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
