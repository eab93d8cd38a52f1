//! Face landmark types and the extractor seam.
//!
//! Landmarks are normalized to the processed frame: `(0, 0)` is the top-left
//! corner and `(1, 1)` the bottom-right one.

use crate::{
    constants::{
        LEFT_EYE_LOWER, LEFT_EYE_UPPER, NOSE_TIP, NUM_FACE_MESH_LANDMARKS, RIGHT_EYE_LOWER, RIGHT_EYE_UPPER,
    },
    Error, Result,
};
use opencv::core::Mat;

/// Normalized 2-D facial keypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// Horizontal position, 0 = left edge
    pub x: f64,
    /// Vertical position, 0 = top edge
    pub y: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which eye a reading belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeSide {
    Left,
    Right,
}

impl EyeSide {
    /// Both eyes, left first
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Landmark indices of the (upper, lower) lid
    #[must_use]
    pub const fn lid_indices(self) -> (usize, usize) {
        match self {
            Self::Left => (LEFT_EYE_UPPER, LEFT_EYE_LOWER),
            Self::Right => (RIGHT_EYE_UPPER, RIGHT_EYE_LOWER),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Upper and lower lid of one eye in a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeState {
    pub upper: Landmark,
    pub lower: Landmark,
}

impl EyeState {
    /// Vertical lid separation in normalized units
    #[must_use]
    pub fn distance(&self) -> f64 {
        (self.upper.y - self.lower.y).abs()
    }
}

/// All landmarks of one detected face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    /// Wrap model output, rejecting sets too small to hold the tracked indices
    ///
    /// # Errors
    ///
    /// Returns `ModelValidationError` when fewer than 468 points are supplied.
    pub fn new(points: Vec<Landmark>) -> Result<Self> {
        if points.len() < NUM_FACE_MESH_LANDMARKS {
            return Err(Error::ModelValidationError(format!(
                "Expected at least {NUM_FACE_MESH_LANDMARKS} landmarks, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Nose tip landmark
    #[must_use]
    pub fn nose(&self) -> Option<Landmark> {
        self.get(NOSE_TIP)
    }

    /// Lid landmarks for one eye
    #[must_use]
    pub fn eye(&self, side: EyeSide) -> Option<EyeState> {
        let (upper, lower) = side.lid_indices();
        Some(EyeState {
            upper: self.get(upper)?,
            lower: self.get(lower)?,
        })
    }
}

/// Maps a frame to the landmarks of the first visible face
pub trait LandmarkExtractor {
    /// Returns `Ok(None)` when no face is found; that is not an error.
    fn extract(&mut self, frame: &Mat) -> Result<Option<FaceLandmarks>>;
}
