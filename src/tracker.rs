//! Per-frame decision logic: landmarks in, pointer actions out.

use crate::{
    blink::{BlinkClicker, MouseButton},
    cursor_mapper::{map_to_screen, CursorTarget, ScreenSize},
    landmarks::{EyeSide, FaceLandmarks},
};

/// What one frame asks the pointer sink to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameActions {
    /// Absolute cursor target, `None` when the previous position should hold
    pub cursor: Option<CursorTarget>,
    /// Clicks to issue, left eye first
    pub clicks: Vec<MouseButton>,
}

impl FrameActions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor.is_none() && self.clicks.is_empty()
    }
}

/// Owns the per-eye cooldowns across frames
#[derive(Debug, Clone)]
pub struct FrameTracker {
    screen: ScreenSize,
    clicker: BlinkClicker,
}

impl FrameTracker {
    #[must_use]
    pub fn new(screen: ScreenSize, blink_threshold: f64, cooldown_frames: u32) -> Self {
        Self {
            screen,
            clicker: BlinkClicker::new(blink_threshold, cooldown_frames),
        }
    }

    /// Process one frame.
    ///
    /// Frames without a face produce no actions and leave the cooldowns
    /// untouched.
    pub fn process(&mut self, face: Option<&FaceLandmarks>) -> FrameActions {
        let Some(face) = face else {
            return FrameActions::default();
        };

        let cursor = face.nose().map(|nose| map_to_screen(nose, self.screen));

        let clicks = EyeSide::ALL
            .into_iter()
            .filter_map(|side| {
                let eye = face.eye(side)?;
                self.clicker.update(side, eye.distance())
            })
            .collect();

        FrameActions { cursor, clicks }
    }

    #[must_use]
    pub const fn screen(&self) -> ScreenSize {
        self.screen
    }

    #[must_use]
    pub const fn clicker(&self) -> &BlinkClicker {
        &self.clicker
    }
}
