//! Blink debouncing.
//!
//! Each eye runs a small state machine: while armed, a lid distance below the
//! threshold registers a blink and starts a cooldown of `N` processed frames.
//! The cooldown ticks down once per frame before the threshold check, so a
//! sustained closure produces at most one click per `N`-frame window.

use crate::landmarks::EyeSide;
use log::debug;

/// Mouse button a blink is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Core X11 button number
    #[must_use]
    pub const fn x11_detail(self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 3,
        }
    }
}

impl From<EyeSide> for MouseButton {
    fn from(side: EyeSide) -> Self {
        match side {
            EyeSide::Left => Self::Left,
            EyeSide::Right => Self::Right,
        }
    }
}

/// Debouncer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    /// Ready to register the next blink
    Armed,
    /// Frames left before re-arming
    Cooling(u32),
}

/// Threshold + cooldown debouncer for one eye
#[derive(Debug, Clone)]
pub struct BlinkDebouncer {
    threshold: f64,
    cooldown_frames: u32,
    remaining: u32,
}

impl BlinkDebouncer {
    /// Create an armed debouncer.
    ///
    /// A cooldown of 0 is treated as 1 so that one closed frame never yields
    /// more than one click.
    #[must_use]
    pub fn new(threshold: f64, cooldown_frames: u32) -> Self {
        Self {
            threshold,
            cooldown_frames: cooldown_frames.max(1),
            remaining: 0,
        }
    }

    /// Feed one frame's lid distance; returns `true` when a blink registers
    pub fn update(&mut self, lid_distance: f64) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
        }

        if self.remaining == 0 && lid_distance < self.threshold {
            self.remaining = self.cooldown_frames;
            return true;
        }

        false
    }

    #[must_use]
    pub fn state(&self) -> BlinkState {
        match self.remaining {
            0 => BlinkState::Armed,
            n => BlinkState::Cooling(n),
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub const fn cooldown_frames(&self) -> u32 {
        self.cooldown_frames
    }

    /// Re-arm immediately
    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}

/// Debouncers for both eyes, each bound to its own mouse button
#[derive(Debug, Clone)]
pub struct BlinkClicker {
    left: BlinkDebouncer,
    right: BlinkDebouncer,
}

impl BlinkClicker {
    #[must_use]
    pub fn new(threshold: f64, cooldown_frames: u32) -> Self {
        Self {
            left: BlinkDebouncer::new(threshold, cooldown_frames),
            right: BlinkDebouncer::new(threshold, cooldown_frames),
        }
    }

    /// Update one eye and return the button to click, if any
    pub fn update(&mut self, side: EyeSide, lid_distance: f64) -> Option<MouseButton> {
        let debouncer = self.debouncer_mut(side);
        if debouncer.update(lid_distance) {
            debug!("{} blink registered (distance {lid_distance:.4})", side.as_str());
            Some(side.into())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn debouncer(&self, side: EyeSide) -> &BlinkDebouncer {
        match side {
            EyeSide::Left => &self.left,
            EyeSide::Right => &self.right,
        }
    }

    fn debouncer_mut(&mut self, side: EyeSide) -> &mut BlinkDebouncer {
        match side {
            EyeSide::Left => &mut self.left,
            EyeSide::Right => &mut self.right,
        }
    }
}
