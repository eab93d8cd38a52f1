//! Cursor control module for X11-based systems.
//!
//! Moves the pointer with `warp_pointer` and synthesizes button clicks through
//! the XTEST extension.

use crate::{
    blink::MouseButton,
    cursor_mapper::{CursorTarget, ScreenSize},
    error::{Error, Result},
    tracker::FrameActions,
    utils::f64_to_i16_clamp,
};
use log::{debug, info};
use x11rb::{
    connection::{Connection, RequestConnection},
    protocol::{
        xproto::{ConnectionExt as _, Screen, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT},
        xtest::{self, ConnectionExt as _},
    },
    rust_connection::RustConnection,
    CURRENT_TIME, NONE,
};

/// Receives the pointer actions decided for each frame
pub trait PointerSink {
    /// Screen the sink addresses
    fn screen_size(&self) -> ScreenSize;

    /// Move to an absolute position
    fn move_to(&mut self, target: CursorTarget) -> Result<()>;

    /// Press and release a button at the current position
    fn click(&mut self, button: MouseButton) -> Result<()>;

    /// Apply everything one frame decided, move first
    fn apply(&mut self, actions: &FrameActions) -> Result<()> {
        if let Some(target) = actions.cursor {
            self.move_to(target)?;
        }
        for &button in &actions.clicks {
            self.click(button)?;
        }
        Ok(())
    }
}

/// Cursor control implementation for X11
pub struct CursorController {
    connection: RustConnection,
    screen: Screen,
}

impl CursorController {
    /// Connect to the default display and check for XTEST
    pub fn new() -> Result<Self> {
        info!("Initializing X11 cursor controller");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| Error::CursorControl(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::CursorControl("Failed to get screen".to_string()))?
            .clone();

        let has_xtest = connection
            .extension_information(xtest::X11_EXTENSION_NAME)
            .map_err(|e| Error::CursorControl(format!("Failed to query extensions: {e}")))?
            .is_some();
        if !has_xtest {
            return Err(Error::CursorControl(
                "X server lacks the XTEST extension, clicks are unavailable".to_string(),
            ));
        }

        info!(
            "Connected to X11 display, screen: {}x{}",
            screen.width_in_pixels, screen.height_in_pixels
        );

        Ok(Self { connection, screen })
    }

    /// Get current cursor position
    pub fn position(&self) -> Result<(i16, i16)> {
        let reply = self
            .connection
            .query_pointer(self.screen.root)
            .map_err(|e| Error::CursorControl(format!("Failed to send query pointer: {e}")))?
            .reply()
            .map_err(|e| Error::CursorControl(format!("Failed to query pointer: {e}")))?;

        Ok((reply.root_x, reply.root_y))
    }

    fn fake_button(&self, event: u8, button: MouseButton) -> Result<()> {
        self.connection
            .xtest_fake_input(event, button.x11_detail(), CURRENT_TIME, self.screen.root, 0, 0, 0)
            .map_err(|e| Error::CursorControl(format!("Failed to send fake input: {e}")))?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.connection
            .flush()
            .map_err(|e| Error::CursorControl(format!("Failed to flush connection: {e}")))
    }
}

impl PointerSink for CursorController {
    fn screen_size(&self) -> ScreenSize {
        ScreenSize::new(self.screen.width_in_pixels, self.screen.height_in_pixels)
    }

    fn move_to(&mut self, target: CursorTarget) -> Result<()> {
        let (x, y) = clamp_to_screen(target, self.screen_size());
        debug!("Setting cursor position to ({}, {})", x, y);

        self.connection
            .warp_pointer(NONE, self.screen.root, 0, 0, 0, 0, x, y)
            .map_err(|e| Error::CursorControl(format!("Failed to warp pointer: {e}")))?;

        self.flush()
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        info!("Click {:?}", button);
        self.fake_button(BUTTON_PRESS_EVENT, button)?;
        self.fake_button(BUTTON_RELEASE_EVENT, button)?;
        self.flush()
    }
}

/// Dry-run sink that only logs
#[derive(Debug, Clone)]
pub struct LoggingSink {
    screen: ScreenSize,
}

impl LoggingSink {
    #[must_use]
    pub const fn new(screen: ScreenSize) -> Self {
        Self { screen }
    }
}

impl PointerSink for LoggingSink {
    fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    fn move_to(&mut self, target: CursorTarget) -> Result<()> {
        debug!("[dry-run] move to ({:.1}, {:.1})", target.x, target.y);
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        info!("[dry-run] click {:?}", button);
        Ok(())
    }
}

/// Convert a target to integer pixels inside the physical screen
#[must_use]
pub fn clamp_to_screen(target: CursorTarget, screen: ScreenSize) -> (i16, i16) {
    let max_x = i16::try_from(screen.width.saturating_sub(1)).unwrap_or(i16::MAX);
    let max_y = i16::try_from(screen.height.saturating_sub(1)).unwrap_or(i16::MAX);
    (f64_to_i16_clamp(target.x, 0, max_x), f64_to_i16_clamp(target.y, 0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PointerSink for Recorder {
        fn screen_size(&self) -> ScreenSize {
            ScreenSize::new(100, 100)
        }

        fn move_to(&mut self, target: CursorTarget) -> Result<()> {
            self.calls.push(format!("move {} {}", target.x, target.y));
            Ok(())
        }

        fn click(&mut self, button: MouseButton) -> Result<()> {
            self.calls.push(format!("click {button:?}"));
            Ok(())
        }
    }

    #[test]
    fn test_apply_moves_before_clicking() {
        let mut sink = Recorder::default();
        let actions = FrameActions {
            cursor: Some(CursorTarget { x: 10.0, y: 20.0 }),
            clicks: vec![MouseButton::Left, MouseButton::Right],
        };
        sink.apply(&actions).unwrap();
        assert_eq!(sink.calls, vec!["move 10 20", "click Left", "click Right"]);
    }

    #[test]
    fn test_clamp_to_screen() {
        let screen = ScreenSize::new(1920, 1080);
        assert_eq!(clamp_to_screen(CursorTarget { x: 1920.0, y: 1080.0 }, screen), (1919, 1079));
        assert_eq!(clamp_to_screen(CursorTarget { x: -5.0, y: 540.5 }, screen), (0, 540));
        assert_eq!(clamp_to_screen(CursorTarget { x: f64::NAN, y: 10.0 }, screen), (0, 10));
    }

    #[test]
    fn test_button_numbers() {
        assert_eq!(MouseButton::Left.x11_detail(), 1);
        assert_eq!(MouseButton::Right.x11_detail(), 3);
    }
}
