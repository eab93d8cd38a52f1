//! Normalized landmark to screen coordinate mapping.

use crate::landmarks::Landmark;

/// Screen resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u16,
    pub height: u16,
}

impl ScreenSize {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Absolute cursor target in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorTarget {
    pub x: f64,
    pub y: f64,
}

/// Scale a normalized landmark to screen pixels.
///
/// No smoothing and no clamping happen here; the pointer sink owns the
/// physical screen bounds.
#[must_use]
pub fn map_to_screen(landmark: Landmark, screen: ScreenSize) -> CursorTarget {
    CursorTarget {
        x: landmark.x * f64::from(screen.width),
        y: landmark.y * f64::from(screen.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenSize = ScreenSize::new(1920, 1080);

    #[test]
    fn test_corners_and_center() {
        assert_eq!(map_to_screen(Landmark::new(0.0, 0.0), SCREEN), CursorTarget { x: 0.0, y: 0.0 });
        assert_eq!(
            map_to_screen(Landmark::new(1.0, 1.0), SCREEN),
            CursorTarget { x: 1920.0, y: 1080.0 }
        );
        assert_eq!(
            map_to_screen(Landmark::new(0.5, 0.5), SCREEN),
            CursorTarget { x: 960.0, y: 540.0 }
        );
    }

    #[test]
    fn test_out_of_range_passes_through() {
        let target = map_to_screen(Landmark::new(1.1, -0.1), SCREEN);
        assert!(target.x > 1920.0);
        assert!(target.y < 0.0);
    }
}
