//! Inclusive TLBR rectangle and search window clipping

use serde::{Deserialize, Serialize};

/// Largest supported image edge, in pixels
pub const MAX_DIMENSION: usize = 4096;

/// Top/left/bottom/right rectangle with inclusive bounds.
///
/// A `width x height` pixel buffer maps to top=0, left=0, bottom=height-1,
/// right=width-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl PixelRect {
    pub fn from_dimensions(width: usize, height: usize) -> Self {
        Self {
            top: 0,
            left: 0,
            bottom: height as i32 - 1,
            right: width as i32 - 1,
        }
    }

    pub fn width(&self) -> i32 {
        self.right + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom + 1
    }

    /// Validate a search window against this rectangle and clip it.
    ///
    /// Returns `None` for windows that miss the buffer entirely (or when the
    /// rectangle itself is empty). Otherwise the corners are swapped into
    /// order, the requested pixel count is taken BEFORE clamping, and all
    /// four coordinates are clamped into bounds. Averages divide by the
    /// requested count, not the clamped one: a window hanging off the edge
    /// stays weighted by the size the caller asked for.
    pub fn clip_window(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<SearchWindow> {
        if self.width() == 0 || self.height() == 0 {
            return None;
        }
        if x1 < 0 || x0 > self.right || y1 < 0 || y0 > self.bottom {
            return None;
        }

        let (x0, x1) = if x1 < x0 { (x1, x0) } else { (x0, x1) };
        let (y0, y1) = if y1 < y0 { (y1, y0) } else { (y0, y1) };

        // Requested window size, taken before the clamp
        let span_x = (x1 as i64 - x0 as i64 + 1) as u64;
        let span_y = (y1 as i64 - y0 as i64 + 1) as u64;
        let requested_pixels = span_x.saturating_mul(span_y);

        Some(SearchWindow {
            x0: x0.clamp(0, self.right) as usize,
            y0: y0.clamp(0, self.bottom) as usize,
            x1: x1.clamp(0, self.right) as usize,
            y1: y1.clamp(0, self.bottom) as usize,
            requested_pixels,
        })
    }
}

/// An ordered, in-bounds search window plus its pre-clamp pixel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
    /// Pixel count of the window as requested, before clamping
    pub requested_pixels: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let rect = PixelRect::from_dimensions(4, 3);
        assert_eq!(rect.right, 3);
        assert_eq!(rect.bottom, 2);
        assert_eq!(rect.width(), 4);
        assert_eq!(rect.height(), 3);
    }

    #[test]
    fn test_window_inside_passes_through() {
        let rect = PixelRect::from_dimensions(4, 4);
        let win = rect.clip_window(1, 1, 2, 3).unwrap();
        assert_eq!((win.x0, win.y0, win.x1, win.y1), (1, 1, 2, 3));
        assert_eq!(win.requested_pixels, 8);
    }

    #[test]
    fn test_window_fully_outside_rejected() {
        let rect = PixelRect::from_dimensions(4, 4);
        assert!(rect.clip_window(-5, 0, -1, 3).is_none()); // x1 < 0
        assert!(rect.clip_window(4, 0, 9, 3).is_none()); // x0 > right
        assert!(rect.clip_window(0, -9, 3, -1).is_none()); // y1 < 0
        assert!(rect.clip_window(0, 4, 3, 9).is_none()); // y0 > bottom
    }

    #[test]
    fn test_empty_rect_rejects_everything() {
        let rect = PixelRect::from_dimensions(0, 0);
        assert!(rect.clip_window(0, 0, 0, 0).is_none());
    }

    #[test]
    fn test_reversed_corners_are_swapped() {
        let rect = PixelRect::from_dimensions(4, 4);
        let win = rect.clip_window(3, 2, 1, 0).unwrap();
        assert_eq!((win.x0, win.y0, win.x1, win.y1), (1, 0, 3, 2));
        assert_eq!(win.requested_pixels, 9);
    }

    #[test]
    fn test_partial_window_clamps_but_keeps_requested_count() {
        let rect = PixelRect::from_dimensions(4, 4);
        let win = rect.clip_window(-2, -2, 0, 0).unwrap();
        assert_eq!((win.x0, win.y0, win.x1, win.y1), (0, 0, 0, 0));
        assert_eq!(win.requested_pixels, 9);
    }

    #[test]
    fn test_one_pixel_tall_buffer_accepts_windows() {
        let rect = PixelRect::from_dimensions(5, 1);
        let win = rect.clip_window(0, 0, 4, 0).unwrap();
        assert_eq!(win.requested_pixels, 5);
    }
}
