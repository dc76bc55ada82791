//! Summed-area engine: two-pass table build and O(1) region queries

use std::sync::Arc;

use tracing::debug;

use super::rect::{PixelRect, SearchWindow, MAX_DIMENSION};
use super::simd;
use super::table::SumTable;
use crate::error::{Error, Result};
use crate::memory::MemoryAllocator;

/// What a table cell accumulates from each source pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SumKind {
    /// Raw pixel value
    PixelValues,
    /// 1 per non-zero pixel
    NonZeroCount,
}

/// Precomputed summed-area tables over one byte pixel buffer.
///
/// Construction is O(width*height); every query afterwards is O(1)
/// inclusion-exclusion over the value table or the non-zero count table.
/// The source buffer is only read during construction and never stored.
/// Cloning deep-copies both tables; dropping returns them to the pool.
#[derive(Clone)]
pub struct PixelSum {
    rect: PixelRect,
    values: SumTable,
    nonzero: SumTable,
}

impl std::fmt::Debug for PixelSum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelSum").field("rect", &self.rect).finish()
    }
}

impl PixelSum {
    /// Build both tables for a `width x height` buffer of row-major bytes.
    ///
    /// Table storage comes from `allocator`; the two allocations are held
    /// for the engine's lifetime and freed on drop.
    pub fn new(
        buffer: &[u8],
        width: usize,
        height: usize,
        allocator: Arc<MemoryAllocator>,
    ) -> Result<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::DimensionsOutOfRange {
                width,
                height,
                max: MAX_DIMENSION,
            });
        }

        let pixel_count = width * height;
        if buffer.len() < pixel_count {
            return Err(Error::SourceBufferTooSmall {
                expected: pixel_count,
                actual: buffer.len(),
            });
        }

        let rect = PixelRect::from_dimensions(width, height);
        let mut values = SumTable::new(allocator.clone(), pixel_count)?;
        let mut nonzero = SumTable::new(allocator, pixel_count)?;

        compute_table(SumKind::PixelValues, buffer, width, height, values.as_mut_slice());
        compute_table(SumKind::NonZeroCount, buffer, width, height, nonzero.as_mut_slice());

        debug!(
            width,
            height,
            table_bytes = 2 * pixel_count * std::mem::size_of::<u32>(),
            "built summed-area tables"
        );

        Ok(Self {
            rect,
            values,
            nonzero,
        })
    }

    /// Source buffer rectangle (inclusive TLBR)
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Sum of pixel values over the window, clamped into the buffer.
    ///
    /// Degenerate or fully-outside windows return 0.
    pub fn pixel_sum(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> u32 {
        match self.rect.clip_window(x0, y0, x1, y1) {
            Some(window) => self.integrate(&self.values, &window),
            None => 0,
        }
    }

    /// Pixel sum divided by the requested (pre-clamp) window pixel count.
    ///
    /// Returns 0.0 for rejected windows, never NaN.
    pub fn pixel_average(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> f64 {
        match self.rect.clip_window(x0, y0, x1, y1) {
            Some(window) => {
                self.integrate(&self.values, &window) as f64 / window.requested_pixels as f64
            }
            None => 0.0,
        }
    }

    /// Count of non-zero pixels over the window, clamped into the buffer
    pub fn nonzero_count(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> u32 {
        match self.rect.clip_window(x0, y0, x1, y1) {
            Some(window) => self.integrate(&self.nonzero, &window),
            None => 0,
        }
    }

    /// Non-zero count divided by the requested (pre-clamp) window pixel count
    pub fn nonzero_average(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> f64 {
        match self.rect.clip_window(x0, y0, x1, y1) {
            Some(window) => {
                self.integrate(&self.nonzero, &window) as f64 / window.requested_pixels as f64
            }
            None => 0.0,
        }
    }

    /// D - B - C + A over one table; see the module diagram.
    ///
    /// Corner terms on the top or left edge fall outside the table and
    /// contribute 0. Evaluated in u64 because D - B - C alone may dip below
    /// zero before A is added back.
    fn integrate(&self, table: &SumTable, window: &SearchWindow) -> u32 {
        let t = table.as_slice();
        let width = self.rect.width() as usize;

        let d = t[window.y1 * width + window.x1] as u64;
        let c = if window.x0 == 0 {
            0
        } else {
            t[window.y1 * width + window.x0 - 1] as u64
        };
        let b = if window.y0 == 0 {
            0
        } else {
            t[(window.y0 - 1) * width + window.x1] as u64
        };
        let a = if window.x0 == 0 || window.y0 == 0 {
            0
        } else {
            t[(window.y0 - 1) * width + window.x0 - 1] as u64
        };

        ((d + a) - (b + c)) as u32
    }
}

/// Horizontal prefix pass then vertical accumulation over one table
fn compute_table(kind: SumKind, buffer: &[u8], width: usize, height: usize, table: &mut [u32]) {
    horizontal_pass(kind, buffer, width, height, table);
    vertical_pass(width, height, table);
}

/// Per row, left to right: cell = contribution(pixel) + left neighbour
fn horizontal_pass(kind: SumKind, buffer: &[u8], width: usize, height: usize, table: &mut [u32]) {
    for row in 0..height {
        let mut running = 0u32;
        for col in 0..width {
            let pixel = buffer[row * width + col];
            let contribution = match kind {
                SumKind::PixelValues => pixel as u32,
                SumKind::NonZeroCount => (pixel != 0) as u32,
            };
            running = running.wrapping_add(contribution);
            table[row * width + col] = running;
        }
    }
}

/// Add each previous row into the current row, skipping the first
fn vertical_pass(width: usize, height: usize, table: &mut [u32]) {
    if width == 0 {
        return;
    }

    for row in 1..height {
        let (prev, current) = table.split_at_mut(row * width);
        let prev_row = &prev[(row - 1) * width..];
        simd::add_rows(&mut current[..width], &prev_row[..width]);
    }
}
