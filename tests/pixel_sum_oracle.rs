//! Summed-area engine vs a brute-force reference implementation
//!
//! The oracle walks the clamped window over the raw buffer in O(n); the
//! engine must agree with it for every window over every fill pattern.

use std::sync::Arc;

use pixelsum::{MemoryAllocator, PixelRect, PixelSum, PoolRequirement};

/// Naive O(n) oracle sharing the engine's clipping semantics
struct NaivePixelSum<'a> {
    buffer: &'a [u8],
    rect: PixelRect,
}

impl<'a> NaivePixelSum<'a> {
    fn new(buffer: &'a [u8], width: usize, height: usize) -> Self {
        Self {
            buffer,
            rect: PixelRect::from_dimensions(width, height),
        }
    }

    fn fold(&self, x0: i32, y0: i32, x1: i32, y1: i32, contribution: fn(u8) -> u32) -> u32 {
        let Some(win) = self.rect.clip_window(x0, y0, x1, y1) else {
            return 0;
        };

        let width = self.rect.width() as usize;
        let mut sum = 0u32;
        for row in win.y0..=win.y1 {
            for col in win.x0..=win.x1 {
                sum += contribution(self.buffer[row * width + col]);
            }
        }
        sum
    }

    fn pixel_sum(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> u32 {
        self.fold(x0, y0, x1, y1, |pixel| pixel as u32)
    }

    fn nonzero_count(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> u32 {
        self.fold(x0, y0, x1, y1, |pixel| (pixel != 0) as u32)
    }

    fn pixel_average(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> f64 {
        match self.rect.clip_window(x0, y0, x1, y1) {
            Some(win) => self.pixel_sum(x0, y0, x1, y1) as f64 / win.requested_pixels as f64,
            None => 0.0,
        }
    }
}

fn shared_allocator() -> Arc<MemoryAllocator> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pixelsum=debug")
        .try_init();

    // Room for the largest test image's two u32 tables plus copies
    Arc::new(
        MemoryAllocator::new(&[
            PoolRequirement::new(64, 32),
            PoolRequirement::new(16 * 16 * 4, 64),
        ])
        .unwrap(),
    )
}

fn fill_constant(len: usize, value: u8) -> Vec<u8> {
    vec![value; len]
}

fn fill_alternating(len: usize, value: u8) -> Vec<u8> {
    (0..len).map(|i| if i % 2 == 1 { value } else { 0 }).collect()
}

fn fill_increasing(len: usize, start: usize) -> Vec<u8> {
    (0..len).map(|i| ((start + i) % 255) as u8).collect()
}

/// Every window in a band around the buffer, engine vs oracle
fn check_all_windows(buffer: &[u8], width: usize, height: usize) {
    let allocator = shared_allocator();
    let engine = PixelSum::new(buffer, width, height, allocator).unwrap();
    let oracle = NaivePixelSum::new(buffer, width, height);

    let xs: Vec<i32> = (-2..=(width as i32 + 2)).collect();
    let ys: Vec<i32> = (-2..=(height as i32 + 2)).collect();

    for &y0 in &ys {
        for &y1 in &ys {
            for &x0 in &xs {
                for &x1 in &xs {
                    assert_eq!(
                        engine.pixel_sum(x0, y0, x1, y1),
                        oracle.pixel_sum(x0, y0, x1, y1),
                        "pixel_sum mismatch at ({x0},{y0})-({x1},{y1}) for {width}x{height}"
                    );
                    assert_eq!(
                        engine.nonzero_count(x0, y0, x1, y1),
                        oracle.nonzero_count(x0, y0, x1, y1),
                        "nonzero_count mismatch at ({x0},{y0})-({x1},{y1})"
                    );

                    let engine_avg = engine.pixel_average(x0, y0, x1, y1);
                    let oracle_avg = oracle.pixel_average(x0, y0, x1, y1);
                    assert!(
                        (engine_avg - oracle_avg).abs() < 1e-9,
                        "pixel_average mismatch at ({x0},{y0})-({x1},{y1}): {engine_avg} vs {oracle_avg}"
                    );
                }
            }
        }
    }
}

#[test]
fn all_zero_buffer_matches_oracle() {
    check_all_windows(&fill_constant(16, 0), 4, 4);
}

#[test]
fn constant_buffer_matches_oracle() {
    check_all_windows(&fill_constant(35, 173), 7, 5);
}

#[test]
fn alternating_buffer_matches_oracle() {
    check_all_windows(&fill_alternating(35, 9), 7, 5);
}

#[test]
fn increasing_buffer_matches_oracle() {
    check_all_windows(&fill_increasing(35, 250), 7, 5);
}

#[test]
fn single_pixel_buffer_matches_oracle() {
    check_all_windows(&fill_constant(1, 42), 1, 1);
}

#[test]
fn single_row_and_column_buffers_match_oracle() {
    check_all_windows(&fill_increasing(6, 3), 6, 1);
    check_all_windows(&fill_increasing(6, 3), 1, 6);
}

#[test]
fn worked_example_from_constant_ones() {
    let allocator = shared_allocator();
    let engine = PixelSum::new(&fill_constant(16, 1), 4, 4, allocator).unwrap();

    assert_eq!(engine.pixel_sum(0, 0, 3, 3), 16);
    assert_eq!(engine.pixel_average(0, 0, 3, 3), 1.0);

    // Window hangs off the top-left corner: the sum clamps to the one
    // in-bounds pixel, the average denominator stays the requested 3x3
    assert_eq!(engine.pixel_sum(-2, -2, 0, 0), 1);
    assert!((engine.pixel_average(-2, -2, 0, 0) - 1.0 / 9.0).abs() < 1e-12);
}

#[test]
fn fully_outside_windows_return_zero() {
    let allocator = shared_allocator();
    let engine = PixelSum::new(&fill_constant(16, 5), 4, 4, allocator).unwrap();

    for (x0, y0, x1, y1) in [
        (-9, 0, -1, 3),
        (4, 0, 9, 3),
        (0, -9, 3, -1),
        (0, 4, 3, 9),
        (-3, -3, -1, -1),
    ] {
        assert_eq!(engine.pixel_sum(x0, y0, x1, y1), 0);
        assert_eq!(engine.nonzero_count(x0, y0, x1, y1), 0);
        assert_eq!(engine.pixel_average(x0, y0, x1, y1), 0.0);
        assert_eq!(engine.nonzero_average(x0, y0, x1, y1), 0.0);
    }
}

#[test]
fn clone_survives_source_drop() {
    let allocator = shared_allocator();
    let buffer = fill_increasing(35, 0);
    let engine = PixelSum::new(&buffer, 7, 5, allocator.clone()).unwrap();

    let before: Vec<u32> = (0..5)
        .map(|i| engine.pixel_sum(0, 0, i, i))
        .collect();

    let copy = engine.clone();
    drop(engine);

    // Freed table slots go back on the pool's free stack; a fresh engine
    // reuses them, which must not disturb the clone
    let churn = PixelSum::new(&fill_constant(35, 255), 7, 5, allocator).unwrap();
    let _ = churn.pixel_sum(0, 0, 6, 4);

    let after: Vec<u32> = (0..5).map(|i| copy.pixel_sum(0, 0, i, i)).collect();
    assert_eq!(before, after);
}

#[test]
fn engines_return_tables_to_the_pool() {
    let allocator = shared_allocator();
    let baseline = allocator.used_memory();

    for _ in 0..100 {
        let engine = PixelSum::new(&fill_alternating(16, 3), 4, 4, allocator.clone()).unwrap();
        assert_eq!(engine.nonzero_count(0, 0, 3, 3), 8);
    }

    assert_eq!(allocator.used_memory(), baseline);
}
