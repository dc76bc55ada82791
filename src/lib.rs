// PixelSum - summed-area pixel analytics
// O(1) rectangular region queries over byte pixel buffers, backed by a
// size-classed virtual memory pool

#![warn(rust_2018_idioms)]

pub mod engine;
pub mod memory;

// Re-exports for convenience
pub use engine::{PixelRect, PixelSum};
pub use memory::{MemoryAllocator, PoolRequirement};

/// PixelSum error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Pool configuration error: {0}")]
        Config(String),

        #[error(
            "Allocation of {requested} bytes (rounded to {rounded}) exceeds the largest pool slot size {largest}"
        )]
        SizeTooLarge {
            requested: usize,
            rounded: usize,
            largest: usize,
        },

        #[error("Pool class of {slot_size} byte slots is exhausted ({capacity} byte arena fully in use)")]
        PoolExhausted { slot_size: usize, capacity: usize },

        #[error("Source buffer holds {actual} bytes but {expected} pixels were described")]
        SourceBufferTooSmall { expected: usize, actual: usize },

        #[error("Image dimensions {width}x{height} exceed the supported maximum of {max}")]
        DimensionsOutOfRange {
            width: usize,
            height: usize,
            max: usize,
        },
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
