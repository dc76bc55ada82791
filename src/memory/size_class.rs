//! Size class configuration for the virtual memory pool

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A caller-supplied memory need: `instances` concurrent blocks of `size` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRequirement {
    /// Requested block size in bytes (rounded up to the next power of two)
    pub size: usize,
    /// How many blocks of this size must fit concurrently
    pub instances: usize,
}

impl PoolRequirement {
    pub fn new(size: usize, instances: usize) -> Self {
        Self { size, instances }
    }
}

/// Derived configuration for one size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeClassConfig {
    /// Slot size in bytes; always a power of two
    pub slot_size: usize,
    /// Reserved bytes for this class; always a multiple of `slot_size`
    pub capacity: usize,
}

impl SizeClassConfig {
    /// Number of slots the class can hand out before exhaustion
    pub fn slot_count(&self) -> usize {
        self.capacity / self.slot_size
    }
}

/// Round a request up to the slot size that serves it: at least `min_slot`,
/// then the next power of two.
#[inline]
pub fn round_request(size: usize, min_slot: usize) -> usize {
    size.max(min_slot).next_power_of_two()
}

/// Build the ordered size class table from caller requirements.
///
/// Requested sizes are rounded up to the next power of two. Requirements that
/// land on the same slot size are merged by summing their capacities, which
/// keeps the table strictly ascending without losing reserved space.
pub fn build_size_classes(requirements: &[PoolRequirement]) -> Result<Vec<SizeClassConfig>> {
    if requirements.is_empty() {
        return Err(Error::Config("empty pool requirement list".into()));
    }

    let mut capacities: BTreeMap<usize, usize> = BTreeMap::new();
    for req in requirements {
        if req.size == 0 || req.instances == 0 {
            return Err(Error::Config(format!(
                "invalid pool requirement: {} bytes x {} instances",
                req.size, req.instances
            )));
        }

        let slot_size = req.size.next_power_of_two();
        *capacities.entry(slot_size).or_insert(0) += slot_size * req.instances;
    }

    Ok(capacities
        .into_iter()
        .map(|(slot_size, capacity)| SizeClassConfig {
            slot_size,
            capacity,
        })
        .collect())
}
