//! Memory allocator facade
//!
//! Single allocation/free entry point over the virtual memory pool,
//! independent of request size. Configuration happens once, in the
//! constructor, and the allocator is then passed explicitly (usually as an
//! `Arc<MemoryAllocator>`) to whatever owns pool-backed buffers.

use std::ptr::NonNull;

use tracing::info;

use super::pool::{PoolStats, VirtualMemoryPool};
use super::size_class::{build_size_classes, PoolRequirement};
use crate::error::Result;

/// Facade over the size-classed pool.
///
/// Engine instances share one allocator through an `Arc`; each table they
/// allocate is returned to the pool when the owning buffer drops.
pub struct MemoryAllocator {
    pool: VirtualMemoryPool,
}

impl std::fmt::Debug for MemoryAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAllocator")
            .field("used_memory", &self.used_memory())
            .field("total_capacity", &self.total_capacity())
            .finish()
    }
}

impl MemoryAllocator {
    /// Build the pool from caller requirements.
    ///
    /// One-time configuration: fails on an empty or degenerate requirement
    /// list, reserves every class's backing range up front, and never
    /// rebuilds.
    pub fn new(requirements: &[PoolRequirement]) -> Result<Self> {
        let configs = build_size_classes(requirements)?;
        info!(
            requirements = requirements.len(),
            classes = configs.len(),
            "configuring memory allocator"
        );

        Ok(Self {
            pool: VirtualMemoryPool::new(configs),
        })
    }

    /// Allocate a slot holding at least `size` bytes.
    ///
    /// Fails when the rounded size exceeds the largest configured class or
    /// that class's arena is exhausted; both are fatal for the caller's
    /// operation, there is no backing store to retry into.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        self.pool.allocate(size)
    }

    /// Return a slot to its owning class.
    ///
    /// Panics if the pointer was not handed out by this pool.
    pub fn free(&self, ptr: NonNull<u8>) {
        self.pool.free(ptr)
    }

    /// Bytes currently handed out. Diagnostics only.
    pub fn used_memory(&self) -> usize {
        self.pool.used_memory()
    }

    /// Total reserved capacity. Diagnostics only.
    pub fn total_capacity(&self) -> usize {
        self.pool.total_capacity()
    }

    /// Snapshot per-class usage
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Emit per-class usage ratios and pool totals at info level
    pub fn log_stats(&self) {
        let stats = self.stats();
        let min_capacity = stats
            .size_classes
            .iter()
            .map(|class| class.capacity)
            .min()
            .unwrap_or(1);

        for class in &stats.size_classes {
            let usage_pct = class.used_bytes as f64 / class.capacity as f64 * 100.0;
            let relative_weight = class.capacity as f64 / min_capacity as f64;
            info!(
                class = class.index,
                slot_size = class.slot_size,
                usage_pct,
                relative_weight,
                free_slots = class.free_slots,
                "pool class usage"
            );
        }

        info!(
            used = stats.used_bytes,
            capacity = stats.total_capacity,
            "pool totals"
        );
    }
}
