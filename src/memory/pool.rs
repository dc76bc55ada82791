//! Virtual memory pool: ordered size-classed pages with O(1) slot reuse

use std::collections::HashMap;
use std::ptr::NonNull;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info};

use super::page::MemoryPage;
use super::size_class::{round_request, SizeClassConfig};
use crate::error::{Error, Result};

/// Fixed set of size-classed arenas plus a slot-size lookup table.
///
/// Built once from an ascending class table; the backing ranges live for the
/// pool's lifetime. Every operation takes a short per-page lock so the pool
/// can sit behind an `Arc`, but it is designed for single-threaded use:
/// callers needing real concurrency must serialize compound alloc/free
/// sequences externally.
pub struct VirtualMemoryPool {
    configs: Vec<SizeClassConfig>,
    pages: Vec<RwLock<MemoryPage>>,
    /// Exact power-of-two request size → index of the smallest class serving it
    class_lookup: HashMap<usize, usize>,
}

impl VirtualMemoryPool {
    /// Reserve the backing range and free stack of every size class.
    ///
    /// Panics on an empty class table; a pool without classes is a
    /// configuration error callers are expected to catch at startup via
    /// [`build_size_classes`](super::size_class::build_size_classes).
    pub fn new(configs: Vec<SizeClassConfig>) -> Self {
        assert!(
            !configs.is_empty(),
            "virtual memory pool requires at least one size class"
        );
        debug_assert!(
            configs.windows(2).all(|pair| pair[0].slot_size < pair[1].slot_size),
            "size class table must be strictly ascending"
        );

        let pages = configs
            .iter()
            .map(|config| RwLock::new(MemoryPage::new(config.slot_size, config.capacity)))
            .collect();

        // Cover every power of two between the smallest and largest slot size
        // so a request landing between two classes resolves to the next one up.
        let mut class_lookup = HashMap::new();
        let largest = configs[configs.len() - 1].slot_size;
        let mut size = configs[0].slot_size;
        while size <= largest {
            if let Some(index) = configs.iter().position(|c| c.slot_size >= size) {
                class_lookup.insert(size, index);
            }
            match size.checked_mul(2) {
                Some(next) => size = next,
                None => break,
            }
        }

        info!(
            classes = configs.len(),
            smallest = configs[0].slot_size,
            largest,
            "initialized virtual memory pool"
        );

        Self {
            configs,
            pages,
            class_lookup,
        }
    }

    fn min_slot_size(&self) -> usize {
        self.configs[0].slot_size
    }

    fn max_slot_size(&self) -> usize {
        self.configs[self.configs.len() - 1].slot_size
    }

    /// Allocate a slot large enough for `size` bytes.
    ///
    /// The request is rounded up to the minimum slot size and then to the
    /// next power of two; the smallest class at or above that size serves it.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        let rounded = round_request(size, self.min_slot_size());
        let largest = self.max_slot_size();

        let Some(&index) = self.class_lookup.get(&rounded) else {
            error!(
                requested = size,
                rounded, largest, "allocation size not covered by any pool class"
            );
            return Err(Error::SizeTooLarge {
                requested: size,
                rounded,
                largest,
            });
        };

        let mut page = self.pages[index].write();
        match page.allocate() {
            Some(ptr) => {
                debug!(
                    requested = size,
                    slot_size = page.slot_size(),
                    class = index,
                    addr = ptr.as_ptr() as usize,
                    "allocated slot"
                );
                Ok(ptr)
            }
            None => {
                error!(
                    slot_size = page.slot_size(),
                    capacity = page.capacity(),
                    "pool class exhausted"
                );
                Err(Error::PoolExhausted {
                    slot_size: page.slot_size(),
                    capacity: page.capacity(),
                })
            }
        }
    }

    /// Return `ptr` to the page whose range contains it.
    ///
    /// Panics if no page claims the address: freeing memory the pool does not
    /// own indicates caller memory corruption and is not recoverable.
    pub fn free(&self, ptr: NonNull<u8>) {
        let addr = ptr.as_ptr() as usize;

        for (index, page) in self.pages.iter().enumerate() {
            let mut page = page.write();
            if page.contains(addr) {
                page.release(addr);
                debug!(addr, class = index, slot_size = page.slot_size(), "freed slot");
                return;
            }
        }

        error!(addr, "pointer does not belong to any pool class");
        panic!("freed pointer {addr:#x} is not owned by the virtual memory pool");
    }

    /// Bytes currently handed out across all classes. Diagnostics only.
    pub fn used_memory(&self) -> usize {
        self.pages.iter().map(|page| page.read().used_bytes()).sum()
    }

    /// Total reserved bytes across all classes. Diagnostics only.
    pub fn total_capacity(&self) -> usize {
        self.configs.iter().map(|config| config.capacity).sum()
    }

    /// Snapshot per-class usage
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats::default();

        for (index, page) in self.pages.iter().enumerate() {
            let page = page.read();
            let class = SizeClassStats {
                index,
                slot_size: page.slot_size(),
                capacity: page.capacity(),
                used_bytes: page.used_bytes(),
                free_slots: page.free_slots(),
            };
            stats.used_bytes += class.used_bytes;
            stats.total_capacity += class.capacity;
            stats.size_classes.push(class);
        }

        stats
    }
}

/// Statistics for the whole pool
#[derive(Debug, Default, Clone, Serialize)]
pub struct PoolStats {
    pub size_classes: Vec<SizeClassStats>,
    pub used_bytes: usize,
    pub total_capacity: usize,
}

/// Statistics for one size class
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SizeClassStats {
    pub index: usize,
    pub slot_size: usize,
    pub capacity: usize,
    pub used_bytes: usize,
    pub free_slots: usize,
}
