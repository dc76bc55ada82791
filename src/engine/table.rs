//! Pool-backed table buffer with deep-copy clone semantics

use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::Result;
use crate::memory::MemoryAllocator;

/// Owned `u32` buffer living inside the virtual memory pool.
///
/// The engine's summed-area tables use this instead of raw pointers: cloning
/// deep-copies into a fresh pool slot and dropping returns the slot to the
/// pool, so a table can never leak or be freed twice on early-return paths.
pub struct SumTable {
    allocator: Arc<MemoryAllocator>,
    ptr: NonNull<u32>,
    len: usize,
}

impl SumTable {
    /// Allocate a table of `len` entries from the pool. Contents are
    /// unspecified until written.
    pub fn new(allocator: Arc<MemoryAllocator>, len: usize) -> Result<Self> {
        let bytes = len * std::mem::size_of::<u32>();
        let raw = allocator.allocate(bytes)?;
        // Pool pages are 8 byte aligned and u32-sized requests round to
        // multiples of four, so the cast is always aligned
        debug_assert_eq!(raw.as_ptr() as usize % std::mem::align_of::<u32>(), 0);

        Ok(Self {
            allocator,
            ptr: raw.cast(),
            len,
        })
    }

    /// Deep copy that reports pool exhaustion instead of panicking
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::new(self.allocator.clone(), self.len)?;
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        Ok(copy)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u32] {
        // SAFETY: ptr points at a pool slot of at least len entries that
        // stays valid until this table is dropped
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        // SAFETY: as above, plus &mut self guarantees exclusive access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Clone for SumTable {
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("pool exhausted while cloning summed-area table")
    }
}

impl Drop for SumTable {
    fn drop(&mut self) {
        self.allocator.free(self.ptr.cast());
    }
}
