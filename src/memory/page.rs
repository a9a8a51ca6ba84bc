// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A page is one linear (bump) arena over one backend block.

Ranges are handed out by advancing a single cursor.  Released ranges are not reused
individually: they wait in a pending list until the fence they were tagged with has been
reached, and once nothing is live and nothing is pending the cursor returns to zero and the
whole page is reused.
*/

use crate::bittricks::align_up;
use crate::device::MemoryBlock;
use std::sync::Arc;

/// A released range the GPU may still be reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingRange {
    pub offset: u64,
    pub size: u64,
    /// Must be reached on the allocator's fence before the range is safe to overwrite.
    pub fence_value: u64,
}

/// The page had no room for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageFull;

#[derive(Debug)]
pub(crate) struct Page {
    block: Arc<dyn MemoryBlock>,
    capacity: u64,
    cursor: u64,
    pending: Vec<PendingRange>,
    live_allocations: usize,
    live_bytes: u64,
    /// Last fence value signaled while this page had work in flight.
    last_fence: u64,
    /// Allocated from or released into since the last commit.
    touched: bool,
    /// Sized for one request instead of for its bucket.
    oversized: bool,
}

impl Page {
    pub fn new(block: Arc<dyn MemoryBlock>, oversized: bool) -> Self {
        let capacity = block.size();
        Page {
            block,
            capacity,
            cursor: 0,
            pending: Vec::new(),
            live_allocations: 0,
            live_bytes: 0,
            last_fence: 0,
            touched: false,
            oversized,
        }
    }

    pub fn block(&self) -> &Arc<dyn MemoryBlock> {
        &self.block
    }
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
    pub fn cursor(&self) -> u64 {
        self.cursor
    }
    pub fn live_allocations(&self) -> usize {
        self.live_allocations
    }
    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }
    pub fn pending(&self) -> &[PendingRange] {
        &self.pending
    }
    pub fn last_fence(&self) -> u64 {
        self.last_fence
    }
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Nothing live and nothing waiting on the GPU.
    pub fn is_reclaimable(&self) -> bool {
        self.live_allocations == 0 && self.pending.is_empty()
    }

    /// Offset the next `size`/`alignment` request would land at, if it fits.
    fn fit(&self, size: u64, alignment: u64) -> Option<u64> {
        let base = self.block.gpu_address();
        let aligned = align_up(base.checked_add(self.cursor)?, alignment)?;
        let offset = aligned - base;
        let end = offset.checked_add(size)?;
        (end <= self.capacity).then_some(offset)
    }

    pub fn has_room(&self, size: u64, alignment: u64) -> bool {
        self.fit(size, alignment).is_some()
    }

    /// Bump-allocates `size` bytes whose GPU address is aligned to `alignment`.
    pub fn suballocate(&mut self, size: u64, alignment: u64) -> Result<u64, PageFull> {
        let offset = self.fit(size, alignment).ok_or(PageFull)?;
        self.cursor = offset + size;
        self.live_allocations += 1;
        self.live_bytes += size;
        self.touched = true;
        Ok(offset)
    }

    /// A handle over `offset..offset + size` went away.
    pub fn release(&mut self, offset: u64, size: u64, fence_value: u64) {
        debug_assert!(self.live_allocations > 0, "release on a page with no live allocations");
        debug_assert!(offset + size <= self.cursor, "release outside the allocated region");
        self.live_allocations -= 1;
        self.live_bytes -= size;
        self.touched = true;
        self.pending.push(PendingRange {
            offset,
            size,
            fence_value,
        });
    }

    /**
    Drops pending ranges the GPU is finished with.

    Returns true when this reset the page for reuse.
    */
    pub fn retire_pending(&mut self, completed_fence: u64) -> bool {
        self.pending.retain(|range| range.fence_value > completed_fence);
        if self.is_reclaimable() && self.cursor != 0 {
            self.cursor = 0;
            true
        } else {
            false
        }
    }

    /// Records the fence value signaled at commit for everything written or released so far.
    pub fn fence_committed(&mut self, fence_value: u64) {
        self.last_fence = fence_value;
        self.touched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDevice;
    use crate::software::SoftwareDevice;

    fn page(size: u64) -> Page {
        let device = SoftwareDevice::new();
        Page::new(device.create_upload_block(size, "test").unwrap(), false)
    }

    #[test]
    fn bump_allocates_aligned() {
        let mut page = page(64 * 1024);
        let a = page.suballocate(10, 16).unwrap();
        let b = page.suballocate(10, 16).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 16);
        assert_eq!(page.cursor(), 26);
        assert_eq!(page.live_allocations(), 2);
        assert_eq!(page.live_bytes(), 20);
    }

    #[test]
    fn full_page_refuses() {
        let mut page = page(64 * 1024);
        page.suballocate(64 * 1024, 16).unwrap();
        assert_eq!(page.suballocate(1, 1), Err(PageFull));
        assert!(!page.has_room(1, 1));
    }

    #[test]
    fn reset_waits_for_fence_and_live_handles() {
        let mut page = page(64 * 1024);
        let a = page.suballocate(100, 16).unwrap();
        let b = page.suballocate(100, 16).unwrap();
        page.release(a, 100, 1);
        //b still live
        assert!(!page.retire_pending(1));
        assert_eq!(page.cursor(), 212);
        page.release(b, 100, 2);
        //fence 2 not reached
        assert!(!page.retire_pending(1));
        assert_eq!(page.pending().len(), 1);
        assert!(page.retire_pending(2));
        assert_eq!(page.cursor(), 0);
        assert!(page.is_reclaimable());
    }

    #[test]
    fn commit_clears_touched() {
        let mut page = page(64 * 1024);
        page.suballocate(8, 8).unwrap();
        assert!(page.is_touched());
        page.fence_committed(7);
        assert!(!page.is_touched());
        assert_eq!(page.last_fence(), 7);
    }
}
