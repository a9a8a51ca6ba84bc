// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Per-device allocator.

One coarse mutex guards the size-class pool and the running statistics.  Allocation retires
completed ranges in the target bucket by reading the fence without waiting, so it never blocks
on the GPU.  [`DeviceAllocator::kick_fences`] is the frame boundary: every range released
before it becomes reusable once the value it signals has been reached.
*/

use crate::device::{CommandQueue, DeviceId, FenceTimeline, MemoryDevice};
use crate::memory::pool::{PageIndex, SizeClassPool, bucket_for};
use crate::memory::resource::{Allocation, GraphicsResource};
use crate::memory::statistics::{AllocatorStatistics, GraphicsMemoryStatistics, PeakTracker};
use crate::memory::{AllocatorConfig, MemoryError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct AllocatorState {
    pool: SizeClassPool,
    /// Value the next commit will signal.  Releases are tagged with it.
    next_fence: u64,
    committed_memory: u64,
    total_memory: u64,
    total_pages: usize,
    peaks: PeakTracker,
}

impl AllocatorState {
    fn current(&self) -> AllocatorStatistics {
        AllocatorStatistics {
            committed_memory: self.committed_memory,
            total_memory: self.total_memory,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug)]
pub(crate) struct AllocatorCore {
    device: Arc<dyn MemoryDevice>,
    fence: Arc<FenceTimeline>,
    config: AllocatorConfig,
    state: Mutex<AllocatorState>,
}

impl AllocatorCore {
    fn lock(&self) -> MutexGuard<'_, AllocatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called by handles.  The range is reusable once the next commit's fence is reached.
    /// `reserved` is what the page gave out; `size` is what the handle exposed.
    pub(crate) fn release(&self, page: PageIndex, offset: u64, size: u64, reserved: u64) {
        let mut state = self.lock();
        let fence_value = state.next_fence;
        match state.pool.arena.get_mut(page) {
            Some(p) => p.release(offset, reserved, fence_value),
            None => {
                //pages with live handles are never dropped
                debug_assert!(false, "release into missing page {:?}", page);
                return;
            }
        }
        state.committed_memory -= size;
        logwise::trace_sync!(
            "released {size} bytes at {offset} on page {page}, fence {fence}",
            size = logwise::privacy::LogIt(size),
            offset = logwise::privacy::LogIt(offset),
            page = logwise::privacy::LogIt(page.raw()),
            fence = logwise::privacy::LogIt(fence_value)
        );
    }
}

/**
Aligns and pads a request to the device's write granularity.

Malformed requests pass through untouched so [`bucket_for`] reports them.
*/
fn widen_to_granularity(size: u64, alignment: u64, granularity: u64) -> (u64, u64) {
    if granularity <= 1 || size == 0 || !alignment.is_power_of_two() {
        return (size, alignment);
    }
    //overflow becomes a request too large for any bucket
    let reserved = size.checked_next_multiple_of(granularity).unwrap_or(u64::MAX);
    (reserved, alignment.max(granularity))
}

/// Snapshot of one page, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub capacity: u64,
    pub cursor: u64,
    pub live_allocations: usize,
    pub live_bytes: u64,
    /// Released ranges still waiting on their fence.
    pub pending_ranges: usize,
    /// Last fence value signaled while the page had work in flight.
    pub last_fence: u64,
    pub oversized: bool,
}

/// What one [`DeviceAllocator::garbage_collect`] call gave back to the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GarbageCollection {
    pub pages_released: usize,
    pub bytes_released: u64,
}

/**
Allocates CPU-writable, GPU-readable ranges for one device.

Cheap to clone; clones share one pool.  Handles keep the pool alive, so dropping the
allocator while handles are outstanding is fine.

```
use pages_and_permutations::memory::{AllocatorConfig, DeviceAllocator};
use pages_and_permutations::software::{SoftwareDevice, SoftwareQueue};
use std::sync::Arc;

let device = Arc::new(SoftwareDevice::new());
let allocator = DeviceAllocator::new(device, AllocatorConfig::default()).unwrap();
let queue = SoftwareQueue::new();

let mut constants = allocator.alloc(64, 256).unwrap();
constants.write(0, &[1, 2, 3, 4]);
assert_eq!(constants.gpu_address() % 256, 0);
drop(constants);

let fence = allocator.kick_fences(&queue);
queue.complete_all();
assert!(allocator.fence().is_complete(fence));
```
*/
#[derive(Debug, Clone)]
pub struct DeviceAllocator {
    core: Arc<AllocatorCore>,
}

impl DeviceAllocator {
    pub fn new(device: Arc<dyn MemoryDevice>, config: AllocatorConfig) -> Result<Self, MemoryError> {
        config.validate()?;
        Ok(DeviceAllocator {
            core: Arc::new(AllocatorCore {
                device,
                fence: Arc::new(FenceTimeline::new()),
                config,
                state: Mutex::new(AllocatorState {
                    pool: SizeClassPool::new(),
                    next_fence: 1,
                    committed_memory: 0,
                    total_memory: 0,
                    total_pages: 0,
                    peaks: PeakTracker::default(),
                }),
            }),
        })
    }

    pub fn device_id(&self) -> DeviceId {
        self.core.device.id()
    }

    pub fn device(&self) -> &Arc<dyn MemoryDevice> {
        &self.core.device
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.core.config
    }

    /// The timeline this allocator signals on commit.
    pub fn fence(&self) -> &Arc<FenceTimeline> {
        &self.core.fence
    }

    /**
    Allocates `size` bytes whose GPU address is a multiple of `alignment`.

    Fails without allocating anything when the request is malformed, exceeds the largest
    bucket, or the device refuses a new page.
    */
    pub fn alloc(&self, size: u64, alignment: u64) -> Result<GraphicsResource, MemoryError> {
        let config = &self.core.config;
        let (reserved, alignment) =
            widen_to_granularity(size, alignment, self.core.device.write_granularity());
        let choice = match bucket_for(reserved, alignment, config) {
            Ok(choice) => choice,
            Err(e) => {
                logwise::warn_sync!(
                    "{label}: refusing allocation of {size} bytes aligned to {alignment}: {e}",
                    label = logwise::privacy::LogIt(&config.label),
                    size = logwise::privacy::LogIt(size),
                    alignment = logwise::privacy::LogIt(alignment),
                    e = logwise::privacy::LogIt(&e)
                );
                return Err(e);
            }
        };
        let completed = self.core.fence.completed_value();
        let mut state = self.core.lock();
        state.pool.retire_bucket(choice.index, completed);
        let placed = match state.pool.place(
            &choice,
            reserved,
            alignment,
            self.core.device.as_ref(),
            &config.label,
        ) {
            Ok(placed) => placed,
            Err(e) => {
                logwise::warn_sync!(
                    "{label}: device refused a page for {size} bytes: {e}",
                    label = logwise::privacy::LogIt(&config.label),
                    size = logwise::privacy::LogIt(size),
                    e = logwise::privacy::LogIt(&e)
                );
                return Err(e);
            }
        };
        let page = state
            .pool
            .arena
            .get(placed.page)
            .expect("placement refers to a live page");
        let block = page.block().clone();
        let capacity = page.capacity();
        if placed.created_page {
            state.total_memory += capacity;
            state.total_pages += 1;
        }
        state.committed_memory += size;
        let current = state.current();
        state.peaks.observe(&current);
        drop(state);

        logwise::trace_sync!(
            "allocated {size} bytes at {offset} on page {page}",
            size = logwise::privacy::LogIt(size),
            offset = logwise::privacy::LogIt(placed.offset),
            page = logwise::privacy::LogIt(placed.page.raw())
        );
        Ok(GraphicsResource::new(Allocation {
            core: self.core.clone(),
            block,
            page: placed.page,
            offset: placed.offset,
            size,
            reserved,
        }))
    }

    /**
    Frame boundary.

    Retires whatever the GPU has finished with, then asks `queue` to signal the next fence
    value and records it on every page allocated from or released into since the last commit.
    Returns the signaled value.
    */
    pub fn kick_fences(&self, queue: &dyn CommandQueue) -> u64 {
        let completed = self.core.fence.completed_value();
        let mut state = self.core.lock();
        let value = state.next_fence;
        for page in state.pool.arena.iter_mut() {
            page.retire_pending(completed);
            if page.is_touched() {
                page.fence_committed(value);
            }
        }
        //signal under the lock so no release can be tagged with a value already in flight
        queue.signal(&self.core.fence, value);
        state.next_fence += 1;
        value
    }

    /**
    Drops pages nothing references, keeping up to
    [`AllocatorConfig::retained_pages_per_bucket`] of them per bucket for reuse.

    Never waits on the GPU: pages whose released ranges are still in flight survive until a
    later call.
    */
    pub fn garbage_collect(&self) -> GarbageCollection {
        let _perf = logwise::perfwarn_begin!("DeviceAllocator::garbage_collect");
        let completed = self.core.fence.completed_value();
        let mut state = self.core.lock();
        for page in state.pool.arena.iter_mut() {
            page.retire_pending(completed);
        }
        let dropped = state
            .pool
            .shrink(self.core.config.retained_pages_per_bucket);
        let collection = GarbageCollection {
            pages_released: dropped.len(),
            bytes_released: dropped.iter().sum(),
        };
        state.total_pages -= collection.pages_released;
        state.total_memory -= collection.bytes_released;
        drop(state);
        if collection.pages_released > 0 {
            logwise::info_sync!(
                "{label}: released {pages} pages ({bytes} bytes)",
                label = logwise::privacy::LogIt(&self.core.config.label),
                pages = logwise::privacy::LogIt(collection.pages_released),
                bytes = logwise::privacy::LogIt(collection.bytes_released)
            );
        }
        collection
    }

    pub fn statistics(&self) -> AllocatorStatistics {
        self.core.lock().current()
    }

    /// Current numbers and the peaks seen since creation or the last [`Self::reset_peaks`].
    ///
    /// Every allocation folds into the peaks, and so does this call.
    pub fn statistics_with_peaks(&self) -> GraphicsMemoryStatistics {
        let mut state = self.core.lock();
        let current = state.current();
        state.peaks.observe(&current);
        state.peaks.report(&current)
    }

    /// Sets every peak to the current value.
    pub fn reset_peaks(&self) {
        let mut state = self.core.lock();
        let current = state.current();
        state.peaks.reset_to(&current);
    }

    /// `None` once the page has been garbage collected.
    pub fn page_info(&self, page: PageIndex) -> Option<PageInfo> {
        let state = self.core.lock();
        state.pool.arena.get(page).map(|p| PageInfo {
            capacity: p.capacity(),
            cursor: p.cursor(),
            live_allocations: p.live_allocations(),
            live_bytes: p.live_bytes(),
            pending_ranges: p.pending().len(),
            last_fence: p.last_fence(),
            oversized: p.is_oversized(),
        })
    }

    /// Number of pages currently in bucket `index`.
    pub fn bucket_page_count(&self, index: u32) -> usize {
        let state = self.core.lock();
        state.pool.bucket(index).map_or(0, |b| b.pages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::{SoftwareDevice, SoftwareQueue};

    fn allocator() -> DeviceAllocator {
        DeviceAllocator::new(Arc::new(SoftwareDevice::new()), AllocatorConfig::default()).unwrap()
    }

    #[test]
    fn release_waits_for_commit_and_fence() {
        let allocator = allocator();
        let queue = SoftwareQueue::new();
        let a = allocator.alloc(1024, 16).unwrap();
        let page = a.page_index();
        let first_offset = a.offset();
        drop(a);
        //not committed yet: fence value 1 was never signaled
        let b = allocator.alloc(1024, 16).unwrap();
        assert_ne!(b.offset(), first_offset);
        drop(b);

        let value = allocator.kick_fences(&queue);
        assert_eq!(value, 1);
        //signaled but not completed
        let c = allocator.alloc(1024, 16).unwrap();
        assert!(c.offset() > first_offset);
        drop(c);
        allocator.kick_fences(&queue);
        queue.complete_all();

        let d = allocator.alloc(1024, 16).unwrap();
        assert_eq!(d.page_index(), page);
        assert_eq!(d.offset(), first_offset);
    }

    #[test]
    fn statistics_track_handles_and_pages() {
        let allocator = allocator();
        let a = allocator.alloc(100, 16).unwrap();
        let b = allocator.alloc(200, 16).unwrap();
        let stats = allocator.statistics();
        assert_eq!(stats.committed_memory, 300);
        assert_eq!(stats.total_pages, 1);
        assert_eq!(stats.total_memory, 64 * 1024);
        drop(a);
        assert_eq!(allocator.statistics().committed_memory, 200);
        drop(b);
        assert_eq!(allocator.statistics().committed_memory, 0);
    }

    #[test]
    fn peaks_cover_every_allocation() {
        let allocator = allocator();
        drop(allocator.alloc(1000, 16).unwrap());
        drop(allocator.alloc(300, 16).unwrap());
        let stats = allocator.statistics_with_peaks();
        assert_eq!(stats.committed_memory, 0);
        assert_eq!(stats.peak_committed_memory, 1000);
        assert_eq!(stats.peak_total_pages, 1);

        allocator.reset_peaks();
        assert_eq!(allocator.statistics_with_peaks().peak_committed_memory, 0);
    }

    #[test]
    fn commit_records_fence_on_touched_pages() {
        let allocator = allocator();
        let queue = SoftwareQueue::new();
        let a = allocator.alloc(16, 16).unwrap();
        let page = a.page_index();
        let value = allocator.kick_fences(&queue);
        assert_eq!(allocator.page_info(page).unwrap().last_fence, value);
        //untouched pages keep their old fence
        let next = allocator.kick_fences(&queue);
        assert_eq!(next, value + 1);
        assert_eq!(allocator.page_info(page).unwrap().last_fence, value);
        drop(a);
    }

    #[test]
    fn garbage_collect_keeps_retained_page() {
        let allocator = allocator();
        let queue = SoftwareQueue::new();
        let handles: Vec<_> = (0..3)
            .map(|_| allocator.alloc(40 * 1024, 16).unwrap())
            .collect();
        assert_eq!(allocator.statistics().total_pages, 3);
        drop(handles);
        //still in flight
        assert_eq!(allocator.garbage_collect().pages_released, 0);
        allocator.kick_fences(&queue);
        queue.complete_all();
        let collected = allocator.garbage_collect();
        assert_eq!(collected.pages_released, 2);
        assert_eq!(collected.bytes_released, 2 * 64 * 1024);
        assert_eq!(allocator.statistics().total_pages, 1);
    }

    #[test]
    fn coarse_write_granularity_keeps_handles_disjoint() {
        let device = SoftwareDevice::new().with_write_granularity(4);
        let allocator = DeviceAllocator::new(Arc::new(device), AllocatorConfig::default()).unwrap();
        let queue = SoftwareQueue::new();
        let a = allocator.alloc(3, 1).unwrap();
        let b = allocator.alloc(3, 1).unwrap();
        assert_eq!(a.size(), 3);
        assert_eq!(a.offset() % 4, 0);
        assert_eq!(b.offset() % 4, 0);
        assert!(b.offset() >= a.offset() + 4);
        assert_eq!(allocator.statistics().committed_memory, 6);
        let page = a.page_index();
        assert_eq!(allocator.page_info(page).unwrap().live_bytes, 8);

        //malformed alignment is still refused, not widened
        assert!(matches!(
            allocator.alloc(3, 3),
            Err(MemoryError::InvalidAlignment { alignment: 3 })
        ));

        drop(a);
        drop(b);
        assert_eq!(allocator.page_info(page).unwrap().live_bytes, 0);
        allocator.kick_fences(&queue);
        queue.complete_all();
        assert_eq!(allocator.alloc(3, 1).unwrap().offset(), 0);
    }
}
