// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Linear upload-memory allocation.

Small, short-lived GPU data (constants, dynamic vertices, per-draw parameters) is
bump-allocated out of large CPU-writable pages.  The layering is:

* a page is a bump arena over one backend block,
* pages of one size class form a bucket, `next_pow2(size + alignment)` picks the bucket,
* a [`DeviceAllocator`] owns every bucket for one device behind one mutex,
* [`GraphicsMemory`] is the registered, per-device facade with peak statistics.

Handles ([`GraphicsResource`], [`SharedGraphicsResource`]) release their range on drop.  A
released range is only reused after the fence signaled by the following
[`GraphicsMemory::commit`] has been reached, so the GPU never reads memory that was
overwritten under it.
*/

mod allocator;
mod config;
mod error;
mod graphics_memory;
mod page;
mod pool;
mod registry;
mod resource;
mod statistics;

pub use allocator::{DeviceAllocator, GarbageCollection, PageInfo};
pub use config::{
    AllocatorConfig, CONSTANT_BUFFER_ALIGNMENT, DEFAULT_ALIGNMENT, MAX_ALLOC_SIZE, MIN_ALLOC_SIZE,
    MIN_PAGE_SIZE,
};
pub use error::MemoryError;
pub use graphics_memory::GraphicsMemory;
pub use pool::{BucketChoice, PageIndex, bucket_for};
pub use registry::MemoryRegistry;
pub use resource::{CRepr, GraphicsResource, SharedGraphicsResource};
pub use statistics::{AllocatorStatistics, GraphicsMemoryStatistics};
