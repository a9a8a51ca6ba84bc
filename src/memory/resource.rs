// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Ownership tokens over allocated page ranges.

A [`GraphicsResource`] owns one range exclusively.  Dropping (or [resetting](GraphicsResource::reset))
it hands the range back to its page tagged with the next fence value, so the range is only
reused after the GPU has finished with the frame that may still be reading it.

A [`SharedGraphicsResource`] is the reference-counted form, for data several consumers keep
alive, e.g. a constant buffer referenced by several draws in flight.
*/

use crate::device::MemoryBlock;
use crate::memory::allocator::AllocatorCore;
use crate::memory::pool::PageIndex;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/**
Plain-old-data that can be copied into GPU memory byte for byte.

# Safety

The type must be `#[repr(C)]` (or a primitive) and contain no padding bytes, pointers or
references.
*/
pub unsafe trait CRepr: Copy + 'static {}

unsafe impl CRepr for u8 {}
unsafe impl CRepr for u16 {}
unsafe impl CRepr for u32 {}
unsafe impl CRepr for u64 {}
unsafe impl CRepr for i8 {}
unsafe impl CRepr for i16 {}
unsafe impl CRepr for i32 {}
unsafe impl CRepr for i64 {}
unsafe impl CRepr for f32 {}
unsafe impl CRepr for f64 {}
unsafe impl<T: CRepr, const N: usize> CRepr for [T; N] {}

pub(crate) fn bytes_of<T: CRepr>(value: &T) -> &[u8] {
    //safe because CRepr types have no padding
    unsafe { std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>()) }
}

pub(crate) struct Allocation {
    pub(crate) core: Arc<AllocatorCore>,
    pub(crate) block: Arc<dyn MemoryBlock>,
    pub(crate) page: PageIndex,
    pub(crate) offset: u64,
    pub(crate) size: u64,
    /// `size` padded to the device's write granularity.
    pub(crate) reserved: u64,
}

/// Exclusive ownership of one allocated range.  Move-only.
#[derive(Default)]
pub struct GraphicsResource {
    allocation: Option<Allocation>,
}

impl GraphicsResource {
    pub(crate) fn new(allocation: Allocation) -> Self {
        GraphicsResource {
            allocation: Some(allocation),
        }
    }

    /// A handle that owns nothing.  Same as [`Default`].
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.allocation.is_none()
    }

    fn allocation(&self) -> &Allocation {
        self.allocation
            .as_ref()
            .expect("GraphicsResource is empty")
    }

    /// GPU address of the first byte.
    ///
    /// # Panics
    /// Panics on an empty handle.
    pub fn gpu_address(&self) -> u64 {
        let a = self.allocation();
        a.block.gpu_address() + a.offset
    }

    /// Byte offset of the range within its backend block.
    pub fn offset(&self) -> u64 {
        self.allocation().offset
    }

    pub fn size(&self) -> u64 {
        self.allocation().size
    }

    pub fn page_index(&self) -> PageIndex {
        self.allocation().page
    }

    /// The backend block this range lives in, e.g. to bind it.
    pub fn block(&self) -> &Arc<dyn MemoryBlock> {
        &self.allocation().block
    }

    pub fn memory(&self) -> &[u8] {
        let a = self.allocation();
        //safe because the block outlives us and the range is ours
        unsafe {
            std::slice::from_raw_parts(
                a.block.cpu_ptr().as_ptr().add(a.offset as usize),
                a.size as usize,
            )
        }
    }

    /**
    Mutable view of the range.

    Backends whose blocks are not coherent need a [`GraphicsResource::flush`] after writing
    through this view; [`GraphicsResource::write`] flushes for you.
    */
    pub fn memory_mut(&mut self) -> &mut [u8] {
        let a = self.allocation();
        //safe because no other handle covers this range and &mut self excludes our own readers
        unsafe {
            std::slice::from_raw_parts_mut(
                a.block.cpu_ptr().as_ptr().add(a.offset as usize),
                a.size as usize,
            )
        }
    }

    /// Makes CPU writes to the whole range visible to the GPU.
    pub fn flush(&self) {
        let a = self.allocation();
        a.block.flush(a.offset..a.offset + a.size);
    }

    /// Copies `data` to `dst_offset` within the range and flushes it.
    pub fn write(&mut self, dst_offset: usize, data: &[u8]) {
        let size = self.size() as usize;
        assert!(
            dst_offset + data.len() <= size,
            "Write out of bounds: {} bytes at {} into a {} byte range",
            data.len(),
            dst_offset,
            size
        );
        self.memory_mut()[dst_offset..dst_offset + data.len()].copy_from_slice(data);
        let a = self.allocation();
        let start = a.offset + dst_offset as u64;
        a.block.flush(start..start + data.len() as u64);
    }

    /// Copies one plain-old-data value to the start of the range.
    pub fn write_value<T: CRepr>(&mut self, value: &T) {
        self.write(0, bytes_of(value));
    }

    /// Releases the range now instead of at drop.
    pub fn reset(&mut self) {
        if let Some(a) = self.allocation.take() {
            a.core.release(a.page, a.offset, a.size, a.reserved);
        }
    }

    pub fn into_shared(self) -> SharedGraphicsResource {
        SharedGraphicsResource::from(self)
    }
}

impl Drop for GraphicsResource {
    fn drop(&mut self) {
        self.reset();
    }
}

impl Debug for GraphicsResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.allocation {
            None => f.write_str("GraphicsResource(empty)"),
            Some(a) => f
                .debug_struct("GraphicsResource")
                .field("page", &a.page)
                .field("offset", &a.offset)
                .field("size", &a.size)
                .field("gpu_address", &(a.block.gpu_address() + a.offset))
                .finish(),
        }
    }
}

/// Reference-counted ownership of one allocated range.
#[derive(Debug, Clone, Default)]
pub struct SharedGraphicsResource {
    inner: Option<Arc<GraphicsResource>>,
}

impl From<GraphicsResource> for SharedGraphicsResource {
    fn from(resource: GraphicsResource) -> Self {
        if resource.is_empty() {
            SharedGraphicsResource { inner: None }
        } else {
            SharedGraphicsResource {
                inner: Some(Arc::new(resource)),
            }
        }
    }
}

impl SharedGraphicsResource {
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    fn resource(&self) -> &GraphicsResource {
        self.inner
            .as_ref()
            .expect("SharedGraphicsResource is empty")
    }

    pub fn gpu_address(&self) -> u64 {
        self.resource().gpu_address()
    }
    pub fn offset(&self) -> u64 {
        self.resource().offset()
    }
    pub fn size(&self) -> u64 {
        self.resource().size()
    }
    pub fn page_index(&self) -> PageIndex {
        self.resource().page_index()
    }
    pub fn block(&self) -> &Arc<dyn MemoryBlock> {
        self.resource().block()
    }
    pub fn memory(&self) -> &[u8] {
        self.resource().memory()
    }

    /// Number of owners sharing the range; zero for an empty handle.
    pub fn use_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    /// Drops this owner's share.  The range is released once no owner is left.
    pub fn reset(&mut self) {
        self.inner = None;
    }
}
