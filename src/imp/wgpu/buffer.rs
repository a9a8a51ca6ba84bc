// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

//! Upload blocks for the wgpu backend.
//!
//! wgpu can't keep a buffer mapped while the GPU uses it, so each block pairs a host shadow
//! with a GPU buffer.  Handles write into the shadow; [`MemoryBlock::flush`] stages the
//! written range with `Queue::write_buffer`, which wgpu applies before the next submission.

use crate::device::{DeviceError, MemoryBlock};
use std::any::Any;
use std::ops::Range;
use std::ptr::NonNull;
use wgpu::{BufferDescriptor, BufferUsages};

#[derive(Debug)]
pub struct WgpuBlock {
    //host shadow, stable for the life of the block
    shadow: NonNull<[u8]>,
    buffer: wgpu::Buffer,
    queue: wgpu::Queue,
    gpu_address: u64,
    debug_label: String,
}

//the block owns its shadow; disjoint ranges are handed to different threads
unsafe impl Send for WgpuBlock {}
unsafe impl Sync for WgpuBlock {}

impl WgpuBlock {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: u64,
        gpu_address: u64,
        debug_name: &str,
    ) -> Result<Self, DeviceError> {
        debug_assert_eq!(size % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        let out_of_memory = || DeviceError::OutOfMemory {
            requested: size,
            label: debug_name.to_string(),
        };
        let len = usize::try_from(size).map_err(|_| out_of_memory())?;
        let mut storage = Vec::new();
        storage.try_reserve_exact(len).map_err(|_| out_of_memory())?;
        storage.resize(len, 0u8);

        let descriptor = BufferDescriptor {
            label: Some(debug_name),
            size,
            usage: BufferUsages::COPY_DST
                | BufferUsages::UNIFORM
                | BufferUsages::VERTEX
                | BufferUsages::INDEX
                | BufferUsages::STORAGE,
            mapped_at_creation: false,
        };
        let buffer = device.create_buffer(&descriptor);
        Ok(WgpuBlock {
            shadow: NonNull::from(Box::leak(storage.into_boxed_slice())),
            buffer,
            queue: queue.clone(),
            gpu_address,
            debug_label: debug_name.to_string(),
        })
    }

    /// The GPU buffer, e.g. to bind a handle at its [`crate::memory::GraphicsResource::offset`].
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn debug_label(&self) -> &str {
        &self.debug_label
    }
}

unsafe impl MemoryBlock for WgpuBlock {
    fn size(&self) -> u64 {
        self.shadow.len() as u64
    }

    fn gpu_address(&self) -> u64 {
        self.gpu_address
    }

    fn cpu_ptr(&self) -> NonNull<u8> {
        self.shadow.cast()
    }

    fn flush(&self, range: Range<u64>) {
        if range.is_empty() {
            return;
        }
        //write_buffer wants 4-byte granularity.  The allocator aligns and pads every range to
        //write_granularity, so the rounded range still belongs to the caller alone.
        let start = range.start - range.start % wgpu::COPY_BUFFER_ALIGNMENT;
        let end = range
            .end
            .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
            .min(self.size());
        assert!(start <= end, "flush range {range:?} outside block");
        //only the flushed range is borrowed; other threads own the rest of the shadow
        let data = unsafe {
            std::slice::from_raw_parts(
                self.cpu_ptr().as_ptr().add(start as usize),
                (end - start) as usize,
            )
        };
        self.queue.write_buffer(&self.buffer, start, data);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for WgpuBlock {
    fn drop(&mut self) {
        //safe because the shadow came from Box::leak in new and is dropped once
        unsafe {
            drop(Box::from_raw(self.shadow.as_ptr()));
        }
        self.buffer.destroy();
    }
}
