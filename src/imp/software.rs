// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Host-memory backend.

Blocks are plain heap allocations with made-up GPU addresses, the queue completes fences only
when told to, and the pipeline factory counts what it builds.  This makes every GPU-side event
something a caller controls, which is what headless tools and tests need.
*/

use crate::device::{
    CommandQueue, DeviceError, DeviceId, FenceTimeline, MemoryBlock, MemoryDevice,
};
use crate::effects::{PipelineFactory, PipelineRequest, PipelineStateDescription};
use std::any::Any;
use std::collections::VecDeque;
use std::ops::Range;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Fake GPU addresses start here and advance in this granularity.
const ADDRESS_BASE: u64 = 0x1_0000_0000;
const ADDRESS_GRANULARITY: u64 = 64 * 1024;

#[derive(Debug)]
pub struct SoftwareDevice {
    id: DeviceId,
    budget: Option<u64>,
    in_use: Arc<AtomicU64>,
    next_address: AtomicU64,
    blocks_created: AtomicUsize,
    write_granularity: u64,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    pub fn new() -> Self {
        SoftwareDevice {
            id: DeviceId::next(),
            budget: None,
            in_use: Arc::new(AtomicU64::new(0)),
            next_address: AtomicU64::new(ADDRESS_BASE),
            blocks_created: AtomicUsize::new(0),
            write_granularity: 1,
        }
    }

    /// A device that refuses blocks once `bytes` are in use.
    pub fn with_budget(bytes: u64) -> Self {
        SoftwareDevice {
            budget: Some(bytes),
            ..Self::new()
        }
    }

    /// Models a backend whose flushes move whole `granularity`-byte units.
    pub fn with_write_granularity(mut self, granularity: u64) -> Self {
        assert!(granularity.is_power_of_two(), "granularity must be a power of two");
        self.write_granularity = granularity;
        self
    }

    /// Bytes held by live blocks.
    pub fn bytes_in_use(&self) -> u64 {
        self.in_use.load(Ordering::Acquire)
    }

    pub fn blocks_created(&self) -> usize {
        self.blocks_created.load(Ordering::Relaxed)
    }
}

impl MemoryDevice for SoftwareDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn create_upload_block(
        &self,
        size: u64,
        label: &str,
    ) -> Result<Arc<dyn MemoryBlock>, DeviceError> {
        let out_of_memory = || DeviceError::OutOfMemory {
            requested: size,
            label: label.to_string(),
        };
        let reserved = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                let next = used.checked_add(size)?;
                match self.budget {
                    Some(budget) if next > budget => None,
                    _ => Some(next),
                }
            });
        if reserved.is_err() {
            return Err(out_of_memory());
        }
        let len = match usize::try_from(size) {
            Ok(len) => len,
            Err(_) => {
                self.in_use.fetch_sub(size, Ordering::AcqRel);
                return Err(out_of_memory());
            }
        };
        let mut storage = Vec::new();
        if storage.try_reserve_exact(len).is_err() {
            self.in_use.fetch_sub(size, Ordering::AcqRel);
            return Err(out_of_memory());
        }
        storage.resize(len, 0u8);
        let span = size.div_ceil(ADDRESS_GRANULARITY).max(1) * ADDRESS_GRANULARITY;
        let gpu_address = self.next_address.fetch_add(span, Ordering::Relaxed);
        self.blocks_created.fetch_add(1, Ordering::Relaxed);
        let memory = NonNull::from(Box::leak(storage.into_boxed_slice()));
        Ok(Arc::new(SoftwareBlock {
            memory,
            gpu_address,
            in_use: self.in_use.clone(),
            flushed_bytes: AtomicU64::new(0),
            label: label.to_string(),
        }))
    }

    fn write_granularity(&self) -> u64 {
        self.write_granularity
    }
}

/// A heap allocation posing as upload memory.
#[derive(Debug)]
pub struct SoftwareBlock {
    memory: NonNull<[u8]>,
    gpu_address: u64,
    in_use: Arc<AtomicU64>,
    flushed_bytes: AtomicU64,
    label: String,
}

//the block owns its allocation; disjoint ranges are handed to different threads
unsafe impl Send for SoftwareBlock {}
unsafe impl Sync for SoftwareBlock {}

impl SoftwareBlock {
    /// Total bytes passed to [`MemoryBlock::flush`] so far.
    pub fn flushed_bytes(&self) -> u64 {
        self.flushed_bytes.load(Ordering::Relaxed)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

unsafe impl MemoryBlock for SoftwareBlock {
    fn size(&self) -> u64 {
        self.memory.len() as u64
    }

    fn gpu_address(&self) -> u64 {
        self.gpu_address
    }

    fn cpu_ptr(&self) -> NonNull<u8> {
        self.memory.cast()
    }

    fn flush(&self, range: Range<u64>) {
        debug_assert!(range.end <= self.size());
        self.flushed_bytes
            .fetch_add(range.end - range.start, Ordering::Relaxed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for SoftwareBlock {
    fn drop(&mut self) {
        let size = self.memory.len() as u64;
        //safe because memory came from Box::leak in create_upload_block and is dropped once
        unsafe {
            drop(Box::from_raw(self.memory.as_ptr()));
        }
        self.in_use.fetch_sub(size, Ordering::AcqRel);
    }
}

/**
A queue whose fences complete when the caller says so.

By default signals wait in order until [`SoftwareQueue::complete_next`] or
[`SoftwareQueue::complete_all`]; an [immediate](SoftwareQueue::immediate) queue completes
them as they are issued.
*/
#[derive(Debug, Default)]
pub struct SoftwareQueue {
    pending: Mutex<VecDeque<(Arc<FenceTimeline>, u64)>>,
    immediate: bool,
}

impl SoftwareQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate() -> Self {
        SoftwareQueue {
            immediate: true,
            ..Self::default()
        }
    }

    /// Completes the oldest outstanding signal, returning its value.
    pub fn complete_next(&self) -> Option<u64> {
        let (fence, value) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()?;
        fence.signal_completed(value);
        Some(value)
    }

    /// Completes every outstanding signal.  Returns how many there were.
    pub fn complete_all(&self) -> usize {
        let drained: Vec<_> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for (fence, value) in &drained {
            fence.signal_completed(*value);
        }
        drained.len()
    }

    pub fn pending_signals(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl CommandQueue for SoftwareQueue {
    fn signal(&self, fence: &Arc<FenceTimeline>, value: u64) {
        if self.immediate {
            fence.signal_completed(value);
        } else {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back((fence.clone(), value));
        }
    }
}

/// What [`SoftwarePipelineFactory`] builds: a record of the request.
#[derive(Debug, PartialEq, Eq)]
pub struct SoftwarePipeline {
    /// Build number, starting at zero.
    pub id: usize,
    pub effect: &'static str,
    pub vertex_shader: &'static str,
    pub pixel_shader: &'static str,
    pub description: PipelineStateDescription,
}

/// Never fails.
#[derive(Debug, thiserror::Error)]
#[error("software pipelines can't fail")]
pub struct SoftwarePipelineError;

/// Records every pipeline it is asked for.
#[derive(Debug)]
pub struct SoftwarePipelineFactory {
    device: DeviceId,
    builds: AtomicUsize,
}

impl Default for SoftwarePipelineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwarePipelineFactory {
    /// A factory for a device of its own.
    pub fn new() -> Self {
        Self::for_device(DeviceId::next())
    }

    pub fn for_device(device: DeviceId) -> Self {
        SoftwarePipelineFactory {
            device,
            builds: AtomicUsize::new(0),
        }
    }

    /// Pipelines built so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }
}

impl PipelineFactory for SoftwarePipelineFactory {
    type Pipeline = Arc<SoftwarePipeline>;
    type Error = SoftwarePipelineError;

    fn device_id(&self) -> DeviceId {
        self.device
    }

    fn create_pipeline(&self, request: &PipelineRequest<'_>) -> Result<Self::Pipeline, Self::Error> {
        let id = self.builds.fetch_add(1, Ordering::AcqRel);
        Ok(Arc::new(SoftwarePipeline {
            id,
            effect: request.effect,
            vertex_shader: request.selection.vertex_shader_name,
            pixel_shader: request.selection.pixel_shader_name,
            description: request.description.clone(),
        }))
    }
}
