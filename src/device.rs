// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Contracts for the device-side collaborators.
//!
//! The allocator and the effect system never talk to a native graphics API directly.  They
//! depend on three small capabilities:
//!
//! * a [`MemoryDevice`] that can create CPU-writable, GPU-readable blocks ([`MemoryBlock`]),
//! * a [`CommandQueue`] that can signal a monotonically increasing value on a [`FenceTimeline`],
//! * a pipeline factory (see [`crate::effects::PipelineFactory`]).
//!
//! The [`crate::software`] backend implements these in host memory, and the `wgpu` backend
//! implements them on top of wgpu.
use std::any::Any;
use std::fmt::Debug;
use std::ops::Range;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one device.
///
/// Used as the key of [`crate::memory::MemoryRegistry`] and of the per-device effect
/// pipeline pools.  Backends mint identities with [`DeviceId::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

impl DeviceId {
    /// Mints a process-unique device identity.
    pub fn next() -> Self {
        DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DeviceError {
    #[error("Device out of memory allocating {requested} bytes for {label}")]
    OutOfMemory { requested: u64, label: String },
    #[error("Backend error {0}")]
    Backend(String),
}

/**
A block of memory that the CPU can write and the GPU can read.

# Safety

Implementations must guarantee that [`MemoryBlock::cpu_ptr`] points to at least
[`MemoryBlock::size`] writable bytes, and that this pointer stays valid and does not move for
as long as the block is alive.  The allocator hands out disjoint sub-ranges of this memory to
different threads.
*/
pub unsafe trait MemoryBlock: Send + Sync + Debug {
    /// Capacity of the block in bytes.
    fn size(&self) -> u64;
    /// Base address of the block as seen by the GPU.
    fn gpu_address(&self) -> u64;
    /// Base of the CPU mapping.
    fn cpu_ptr(&self) -> NonNull<u8>;
    /// Makes CPU writes to `range` visible to the GPU.
    ///
    /// Persistently-mapped coherent memory has nothing to do here.  Implementations read only
    /// `range` widened to the device's [`MemoryDevice::write_granularity`]; other threads may be
    /// writing the rest of the block.
    fn flush(&self, _range: Range<u64>) {}
    /// For backends that need their concrete block type back, e.g. to bind a buffer.
    fn as_any(&self) -> &dyn Any;
}

/// Creates upload blocks.
pub trait MemoryDevice: Send + Sync + Debug {
    fn id(&self) -> DeviceId;
    /// Creates a CPU-writable, GPU-readable block of exactly `size` bytes.
    fn create_upload_block(
        &self,
        size: u64,
        label: &str,
    ) -> Result<Arc<dyn MemoryBlock>, DeviceError>;
    /// Smallest unit [`MemoryBlock::flush`] transfers, a power of two.
    ///
    /// The allocator aligns and pads every range to it, so two handles never share a unit.
    fn write_granularity(&self) -> u64 {
        1
    }
}

/**
The CPU side of a GPU timeline.

The completed value only ever moves forward.  Queues arrange for [`FenceTimeline::signal_completed`]
to be called once the GPU has executed everything submitted before the signal.
*/
#[derive(Debug, Default)]
pub struct FenceTimeline {
    completed: AtomicU64,
}

impl FenceTimeline {
    pub fn new() -> Self {
        Self::default()
    }
    /// Highest value the GPU is known to have reached.
    pub fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
    /// Records that the GPU reached `value`.  Lower values than the current one are ignored.
    pub fn signal_completed(&self, value: u64) {
        self.completed.fetch_max(value, Ordering::AcqRel);
    }
    pub fn is_complete(&self, value: u64) -> bool {
        self.completed_value() >= value
    }
}

/// A queue that can order a fence signal after the work submitted so far.
pub trait CommandQueue: Send + Sync {
    /// Arranges for `fence` to reach `value` once previously submitted work completes.
    fn signal(&self, fence: &Arc<FenceTimeline>, value: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_is_monotonic() {
        let fence = FenceTimeline::new();
        assert_eq!(fence.completed_value(), 0);
        fence.signal_completed(3);
        fence.signal_completed(2);
        assert_eq!(fence.completed_value(), 3);
        assert!(fence.is_complete(3));
        assert!(!fence.is_complete(4));
    }

    #[test]
    fn device_ids_are_unique() {
        let a = DeviceId::next();
        let b = DeviceId::next();
        assert_ne!(a, b);
    }
}
