// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The per-device entry point.

[`GraphicsMemory`] wraps a [`DeviceAllocator`] and registers itself so other subsystems can
find it by device.
*/

use crate::device::{CommandQueue, DeviceId, MemoryDevice};
use crate::memory::allocator::{DeviceAllocator, GarbageCollection};
use crate::memory::config::CONSTANT_BUFFER_ALIGNMENT;
use crate::memory::registry::MemoryRegistry;
use crate::memory::resource::{CRepr, GraphicsResource, bytes_of};
use crate::memory::statistics::GraphicsMemoryStatistics;
use crate::memory::{AllocatorConfig, MemoryError};
use std::sync::{Arc, Weak};

#[derive(Debug)]
pub(crate) struct GraphicsMemoryInner {
    allocator: DeviceAllocator,
    registry: Weak<MemoryRegistry>,
    instance_id: u64,
}

impl Drop for GraphicsMemoryInner {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.allocator.device_id(), self.instance_id);
        }
    }
}

/**
Upload-memory allocator for one device.

Clones share one instance.  The instance stays registered with its [`MemoryRegistry`] until
the last clone drops.

```
use pages_and_permutations::memory::{GraphicsMemory, MemoryRegistry};
use pages_and_permutations::software::{SoftwareDevice, SoftwareQueue};
use std::sync::Arc;

let registry = MemoryRegistry::new();
let device = Arc::new(SoftwareDevice::new());
let memory = GraphicsMemory::new(device.clone(), &registry).unwrap();

let light_direction = memory.allocate_constant(&[0.0f32, -1.0, 0.0, 0.0]).unwrap();
assert_eq!(light_direction.size(), 16);

let found = GraphicsMemory::get(&registry, memory.device_id()).unwrap();
assert_eq!(found.device_id(), memory.device_id());

let queue = SoftwareQueue::new();
memory.commit(&queue);
```
*/
#[derive(Debug, Clone)]
pub struct GraphicsMemory {
    inner: Arc<GraphicsMemoryInner>,
}

impl GraphicsMemory {
    pub fn new(
        device: Arc<dyn MemoryDevice>,
        registry: &Arc<MemoryRegistry>,
    ) -> Result<Self, MemoryError> {
        Self::with_config(device, AllocatorConfig::default(), registry)
    }

    /// Fails with [`MemoryError::AlreadyRegistered`] if `device` already has a live instance in `registry`.
    pub fn with_config(
        device: Arc<dyn MemoryDevice>,
        config: AllocatorConfig,
        registry: &Arc<MemoryRegistry>,
    ) -> Result<Self, MemoryError> {
        let device_id = device.id();
        let inner = registry.register(device_id, |instance_id| {
            Ok(Arc::new(GraphicsMemoryInner {
                allocator: DeviceAllocator::new(device, config)?,
                registry: Arc::downgrade(registry),
                instance_id,
            }))
        })?;
        Ok(GraphicsMemory { inner })
    }

    /// The live instance for `device` in `registry`.
    pub fn get(registry: &MemoryRegistry, device: DeviceId) -> Result<Self, MemoryError> {
        registry.get(device)
    }

    pub(crate) fn from_inner(inner: Arc<GraphicsMemoryInner>) -> Self {
        GraphicsMemory { inner }
    }

    pub fn device_id(&self) -> DeviceId {
        self.inner.allocator.device_id()
    }

    /// The underlying allocator.  Allocations made through it count toward the peaks too.
    pub fn allocator(&self) -> &DeviceAllocator {
        &self.inner.allocator
    }

    pub fn allocate(&self, size: u64, alignment: u64) -> Result<GraphicsResource, MemoryError> {
        self.inner.allocator.alloc(size, alignment)
    }

    /// Allocates constant-buffer-aligned memory and copies `value` into it.
    pub fn allocate_constant<T: CRepr>(&self, value: &T) -> Result<GraphicsResource, MemoryError> {
        let bytes = bytes_of(value);
        let mut resource = self.allocate(bytes.len() as u64, CONSTANT_BUFFER_ALIGNMENT)?;
        resource.write(0, bytes);
        Ok(resource)
    }

    /// Frame boundary.  Returns the fence value signaled on `queue`.
    pub fn commit(&self, queue: &dyn CommandQueue) -> u64 {
        self.inner.allocator.kick_fences(queue)
    }

    pub fn garbage_collect(&self) -> GarbageCollection {
        self.inner.allocator.garbage_collect()
    }

    /// Current numbers and peaks.  The current numbers are folded into the peaks first.
    pub fn statistics(&self) -> GraphicsMemoryStatistics {
        self.inner.allocator.statistics_with_peaks()
    }

    /// Sets every peak to the current value.
    pub fn reset_statistics(&self) {
        self.inner.allocator.reset_peaks();
    }
}
