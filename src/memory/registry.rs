// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device identity → [`GraphicsMemory`] lookup.

use crate::device::DeviceId;
use crate::memory::MemoryError;
use crate::memory::graphics_memory::{GraphicsMemory, GraphicsMemoryInner};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

#[derive(Debug)]
struct Entry {
    instance_id: u64,
    instance: Weak<GraphicsMemoryInner>,
}

/**
Tracks at most one live [`GraphicsMemory`] per device.

Registries are ordinary objects, so tests and embedders can keep theirs separate;
[`MemoryRegistry::global`] is the process-wide default.  Entries are weak: an instance
unregisters itself when its last clone drops.
*/
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    instances: Mutex<HashMap<DeviceId, Entry>>,
    next_instance_id: AtomicU64,
}

static GLOBAL: OnceLock<Arc<MemoryRegistry>> = OnceLock::new();

impl MemoryRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn global() -> &'static Arc<MemoryRegistry> {
        GLOBAL.get_or_init(MemoryRegistry::new)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, Entry>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the instance built by `make`, unless `device` already has a live one.
    pub(crate) fn register(
        &self,
        device: DeviceId,
        make: impl FnOnce(u64) -> Result<Arc<GraphicsMemoryInner>, MemoryError>,
    ) -> Result<Arc<GraphicsMemoryInner>, MemoryError> {
        let mut instances = self.lock();
        if let Some(entry) = instances.get(&device)
            && entry.instance.strong_count() > 0
        {
            logwise::warn_sync!(
                "{device} already has a GraphicsMemory instance",
                device = logwise::privacy::LogIt(device)
            );
            return Err(MemoryError::AlreadyRegistered(device));
        }
        let instance_id = self.next_instance_id.fetch_add(1, Ordering::Relaxed);
        let instance = make(instance_id)?;
        instances.insert(
            device,
            Entry {
                instance_id,
                instance: Arc::downgrade(&instance),
            },
        );
        logwise::info_sync!(
            "registered GraphicsMemory for {device}",
            device = logwise::privacy::LogIt(device)
        );
        Ok(instance)
    }

    /// Removes `device`'s entry if it still belongs to `instance_id`.
    pub(crate) fn unregister(&self, device: DeviceId, instance_id: u64) {
        let mut instances = self.lock();
        if instances
            .get(&device)
            .is_some_and(|entry| entry.instance_id == instance_id)
        {
            instances.remove(&device);
            logwise::info_sync!(
                "unregistered GraphicsMemory for {device}",
                device = logwise::privacy::LogIt(device)
            );
        }
    }

    /// The live instance for `device`.
    pub fn get(&self, device: DeviceId) -> Result<GraphicsMemory, MemoryError> {
        self.lock()
            .get(&device)
            .and_then(|entry| entry.instance.upgrade())
            .map(GraphicsMemory::from_inner)
            .ok_or(MemoryError::NotRegistered(device))
    }

    pub fn is_registered(&self, device: DeviceId) -> bool {
        self.lock()
            .get(&device)
            .is_some_and(|entry| entry.instance.strong_count() > 0)
    }
}
