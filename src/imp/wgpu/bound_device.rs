// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{DeviceError, DeviceId, MemoryBlock, MemoryDevice};
use crate::imp::wgpu::Error;
use crate::imp::wgpu::buffer::WgpuBlock;
use crate::imp::wgpu::queue::WgpuQueue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use wgpu::{Features, Limits, PollType, Trace};

/// Fake GPU addresses start here and advance in this granularity.
const ADDRESS_BASE: u64 = 0x1_0000_0000;
const ADDRESS_GRANULARITY: u64 = 64 * 1024;

/// Owns the wgpu objects and the thread that polls them.
#[derive(Debug)]
struct DeviceResources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_address: AtomicU64,
    poll_thread: Option<JoinHandle<()>>,
    poll_shutdown: Arc<AtomicBool>,
    poll_trigger: Option<Sender<()>>,
}

/**
A wgpu device and queue, usable as a [`MemoryDevice`].

wgpu only runs completion callbacks while the device is polled, so every `WgpuDevice` keeps a
background thread that polls whenever [`WgpuDevice::set_needs_poll`] is called.  Clones share
one device.
*/
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    id: DeviceId,
    resources: Arc<DeviceResources>,
}

impl WgpuDevice {
    /// Picks the default adapter of `instance` and binds it.
    pub async fn request(instance: &wgpu::Instance) -> Result<Self, Error> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await?;
        Self::bind(&adapter).await
    }

    pub async fn bind(adapter: &wgpu::Adapter) -> Result<Self, Error> {
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("pages_and_permutations device"),
            //wireframe pipelines need this where available
            required_features: adapter.features() & Features::POLYGON_MODE_LINE,
            required_limits: Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;
        Ok(Self::from_parts(device, queue))
    }

    /// Wraps an existing device.  `queue` must belong to `device`.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let poll_shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = poll_shutdown.clone();
        let (poll_sender, poll_receiver): (Sender<()>, Receiver<()>) = mpsc::channel();
        let poll_device = device.clone();
        let poll_thread = thread::Builder::new()
            .name("wgpu_poll".to_string())
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    match poll_receiver.recv() {
                        Ok(_) => {
                            let _ = poll_device.poll(PollType::Wait);
                        }
                        Err(_) => break,
                    }
                }
            })
            .expect("Failed to spawn wgpu polling thread");
        let id = DeviceId::next();
        logwise::info_sync!(
            "bound wgpu device {id}",
            id = logwise::privacy::LogIt(id)
        );
        WgpuDevice {
            id,
            resources: Arc::new(DeviceResources {
                device,
                queue,
                next_address: AtomicU64::new(ADDRESS_BASE),
                poll_thread: Some(poll_thread),
                poll_shutdown,
                poll_trigger: Some(poll_sender),
            }),
        }
    }

    /// Signal the polling thread that GPU work may be ready
    pub fn set_needs_poll(&self) {
        if let Some(trigger) = &self.resources.poll_trigger {
            let _ = trigger.send(());
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.resources.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.resources.queue
    }

    /// A [`crate::device::CommandQueue`] over this device's queue.
    pub fn command_queue(&self) -> WgpuQueue {
        WgpuQueue::new(self.clone())
    }
}

impl MemoryDevice for WgpuDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn create_upload_block(
        &self,
        size: u64,
        label: &str,
    ) -> Result<Arc<dyn MemoryBlock>, DeviceError> {
        let max = self.resources.device.limits().max_buffer_size;
        let size = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        if size > max {
            return Err(DeviceError::OutOfMemory {
                requested: size,
                label: label.to_string(),
            });
        }
        let span = size.div_ceil(ADDRESS_GRANULARITY).max(1) * ADDRESS_GRANULARITY;
        let gpu_address = self
            .resources
            .next_address
            .fetch_add(span, Ordering::Relaxed);
        let block = WgpuBlock::new(
            &self.resources.device,
            &self.resources.queue,
            size,
            gpu_address,
            label,
        )?;
        Ok(Arc::new(block))
    }

    fn write_granularity(&self) -> u64 {
        wgpu::COPY_BUFFER_ALIGNMENT
    }
}

impl Drop for DeviceResources {
    fn drop(&mut self) {
        self.poll_shutdown.store(true, Ordering::Relaxed);
        //closing the channel wakes the thread
        drop(self.poll_trigger.take());
        if let Some(handle) = self.poll_thread.take() {
            let _ = handle.join();
        }
    }
}
