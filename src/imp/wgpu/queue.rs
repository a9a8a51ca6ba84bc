// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{CommandQueue, FenceTimeline};
use crate::imp::wgpu::bound_device::WgpuDevice;
use std::sync::Arc;

/**
Signals fences from wgpu's submission-completed callbacks.

Each signal submits (so staged block writes go out) and completes the fence once everything
submitted so far has finished.
*/
#[derive(Debug, Clone)]
pub struct WgpuQueue {
    device: WgpuDevice,
}

impl WgpuQueue {
    pub fn new(device: WgpuDevice) -> Self {
        WgpuQueue { device }
    }

    /// Resolves once everything submitted so far has finished on the GPU.
    pub async fn wait_idle(&self) {
        let (s, r) = r#continue::continuation();
        self.device.queue().on_submitted_work_done(move || {
            s.send(());
        });
        self.device.set_needs_poll();
        r.await;
    }
}

impl CommandQueue for WgpuQueue {
    fn signal(&self, fence: &Arc<FenceTimeline>, value: u64) {
        let queue = self.device.queue();
        queue.submit(std::iter::empty());
        let fence = fence.clone();
        queue.on_submitted_work_done(move || {
            fence.signal_completed(value);
        });
        self.device.set_needs_poll();
    }
}
