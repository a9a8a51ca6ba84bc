// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
wgpu backend.

[`WgpuDevice`] provides upload blocks, [`WgpuQueue`] signals fences, and
[`WgpuPipelineFactory`] realizes effect pipelines.
*/

mod bound_device;
mod buffer;
mod error;
mod pipeline;
mod queue;

pub use bound_device::WgpuDevice;
pub use buffer::WgpuBlock;
pub use error::Error;
pub use pipeline::WgpuPipelineFactory;
pub use queue::WgpuQueue;
