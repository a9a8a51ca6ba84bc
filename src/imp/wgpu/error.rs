// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("No such adapter {0}")]
    NoSuchAdapter(#[from] wgpu::RequestAdapterError),
    #[error("Can't request device {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("No WGSL source registered for {0}")]
    MissingShaderSource(&'static str),
    #[error("Device lacks feature {0}")]
    MissingFeature(&'static str),
}
