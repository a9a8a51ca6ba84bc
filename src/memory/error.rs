// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{DeviceError, DeviceId};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MemoryError {
    #[error("Can't allocate zero bytes")]
    ZeroSize,
    #[error("Alignment {alignment} is not a non-zero power of two")]
    InvalidAlignment { alignment: u64 },
    #[error("Allocation of {size} bytes aligned to {alignment} exceeds the largest bucket ({max} bytes)")]
    TooLarge { size: u64, alignment: u64, max: u64 },
    #[error("Invalid allocator configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("Out of memory {0}")]
    OutOfMemory(#[from] DeviceError),
    #[error("{0} already has a GraphicsMemory instance")]
    AlreadyRegistered(DeviceId),
    #[error("{0} has no GraphicsMemory instance")]
    NotRegistered(DeviceId),
}
