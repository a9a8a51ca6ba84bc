// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Allocator configuration.

use crate::memory::MemoryError;

/// Alignment used when the caller has no particular requirement.
pub const DEFAULT_ALIGNMENT: u64 = 16;
/// Placement alignment for constant (uniform) data.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

pub const MIN_PAGE_SIZE: u64 = 64 * 1024;
pub const MIN_ALLOC_SIZE: u64 = 4 * 1024;
pub const MAX_ALLOC_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/**
Tunables for a [`crate::memory::DeviceAllocator`].

All sizes are powers of two.

# Example

```
use pages_and_permutations::memory::AllocatorConfig;

let config = AllocatorConfig {
    retained_pages_per_bucket: 0,
    ..AllocatorConfig::default()
};
assert!(config.validate().is_ok());
```
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    /// Smallest page any bucket creates.
    pub min_page_size: u64,
    /// Allocation granularity.  Requests round up to at least this before bucketing.
    pub min_alloc_size: u64,
    /// Largest bucket.  Requests rounding above this are refused.
    pub max_alloc_size: u64,
    /// How many reclaimable pages each bucket keeps across [`crate::memory::DeviceAllocator::garbage_collect`].
    pub retained_pages_per_bucket: usize,
    /// Label for backend blocks and log lines.
    pub label: String,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            min_page_size: MIN_PAGE_SIZE,
            min_alloc_size: MIN_ALLOC_SIZE,
            max_alloc_size: MAX_ALLOC_SIZE,
            retained_pages_per_bucket: 1,
            label: "GraphicsMemory".to_string(),
        }
    }
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<(), MemoryError> {
        let invalid = |reason: &str| {
            Err(MemoryError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if !self.min_page_size.is_power_of_two() {
            return invalid("min_page_size must be a power of two");
        }
        if !self.min_alloc_size.is_power_of_two() {
            return invalid("min_alloc_size must be a power of two");
        }
        if !self.max_alloc_size.is_power_of_two() {
            return invalid("max_alloc_size must be a power of two");
        }
        if self.min_alloc_size > self.min_page_size {
            return invalid("min_alloc_size exceeds min_page_size");
        }
        if self.min_alloc_size > self.max_alloc_size {
            return invalid("min_alloc_size exceeds max_alloc_size");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(AllocatorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two() {
        let config = AllocatorConfig {
            min_page_size: 60_000,
            ..AllocatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MemoryError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_granularity_above_page() {
        let config = AllocatorConfig {
            min_alloc_size: 128 * 1024,
            ..AllocatorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
