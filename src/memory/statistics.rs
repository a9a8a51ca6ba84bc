// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Memory statistics and peak tracking.

/// Instantaneous numbers reported by one [`crate::memory::DeviceAllocator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStatistics {
    /// Bytes referenced by live handles.
    pub committed_memory: u64,
    /// Sum of all page capacities.
    pub total_memory: u64,
    pub total_pages: usize,
}

/// Instantaneous numbers plus running peaks, as reported by [`crate::memory::GraphicsMemory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicsMemoryStatistics {
    pub committed_memory: u64,
    pub total_memory: u64,
    pub total_pages: usize,
    pub peak_committed_memory: u64,
    pub peak_total_memory: u64,
    pub peak_total_pages: usize,
}

/// Running maxima, reset on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PeakTracker {
    committed_memory: u64,
    total_memory: u64,
    total_pages: usize,
}

impl PeakTracker {
    pub fn observe(&mut self, current: &AllocatorStatistics) {
        self.committed_memory = self.committed_memory.max(current.committed_memory);
        self.total_memory = self.total_memory.max(current.total_memory);
        self.total_pages = self.total_pages.max(current.total_pages);
    }

    pub fn reset_to(&mut self, current: &AllocatorStatistics) {
        self.committed_memory = current.committed_memory;
        self.total_memory = current.total_memory;
        self.total_pages = current.total_pages;
    }

    pub fn report(&self, current: &AllocatorStatistics) -> GraphicsMemoryStatistics {
        GraphicsMemoryStatistics {
            committed_memory: current.committed_memory,
            total_memory: current.total_memory,
            total_pages: current.total_pages,
            peak_committed_memory: self.committed_memory,
            peak_total_memory: self.total_memory,
            peak_total_pages: self.total_pages,
        }
    }
}
