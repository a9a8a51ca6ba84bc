// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Size-class pool.

Requests are bucketed by `next_pow2(size + alignment)`, floored at the allocation granularity.
Every page in a bucket has the same capacity, `max(min_page_size, bucket size)`, so many small
requests share a page while large ones get a page of their own size class.

Pages live in an arena and are referred to by [`PageIndex`], which stays stable for the
lifetime of the page.
*/

use crate::bittricks::{bit_scan_forward, log2, next_pow2};
use crate::device::MemoryDevice;
use crate::memory::page::Page;
use crate::memory::{AllocatorConfig, MemoryError};

/// Stable index of a page in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageIndex(pub(crate) usize);

impl PageIndex {
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketChoice {
    /// Index into the pool's buckets.
    pub index: u32,
    /// Rounded request size the bucket serves.
    pub alloc_size: u64,
    /// Capacity of every regular page in the bucket.
    pub page_size: u64,
}

/**
Picks the bucket for a request.  Pure function of its inputs.

```
use pages_and_permutations::memory::{bucket_for, AllocatorConfig};

let config = AllocatorConfig::default();
let choice = bucket_for(256, 16, &config).unwrap();
assert_eq!(choice.index, 0);
assert_eq!(choice.alloc_size, 4 * 1024);
assert_eq!(choice.page_size, 64 * 1024);

let large = bucket_for(1024 * 1024, 256, &config).unwrap();
assert_eq!(large.alloc_size, 2 * 1024 * 1024);
assert_eq!(large.page_size, 2 * 1024 * 1024);
```
*/
pub fn bucket_for(
    size: u64,
    alignment: u64,
    config: &AllocatorConfig,
) -> Result<BucketChoice, MemoryError> {
    if size == 0 {
        return Err(MemoryError::ZeroSize);
    }
    if !alignment.is_power_of_two() {
        return Err(MemoryError::InvalidAlignment { alignment });
    }
    let too_large = MemoryError::TooLarge {
        size,
        alignment,
        max: config.max_alloc_size,
    };
    let alloc_size = match size.checked_add(alignment).and_then(next_pow2) {
        Some(s) => s.max(config.min_alloc_size),
        None => return Err(too_large),
    };
    if alloc_size > config.max_alloc_size {
        return Err(too_large);
    }
    let index = bit_scan_forward(alloc_size >> log2(config.min_alloc_size))
        .expect("alloc_size is at least min_alloc_size");
    Ok(BucketChoice {
        index,
        alloc_size,
        page_size: alloc_size.max(config.min_page_size),
    })
}

#[derive(Debug)]
pub(crate) struct Bucket {
    pub page_size: u64,
    /// In creation order; searched first to last.
    pub pages: Vec<PageIndex>,
}

#[derive(Debug, Default)]
pub(crate) struct PageArena {
    slots: Vec<Option<Page>>,
    vacant: Vec<usize>,
}

impl PageArena {
    pub fn insert(&mut self, page: Page) -> PageIndex {
        match self.vacant.pop() {
            Some(slot) => {
                debug_assert!(self.slots[slot].is_none());
                self.slots[slot] = Some(page);
                PageIndex(slot)
            }
            None => {
                self.slots.push(Some(page));
                PageIndex(self.slots.len() - 1)
            }
        }
    }
    pub fn remove(&mut self, index: PageIndex) -> Option<Page> {
        let page = self.slots.get_mut(index.0)?.take();
        if page.is_some() {
            self.vacant.push(index.0);
        }
        page
    }
    pub fn get(&self, index: PageIndex) -> Option<&Page> {
        self.slots.get(index.0)?.as_ref()
    }
    pub fn get_mut(&mut self, index: PageIndex) -> Option<&mut Page> {
        self.slots.get_mut(index.0)?.as_mut()
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.slots.iter_mut().flatten()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.slots.iter().flatten()
    }
}

/// A freshly placed sub-range.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placement {
    pub page: PageIndex,
    pub offset: u64,
    pub created_page: bool,
}

#[derive(Debug, Default)]
pub(crate) struct SizeClassPool {
    buckets: Vec<Option<Bucket>>,
    pub arena: PageArena,
}

impl SizeClassPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, choice: &BucketChoice) -> &mut Bucket {
        let index = choice.index as usize;
        if self.buckets.len() <= index {
            self.buckets.resize_with(index + 1, || None);
        }
        self.buckets[index].get_or_insert_with(|| Bucket {
            page_size: choice.page_size,
            pages: Vec::new(),
        })
    }

    pub fn bucket(&self, index: u32) -> Option<&Bucket> {
        self.buckets.get(index as usize)?.as_ref()
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter().flatten()
    }

    /// Retires completed ranges on every page of one bucket.
    pub fn retire_bucket(&mut self, index: u32, completed_fence: u64) {
        let Some(Some(bucket)) = self.buckets.get(index as usize) else {
            return;
        };
        for page_index in &bucket.pages {
            if let Some(page) = self.arena.get_mut(*page_index) {
                page.retire_pending(completed_fence);
            }
        }
    }

    /**
    Finds a page with room in the chosen bucket, creating one if needed, and bump-allocates.

    The new page is sized for the bucket, or exactly for the request when the request with
    worst-case padding would not fit a regular page.  Choices from [`bucket_for`] always fit
    (`page_size >= alloc_size >= size + alignment`), so oversized pages only come from
    choices built some other way.
    */
    pub fn place(
        &mut self,
        choice: &BucketChoice,
        size: u64,
        alignment: u64,
        device: &dyn MemoryDevice,
        label: &str,
    ) -> Result<Placement, MemoryError> {
        self.bucket_mut(choice);
        let SizeClassPool { buckets, arena } = self;
        let bucket = buckets[choice.index as usize]
            .as_mut()
            .expect("bucket was just created");
        for page_index in &bucket.pages {
            let page = arena
                .get_mut(*page_index)
                .expect("bucket refers to a live page");
            if let Ok(offset) = page.suballocate(size, alignment) {
                return Ok(Placement {
                    page: *page_index,
                    offset,
                    created_page: false,
                });
            }
        }

        let page_size = bucket.page_size;
        let worst_case = size + alignment;
        let (block_size, oversized) = if worst_case > page_size {
            (worst_case, true)
        } else {
            (page_size, false)
        };
        let block = device.create_upload_block(block_size, label)?;
        let mut page = Page::new(block, oversized);
        let offset = page
            .suballocate(size, alignment)
            .expect("a fresh page always fits the request it was sized for");
        let page_index = arena.insert(page);
        bucket.pages.push(page_index);
        logwise::info_sync!(
            "{label}: created page {page} of {bytes} bytes in bucket {bucket}",
            label = logwise::privacy::LogIt(label),
            page = logwise::privacy::LogIt(page_index.0),
            bytes = logwise::privacy::LogIt(block_size),
            bucket = logwise::privacy::LogIt(choice.index)
        );
        Ok(Placement {
            page: page_index,
            offset,
            created_page: true,
        })
    }

    /**
    Drops reclaimable pages, keeping up to `retain` regular pages per bucket.

    Returns the capacities of the dropped pages.
    */
    pub fn shrink(&mut self, retain: usize) -> Vec<u64> {
        let mut dropped = Vec::new();
        for bucket in self.buckets.iter_mut().flatten() {
            let mut kept_reclaimable = 0;
            let arena = &mut self.arena;
            bucket.pages.retain(|page_index| {
                let page = arena.get(*page_index).expect("bucket refers to a live page");
                if !page.is_reclaimable() {
                    return true;
                }
                if !page.is_oversized() && kept_reclaimable < retain {
                    kept_reclaimable += 1;
                    return true;
                }
                if let Some(page) = arena.remove(*page_index) {
                    dropped.push(page.capacity());
                }
                false
            });
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareDevice;

    #[test]
    fn bucket_rounding() {
        let config = AllocatorConfig::default();
        let c = bucket_for(2048, 16, &config).unwrap();
        assert_eq!(c.index, 0);
        assert_eq!(c.page_size, 64 * 1024);
        let c = bucket_for(4096, 16, &config).unwrap();
        assert_eq!(c.index, 1);
        assert_eq!(c.alloc_size, 8192);
        let c = bucket_for(100 * 1024, 256, &config).unwrap();
        assert_eq!(c.alloc_size, 128 * 1024);
        assert_eq!(c.index, 5);
    }

    #[test]
    fn bucket_rejects_bad_requests() {
        let config = AllocatorConfig::default();
        assert!(matches!(bucket_for(0, 16, &config), Err(MemoryError::ZeroSize)));
        assert!(matches!(
            bucket_for(16, 0, &config),
            Err(MemoryError::InvalidAlignment { alignment: 0 })
        ));
        assert!(matches!(
            bucket_for(16, 24, &config),
            Err(MemoryError::InvalidAlignment { alignment: 24 })
        ));
        assert!(matches!(
            bucket_for(u64::MAX, 16, &config),
            Err(MemoryError::TooLarge { .. })
        ));
    }

    #[test]
    fn arena_reuses_slots() {
        let device = SoftwareDevice::new();
        let mut arena = PageArena::default();
        let block = || device.create_upload_block(4096, "t").unwrap();
        let a = arena.insert(Page::new(block(), false));
        let b = arena.insert(Page::new(block(), false));
        assert_ne!(a, b);
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        let c = arena.insert(Page::new(block(), false));
        assert_eq!(a, c);
        assert!(arena.get(b).is_some());
    }

    #[test]
    fn place_grows_bucket_when_full() {
        let device = SoftwareDevice::new();
        let config = AllocatorConfig::default();
        let mut pool = SizeClassPool::new();
        let choice = bucket_for(32 * 1024, 16, &config).unwrap();
        assert_eq!(choice.page_size, 64 * 1024);
        let first = pool.place(&choice, 32 * 1024, 16, &device, "t").unwrap();
        let second = pool.place(&choice, 32 * 1024, 16, &device, "t").unwrap();
        let third = pool.place(&choice, 32 * 1024, 16, &device, "t").unwrap();
        assert!(first.created_page);
        assert!(!second.created_page);
        assert_eq!(first.page, second.page);
        assert!(third.created_page);
        assert_ne!(third.page, first.page);
        assert_eq!(pool.bucket(choice.index).unwrap().pages.len(), 2);
    }

    #[test]
    fn oversized_page_for_padded_request() {
        let device = SoftwareDevice::new();
        let mut pool = SizeClassPool::new();
        //a choice whose page is smaller than the padded request
        let choice = BucketChoice {
            index: 0,
            alloc_size: 4096,
            page_size: 4096,
        };
        let placed = pool.place(&choice, 4096, 256, &device, "t").unwrap();
        let page = pool.arena.get(placed.page).unwrap();
        assert!(page.is_oversized());
        assert_eq!(page.capacity(), 4096 + 256);

        //never retained, even when the bucket keeps a page
        pool.arena
            .get_mut(placed.page)
            .unwrap()
            .release(placed.offset, 4096, 1);
        pool.retire_bucket(choice.index, 1);
        assert_eq!(pool.shrink(1), vec![4096 + 256]);
        assert!(pool.bucket(choice.index).unwrap().pages.is_empty());
    }

    #[test]
    fn bucket_choices_fit_a_regular_page() {
        let config = AllocatorConfig::default();
        let device = SoftwareDevice::new();
        let mut pool = SizeClassPool::new();
        for (size, alignment) in [(1, 1), (4096, 4096), (60 * 1024, 4096), (1 << 20, 256)] {
            let choice = bucket_for(size, alignment, &config).unwrap();
            assert!(choice.page_size >= size + alignment);
            let placed = pool.place(&choice, size, alignment, &device, "t").unwrap();
            assert!(!pool.arena.get(placed.page).unwrap().is_oversized());
        }
    }
}
