// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
End-to-end allocator behaviour against the software backend.

The software queue only completes fences when told to, so every test controls exactly when
the "GPU" finishes with a frame.
*/

use pages_and_permutations::device::MemoryDevice;
use pages_and_permutations::memory::{
    AllocatorConfig, DeviceAllocator, GraphicsMemory, GraphicsResource, MemoryError,
    MemoryRegistry, bucket_for,
};
use pages_and_permutations::software::{SoftwareBlock, SoftwareDevice, SoftwareQueue};
use std::sync::Arc;

fn memory() -> (GraphicsMemory, Arc<SoftwareDevice>) {
    let device = Arc::new(SoftwareDevice::new());
    let memory = GraphicsMemory::new(device.clone(), &MemoryRegistry::new()).unwrap();
    (memory, device)
}

fn range(r: &GraphicsResource) -> (u64, u64) {
    (r.gpu_address(), r.gpu_address() + r.size())
}

fn overlaps(a: (u64, u64), b: (u64, u64)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

#[test]
fn scenario_a_two_small_allocations_share_a_page() {
    let (memory, _device) = memory();
    let a = memory.allocate(256, 16).unwrap();
    let b = memory.allocate(256, 16).unwrap();
    assert_eq!(a.page_index(), b.page_index());
    assert!(b.offset() >= a.offset() + 256);
    assert_eq!(memory.statistics().total_pages, 1);
}

#[test]
fn scenario_b_full_page_adds_exactly_one_page() {
    let (memory, _device) = memory();
    let config = AllocatorConfig::default();
    let choice = bucket_for(2048, 16, &config).unwrap();
    assert_eq!(choice.page_size, 64 * 1024);

    let first = memory.allocate(2048, 16).unwrap();
    let mut handles = vec![first];
    while handles.len() < 32 {
        handles.push(memory.allocate(2048, 16).unwrap());
    }
    let page = handles[0].page_index();
    assert!(handles.iter().all(|h| h.page_index() == page));
    assert_eq!(memory.statistics().total_pages, 1);

    let overflow = memory.allocate(2048, 16).unwrap();
    assert_ne!(overflow.page_index(), page);
    assert_eq!(memory.statistics().total_pages, 2);
    assert_eq!(memory.allocator().bucket_page_count(choice.index), 2);
}

#[test]
fn scenario_c_released_page_is_collected() {
    let device = Arc::new(SoftwareDevice::new());
    let config = AllocatorConfig {
        retained_pages_per_bucket: 0,
        ..AllocatorConfig::default()
    };
    let memory = GraphicsMemory::with_config(device.clone(), config, &MemoryRegistry::new()).unwrap();
    let queue = SoftwareQueue::new();

    let baseline = device.bytes_in_use();
    let handle = memory.allocate(1000, 16).unwrap();
    let page = handle.page_index();
    assert!(device.bytes_in_use() > baseline);
    drop(handle);

    let info = memory.allocator().page_info(page).unwrap();
    assert_eq!(info.live_allocations, 0);
    assert_eq!(info.pending_ranges, 1);

    memory.commit(&queue);
    queue.complete_all();
    let collected = memory.garbage_collect();
    assert_eq!(collected.pages_released, 1);
    assert!(memory.allocator().page_info(page).is_none());
    assert_eq!(device.bytes_in_use(), baseline);
    assert_eq!(memory.statistics().total_memory, 0);
}

#[test]
fn scenario_d_oversized_request_fails_cleanly() {
    let (memory, device) = memory();
    let before = memory.statistics();
    let err = memory.allocate(3 * 1024 * 1024 * 1024, 16).unwrap_err();
    assert!(matches!(err, MemoryError::TooLarge { .. }));
    assert_eq!(memory.statistics().total_pages, before.total_pages);
    assert_eq!(device.blocks_created(), 0);
}

#[test]
fn device_out_of_memory_is_reported() {
    let device = Arc::new(SoftwareDevice::with_budget(64 * 1024));
    let memory = GraphicsMemory::new(device.clone(), &MemoryRegistry::new()).unwrap();
    let _a = memory.allocate(40 * 1024, 16).unwrap();
    let err = memory.allocate(40 * 1024, 16).unwrap_err();
    assert!(matches!(err, MemoryError::OutOfMemory(_)));
    assert_eq!(memory.statistics().total_pages, 1);
}

#[test]
fn invalid_arguments_are_rejected() {
    let (memory, _device) = memory();
    assert!(matches!(memory.allocate(0, 16), Err(MemoryError::ZeroSize)));
    assert!(matches!(
        memory.allocate(16, 3),
        Err(MemoryError::InvalidAlignment { alignment: 3 })
    ));
}

/// A range is never handed out again before the fence it was released under completes.
#[test]
fn p1_no_torn_reuse() {
    let (memory, _device) = memory();
    let queue = SoftwareQueue::new();
    //ranges released but whose fence has not completed, by fence value
    let mut in_flight: Vec<((u64, u64), u64)> = Vec::new();
    let mut live: Vec<GraphicsResource> = Vec::new();
    let mut next_fence = 1;

    for frame in 0..40u64 {
        for i in 0..6u64 {
            let size = 64 + ((frame * 7 + i * 13) % 5) * 700;
            let handle = memory.allocate(size, 16 << (i % 3)).unwrap();
            let fresh = range(&handle);
            for (old, fence) in &in_flight {
                assert!(
                    !overlaps(fresh, *old),
                    "frame {frame}: {fresh:?} reuses {old:?} before fence {fence} completed"
                );
            }
            live.push(handle);
        }
        //release about half of what is live, and everything now and then so pages reset
        let keep = if frame % 10 == 9 { 0 } else { live.len() / 2 };
        for handle in live.drain(keep..) {
            in_flight.push((range(&handle), next_fence));
        }
        let signaled = memory.commit(&queue);
        assert_eq!(signaled, next_fence);
        next_fence += 1;
        //the GPU runs two frames behind
        if frame % 2 == 1 {
            let completed = queue.complete_next().unwrap();
            in_flight.retain(|(_, fence)| *fence > completed);
        }
    }
}

/// Same inputs, same bucket.
#[test]
fn p2_bucket_determinism() {
    let config = AllocatorConfig::default();
    for size in [1u64, 15, 16, 255, 4096, 4097, 65_535, 1 << 20, (1 << 20) + 1] {
        for alignment in [1u64, 4, 16, 256, 4096] {
            let a = bucket_for(size, alignment, &config).unwrap();
            let b = bucket_for(size, alignment, &config).unwrap();
            assert_eq!(a, b);
            assert!(a.alloc_size >= size + alignment);
            assert!(a.alloc_size.is_power_of_two());
        }
    }
}

#[test]
fn p3_alignment_contract() {
    let (memory, _device) = memory();
    let mut handles = Vec::new();
    for (i, alignment) in [1u64, 2, 8, 16, 64, 256, 1024, 4096, 65_536].iter().enumerate() {
        for size in [1u64, 3, 100, 5000] {
            let handle = memory.allocate(size + i as u64, *alignment).unwrap();
            assert_eq!(handle.gpu_address() % alignment, 0, "alignment {alignment}");
            assert!(handle.size() >= size);
            assert_eq!(handle.memory().len() as u64, handle.size());
            handles.push(handle);
        }
    }
    //no two live handles overlap
    let mut ranges: Vec<_> = handles.iter().map(range).collect();
    ranges.sort();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0);
    }
}

#[test]
fn p6_peaks_monotonic_until_reset() {
    let (memory, _device) = memory();
    let queue = SoftwareQueue::immediate();
    let mut last = memory.statistics();
    for round in 0..5 {
        let handles: Vec<_> = (0..round * 3 + 1)
            .map(|_| memory.allocate(10_000, 256).unwrap())
            .collect();
        let now = memory.statistics();
        assert!(now.peak_committed_memory >= last.peak_committed_memory);
        assert!(now.peak_total_memory >= last.peak_total_memory);
        assert!(now.peak_total_pages >= last.peak_total_pages);
        assert!(now.peak_committed_memory >= now.committed_memory);
        drop(handles);
        memory.commit(&queue);
        memory.garbage_collect();
        let after = memory.statistics();
        assert!(after.peak_total_pages >= now.peak_total_pages);
        last = after;
    }
    memory.reset_statistics();
    let reset = memory.statistics();
    assert_eq!(reset.peak_committed_memory, reset.committed_memory);
    assert_eq!(reset.peak_total_memory, reset.total_memory);
    assert_eq!(reset.peak_total_pages, reset.total_pages);
}

#[test]
fn peaks_include_direct_allocator_use() {
    let (memory, _device) = memory();
    drop(memory.allocator().alloc(5000, 16).unwrap());
    let stats = memory.statistics();
    assert_eq!(stats.committed_memory, 0);
    assert_eq!(stats.peak_committed_memory, 5000);
}

#[test]
fn shared_resource_released_with_last_owner() {
    let (memory, _device) = memory();
    let shared = memory.allocate(512, 16).unwrap().into_shared();
    let mut second = shared.clone();
    assert_eq!(shared.use_count(), 2);
    assert_eq!(memory.statistics().committed_memory, 512);
    second.reset();
    assert!(second.is_empty());
    assert_eq!(second.use_count(), 0);
    assert_eq!(memory.statistics().committed_memory, 512);
    drop(shared);
    assert_eq!(memory.statistics().committed_memory, 0);
}

#[test]
fn empty_handles_are_inert() {
    let mut handle = GraphicsResource::default();
    assert!(handle.is_empty());
    handle.reset();
    drop(handle);
    let shared = GraphicsResource::empty().into_shared();
    assert!(shared.is_empty());
    assert_eq!(shared.use_count(), 0);
}

#[test]
#[should_panic(expected = "GraphicsResource is empty")]
fn empty_handle_access_panics() {
    GraphicsResource::default().gpu_address();
}

#[test]
fn writes_land_in_the_block_and_are_flushed() {
    let (memory, _device) = memory();
    let mut handle = memory.allocate(64, 16).unwrap();
    handle.write(8, &[1, 2, 3, 4]);
    assert_eq!(&handle.memory()[8..12], &[1, 2, 3, 4]);
    let block = handle.block().clone();
    let block = block.as_any().downcast_ref::<SoftwareBlock>().unwrap();
    assert_eq!(block.flushed_bytes(), 4);

    handle.memory_mut()[0] = 9;
    handle.flush();
    assert_eq!(block.flushed_bytes(), 4 + 64);

    let constant = memory.allocate_constant(&[1.0f32, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(constant.gpu_address() % 256, 0);
    assert_eq!(&constant.memory()[..4], &1.0f32.to_ne_bytes());
}

#[test]
fn page_resets_after_frame_completes() {
    let (memory, _device) = memory();
    let queue = SoftwareQueue::new();
    let a = memory.allocate(100, 16).unwrap();
    let page = a.page_index();
    let start = a.offset();
    drop(a);
    memory.commit(&queue);
    queue.complete_all();
    let b = memory.allocate(100, 16).unwrap();
    assert_eq!(b.page_index(), page);
    assert_eq!(b.offset(), start);
    assert_eq!(memory.allocator().page_info(page).unwrap().cursor, start + 100);
}

#[test]
fn concurrent_allocation_never_overlaps() {
    let device: Arc<dyn MemoryDevice> = Arc::new(SoftwareDevice::new());
    let allocator = DeviceAllocator::new(device, AllocatorConfig::default()).unwrap();
    let queue = SoftwareQueue::new();
    let per_thread: Vec<Vec<(u64, u64)>> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4u8)
            .map(|t| {
                let allocator = allocator.clone();
                scope.spawn(move || {
                    let mut kept = Vec::new();
                    let mut ranges = Vec::new();
                    for i in 0..200u64 {
                        let mut handle = allocator.alloc(32 + (i % 7) * 48, 16).unwrap();
                        let len = handle.size() as usize;
                        handle.write(0, &vec![t; len]);
                        if i % 3 == 0 {
                            ranges.push(range(&handle));
                            kept.push(handle);
                        }
                    }
                    //each thread still sees its own bytes
                    for handle in &kept {
                        assert!(handle.memory().iter().all(|b| *b == t));
                    }
                    ranges
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    let mut all: Vec<_> = per_thread.into_iter().flatten().collect();
    all.sort();
    for pair in all.windows(2) {
        assert!(!overlaps(pair[0], pair[1]));
    }
    allocator.kick_fences(&queue);
    queue.complete_all();
    assert_eq!(allocator.statistics().committed_memory, 0);
}
