// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! pages_and_permutations is GPU middleware for the two jobs every renderer repeats each frame:
handing out small pieces of upload memory, and picking the right shader variant.

| Concern             | Type                                   | Strategy                                                        |
|---------------------|----------------------------------------|-----------------------------------------------------------------|
| Upload memory       | [`memory::GraphicsMemory`]             | Bump allocation out of size-classed pages, fence-tracked reuse  |
| Ownership           | [`memory::GraphicsResource`]           | Move-only handle, range released on drop                        |
| Shared ownership    | [`memory::SharedGraphicsResource`]     | Reference counted, released with the last owner                 |
| Shader variants     | [`effects::EffectSchema`]              | Flags → permutation → vertex/pixel shader tables                |
| Pipelines           | [`effects::EffectPipelinePool`]        | One realized pipeline per permutation and device                |

# Memory

Per-frame data (constants, dynamic vertices, skinning palettes) is short-lived and small.
Creating a GPU buffer for each piece is far too slow, so [`memory::GraphicsMemory`] carves
them out of large CPU-writable pages instead.  Requests are bucketed by
`next_pow2(size + alignment)`; each bucket owns pages of one size, and each page is a bump
allocator.

The GPU may still be reading last frame's data while the CPU writes this frame's.  A dropped
handle therefore does not free its range immediately: the range is tagged with the fence
value the next [`memory::GraphicsMemory::commit`] will signal, and only once that fence is
reached can the page be reused.

# Effects

An effect is a family of shaders.  Callers ask for features with [`effects::EffectFlags`]
(fog, lighting model, texture, vertex colors, skinning, ...) and the effect's schema maps them
to exactly one vertex and one pixel shader variant.  Unsupported combinations fail at
construction instead of silently rendering something else.

# Backends

The crate talks to the GPU only through the small contracts in [`device`] and
[`effects::PipelineFactory`].  Two backends implement them:

* [`software`], host memory with manually completed fences.  Always available, and what the
  tests use.
* `wgpu` (feature `backend_wgpu`, on by default, native targets), built on
  [wgpu](https://wgpu.rs), so we inherit its broad support for DX12, Vulkan and Metal.

```
use pages_and_permutations::memory::{GraphicsMemory, MemoryRegistry};
use pages_and_permutations::software::{SoftwareDevice, SoftwareQueue};
use std::sync::Arc;

let registry = MemoryRegistry::new();
let memory = GraphicsMemory::new(Arc::new(SoftwareDevice::new()), &registry).unwrap();
let queue = SoftwareQueue::new();

for _frame in 0..3 {
    let mut vertices = memory.allocate(3 * 12, 16).unwrap();
    vertices.write(0, &[0u8; 36]);
    //record draws that read `vertices` ...
    drop(vertices);
    memory.commit(&queue);
    queue.complete_all();
}
memory.garbage_collect();
assert_eq!(memory.statistics().committed_memory, 0);
```
*/

mod bittricks;
pub mod device;
pub mod effects;
mod imp;
pub mod memory;

pub use imp::software;
#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
pub use imp::wgpu;
