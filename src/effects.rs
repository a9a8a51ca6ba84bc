// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Shader permutation selection and per-device pipeline caching.

An effect is a family of shader variants.  The caller describes what they want with
[`EffectFlags`]; the effect's [`EffectSchema`] turns the flags into a permutation number and
from there into one vertex and one pixel shader variant.  The resulting pipeline is realized
through a [`PipelineFactory`] and cached in an [`EffectPipelinePool`], so every distinct
permutation is built once per device.

```
use pages_and_permutations::effects::{
    catalog, Effect, EffectFlags, EffectPipelinePool, InputLayout, PipelineStateDescription,
    TargetFormat, VertexFormat,
};
use pages_and_permutations::software::SoftwarePipelineFactory;

let factory = SoftwarePipelineFactory::new();
let pool = EffectPipelinePool::new();
let layout = InputLayout::new()
    .with_field("position", VertexFormat::F32x3)
    .with_field("normal", VertexFormat::F32x3);
let description = PipelineStateDescription::new(layout, TargetFormat::Bgra8Unorm);

let flags = EffectFlags::PER_PIXEL_LIGHTING | EffectFlags::FOG;
let a = Effect::new(&catalog::BASIC, flags, description.clone(), &factory, &pool).unwrap();
let b = Effect::new(&catalog::BASIC, flags, description, &factory, &pool).unwrap();
assert_eq!(a.selection(), b.selection());
assert_eq!(factory.builds(), 1);
```
*/

pub mod catalog;
mod cache;
mod effect;
mod error;
mod flags;
mod permutation;
mod pipeline_state;

pub use cache::{EffectPipelinePool, PipelineKey};
pub use effect::{CommandList, Effect, PipelineFactory, PipelineRequest};
pub use error::EffectError;
pub use flags::{EffectFlags, LightingMode};
pub use permutation::{Condition, EffectSchema, ShaderSelection, Weight};
pub use pipeline_state::{
    BlendMode, CullMode, DepthFormat, DepthMode, InputLayout, PipelineStateDescription, StepMode,
    TargetFormat, Topology, VertexFormat,
};
