// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Effect handles and the pipeline-creation seam.

use crate::device::DeviceId;
use crate::effects::cache::EffectPipelinePool;
use crate::effects::permutation::{EffectSchema, ShaderSelection};
use crate::effects::pipeline_state::PipelineStateDescription;
use crate::effects::{EffectError, EffectFlags};

/// Everything a factory needs to build one pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineRequest<'a> {
    pub device: DeviceId,
    pub effect: &'static str,
    pub selection: &'a ShaderSelection,
    pub description: &'a PipelineStateDescription,
}

/// Builds pipelines for one device.
pub trait PipelineFactory {
    type Pipeline: Clone + Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    fn device_id(&self) -> DeviceId;
    fn create_pipeline(&self, request: &PipelineRequest<'_>) -> Result<Self::Pipeline, Self::Error>;
}

/// Something pipelines can be bound on, e.g. a render pass.
pub trait CommandList<P> {
    fn set_pipeline_state(&mut self, pipeline: &P);
}

/**
One effect instance: a schema, the flags it was built with, and the pipeline they select.

Construction fails right away when the flags are outside what the schema supports.
*/
#[derive(Debug, Clone)]
pub struct Effect<P> {
    schema: &'static EffectSchema,
    flags: EffectFlags,
    selection: ShaderSelection,
    description: PipelineStateDescription,
    device: DeviceId,
    pipeline: P,
}

impl<P: Clone> Effect<P> {
    pub fn new<F>(
        schema: &'static EffectSchema,
        flags: EffectFlags,
        description: PipelineStateDescription,
        factory: &F,
        pool: &EffectPipelinePool<P>,
    ) -> Result<Self, EffectError>
    where
        F: PipelineFactory<Pipeline = P>,
    {
        let selection = schema.select(flags)?;
        let device = factory.device_id();
        let pipeline = pool.get_or_create(
            factory,
            &PipelineRequest {
                device,
                effect: schema.name,
                selection: &selection,
                description: &description,
            },
        )?;
        Ok(Effect {
            schema,
            flags,
            selection,
            description,
            device,
            pipeline,
        })
    }

    pub fn schema(&self) -> &'static EffectSchema {
        self.schema
    }
    pub fn flags(&self) -> EffectFlags {
        self.flags
    }
    pub fn selection(&self) -> &ShaderSelection {
        &self.selection
    }
    pub fn description(&self) -> &PipelineStateDescription {
        &self.description
    }
    pub fn device_id(&self) -> DeviceId {
        self.device
    }
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Binds the effect's pipeline.
    pub fn apply(&self, commands: &mut impl CommandList<P>) {
        commands.set_pipeline_state(&self.pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::catalog;
    use crate::effects::pipeline_state::{InputLayout, TargetFormat, VertexFormat};
    use crate::software::{SoftwarePipeline, SoftwarePipelineFactory};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder(Vec<Arc<SoftwarePipeline>>);

    impl CommandList<Arc<SoftwarePipeline>> for Recorder {
        fn set_pipeline_state(&mut self, pipeline: &Arc<SoftwarePipeline>) {
            self.0.push(pipeline.clone());
        }
    }

    #[test]
    fn apply_binds_selected_pipeline() {
        let factory = SoftwarePipelineFactory::new();
        let pool = EffectPipelinePool::new();
        let description = PipelineStateDescription::new(
            InputLayout::new().with_field("position", VertexFormat::F32x3),
            TargetFormat::Rgba8Unorm,
        );
        let effect = Effect::new(
            &catalog::DUAL_TEXTURE,
            EffectFlags::TEXTURE | EffectFlags::VERTEX_COLOR,
            description,
            &factory,
            &pool,
        )
        .unwrap();
        assert_eq!(effect.selection().vertex_shader_name, "vs_dual_texture_vc_no_fog");

        let mut recorder = Recorder::default();
        effect.apply(&mut recorder);
        assert_eq!(recorder.0.len(), 1);
        assert_eq!(recorder.0[0].vertex_shader, "vs_dual_texture_vc_no_fog");
        assert_eq!(recorder.0[0].pixel_shader, "ps_dual_texture_no_fog");
    }
}
