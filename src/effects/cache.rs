// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Per-device pipeline cache.

Pipelines are realized at most once per (effect, shader variants, description) on each device.
Lookups take a shared lock; a miss takes the exclusive lock, checks again, and only then
builds, so concurrent constructors of the same effect agree on one pipeline.
*/

use crate::device::DeviceId;
use crate::effects::effect::{PipelineFactory, PipelineRequest};
use crate::effects::pipeline_state::PipelineStateDescription;
use crate::effects::EffectError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Identifies one realized pipeline on one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub effect: &'static str,
    pub vertex_shader: usize,
    pub pixel_shader: usize,
    pub description: PipelineStateDescription,
}

type DevicePipelines<P> = Arc<RwLock<HashMap<PipelineKey, P>>>;

/// Realized pipelines, grouped by device.
#[derive(Debug)]
pub struct EffectPipelinePool<P> {
    devices: Mutex<HashMap<DeviceId, DevicePipelines<P>>>,
}

impl<P> Default for EffectPipelinePool<P> {
    fn default() -> Self {
        EffectPipelinePool {
            devices: Mutex::new(HashMap::new()),
        }
    }
}

impl<P: Clone> EffectPipelinePool<P> {
    pub fn new() -> Self {
        Self::default()
    }

    fn device(&self, device: DeviceId) -> DevicePipelines<P> {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(device)
            .or_default()
            .clone()
    }

    /// The cached pipeline for `request`, building it with `factory` on first use.
    pub fn get_or_create<F>(&self, factory: &F, request: &PipelineRequest<'_>) -> Result<P, EffectError>
    where
        F: PipelineFactory<Pipeline = P>,
    {
        let key = PipelineKey {
            effect: request.effect,
            vertex_shader: request.selection.vertex_shader,
            pixel_shader: request.selection.pixel_shader,
            description: request.description.clone(),
        };
        let pipelines = self.device(request.device);
        if let Some(p) = pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(p.clone());
        }
        let mut pipelines = pipelines.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = pipelines.get(&key) {
            return Ok(p.clone());
        }
        let build = logwise::perfwarn_begin!("EffectPipelinePool::get_or_create build");
        let pipeline = factory
            .create_pipeline(request)
            .map_err(|e| EffectError::Pipeline(Box::new(e)))?;
        drop(build);
        logwise::info_sync!(
            "realized {effect} pipeline ({vs}, {ps}) on {device}",
            effect = logwise::privacy::LogIt(request.effect),
            vs = logwise::privacy::LogIt(request.selection.vertex_shader_name),
            ps = logwise::privacy::LogIt(request.selection.pixel_shader_name),
            device = logwise::privacy::LogIt(request.device)
        );
        pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Number of pipelines cached for `device`.
    pub fn pipeline_count(&self, device: DeviceId) -> usize {
        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&device)
            .map_or(0, |p| p.read().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Drops every pipeline of `device`.  Returns how many were dropped.
    pub fn release_device(&self, device: DeviceId) -> usize {
        let removed = self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&device);
        let count = removed.map_or(0, |p| p.read().unwrap_or_else(PoisonError::into_inner).len());
        if count > 0 {
            logwise::info_sync!(
                "released {count} pipelines of {device}",
                count = logwise::privacy::LogIt(count),
                device = logwise::privacy::LogIt(device)
            );
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::pipeline_state::{InputLayout, TargetFormat, VertexFormat};
    use crate::effects::{EffectFlags, catalog};
    use crate::software::SoftwarePipelineFactory;

    fn description() -> PipelineStateDescription {
        PipelineStateDescription::new(
            InputLayout::new().with_field("position", VertexFormat::F32x3),
            TargetFormat::Rgba8Unorm,
        )
    }

    #[test]
    fn builds_once_per_key() {
        let factory = SoftwarePipelineFactory::new();
        let pool = EffectPipelinePool::new();
        let selection = catalog::BASIC.select(EffectFlags::FOG).unwrap();
        let description = description();
        let request = PipelineRequest {
            device: factory.device_id(),
            effect: catalog::BASIC.name,
            selection: &selection,
            description: &description,
        };
        let a = pool.get_or_create(&factory, &request).unwrap();
        let b = pool.get_or_create(&factory, &request).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.builds(), 1);
        assert_eq!(pool.pipeline_count(factory.device_id()), 1);

        let wire = description.clone().with_wireframe(true);
        let request = PipelineRequest {
            description: &wire,
            ..request
        };
        pool.get_or_create(&factory, &request).unwrap();
        assert_eq!(factory.builds(), 2);

        assert_eq!(pool.release_device(factory.device_id()), 2);
        assert_eq!(pool.pipeline_count(factory.device_id()), 0);
    }
}
