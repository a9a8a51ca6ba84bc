// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::DeviceId;
use crate::device::MemoryDevice;
use crate::effects::{
    BlendMode, CommandList, CullMode, DepthFormat, DepthMode, PipelineFactory, PipelineRequest,
    StepMode, TargetFormat, Topology, VertexFormat,
};
use crate::imp::wgpu::Error;
use crate::imp::wgpu::bound_device::WgpuDevice;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use wgpu::{
    BlendComponent, BlendFactor, BlendOperation, BlendState, ColorTargetState, ColorWrites,
    CompareFunction, DepthStencilState, Face, FrontFace, MultisampleState, PolygonMode,
    PrimitiveState, PrimitiveTopology, RenderPipeline, RenderPipelineDescriptor,
    ShaderModuleDescriptor, ShaderSource, StencilState, TextureFormat, VertexAttribute,
    VertexBufferLayout, VertexState, VertexStepMode,
};

/**
Builds effect pipelines with wgpu.

Every effect needs one WGSL module, registered with [`WgpuPipelineFactory::with_source`], that
defines one entry point per shader variant, named after the variant.  Pipelines use layouts
derived from the shaders.
*/
#[derive(Debug)]
pub struct WgpuPipelineFactory {
    device: WgpuDevice,
    sources: HashMap<&'static str, Cow<'static, str>>,
    modules: Mutex<HashMap<&'static str, wgpu::ShaderModule>>,
}

impl WgpuPipelineFactory {
    pub fn new(device: WgpuDevice) -> Self {
        WgpuPipelineFactory {
            device,
            sources: HashMap::new(),
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Registers the WGSL for `effect` (an [`crate::effects::EffectSchema::name`]).
    pub fn with_source(mut self, effect: &'static str, wgsl: impl Into<Cow<'static, str>>) -> Self {
        self.sources.insert(effect, wgsl.into());
        self
    }

    fn module(&self, effect: &'static str) -> Result<wgpu::ShaderModule, Error> {
        let mut modules = self.modules.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(module) = modules.get(effect) {
            return Ok(module.clone());
        }
        let source = self
            .sources
            .get(effect)
            .ok_or(Error::MissingShaderSource(effect))?;
        let module = self.device.device().create_shader_module(ShaderModuleDescriptor {
            label: Some(effect),
            source: ShaderSource::Wgsl(source.clone()),
        });
        modules.insert(effect, module.clone());
        Ok(module)
    }
}

fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::F32 => wgpu::VertexFormat::Float32,
        VertexFormat::F32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::F32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::F32x4 => wgpu::VertexFormat::Float32x4,
        VertexFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
        VertexFormat::Uint8x4 => wgpu::VertexFormat::Uint8x4,
    }
}

fn target_format(format: TargetFormat) -> TextureFormat {
    match format {
        TargetFormat::Rgba8Unorm => TextureFormat::Rgba8Unorm,
        TargetFormat::Rgba8UnormSrgb => TextureFormat::Rgba8UnormSrgb,
        TargetFormat::Bgra8Unorm => TextureFormat::Bgra8Unorm,
        TargetFormat::Bgra8UnormSrgb => TextureFormat::Bgra8UnormSrgb,
        TargetFormat::Rgba16Float => TextureFormat::Rgba16Float,
    }
}

fn depth_format(format: DepthFormat) -> TextureFormat {
    match format {
        DepthFormat::Depth16Unorm => TextureFormat::Depth16Unorm,
        DepthFormat::Depth24Plus => TextureFormat::Depth24Plus,
        DepthFormat::Depth32Float => TextureFormat::Depth32Float,
    }
}

fn blend_state(blend: BlendMode) -> Option<BlendState> {
    match blend {
        BlendMode::Opaque => None,
        BlendMode::AlphaBlend => Some(BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        BlendMode::NonPremultiplied => Some(BlendState::ALPHA_BLENDING),
        BlendMode::Additive => {
            let additive = BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            };
            Some(BlendState {
                color: additive,
                alpha: additive,
            })
        }
    }
}

fn topology(topology: Topology) -> PrimitiveTopology {
    match topology {
        Topology::PointList => PrimitiveTopology::PointList,
        Topology::LineList => PrimitiveTopology::LineList,
        Topology::LineStrip => PrimitiveTopology::LineStrip,
        Topology::TriangleList => PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => PrimitiveTopology::TriangleStrip,
    }
}

impl PipelineFactory for WgpuPipelineFactory {
    type Pipeline = RenderPipeline;
    type Error = Error;

    fn device_id(&self) -> DeviceId {
        self.device.id()
    }

    fn create_pipeline(&self, request: &PipelineRequest<'_>) -> Result<RenderPipeline, Error> {
        let description = request.description;
        if description.wireframe
            && !self
                .device
                .device()
                .features()
                .contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            return Err(Error::MissingFeature("POLYGON_MODE_LINE"));
        }
        let module = self.module(request.effect)?;

        //locations continue across buffers
        let mut location = 0;
        let attributes: Vec<Vec<VertexAttribute>> = description
            .input_layouts
            .iter()
            .map(|layout| {
                layout
                    .attributes()
                    .map(|(_, format, offset)| {
                        let attribute = VertexAttribute {
                            format: vertex_format(format),
                            offset,
                            shader_location: location,
                        };
                        location += 1;
                        attribute
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<VertexBufferLayout> = description
            .input_layouts
            .iter()
            .zip(&attributes)
            .map(|(layout, attributes)| VertexBufferLayout {
                array_stride: layout.element_stride(),
                step_mode: match layout.step_mode() {
                    StepMode::Vertex => VertexStepMode::Vertex,
                    StepMode::Instance => VertexStepMode::Instance,
                },
                attributes,
            })
            .collect();

        let primitive_state = PrimitiveState {
            topology: topology(description.topology),
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: match description.cull {
                CullMode::None => None,
                CullMode::Clockwise => Some(Face::Back),
                CullMode::CounterClockwise => Some(Face::Front),
            },
            unclipped_depth: false,
            polygon_mode: if description.wireframe {
                PolygonMode::Line
            } else {
                PolygonMode::Fill
            },
            conservative: false,
        };

        let depth_state = description.effective_depth_format().map(|format| {
            let (depth_write_enabled, depth_compare) = match description.depth {
                DepthMode::Default => (true, CompareFunction::LessEqual),
                DepthMode::Read => (false, CompareFunction::LessEqual),
                DepthMode::ReverseZ => (true, CompareFunction::GreaterEqual),
                DepthMode::None => (false, CompareFunction::Always),
            };
            DepthStencilState {
                format: depth_format(format),
                depth_write_enabled,
                depth_compare,
                stencil: StencilState::default(),
                bias: Default::default(),
            }
        });

        let targets = [Some(ColorTargetState {
            format: target_format(description.color_format),
            blend: blend_state(description.blend),
            write_mask: ColorWrites::ALL,
        })];
        let label = format!(
            "{} {}/{}",
            request.effect,
            request.selection.vertex_shader_name,
            request.selection.pixel_shader_name
        );
        let render_descriptor = RenderPipelineDescriptor {
            label: Some(&label),
            layout: None,
            vertex: VertexState {
                module: &module,
                entry_point: Some(request.selection.vertex_shader_name),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            primitive: primitive_state,
            depth_stencil: depth_state,
            multisample: MultisampleState {
                count: description.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(request.selection.pixel_shader_name),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            multiview: None,
            cache: None,
        };
        let pipeline = self.device.device().create_render_pipeline(&render_descriptor);
        logwise::trace_sync!(
            "Created render pipeline {label}",
            label = logwise::privacy::LogIt(&label)
        );
        Ok(pipeline)
    }
}

impl CommandList<RenderPipeline> for wgpu::RenderPass<'_> {
    fn set_pipeline_state(&mut self, pipeline: &RenderPipeline) {
        self.set_pipeline(pipeline);
    }
}
