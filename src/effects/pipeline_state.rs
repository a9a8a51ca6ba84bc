// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Fixed-function state that, together with the shader variants, identifies one pipeline.
//!
//! Descriptions are plain values with `Hash + Eq`, so they can be part of a cache key.
//!
//! # Example
//!
//! ```
//! use pages_and_permutations::effects::{
//!     BlendMode, InputLayout, PipelineStateDescription, TargetFormat, VertexFormat,
//! };
//!
//! let mut layout = InputLayout::new();
//! layout.add_field("position", VertexFormat::F32x3);
//! layout.add_field("normal", VertexFormat::F32x3);
//! layout.add_field("texcoord", VertexFormat::F32x2);
//! assert_eq!(layout.element_stride(), 32);
//!
//! let description = PipelineStateDescription::new(layout, TargetFormat::Bgra8UnormSrgb)
//!     .with_blend(BlendMode::AlphaBlend);
//! assert_eq!(description.blend, BlendMode::AlphaBlend);
//! ```

/// Describes the layout of one vertex buffer.
///
/// Fields are listed in memory order; shader locations are assigned in the same order,
/// continuing across the buffers of a [`PipelineStateDescription`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputLayout {
    pub(crate) fields: Vec<VertexField>,
    pub(crate) step_mode: StepMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VertexField {
    pub(crate) name: &'static str,
    pub(crate) format: VertexFormat,
}

/// Whether a buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepMode {
    #[default]
    Vertex,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum VertexFormat {
    F32,
    F32x2,
    F32x3,
    F32x4,
    /// Four normalized bytes, e.g. a packed color.
    Unorm8x4,
    /// Four integer bytes, e.g. bone indices.
    Uint8x4,
}

impl VertexFormat {
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::F32 => 4,
            VertexFormat::F32x2 => 8,
            VertexFormat::F32x3 => 12,
            VertexFormat::F32x4 => 16,
            VertexFormat::Unorm8x4 | VertexFormat::Uint8x4 => 4,
        }
    }
}

impl InputLayout {
    /// An empty per-vertex layout.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            step_mode: StepMode::Vertex,
        }
    }

    /// An empty per-instance layout.
    pub fn per_instance() -> Self {
        Self {
            fields: Vec::new(),
            step_mode: StepMode::Instance,
        }
    }

    pub fn add_field(&mut self, name: &'static str, format: VertexFormat) {
        self.fields.push(VertexField { name, format });
    }

    pub fn with_field(mut self, name: &'static str, format: VertexFormat) -> Self {
        self.add_field(name, format);
        self
    }

    pub fn element_stride(&self) -> u64 {
        self.fields.iter().map(|f| f.format.size()).sum()
    }

    pub fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    /// `(name, format, byte offset)` of each field.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, VertexFormat, u64)> + '_ {
        self.fields.iter().scan(0, |offset, field| {
            let here = *offset;
            *offset += field.format.size();
            Some((field.name, field.format, here))
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for InputLayout {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Premultiplied alpha.
    AlphaBlend,
    Additive,
    NonPremultiplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthMode {
    /// No depth test, no depth write.
    None,
    /// Less-equal test with writes.
    #[default]
    Default,
    /// Less-equal test without writes.
    Read,
    /// Greater-equal test with writes.
    ReverseZ,
}

/// Which winding gets culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Clockwise,
    #[default]
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TargetFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DepthFormat {
    Depth16Unorm,
    Depth24Plus,
    Depth32Float,
}

/// Everything except the shaders that a pipeline is built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineStateDescription {
    pub input_layouts: Vec<InputLayout>,
    pub blend: BlendMode,
    pub depth: DepthMode,
    pub cull: CullMode,
    pub wireframe: bool,
    pub topology: Topology,
    pub color_format: TargetFormat,
    /// Ignored when `depth` is [`DepthMode::None`].
    pub depth_format: Option<DepthFormat>,
    pub sample_count: u32,
}

impl PipelineStateDescription {
    /// Opaque, depth-tested, back-face culled triangles with one vertex buffer.
    pub fn new(layout: InputLayout, color_format: TargetFormat) -> Self {
        PipelineStateDescription {
            input_layouts: vec![layout],
            blend: BlendMode::default(),
            depth: DepthMode::default(),
            cull: CullMode::default(),
            wireframe: false,
            topology: Topology::default(),
            color_format,
            depth_format: Some(DepthFormat::Depth32Float),
            sample_count: 1,
        }
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
    pub fn with_depth(mut self, depth: DepthMode, format: Option<DepthFormat>) -> Self {
        self.depth = depth;
        self.depth_format = format;
        self
    }
    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }
    /// Adds a per-instance buffer after the existing ones.
    pub fn with_instance_layout(mut self, layout: InputLayout) -> Self {
        debug_assert_eq!(layout.step_mode, StepMode::Instance);
        self.input_layouts.push(layout);
        self
    }

    /// The depth format actually in use, if any.
    pub fn effective_depth_format(&self) -> Option<DepthFormat> {
        match self.depth {
            DepthMode::None => None,
            _ => self.depth_format,
        }
    }
}
