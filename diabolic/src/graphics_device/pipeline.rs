/// Shaders, root signatures and pipeline state objects

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{BufferFormat, TextureFormat};

// ===== SHADERS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// Shader source handed to the backend compiler
#[derive(Debug, Clone, Copy)]
pub struct ShaderDesc<'a> {
    /// Debug name (usually the source path)
    pub name: &'a str,
    pub source: &'a str,
    pub stage: ShaderStage,
    pub entry_point: &'a str,
}

/// Compiled shader bytecode
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn entry_point(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

// ===== ROOT SIGNATURE =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Pixel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorRangeKind {
    Srv,
    Cbv,
    Uav,
}

/// Contiguous range of descriptors inside a descriptor table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorRange {
    pub kind: DescriptorRangeKind,
    pub count: u32,
    pub base_register: u32,
    pub register_space: u32,
}

/// One slot of a root signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootParameter {
    /// Inline 32-bit constants
    Constants {
        shader_register: u32,
        register_space: u32,
        num_32bit_values: u32,
        visibility: ShaderVisibility,
    },
    /// Descriptor ranges resolved against the bound shader-visible heap
    DescriptorTable {
        ranges: Vec<DescriptorRange>,
        visibility: ShaderVisibility,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Point,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap,
    Mirror,
    Clamp,
}

/// Sampler baked into the root signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSamplerDesc {
    pub filter: Filter,
    pub address_mode: AddressMode,
    pub shader_register: u32,
    pub register_space: u32,
    pub visibility: ShaderVisibility,
}

/// Registers are shared between resource kinds: a sampler and a texture in the
/// same space must use different registers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootSignatureDesc {
    pub parameters: Vec<RootParameter>,
    pub static_samplers: Vec<StaticSamplerDesc>,
    pub allow_input_assembler_input_layout: bool,
}

impl RootSignatureDesc {
    /// Offset in bytes of a constants slot among all constants slots
    pub fn constants_offset(&self, root_parameter_index: u32) -> Option<u32> {
        let mut offset = 0;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if let RootParameter::Constants { num_32bit_values, .. } = parameter {
                if index as u32 == root_parameter_index {
                    return Some(offset);
                }
                offset += num_32bit_values * 4;
            }
        }
        None
    }
}

pub trait RootSignature: Send + Sync {
    fn desc(&self) -> &RootSignatureDesc;

    fn as_any(&self) -> &dyn Any;
}

// ===== PIPELINE STATE =====

/// Vertex attribute; attribute locations follow the element order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputElementDesc {
    pub semantic_name: &'static str,
    pub semantic_index: u32,
    pub format: BufferFormat,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopologyType {
    Point,
    Line,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerDesc {
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_counter_clockwise: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write: bool,
    pub depth_func: ComparisonFunc,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        Self {
            depth_enable: true,
            depth_write: true,
            depth_func: ComparisonFunc::Less,
        }
    }
}

/// Standard alpha blending when enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendDesc {
    pub blend_enable: bool,
}

/// Full description of a graphics pipeline
#[derive(Clone)]
pub struct GraphicsPipelineStateDesc {
    pub root_signature: Arc<dyn RootSignature>,
    pub vertex_shader: Arc<dyn Shader>,
    pub pixel_shader: Arc<dyn Shader>,
    pub input_layout: Vec<InputElementDesc>,
    pub primitive_topology_type: PrimitiveTopologyType,
    pub rasterizer: RasterizerDesc,
    pub blend: BlendDesc,
    pub depth_stencil: DepthStencilDesc,
    pub rtv_formats: Vec<TextureFormat>,
    pub dsv_format: Option<TextureFormat>,
    pub sample_count: u32,
}

/// Immutable compiled pipeline
pub trait PipelineState: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}
