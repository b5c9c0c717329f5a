/// Geometry pipeline - textured, depth-tested rotating cube
///
/// Owns its root signature, pipeline state, vertex/index buffers and optional
/// texture. Assets are uploaded once through the copy queue at construction;
/// afterwards the pipeline only updates the camera and records draw state.

use std::f32::consts::TAU;
use std::mem::size_of;
use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::config::GeometryPipelineDesc;
use crate::error::Result;
use crate::graphics_device::{
    AddressMode, BlendDesc, BufferFormat, CommandList, DepthStencilDesc, DescriptorHandle,
    DescriptorHeap, DescriptorRange, DescriptorRangeKind, Filter, GraphicsPipelineStateDesc,
    IndexBufferView, IndexType, InputElementDesc, PipelineState, PrimitiveTopology,
    PrimitiveTopologyType, RasterizerDesc, CullMode, ResourceDimension, ResourceFlags,
    ResourceState, RootParameter, RootSignature, RootSignatureDesc, ShaderDesc, ShaderStage,
    ShaderVisibility, StaticSamplerDesc, TextureFormat, VertexBufferView,
};
use crate::pipelines::{FrameContext, PipelineContext};
use crate::resource_util::{
    index_buffer_view, load_buffer_resource, load_texture_from_file, vertex_buffer_view, TrackedResource,
};

const SOURCE: &str = "diabolic::geometry_pipeline";

/// Entry point of both shader stages
pub const SHADER_ENTRY_POINT: &str = "main";

/// Root parameter holding the model-view-projection matrix
pub const MVP_ROOT_PARAMETER: u32 = 0;

/// Root parameter holding the texture descriptor table (textured pipelines only)
pub const TEXTURE_ROOT_PARAMETER: u32 = 1;

/// Slot of the texture view in the shader-visible heap
pub const TEXTURE_SRV_INDEX: u32 = 0;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

const fn vertex(position: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex { position, color, uv }
}

const RED: [f32; 3] = [1.0, 0.2, 0.2];
const GREEN: [f32; 3] = [0.2, 1.0, 0.2];
const BLUE: [f32; 3] = [0.2, 0.2, 1.0];
const YELLOW: [f32; 3] = [1.0, 1.0, 0.2];
const CYAN: [f32; 3] = [0.2, 1.0, 1.0];
const MAGENTA: [f32; 3] = [1.0, 0.2, 1.0];

/// Unit cube, four vertices per face, counter-clockwise seen from outside
pub const CUBE_VERTICES: [Vertex; 24] = [
    // +Z
    vertex([-1.0, -1.0, 1.0], RED, [0.0, 0.0]),
    vertex([1.0, -1.0, 1.0], RED, [1.0, 0.0]),
    vertex([1.0, 1.0, 1.0], RED, [1.0, 1.0]),
    vertex([-1.0, 1.0, 1.0], RED, [0.0, 1.0]),
    // -Z
    vertex([1.0, -1.0, -1.0], GREEN, [0.0, 0.0]),
    vertex([-1.0, -1.0, -1.0], GREEN, [1.0, 0.0]),
    vertex([-1.0, 1.0, -1.0], GREEN, [1.0, 1.0]),
    vertex([1.0, 1.0, -1.0], GREEN, [0.0, 1.0]),
    // +X
    vertex([1.0, -1.0, 1.0], BLUE, [0.0, 0.0]),
    vertex([1.0, -1.0, -1.0], BLUE, [1.0, 0.0]),
    vertex([1.0, 1.0, -1.0], BLUE, [1.0, 1.0]),
    vertex([1.0, 1.0, 1.0], BLUE, [0.0, 1.0]),
    // -X
    vertex([-1.0, -1.0, -1.0], YELLOW, [0.0, 0.0]),
    vertex([-1.0, -1.0, 1.0], YELLOW, [1.0, 0.0]),
    vertex([-1.0, 1.0, 1.0], YELLOW, [1.0, 1.0]),
    vertex([-1.0, 1.0, -1.0], YELLOW, [0.0, 1.0]),
    // +Y
    vertex([-1.0, 1.0, 1.0], CYAN, [0.0, 0.0]),
    vertex([1.0, 1.0, 1.0], CYAN, [1.0, 0.0]),
    vertex([1.0, 1.0, -1.0], CYAN, [1.0, 1.0]),
    vertex([-1.0, 1.0, -1.0], CYAN, [0.0, 1.0]),
    // -Y
    vertex([-1.0, -1.0, -1.0], MAGENTA, [0.0, 0.0]),
    vertex([1.0, -1.0, -1.0], MAGENTA, [1.0, 0.0]),
    vertex([1.0, -1.0, 1.0], MAGENTA, [1.0, 1.0]),
    vertex([-1.0, -1.0, 1.0], MAGENTA, [0.0, 1.0]),
];

const fn cube_indices() -> [u16; 36] {
    let mut indices = [0u16; 36];
    let mut face = 0;
    while face < 6 {
        let base = (face * 4) as u16;
        let i = face * 6;
        indices[i] = base;
        indices[i + 1] = base + 1;
        indices[i + 2] = base + 2;
        indices[i + 3] = base;
        indices[i + 4] = base + 2;
        indices[i + 5] = base + 3;
        face += 1;
    }
    indices
}

/// Two triangles per face
pub const CUBE_INDICES: [u16; 36] = cube_indices();

/// Vertex layout matching `Vertex`
pub const INPUT_LAYOUT: [InputElementDesc; 3] = [
    InputElementDesc {
        semantic_name: "POSITION",
        semantic_index: 0,
        format: BufferFormat::R32G32B32_SFLOAT,
        input_slot: 0,
        aligned_byte_offset: 0,
    },
    InputElementDesc {
        semantic_name: "COLOR",
        semantic_index: 0,
        format: BufferFormat::R32G32B32_SFLOAT,
        input_slot: 0,
        aligned_byte_offset: 12,
    },
    InputElementDesc {
        semantic_name: "TEXCOORD",
        semantic_index: 0,
        format: BufferFormat::R32G32_SFLOAT,
        input_slot: 0,
        aligned_byte_offset: 24,
    },
];

struct TextureBinding {
    texture: TrackedResource,
    heap: Arc<dyn DescriptorHeap>,
    srv: DescriptorHandle,
}

/// GPU buffers produced by `GeometryPipeline::initialize_assets`
pub struct GeometryAssets {
    vertex_buffer: TrackedResource,
    index_buffer: TrackedResource,
    texture: Option<TextureBinding>,
}

pub struct GeometryPipeline {
    root_signature: Arc<dyn RootSignature>,
    pipeline_state: Arc<dyn PipelineState>,
    assets: GeometryAssets,
    vertex_buffer_view: VertexBufferView,
    index_buffer_view: IndexBufferView,
    /// Rotation clock in seconds, wraps at `rotation_period`
    elapsed: f32,
    rotation_period: f32,
}

impl GeometryPipeline {
    /// Build the pipeline and upload its assets (blocks until the upload completes)
    pub fn new(ctx: &mut PipelineContext, desc: &GeometryPipelineDesc, rotation_period: f32) -> Result<Self> {
        let (root_signature, pipeline_state) = Self::create_pipeline(ctx, desc)?;
        let assets = Self::initialize_assets(ctx, desc.texture.as_deref())?;

        let vertex_buffer_view = vertex_buffer_view(assets.vertex_buffer.resource(), size_of::<Vertex>() as u32);
        let index_buffer_view = index_buffer_view(assets.index_buffer.resource(), IndexType::U16);

        crate::dbl_info!(
            SOURCE,
            "Geometry pipeline ready ({} indices, {})",
            index_buffer_view.index_count(),
            if assets.texture.is_some() { "textured" } else { "vertex colors" }
        );

        Ok(Self {
            root_signature,
            pipeline_state,
            assets,
            vertex_buffer_view,
            index_buffer_view,
            elapsed: 0.0,
            rotation_period,
        })
    }

    /// Build the root signature, compile both shaders and create the pipeline state
    pub fn create_pipeline(
        ctx: &PipelineContext,
        desc: &GeometryPipelineDesc,
    ) -> Result<(Arc<dyn RootSignature>, Arc<dyn PipelineState>)> {
        let root_signature = ctx.device.create_root_signature(&Self::root_signature_desc(desc.texture.is_some()))?;

        let vertex_shader = Self::compile_shader(ctx, &desc.vertex_shader, ShaderStage::Vertex)?;
        let pixel_shader = Self::compile_shader(ctx, &desc.pixel_shader, ShaderStage::Pixel)?;

        let pipeline_state = ctx.device.create_graphics_pipeline_state(&GraphicsPipelineStateDesc {
            root_signature: root_signature.clone(),
            vertex_shader,
            pixel_shader,
            input_layout: INPUT_LAYOUT.to_vec(),
            primitive_topology_type: PrimitiveTopologyType::Triangle,
            rasterizer: RasterizerDesc {
                cull_mode: CullMode::Back,
                front_counter_clockwise: true,
            },
            blend: BlendDesc::default(),
            depth_stencil: DepthStencilDesc::default(),
            rtv_formats: vec![ctx.render_target_format],
            dsv_format: Some(ctx.depth_format),
            sample_count: 1,
        })?;

        Ok((root_signature, pipeline_state))
    }

    /// Root constants for the MVP matrix, plus a texture table and sampler when textured
    pub fn root_signature_desc(textured: bool) -> RootSignatureDesc {
        let mut desc = RootSignatureDesc {
            parameters: vec![RootParameter::Constants {
                shader_register: 0,
                register_space: 0,
                num_32bit_values: 16,
                visibility: ShaderVisibility::Vertex,
            }],
            static_samplers: Vec::new(),
            allow_input_assembler_input_layout: true,
        };

        if textured {
            desc.parameters.push(RootParameter::DescriptorTable {
                ranges: vec![DescriptorRange {
                    kind: DescriptorRangeKind::Srv,
                    count: 1,
                    base_register: 0,
                    register_space: 0,
                }],
                visibility: ShaderVisibility::Pixel,
            });
            desc.static_samplers.push(StaticSamplerDesc {
                filter: Filter::Linear,
                address_mode: AddressMode::Wrap,
                shader_register: 1,
                register_space: 0,
                visibility: ShaderVisibility::Pixel,
            });
        }

        desc
    }

    fn compile_shader(
        ctx: &PipelineContext,
        path: &Path,
        stage: ShaderStage,
    ) -> Result<Arc<dyn crate::graphics_device::Shader>> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            crate::dbl_err!(SOURCE, AssetLoadFailed, "cannot read shader '{}': {}", path.display(), e)
        })?;
        let name = path.display().to_string();

        ctx.device.create_shader(&ShaderDesc {
            name: &name,
            source: &source,
            stage,
            entry_point: SHADER_ENTRY_POINT,
        })
    }

    /// Upload the cube (and texture) through the copy queue, then make them
    /// readable by the draw stages on the direct queue
    ///
    /// Blocks on both queues' fences before returning; staging resources are
    /// released afterwards.
    pub fn initialize_assets(ctx: &mut PipelineContext, texture: Option<&Path>) -> Result<GeometryAssets> {
        let mut copy_list = ctx.copy_queue.get_command_list()?;

        let vertices = load_buffer_resource(
            ctx.device.as_ref(),
            &mut *copy_list,
            CUBE_VERTICES.len(),
            size_of::<Vertex>(),
            Some(bytemuck::cast_slice(&CUBE_VERTICES)),
            ResourceFlags::empty(),
            "cube_vertices",
        )?;
        let indices = load_buffer_resource(
            ctx.device.as_ref(),
            &mut *copy_list,
            CUBE_INDICES.len(),
            size_of::<u16>(),
            Some(bytemuck::cast_slice(&CUBE_INDICES)),
            ResourceFlags::empty(),
            "cube_indices",
        )?;
        let texture = match texture {
            Some(path) => Some(load_texture_from_file(
                ctx.device.as_ref(),
                &mut *copy_list,
                ctx.srv_heap,
                TEXTURE_SRV_INDEX,
                path,
                TextureFormat::R8G8B8A8_UNORM,
                ResourceDimension::Texture2D,
            )?),
            None => None,
        };

        let copy_fence_value = ctx.copy_queue.execute_command_list(copy_list)?;
        ctx.copy_queue.wait_for_fence_value(copy_fence_value)?;

        let mut vertex_buffer = vertices.destination;
        let mut index_buffer = indices.destination;

        let mut direct_list = ctx.direct_queue.get_command_list()?;
        vertex_buffer.transition_to(&mut *direct_list, ResourceState::VertexAndConstantBuffer)?;
        index_buffer.transition_to(&mut *direct_list, ResourceState::IndexBuffer)?;
        let texture = match texture {
            Some(uploaded) => {
                let mut texture = uploaded.destination;
                texture.transition_to(&mut *direct_list, ResourceState::PixelShaderResource)?;
                Some(TextureBinding {
                    texture,
                    heap: ctx.srv_heap.clone(),
                    srv: DescriptorHandle::new(ctx.srv_heap, TEXTURE_SRV_INDEX)?,
                })
            }
            None => None,
        };
        let direct_fence_value = ctx.direct_queue.execute_command_list(direct_list)?;
        ctx.direct_queue.wait_for_fence_value(direct_fence_value)?;

        crate::dbl_debug!(SOURCE, "Cube assets uploaded (copy fence {}, direct fence {})",
            copy_fence_value, direct_fence_value);

        Ok(GeometryAssets {
            vertex_buffer,
            index_buffer,
            texture,
        })
    }

    /// Advance the rotation clock and rewrite the camera matrices
    ///
    /// Deterministic: the same sequence of `delta_time` values from the same
    /// starting state produces the same matrices. Negative deltas run the
    /// clock backwards; non-finite deltas leave it where it is.
    pub fn update(&mut self, delta_time: f32, camera: &mut Camera, aspect_ratio: f32) {
        if !delta_time.is_finite() {
            crate::dbl_trace!(SOURCE, "Ignoring non-finite frame delta {}", delta_time);
        }
        let angle = if self.rotation_period > 0.0 {
            if delta_time.is_finite() {
                self.elapsed = (self.elapsed + delta_time).rem_euclid(self.rotation_period);
                // rem_euclid can round up to the period itself for tiny negatives
                if self.elapsed >= self.rotation_period {
                    self.elapsed = 0.0;
                }
            }
            self.elapsed / self.rotation_period * TAU
        } else {
            0.0
        };

        let axis = Vec3::new(0.0, 1.0, 1.0).normalize();
        camera.set_model(Mat4::from_axis_angle(axis, angle));

        let position = camera.position();
        camera.set_view(Mat4::look_at_rh(position, position + camera.front(), camera.up()));
        camera.set_projection(Mat4::perspective_rh(camera.fov(), aspect_ratio, NEAR_PLANE, FAR_PLANE));
    }

    /// Record draw state and one indexed draw of the whole cube
    ///
    /// Render targets, viewport, scissor and barriers are recorded by the caller.
    pub fn populate_command_list(&self, command_list: &mut dyn CommandList, frame: &FrameContext) -> Result<()> {
        command_list.set_pipeline_state(&self.pipeline_state)?;
        command_list.set_graphics_root_signature(&self.root_signature)?;
        command_list.set_primitive_topology(PrimitiveTopology::TriangleList)?;
        command_list.set_vertex_buffers(0, std::slice::from_ref(&self.vertex_buffer_view))?;
        command_list.set_index_buffer(&self.index_buffer_view)?;

        if let Some(binding) = &self.assets.texture {
            command_list.set_descriptor_heaps(std::slice::from_ref(&binding.heap))?;
            command_list.set_graphics_root_descriptor_table(TEXTURE_ROOT_PARAMETER, &binding.srv)?;
        }

        let mvp = frame.camera.model_view_projection().to_cols_array();
        command_list.set_graphics_root_32bit_constants(MVP_ROOT_PARAMETER, bytemuck::cast_slice(&mvp), 0)?;

        command_list.draw_indexed_instanced(self.index_buffer_view.index_count(), 1, 0, 0, 0)
    }

    // ===== ACCESSORS =====

    pub fn vertex_buffer_view(&self) -> &VertexBufferView {
        &self.vertex_buffer_view
    }

    pub fn index_buffer_view(&self) -> &IndexBufferView {
        &self.index_buffer_view
    }

    pub fn is_textured(&self) -> bool {
        self.assets.texture.is_some()
    }

    /// Texture state as tracked by the pipeline
    pub fn texture_state(&self) -> Option<ResourceState> {
        self.assets.texture.as_ref().map(|binding| binding.texture.state())
    }

    pub fn buffer_states(&self) -> (ResourceState, ResourceState) {
        (self.assets.vertex_buffer.state(), self.assets.index_buffer.state())
    }

    /// Rotation clock in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
#[path = "geometry_pipeline_tests.rs"]
mod tests;
