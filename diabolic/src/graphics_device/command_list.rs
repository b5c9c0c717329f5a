/// Command allocators, command lists and the state they record

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    DescriptorHandle, DescriptorHeap, IndexType, PipelineState, QueueKind, Resource,
    ResourceState, RootSignature, TextureFormat,
};

/// Backing memory for command recording
///
/// Must not be reset while a list recorded from it is still executing on the GPU.
pub trait CommandAllocator: Send + Sync {
    fn kind(&self) -> QueueKind;

    /// Reclaim all memory used by lists recorded from this allocator
    fn reset(&mut self) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Viewport in render target pixels (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with depth range 0..1
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle (right/bottom exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width as i32,
            bottom: height as i32,
        }
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

/// Resource barrier
#[derive(Clone)]
pub enum ResourceBarrier {
    Transition {
        resource: Arc<dyn Resource>,
        before: ResourceState,
        after: ResourceState,
    },
}

impl ResourceBarrier {
    pub fn transition(resource: &Arc<dyn Resource>, before: ResourceState, after: ResourceState) -> Self {
        ResourceBarrier::Transition {
            resource: resource.clone(),
            before,
            after,
        }
    }
}

/// Vertex buffer binding
#[derive(Clone)]
pub struct VertexBufferView {
    pub resource: Arc<dyn Resource>,
    pub size_in_bytes: u32,
    pub stride_in_bytes: u32,
}

/// Index buffer binding
#[derive(Clone)]
pub struct IndexBufferView {
    pub resource: Arc<dyn Resource>,
    pub size_in_bytes: u32,
    pub format: IndexType,
}

impl IndexBufferView {
    pub fn index_count(&self) -> u32 {
        self.size_in_bytes / self.format.size_in_bytes()
    }
}

/// Layout of texel rows inside a buffer, used for buffer-to-texture copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopyLayout {
    /// Byte offset of the first row in the buffer
    pub offset: u64,
    /// Byte distance between rows, a multiple of `TEXTURE_DATA_PITCH_ALIGNMENT`
    pub row_pitch: u32,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Row pitch alignment of texture data in staging buffers
pub const TEXTURE_DATA_PITCH_ALIGNMENT: u32 = 256;

impl TextureCopyLayout {
    /// Tightly packed rows padded to the pitch alignment
    pub fn for_texture(width: u32, height: u32, format: TextureFormat) -> Self {
        let unpadded = width * format.bytes_per_pixel();
        let row_pitch = unpadded.div_ceil(TEXTURE_DATA_PITCH_ALIGNMENT) * TEXTURE_DATA_PITCH_ALIGNMENT;
        Self {
            offset: 0,
            row_pitch,
            width,
            height,
            format,
        }
    }

    /// Bytes the layout spans in the buffer
    pub fn total_size(&self) -> u64 {
        self.offset + self.row_pitch as u64 * self.height as u64
    }
}

/// Recorded sequence of GPU commands, submitted as a unit to a queue
///
/// Lists are created open. Recording after `close` fails; `reset` reopens the list
/// against an allocator that is not in use by the GPU.
pub trait CommandList: Send {
    fn kind(&self) -> QueueKind;

    /// Reopen the list for recording, backed by `allocator`
    fn reset(&mut self, allocator: &dyn CommandAllocator) -> Result<()>;

    /// Finish recording
    fn close(&mut self) -> Result<()>;

    fn is_recording(&self) -> bool;

    fn resource_barrier(&mut self, barriers: &[ResourceBarrier]) -> Result<()>;

    /// Copy `size` bytes between buffers
    fn copy_buffer_region(
        &mut self,
        dst: &Arc<dyn Resource>,
        dst_offset: u64,
        src: &Arc<dyn Resource>,
        src_offset: u64,
        size: u64,
    ) -> Result<()>;

    /// Copy texel rows from a buffer into mip 0 of a 2D texture
    fn copy_texture_region(
        &mut self,
        dst: &Arc<dyn Resource>,
        src: &Arc<dyn Resource>,
        src_layout: &TextureCopyLayout,
    ) -> Result<()>;

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()>;

    fn set_graphics_root_signature(&mut self, root_signature: &Arc<dyn RootSignature>) -> Result<()>;

    /// Bind shader-visible heaps for subsequent descriptor tables
    fn set_descriptor_heaps(&mut self, heaps: &[Arc<dyn DescriptorHeap>]) -> Result<()>;

    fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<()>;

    fn set_scissor_rects(&mut self, rects: &[Rect]) -> Result<()>;

    fn set_render_targets(
        &mut self,
        render_targets: &[DescriptorHandle],
        depth_stencil: Option<&DescriptorHandle>,
    ) -> Result<()>;

    /// Clear a bound render target
    fn clear_render_target_view(&mut self, render_target: &DescriptorHandle, color: [f32; 4]) -> Result<()>;

    /// Clear a bound depth stencil target
    fn clear_depth_stencil_view(
        &mut self,
        depth_stencil: &DescriptorHandle,
        depth: f32,
        stencil: u8,
    ) -> Result<()>;

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()>;

    fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]) -> Result<()>;

    fn set_index_buffer(&mut self, view: &IndexBufferView) -> Result<()>;

    /// Write 32-bit root constants
    ///
    /// # Arguments
    ///
    /// * `root_parameter_index` - Index of a `RootParameter::Constants` slot
    /// * `data` - Values to write
    /// * `dest_offset` - Offset in 32-bit values inside the slot
    fn set_graphics_root_32bit_constants(
        &mut self,
        root_parameter_index: u32,
        data: &[u32],
        dest_offset: u32,
    ) -> Result<()>;

    /// Point a `RootParameter::DescriptorTable` slot at a range of a bound heap
    fn set_graphics_root_descriptor_table(
        &mut self,
        root_parameter_index: u32,
        base_descriptor: &DescriptorHandle,
    ) -> Result<()>;

    fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
