/// Render pipelines driven by the renderer
///
/// Pipelines never see the renderer itself. They receive a `PipelineContext` at
/// construction and a `FrameContext` every frame, holding only what they read.

pub mod geometry_pipeline;
pub mod ui_pipeline;

pub use geometry_pipeline::*;
pub use ui_pipeline::*;

use std::sync::Arc;
use crate::camera::Camera;
use crate::command_queue::CommandQueue;
use crate::graphics_device::{DescriptorHandle, DescriptorHeap, GraphicsDevice, Rect, TextureFormat, Viewport};

/// Renderer state available while a pipeline is built
pub struct PipelineContext<'a> {
    pub device: &'a Arc<dyn GraphicsDevice>,
    pub direct_queue: &'a mut CommandQueue,
    pub copy_queue: &'a mut CommandQueue,
    /// Shader-visible heap for texture views
    pub srv_heap: &'a Arc<dyn DescriptorHeap>,
    pub render_target_format: TextureFormat,
    pub depth_format: TextureFormat,
}

/// Renderer state available while a frame is recorded
pub struct FrameContext<'a> {
    pub frame_index: u32,
    pub viewport: Viewport,
    pub scissor_rect: Rect,
    pub render_target_view: &'a DescriptorHandle,
    pub depth_stencil_view: &'a DescriptorHandle,
    pub camera: &'a Camera,
}
