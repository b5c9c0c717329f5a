/// Renderer - device ownership, frame targets and the per-frame render loop
///
/// The renderer owns the device, both command queues, the swapchain, the
/// descriptor heaps and the depth buffer. Each frame is recorded on the direct
/// queue, presented, then fully waited on before the next one starts.

use std::sync::Arc;
use glam::Vec3;
use crate::camera::Camera;
use crate::command_queue::CommandQueue;
use crate::config::{RendererConfig, BACK_BUFFER_FORMAT, DEPTH_FORMAT, PRESENT_SYNC_INTERVAL};
use crate::error::Result;
use crate::graphics_device::{
    select_adapter, AdapterInfo, ClearValue, DescriptorHandle, DescriptorHeap, DescriptorHeapDesc,
    DescriptorHeapKind, GraphicsBackend, GraphicsDevice, HeapType, QueueKind, Rect, ResourceDesc,
    PresentStatus, ResourceFlags, ResourceState, Swapchain, SwapchainDesc, Viewport, Window,
};
use crate::pipelines::{FrameContext, GeometryPipeline, PipelineContext, UiPipeline};
use crate::resource_util::TrackedResource;

const SOURCE: &str = "diabolic::renderer";

const DEPTH_CLEAR_VALUE: f32 = 1.0;
const STENCIL_CLEAR_VALUE: u8 = 0;

// ===== STATE =====

/// Renderer lifecycle
///
/// `Uninitialized` and `InitializingResources` are passed through inside
/// `Renderer::new`, and `Destroyed` is entered by `Drop`, so a live renderer
/// always reports `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    InitializingResources,
    /// Accepting `render` and `resize_window` calls
    Ready,
    Destroyed,
}

/// Counters updated by the render loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub frames_rendered: u64,
    pub frame_waits: u64,
    pub depth_buffer_rebuilds: u64,
    /// Swapchains rebuilt after an out-of-date present
    pub swapchain_rebuilds: u64,
}

// ===== FRAME PACING =====

/// Waits between frames
pub trait FramePacer: Send {
    /// Block until the frame just submitted on `direct_queue` is done
    ///
    /// # Returns
    ///
    /// The back buffer index to render the next frame into
    fn wait_for_previous_frame(&mut self, direct_queue: &mut CommandQueue, swapchain: &dyn Swapchain) -> Result<u32>;
}

/// Signals the direct queue and waits for it: CPU and GPU never overlap
#[derive(Debug, Default)]
pub struct FullStallPacer;

impl FramePacer for FullStallPacer {
    fn wait_for_previous_frame(&mut self, direct_queue: &mut CommandQueue, swapchain: &dyn Swapchain) -> Result<u32> {
        let fence_value = direct_queue.signal()?;
        direct_queue.wait_for_fence_value(fence_value)?;
        Ok(swapchain.current_back_buffer_index())
    }
}

// ===== RENDERER =====

/// GPU objects created by `Renderer::initialize_resources`
struct DeviceResources {
    device: Arc<dyn GraphicsDevice>,
    direct_queue: CommandQueue,
    copy_queue: CommandQueue,
    swapchain: Box<dyn Swapchain>,
    rtv_heap: Arc<dyn DescriptorHeap>,
    dsv_heap: Arc<dyn DescriptorHeap>,
    srv_heap: Arc<dyn DescriptorHeap>,
    render_targets: Vec<TrackedResource>,
    render_target_views: Vec<DescriptorHandle>,
    depth_buffer: TrackedResource,
    depth_stencil_view: DescriptorHandle,
}

pub struct Renderer {
    // Dropped in declaration order: pipelines before the objects they were built from
    ui_pipeline: UiPipeline,
    geometry_pipeline: GeometryPipeline,
    pacer: Box<dyn FramePacer>,
    depth_stencil_view: DescriptorHandle,
    depth_buffer: TrackedResource,
    render_target_views: Vec<DescriptorHandle>,
    render_targets: Vec<TrackedResource>,
    srv_heap: Arc<dyn DescriptorHeap>,
    dsv_heap: Arc<dyn DescriptorHeap>,
    rtv_heap: Arc<dyn DescriptorHeap>,
    swapchain: Box<dyn Swapchain>,
    copy_queue: CommandQueue,
    direct_queue: CommandQueue,
    device: Arc<dyn GraphicsDevice>,

    camera: Camera,
    config: RendererConfig,
    width: u32,
    height: u32,
    aspect_ratio: f32,
    viewport: Viewport,
    scissor_rect: Rect,
    frame_index: u32,
    state: RendererState,
    stats: RendererStats,
}

impl Renderer {
    /// Create the device, frame targets and pipelines for `window`
    ///
    /// Blocks until the geometry pipeline's assets are resident on the GPU.
    ///
    /// # Errors
    ///
    /// * `InitializationFailed` - no usable adapter, or device/swapchain creation failed
    /// * `AssetLoadFailed` - a shader or the texture could not be loaded
    pub fn new(backend: &dyn GraphicsBackend, window: &dyn Window, config: RendererConfig) -> Result<Self> {
        let width = window.width().max(1);
        let height = window.height().max(1);
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::Y, config.field_of_view);

        crate::dbl_debug!(
            SOURCE,
            "{:?} -> {:?} ({} backend, {}x{})",
            RendererState::Uninitialized,
            RendererState::InitializingResources,
            backend.name(),
            width,
            height
        );
        let mut resources = Self::initialize_resources(backend, window, &config, width, height)?;

        let mut ctx = PipelineContext {
            device: &resources.device,
            direct_queue: &mut resources.direct_queue,
            copy_queue: &mut resources.copy_queue,
            srv_heap: &resources.srv_heap,
            render_target_format: resources.swapchain.format(),
            depth_format: DEPTH_FORMAT,
        };
        let geometry_pipeline = GeometryPipeline::new(&mut ctx, &config.geometry, config.rotation_period)?;
        let ui_pipeline = UiPipeline::new(&ctx)?;

        let frame_index = resources.swapchain.current_back_buffer_index();

        crate::dbl_info!(
            SOURCE,
            "Renderer ready on '{}' ({}x{}, {} back buffers)",
            resources.device.adapter().name,
            width,
            height,
            resources.swapchain.buffer_count()
        );

        Ok(Self {
            ui_pipeline,
            geometry_pipeline,
            pacer: Box::new(FullStallPacer),
            depth_stencil_view: resources.depth_stencil_view,
            depth_buffer: resources.depth_buffer,
            render_target_views: resources.render_target_views,
            render_targets: resources.render_targets,
            srv_heap: resources.srv_heap,
            dsv_heap: resources.dsv_heap,
            rtv_heap: resources.rtv_heap,
            swapchain: resources.swapchain,
            copy_queue: resources.copy_queue,
            direct_queue: resources.direct_queue,
            device: resources.device,
            camera,
            config,
            width,
            height,
            aspect_ratio: width as f32 / height as f32,
            viewport: Viewport::new(width, height),
            scissor_rect: Rect::from_size(width, height),
            frame_index,
            state: RendererState::Ready,
            stats: RendererStats::default(),
        })
    }

    /// Select an adapter and create every device-level object the frame loop needs
    fn initialize_resources(
        backend: &dyn GraphicsBackend,
        window: &dyn Window,
        config: &RendererConfig,
        width: u32,
        height: u32,
    ) -> Result<DeviceResources> {
        let adapters = backend.enumerate_adapters()?;
        for adapter in &adapters {
            crate::dbl_debug!(SOURCE, "Adapter {}: '{}' ({:?})", adapter.index, adapter.name, adapter.kind);
        }
        let adapter = select_adapter(&adapters, config.use_warp_device, config.prefer_high_performance)
            .map_err(|e| crate::dbl_err!(SOURCE, InitializationFailed, "adapter selection failed: {}", e))?;
        crate::dbl_info!(SOURCE, "Using adapter '{}' ({:?})", adapter.name, adapter.kind);

        let device = backend.create_device(&adapter, window)?;
        let direct_queue = CommandQueue::new(device.clone(), QueueKind::Direct)?;
        let copy_queue = CommandQueue::new(device.clone(), QueueKind::Copy)?;

        let swapchain = device.create_swapchain(
            direct_queue.queue(),
            window,
            &SwapchainDesc {
                width,
                height,
                buffer_count: config.frame_count,
                format: BACK_BUFFER_FORMAT,
            },
        )?;

        let rtv_heap = device.create_descriptor_heap(&DescriptorHeapDesc {
            kind: DescriptorHeapKind::Rtv,
            capacity: swapchain.buffer_count(),
            shader_visible: false,
        })?;
        let dsv_heap = device.create_descriptor_heap(&DescriptorHeapDesc {
            kind: DescriptorHeapKind::Dsv,
            capacity: 1,
            shader_visible: false,
        })?;
        let srv_heap = device.create_descriptor_heap(&DescriptorHeapDesc {
            kind: DescriptorHeapKind::CbvSrvUav,
            capacity: config.srv_heap_capacity,
            shader_visible: true,
        })?;

        let render_targets = Self::create_render_targets(swapchain.as_ref(), &rtv_heap)?;
        let render_target_views = (0..swapchain.buffer_count())
            .map(|index| DescriptorHandle::new(&rtv_heap, index))
            .collect::<Result<Vec<_>>>()?;

        let depth_buffer = Self::create_depth_buffer(device.as_ref(), &dsv_heap, width, height)?;
        let depth_stencil_view = DescriptorHandle::new(&dsv_heap, 0)?;

        Ok(DeviceResources {
            device,
            direct_queue,
            copy_queue,
            swapchain,
            rtv_heap,
            dsv_heap,
            srv_heap,
            render_targets,
            render_target_views,
            depth_buffer,
            depth_stencil_view,
        })
    }

    /// One render target view per back buffer, back buffers tracked in `Present`
    fn create_render_targets(
        swapchain: &dyn Swapchain,
        rtv_heap: &Arc<dyn DescriptorHeap>,
    ) -> Result<Vec<TrackedResource>> {
        (0..swapchain.buffer_count())
            .map(|index| {
                let buffer = swapchain.buffer(index)?;
                rtv_heap.create_render_target_view(index, &buffer)?;
                Ok(TrackedResource::new(buffer, ResourceState::Present))
            })
            .collect()
    }

    /// Depth buffer sized to the window, with its view in DSV slot 0
    fn create_depth_buffer(
        device: &dyn GraphicsDevice,
        dsv_heap: &Arc<dyn DescriptorHeap>,
        width: u32,
        height: u32,
    ) -> Result<TrackedResource> {
        let depth_buffer = device.create_committed_resource(
            HeapType::Default,
            &ResourceDesc::texture_2d(width, height, DEPTH_FORMAT, ResourceFlags::ALLOW_DEPTH_STENCIL),
            ResourceState::DepthWrite,
            Some(ClearValue::DepthStencil {
                depth: DEPTH_CLEAR_VALUE,
                stencil: STENCIL_CLEAR_VALUE,
            }),
            "depth_buffer",
        )?;
        dsv_heap.create_depth_stencil_view(0, &depth_buffer)?;

        crate::dbl_debug!(SOURCE, "Depth buffer created ({}x{})", width, height);
        Ok(TrackedResource::new(depth_buffer, ResourceState::DepthWrite))
    }

    /// Record, submit and present one frame, then wait for it to finish
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Seconds since the previous frame, drives the cube rotation
    pub fn render(&mut self, delta_time: f32) -> Result<()> {
        let index = self.frame_index as usize;
        let mut command_list = self.direct_queue.get_command_list()?;

        self.render_targets[index].transition_to(&mut *command_list, ResourceState::RenderTarget)?;

        let render_target_view = &self.render_target_views[index];
        command_list.set_render_targets(
            std::slice::from_ref(render_target_view),
            Some(&self.depth_stencil_view),
        )?;
        command_list.clear_render_target_view(render_target_view, self.config.clear_color)?;
        command_list.clear_depth_stencil_view(&self.depth_stencil_view, DEPTH_CLEAR_VALUE, STENCIL_CLEAR_VALUE)?;
        command_list.set_viewports(&[self.viewport])?;
        command_list.set_scissor_rects(&[self.scissor_rect])?;

        self.geometry_pipeline.update(delta_time, &mut self.camera, self.aspect_ratio);

        let frame = FrameContext {
            frame_index: self.frame_index,
            viewport: self.viewport,
            scissor_rect: self.scissor_rect,
            render_target_view,
            depth_stencil_view: &self.depth_stencil_view,
            camera: &self.camera,
        };
        self.geometry_pipeline.populate_command_list(&mut *command_list, &frame)?;
        self.ui_pipeline.populate_command_list(&mut *command_list, &frame)?;

        self.render_targets[index].transition_to(&mut *command_list, ResourceState::Present)?;

        self.direct_queue.execute_command_list(command_list)?;
        let status = self.swapchain.present(PRESENT_SYNC_INTERVAL)?;
        self.stats.frames_rendered += 1;

        if status == PresentStatus::OutOfDate {
            crate::dbl_debug!(SOURCE, "Swapchain out of date, rebuilding at {}x{}", self.width, self.height);
            self.rebuild_swapchain()?;
            self.stats.swapchain_rebuilds += 1;
        }

        self.wait_for_previous_frame()
    }

    /// Block until the GPU has finished the last submitted frame and pick up
    /// the next back buffer index
    pub fn wait_for_previous_frame(&mut self) -> Result<()> {
        self.frame_index = self
            .pacer
            .wait_for_previous_frame(&mut self.direct_queue, self.swapchain.as_ref())?;
        self.stats.frame_waits += 1;
        Ok(())
    }

    /// Follow a window size change
    ///
    /// Sizes are clamped to at least 1x1. Unchanged sizes are ignored; otherwise
    /// the GPU is drained, the back buffers are resized and the depth buffer is
    /// rebuilt.
    pub fn resize_window(&mut self, width: u32, height: u32) -> Result<()> {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            crate::dbl_trace!(SOURCE, "Resize to the current size {}x{} ignored", width, height);
            return Ok(());
        }

        crate::dbl_info!(SOURCE, "Resizing {}x{} -> {}x{}", self.width, self.height, width, height);

        self.width = width;
        self.height = height;
        self.aspect_ratio = width as f32 / height as f32;
        self.viewport = Viewport::new(width, height);
        self.scissor_rect = Rect::from_size(width, height);

        self.rebuild_swapchain()?;

        self.depth_buffer = Self::create_depth_buffer(self.device.as_ref(), &self.dsv_heap, width, height)?;
        self.stats.depth_buffer_rebuilds += 1;

        Ok(())
    }

    /// Drain both queues and recreate the back buffers and their views at the
    /// current size
    fn rebuild_swapchain(&mut self) -> Result<()> {
        self.direct_queue.flush()?;
        self.copy_queue.flush()?;

        self.render_targets.clear();
        self.swapchain.resize_buffers(self.width, self.height)?;
        self.render_targets = Self::create_render_targets(self.swapchain.as_ref(), &self.rtv_heap)?;
        self.frame_index = self.swapchain.current_back_buffer_index();
        Ok(())
    }

    // ===== ACCESSORS =====

    /// `Ready` for as long as the renderer can be called
    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scissor_rect(&self) -> Rect {
        self.scissor_rect
    }

    /// Back buffer the next frame renders into
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn adapter(&self) -> &AdapterInfo {
        self.device.adapter()
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Current depth buffer dimensions
    pub fn depth_buffer_size(&self) -> (u32, u32) {
        let desc = self.depth_buffer.resource().desc();
        (desc.width as u32, desc.height)
    }

    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    pub fn geometry_pipeline(&self) -> &GeometryPipeline {
        &self.geometry_pipeline
    }

    /// Shader-visible heap handed to the pipelines
    pub fn srv_heap(&self) -> &Arc<dyn DescriptorHeap> {
        &self.srv_heap
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        for queue in [&mut self.direct_queue, &mut self.copy_queue] {
            if let Err(e) = queue.flush() {
                crate::dbl_error!(SOURCE, "Failed to drain the {:?} queue: {}", queue.kind(), e);
            }
        }
        self.state = RendererState::Destroyed;
        crate::dbl_debug!(SOURCE, "Renderer destroyed after {} frames", self.stats.frames_rendered);
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
