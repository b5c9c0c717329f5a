//! Mock graphics device for unit tests (no GPU required)
//!
//! Every trait of the graphics device module is implemented in memory. Commands
//! are recorded as strings, submitted batches and created resources are tracked
//! in a shared `MockGpu`, and fences either complete as soon as they are
//! signaled or stay pending until the test releases them.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use crate::error::{Error, Result};
use crate::graphics_device::*;

// ============================================================================
// Shared GPU state
// ============================================================================

/// Command list contents as seen by a queue
#[derive(Debug, Clone)]
pub struct ExecutedBatch {
    pub queue: QueueKind,
    pub commands: Vec<String>,
}

/// Record of a `create_committed_resource` call
#[derive(Debug, Clone)]
pub struct CreatedResource {
    pub name: String,
    pub desc: ResourceDesc,
    pub heap_type: HeapType,
    pub initial_state: ResourceState,
}

/// State shared by every mock object of one device
pub struct MockGpu {
    auto_complete: AtomicBool,
    pending_signals: Mutex<VecDeque<(Arc<MockFenceState>, u64)>>,
    executed: Mutex<Vec<ExecutedBatch>>,
    resources: Mutex<Vec<CreatedResource>>,
    pub allocators_created: AtomicUsize,
    pub allocator_resets: AtomicUsize,
    pub command_lists_created: AtomicUsize,
    pub shaders_created: AtomicUsize,
    pub presents: AtomicUsize,
    pub fail_present: AtomicBool,
    /// Number of upcoming presents reported as out of date
    pub out_of_date_presents: AtomicUsize,
    pub swapchain_resizes: AtomicUsize,
    pub fail_execute: AtomicBool,
    next_id: AtomicU64,
}

impl MockGpu {
    /// GPU whose fences complete as soon as they are signaled
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            auto_complete: AtomicBool::new(true),
            pending_signals: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
            resources: Mutex::new(Vec::new()),
            allocators_created: AtomicUsize::new(0),
            allocator_resets: AtomicUsize::new(0),
            command_lists_created: AtomicUsize::new(0),
            shaders_created: AtomicUsize::new(0),
            presents: AtomicUsize::new(0),
            fail_present: AtomicBool::new(false),
            out_of_date_presents: AtomicUsize::new(0),
            swapchain_resizes: AtomicUsize::new(0),
            fail_execute: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        })
    }

    /// When false, signals stay pending until `complete_next` / `complete_pending`
    pub fn set_auto_complete(&self, enabled: bool) {
        self.auto_complete.store(enabled, Ordering::SeqCst);
    }

    /// Complete the oldest pending signal; false if none was pending
    pub fn complete_next(&self) -> bool {
        let next = self.pending_signals.lock().unwrap().pop_front();
        match next {
            Some((fence, value)) => {
                fence.complete(value);
                true
            }
            None => false,
        }
    }

    /// Complete every pending signal in submission order
    pub fn complete_pending(&self) -> usize {
        let mut count = 0;
        while self.complete_next() {
            count += 1;
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending_signals.lock().unwrap().len()
    }

    pub fn executed(&self) -> Vec<ExecutedBatch> {
        self.executed.lock().unwrap().clone()
    }

    /// All executed commands of one queue kind, in submission order
    pub fn executed_commands(&self, queue: QueueKind) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|batch| batch.queue == queue)
            .flat_map(|batch| batch.commands.iter().cloned())
            .collect()
    }

    pub fn clear_executed(&self) {
        self.executed.lock().unwrap().clear();
    }

    pub fn resources(&self) -> Vec<CreatedResource> {
        self.resources.lock().unwrap().clone()
    }

    pub fn resources_named(&self, name: &str) -> Vec<CreatedResource> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

// ============================================================================
// Fence
// ============================================================================

pub struct MockFenceState {
    value: Mutex<u64>,
    signaled: Condvar,
    pub waits: AtomicUsize,
}

impl MockFenceState {
    fn complete(&self, value: u64) {
        let mut current = self.value.lock().unwrap();
        if value > *current {
            *current = value;
        }
        self.signaled.notify_all();
    }
}

pub struct MockFence {
    pub state: Arc<MockFenceState>,
}

impl MockFence {
    pub fn new(initial_value: u64) -> Self {
        Self {
            state: Arc::new(MockFenceState {
                value: Mutex::new(initial_value),
                signaled: Condvar::new(),
                waits: AtomicUsize::new(0),
            }),
        }
    }
}

impl Fence for MockFence {
    fn completed_value(&self) -> Result<u64> {
        Ok(*self.state.value.lock().unwrap())
    }

    fn wait(&self, value: u64) -> Result<()> {
        self.state.waits.fetch_add(1, Ordering::SeqCst);
        let mut current = self.state.value.lock().unwrap();
        while *current < value {
            current = self.state.signaled.wait(current).unwrap();
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Queue
// ============================================================================

pub struct MockQueue {
    kind: QueueKind,
    gpu: Arc<MockGpu>,
}

impl GpuQueue for MockQueue {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn execute_command_lists(&self, lists: &[&dyn CommandList]) -> Result<()> {
        if self.gpu.fail_execute.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock execute failure".to_string()));
        }
        for list in lists {
            let mock = list
                .as_any()
                .downcast_ref::<MockCommandList>()
                .ok_or_else(|| Error::BackendError("foreign command list".to_string()))?;
            if mock.recording {
                return Err(Error::BackendError(
                    "command list must be closed before execution".to_string(),
                ));
            }
            if mock.kind != self.kind {
                return Err(Error::BackendError(format!(
                    "{:?} command list submitted to a {:?} queue",
                    mock.kind, self.kind
                )));
            }
            self.gpu.executed.lock().unwrap().push(ExecutedBatch {
                queue: self.kind,
                commands: mock.commands.clone(),
            });
        }
        Ok(())
    }

    fn signal(&self, fence: &dyn Fence, value: u64) -> Result<()> {
        let mock = fence
            .as_any()
            .downcast_ref::<MockFence>()
            .ok_or_else(|| Error::BackendError("foreign fence".to_string()))?;
        if self.gpu.auto_complete.load(Ordering::SeqCst) {
            mock.state.complete(value);
        } else {
            self.gpu
                .pending_signals
                .lock()
                .unwrap()
                .push_back((mock.state.clone(), value));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Command allocator / command list
// ============================================================================

pub struct MockCommandAllocator {
    pub id: u64,
    kind: QueueKind,
    gpu: Arc<MockGpu>,
    pub resets: usize,
}

impl CommandAllocator for MockCommandAllocator {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn reset(&mut self) -> Result<()> {
        self.resets += 1;
        self.gpu.allocator_resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockCommandList {
    kind: QueueKind,
    recording: bool,
    pub allocator_id: u64,
    pub commands: Vec<String>,
}

impl MockCommandList {
    fn record(&mut self, command: String) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError(format!(
                "cannot record '{}' into a closed command list",
                command
            )));
        }
        self.commands.push(command);
        Ok(())
    }
}

fn handle_label(handle: &DescriptorHandle) -> String {
    format!("{:?}#{}", handle.heap().desc().kind, handle.index())
}

impl CommandList for MockCommandList {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn reset(&mut self, allocator: &dyn CommandAllocator) -> Result<()> {
        if self.recording {
            return Err(Error::BackendError("reset of an open command list".to_string()));
        }
        let allocator = allocator
            .as_any()
            .downcast_ref::<MockCommandAllocator>()
            .ok_or_else(|| Error::BackendError("foreign command allocator".to_string()))?;
        self.allocator_id = allocator.id;
        self.commands.clear();
        self.recording = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError("command list already closed".to_string()));
        }
        self.recording = false;
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn resource_barrier(&mut self, barriers: &[ResourceBarrier]) -> Result<()> {
        for barrier in barriers {
            let ResourceBarrier::Transition { resource, before, after } = barrier;
            self.record(format!(
                "resource_barrier({}: {:?} -> {:?})",
                resource.name(),
                before,
                after
            ))?;
        }
        Ok(())
    }

    fn copy_buffer_region(
        &mut self,
        dst: &Arc<dyn Resource>,
        dst_offset: u64,
        src: &Arc<dyn Resource>,
        src_offset: u64,
        size: u64,
    ) -> Result<()> {
        self.record(format!(
            "copy_buffer_region({}+{} <- {}+{}, {} bytes)",
            dst.name(),
            dst_offset,
            src.name(),
            src_offset,
            size
        ))
    }

    fn copy_texture_region(
        &mut self,
        dst: &Arc<dyn Resource>,
        src: &Arc<dyn Resource>,
        src_layout: &TextureCopyLayout,
    ) -> Result<()> {
        self.record(format!(
            "copy_texture_region({} <- {}, {}x{}, pitch {})",
            dst.name(),
            src.name(),
            src_layout.width,
            src_layout.height,
            src_layout.row_pitch
        ))
    }

    fn set_pipeline_state(&mut self, _pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        self.record("set_pipeline_state".to_string())
    }

    fn set_graphics_root_signature(&mut self, root_signature: &Arc<dyn RootSignature>) -> Result<()> {
        self.record(format!(
            "set_graphics_root_signature({} parameters)",
            root_signature.desc().parameters.len()
        ))
    }

    fn set_descriptor_heaps(&mut self, heaps: &[Arc<dyn DescriptorHeap>]) -> Result<()> {
        if heaps.iter().any(|heap| !heap.desc().shader_visible) {
            return Err(Error::InvalidResource("descriptor heap is not shader visible".to_string()));
        }
        self.record(format!("set_descriptor_heaps({})", heaps.len()))
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<()> {
        let viewport = viewports.first().copied().unwrap_or(Viewport::new(0, 0));
        self.record(format!("set_viewports({}x{})", viewport.width, viewport.height))
    }

    fn set_scissor_rects(&mut self, rects: &[Rect]) -> Result<()> {
        let rect = rects.first().copied().unwrap_or(Rect::from_size(0, 0));
        self.record(format!("set_scissor_rects({}x{})", rect.width(), rect.height()))
    }

    fn set_render_targets(
        &mut self,
        render_targets: &[DescriptorHandle],
        depth_stencil: Option<&DescriptorHandle>,
    ) -> Result<()> {
        let targets: Vec<String> = render_targets.iter().map(handle_label).collect();
        let depth = depth_stencil.map(handle_label).unwrap_or_else(|| "none".to_string());
        self.record(format!("set_render_targets([{}], {})", targets.join(", "), depth))
    }

    fn clear_render_target_view(&mut self, render_target: &DescriptorHandle, color: [f32; 4]) -> Result<()> {
        self.record(format!(
            "clear_render_target_view({}, {:?})",
            handle_label(render_target),
            color
        ))
    }

    fn clear_depth_stencil_view(
        &mut self,
        depth_stencil: &DescriptorHandle,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        self.record(format!(
            "clear_depth_stencil_view({}, {}, {})",
            handle_label(depth_stencil),
            depth,
            stencil
        ))
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()> {
        self.record(format!("set_primitive_topology({:?})", topology))
    }

    fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]) -> Result<()> {
        for (offset, view) in views.iter().enumerate() {
            self.record(format!(
                "set_vertex_buffers(slot {}, {}, size {}, stride {})",
                start_slot + offset as u32,
                view.resource.name(),
                view.size_in_bytes,
                view.stride_in_bytes
            ))?;
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, view: &IndexBufferView) -> Result<()> {
        self.record(format!(
            "set_index_buffer({}, size {}, {:?})",
            view.resource.name(),
            view.size_in_bytes,
            view.format
        ))
    }

    fn set_graphics_root_32bit_constants(
        &mut self,
        root_parameter_index: u32,
        data: &[u32],
        dest_offset: u32,
    ) -> Result<()> {
        self.record(format!(
            "set_graphics_root_32bit_constants({}, {} values, offset {})",
            root_parameter_index,
            data.len(),
            dest_offset
        ))
    }

    fn set_graphics_root_descriptor_table(
        &mut self,
        root_parameter_index: u32,
        base_descriptor: &DescriptorHandle,
    ) -> Result<()> {
        self.record(format!(
            "set_graphics_root_descriptor_table({}, {})",
            root_parameter_index,
            handle_label(base_descriptor)
        ))
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) -> Result<()> {
        self.record(format!(
            "draw_indexed_instanced({}, {}, {}, {}, {})",
            index_count_per_instance,
            instance_count,
            start_index_location,
            base_vertex_location,
            start_instance_location
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Resources and descriptor heaps
// ============================================================================

pub struct MockResource {
    name: String,
    desc: ResourceDesc,
    heap_type: HeapType,
    data: Mutex<Vec<u8>>,
}

impl MockResource {
    pub fn new(name: &str, desc: ResourceDesc, heap_type: HeapType) -> Self {
        let size = if heap_type == HeapType::Upload && desc.is_buffer() {
            desc.width as usize
        } else {
            0
        };
        Self {
            name: name.to_string(),
            desc,
            heap_type,
            data: Mutex::new(vec![0; size]),
        }
    }

    /// Bytes written through `Resource::write` (upload buffers only)
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Resource for MockResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    fn heap_type(&self) -> HeapType {
        self.heap_type
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        validate_upload_write(&self.name, self.heap_type, &self.desc, offset, data.len())?;
        let start = offset as usize;
        self.data.lock().unwrap()[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockDescriptorHeap {
    id: u64,
    desc: DescriptorHeapDesc,
    views: Mutex<Vec<Option<String>>>,
}

impl MockDescriptorHeap {
    /// Name of the resource viewed by slot `index`
    pub fn view(&self, index: u32) -> Option<String> {
        self.views.lock().unwrap().get(index as usize).cloned().flatten()
    }

    fn write_view(&self, index: u32, kind: DescriptorHeapKind, resource: &Arc<dyn Resource>) -> Result<()> {
        self.desc.check_slot(index, kind)?;
        self.views.lock().unwrap()[index as usize] = Some(resource.name().to_string());
        Ok(())
    }
}

impl DescriptorHeap for MockDescriptorHeap {
    fn id(&self) -> u64 {
        self.id
    }

    fn desc(&self) -> &DescriptorHeapDesc {
        &self.desc
    }

    fn create_render_target_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()> {
        self.write_view(index, DescriptorHeapKind::Rtv, resource)
    }

    fn create_depth_stencil_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()> {
        if resource.desc().format != Some(TextureFormat::D32_FLOAT) {
            return Err(Error::InvalidResource(format!("'{}' is not a depth texture", resource.name())));
        }
        self.write_view(index, DescriptorHeapKind::Dsv, resource)
    }

    fn create_shader_resource_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()> {
        self.write_view(index, DescriptorHeapKind::CbvSrvUav, resource)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Shaders and pipelines
// ============================================================================

pub struct MockShader {
    stage: ShaderStage,
    entry_point: String,
    pub name: String,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockRootSignature {
    desc: RootSignatureDesc,
}

impl RootSignature for MockRootSignature {
    fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockPipelineState {
    pub rtv_formats: Vec<TextureFormat>,
    pub dsv_format: Option<TextureFormat>,
    pub input_layout: Vec<InputElementDesc>,
}

impl PipelineState for MockPipelineState {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Swapchain
// ============================================================================

pub struct MockSwapchain {
    gpu: Arc<MockGpu>,
    buffers: Vec<Arc<dyn Resource>>,
    index: u32,
    width: u32,
    height: u32,
    format: TextureFormat,
    /// Set by an out-of-date present, cleared by `resize_buffers`
    stale: bool,
}

impl MockSwapchain {
    fn create_buffers(count: u32, width: u32, height: u32, format: TextureFormat) -> Vec<Arc<dyn Resource>> {
        (0..count)
            .map(|i| {
                let desc = ResourceDesc::texture_2d(width, height, format, ResourceFlags::ALLOW_RENDER_TARGET);
                Arc::new(MockResource::new(&format!("back_buffer_{}", i), desc, HeapType::Default))
                    as Arc<dyn Resource>
            })
            .collect()
    }
}

impl Swapchain for MockSwapchain {
    fn present(&mut self, _sync_interval: u32) -> Result<PresentStatus> {
        if self.gpu.fail_present.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock present failure".to_string()));
        }
        if self.stale {
            return Err(Error::BackendError("present on an out-of-date swapchain".to_string()));
        }
        let out_of_date = self
            .gpu
            .out_of_date_presents
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if out_of_date {
            self.stale = true;
            return Ok(PresentStatus::OutOfDate);
        }
        self.gpu.presents.fetch_add(1, Ordering::SeqCst);
        self.index = (self.index + 1) % self.buffers.len() as u32;
        Ok(PresentStatus::Presented)
    }

    fn current_back_buffer_index(&self) -> u32 {
        self.index
    }

    fn buffer_count(&self) -> u32 {
        self.buffers.len() as u32
    }

    fn buffer(&self, index: u32) -> Result<Arc<dyn Resource>> {
        self.buffers
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("back buffer {} does not exist", index)))
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<()> {
        let count = self.buffers.len() as u32;
        self.buffers = Self::create_buffers(count, width, height, self.format);
        self.width = width;
        self.height = height;
        self.index = 0;
        self.stale = false;
        self.gpu.swapchain_resizes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Device / backend / window
// ============================================================================

pub struct MockGraphicsDevice {
    gpu: Arc<MockGpu>,
    adapter: AdapterInfo,
}

impl MockGraphicsDevice {
    pub fn new(gpu: Arc<MockGpu>) -> Self {
        Self {
            gpu,
            adapter: mock_adapter(0, AdapterKind::Discrete),
        }
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }

    fn create_command_queue(&self, kind: QueueKind) -> Result<Arc<dyn GpuQueue>> {
        Ok(Arc::new(MockQueue { kind, gpu: self.gpu.clone() }))
    }

    fn create_command_allocator(&self, kind: QueueKind) -> Result<Box<dyn CommandAllocator>> {
        self.gpu.allocators_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCommandAllocator {
            id: self.gpu.next_id(),
            kind,
            gpu: self.gpu.clone(),
            resets: 0,
        }))
    }

    fn create_command_list(
        &self,
        kind: QueueKind,
        allocator: &dyn CommandAllocator,
    ) -> Result<Box<dyn CommandList>> {
        let allocator = allocator
            .as_any()
            .downcast_ref::<MockCommandAllocator>()
            .ok_or_else(|| Error::BackendError("foreign command allocator".to_string()))?;
        if allocator.kind != kind {
            return Err(Error::BackendError("allocator kind mismatch".to_string()));
        }
        self.gpu.command_lists_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCommandList {
            kind,
            recording: true,
            allocator_id: allocator.id,
            commands: Vec::new(),
        }))
    }

    fn create_fence(&self, initial_value: u64) -> Result<Arc<dyn Fence>> {
        Ok(Arc::new(MockFence::new(initial_value)))
    }

    fn create_committed_resource(
        &self,
        heap_type: HeapType,
        desc: &ResourceDesc,
        initial_state: ResourceState,
        _clear_value: Option<ClearValue>,
        name: &str,
    ) -> Result<Arc<dyn Resource>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!("'{}' has a zero dimension", name)));
        }
        self.gpu.resources.lock().unwrap().push(CreatedResource {
            name: name.to_string(),
            desc: desc.clone(),
            heap_type,
            initial_state,
        });
        Ok(Arc::new(MockResource::new(name, desc.clone(), heap_type)))
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<Arc<dyn DescriptorHeap>> {
        if desc.capacity == 0 {
            return Err(Error::InvalidResource("descriptor heap capacity is 0".to_string()));
        }
        Ok(Arc::new(MockDescriptorHeap {
            id: self.gpu.next_id(),
            desc: *desc,
            views: Mutex::new(vec![None; desc.capacity as usize]),
        }))
    }

    fn create_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>> {
        if desc.source.trim().is_empty() {
            return Err(Error::AssetLoadFailed(format!("'{}' is empty", desc.name)));
        }
        self.gpu.shaders_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockShader {
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
            name: desc.name.to_string(),
        }))
    }

    fn create_root_signature(&self, desc: &RootSignatureDesc) -> Result<Arc<dyn RootSignature>> {
        Ok(Arc::new(MockRootSignature { desc: desc.clone() }))
    }

    fn create_graphics_pipeline_state(&self, desc: &GraphicsPipelineStateDesc) -> Result<Arc<dyn PipelineState>> {
        if desc.vertex_shader.stage() != ShaderStage::Vertex || desc.pixel_shader.stage() != ShaderStage::Pixel {
            return Err(Error::InvalidResource("shader stages do not match their slots".to_string()));
        }
        Ok(Arc::new(MockPipelineState {
            rtv_formats: desc.rtv_formats.clone(),
            dsv_format: desc.dsv_format,
            input_layout: desc.input_layout.clone(),
        }))
    }

    fn create_swapchain(
        &self,
        queue: &Arc<dyn GpuQueue>,
        _window: &dyn Window,
        desc: &SwapchainDesc,
    ) -> Result<Box<dyn Swapchain>> {
        if queue.kind() != QueueKind::Direct {
            return Err(Error::InvalidResource("swapchains present through a direct queue".to_string()));
        }
        Ok(Box::new(MockSwapchain {
            gpu: self.gpu.clone(),
            buffers: MockSwapchain::create_buffers(desc.buffer_count, desc.width, desc.height, desc.format),
            index: 0,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            stale: false,
        }))
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

pub fn mock_adapter(index: usize, kind: AdapterKind) -> AdapterInfo {
    AdapterInfo {
        index,
        name: format!("Mock Adapter {}", index),
        kind,
        dedicated_video_memory: if kind == AdapterKind::Software { 0 } else { 1 << 30 },
    }
}

pub struct MockBackend {
    pub gpu: Arc<MockGpu>,
    pub adapters: Vec<AdapterInfo>,
}

impl MockBackend {
    /// One discrete and one software adapter
    pub fn new(gpu: Arc<MockGpu>) -> Self {
        Self {
            gpu,
            adapters: vec![
                mock_adapter(0, AdapterKind::Discrete),
                mock_adapter(1, AdapterKind::Software),
            ],
        }
    }
}

impl GraphicsBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    fn enumerate_adapters(&self) -> Result<Vec<AdapterInfo>> {
        Ok(self.adapters.clone())
    }

    fn create_device(&self, adapter: &AdapterInfo, _window: &dyn Window) -> Result<Arc<dyn GraphicsDevice>> {
        Ok(Arc::new(MockGraphicsDevice {
            gpu: self.gpu.clone(),
            adapter: adapter.clone(),
        }))
    }
}

/// Window without native handles
pub struct MockWindow {
    pub width: u32,
    pub height: u32,
    pub should_close: bool,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            should_close: false,
        }
    }
}

impl HasWindowHandle for MockWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for MockWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl Window for MockWindow {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn should_close(&self) -> bool {
        self.should_close
    }
}

/// Shared GPU state plus a device backed by it
pub fn create_mock_device() -> (Arc<MockGpu>, Arc<dyn GraphicsDevice>) {
    let gpu = MockGpu::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(MockGraphicsDevice::new(gpu.clone()));
    (gpu, device)
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
