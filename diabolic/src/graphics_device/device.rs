/// GraphicsBackend and GraphicsDevice traits, adapter enumeration and selection

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearValue, CommandAllocator, CommandList, DescriptorHeap, DescriptorHeapDesc, Fence,
    GpuQueue, GraphicsPipelineStateDesc, HeapType, PipelineState, QueueKind, Resource,
    ResourceDesc, ResourceState, RootSignature, RootSignatureDesc, Shader, ShaderDesc,
    Swapchain, SwapchainDesc, Window,
};

// ===== ADAPTERS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Discrete,
    Integrated,
    Virtual,
    /// CPU rasterizer ("warp" adapter)
    Software,
    Other,
}

/// Physical GPU as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Backend-specific enumeration index
    pub index: usize,
    pub name: String,
    pub kind: AdapterKind,
    pub dedicated_video_memory: u64,
}

impl AdapterInfo {
    pub fn is_software(&self) -> bool {
        self.kind == AdapterKind::Software
    }
}

/// Pick the adapter the renderer runs on
///
/// With `use_warp_device` the first software adapter is returned. Otherwise the
/// first hardware adapter wins, or with `prefer_high_performance` the discrete
/// adapter with the most dedicated memory.
///
/// # Errors
///
/// Returns `InitializationFailed` if no adapter matches the request.
pub fn select_adapter(
    adapters: &[AdapterInfo],
    use_warp_device: bool,
    prefer_high_performance: bool,
) -> Result<AdapterInfo> {
    if use_warp_device {
        return adapters
            .iter()
            .find(|a| a.is_software())
            .cloned()
            .ok_or_else(|| Error::InitializationFailed("no software adapter available".to_string()));
    }

    let mut hardware = adapters.iter().filter(|a| !a.is_software());
    let selected = if prefer_high_performance {
        hardware.max_by(|a, b| {
            let rank = |info: &AdapterInfo| (info.kind == AdapterKind::Discrete, info.dedicated_video_memory);
            // max_by keeps the last maximum; reverse index so the first one wins ties
            rank(a).cmp(&rank(b)).then(b.index.cmp(&a.index))
        })
    } else {
        hardware.next()
    };

    selected
        .cloned()
        .ok_or_else(|| Error::InitializationFailed("no hardware adapter available".to_string()))
}

// ===== BACKEND =====

/// Entry point of a graphics backend
pub trait GraphicsBackend {
    /// Backend name for logs ("Vulkan", "Mock", ...)
    fn name(&self) -> &str;

    fn enumerate_adapters(&self) -> Result<Vec<AdapterInfo>>;

    /// Create the logical device
    ///
    /// The window is needed to pick a queue able to present to it.
    fn create_device(&self, adapter: &AdapterInfo, window: &dyn Window) -> Result<Arc<dyn GraphicsDevice>>;
}

// ===== DEVICE =====

/// Logical GPU; every other GPU object is created through it
pub trait GraphicsDevice: Send + Sync {
    fn adapter(&self) -> &AdapterInfo;

    fn create_command_queue(&self, kind: QueueKind) -> Result<Arc<dyn GpuQueue>>;

    fn create_command_allocator(&self, kind: QueueKind) -> Result<Box<dyn CommandAllocator>>;

    /// Create a command list, open for recording against `allocator`
    fn create_command_list(
        &self,
        kind: QueueKind,
        allocator: &dyn CommandAllocator,
    ) -> Result<Box<dyn CommandList>>;

    fn create_fence(&self, initial_value: u64) -> Result<Arc<dyn Fence>>;

    /// Create a resource with its own memory allocation
    ///
    /// # Arguments
    ///
    /// * `heap_type` - Memory heap
    /// * `desc` - Buffer or texture description
    /// * `initial_state` - State the resource is in when returned
    /// * `clear_value` - Optimized clear value for render / depth targets
    /// * `name` - Debug name
    fn create_committed_resource(
        &self,
        heap_type: HeapType,
        desc: &ResourceDesc,
        initial_state: ResourceState,
        clear_value: Option<ClearValue>,
        name: &str,
    ) -> Result<Arc<dyn Resource>>;

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<Arc<dyn DescriptorHeap>>;

    /// Compile shader source
    ///
    /// # Errors
    ///
    /// Returns `AssetLoadFailed` with the compiler output if compilation fails.
    fn create_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>>;

    fn create_root_signature(&self, desc: &RootSignatureDesc) -> Result<Arc<dyn RootSignature>>;

    fn create_graphics_pipeline_state(&self, desc: &GraphicsPipelineStateDesc) -> Result<Arc<dyn PipelineState>>;

    /// Create a swapchain presenting through `queue` (must be a Direct queue)
    fn create_swapchain(
        &self,
        queue: &Arc<dyn GpuQueue>,
        window: &dyn Window,
        desc: &SwapchainDesc,
    ) -> Result<Box<dyn Swapchain>>;

    /// Block until the device has no outstanding work
    fn wait_idle(&self) -> Result<()>;
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
