/// VulkanGraphicsDevice - GraphicsDevice implementation on a Vulkan logical device

use ash::vk;
use diabolic::graphics_device::{
    AdapterInfo, ClearValue, CommandAllocator, CommandList, DescriptorHeap, DescriptorHeapDesc,
    Fence, GpuQueue, GraphicsDevice, GraphicsPipelineStateDesc, HeapType, PipelineState,
    QueueKind, Resource, ResourceDesc, ResourceState, RootSignature, RootSignatureDesc, Shader,
    ShaderDesc, Swapchain, SwapchainDesc, Window,
};
use diabolic::{dbl_bail, dbl_err, dbl_trace, Result};
use std::sync::{Arc, Mutex};

use crate::vulkan_command_list::{VulkanCommandAllocator, VulkanCommandList};
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_heap::VulkanDescriptorHeap;
use crate::vulkan_pipeline::{VulkanPipelineState, VulkanRootSignature, VulkanShader};
use crate::vulkan_queue::{VulkanFence, VulkanQueue};
use crate::vulkan_resource::VulkanResource;
use crate::vulkan_swapchain::VulkanSwapchain;

const SOURCE: &str = "diabolic::vulkan::device";

/// Vulkan logical device
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    adapter: AdapterInfo,

    /// Surface created with the device to pick the present queue; handed to
    /// the first swapchain
    surface: Mutex<Option<vk::SurfaceKHR>>,
}

impl VulkanGraphicsDevice {
    pub(crate) fn new(ctx: Arc<GpuContext>, adapter: AdapterInfo, surface: vk::SurfaceKHR) -> Self {
        Self {
            ctx,
            adapter,
            surface: Mutex::new(Some(surface)),
        }
    }

    fn take_surface(&self, window: &dyn Window) -> Result<vk::SurfaceKHR> {
        let stored = self.surface.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Surface lock poisoned"))?
            .take();
        match stored {
            Some(surface) => Ok(surface),
            None => unsafe { self.ctx.instance.create_surface(window) },
        }
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }

    fn create_command_queue(&self, kind: QueueKind) -> Result<Arc<dyn GpuQueue>> {
        Ok(Arc::new(VulkanQueue::new(self.ctx.clone(), kind)))
    }

    fn create_command_allocator(&self, kind: QueueKind) -> Result<Box<dyn CommandAllocator>> {
        Ok(Box::new(VulkanCommandAllocator::new(self.ctx.clone(), kind)?))
    }

    fn create_command_list(
        &self,
        kind: QueueKind,
        allocator: &dyn CommandAllocator,
    ) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(VulkanCommandList::new(self.ctx.clone(), kind, allocator)?))
    }

    fn create_fence(&self, initial_value: u64) -> Result<Arc<dyn Fence>> {
        Ok(Arc::new(VulkanFence::new(self.ctx.clone(), initial_value)?))
    }

    fn create_committed_resource(
        &self,
        heap_type: HeapType,
        desc: &ResourceDesc,
        initial_state: ResourceState,
        clear_value: Option<ClearValue>,
        name: &str,
    ) -> Result<Arc<dyn Resource>> {
        if clear_value.is_some() {
            // Dynamic rendering has no optimized clear values
            dbl_trace!(SOURCE, "Ignoring optimized clear value of '{}'", name);
        }
        Ok(Arc::new(VulkanResource::create_committed(self.ctx.clone(), heap_type, desc, initial_state, name)?))
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<Arc<dyn DescriptorHeap>> {
        Ok(Arc::new(VulkanDescriptorHeap::new(self.ctx.clone(), desc)?))
    }

    fn create_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>> {
        Ok(Arc::new(VulkanShader::compile(self.ctx.clone(), desc)?))
    }

    fn create_root_signature(&self, desc: &RootSignatureDesc) -> Result<Arc<dyn RootSignature>> {
        Ok(Arc::new(VulkanRootSignature::new(self.ctx.clone(), desc)?))
    }

    fn create_graphics_pipeline_state(&self, desc: &GraphicsPipelineStateDesc) -> Result<Arc<dyn PipelineState>> {
        Ok(Arc::new(VulkanPipelineState::new(self.ctx.clone(), desc)?))
    }

    fn create_swapchain(
        &self,
        queue: &Arc<dyn GpuQueue>,
        window: &dyn Window,
        desc: &SwapchainDesc,
    ) -> Result<Box<dyn Swapchain>> {
        if queue.kind() != QueueKind::Direct {
            dbl_bail!(SOURCE, InvalidResource, "Swapchains present through a Direct queue, got {:?}", queue.kind());
        }
        if queue.as_any().downcast_ref::<VulkanQueue>().is_none() {
            dbl_bail!(SOURCE, BackendError, "Queue does not belong to the Vulkan backend");
        }

        let surface = self.take_surface(window)?;
        Ok(Box::new(VulkanSwapchain::new(self.ctx.clone(), queue.clone(), surface, desc)?))
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to wait for device idle: {:?}", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        if let Ok(Some(surface)) = self.surface.get_mut().map(Option::take) {
            unsafe {
                self.ctx.instance.surface_loader.destroy_surface(surface, None);
            }
        }
    }
}
