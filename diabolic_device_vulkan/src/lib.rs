/*!
# DiaBolic - Vulkan Device Backend

Vulkan implementation of the `diabolic::graphics_device` traits.

This crate maps the explicit, queue-based device model of DiaBolic onto Vulkan 1.3
using the Ash library for bindings, gpu-allocator for memory management, naga for
WGSL to SPIR-V compilation and spirq for shader reflection.

```no_run
use diabolic::dbl::{Renderer, RendererConfig};
use diabolic_device_vulkan::VulkanBackend;
# fn run(window: &dyn diabolic::graphics_device::Window) -> diabolic::Result<()> {
let config = RendererConfig::default();
let backend = VulkanBackend::new(window, config.enable_validation)?;
let mut renderer = Renderer::new(&backend, window, config)?;
renderer.render(1.0 / 60.0)?;
# Ok(())
# }
```
*/

mod vulkan_context;
mod vulkan_format;
mod vulkan_backend;
mod vulkan_graphics_device;
mod vulkan_queue;
mod vulkan_command_list;
mod vulkan_resource;
mod vulkan_descriptor_heap;
mod vulkan_pipeline;
mod vulkan_swapchain;
mod debug;

pub use vulkan_backend::VulkanBackend;
pub use vulkan_graphics_device::VulkanGraphicsDevice;
pub use vulkan_queue::{VulkanFence, VulkanQueue};
pub use vulkan_command_list::{VulkanCommandAllocator, VulkanCommandList};
pub use vulkan_resource::VulkanResource;
pub use vulkan_descriptor_heap::VulkanDescriptorHeap;
pub use vulkan_pipeline::{VulkanPipelineState, VulkanRootSignature, VulkanShader};
pub use vulkan_swapchain::VulkanSwapchain;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
