/// Graphics device module - the low-level GPU API surface the renderer is built on
///
/// Mirrors an explicit, queue-based API: adapters, devices, command queues with
/// fences, command allocators and lists, committed resources, descriptor heaps,
/// root signatures and pipeline state objects. Backends (Vulkan, mock) implement
/// these traits.

// Module declarations
pub mod format;
pub mod resource;
pub mod descriptor;
pub mod queue;
pub mod command_list;
pub mod pipeline;
pub mod swapchain;
pub mod device;
pub mod window;

// Re-exports
pub use format::*;
pub use resource::*;
pub use descriptor::*;
pub use queue::*;
pub use command_list::*;
pub use pipeline::*;
pub use swapchain::*;
pub use device::*;
pub use window::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
