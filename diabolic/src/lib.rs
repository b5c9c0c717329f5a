/*!
# DiaBolic

Minimal real-time renderer built on an explicit, queue-based graphics API.

The crate is backend-agnostic: every GPU object is reached through the traits in
[`graphics_device`], and a backend crate (`diabolic_device_vulkan`) implements them.

## Architecture

- **CommandQueue**: queue + fence + pooled command allocators and lists
- **resource_util**: staging uploads of buffers and textures, tracked state transitions
- **Camera**: model/view/projection matrices and view parameters
- **GeometryPipeline**: the textured rotating cube
- **Renderer**: device, swapchain and frame targets, one fully synchronized frame per `render` call
*/

// Internal modules
mod error;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod command_queue;
pub mod resource_util;
pub mod camera;
pub mod pipelines;
pub mod renderer;

#[cfg(test)]
mod test_utils;

// Error types at the crate root (the logging macros expand to `$crate::Error`)
pub use error::{Error, Result};

// Main dbl namespace module
pub mod dbl {
    pub use crate::error::{Error, Result};

    pub use crate::renderer::{FramePacer, FullStallPacer, Renderer, RendererState, RendererStats};
    pub use crate::config::{GeometryPipelineDesc, RendererConfig};
    pub use crate::camera::Camera;
    pub use crate::command_queue::CommandQueue;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Graphics device sub-module with all device traits and types
    pub mod device {
        pub use crate::graphics_device::*;
    }

    pub mod pipelines {
        pub use crate::pipelines::*;
    }
}

// Re-export math library at crate root
pub use glam;
