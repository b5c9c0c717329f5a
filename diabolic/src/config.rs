/// Renderer configuration

use std::path::PathBuf;
use crate::graphics_device::TextureFormat;

/// Number of swapchain back buffers
pub const FRAME_COUNT: u32 = 2;

/// Vertical blanks to wait for on present (vsync)
pub const PRESENT_SYNC_INTERVAL: u32 = 1;

/// Requested swapchain format
pub const BACK_BUFFER_FORMAT: TextureFormat = TextureFormat::R8G8B8A8_UNORM;

/// Depth buffer format
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::D32_FLOAT;

/// Shader and texture inputs of the geometry pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPipelineDesc {
    pub vertex_shader: PathBuf,
    pub pixel_shader: PathBuf,
    /// Texture sampled by the pixel shader; the shaders must declare it
    pub texture: Option<PathBuf>,
}

impl Default for GeometryPipelineDesc {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("assets/shaders/uber_vs.wgsl"),
            pixel_shader: PathBuf::from("assets/shaders/uber_ps.wgsl"),
            texture: None,
        }
    }
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Requested back buffer count
    pub frame_count: u32,

    /// Run on the software rasterizer adapter
    pub use_warp_device: bool,

    /// Prefer the discrete GPU with the most memory over the first adapter
    pub prefer_high_performance: bool,

    /// Enable backend validation layers (when compiled in)
    pub enable_validation: bool,

    /// Back buffer clear color (RGBA)
    pub clear_color: [f32; 4],

    /// Slots in the shader-visible descriptor heap handed to pipelines
    pub srv_heap_capacity: u32,

    /// Seconds for one full turn of the cube; the rotation clock wraps at this value
    pub rotation_period: f32,

    /// Vertical field of view in radians
    pub field_of_view: f32,

    pub geometry: GeometryPipelineDesc,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frame_count: FRAME_COUNT,
            use_warp_device: false,
            prefer_high_performance: true,
            enable_validation: cfg!(debug_assertions),
            clear_color: [0.0, 0.2, 0.4, 1.0],
            srv_heap_capacity: 16,
            rotation_period: 4.0,
            field_of_view: 45.0_f32.to_radians(),
            geometry: GeometryPipelineDesc::default(),
        }
    }
}
