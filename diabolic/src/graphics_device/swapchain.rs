/// Swapchain trait - flip-model presentation to a window

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Resource, TextureFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub width: u32,
    pub height: u32,
    /// Requested number of back buffers
    pub buffer_count: u32,
    /// Requested format; backends may substitute another 8-bit UNORM format
    pub format: TextureFormat,
}

/// Result of a present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// Queued for display; the next back buffer is ready
    Presented,
    /// The surface changed under the swapchain (usually a window resize not
    /// yet delivered). No back buffer is current until `resize_buffers` runs.
    OutOfDate,
}

/// Ring of presentable back buffers
///
/// Back buffers are handed out in `ResourceState::Present` and must be back in that
/// state when `present` is called.
pub trait Swapchain: Send {
    /// Queue the current back buffer for display and advance to the next one
    ///
    /// # Arguments
    ///
    /// * `sync_interval` - Number of vertical blanks to wait for (0 = no vsync)
    ///
    /// # Returns
    ///
    /// `PresentStatus::OutOfDate` when the swapchain must be rebuilt before the
    /// next frame
    fn present(&mut self, sync_interval: u32) -> Result<PresentStatus>;

    /// Index of the back buffer to render into
    fn current_back_buffer_index(&self) -> u32;

    fn buffer_count(&self) -> u32;

    /// Back buffer `index` as a resource
    fn buffer(&self, index: u32) -> Result<Arc<dyn Resource>>;

    fn format(&self) -> TextureFormat;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Recreate the back buffers at a new size
    ///
    /// Every outstanding reference to the old buffers (views included) must be
    /// released and the GPU idle before calling this.
    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<()>;
}
