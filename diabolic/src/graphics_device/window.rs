/// Window collaborator

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// OS window the renderer presents into
///
/// Event handling (keys, resize notifications) stays with the application,
/// which forwards new sizes to `Renderer::resize_window`.
pub trait Window: HasWindowHandle + HasDisplayHandle {
    /// Client area width in pixels
    fn width(&self) -> u32;

    /// Client area height in pixels
    fn height(&self) -> u32;

    fn should_close(&self) -> bool;
}
