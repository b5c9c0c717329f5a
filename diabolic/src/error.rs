//! Error types for the DiaBolic renderer
//!
//! Every failure in the renderer is unrecoverable for the current frame: device,
//! queue and swapchain errors propagate up to the process entry point, which
//! reports them and exits.

use std::fmt;

use crate::graphics_device::ResourceState;

/// Result type for DiaBolic operations
pub type Result<T> = std::result::Result<T, Error>;

/// DiaBolic errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, descriptor slot, ...)
    InvalidResource(String),

    /// A tracked transition was requested from a state the resource is not in
    InvalidResourceState {
        expected: ResourceState,
        actual: ResourceState,
    },

    /// Initialization failed (adapter, device, queues, swapchain, heaps)
    InitializationFailed(String),

    /// Shader or image could not be read, decoded or compiled
    AssetLoadFailed(String),

    /// Requested feature is not implemented (1D/3D textures, exotic formats)
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidResourceState { expected, actual } => write!(
                f,
                "Invalid resource state: transition expects {:?} but resource is in {:?}",
                expected, actual
            ),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::AssetLoadFailed(msg) => write!(f, "Asset load failed: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
