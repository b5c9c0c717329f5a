/// Hardware queues and fences

use std::any::Any;
use crate::error::Result;
use crate::graphics_device::CommandList;

/// Queue type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Graphics, compute and copy commands
    Direct,
    /// Copy commands only
    Copy,
}

/// Monotonic 64-bit counter shared between CPU and GPU
pub trait Fence: Send + Sync {
    /// Last value the GPU signaled
    fn completed_value(&self) -> Result<u64>;

    /// Block the calling thread until the fence reaches `value`
    ///
    /// There is no timeout: a GPU that never signals blocks forever.
    fn wait(&self, value: u64) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Hardware command queue
pub trait GpuQueue: Send + Sync {
    fn kind(&self) -> QueueKind;

    /// Submit closed command lists, executed in order
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if a list is still recording or submission fails.
    fn execute_command_lists(&self, lists: &[&dyn CommandList]) -> Result<()>;

    /// Ask the GPU to set `fence` to `value` once all previously submitted work completes
    fn signal(&self, fence: &dyn Fence, value: u64) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
