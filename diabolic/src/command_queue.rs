/// CommandQueue - hardware queue + fence + allocator and command list pools
///
/// Allocators are handed back to the pool tagged with the fence value of the
/// submission that used them, and are only reset once that value is reached.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{CommandAllocator, CommandList, Fence, GpuQueue, GraphicsDevice, QueueKind};

const SOURCE: &str = "diabolic::command_queue";

/// Allocator waiting for its submission to finish
struct InFlightAllocator {
    fence_value: u64,
    allocator: Box<dyn CommandAllocator>,
}

/// Command list checked out of a `CommandQueue`, open for recording
///
/// Derefs to the underlying `CommandList`. Hand it back with
/// `CommandQueue::execute_command_list`.
pub struct PooledCommandList {
    list: Box<dyn CommandList>,
    allocator: Box<dyn CommandAllocator>,
}

impl Deref for PooledCommandList {
    type Target = dyn CommandList;

    fn deref(&self) -> &Self::Target {
        self.list.as_ref()
    }
}

impl DerefMut for PooledCommandList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.list.as_mut()
    }
}

/// Wrapper around one hardware queue
pub struct CommandQueue {
    device: Arc<dyn GraphicsDevice>,
    kind: QueueKind,
    queue: Arc<dyn GpuQueue>,
    fence: Arc<dyn Fence>,
    fence_value: u64,
    allocators: VecDeque<InFlightAllocator>,
    command_lists: VecDeque<Box<dyn CommandList>>,
}

impl CommandQueue {
    /// Create the hardware queue and its fence (starting at 0)
    pub fn new(device: Arc<dyn GraphicsDevice>, kind: QueueKind) -> Result<Self> {
        let queue = device.create_command_queue(kind)?;
        let fence = device.create_fence(0)?;

        crate::dbl_debug!(SOURCE, "{:?} command queue created", kind);

        Ok(Self {
            device,
            kind,
            queue,
            fence,
            fence_value: 0,
            allocators: VecDeque::new(),
            command_lists: VecDeque::new(),
        })
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Hardware queue (swapchain creation presents through it)
    pub fn queue(&self) -> &Arc<dyn GpuQueue> {
        &self.queue
    }

    /// Last fence value handed out by `signal`
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    /// Get a command list ready for recording
    ///
    /// Reuses the oldest pooled allocator if its submission has completed,
    /// otherwise creates a new one. The allocator returned with the list is never
    /// in use by the GPU.
    pub fn get_command_list(&mut self) -> Result<PooledCommandList> {
        let reusable = match self.allocators.front() {
            Some(front) => self.is_fence_complete(front.fence_value)?,
            None => false,
        };

        let allocator = match self.allocators.pop_front() {
            Some(in_flight) if reusable => {
                let mut allocator = in_flight.allocator;
                allocator.reset()?;
                allocator
            }
            Some(in_flight) => {
                self.allocators.push_front(in_flight);
                self.create_allocator()?
            }
            None => self.create_allocator()?,
        };

        let list = match self.command_lists.pop_front() {
            Some(mut list) => {
                list.reset(allocator.as_ref())?;
                list
            }
            None => self.device.create_command_list(self.kind, allocator.as_ref())?,
        };

        Ok(PooledCommandList { list, allocator })
    }

    fn create_allocator(&self) -> Result<Box<dyn CommandAllocator>> {
        let allocator = self.device.create_command_allocator(self.kind)?;
        crate::dbl_trace!(
            SOURCE,
            "{:?} queue: new command allocator ({} in flight)",
            self.kind,
            self.allocators.len()
        );
        Ok(allocator)
    }

    /// Close and submit a list, returning the fence value marking its completion
    pub fn execute_command_list(&mut self, command_list: PooledCommandList) -> Result<u64> {
        let PooledCommandList { mut list, allocator } = command_list;

        list.close()?;
        self.queue.execute_command_lists(&[list.as_ref()])?;
        let fence_value = self.signal()?;

        self.allocators.push_back(InFlightAllocator { fence_value, allocator });
        self.command_lists.push_back(list);

        Ok(fence_value)
    }

    /// Increment the fence counter and signal it on the queue
    pub fn signal(&mut self) -> Result<u64> {
        self.fence_value += 1;
        self.queue.signal(self.fence.as_ref(), self.fence_value)?;
        Ok(self.fence_value)
    }

    pub fn is_fence_complete(&self, fence_value: u64) -> Result<bool> {
        Ok(self.fence.completed_value()? >= fence_value)
    }

    /// Block until the fence reaches `fence_value`; no-op if it already has
    pub fn wait_for_fence_value(&self, fence_value: u64) -> Result<()> {
        if !self.is_fence_complete(fence_value)? {
            self.fence.wait(fence_value)?;
        }
        Ok(())
    }

    /// Wait for every submission made so far
    pub fn flush(&mut self) -> Result<()> {
        let fence_value = self.signal()?;
        self.wait_for_fence_value(fence_value)
    }
}

#[cfg(test)]
#[path = "command_queue_tests.rs"]
mod tests;
