/// VulkanQueue and VulkanFence - Queue submission and timeline-semaphore fences

use ash::vk;
use diabolic::graphics_device::{CommandList, Fence, GpuQueue, QueueKind};
use diabolic::{dbl_err, dbl_trace, Result};
use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::GpuContext;

const SOURCE: &str = "diabolic::vulkan::queue";

/// Binary semaphores the next submission on a queue must wait on
///
/// The swapchain pushes its image-acquired semaphore here; the following
/// `execute_command_lists` consumes it.
#[derive(Default)]
pub(crate) struct SubmissionChain {
    waits: Mutex<Vec<vk::Semaphore>>,
}

impl SubmissionChain {
    pub fn push(&self, semaphore: vk::Semaphore) -> Result<()> {
        self.waits.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Submission chain lock poisoned"))?
            .push(semaphore);
        Ok(())
    }

    pub fn take(&self) -> Result<Vec<vk::Semaphore>> {
        let mut waits = self.waits.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Submission chain lock poisoned"))?;
        Ok(std::mem::take(&mut *waits))
    }
}

/// Hardware queue
pub struct VulkanQueue {
    ctx: Arc<GpuContext>,
    kind: QueueKind,
    queue: vk::Queue,
    family: u32,
    chain: Arc<SubmissionChain>,
}

impl VulkanQueue {
    pub(crate) fn new(ctx: Arc<GpuContext>, kind: QueueKind) -> Self {
        let (queue, family) = match kind {
            QueueKind::Direct => (ctx.direct_queue, ctx.direct_family),
            QueueKind::Copy => (ctx.copy_queue, ctx.copy_family),
        };
        Self {
            ctx,
            kind,
            queue,
            family,
            chain: Arc::new(SubmissionChain::default()),
        }
    }

    pub fn raw(&self) -> vk::Queue {
        self.queue
    }

    pub fn family(&self) -> u32 {
        self.family
    }

    pub(crate) fn chain(&self) -> &Arc<SubmissionChain> {
        &self.chain
    }

    /// Submit command buffers after any pending waits, signaling `signals`
    pub(crate) fn submit(
        &self,
        command_buffers: &[vk::CommandBuffer],
        signals: &[vk::SemaphoreSubmitInfo<'_>],
    ) -> Result<()> {
        let waits: Vec<vk::SemaphoreSubmitInfo> = self.chain.take()?
            .into_iter()
            .map(|semaphore| {
                vk::SemaphoreSubmitInfo::default()
                    .semaphore(semaphore)
                    .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
            })
            .collect();
        let command_buffer_infos: Vec<vk::CommandBufferSubmitInfo> = command_buffers
            .iter()
            .map(|&command_buffer| vk::CommandBufferSubmitInfo::default().command_buffer(command_buffer))
            .collect();

        let submit = vk::SubmitInfo2::default()
            .wait_semaphore_infos(&waits)
            .command_buffer_infos(&command_buffer_infos)
            .signal_semaphore_infos(signals);

        let _guard = self.ctx.queue_lock.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Queue lock poisoned"))?;
        unsafe {
            self.ctx.device.queue_submit2(self.queue, &[submit], vk::Fence::null())
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Queue submit failed: {:?}", e))
        }
    }
}

impl GpuQueue for VulkanQueue {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn execute_command_lists(&self, lists: &[&dyn CommandList]) -> Result<()> {
        let mut command_buffers = Vec::with_capacity(lists.len());
        for list in lists {
            let vk_list = list.as_any().downcast_ref::<VulkanCommandList>()
                .ok_or_else(|| dbl_err!(SOURCE, BackendError, "Command list does not belong to the Vulkan backend"))?;
            if vk_list.is_recording() {
                return Err(dbl_err!(SOURCE, BackendError, "Cannot execute a command list that is still recording"));
            }
            if vk_list.kind() != self.kind {
                return Err(dbl_err!(SOURCE, BackendError,
                    "{:?} command list submitted to a {:?} queue", vk_list.kind(), self.kind));
            }
            command_buffers.push(vk_list.command_buffer());
        }

        dbl_trace!(SOURCE, "{:?} queue: executing {} command list(s)", self.kind, command_buffers.len());
        self.submit(&command_buffers, &[])
    }

    fn signal(&self, fence: &dyn Fence, value: u64) -> Result<()> {
        let vk_fence = fence.as_any().downcast_ref::<VulkanFence>()
            .ok_or_else(|| dbl_err!(SOURCE, BackendError, "Fence does not belong to the Vulkan backend"))?;

        let signals = [vk::SemaphoreSubmitInfo::default()
            .semaphore(vk_fence.semaphore)
            .value(value)
            .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)];
        self.submit(&[], &signals)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fence backed by a timeline semaphore
pub struct VulkanFence {
    ctx: Arc<GpuContext>,
    semaphore: vk::Semaphore,
}

impl VulkanFence {
    pub(crate) fn new(ctx: Arc<GpuContext>, initial_value: u64) -> Result<Self> {
        let mut type_info = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(initial_value);
        let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut type_info);

        let semaphore = unsafe {
            ctx.device.create_semaphore(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create timeline semaphore: {:?}", e))?
        };
        Ok(Self { ctx, semaphore })
    }
}

impl Fence for VulkanFence {
    fn completed_value(&self) -> Result<u64> {
        unsafe {
            self.ctx.device.get_semaphore_counter_value(self.semaphore)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to read fence value: {:?}", e))
        }
    }

    fn wait(&self, value: u64) -> Result<()> {
        let semaphores = [self.semaphore];
        let values = [value];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores)
            .values(&values);
        unsafe {
            self.ctx.device.wait_semaphores(&wait_info, u64::MAX)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Fence wait for {} failed: {:?}", value, e))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
