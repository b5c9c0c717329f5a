/// VulkanInstance and GpuContext - Shared Vulkan state for all device objects
///
/// `VulkanInstance` owns the loader entry, the instance and the debug messenger.
/// `GpuContext` owns the logical device, the memory allocator and the queues;
/// every queue, resource, heap and pipeline holds an `Arc` to it so the device
/// outlives everything created from it.

use ash::vk;
use diabolic::dbl_err;
use diabolic::graphics_device::Window;
use diabolic::Result;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

const SOURCE: &str = "diabolic::vulkan::context";

/// Vulkan instance and instance-level loaders
pub struct VulkanInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub surface_loader: ash::khr::surface::Instance,

    /// Debug utils loader and messenger (validation enabled only)
    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create a presentation surface for `window`
    ///
    /// # Safety
    ///
    /// The window must outlive the surface.
    pub unsafe fn create_surface(&self, window: &dyn Window) -> Result<vk::SurfaceKHR> {
        let display_handle = window.display_handle()
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get display handle: {}", e))?;
        let window_handle = window.window_handle()
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get window handle: {}", e))?;
        ash_window::create_surface(
            &self.entry,
            &self.instance,
            display_handle.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create surface: {:?}", e))
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Shared GPU context for all Vulkan device objects.
///
/// Direct and copy queues may alias the same `vk::Queue` when the device has no
/// dedicated transfer family; `queue_lock` serializes every submission.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop to ensure it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub physical_device: vk::PhysicalDevice,

    /// Graphics + present queue family
    pub direct_family: u32,
    pub direct_queue: vk::Queue,

    /// Transfer queue family (equal to `direct_family` without a dedicated one)
    pub copy_family: u32,
    pub copy_queue: vk::Queue,

    /// Held while calling vkQueueSubmit2 / vkQueuePresentKHR
    pub queue_lock: Mutex<()>,

    pub push_descriptor: ash::khr::push_descriptor::Device,
    pub swapchain_loader: ash::khr::swapchain::Device,

    /// Command pool for one-shot layout initialization on the direct queue
    one_shot_pool: Mutex<vk::CommandPool>,

    pub instance: Arc<VulkanInstance>,
}

impl GpuContext {
    /// # Arguments
    ///
    /// * `one_shot_pool` - Pool on the direct family (RESET_COMMAND_BUFFER | TRANSIENT)
    pub fn new(
        instance: Arc<VulkanInstance>,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        (direct_family, direct_queue): (u32, vk::Queue),
        (copy_family, copy_queue): (u32, vk::Queue),
        one_shot_pool: vk::CommandPool,
    ) -> Self {
        let push_descriptor = ash::khr::push_descriptor::Device::new(&instance.instance, &device);
        let swapchain_loader = ash::khr::swapchain::Device::new(&instance.instance, &device);
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            physical_device,
            direct_family,
            direct_queue,
            copy_family,
            copy_queue,
            queue_lock: Mutex::new(()),
            push_descriptor,
            swapchain_loader,
            one_shot_pool: Mutex::new(one_shot_pool),
            instance,
        }
    }

    /// Queue families a resource may be used from
    pub fn queue_families(&self) -> Vec<u32> {
        if self.direct_family == self.copy_family {
            vec![self.direct_family]
        } else {
            vec![self.direct_family, self.copy_family]
        }
    }

    /// Resources are shared between the direct and copy families without
    /// ownership transfers
    pub fn sharing_mode(&self) -> vk::SharingMode {
        if self.direct_family == self.copy_family {
            vk::SharingMode::EXCLUSIVE
        } else {
            vk::SharingMode::CONCURRENT
        }
    }

    /// Record commands into a transient buffer, submit on the direct queue and
    /// wait for completion
    pub fn submit_one_shot<F: FnOnce(vk::CommandBuffer)>(&self, record: F) -> Result<()> {
        let pool = self.one_shot_pool.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "One-shot command pool lock poisoned"))?;

        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self.device.allocate_command_buffers(&alloc_info)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to allocate one-shot command buffer: {:?}", e))?[0];

            let result = self.record_and_wait(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn record_and_wait<F: FnOnce(vk::CommandBuffer)>(
        &self,
        command_buffer: vk::CommandBuffer,
        record: F,
    ) -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to begin one-shot command buffer: {:?}", e))?;

        record(command_buffer);

        self.device.end_command_buffer(command_buffer)
            .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to end one-shot command buffer: {:?}", e))?;

        let command_buffer_infos = [vk::CommandBufferSubmitInfo::default().command_buffer(command_buffer)];
        let submit = vk::SubmitInfo2::default().command_buffer_infos(&command_buffer_infos);

        let _guard = self.queue_lock.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Queue lock poisoned"))?;
        self.device.queue_submit2(self.direct_queue, &[submit], vk::Fence::null())
            .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to submit one-shot commands: {:?}", e))?;
        self.device.queue_wait_idle(self.direct_queue)
            .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to wait for one-shot commands: {:?}", e))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            if let Ok(pool) = self.one_shot_pool.lock() {
                self.device.destroy_command_pool(*pool, None);
            }

            // Allocator first: it frees its memory blocks through the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
        }
        // `instance` is released after the device
    }
}
