/// VulkanSwapchain - Presentation to the window surface
///
/// The next back buffer is acquired as soon as the previous one is presented.
/// Its image-acquired semaphore goes into the direct queue's submission chain,
/// so the first submission of the frame waits for the image.

use ash::vk;
use diabolic::graphics_device::{
    GpuQueue, PresentStatus, Resource, ResourceDesc, ResourceFlags, Swapchain, SwapchainDesc,
    TextureFormat,
};
use diabolic::{dbl_bail, dbl_debug, dbl_err, dbl_trace, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{texture_format_from_vk, texture_format_to_vk};
use crate::vulkan_queue::VulkanQueue;
use crate::vulkan_resource::VulkanResource;

const SOURCE: &str = "diabolic::vulkan::swapchain";

/// Rebuilds tried while the surface keeps changing under a fresh swapchain
const MAX_REBUILD_ATTEMPTS: u32 = 3;

/// Surface format for `requested`, falling back to any format the renderer can
/// describe
fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
    requested: TextureFormat,
) -> Option<(vk::SurfaceFormatKHR, TextureFormat)> {
    let preferred = [
        texture_format_to_vk(requested),
        vk::Format::R8G8B8A8_UNORM,
        vk::Format::B8G8R8A8_UNORM,
    ];
    let srgb_nonlinear = |f: &&vk::SurfaceFormatKHR| f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR;

    preferred
        .iter()
        .find_map(|&format| formats.iter().filter(srgb_nonlinear).find(|f| f.format == format))
        .or_else(|| {
            formats
                .iter()
                .filter(srgb_nonlinear)
                .find(|f| texture_format_from_vk(f.format).is_some_and(|format| !format.is_depth()))
        })
        .and_then(|f| texture_format_from_vk(f.format).map(|format| (*f, format)))
}

/// Vulkan swapchain with per-image presentation semaphores
pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    queue: Arc<dyn GpuQueue>,
    surface: vk::SurfaceKHR,
    swapchain: vk::SwapchainKHR,
    buffers: Vec<Arc<dyn Resource>>,
    requested_format: TextureFormat,
    requested_count: u32,
    format: TextureFormat,
    extent: vk::Extent2D,

    /// Ring of acquire semaphores (one more than images)
    image_available: Vec<vk::Semaphore>,
    /// One per image, waited on by the present
    render_finished: Vec<vk::Semaphore>,
    next_semaphore: usize,
    current_index: u32,
}

impl VulkanSwapchain {
    /// Takes ownership of `surface`, destroyed with the swapchain (or on error)
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        queue: Arc<dyn GpuQueue>,
        surface: vk::SurfaceKHR,
        desc: &SwapchainDesc,
    ) -> Result<Self> {
        let mut swapchain = Self {
            ctx,
            queue,
            surface,
            swapchain: vk::SwapchainKHR::null(),
            buffers: Vec::new(),
            requested_format: desc.format,
            requested_count: desc.buffer_count,
            format: desc.format,
            extent: vk::Extent2D::default(),
            image_available: Vec::new(),
            render_finished: Vec::new(),
            next_semaphore: 0,
            current_index: 0,
        };
        // Drop cleans up on failure
        swapchain.rebuild(desc.width, desc.height)?;

        dbl_debug!(SOURCE, "Swapchain created: {}x{} {:?}, {} buffers",
            swapchain.extent.width, swapchain.extent.height, swapchain.format, swapchain.buffers.len());
        Ok(swapchain)
    }

    fn vk_queue(&self) -> Result<&VulkanQueue> {
        self.queue.as_any().downcast_ref::<VulkanQueue>()
            .ok_or_else(|| dbl_err!(SOURCE, BackendError, "Queue does not belong to the Vulkan backend"))
    }

    /// (Re)create the swapchain, its buffers and semaphores
    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let surface_loader = &self.ctx.instance.surface_loader;
        unsafe {
            let supported = surface_loader
                .get_physical_device_surface_support(self.ctx.physical_device, self.ctx.direct_family, self.surface)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to query surface support: {:?}", e))?;
            if !supported {
                dbl_bail!(SOURCE, InitializationFailed, "Direct queue family cannot present to this surface");
            }

            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get surface capabilities: {:?}", e))?;
            let formats = surface_loader
                .get_physical_device_surface_formats(self.ctx.physical_device, self.surface)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get surface formats: {:?}", e))?;

            let (vk_format, format) = choose_surface_format(&formats, self.requested_format)
                .ok_or_else(|| dbl_err!(SOURCE, Unsupported, "No 8-bit RGBA surface format available"))?;
            if format != self.requested_format {
                dbl_debug!(SOURCE, "Surface format {:?} substituted for {:?}", format, self.requested_format);
            }

            let extent = if capabilities.current_extent.width != u32::MAX {
                capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                    height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
                }
            };

            let mut image_count = self.requested_count.max(capabilities.min_image_count);
            if capabilities.max_image_count > 0 {
                image_count = image_count.min(capabilities.max_image_count);
            }

            let old_swapchain = self.swapchain;
            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(vk_format.format)
                .image_color_space(vk_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let swapchain = self.ctx.swapchain_loader.create_swapchain(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create swapchain: {:?}", e))?;

            self.release_buffers();
            if old_swapchain != vk::SwapchainKHR::null() {
                self.ctx.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;
            self.format = format;
            self.extent = extent;

            let images = self.ctx.swapchain_loader.get_swapchain_images(swapchain)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to get swapchain images: {:?}", e))?;

            self.buffers = images
                .iter()
                .enumerate()
                .map(|(index, &image)| {
                    let desc = ResourceDesc::texture_2d(extent.width, extent.height, format, ResourceFlags::ALLOW_RENDER_TARGET);
                    Arc::new(VulkanResource::from_swapchain_image(
                        self.ctx.clone(),
                        image,
                        vk_format.format,
                        desc,
                        format!("back_buffer_{}", index),
                    )) as Arc<dyn Resource>
                })
                .collect();

            for _ in 0..=images.len() {
                let semaphore = self.create_semaphore()?;
                self.image_available.push(semaphore);
            }
            for _ in 0..images.len() {
                let semaphore = self.create_semaphore()?;
                self.render_finished.push(semaphore);
            }
            self.next_semaphore = 0;
        }
        Ok(())
    }

    unsafe fn create_semaphore(&self) -> Result<vk::Semaphore> {
        self.ctx.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create semaphore: {:?}", e))
    }

    /// Drop buffers and semaphores of the current swapchain (GPU must be idle)
    fn release_buffers(&mut self) {
        self.buffers.clear();
        unsafe {
            for semaphore in self.image_available.drain(..).chain(self.render_finished.drain(..)) {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
        }
    }

    /// Build and acquire, retrying while the fresh swapchain is already out of date
    fn rebuild(&mut self, width: u32, height: u32) -> Result<()> {
        for attempt in 1..=MAX_REBUILD_ATTEMPTS {
            self.build(width, height)?;
            if self.acquire()? {
                return Ok(());
            }
            dbl_debug!(SOURCE, "Swapchain out of date right after build (attempt {})", attempt);
        }
        dbl_bail!(SOURCE, BackendError,
            "Swapchain still out of date after {} rebuilds", MAX_REBUILD_ATTEMPTS);
    }

    /// Acquire the next back buffer; the direct queue waits for it on its next submit.
    /// False when the swapchain is out of date and nothing was acquired.
    fn acquire(&mut self) -> Result<bool> {
        let semaphore = self.image_available[self.next_semaphore];
        self.next_semaphore = (self.next_semaphore + 1) % self.image_available.len();

        let acquired = unsafe {
            self.ctx.swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
        };
        let (index, suboptimal) = match acquired {
            Ok(acquired) => acquired,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                dbl_trace!(SOURCE, "Swapchain out of date during acquire");
                return Ok(false);
            }
            Err(e) => dbl_bail!(SOURCE, BackendError, "Failed to acquire swapchain image: {:?}", e),
        };
        if suboptimal {
            dbl_trace!(SOURCE, "Swapchain suboptimal after acquire");
        }

        self.vk_queue()?.chain().push(semaphore)?;
        self.current_index = index;
        Ok(true)
    }
}

impl Swapchain for VulkanSwapchain {
    fn present(&mut self, sync_interval: u32) -> Result<PresentStatus> {
        if sync_interval != 1 {
            // FIFO presentation always waits one vertical blank
            dbl_trace!(SOURCE, "Sync interval {} presented as 1", sync_interval);
        }

        let index = self.current_index;
        let render_finished = self.render_finished[index as usize];
        let queue = self.vk_queue()?;

        // Signal after all work submitted so far (and any pending acquire)
        let signals = [vk::SemaphoreSubmitInfo::default()
            .semaphore(render_finished)
            .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)];
        queue.submit(&[], &signals)?;

        let swapchains = [self.swapchain];
        let image_indices = [index];
        let wait_semaphores = [render_finished];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = {
            let _guard = self.ctx.queue_lock.lock()
                .map_err(|_| dbl_err!(SOURCE, BackendError, "Queue lock poisoned"))?;
            unsafe { self.ctx.swapchain_loader.queue_present(queue.raw(), &present_info) }
        };
        match result {
            Ok(_) | Err(vk::Result::SUBOPTIMAL_KHR) => {}
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                dbl_debug!(SOURCE, "Swapchain out of date during present");
                return Ok(PresentStatus::OutOfDate);
            }
            Err(e) => {
                dbl_bail!(SOURCE, BackendError, "Failed to present swapchain image: {:?}", e);
            }
        }

        if self.acquire()? {
            Ok(PresentStatus::Presented)
        } else {
            Ok(PresentStatus::OutOfDate)
        }
    }

    fn current_back_buffer_index(&self) -> u32 {
        self.current_index
    }

    fn buffer_count(&self) -> u32 {
        self.buffers.len() as u32
    }

    fn buffer(&self, index: u32) -> Result<Arc<dyn Resource>> {
        self.buffers.get(index as usize)
            .cloned()
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource,
                "Back buffer {} out of range (count: {})", index, self.buffers.len()))
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.extent.width
    }

    fn height(&self) -> u32 {
        self.extent.height
    }

    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<()> {
        // Consume the pending acquire so its semaphore is unsignaled before destruction
        self.vk_queue()?.submit(&[], &[])?;
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to wait idle before swapchain resize: {:?}", e))?;
        }

        self.rebuild(width, height)?;

        dbl_debug!(SOURCE, "Swapchain resized to {}x{}", self.extent.width, self.extent.height);
        Ok(())
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        if let Ok(queue) = self.vk_queue() {
            let _ = queue.submit(&[], &[]);
        }
        unsafe {
            let _ = self.ctx.device.device_wait_idle();
        }
        self.release_buffers();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.ctx.instance.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
