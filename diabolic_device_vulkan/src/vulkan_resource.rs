/// VulkanResource - Committed buffers and images backed by gpu-allocator memory

use ash::vk;
use diabolic::graphics_device::{
    validate_upload_write, HeapType, Resource, ResourceDesc, ResourceDimension, ResourceFlags,
    ResourceState,
};
use diabolic::{dbl_err, dbl_error, dbl_trace, Error, Result};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::{AllocationError, MemoryLocation};
use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_for_format, state_to_vk, texture_format_to_vk};

const SOURCE: &str = "diabolic::vulkan::resource";

#[derive(Debug, Clone, Copy)]
enum Handle {
    Buffer(vk::Buffer),
    Image {
        image: vk::Image,
        format: vk::Format,
        /// Swapchain images belong to the swapchain
        owned: bool,
    },
}

/// Vulkan buffer or 2D image
pub struct VulkanResource {
    ctx: Arc<GpuContext>,
    name: String,
    desc: ResourceDesc,
    heap_type: HeapType,
    handle: Handle,
    allocation: Mutex<Option<Allocation>>,
}

fn memory_location(heap_type: HeapType) -> MemoryLocation {
    match heap_type {
        HeapType::Default => MemoryLocation::GpuOnly,
        HeapType::Upload => MemoryLocation::CpuToGpu,
        HeapType::Readback => MemoryLocation::GpuToCpu,
    }
}

fn allocation_error(name: &str, size: u64, e: AllocationError) -> Error {
    match e {
        AllocationError::OutOfMemory => {
            dbl_error!(SOURCE, "Out of GPU memory for '{}' ({:.2} MB)", name, size as f64 / (1024.0 * 1024.0));
            Error::OutOfMemory
        }
        other => dbl_err!(SOURCE, BackendError, "Failed to allocate memory for '{}': {:?}", name, other),
    }
}

impl VulkanResource {
    pub(crate) fn create_committed(
        ctx: Arc<GpuContext>,
        heap_type: HeapType,
        desc: &ResourceDesc,
        initial_state: ResourceState,
        name: &str,
    ) -> Result<Self> {
        match desc.dimension {
            ResourceDimension::Buffer => Self::create_buffer(ctx, heap_type, desc, name),
            ResourceDimension::Texture2D => Self::create_image(ctx, heap_type, desc, initial_state, name),
            other => Err(dbl_err!(SOURCE, Unsupported, "{:?} resources ('{}')", other, name)),
        }
    }

    fn create_buffer(ctx: Arc<GpuContext>, heap_type: HeapType, desc: &ResourceDesc, name: &str) -> Result<Self> {
        if desc.width == 0 {
            return Err(dbl_err!(SOURCE, InvalidResource, "Buffer '{}' has zero size", name));
        }

        let queue_families = ctx.queue_families();
        let create_info = vk::BufferCreateInfo::default()
            .size(desc.width)
            .usage(
                vk::BufferUsageFlags::TRANSFER_SRC
                    | vk::BufferUsageFlags::TRANSFER_DST
                    | vk::BufferUsageFlags::VERTEX_BUFFER
                    | vk::BufferUsageFlags::INDEX_BUFFER
                    | vk::BufferUsageFlags::UNIFORM_BUFFER,
            )
            .sharing_mode(ctx.sharing_mode())
            .queue_family_indices(&queue_families);

        unsafe {
            let buffer = ctx.device.create_buffer(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to create buffer '{}': {:?}", name, e))?;
            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = ctx.allocator.lock()
                .map_err(|_| dbl_err!(SOURCE, BackendError, "Allocator lock poisoned"))
                .and_then(|mut allocator| {
                    allocator.allocate(&AllocationCreateDesc {
                        name,
                        requirements,
                        location: memory_location(heap_type),
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| allocation_error(name, requirements.size, e))
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            let resource = Self {
                name: name.to_string(),
                desc: desc.clone(),
                heap_type,
                handle: Handle::Buffer(buffer),
                allocation: Mutex::new(None),
                ctx,
            };
            resource.bind(allocation)?;

            dbl_trace!(SOURCE, "Created buffer '{}' ({} bytes, {:?} heap)", name, desc.width, heap_type);
            Ok(resource)
        }
    }

    fn create_image(
        ctx: Arc<GpuContext>,
        heap_type: HeapType,
        desc: &ResourceDesc,
        initial_state: ResourceState,
        name: &str,
    ) -> Result<Self> {
        if heap_type != HeapType::Default {
            return Err(dbl_err!(SOURCE, Unsupported, "Texture '{}' in a {:?} heap", name, heap_type));
        }
        let format = desc.format
            .map(texture_format_to_vk)
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "Texture '{}' has no format", name))?;
        if desc.width == 0 || desc.height == 0 {
            return Err(dbl_err!(SOURCE, InvalidResource, "Texture '{}' has zero size", name));
        }

        let mut usage = vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
        if !desc.flags.contains(ResourceFlags::DENY_SHADER_RESOURCE) {
            usage |= vk::ImageUsageFlags::SAMPLED;
        }
        if desc.flags.contains(ResourceFlags::ALLOW_RENDER_TARGET) {
            usage |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
        }
        if desc.flags.contains(ResourceFlags::ALLOW_DEPTH_STENCIL) {
            usage |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
        }

        let queue_families = ctx.queue_families();
        let create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: desc.width as u32,
                height: desc.height,
                depth: 1,
            })
            .mip_levels(desc.mip_levels.max(1) as u32)
            .array_layers(desc.depth_or_array_size.max(1) as u32)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(ctx.sharing_mode())
            .queue_family_indices(&queue_families)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = ctx.device.create_image(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to create image '{}': {:?}", name, e))?;
            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocation = ctx.allocator.lock()
                .map_err(|_| dbl_err!(SOURCE, BackendError, "Allocator lock poisoned"))
                .and_then(|mut allocator| {
                    allocator.allocate(&AllocationCreateDesc {
                        name,
                        requirements,
                        location: MemoryLocation::GpuOnly,
                        linear: false,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| allocation_error(name, requirements.size, e))
                });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            let resource = Self {
                name: name.to_string(),
                desc: desc.clone(),
                heap_type,
                handle: Handle::Image {
                    image,
                    format,
                    owned: true,
                },
                allocation: Mutex::new(None),
                ctx,
            };
            resource.bind(allocation)?;
            resource.initialize_layout(initial_state)?;

            dbl_trace!(SOURCE, "Created texture '{}' ({}x{} {:?}, {:?})",
                name, desc.width, desc.height, desc.format, initial_state);
            Ok(resource)
        }
    }

    /// Wrap a swapchain image (not owned, no allocation)
    pub(crate) fn from_swapchain_image(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        format: vk::Format,
        desc: ResourceDesc,
        name: String,
    ) -> Self {
        Self {
            ctx,
            name,
            desc,
            heap_type: HeapType::Default,
            handle: Handle::Image {
                image,
                format,
                owned: false,
            },
            allocation: Mutex::new(None),
        }
    }

    /// Bind memory and keep the allocation; on failure the allocation is kept
    /// anyway so Drop frees it with the handle
    unsafe fn bind(&self, allocation: Allocation) -> Result<()> {
        let (memory, offset) = (allocation.memory(), allocation.offset());
        if let Ok(mut slot) = self.allocation.lock() {
            *slot = Some(allocation);
        }
        let result = match self.handle {
            Handle::Buffer(buffer) => self.ctx.device.bind_buffer_memory(buffer, memory, offset),
            Handle::Image { image, .. } => self.ctx.device.bind_image_memory(image, memory, offset),
        };
        result.map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to bind memory of '{}': {:?}", self.name, e))
    }

    /// Move a fresh image from UNDEFINED into the layout of `state`
    fn initialize_layout(&self, state: ResourceState) -> Result<()> {
        let Handle::Image { image, format, .. } = self.handle else {
            return Ok(());
        };
        let target = state_to_vk(state, false);
        if target.layout == vk::ImageLayout::UNDEFINED {
            return Ok(());
        }

        let barrier = vk::ImageMemoryBarrier2::default()
            .src_stage_mask(vk::PipelineStageFlags2::NONE)
            .src_access_mask(vk::AccessFlags2::NONE)
            .dst_stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)
            .dst_access_mask(target.access)
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(target.layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_for_format(format),
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            });
        let barriers = [barrier];
        let dependency_info = vk::DependencyInfo::default().image_memory_barriers(&barriers);

        self.ctx.submit_one_shot(|command_buffer| unsafe {
            self.ctx.device.cmd_pipeline_barrier2(command_buffer, &dependency_info);
        })
    }

    pub(crate) fn from_dyn(resource: &dyn Resource) -> Result<&Self> {
        resource.as_any().downcast_ref::<Self>()
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "Resource '{}' does not belong to the Vulkan backend", resource.name()))
    }

    pub(crate) fn buffer(&self) -> Result<vk::Buffer> {
        match self.handle {
            Handle::Buffer(buffer) => Ok(buffer),
            Handle::Image { .. } => Err(dbl_err!(SOURCE, InvalidResource, "'{}' is not a buffer", self.name)),
        }
    }

    /// Image handle and format, None for buffers
    pub(crate) fn image(&self) -> Option<(vk::Image, vk::Format)> {
        match self.handle {
            Handle::Image { image, format, .. } => Some((image, format)),
            Handle::Buffer(_) => None,
        }
    }
}

impl Resource for VulkanResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    fn heap_type(&self) -> HeapType {
        self.heap_type
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        validate_upload_write(&self.name, self.heap_type, &self.desc, offset, data.len())?;

        let mut allocation = self.allocation.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Allocation lock poisoned"))?;
        let mapped = allocation
            .as_mut()
            .and_then(|allocation| allocation.mapped_slice_mut())
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "'{}' is not CPU-accessible", self.name))?;

        let start = offset as usize;
        mapped[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanResource {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.get_mut().ok().and_then(Option::take) {
                // Don't panic if lock fails - we still need to destroy the handle
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            match self.handle {
                Handle::Buffer(buffer) => self.ctx.device.destroy_buffer(buffer, None),
                Handle::Image { image, owned: true, .. } => self.ctx.device.destroy_image(image, None),
                Handle::Image { owned: false, .. } => {}
            }
        }
    }
}
