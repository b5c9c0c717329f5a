/// VulkanDescriptorHeap - Slot arrays of image views
///
/// Vulkan has no descriptor heaps in the Direct3D sense: a heap here is an array
/// of `VkImageView`s, each keeping its image alive. Shader-visible heaps are
/// read when a command list pushes a descriptor table.

use ash::vk;
use diabolic::graphics_device::{DescriptorHeap, DescriptorHeapDesc, DescriptorHeapKind, Resource};
use diabolic::{dbl_err, Result};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::aspect_for_format;
use crate::vulkan_resource::VulkanResource;

const SOURCE: &str = "diabolic::vulkan::descriptor_heap";

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(1);

/// View stored in a heap slot, as seen by command lists
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotView {
    pub view: vk::ImageView,
    pub extent: vk::Extent2D,
    pub format: vk::Format,
}

struct Slot {
    view: SlotView,
    _resource: Arc<dyn Resource>,
}

pub struct VulkanDescriptorHeap {
    ctx: Arc<GpuContext>,
    id: u64,
    desc: DescriptorHeapDesc,
    slots: Mutex<Vec<Option<Slot>>>,
}

impl VulkanDescriptorHeap {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &DescriptorHeapDesc) -> Result<Self> {
        if desc.capacity == 0 {
            return Err(dbl_err!(SOURCE, InitializationFailed, "Descriptor heap with zero capacity"));
        }
        if desc.shader_visible && desc.kind != DescriptorHeapKind::CbvSrvUav {
            return Err(dbl_err!(SOURCE, InitializationFailed, "{:?} heaps cannot be shader visible", desc.kind));
        }
        Ok(Self {
            ctx,
            id: NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed),
            desc: *desc,
            slots: Mutex::new((0..desc.capacity).map(|_| None).collect()),
        })
    }

    pub(crate) fn from_dyn(heap: &dyn DescriptorHeap) -> Result<&Self> {
        heap.as_any().downcast_ref::<Self>()
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "Descriptor heap does not belong to the Vulkan backend"))
    }

    /// View written at `index`
    pub(crate) fn view(&self, index: u32) -> Result<SlotView> {
        let slots = self.slots.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Descriptor heap lock poisoned"))?;
        slots.get(index as usize)
            .and_then(|slot| slot.as_ref())
            .map(|slot| slot.view)
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource,
                "Descriptor {} of {:?} heap {} is empty", index, self.desc.kind, self.id))
    }

    fn write_view(&self, index: u32, kind: DescriptorHeapKind, resource: &Arc<dyn Resource>) -> Result<()> {
        self.desc.check_slot(index, kind)?;

        let (image, format) = VulkanResource::from_dyn(resource.as_ref())?.image()
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource,
                "Cannot create a {:?} view of buffer '{}'", kind, resource.name()))?;

        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_for_format(format),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = unsafe {
            self.ctx.device.create_image_view(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, BackendError,
                    "Failed to create {:?} view of '{}': {:?}", kind, resource.name(), e))?
        };

        let desc = resource.desc();
        let slot = Slot {
            view: SlotView {
                view,
                extent: vk::Extent2D {
                    width: desc.width as u32,
                    height: desc.height,
                },
                format,
            },
            _resource: resource.clone(),
        };

        let mut slots = self.slots.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Descriptor heap lock poisoned"))?;
        if let Some(old) = slots[index as usize].replace(slot) {
            unsafe {
                self.ctx.device.destroy_image_view(old.view.view, None);
            }
        }
        Ok(())
    }
}

impl DescriptorHeap for VulkanDescriptorHeap {
    fn id(&self) -> u64 {
        self.id
    }

    fn desc(&self) -> &DescriptorHeapDesc {
        &self.desc
    }

    fn create_render_target_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()> {
        self.write_view(index, DescriptorHeapKind::Rtv, resource)
    }

    fn create_depth_stencil_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()> {
        self.write_view(index, DescriptorHeapKind::Dsv, resource)
    }

    fn create_shader_resource_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()> {
        self.write_view(index, DescriptorHeapKind::CbvSrvUav, resource)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanDescriptorHeap {
    fn drop(&mut self) {
        if let Ok(slots) = self.slots.get_mut() {
            for slot in slots.drain(..).flatten() {
                unsafe {
                    self.ctx.device.destroy_image_view(slot.view.view, None);
                }
            }
        }
    }
}
