/// VulkanCommandAllocator and VulkanCommandList - Command pools and command recording

use ash::vk;
use diabolic::graphics_device::{
    CommandAllocator, CommandList, DescriptorHandle, DescriptorHeap, DescriptorRangeKind,
    IndexBufferView, PipelineState, PrimitiveTopology, QueueKind, Rect, Resource,
    ResourceBarrier, RootSignature, TextureCopyLayout, VertexBufferView, Viewport,
};
use diabolic::{dbl_err, Result};
use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_heap::{SlotView, VulkanDescriptorHeap};
use crate::vulkan_format::{
    aspect_for_format, index_type_to_vk, restrict_to_transfer, state_to_vk, topology_to_vk,
};
use crate::vulkan_pipeline::{VulkanPipelineState, VulkanRootSignature};
use crate::vulkan_resource::VulkanResource;

const SOURCE: &str = "diabolic::vulkan::command_list";

// ===== ALLOCATOR =====

struct PoolBuffers {
    buffers: Vec<vk::CommandBuffer>,
    next: usize,
}

/// Command pool handing out primary command buffers
///
/// Buffers are reused after `reset`, which recycles the whole pool.
pub struct VulkanCommandAllocator {
    ctx: Arc<GpuContext>,
    kind: QueueKind,
    pool: vk::CommandPool,
    buffers: Mutex<PoolBuffers>,
}

impl VulkanCommandAllocator {
    pub(crate) fn new(ctx: Arc<GpuContext>, kind: QueueKind) -> Result<Self> {
        let family = match kind {
            QueueKind::Direct => ctx.direct_family,
            QueueKind::Copy => ctx.copy_family,
        };
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(family);
        let pool = unsafe {
            ctx.device.create_command_pool(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to create command pool: {:?}", e))?
        };

        Ok(Self {
            ctx,
            kind,
            pool,
            buffers: Mutex::new(PoolBuffers {
                buffers: Vec::new(),
                next: 0,
            }),
        })
    }

    /// Next unused command buffer of the pool, allocated on demand
    fn acquire_buffer(&self) -> Result<vk::CommandBuffer> {
        let mut buffers = self.buffers.lock()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Command pool lock poisoned"))?;

        if buffers.next == buffers.buffers.len() {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let allocated = unsafe {
                self.ctx.device.allocate_command_buffers(&alloc_info)
                    .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to allocate command buffer: {:?}", e))?
            };
            buffers.buffers.extend(allocated);
        }

        let command_buffer = buffers.buffers[buffers.next];
        buffers.next += 1;
        Ok(command_buffer)
    }
}

impl CommandAllocator for VulkanCommandAllocator {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.ctx.device.reset_command_pool(self.pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to reset command pool: {:?}", e))?;
        }
        self.buffers.get_mut()
            .map_err(|_| dbl_err!(SOURCE, BackendError, "Command pool lock poisoned"))?
            .next = 0;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanCommandAllocator {
    fn drop(&mut self) {
        unsafe {
            // Frees every buffer allocated from the pool
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}

// ===== COMMAND LIST =====

/// Bound render target: the handle it was bound with and the view behind it
struct BoundTarget {
    handle: DescriptorHandle,
    view: SlotView,
}

/// Vulkan command list
///
/// Render targets are attached with dynamic rendering. Rendering begins lazily
/// on the first clear or draw after `set_render_targets` and ends before any
/// barrier, copy or `close`.
pub struct VulkanCommandList {
    ctx: Arc<GpuContext>,
    kind: QueueKind,
    command_buffer: vk::CommandBuffer,
    recording: bool,

    render_targets: Vec<BoundTarget>,
    depth_stencil: Option<BoundTarget>,
    rendering: bool,

    root_signature: Option<Arc<dyn RootSignature>>,
    descriptor_heaps: Vec<Arc<dyn DescriptorHeap>>,
}

impl VulkanCommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>, kind: QueueKind, allocator: &dyn CommandAllocator) -> Result<Self> {
        let mut list = Self {
            ctx,
            kind,
            command_buffer: vk::CommandBuffer::null(),
            recording: false,
            render_targets: Vec::new(),
            depth_stencil: None,
            rendering: false,
            root_signature: None,
            descriptor_heaps: Vec::new(),
        };
        list.reset(allocator)?;
        Ok(list)
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn ensure_recording(&self, command: &str) -> Result<()> {
        if !self.recording {
            return Err(dbl_err!(SOURCE, BackendError, "{}: command list is closed", command));
        }
        Ok(())
    }

    fn ensure_direct(&self, command: &str) -> Result<()> {
        self.ensure_recording(command)?;
        if self.kind != QueueKind::Direct {
            return Err(dbl_err!(SOURCE, BackendError, "{}: not allowed on a {:?} command list", command, self.kind));
        }
        Ok(())
    }

    fn render_area(&self) -> vk::Extent2D {
        self.render_targets
            .iter()
            .chain(self.depth_stencil.iter())
            .map(|target| target.view.extent)
            .reduce(|a, b| vk::Extent2D {
                width: a.width.min(b.width),
                height: a.height.min(b.height),
            })
            .unwrap_or_default()
    }

    /// Begin dynamic rendering on the bound targets if not already inside it
    fn ensure_rendering(&mut self) -> Result<()> {
        if self.rendering {
            return Ok(());
        }
        if self.render_targets.is_empty() && self.depth_stencil.is_none() {
            return Err(dbl_err!(SOURCE, BackendError, "No render targets bound"));
        }

        let color_attachments: Vec<vk::RenderingAttachmentInfo> = self.render_targets
            .iter()
            .map(|target| {
                vk::RenderingAttachmentInfo::default()
                    .image_view(target.view.view)
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE)
            })
            .collect();
        let depth_attachment = self.depth_stencil.as_ref().map(|target| {
            vk::RenderingAttachmentInfo::default()
                .image_view(target.view.view)
                .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .load_op(vk::AttachmentLoadOp::LOAD)
                .store_op(vk::AttachmentStoreOp::STORE)
        });

        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.render_area(),
            })
            .layer_count(1)
            .color_attachments(&color_attachments);
        if let Some(depth_attachment) = depth_attachment.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth_attachment);
        }

        unsafe {
            self.ctx.device.cmd_begin_rendering(self.command_buffer, &rendering_info);
        }
        self.rendering = true;
        Ok(())
    }

    fn end_rendering(&mut self) {
        if self.rendering {
            unsafe {
                self.ctx.device.cmd_end_rendering(self.command_buffer);
            }
            self.rendering = false;
        }
    }

    fn resolve_target(handle: &DescriptorHandle) -> Result<BoundTarget> {
        let heap = VulkanDescriptorHeap::from_dyn(handle.heap().as_ref())?;
        Ok(BoundTarget {
            handle: handle.clone(),
            view: heap.view(handle.index())?,
        })
    }

    fn bound_root_signature(&self, command: &str) -> Result<&VulkanRootSignature> {
        let root_signature = self.root_signature.as_ref()
            .ok_or_else(|| dbl_err!(SOURCE, BackendError, "{}: no root signature bound", command))?;
        VulkanRootSignature::from_dyn(root_signature.as_ref())
    }
}

impl CommandList for VulkanCommandList {
    fn kind(&self) -> QueueKind {
        self.kind
    }

    fn reset(&mut self, allocator: &dyn CommandAllocator) -> Result<()> {
        if self.recording {
            return Err(dbl_err!(SOURCE, BackendError, "Cannot reset a command list that is still recording"));
        }
        let vk_allocator = allocator.as_any().downcast_ref::<VulkanCommandAllocator>()
            .ok_or_else(|| dbl_err!(SOURCE, BackendError, "Allocator does not belong to the Vulkan backend"))?;
        if vk_allocator.kind != self.kind {
            return Err(dbl_err!(SOURCE, BackendError,
                "{:?} allocator used for a {:?} command list", vk_allocator.kind, self.kind));
        }

        let command_buffer = vk_allocator.acquire_buffer()?;
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.ctx.device.begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to begin command buffer: {:?}", e))?;
        }

        self.command_buffer = command_buffer;
        self.recording = true;
        self.render_targets.clear();
        self.depth_stencil = None;
        self.rendering = false;
        self.root_signature = None;
        self.descriptor_heaps.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_recording("close")?;
        self.end_rendering();
        unsafe {
            self.ctx.device.end_command_buffer(self.command_buffer)
                .map_err(|e| dbl_err!(SOURCE, BackendError, "Failed to end command buffer: {:?}", e))?;
        }
        self.recording = false;
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn resource_barrier(&mut self, barriers: &[ResourceBarrier]) -> Result<()> {
        self.ensure_recording("resource_barrier")?;
        self.end_rendering();

        let mut image_barriers = Vec::new();
        let mut buffer_barriers = Vec::new();

        for barrier in barriers {
            let ResourceBarrier::Transition { resource, before, after } = barrier;
            let resource = VulkanResource::from_dyn(resource.as_ref())?;

            let (mut src, mut dst) = (state_to_vk(*before, true), state_to_vk(*after, false));
            if self.kind == QueueKind::Copy {
                src = restrict_to_transfer(src);
                dst = restrict_to_transfer(dst);
            }

            match resource.image() {
                Some((image, format)) => image_barriers.push(
                    vk::ImageMemoryBarrier2::default()
                        .src_stage_mask(src.stage)
                        .src_access_mask(src.access)
                        .dst_stage_mask(dst.stage)
                        .dst_access_mask(dst.access)
                        .old_layout(src.layout)
                        .new_layout(dst.layout)
                        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .image(image)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: aspect_for_format(format),
                            base_mip_level: 0,
                            level_count: vk::REMAINING_MIP_LEVELS,
                            base_array_layer: 0,
                            layer_count: vk::REMAINING_ARRAY_LAYERS,
                        }),
                ),
                None => buffer_barriers.push(
                    vk::BufferMemoryBarrier2::default()
                        .src_stage_mask(src.stage)
                        .src_access_mask(src.access)
                        .dst_stage_mask(dst.stage)
                        .dst_access_mask(dst.access)
                        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .buffer(resource.buffer()?)
                        .offset(0)
                        .size(vk::WHOLE_SIZE),
                ),
            }
        }

        let dependency_info = vk::DependencyInfo::default()
            .image_memory_barriers(&image_barriers)
            .buffer_memory_barriers(&buffer_barriers);
        unsafe {
            self.ctx.device.cmd_pipeline_barrier2(self.command_buffer, &dependency_info);
        }
        Ok(())
    }

    fn copy_buffer_region(
        &mut self,
        dst: &Arc<dyn Resource>,
        dst_offset: u64,
        src: &Arc<dyn Resource>,
        src_offset: u64,
        size: u64,
    ) -> Result<()> {
        self.ensure_recording("copy_buffer_region")?;
        self.end_rendering();

        let dst_buffer = VulkanResource::from_dyn(dst.as_ref())?.buffer()?;
        let src_buffer = VulkanResource::from_dyn(src.as_ref())?.buffer()?;
        let region = vk::BufferCopy {
            src_offset,
            dst_offset,
            size,
        };
        unsafe {
            self.ctx.device.cmd_copy_buffer(self.command_buffer, src_buffer, dst_buffer, &[region]);
        }
        Ok(())
    }

    fn copy_texture_region(
        &mut self,
        dst: &Arc<dyn Resource>,
        src: &Arc<dyn Resource>,
        src_layout: &TextureCopyLayout,
    ) -> Result<()> {
        self.ensure_recording("copy_texture_region")?;
        self.end_rendering();

        let (dst_image, dst_format) = VulkanResource::from_dyn(dst.as_ref())?.image()
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "Texture copy destination '{}' is not a texture", dst.name()))?;
        let src_buffer = VulkanResource::from_dyn(src.as_ref())?.buffer()?;

        let region = vk::BufferImageCopy {
            buffer_offset: src_layout.offset,
            buffer_row_length: src_layout.row_pitch / src_layout.format.bytes_per_pixel(),
            buffer_image_height: src_layout.height,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: aspect_for_format(dst_format),
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D {
                width: src_layout.width,
                height: src_layout.height,
                depth: 1,
            },
        };
        unsafe {
            self.ctx.device.cmd_copy_buffer_to_image(
                self.command_buffer,
                src_buffer,
                dst_image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }
        Ok(())
    }

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        self.ensure_direct("set_pipeline_state")?;
        let pipeline = pipeline_state.as_any().downcast_ref::<VulkanPipelineState>()
            .ok_or_else(|| dbl_err!(SOURCE, BackendError, "Pipeline state does not belong to the Vulkan backend"))?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline());
        }
        Ok(())
    }

    fn set_graphics_root_signature(&mut self, root_signature: &Arc<dyn RootSignature>) -> Result<()> {
        self.ensure_direct("set_graphics_root_signature")?;
        VulkanRootSignature::from_dyn(root_signature.as_ref())?;
        self.root_signature = Some(root_signature.clone());
        Ok(())
    }

    fn set_descriptor_heaps(&mut self, heaps: &[Arc<dyn DescriptorHeap>]) -> Result<()> {
        self.ensure_direct("set_descriptor_heaps")?;
        if let Some(heap) = heaps.iter().find(|heap| !heap.desc().shader_visible) {
            return Err(dbl_err!(SOURCE, InvalidResource,
                "Descriptor heap {} is not shader visible", heap.id()));
        }
        self.descriptor_heaps = heaps.to_vec();
        Ok(())
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<()> {
        self.ensure_direct("set_viewports")?;
        // Negative height flips Y so clip space keeps pointing up
        let vk_viewports: Vec<vk::Viewport> = viewports
            .iter()
            .map(|viewport| vk::Viewport {
                x: viewport.top_left_x,
                y: viewport.top_left_y + viewport.height,
                width: viewport.width,
                height: -viewport.height,
                min_depth: viewport.min_depth,
                max_depth: viewport.max_depth,
            })
            .collect();
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &vk_viewports);
        }
        Ok(())
    }

    fn set_scissor_rects(&mut self, rects: &[Rect]) -> Result<()> {
        self.ensure_direct("set_scissor_rects")?;
        let scissors: Vec<vk::Rect2D> = rects
            .iter()
            .map(|rect| vk::Rect2D {
                offset: vk::Offset2D {
                    x: rect.left.max(0),
                    y: rect.top.max(0),
                },
                extent: vk::Extent2D {
                    width: rect.width(),
                    height: rect.height(),
                },
            })
            .collect();
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &scissors);
        }
        Ok(())
    }

    fn set_render_targets(
        &mut self,
        render_targets: &[DescriptorHandle],
        depth_stencil: Option<&DescriptorHandle>,
    ) -> Result<()> {
        self.ensure_direct("set_render_targets")?;
        self.end_rendering();

        self.render_targets = render_targets
            .iter()
            .map(Self::resolve_target)
            .collect::<Result<Vec<_>>>()?;
        self.depth_stencil = depth_stencil.map(Self::resolve_target).transpose()?;
        Ok(())
    }

    fn clear_render_target_view(&mut self, render_target: &DescriptorHandle, color: [f32; 4]) -> Result<()> {
        self.ensure_direct("clear_render_target_view")?;
        let attachment = self.render_targets
            .iter()
            .position(|target| target.handle == *render_target)
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "Cleared render target {:?} is not bound", render_target))?;

        self.ensure_rendering()?;
        let clear = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            color_attachment: attachment as u32,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            },
        };
        let rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.render_area(),
            },
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.ctx.device.cmd_clear_attachments(self.command_buffer, &[clear], &[rect]);
        }
        Ok(())
    }

    fn clear_depth_stencil_view(
        &mut self,
        depth_stencil: &DescriptorHandle,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        self.ensure_direct("clear_depth_stencil_view")?;
        let target = self.depth_stencil
            .as_ref()
            .filter(|target| target.handle == *depth_stencil)
            .map(|target| target.view)
            .ok_or_else(|| dbl_err!(SOURCE, InvalidResource, "Cleared depth stencil {:?} is not bound", depth_stencil))?;

        self.ensure_rendering()?;
        let clear = vk::ClearAttachment {
            aspect_mask: aspect_for_format(target.format),
            color_attachment: 0,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth,
                    stencil: stencil as u32,
                },
            },
        };
        let rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.render_area(),
            },
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.ctx.device.cmd_clear_attachments(self.command_buffer, &[clear], &[rect]);
        }
        Ok(())
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<()> {
        self.ensure_direct("set_primitive_topology")?;
        unsafe {
            self.ctx.device.cmd_set_primitive_topology(self.command_buffer, topology_to_vk(topology));
        }
        Ok(())
    }

    fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]) -> Result<()> {
        self.ensure_direct("set_vertex_buffers")?;
        let buffers = views
            .iter()
            .map(|view| VulkanResource::from_dyn(view.resource.as_ref())?.buffer())
            .collect::<Result<Vec<_>>>()?;
        let offsets = vec![0; views.len()];
        let sizes: Vec<vk::DeviceSize> = views.iter().map(|view| view.size_in_bytes as u64).collect();
        let strides: Vec<vk::DeviceSize> = views.iter().map(|view| view.stride_in_bytes as u64).collect();

        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers2(
                self.command_buffer,
                start_slot,
                &buffers,
                &offsets,
                Some(&sizes),
                Some(&strides),
            );
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, view: &IndexBufferView) -> Result<()> {
        self.ensure_direct("set_index_buffer")?;
        let buffer = VulkanResource::from_dyn(view.resource.as_ref())?.buffer()?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(self.command_buffer, buffer, 0, index_type_to_vk(view.format));
        }
        Ok(())
    }

    fn set_graphics_root_32bit_constants(
        &mut self,
        root_parameter_index: u32,
        data: &[u32],
        dest_offset: u32,
    ) -> Result<()> {
        self.ensure_direct("set_graphics_root_32bit_constants")?;
        let root_signature = self.bound_root_signature("set_graphics_root_32bit_constants")?;
        let range = root_signature.constants_range(root_parameter_index)?;

        let offset = range.offset + dest_offset * 4;
        let size = data.len() as u32 * 4;
        if offset + size > range.offset + range.size {
            return Err(dbl_err!(SOURCE, InvalidResource,
                "{} constants at offset {} overflow root parameter {} ({} bytes)",
                data.len(), dest_offset, root_parameter_index, range.size));
        }

        let bytes: Vec<u8> = data.iter().flat_map(|value| value.to_ne_bytes()).collect();
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                root_signature.layout(),
                range.stages,
                offset,
                &bytes,
            );
        }
        Ok(())
    }

    fn set_graphics_root_descriptor_table(
        &mut self,
        root_parameter_index: u32,
        base_descriptor: &DescriptorHandle,
    ) -> Result<()> {
        self.ensure_direct("set_graphics_root_descriptor_table")?;
        let heap_id = base_descriptor.heap().id();
        if !self.descriptor_heaps.iter().any(|heap| heap.id() == heap_id) {
            return Err(dbl_err!(SOURCE, InvalidResource,
                "Descriptor heap {} is not bound to the command list", heap_id));
        }
        let heap = VulkanDescriptorHeap::from_dyn(base_descriptor.heap().as_ref())?;

        let root_signature = self.bound_root_signature("set_graphics_root_descriptor_table")?;
        let table = root_signature.table(root_parameter_index)?;

        let mut image_infos = Vec::new();
        let mut bindings = Vec::new();
        let mut slot = base_descriptor.index();
        for range in table.ranges {
            if range.kind != DescriptorRangeKind::Srv {
                return Err(dbl_err!(SOURCE, Unsupported, "{:?} descriptor ranges", range.kind));
            }
            for offset in 0..range.count {
                let view = heap.view(slot)?;
                image_infos.push([vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: view.view,
                    image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                }]);
                bindings.push(range.base_register + offset);
                slot += 1;
            }
        }

        let writes: Vec<vk::WriteDescriptorSet> = image_infos
            .iter()
            .zip(&bindings)
            .map(|(info, &binding)| {
                vk::WriteDescriptorSet::default()
                    .dst_binding(binding)
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .image_info(info)
            })
            .collect();

        unsafe {
            self.ctx.push_descriptor.cmd_push_descriptor_set(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                root_signature.layout(),
                table.set,
                &writes,
            );
        }
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) -> Result<()> {
        self.ensure_direct("draw_indexed_instanced")?;
        self.ensure_rendering()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count_per_instance,
                instance_count,
                start_index_location,
                base_vertex_location,
                start_instance_location,
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
