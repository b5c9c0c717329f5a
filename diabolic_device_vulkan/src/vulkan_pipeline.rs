/// Shaders, root signatures and pipeline state objects for Vulkan
///
/// - `VulkanShader`: WGSL compiled to SPIR-V 1.3 with naga, reflected with spirq
/// - `VulkanRootSignature`: pipeline layout built from root parameters
/// - `VulkanPipelineState`: graphics pipeline for dynamic rendering

use ash::vk;
use diabolic::graphics_device::{
    DescriptorRange, DescriptorRangeKind, GraphicsPipelineStateDesc, PipelineState,
    RootParameter, RootSignature, RootSignatureDesc, Shader, ShaderDesc, ShaderStage,
};
use diabolic::{dbl_bail, dbl_debug, dbl_err, Result};
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    address_mode_to_vk, buffer_format_to_vk, compare_op_to_vk, cull_mode_to_vk, filter_to_vk,
    front_face_to_vk, texture_format_to_vk, topology_type_to_vk, visibility_to_vk,
};

const SOURCE: &str = "diabolic::vulkan::pipeline";

/// SPIR-V version shaders are compiled to
const SPIRV_VERSION: (u8, u8) = (1, 3);

/// Descriptor set used by the (single) descriptor table and the static samplers
const TABLE_SET: u32 = 0;

// ===== SHADERS =====

/// Kind of resource a shader binding expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    SampledImage,
    Sampler,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReflectedBinding {
    set: u32,
    binding: u32,
    kind: BindingKind,
}

/// Interface of a compiled shader, checked against the root signature
#[derive(Debug, Clone, Default)]
struct ShaderReflection {
    bindings: Vec<ReflectedBinding>,
    push_constant_size: u32,
}

/// Compiled shader module
pub struct VulkanShader {
    ctx: Arc<GpuContext>,
    name: String,
    stage: ShaderStage,
    entry_point: String,
    module: vk::ShaderModule,
    reflection: ShaderReflection,
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Pixel => naga::ShaderStage::Fragment,
    }
}

/// Compile WGSL source to SPIR-V words
///
/// The Y axis is left untouched: command lists flip it with a negative
/// viewport height instead.
fn compile_wgsl(desc: &ShaderDesc) -> Result<Vec<u32>> {
    let module = naga::front::wgsl::parse_str(desc.source)
        .map_err(|e| dbl_err!(SOURCE, AssetLoadFailed,
            "Failed to parse '{}':\n{}", desc.name, e.emit_to_string(desc.source)))?;

    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| dbl_err!(SOURCE, AssetLoadFailed,
        "Failed to validate '{}':\n{}", desc.name, e.emit_to_string(desc.source)))?;

    let stage = naga_stage(desc.stage);
    if !module.entry_points.iter().any(|ep| ep.name == desc.entry_point && ep.stage == stage) {
        dbl_bail!(SOURCE, AssetLoadFailed,
            "'{}' has no {:?} entry point named '{}'", desc.name, stage, desc.entry_point);
    }

    let mut flags = naga::back::spv::WriterFlags::LABEL_VARYINGS;
    if cfg!(debug_assertions) {
        flags |= naga::back::spv::WriterFlags::DEBUG;
    }
    let options = naga::back::spv::Options {
        lang_version: SPIRV_VERSION,
        flags,
        ..Default::default()
    };
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: stage,
        entry_point: desc.entry_point.to_string(),
    };

    naga::back::spv::write_vec(&module, &info, &options, Some(&pipeline_options))
        .map_err(|e| dbl_err!(SOURCE, AssetLoadFailed, "Failed to generate SPIR-V for '{}': {}", desc.name, e))
}

fn reflect_shader(name: &str, code: &[u32]) -> Result<ShaderReflection> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| dbl_err!(SOURCE, AssetLoadFailed, "SPIR-V reflection of '{}' failed: {:?}", name, e))?;

    let mut reflection = ShaderReflection::default();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            match var {
                spirq::var::Variable::Descriptor { desc_bind, desc_ty, .. } => {
                    let kind = match desc_ty {
                        spirq::ty::DescriptorType::SampledImage() => BindingKind::SampledImage,
                        spirq::ty::DescriptorType::Sampler() => BindingKind::Sampler,
                        _ => BindingKind::Other,
                    };
                    reflection.bindings.push(ReflectedBinding {
                        set: desc_bind.set(),
                        binding: desc_bind.bind(),
                        kind,
                    });
                }
                spirq::var::Variable::PushConstant { ty, .. } => {
                    let size = ty.nbyte().unwrap_or(0) as u32;
                    reflection.push_constant_size = reflection.push_constant_size.max(size);
                }
                _ => {}
            }
        }
    }
    Ok(reflection)
}

impl VulkanShader {
    pub(crate) fn compile(ctx: Arc<GpuContext>, desc: &ShaderDesc) -> Result<Self> {
        let code = compile_wgsl(desc)?;
        let reflection = reflect_shader(desc.name, &code)?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            ctx.device.create_shader_module(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, AssetLoadFailed, "Failed to create shader module '{}': {:?}", desc.name, e))?
        };

        dbl_debug!(SOURCE, "Compiled {:?} shader '{}' ({} SPIR-V words, {} binding(s), {} push constant bytes)",
            desc.stage, desc.name, code.len(), reflection.bindings.len(), reflection.push_constant_size);

        Ok(Self {
            ctx,
            name: desc.name.to_string(),
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
            module,
            reflection,
        })
    }

    fn from_dyn(shader: &dyn Shader) -> Result<&Self> {
        shader.as_any().downcast_ref::<Self>()
            .ok_or_else(|| dbl_err!(SOURCE, InitializationFailed, "Shader does not belong to the Vulkan backend"))
    }
}

impl Shader for VulkanShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}

// ===== ROOT SIGNATURE =====

/// Push-constant bytes owned by one constants root parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstantsRange {
    pub stages: vk::ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// Descriptor set a table root parameter is pushed to
pub(crate) struct TableBinding<'a> {
    pub set: u32,
    pub ranges: &'a [DescriptorRange],
}

/// Pipeline layout realizing a root signature
///
/// Constants become push-constant ranges laid out in parameter order. The
/// descriptor table becomes a push-descriptor set (binding = shader register)
/// that also holds the static samplers as immutable samplers.
pub struct VulkanRootSignature {
    ctx: Arc<GpuContext>,
    desc: RootSignatureDesc,
    layout: vk::PipelineLayout,
    set_layout: Option<vk::DescriptorSetLayout>,
    samplers: Vec<vk::Sampler>,
}

impl VulkanRootSignature {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &RootSignatureDesc) -> Result<Self> {
        let tables = desc.parameters
            .iter()
            .filter(|parameter| matches!(parameter, RootParameter::DescriptorTable { .. }))
            .count();
        if tables > 1 {
            dbl_bail!(SOURCE, Unsupported, "Root signatures with {} descriptor tables (at most 1)", tables);
        }

        let mut root_signature = Self {
            ctx,
            desc: desc.clone(),
            layout: vk::PipelineLayout::null(),
            set_layout: None,
            samplers: Vec::new(),
        };
        // On error, Drop releases whatever was created so far
        root_signature.create_samplers()?;
        root_signature.create_set_layout()?;
        root_signature.create_layout()?;
        Ok(root_signature)
    }

    fn create_samplers(&mut self) -> Result<()> {
        for sampler_desc in &self.desc.static_samplers {
            if sampler_desc.register_space != 0 {
                dbl_bail!(SOURCE, Unsupported, "Static sampler in register space {}", sampler_desc.register_space);
            }
            let (filter, mipmap_mode) = filter_to_vk(sampler_desc.filter);
            let address_mode = address_mode_to_vk(sampler_desc.address_mode);
            let create_info = vk::SamplerCreateInfo::default()
                .mag_filter(filter)
                .min_filter(filter)
                .mipmap_mode(mipmap_mode)
                .address_mode_u(address_mode)
                .address_mode_v(address_mode)
                .address_mode_w(address_mode)
                .max_lod(vk::LOD_CLAMP_NONE);
            let sampler = unsafe {
                self.ctx.device.create_sampler(&create_info, None)
                    .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create static sampler: {:?}", e))?
            };
            self.samplers.push(sampler);
        }
        Ok(())
    }

    fn create_set_layout(&mut self) -> Result<()> {
        let mut bindings: Vec<vk::DescriptorSetLayoutBinding> = Vec::new();

        for parameter in &self.desc.parameters {
            let RootParameter::DescriptorTable { ranges, visibility } = parameter else {
                continue;
            };
            for range in ranges {
                if range.kind != DescriptorRangeKind::Srv {
                    dbl_bail!(SOURCE, Unsupported, "{:?} descriptor ranges", range.kind);
                }
                if range.register_space != 0 {
                    dbl_bail!(SOURCE, Unsupported, "Descriptor range in register space {}", range.register_space);
                }
                for register in range.base_register..range.base_register + range.count {
                    bindings.push(
                        vk::DescriptorSetLayoutBinding::default()
                            .binding(register)
                            .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                            .descriptor_count(1)
                            .stage_flags(visibility_to_vk(*visibility)),
                    );
                }
            }
        }

        for (sampler_desc, sampler) in self.desc.static_samplers.iter().zip(&self.samplers) {
            bindings.push(
                vk::DescriptorSetLayoutBinding::default()
                    .binding(sampler_desc.shader_register)
                    .descriptor_type(vk::DescriptorType::SAMPLER)
                    .stage_flags(visibility_to_vk(sampler_desc.visibility))
                    .immutable_samplers(std::slice::from_ref(sampler)),
            );
        }

        if bindings.is_empty() {
            return Ok(());
        }

        let mut registers: Vec<u32> = bindings.iter().map(|binding| binding.binding).collect();
        registers.sort_unstable();
        if let Some(pair) = registers.windows(2).find(|pair| pair[0] == pair[1]) {
            dbl_bail!(SOURCE, InvalidResource, "Shader register {} is bound twice in the root signature", pair[0]);
        }

        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR)
            .bindings(&bindings);
        let set_layout = unsafe {
            self.ctx.device.create_descriptor_set_layout(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create descriptor set layout: {:?}", e))?
        };
        self.set_layout = Some(set_layout);
        Ok(())
    }

    fn create_layout(&mut self) -> Result<()> {
        let push_constant_ranges: Vec<vk::PushConstantRange> = self.desc.parameters
            .iter()
            .enumerate()
            .filter_map(|(index, parameter)| match parameter {
                RootParameter::Constants { num_32bit_values, visibility, .. } => Some(vk::PushConstantRange {
                    stage_flags: visibility_to_vk(*visibility),
                    offset: self.desc.constants_offset(index as u32).unwrap_or(0),
                    size: num_32bit_values * 4,
                }),
                RootParameter::DescriptorTable { .. } => None,
            })
            .collect();

        let set_layouts: Vec<vk::DescriptorSetLayout> = self.set_layout.into_iter().collect();
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        self.layout = unsafe {
            self.ctx.device.create_pipeline_layout(&create_info, None)
                .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Failed to create pipeline layout: {:?}", e))?
        };
        Ok(())
    }

    pub(crate) fn from_dyn(root_signature: &dyn RootSignature) -> Result<&Self> {
        root_signature.as_any().downcast_ref::<Self>()
            .ok_or_else(|| dbl_err!(SOURCE, BackendError, "Root signature does not belong to the Vulkan backend"))
    }

    pub(crate) fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    pub(crate) fn constants_range(&self, root_parameter_index: u32) -> Result<ConstantsRange> {
        match self.desc.parameters.get(root_parameter_index as usize) {
            Some(RootParameter::Constants { num_32bit_values, visibility, .. }) => Ok(ConstantsRange {
                stages: visibility_to_vk(*visibility),
                offset: self.desc.constants_offset(root_parameter_index).unwrap_or(0),
                size: num_32bit_values * 4,
            }),
            _ => Err(dbl_err!(SOURCE, InvalidResource,
                "Root parameter {} is not a constants slot", root_parameter_index)),
        }
    }

    pub(crate) fn table(&self, root_parameter_index: u32) -> Result<TableBinding<'_>> {
        match self.desc.parameters.get(root_parameter_index as usize) {
            Some(RootParameter::DescriptorTable { ranges, .. }) => Ok(TableBinding {
                set: TABLE_SET,
                ranges,
            }),
            _ => Err(dbl_err!(SOURCE, InvalidResource,
                "Root parameter {} is not a descriptor table", root_parameter_index)),
        }
    }
}

/// Bytes of push constants a root signature provides
fn total_constants_size(desc: &RootSignatureDesc) -> u32 {
    desc.parameters
        .iter()
        .map(|parameter| match parameter {
            RootParameter::Constants { num_32bit_values, .. } => num_32bit_values * 4,
            RootParameter::DescriptorTable { .. } => 0,
        })
        .sum()
}

/// What a root signature provides at (set, binding)
fn declared_binding(desc: &RootSignatureDesc, set: u32, binding: u32) -> Option<BindingKind> {
    if set != TABLE_SET {
        return None;
    }
    if desc.static_samplers.iter().any(|sampler| sampler.shader_register == binding) {
        return Some(BindingKind::Sampler);
    }
    let texture = desc.parameters.iter().any(|parameter| match parameter {
        RootParameter::DescriptorTable { ranges, .. } => ranges
            .iter()
            .any(|range| (range.base_register..range.base_register + range.count).contains(&binding)),
        RootParameter::Constants { .. } => false,
    });
    texture.then_some(BindingKind::SampledImage)
}

/// Check that every resource a shader uses is declared by the root signature
fn validate_shader_interface(desc: &RootSignatureDesc, name: &str, reflection: &ShaderReflection) -> Result<()> {
    let provided = total_constants_size(desc);
    if reflection.push_constant_size > provided {
        dbl_bail!(SOURCE, InitializationFailed,
            "'{}' uses {} push constant bytes but the root signature provides {}",
            name, reflection.push_constant_size, provided);
    }
    for binding in &reflection.bindings {
        if declared_binding(desc, binding.set, binding.binding) != Some(binding.kind) {
            dbl_bail!(SOURCE, InitializationFailed,
                "'{}' binds a {:?} at set {} binding {} that the root signature does not declare",
                name, binding.kind, binding.set, binding.binding);
        }
    }
    Ok(())
}

impl RootSignature for VulkanRootSignature {
    fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRootSignature {
    fn drop(&mut self) {
        unsafe {
            if self.layout != vk::PipelineLayout::null() {
                self.ctx.device.destroy_pipeline_layout(self.layout, None);
            }
            if let Some(set_layout) = self.set_layout.take() {
                self.ctx.device.destroy_descriptor_set_layout(set_layout, None);
            }
            for sampler in self.samplers.drain(..) {
                self.ctx.device.destroy_sampler(sampler, None);
            }
        }
    }
}

// ===== PIPELINE STATE =====

fn sample_count_to_vk(count: u32) -> Result<vk::SampleCountFlags> {
    match count {
        0 | 1 => Ok(vk::SampleCountFlags::TYPE_1),
        2 => Ok(vk::SampleCountFlags::TYPE_2),
        4 => Ok(vk::SampleCountFlags::TYPE_4),
        8 => Ok(vk::SampleCountFlags::TYPE_8),
        other => Err(dbl_err!(SOURCE, Unsupported, "Sample count {}", other)),
    }
}

/// Graphics pipeline for dynamic rendering
///
/// Viewport, scissor, primitive topology and vertex strides are dynamic state.
pub struct VulkanPipelineState {
    ctx: Arc<GpuContext>,
    pipeline: vk::Pipeline,
    _root_signature: Arc<dyn RootSignature>,
}

impl VulkanPipelineState {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &GraphicsPipelineStateDesc) -> Result<Self> {
        let root_signature = VulkanRootSignature::from_dyn(desc.root_signature.as_ref())?;
        let vertex_shader = VulkanShader::from_dyn(desc.vertex_shader.as_ref())?;
        let pixel_shader = VulkanShader::from_dyn(desc.pixel_shader.as_ref())?;

        if vertex_shader.stage != ShaderStage::Vertex || pixel_shader.stage != ShaderStage::Pixel {
            dbl_bail!(SOURCE, InitializationFailed,
                "Pipeline shaders have stages {:?}/{:?}, expected Vertex/Pixel",
                vertex_shader.stage, pixel_shader.stage);
        }
        for shader in [vertex_shader, pixel_shader] {
            validate_shader_interface(root_signature.desc(), &shader.name, &shader.reflection)?;
        }

        // Shader stages
        let vs_entry = CString::new(vertex_shader.entry_point.as_str())
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Invalid entry point: {}", e))?;
        let ps_entry = CString::new(pixel_shader.entry_point.as_str())
            .map_err(|e| dbl_err!(SOURCE, InitializationFailed, "Invalid entry point: {}", e))?;
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_shader.module)
                .name(&vs_entry),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(pixel_shader.module)
                .name(&ps_entry),
        ];

        // Vertex input: attribute location = element index; strides are dynamic
        let mut slots: Vec<u32> = desc.input_layout.iter().map(|element| element.input_slot).collect();
        slots.sort_unstable();
        slots.dedup();
        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = slots
            .iter()
            .map(|&slot| vk::VertexInputBindingDescription {
                binding: slot,
                stride: desc.input_layout
                    .iter()
                    .filter(|element| element.input_slot == slot)
                    .map(|element| element.aligned_byte_offset + element.format.size_in_bytes())
                    .max()
                    .unwrap_or(0),
                input_rate: vk::VertexInputRate::VERTEX,
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc.input_layout
            .iter()
            .enumerate()
            .map(|(location, element)| vk::VertexInputAttributeDescription {
                location: location as u32,
                binding: element.input_slot,
                format: buffer_format_to_vk(element.format),
                offset: element.aligned_byte_offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_type_to_vk(desc.primitive_topology_type))
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(cull_mode_to_vk(desc.rasterizer.cull_mode))
            .front_face(front_face_to_vk(desc.rasterizer.front_counter_clockwise))
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(sample_count_to_vk(desc.sample_count)?);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_stencil.depth_enable)
            .depth_write_enable(desc.depth_stencil.depth_write)
            .depth_compare_op(compare_op_to_vk(desc.depth_stencil.depth_func))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc.rtv_formats
            .iter()
            .map(|_| {
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(desc.blend.blend_enable)
                    .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                    .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                    .color_blend_op(vk::BlendOp::ADD)
                    .src_alpha_blend_factor(vk::BlendFactor::ONE)
                    .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                    .alpha_blend_op(vk::BlendOp::ADD)
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
            })
            .collect();
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [
            vk::DynamicState::VIEWPORT,
            vk::DynamicState::SCISSOR,
            vk::DynamicState::PRIMITIVE_TOPOLOGY,
            vk::DynamicState::VERTEX_INPUT_BINDING_STRIDE,
        ];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let color_formats: Vec<vk::Format> = desc.rtv_formats.iter().copied().map(texture_format_to_vk).collect();
        let mut rendering_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&color_formats)
            .depth_attachment_format(desc.dsv_format.map_or(vk::Format::UNDEFINED, texture_format_to_vk));

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(root_signature.layout())
            .push_next(&mut rendering_info);

        let pipeline = unsafe {
            ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
                .map_err(|(_, e)| dbl_err!(SOURCE, InitializationFailed, "Failed to create graphics pipeline: {:?}", e))?[0]
        };

        dbl_debug!(SOURCE, "Created graphics pipeline ({} + {})", vertex_shader.name, pixel_shader.name);
        Ok(Self {
            ctx,
            pipeline,
            _root_signature: desc.root_signature.clone(),
        })
    }

    pub(crate) fn pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl PipelineState for VulkanPipelineState {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipelineState {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
