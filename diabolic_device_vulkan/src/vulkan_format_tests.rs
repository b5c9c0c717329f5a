//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings, no GPU required.

use super::*;

// ============================================================================
// FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_texture_format_round_trips_through_vk() {
    for format in [
        TextureFormat::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB,
        TextureFormat::D32_FLOAT,
    ] {
        assert_eq!(texture_format_from_vk(texture_format_to_vk(format)), Some(format));
    }
}

#[test]
fn test_unknown_surface_format_is_not_mapped() {
    assert_eq!(texture_format_from_vk(vk::Format::A2B10G10R10_UNORM_PACK32), None);
    assert_eq!(texture_format_from_vk(vk::Format::R16G16B16A16_SFLOAT), None);
}

#[test]
fn test_vertex_attribute_formats() {
    assert_eq!(buffer_format_to_vk(BufferFormat::R32_SFLOAT), vk::Format::R32_SFLOAT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32_SFLOAT), vk::Format::R32G32_SFLOAT);
    assert_eq!(buffer_format_to_vk(BufferFormat::R32G32B32_SFLOAT), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(
        buffer_format_to_vk(BufferFormat::R32G32B32A32_SFLOAT),
        vk::Format::R32G32B32A32_SFLOAT
    );
}

#[test]
fn test_index_types() {
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

#[test]
fn test_depth_formats_use_depth_aspect() {
    assert_eq!(aspect_for_format(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        aspect_for_format(vk::Format::D24_UNORM_S8_UINT),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
    assert_eq!(aspect_for_format(vk::Format::R8G8B8A8_UNORM), vk::ImageAspectFlags::COLOR);
}

// ============================================================================
// PIPELINE STATE CONVERSION TESTS
// ============================================================================

#[test]
fn test_topologies() {
    assert_eq!(topology_to_vk(PrimitiveTopology::TriangleList), vk::PrimitiveTopology::TRIANGLE_LIST);
    assert_eq!(topology_to_vk(PrimitiveTopology::TriangleStrip), vk::PrimitiveTopology::TRIANGLE_STRIP);
    assert_eq!(topology_to_vk(PrimitiveTopology::LineList), vk::PrimitiveTopology::LINE_LIST);
    assert_eq!(
        topology_type_to_vk(PrimitiveTopologyType::Triangle),
        vk::PrimitiveTopology::TRIANGLE_LIST
    );
}

#[test]
fn test_rasterizer_conversions() {
    assert_eq!(cull_mode_to_vk(CullMode::Back), vk::CullModeFlags::BACK);
    assert_eq!(cull_mode_to_vk(CullMode::None), vk::CullModeFlags::NONE);
    assert_eq!(front_face_to_vk(true), vk::FrontFace::COUNTER_CLOCKWISE);
    assert_eq!(front_face_to_vk(false), vk::FrontFace::CLOCKWISE);
}

#[test]
fn test_depth_compare_ops() {
    assert_eq!(compare_op_to_vk(ComparisonFunc::Less), vk::CompareOp::LESS);
    assert_eq!(compare_op_to_vk(ComparisonFunc::LessEqual), vk::CompareOp::LESS_OR_EQUAL);
    assert_eq!(compare_op_to_vk(ComparisonFunc::Always), vk::CompareOp::ALWAYS);
}

#[test]
fn test_sampler_conversions() {
    assert_eq!(filter_to_vk(Filter::Linear), (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR));
    assert_eq!(filter_to_vk(Filter::Point), (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST));
    assert_eq!(address_mode_to_vk(AddressMode::Wrap), vk::SamplerAddressMode::REPEAT);
    assert_eq!(address_mode_to_vk(AddressMode::Clamp), vk::SamplerAddressMode::CLAMP_TO_EDGE);
}

#[test]
fn test_visibility_all_covers_both_stages() {
    let all = visibility_to_vk(ShaderVisibility::All);
    assert!(all.contains(vk::ShaderStageFlags::VERTEX));
    assert!(all.contains(vk::ShaderStageFlags::FRAGMENT));
    assert_eq!(visibility_to_vk(ShaderVisibility::Pixel), vk::ShaderStageFlags::FRAGMENT);
}

// ============================================================================
// RESOURCE STATE TESTS
// ============================================================================

#[test]
fn test_present_as_source_discards_contents() {
    let before = state_to_vk(ResourceState::Present, true);
    assert_eq!(before.layout, vk::ImageLayout::UNDEFINED);

    let after = state_to_vk(ResourceState::Present, false);
    assert_eq!(after.layout, vk::ImageLayout::PRESENT_SRC_KHR);
}

#[test]
fn test_render_target_and_depth_layouts() {
    assert_eq!(
        state_to_vk(ResourceState::RenderTarget, false).layout,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
    );
    let depth = state_to_vk(ResourceState::DepthWrite, false);
    assert_eq!(depth.layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    assert!(depth.access.contains(vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE));
}

#[test]
fn test_copy_and_shader_read_states() {
    let copy = state_to_vk(ResourceState::CopyDest, true);
    assert_eq!(copy.layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(copy.stage, vk::PipelineStageFlags2::COPY);

    let sampled = state_to_vk(ResourceState::PixelShaderResource, false);
    assert_eq!(sampled.layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(sampled.stage, vk::PipelineStageFlags2::FRAGMENT_SHADER);
}

#[test]
fn test_transfer_restriction_keeps_copy_scopes() {
    let copy = state_to_vk(ResourceState::CopyDest, true);
    assert_eq!(restrict_to_transfer(copy), copy);

    let common = state_to_vk(ResourceState::Common, false);
    assert_eq!(restrict_to_transfer(common), common);
}

#[test]
fn test_transfer_restriction_widens_graphics_stages() {
    let vertex = state_to_vk(ResourceState::VertexAndConstantBuffer, false);
    let restricted = restrict_to_transfer(vertex);
    assert_eq!(restricted.stage, vk::PipelineStageFlags2::ALL_COMMANDS);
    assert_eq!(restricted.access, vk::AccessFlags2::MEMORY_READ | vk::AccessFlags2::MEMORY_WRITE);
    assert_eq!(restricted.layout, vertex.layout);
}
