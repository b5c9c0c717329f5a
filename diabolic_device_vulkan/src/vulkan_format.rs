/// Conversions between DiaBolic graphics-device enums and Vulkan types

use ash::vk;
use diabolic::graphics_device::{
    AddressMode, BufferFormat, ComparisonFunc, CullMode, Filter, IndexType, PrimitiveTopology,
    PrimitiveTopologyType, ResourceState, ShaderVisibility, TextureFormat,
};

pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
    }
}

/// Inverse of `texture_format_to_vk` (None for formats DiaBolic does not model)
pub(crate) fn texture_format_from_vk(format: vk::Format) -> Option<TextureFormat> {
    match format {
        vk::Format::R8G8B8A8_UNORM => Some(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::R8G8B8A8_SRGB => Some(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::B8G8R8A8_SRGB => Some(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::D32_SFLOAT => Some(TextureFormat::D32_FLOAT),
        _ => None,
    }
}

pub(crate) fn buffer_format_to_vk(format: BufferFormat) -> vk::Format {
    match format {
        BufferFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        BufferFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        BufferFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        BufferFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

/// Topology baked into the pipeline; the exact list/strip choice stays dynamic
pub(crate) fn topology_type_to_vk(topology_type: PrimitiveTopologyType) -> vk::PrimitiveTopology {
    match topology_type {
        PrimitiveTopologyType::Point => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopologyType::Line => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopologyType::Triangle => vk::PrimitiveTopology::TRIANGLE_LIST,
    }
}

pub(crate) fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

/// The viewport is flipped (negative height), so winding keeps its y-up meaning
pub(crate) fn front_face_to_vk(front_counter_clockwise: bool) -> vk::FrontFace {
    if front_counter_clockwise {
        vk::FrontFace::COUNTER_CLOCKWISE
    } else {
        vk::FrontFace::CLOCKWISE
    }
}

pub(crate) fn compare_op_to_vk(func: ComparisonFunc) -> vk::CompareOp {
    match func {
        ComparisonFunc::Never => vk::CompareOp::NEVER,
        ComparisonFunc::Less => vk::CompareOp::LESS,
        ComparisonFunc::Equal => vk::CompareOp::EQUAL,
        ComparisonFunc::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        ComparisonFunc::Greater => vk::CompareOp::GREATER,
        ComparisonFunc::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        ComparisonFunc::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn filter_to_vk(filter: Filter) -> (vk::Filter, vk::SamplerMipmapMode) {
    match filter {
        Filter::Point => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
        Filter::Linear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR),
    }
}

pub(crate) fn address_mode_to_vk(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Wrap => vk::SamplerAddressMode::REPEAT,
        AddressMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
    }
}

pub(crate) fn visibility_to_vk(visibility: ShaderVisibility) -> vk::ShaderStageFlags {
    match visibility {
        ShaderVisibility::All => vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
        ShaderVisibility::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderVisibility::Pixel => vk::ShaderStageFlags::FRAGMENT,
    }
}

/// Image aspect a view or barrier of `format` touches
pub(crate) fn aspect_for_format(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D32_SFLOAT | vk::Format::D16_UNORM => vk::ImageAspectFlags::DEPTH,
        vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::COLOR,
    }
}

/// Synchronization scope of a resource state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StateScope {
    pub layout: vk::ImageLayout,
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
}

/// Layout, stages and accesses a resource state stands for
///
/// `as_source` marks the before-half of a transition: presentable images carry
/// no content worth preserving, so leaving `Present` discards them (UNDEFINED).
pub(crate) fn state_to_vk(state: ResourceState, as_source: bool) -> StateScope {
    use vk::AccessFlags2 as A;
    use vk::ImageLayout as L;
    use vk::PipelineStageFlags2 as S;

    let (layout, stage, access) = match state {
        ResourceState::Common => (L::GENERAL, S::ALL_COMMANDS, A::MEMORY_READ | A::MEMORY_WRITE),
        ResourceState::VertexAndConstantBuffer => (
            L::GENERAL,
            S::VERTEX_ATTRIBUTE_INPUT | S::VERTEX_SHADER | S::FRAGMENT_SHADER,
            A::VERTEX_ATTRIBUTE_READ | A::UNIFORM_READ,
        ),
        ResourceState::IndexBuffer => (L::GENERAL, S::INDEX_INPUT, A::INDEX_READ),
        ResourceState::RenderTarget => (
            L::COLOR_ATTACHMENT_OPTIMAL,
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
        ),
        ResourceState::DepthWrite => (
            L::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS,
            A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        ResourceState::DepthRead => (
            L::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            S::EARLY_FRAGMENT_TESTS | S::LATE_FRAGMENT_TESTS | S::FRAGMENT_SHADER,
            A::DEPTH_STENCIL_ATTACHMENT_READ | A::SHADER_SAMPLED_READ,
        ),
        ResourceState::PixelShaderResource => (
            L::SHADER_READ_ONLY_OPTIMAL,
            S::FRAGMENT_SHADER,
            A::SHADER_SAMPLED_READ,
        ),
        ResourceState::NonPixelShaderResource => (
            L::SHADER_READ_ONLY_OPTIMAL,
            S::VERTEX_SHADER | S::COMPUTE_SHADER,
            A::SHADER_SAMPLED_READ,
        ),
        ResourceState::CopyDest => (L::TRANSFER_DST_OPTIMAL, S::COPY, A::TRANSFER_WRITE),
        ResourceState::CopySource => (L::TRANSFER_SRC_OPTIMAL, S::COPY, A::TRANSFER_READ),
        ResourceState::GenericRead => (L::GENERAL, S::ALL_COMMANDS, A::MEMORY_READ),
        ResourceState::Present if as_source => (L::UNDEFINED, S::NONE, A::NONE),
        ResourceState::Present => (L::PRESENT_SRC_KHR, S::NONE, A::NONE),
    };

    StateScope { layout, stage, access }
}

/// Narrow a scope to what a transfer-only queue supports
pub(crate) fn restrict_to_transfer(scope: StateScope) -> StateScope {
    use vk::AccessFlags2 as A;
    use vk::PipelineStageFlags2 as S;

    let transfer_stages = S::COPY | S::TRANSFER | S::ALL_COMMANDS | S::NONE;
    if transfer_stages.contains(scope.stage) {
        return scope;
    }
    StateScope {
        layout: scope.layout,
        stage: S::ALL_COMMANDS,
        access: if scope.access.is_empty() { A::NONE } else { A::MEMORY_READ | A::MEMORY_WRITE },
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
