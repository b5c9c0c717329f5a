/// Resource trait, resource descriptors, heap types and resource states

use std::any::Any;
use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::TextureFormat;

const SOURCE: &str = "diabolic::graphics_device::resource";

/// Memory heap a committed resource lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapType {
    /// GPU-local memory, not CPU visible
    Default,
    /// CPU-writable, GPU-readable staging memory
    Upload,
    /// GPU-writable, CPU-readable memory
    Readback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDimension {
    Buffer,
    Texture1D,
    Texture2D,
    Texture3D,
}

bitflags! {
    /// Extra usages a resource must support
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceFlags: u32 {
        const ALLOW_RENDER_TARGET = 1 << 0;
        const ALLOW_DEPTH_STENCIL = 1 << 1;
        const ALLOW_UNORDERED_ACCESS = 1 << 2;
        const DENY_SHADER_RESOURCE = 1 << 3;
    }
}

/// Usage state of a resource, changed through transition barriers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Common,
    VertexAndConstantBuffer,
    IndexBuffer,
    RenderTarget,
    DepthWrite,
    DepthRead,
    PixelShaderResource,
    NonPixelShaderResource,
    CopyDest,
    CopySource,
    GenericRead,
    Present,
}

/// Clear value optimized for at resource creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u8 },
}

/// Description of a committed resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDesc {
    pub dimension: ResourceDimension,
    /// Size in bytes for buffers, width in texels for textures
    pub width: u64,
    pub height: u32,
    pub depth_or_array_size: u16,
    pub mip_levels: u16,
    /// None for buffers
    pub format: Option<TextureFormat>,
    pub flags: ResourceFlags,
}

impl ResourceDesc {
    /// Linear buffer of `size` bytes
    pub fn buffer(size: u64, flags: ResourceFlags) -> Self {
        Self {
            dimension: ResourceDimension::Buffer,
            width: size,
            height: 1,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: None,
            flags,
        }
    }

    /// Single-mip 2D texture
    pub fn texture_2d(width: u32, height: u32, format: TextureFormat, flags: ResourceFlags) -> Self {
        Self {
            dimension: ResourceDimension::Texture2D,
            width: width as u64,
            height,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: Some(format),
            flags,
        }
    }

    pub fn is_buffer(&self) -> bool {
        self.dimension == ResourceDimension::Buffer
    }
}

/// GPU resource (buffer or texture) created through `GraphicsDevice::create_committed_resource`
pub trait Resource: Send + Sync {
    /// Debug name given at creation
    fn name(&self) -> &str;

    fn desc(&self) -> &ResourceDesc;

    fn heap_type(&self) -> HeapType;

    /// Copy CPU data into the resource (map / memcpy / unmap)
    ///
    /// Only valid for `HeapType::Upload` buffers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if the resource is not CPU writable or the
    /// range exceeds its size.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Backend downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Check a `Resource::write` request against the resource's heap and size
pub fn validate_upload_write(
    name: &str,
    heap_type: HeapType,
    desc: &ResourceDesc,
    offset: u64,
    len: usize,
) -> Result<()> {
    if heap_type != HeapType::Upload || !desc.is_buffer() {
        crate::dbl_bail!(SOURCE, InvalidResource, "'{}' is not a CPU-writable upload buffer", name);
    }
    match offset.checked_add(len as u64) {
        Some(end) if end <= desc.width => Ok(()),
        _ => Err(crate::dbl_err!(SOURCE, InvalidResource,
            "write of {} bytes at offset {} exceeds '{}' ({} bytes)", len, offset, name, desc.width)),
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
