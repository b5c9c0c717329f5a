/// Resource upload utility
///
/// Uploads CPU data into GPU-local resources through upload-heap staging
/// resources, and records state transitions through `TrackedResource`.

use std::path::Path;
use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, DescriptorHeap, GraphicsDevice, HeapType, IndexBufferView, IndexType, QueueKind,
    Resource, ResourceBarrier, ResourceDesc, ResourceDimension, ResourceFlags, ResourceState,
    TextureCopyLayout, TextureFormat, VertexBufferView,
};

const SOURCE: &str = "diabolic::resource_util";

// ===== STATE TRACKING =====

/// Resource paired with the state it is currently in
pub struct TrackedResource {
    resource: Arc<dyn Resource>,
    state: ResourceState,
}

impl TrackedResource {
    pub fn new(resource: Arc<dyn Resource>, state: ResourceState) -> Self {
        Self { resource, state }
    }

    pub fn resource(&self) -> &Arc<dyn Resource> {
        &self.resource
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Transition from the tracked state to `after`
    pub fn transition_to(&mut self, command_list: &mut dyn CommandList, after: ResourceState) -> Result<()> {
        let before = self.state;
        transition_resource(command_list, self, before, after)
    }
}

/// Record a transition barrier on `resource`
///
/// A transition to the state the resource is already in records nothing.
///
/// # Errors
///
/// Returns `InvalidResourceState` without recording anything if `before` is not
/// the tracked state.
pub fn transition_resource(
    command_list: &mut dyn CommandList,
    resource: &mut TrackedResource,
    before: ResourceState,
    after: ResourceState,
) -> Result<()> {
    if resource.state != before {
        crate::dbl_error!(
            SOURCE,
            "transition of '{}' expects {:?} but it is in {:?}",
            resource.resource.name(),
            before,
            resource.state
        );
        return Err(Error::InvalidResourceState {
            expected: before,
            actual: resource.state,
        });
    }
    if before == after {
        return Ok(());
    }

    command_list.resource_barrier(&[ResourceBarrier::transition(&resource.resource, before, after)])?;
    resource.state = after;
    Ok(())
}

// ===== UPLOADS =====

/// GPU-local resource plus the staging resource feeding it
///
/// `intermediate` must stay alive until the queue that executes the recorded
/// copy has reached the submission's fence value.
pub struct UploadedResource {
    pub destination: TrackedResource,
    pub intermediate: Option<Arc<dyn Resource>>,
}

/// Create a default-heap buffer of `element_count * element_size` bytes
///
/// With `data`, an upload-heap staging buffer is filled and a copy into the
/// destination is recorded on `command_list`. The destination is returned in
/// `ResourceState::Common`.
///
/// # Errors
///
/// Returns `InvalidResource` for an empty buffer or when `data` does not match
/// the requested size.
pub fn load_buffer_resource(
    device: &dyn GraphicsDevice,
    command_list: &mut dyn CommandList,
    element_count: usize,
    element_size: usize,
    data: Option<&[u8]>,
    flags: ResourceFlags,
    name: &str,
) -> Result<UploadedResource> {
    let size = element_count
        .checked_mul(element_size)
        .filter(|size| *size > 0)
        .ok_or_else(|| {
            crate::dbl_err!(
                SOURCE,
                InvalidResource,
                "'{}': invalid buffer size {} x {}",
                name,
                element_count,
                element_size
            )
        })?;

    if let Some(data) = data {
        if data.len() != size {
            crate::dbl_bail!(
                SOURCE,
                InvalidResource,
                "'{}': {} bytes of data for a {} byte buffer",
                name,
                data.len(),
                size
            );
        }
    }

    let destination = device.create_committed_resource(
        HeapType::Default,
        &ResourceDesc::buffer(size as u64, flags),
        ResourceState::Common,
        None,
        name,
    )?;

    let intermediate = match data {
        Some(data) => {
            let intermediate = device.create_committed_resource(
                HeapType::Upload,
                &ResourceDesc::buffer(size as u64, ResourceFlags::empty()),
                ResourceState::GenericRead,
                None,
                &format!("{}_upload", name),
            )?;
            intermediate.write(0, data)?;
            command_list.copy_buffer_region(&destination, 0, &intermediate, 0, size as u64)?;
            Some(intermediate)
        }
        None => None,
    };

    crate::dbl_debug!(
        SOURCE,
        "Buffer '{}' created ({} bytes, {})",
        name,
        size,
        if intermediate.is_some() { "upload recorded" } else { "no data" }
    );

    Ok(UploadedResource {
        destination: TrackedResource::new(destination, ResourceState::Common),
        intermediate,
    })
}

/// Load an image file into a 2D texture and create its shader resource view
///
/// The image is decoded to RGBA8 and flipped vertically. Pixels go through an
/// upload-heap staging buffer with rows padded to the texture copy pitch. On a
/// direct list the texture ends in `PixelShaderResource`; copy lists cannot use
/// that state, so there it ends in `Common`.
///
/// # Errors
///
/// * `Unsupported` - 1D/3D dimension or a format the loader cannot fill
/// * `AssetLoadFailed` - the file cannot be read or decoded
pub fn load_texture_from_file(
    device: &dyn GraphicsDevice,
    command_list: &mut dyn CommandList,
    srv_heap: &Arc<dyn DescriptorHeap>,
    srv_index: u32,
    path: &Path,
    format: TextureFormat,
    dimension: ResourceDimension,
) -> Result<UploadedResource> {
    match dimension {
        ResourceDimension::Texture2D => {}
        ResourceDimension::Texture1D | ResourceDimension::Texture3D => {
            crate::dbl_bail!(SOURCE, Unsupported, "{:?} textures are not implemented", dimension);
        }
        ResourceDimension::Buffer => {
            crate::dbl_bail!(SOURCE, InvalidResource, "a texture cannot have a buffer dimension");
        }
    }
    if !format.is_rgba8() {
        crate::dbl_bail!(SOURCE, Unsupported, "cannot load image data into {:?}", format);
    }

    let image = image::open(path).map_err(|e| {
        crate::dbl_err!(SOURCE, AssetLoadFailed, "failed to decode '{}': {}", path.display(), e)
    })?;
    let pixels = image.flipv().to_rgba8();
    let (width, height) = pixels.dimensions();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "texture".to_string());

    let texture = device.create_committed_resource(
        HeapType::Default,
        &ResourceDesc::texture_2d(width, height, format, ResourceFlags::empty()),
        ResourceState::CopyDest,
        None,
        &name,
    )?;

    let layout = TextureCopyLayout::for_texture(width, height, format);
    let staging_data = pad_rows(pixels.as_raw(), width * format.bytes_per_pixel(), &layout);
    let staging = device.create_committed_resource(
        HeapType::Upload,
        &ResourceDesc::buffer(layout.total_size(), ResourceFlags::empty()),
        ResourceState::GenericRead,
        None,
        &format!("{}_upload", name),
    )?;
    staging.write(0, &staging_data)?;
    command_list.copy_texture_region(&texture, &staging, &layout)?;

    let final_state = match command_list.kind() {
        QueueKind::Direct => ResourceState::PixelShaderResource,
        QueueKind::Copy => ResourceState::Common,
    };
    let mut destination = TrackedResource::new(texture, ResourceState::CopyDest);
    destination.transition_to(command_list, final_state)?;

    srv_heap.create_shader_resource_view(srv_index, destination.resource())?;

    crate::dbl_info!(
        SOURCE,
        "Texture '{}' loaded ({}x{}, {:?})",
        path.display(),
        width,
        height,
        format
    );

    Ok(UploadedResource {
        destination,
        intermediate: Some(staging),
    })
}

/// Copy tightly packed rows into a buffer laid out with `layout.row_pitch`
fn pad_rows(pixels: &[u8], row_bytes: u32, layout: &TextureCopyLayout) -> Vec<u8> {
    let mut padded = vec![0u8; layout.total_size() as usize];
    let row_bytes = row_bytes as usize;
    for (row, source) in pixels.chunks_exact(row_bytes).enumerate() {
        let start = layout.offset as usize + row * layout.row_pitch as usize;
        padded[start..start + row_bytes].copy_from_slice(source);
    }
    padded
}

// ===== VIEWS =====

/// View over a whole vertex buffer
pub fn vertex_buffer_view(resource: &Arc<dyn Resource>, stride_in_bytes: u32) -> VertexBufferView {
    VertexBufferView {
        resource: resource.clone(),
        size_in_bytes: resource.desc().width as u32,
        stride_in_bytes,
    }
}

/// View over a whole index buffer
pub fn index_buffer_view(resource: &Arc<dyn Resource>, format: IndexType) -> IndexBufferView {
    IndexBufferView {
        resource: resource.clone(),
        size_in_bytes: resource.desc().width as u32,
        format,
    }
}

#[cfg(test)]
#[path = "resource_util_tests.rs"]
mod tests;
