/// Descriptor heaps and descriptor handles

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::Resource;

/// Kind of views a descriptor heap stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapKind {
    /// Render target views
    Rtv,
    /// Depth stencil views
    Dsv,
    /// Constant buffer / shader resource / unordered access views
    CbvSrvUav,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHeapDesc {
    pub kind: DescriptorHeapKind,
    pub capacity: u32,
    /// Heap may be bound with `CommandList::set_descriptor_heaps`
    pub shader_visible: bool,
}

impl DescriptorHeapDesc {
    /// Validate that slot `index` exists and accepts a view of `kind`
    pub fn check_slot(&self, index: u32, kind: DescriptorHeapKind) -> Result<()> {
        if self.kind != kind {
            return Err(Error::InvalidResource(format!(
                "cannot write a {:?} view into a {:?} heap",
                kind, self.kind
            )));
        }
        if index >= self.capacity {
            return Err(Error::InvalidResource(format!(
                "descriptor index {} out of range (capacity {})",
                index, self.capacity
            )));
        }
        Ok(())
    }
}

/// Array of resource views
///
/// Views are written in place; writing a slot replaces whatever view it held.
/// The heap keeps the viewed resource alive until the slot is overwritten or
/// the heap is dropped.
pub trait DescriptorHeap: Send + Sync {
    /// Unique id for handle comparison
    fn id(&self) -> u64;

    fn desc(&self) -> &DescriptorHeapDesc;

    /// Write a render target view into slot `index` (Rtv heaps)
    fn create_render_target_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()>;

    /// Write a depth stencil view into slot `index` (Dsv heaps)
    fn create_depth_stencil_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()>;

    /// Write a shader resource view into slot `index` (CbvSrvUav heaps)
    fn create_shader_resource_view(&self, index: u32, resource: &Arc<dyn Resource>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Handle to one slot of a descriptor heap
#[derive(Clone)]
pub struct DescriptorHandle {
    heap: Arc<dyn DescriptorHeap>,
    index: u32,
}

impl DescriptorHandle {
    /// # Errors
    ///
    /// Returns `InvalidResource` if `index` is past the heap's capacity.
    pub fn new(heap: &Arc<dyn DescriptorHeap>, index: u32) -> Result<Self> {
        if index >= heap.desc().capacity {
            return Err(Error::InvalidResource(format!(
                "descriptor index {} out of range (capacity {})",
                index,
                heap.desc().capacity
            )));
        }
        Ok(Self { heap: heap.clone(), index })
    }

    pub fn heap(&self) -> &Arc<dyn DescriptorHeap> {
        &self.heap
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl PartialEq for DescriptorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.heap.id() == other.heap.id() && self.index == other.index
    }
}

impl fmt::Debug for DescriptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorHandle")
            .field("heap", &self.heap.id())
            .field("kind", &self.heap.desc().kind)
            .field("index", &self.index)
            .finish()
    }
}
