//! GPU meshes.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use vermeil_core::mesh::{MeshData, PrimitiveTopology};

use crate::backend::{BufferHandle, BufferKind, RenderBackend};
use crate::error::RenderError;

use super::arena::ArenaEntry;

/// Backend command encoding of a primitive topology.
pub(crate) fn topology_raw(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::PointList => 0,
        PrimitiveTopology::LineList => 1,
        PrimitiveTopology::LineStrip => 3,
        PrimitiveTopology::TriangleList => 4,
        PrimitiveTopology::TriangleStrip => 5,
    }
}

/// GPU-side buffer pair of an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    /// Interleaved vertex buffer.
    pub vertex: BufferHandle,
    /// Index buffer, absent for non-indexed meshes.
    pub index: Option<BufferHandle>,
}

/// A device-owned mesh: CPU data plus uploaded GPU buffers.
///
/// Created by `RenderDevice::make_mesh`, which validates the data before
/// anything is registered. The CPU-side [`MeshData`] is retained so the
/// GPU buffers can be reconstructed after a context restore.
#[derive(Debug)]
pub struct Mesh {
    data: MeshData,
    topology_raw: u32,
    gpu: RwLock<Option<MeshBuffers>>,
    index: AtomicUsize,
}

impl Mesh {
    pub(crate) fn new(data: MeshData, backend: &dyn RenderBackend) -> Result<Self, RenderError> {
        let buffers = Self::upload(&data, backend)?;
        Ok(Self {
            topology_raw: topology_raw(data.topology),
            data,
            gpu: RwLock::new(Some(buffers)),
            index: AtomicUsize::new(usize::MAX),
        })
    }

    fn upload(data: &MeshData, backend: &dyn RenderBackend) -> Result<MeshBuffers, RenderError> {
        let vertex = backend.create_buffer(BufferKind::Vertex, &data.vertex_bytes())?;
        let index = if data.indices.is_some() {
            Some(backend.create_buffer(BufferKind::Index, &data.index_bytes())?)
        } else {
            None
        };
        Ok(MeshBuffers { vertex, index })
    }

    /// The CPU-side mesh data.
    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.data.vertex_count()
    }

    /// Number of primitives drawn per instance.
    pub fn primitive_count(&self) -> u32 {
        self.data.primitive_count()
    }

    /// Number of elements one draw call consumes.
    pub fn element_count(&self) -> u32 {
        self.data.element_count()
    }

    /// Bounding sphere radius around the mesh origin.
    pub fn bounding_radius(&self) -> f32 {
        self.data.bounding_radius()
    }

    /// Backend command encoding of the topology.
    pub fn topology_raw(&self) -> u32 {
        self.topology_raw
    }

    /// Whether this mesh draws with an index buffer.
    pub fn indexed(&self) -> bool {
        self.data.indices.is_some()
    }

    /// GPU buffers, if currently uploaded.
    pub fn buffers(&self) -> Option<MeshBuffers> {
        self.gpu.read().ok().and_then(|gpu| *gpu)
    }

    /// Release the GPU buffers. Idempotent.
    pub fn free(&self, backend: &dyn RenderBackend) {
        let taken = self.gpu.write().ok().and_then(|mut gpu| gpu.take());
        if let Some(buffers) = taken {
            backend.destroy_buffer(buffers.vertex);
            if let Some(index) = buffers.index {
                backend.destroy_buffer(index);
            }
        }
    }

    /// Reconstruct the GPU buffers after a context restore.
    pub fn restore(&self, backend: &dyn RenderBackend) -> Result<(), RenderError> {
        let buffers = Self::upload(&self.data, backend)?;
        if let Ok(mut gpu) = self.gpu.write() {
            *gpu = Some(buffers);
        }
        Ok(())
    }
}

impl ArenaEntry for Mesh {
    fn arena_index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn set_arena_index(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
    }
}
