//! CPU-side mesh data structures.

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Get the number of vertices consumed per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::LineStrip | Self::TriangleStrip => None, // Variable
        }
    }

    /// Number of primitives produced by `element_count` vertices or indices.
    pub fn primitive_count(&self, element_count: u32) -> u32 {
        match self {
            Self::PointList => element_count,
            Self::LineList => element_count / 2,
            Self::LineStrip => element_count.saturating_sub(1),
            Self::TriangleList => element_count / 3,
            Self::TriangleStrip => element_count.saturating_sub(2),
        }
    }
}

/// Interleaved vertex as uploaded to the GPU (position + normal + uv).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PnuVertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// CPU-side mesh data.
///
/// Attribute arrays are stored separately and interleaved on upload via
/// [`vertex_bytes`](Self::vertex_bytes). Normals and uvs are optional;
/// missing attributes are zero-filled in the interleaved buffer so every
/// mesh shares one vertex layout.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (empty or one per position).
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (empty or one per position).
    pub uvs: Vec<[f32; 2]>,
    /// Index data (`None` for non-indexed meshes).
    pub indices: Option<Vec<u32>>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
}

impl MeshData {
    /// Create mesh data from positions only.
    pub fn from_positions(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    /// Set the normals.
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    /// Set the texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Set the index data.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Number of elements a draw call consumes (indices if indexed, vertices otherwise).
    pub fn element_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertex_count(),
        }
    }

    /// Number of primitives this mesh draws.
    pub fn primitive_count(&self) -> u32 {
        self.topology.primitive_count(self.element_count())
    }

    /// Radius of the bounding sphere around the origin.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .fold(0.0, f32::max)
    }

    /// Validate internal consistency.
    ///
    /// Checks that positions are present, optional attribute arrays match
    /// the vertex count, and all indices are in range.
    pub fn validate(&self) -> Result<(), String> {
        if self.positions.is_empty() {
            return Err("mesh has no positions".to_string());
        }
        if !self.normals.is_empty() && self.normals.len() != self.positions.len() {
            return Err(format!(
                "normal count {} does not match position count {}",
                self.normals.len(),
                self.positions.len()
            ));
        }
        if !self.uvs.is_empty() && self.uvs.len() != self.positions.len() {
            return Err(format!(
                "uv count {} does not match position count {}",
                self.uvs.len(),
                self.positions.len()
            ));
        }
        if let Some(indices) = &self.indices {
            if indices.is_empty() {
                return Err("indexed mesh has no indices".to_string());
            }
            let limit = self.positions.len() as u32;
            if let Some(bad) = indices.iter().find(|&&i| i >= limit) {
                return Err(format!("index {bad} out of range for {limit} vertices"));
            }
        }
        Ok(())
    }

    /// Interleave attributes into one vertex buffer (position + normal + uv).
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let vertices: Vec<PnuVertex> = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| PnuVertex {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0; 3]),
                uv: self.uvs.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect();
        bytemuck::cast_slice(&vertices).to_vec()
    }

    /// Index data as bytes (empty for non-indexed meshes).
    pub fn index_bytes(&self) -> Vec<u8> {
        match &self.indices {
            Some(indices) => bytemuck::cast_slice(indices).to_vec(),
            None => Vec::new(),
        }
    }
}
