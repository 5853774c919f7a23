//! Interleaved vertex data plus index data, in the shape backends upload
//!
//! Vertices are stored as a flat `f32` array with a fixed stride. Attribute
//! offsets are in bytes so a backend can hand them to the graphics API as is.

/// One vertex attribute inside the interleaved stride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Byte offset from the start of the vertex
    pub offset: usize,
    /// Number of `f32` components
    pub components: u8,
}

impl VertexAttribute {
    /// Attribute at `offset` bytes with `components` floats
    pub const fn new(offset: usize, components: u8) -> Self {
        Self { offset, components }
    }
}

/// Number of texture coordinate channels a layout can describe
pub const MAX_TEX_COORDS: usize = 4;

/// Attribute layout of an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Bytes per vertex
    pub stride: usize,
    /// Position, always present
    pub position: VertexAttribute,
    /// Normal
    pub normal: Option<VertexAttribute>,
    /// Texture coordinate channels
    pub tex_coords: [Option<VertexAttribute>; MAX_TEX_COORDS],
}

impl VertexLayout {
    /// Layout with a 3-component position at offset 0
    pub fn new(stride: usize) -> Self {
        Self {
            stride,
            position: VertexAttribute::new(0, 3),
            normal: None,
            tex_coords: [None; MAX_TEX_COORDS],
        }
    }

    /// Add a 3-component normal at `offset` bytes
    #[must_use]
    pub fn with_normal(mut self, offset: usize) -> Self {
        self.normal = Some(VertexAttribute::new(offset, 3));
        self
    }

    /// Add texture coordinate `channel`; out of range channels are ignored
    #[must_use]
    pub fn with_tex_coord(mut self, channel: usize, offset: usize, components: u8) -> Self {
        if let Some(slot) = self.tex_coords.get_mut(channel) {
            *slot = Some(VertexAttribute::new(offset, components));
        } else {
            log::warn!("Texture coordinate channel {} out of range", channel);
        }
        self
    }
}

/// Index element data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    /// 16-bit indices
    U16(Vec<u16>),
    /// 32-bit indices
    U32(Vec<u32>),
}

impl IndexData {
    /// Number of indices
    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(indices) => indices.len(),
            IndexData::U32(indices) => indices.len(),
        }
    }

    /// Whether there are no indices
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes per index
    pub fn element_size(&self) -> usize {
        match self {
            IndexData::U16(_) => 2,
            IndexData::U32(_) => 4,
        }
    }

    /// Index at `idx`, widened to `u32`
    pub fn get(&self, idx: usize) -> Option<u32> {
        match self {
            IndexData::U16(indices) => indices.get(idx).map(|&i| u32::from(i)),
            IndexData::U32(indices) => indices.get(idx).copied(),
        }
    }

    /// Indices of `[offset, offset + count)`, widened; `None` when out of range
    pub fn range(&self, offset: usize, count: usize) -> Option<Vec<u32>> {
        let end = offset.checked_add(count)?;
        match self {
            IndexData::U16(indices) => indices
                .get(offset..end)
                .map(|slice| slice.iter().map(|&i| u32::from(i)).collect()),
            IndexData::U32(indices) => indices.get(offset..end).map(<[u32]>::to_vec),
        }
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

impl Default for IndexData {
    fn default() -> Self {
        IndexData::U16(Vec::new())
    }
}

/// Interleaved vertex buffer with its index buffer
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    vertices: Vec<f32>,
    layout: VertexLayout,
    vertex_count: usize,
    indices: IndexData,
}

impl VertexBuffer {
    /// Create a buffer from flat vertex floats
    ///
    /// Returns `None` when the float count is not a whole number of vertices.
    pub fn new(vertices: Vec<f32>, layout: VertexLayout, indices: IndexData) -> Option<Self> {
        let floats_per_vertex = layout.stride / std::mem::size_of::<f32>();
        if floats_per_vertex == 0 || vertices.len() % floats_per_vertex != 0 {
            log::warn!(
                "Vertex data of {} floats does not fit a {} byte stride",
                vertices.len(),
                layout.stride
            );
            return None;
        }

        Some(Self {
            vertex_count: vertices.len() / floats_per_vertex,
            vertices,
            layout,
            indices,
        })
    }

    /// Attribute layout
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Bytes per vertex
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// All vertex floats
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Floats of vertex `idx`
    pub fn vertex(&self, idx: usize) -> Option<&[f32]> {
        let floats = self.layout.stride / std::mem::size_of::<f32>();
        let start = idx.checked_mul(floats)?;
        self.vertices.get(start..start.checked_add(floats)?)
    }

    /// Vertex data as bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data
    pub fn indices(&self) -> &IndexData {
        &self.indices
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}
