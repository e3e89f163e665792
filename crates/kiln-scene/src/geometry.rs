use bytemuck::{Pod, Zeroable};

/// Vertex layout shared by every draw: position and a per-vertex color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexPositionColor {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// CPU-side mesh uploaded once per device generation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<VertexPositionColor>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Unit cube centered on the origin. Each corner is colored by its
    /// position, so opposite corners are black and white.
    pub fn cube() -> Self {
        let mut vertices = Vec::with_capacity(8);
        for i in 0..8u8 {
            let x = if i & 4 != 0 { 0.5 } else { -0.5 };
            let y = if i & 2 != 0 { 0.5 } else { -0.5 };
            let z = if i & 1 != 0 { 0.5 } else { -0.5 };
            vertices.push(VertexPositionColor {
                position: [x, y, z],
                color: [x + 0.5, y + 0.5, z + 0.5],
            });
        }

        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, // -x
            1, 2, 3,
            4, 5, 6, // +x
            5, 7, 6,
            0, 1, 5, // -y
            0, 5, 4,
            2, 6, 7, // +y
            2, 7, 3,
            0, 4, 6, // -z
            0, 6, 2,
            1, 3, 7, // +z
            1, 7, 5,
        ];

        Self { vertices, indices }
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}
