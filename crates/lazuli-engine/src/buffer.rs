use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::coords::Color;
use crate::device::{BufferUsage, Device, Topology};
use crate::id::ResourceId;

/// Fixed vertex layout consumed by every program.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Binding of one [`Vertex`] field to a shader attribute slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    pub components: i32,
    /// Byte offset inside [`Vertex`].
    pub offset: usize,
}

impl Vertex {
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            name: "a_position",
            location: 0,
            components: 3,
            offset: std::mem::offset_of!(Vertex, position),
        },
        VertexAttribute {
            name: "a_color",
            location: 1,
            components: 4,
            offset: std::mem::offset_of!(Vertex, color),
        },
        VertexAttribute {
            name: "a_texcoord",
            location: 2,
            components: 2,
            offset: std::mem::offset_of!(Vertex, uv),
        },
    ];

    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 4], uv: [f32; 2]) -> Self {
        Self { position, color, uv }
    }

    /// 2D vertex at `z = 0`.
    #[inline]
    pub fn xy(x: f32, y: f32, color: Color, u: f32, v: f32) -> Self {
        Self::new([x, y, 0.0], color.to_array(), [u, v])
    }
}

/// Persistent vertex storage with a fixed topology.
///
/// The allocation is sized at creation; updates may shrink the drawn range but
/// never reallocate.
pub struct Buffer<D: Device> {
    pub(crate) id: ResourceId,
    pub(crate) handle: D::Buffer,
    pub(crate) topology: Topology,
    pub(crate) usage: BufferUsage,
    pub(crate) len: usize,
    pub(crate) capacity: usize,
}

impl<D: Device> Buffer<D> {
    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn handle(&self) -> D::Buffer {
        self.handle
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Number of vertices drawn by [`Context::draw_buffer`](crate::Context::draw_buffer).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated vertex slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<D: Device> fmt::Debug for Buffer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("topology", &self.topology)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 9 * 4);
        assert_eq!(Vertex::ATTRIBUTES[0].offset, 0);
        assert_eq!(Vertex::ATTRIBUTES[1].offset, 12);
        assert_eq!(Vertex::ATTRIBUTES[2].offset, 28);
    }

    #[test]
    fn vertices_cast_to_bytes() {
        let v = [Vertex::xy(1.0, 2.0, Color::WHITE, 0.5, 0.25)];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), Vertex::STRIDE);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats, &[1.0, 2.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.25]);
    }
}
