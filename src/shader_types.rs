//! Types shared between host code and `shader.wgsl`.
//!
//! The shader reads these records by byte offset, so field order and
//! component widths must not change without updating the WGSL side.

use thiserror::Error;

/// Vertex buffer slots used by `set_vertex_buffer`. Must match the
/// `buffers` array order of every pipeline.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexInputIndex {
    Vertices = 0,
}

impl VertexInputIndex {
    pub const fn slot(self) -> u32 {
        self as u32
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OutlineVertex {
    // Homogeneous position, origin at the centre of the viewport
    pub pos: [f32; 4],

    // Premultiplied RGBA
    pub color: [f32; 4],
}

impl OutlineVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x4, // pos
        1 => Float32x4, // color
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OutlineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FullscreenVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl FullscreenVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FullscreenVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One triangle large enough to cover the whole viewport. UVs run past 1.0
/// outside the visible area.
pub const FULLSCREEN_TRIANGLE: [FullscreenVertex; 3] = [
    FullscreenVertex {
        pos: [-1.0, 3.0],
        uv: [0.0, 2.0],
    },
    FullscreenVertex {
        pos: [-1.0, -1.0],
        uv: [0.0, 0.0],
    },
    FullscreenVertex {
        pos: [3.0, -1.0],
        uv: [2.0, 0.0],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{len} bytes is not a whole number of {stride}-byte vertices")]
    TrailingBytes { len: usize, stride: usize },
}

/// Raw host-endian bytes of a vertex slice, as uploaded to the GPU.
pub fn vertex_bytes<T: bytemuck::Pod>(vertices: &[T]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Copies vertices back out of a byte buffer. The input does not need to be
/// aligned for `T`.
pub fn vertices_from_bytes<T: bytemuck::Pod>(bytes: &[u8]) -> Result<Vec<T>, LayoutError> {
    let stride = std::mem::size_of::<T>();
    if bytes.len() % stride != 0 {
        return Err(LayoutError::TrailingBytes {
            len: bytes.len(),
            stride,
        });
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

#[cfg(test)]
mod tests {
    use std::mem::{align_of, offset_of, size_of};

    use super::*;

    #[test]
    fn vertices_slot_is_zero() {
        assert_eq!(VertexInputIndex::Vertices.slot(), 0);
        assert_eq!(size_of::<VertexInputIndex>(), 4);
    }

    #[test]
    fn outline_vertex_layout() {
        assert_eq!(size_of::<OutlineVertex>(), 32);
        assert_eq!(align_of::<OutlineVertex>(), 4);
        assert_eq!(offset_of!(OutlineVertex, pos), 0);
        assert_eq!(offset_of!(OutlineVertex, color), 16);

        let desc = OutlineVertex::desc();
        assert_eq!(desc.array_stride, 32);
        assert_eq!(desc.attributes[0].offset, 0);
        assert_eq!(desc.attributes[1].offset, 16);
        assert_eq!(desc.attributes[1].shader_location, 1);
    }

    #[test]
    fn fullscreen_vertex_layout() {
        assert_eq!(size_of::<FullscreenVertex>(), 16);
        assert_eq!(align_of::<FullscreenVertex>(), 4);
        assert_eq!(offset_of!(FullscreenVertex, pos), 0);
        assert_eq!(offset_of!(FullscreenVertex, uv), 8);

        let desc = FullscreenVertex::desc();
        assert_eq!(desc.array_stride, 16);
        assert_eq!(desc.attributes[1].offset, 8);
        assert_eq!(desc.attributes[1].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn outline_vertex_serializes_in_field_order() {
        let v = OutlineVertex {
            pos: [100.0, 0.0, 0.0, 1.0],
            color: [1.0, 0.0, 0.0, 1.0],
        };
        let expected: Vec<u8> = [100.0f32, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]
            .iter()
            .flat_map(|f| f.to_ne_bytes())
            .collect();
        assert_eq!(vertex_bytes(&[v]), expected.as_slice());
    }

    #[test]
    fn outline_vertices_survive_byte_round_trip() {
        let original: Vec<OutlineVertex> = (0..7)
            .map(|i| {
                let f = i as f32;
                OutlineVertex {
                    pos: [f, -f, 0.5 * f, 1.0],
                    color: [0.8, 1.0, 0.9, f / 7.0],
                }
            })
            .collect();
        let bytes = vertex_bytes(&original).to_vec();
        let decoded: Vec<OutlineVertex> = vertices_from_bytes(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn fullscreen_triangle_survives_unaligned_decode() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(vertex_bytes(&FULLSCREEN_TRIANGLE));
        let decoded: Vec<FullscreenVertex> = vertices_from_bytes(&bytes[1..]).unwrap();
        assert_eq!(decoded, FULLSCREEN_TRIANGLE);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let bytes = [0u8; 20];
        let err = vertices_from_bytes::<FullscreenVertex>(&bytes).unwrap_err();
        assert_eq!(err, LayoutError::TrailingBytes { len: 20, stride: 16 });
    }

    #[test]
    fn fullscreen_triangle_covers_clip_space() {
        // Hypotenuse x + y = 2 passes through the (1, 1) corner.
        let [a, b, c] = FULLSCREEN_TRIANGLE;
        assert_eq!(a.pos[0] + a.pos[1], 2.0);
        assert_eq!(c.pos[0] + c.pos[1], 2.0);
        assert_eq!(b.pos, [-1.0, -1.0]);
        // uv tracks position linearly: uv = (pos + 1) / 2
        for v in FULLSCREEN_TRIANGLE {
            assert_eq!(v.uv, [(v.pos[0] + 1.0) / 2.0, (v.pos[1] + 1.0) / 2.0]);
        }
    }
}
