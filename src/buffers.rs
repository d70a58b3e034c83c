use crate::lines::LineBatch;
use crate::shader_types::{OutlineVertex, vertex_bytes};

const VERTICES_PER_LINE: usize = 4;
// A line quad plus one bridging quad at its end.
const INDICES_PER_LINE: usize = 12;

/// GPU copies of a [`LineBatch`], grown on demand.
pub struct LineBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    line_capacity: usize,
}

impl LineBuffers {
    pub fn new(device: &wgpu::Device, line_capacity: usize) -> Self {
        let line_capacity = line_capacity.max(1);
        Self {
            vertex: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Outline Vertex Buffer"),
                size: (line_capacity * VERTICES_PER_LINE * std::mem::size_of::<OutlineVertex>())
                    as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            index: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Outline Index Buffer"),
                size: (line_capacity * INDICES_PER_LINE * std::mem::size_of::<u16>())
                    as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            line_capacity,
        }
    }

    /// Copies `batch` to the GPU, reallocating first if it does not fit.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batch: &LineBatch) {
        if let Some(capacity) =
            grown_capacity(self.line_capacity, batch.vertices().len(), batch.indices().len())
        {
            log::debug!(
                "growing outline buffers from {} to {} lines",
                self.line_capacity,
                capacity
            );
            *self = Self::new(device, capacity);
        }

        if batch.is_empty() {
            return;
        }
        queue.write_buffer(&self.vertex, 0, vertex_bytes(batch.vertices()));
        queue.write_buffer(&self.index, 0, bytemuck::cast_slice(batch.indices()));
    }
}

/// New line capacity when `vertices`/`indices` overflow `current`, sized at
/// twice what is needed.
fn grown_capacity(current: usize, vertices: usize, indices: usize) -> Option<usize> {
    let needed = vertices
        .div_ceil(VERTICES_PER_LINE)
        .max(indices.div_ceil(INDICES_PER_LINE));
    (needed > current).then_some(needed * 2)
}
