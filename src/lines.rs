//! CPU-side batching of thick lines into quads of [`OutlineVertex`].
//!
//! Endpoints are projected and perspective-divided on the CPU so that lines
//! keep the same on-screen thickness regardless of distance from the camera.

use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

use crate::shader_types::OutlineVertex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line batch is full: {vertices} vertices cannot be addressed with u16 indices")]
    IndexOverflow { vertices: usize },
}

/// Clip transform and viewport aspect ratio used to place lines on screen.
#[derive(Copy, Clone, Debug)]
pub struct Projection {
    pub mvp: Mat4,
    pub aspect: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineStyle {
    pub thickness: f32,
    pub color: [f32; 4],
}

/// Vertex indices of one emitted line quad.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    base: u16,
}

impl Segment {
    pub fn start(&self) -> [u16; 2] {
        [self.base, self.base + 1]
    }

    pub fn end(&self) -> [u16; 2] {
        [self.base + 2, self.base + 3]
    }
}

#[derive(Debug, Default)]
pub struct LineBatch {
    vertices: Vec<OutlineVertex>,
    indices: Vec<u16>,
    line_count: usize,
}

impl LineBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.line_count = 0;
    }

    pub fn vertices(&self) -> &[OutlineVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Two triangles, `v0 v1 v2` and `v2 v1 v3`.
    pub fn push_quad(&mut self, v0: u16, v1: u16, v2: u16, v3: u16) {
        self.indices.extend_from_slice(&[v0, v1, v2, v2, v1, v3]);
    }

    /// Fills the gap between two pairs of line-edge vertices.
    pub fn bridge(&mut self, a: [u16; 2], b: [u16; 2]) {
        self.push_quad(a[0], a[1], b[0], b[1]);
    }

    /// Appends a line from `a` to `b`. Returns `None` when both endpoints
    /// land on the same screen position and there is nothing to draw.
    pub fn draw_line(
        &mut self,
        a: Vec3,
        b: Vec3,
        style: &LineStyle,
        projection: &Projection,
    ) -> Result<Option<Segment>, LineError> {
        let base = self.vertices.len();
        if base + 4 > usize::from(u16::MAX) + 1 {
            return Err(LineError::IndexOverflow { vertices: base + 4 });
        }

        let screen_a = to_screen(projection.mvp * a.extend(1.0));
        let screen_b = to_screen(projection.mvp * b.extend(1.0));

        // perpendicular to a -> b, measured with x stretched to match y
        let nx = -(screen_b.y - screen_a.y);
        let ny = (screen_b.x - screen_a.x) * projection.aspect;
        let length = (nx * nx + ny * ny).sqrt();
        if length <= f32::EPSILON {
            log::trace!("skipping degenerate line {a} -> {b}");
            return Ok(None);
        }

        let scale = length / (style.thickness * 0.5);
        let tx = nx / scale;
        let ty = ny / scale * projection.aspect;

        let base = base as u16;
        self.push_quad(base, base + 1, base + 2, base + 3);

        for (p, sign) in [(screen_a, 1.0), (screen_a, -1.0), (screen_b, 1.0), (screen_b, -1.0)] {
            self.vertices.push(OutlineVertex {
                pos: [p.x + sign * tx, p.y + sign * ty, p.z, p.w],
                color: style.color,
            });
        }

        self.line_count += 1;
        Ok(Some(Segment { base }))
    }

    /// Draws a line through consecutive `points`. `closed` adds the segment
    /// from the last point back to the first; `bridged` fills the wedge
    /// between consecutive segments (and around the seam when closed).
    pub fn draw_polyline(
        &mut self,
        points: &[Vec3],
        closed: bool,
        bridged: bool,
        style: &LineStyle,
        projection: &Projection,
    ) -> Result<(), LineError> {
        let closing = closed.then(|| (points.last(), points.first()));
        let pairs = points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing.into_iter().filter_map(|(a, b)| Some((*a?, *b?))));

        let mut first: Option<Segment> = None;
        let mut last: Option<Segment> = None;
        for (a, b) in pairs {
            let Some(segment) = self.draw_line(a, b, style, projection)? else {
                continue;
            };
            if bridged {
                if let Some(prev) = last {
                    self.bridge(prev.end(), segment.start());
                }
            }
            first.get_or_insert(segment);
            last = Some(segment);
        }

        if bridged && closed {
            if let (Some(first), Some(last)) = (first, last) {
                if first != last {
                    self.bridge(first.start(), last.end());
                }
            }
        }
        Ok(())
    }
}

/// Undoes the GPU's perspective divide ahead of time for points in front of
/// the camera.
fn to_screen(clip: Vec4) -> Vec4 {
    if clip.w > 0.0 {
        (clip.truncate() / clip.w).extend(1.0)
    } else {
        clip
    }
}
