use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::lines::{LineBatch, LineError, LineStyle, Projection};

const RING_RADIUS: f32 = 5.0;

const SQUARE_COUNT: usize = 20;
const SQUARE_HALF_SIZE: f32 = 0.7;
const SQUARE_COLOR: [f32; 4] = [0.8, 1.0, 0.9, 0.1];

const ROUNDED_COUNT: usize = 10;
const ROUNDED_SEGMENTS: usize = 16;
// SIDE_LENGTH doesn't include BORDER_RADIUS; the full square is their sum
const BORDER_RADIUS: f32 = 0.35;
const SIDE_LENGTH: f32 = 0.7;
const ROUNDED_COLOR: [f32; 4] = [0.8, 1.0, 0.9, 1.0];

/// Outline geometry drawn every frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Scene {
    /// Square outlines standing in a ring around the origin
    #[default]
    Ring,
    /// Rounded "window" outlines standing in a ring around the origin
    Rounded,
}

impl Scene {
    pub fn build(
        &self,
        batch: &mut LineBatch,
        projection: &Projection,
        thickness: f32,
    ) -> Result<(), LineError> {
        match self {
            Scene::Ring => build_ring(batch, projection, thickness),
            Scene::Rounded => build_rounded(batch, projection, thickness),
        }
    }
}

fn ring_position(i: usize, count: usize) -> Vec2 {
    let angle = i as f32 / count as f32 * TAU;
    Vec2::new(angle.cos(), angle.sin()) * RING_RADIUS
}

fn build_ring(batch: &mut LineBatch, projection: &Projection, thickness: f32) -> Result<(), LineError> {
    let style = LineStyle {
        thickness,
        color: SQUARE_COLOR,
    };
    let h = SQUARE_HALF_SIZE;
    for i in 0..SQUARE_COUNT {
        let centre = ring_position(i, SQUARE_COUNT);
        let contour = [(h, -h), (-h, -h), (-h, h), (h, h)]
            .map(|(dx, dy)| Vec3::new(centre.x + dx, dy, centre.y));
        batch.draw_polyline(&contour, true, true, &style, projection)?;
    }
    Ok(())
}

fn build_rounded(batch: &mut LineBatch, projection: &Projection, thickness: f32) -> Result<(), LineError> {
    let style = LineStyle {
        thickness,
        color: ROUNDED_COLOR,
    };
    for i in 0..ROUNDED_COUNT {
        let centre = ring_position(i, ROUNDED_COUNT);
        let contour: Vec<Vec3> = (0..ROUNDED_SEGMENTS)
            .map(|j| {
                let angle = j as f32 / ROUNDED_SEGMENTS as f32 * TAU;
                let mut p = Vec2::new(angle.cos(), angle.sin()) * BORDER_RADIUS;
                // push each quadrant of the circle out to its corner
                p.x += p.x.signum() * SIDE_LENGTH * 0.5;
                p.y += p.y.signum() * SIDE_LENGTH * 0.5;
                Vec3::new(centre.x + p.x, p.y, centre.y)
            })
            .collect();
        batch.draw_polyline(&contour, true, false, &style, projection)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::camera::Camera;

    fn projection() -> Projection {
        Projection {
            mvp: Camera::default().view_projection(16.0 / 9.0),
            aspect: 16.0 / 9.0,
        }
    }

    #[test]
    fn ring_emits_closed_bridged_squares() {
        let mut batch = LineBatch::new();
        Scene::Ring.build(&mut batch, &projection(), 0.02).unwrap();

        assert_eq!(batch.line_count(), SQUARE_COUNT * 4);
        assert_eq!(batch.vertices().len(), SQUARE_COUNT * 16);
        assert_eq!(batch.indices().len(), SQUARE_COUNT * 8 * 6);
        assert!(batch.vertices().iter().all(|v| v.color == SQUARE_COLOR));
    }

    #[test]
    fn rounded_emits_one_line_per_segment() {
        let mut batch = LineBatch::new();
        Scene::Rounded.build(&mut batch, &projection(), 0.02).unwrap();

        assert_eq!(batch.line_count(), ROUNDED_COUNT * ROUNDED_SEGMENTS);
        assert_eq!(batch.indices().len(), ROUNDED_COUNT * ROUNDED_SEGMENTS * 6);
        assert!(batch.vertices().iter().all(|v| v.color == ROUNDED_COLOR));
    }

    #[test]
    fn scene_vertices_are_finite() {
        for scene in [Scene::Ring, Scene::Rounded] {
            let mut batch = LineBatch::new();
            scene.build(&mut batch, &projection(), 0.02).unwrap();
            assert!(
                batch
                    .vertices()
                    .iter()
                    .all(|v| v.pos.iter().all(|c| c.is_finite()))
            );
        }
    }

    #[test]
    fn ring_squares_stand_on_the_circle() {
        let mut batch = LineBatch::new();
        let flat = Projection {
            mvp: Mat4::IDENTITY,
            aspect: 1.0,
        };
        Scene::Ring.build(&mut batch, &flat, 0.02).unwrap();
        // first square is centred on (RING_RADIUS, 0, 0); its first corner
        // sits at +x, -y
        let first = batch.vertices()[0].pos;
        assert!((first[0] - (RING_RADIUS + SQUARE_HALF_SIZE)).abs() < 0.02);
        assert!((first[1] + SQUARE_HALF_SIZE).abs() < 0.02);
    }
}
