use glam::{Mat4, Vec2, Vec3};

const PAN_SENSITIVITY: f32 = 0.0004;
const ZOOM_IN: f32 = 0.8;
const ZOOM_OUT: f32 = 1.2;

const FOVY_DEGREES: f32 = 45.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;
const DISTANCE: f32 = 6.0;

/// Orbit camera looking at the origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub rotation: Vec2, // (yaw, pitch)
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            rotation: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// `delta` is pointer velocity in pixels per second.
    pub fn pan(&mut self, delta: Vec2) {
        self.rotation -= delta * PAN_SENSITIVITY;
    }

    /// Taps in the upper half of the view move closer, the lower half further away.
    pub fn tap(&mut self, y: f32, height: f32) {
        if y < height / 2.0 {
            self.zoom_in();
        } else {
            self.zoom_out();
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom *= ZOOM_IN;
    }

    pub fn zoom_out(&mut self) {
        self.zoom *= ZOOM_OUT;
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(FOVY_DEGREES.to_radians(), aspect, NEAR, FAR);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -DISTANCE * self.zoom));
        let orbit = Mat4::from_rotation_y(-self.rotation.x) * Mat4::from_rotation_x(self.rotation.y);
        projection * view * orbit
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec4;

    use super::*;

    #[test]
    fn pan_moves_against_pointer() {
        let mut camera = Camera::default();
        camera.pan(Vec2::new(1000.0, -500.0));
        assert_relative_eq!(camera.rotation.x, -0.4, epsilon = 1e-6);
        assert_relative_eq!(camera.rotation.y, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn tap_halves_pick_zoom_direction() {
        let mut camera = Camera::default();
        camera.tap(10.0, 600.0);
        assert_relative_eq!(camera.zoom, 0.8, epsilon = 1e-6);
        camera.tap(300.0, 600.0);
        assert_relative_eq!(camera.zoom, 0.8 * 1.2, epsilon = 1e-6);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let mvp = Camera::default().view_projection(16.0 / 9.0);
        let clip = mvp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x, 0.0);
        assert_relative_eq!(clip.y, 0.0);
        assert_relative_eq!(clip.w, 6.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn zooming_out_shrinks_projected_offsets() {
        let point = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let near = Camera::default().view_projection(1.0) * point;

        let mut camera = Camera::default();
        camera.zoom_out();
        let far = camera.view_projection(1.0) * point;

        assert!(far.x / far.w < near.x / near.w);
    }

    #[test]
    fn yaw_rotates_around_vertical_axis() {
        let mut camera = Camera::default();
        camera.rotation.x = std::f32::consts::FRAC_PI_2;
        let clip = camera.view_projection(1.0) * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // A point on +X swings onto the camera's view axis.
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
    }
}
