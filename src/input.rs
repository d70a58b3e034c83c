use glam::Vec2;
use winit::{
    event::*,
    keyboard::{KeyCode, PhysicalKey},
};

use crate::State;
use crate::camera::Camera;

// Cursor deltas arrive once per event; scale them to roughly match a
// pixels-per-second pan velocity at 60 Hz.
const DELTA_TO_VELOCITY: f32 = 60.0;

// Presses that move less than this many pixels count as taps.
const TAP_SLOP: f32 = 4.0;

/// Left-button drag and tap tracking.
#[derive(Debug, Default)]
pub struct Pointer {
    position: Vec2,
    pressed_at: Option<Vec2>,
    dragged: bool,
}

impl Pointer {
    pub fn moved(&mut self, position: Vec2, camera: &mut Camera) {
        if let Some(origin) = self.pressed_at {
            if self.dragged || position.distance(origin) > TAP_SLOP {
                self.dragged = true;
                camera.pan((position - self.position) * DELTA_TO_VELOCITY);
            }
        }
        self.position = position;
    }

    pub fn pressed(&mut self) {
        self.pressed_at = Some(self.position);
        self.dragged = false;
    }

    /// Ends a press; a press that never turned into a drag is a tap.
    pub fn released(&mut self, camera: &mut Camera, viewport_height: f32) {
        if self.pressed_at.take().is_some() && !self.dragged {
            camera.tap(self.position.y, viewport_height);
        }
        self.dragged = false;
    }
}

pub fn handle_input(state: &mut State, event: &WindowEvent) -> bool {
    match event {
        WindowEvent::MouseInput {
            state: button_state,
            button: MouseButton::Left,
            ..
        } => {
            match button_state {
                ElementState::Pressed => state.pointer.pressed(),
                ElementState::Released => {
                    let height = state.config.height as f32;
                    state.pointer.released(&mut state.camera, height);
                }
            }
            true
        }
        WindowEvent::CursorMoved { position, .. } => {
            let position = Vec2::new(position.x as f32, position.y as f32);
            state.pointer.moved(position, &mut state.camera);
            true
        }
        WindowEvent::MouseWheel { delta, .. } => {
            let scroll = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(p) => p.y as f32,
            };
            if scroll > 0.0 {
                state.camera.zoom_in();
            } else if scroll < 0.0 {
                state.camera.zoom_out();
            }
            true
        }
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::KeyF),
                    ..
                },
            ..
        } => {
            state.settings.fps_cap_enabled = !state.settings.fps_cap_enabled;
            log::info!(
                "FPS cap {} (target: {} FPS)",
                if state.settings.fps_cap_enabled { "enabled" } else { "disabled" },
                state.settings.target_fps
            );
            state.update_window_title();
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn click_without_motion_is_a_tap() {
        let mut pointer = Pointer::default();
        let mut camera = Camera::default();
        pointer.moved(Vec2::new(200.0, 100.0), &mut camera);
        pointer.pressed();
        pointer.released(&mut camera, 600.0);

        assert_relative_eq!(camera.zoom, 0.8, epsilon = 1e-6);
        assert_eq!(camera.rotation, Vec2::ZERO);
    }

    #[test]
    fn small_jitter_still_taps() {
        let mut pointer = Pointer::default();
        let mut camera = Camera::default();
        pointer.moved(Vec2::new(200.0, 500.0), &mut camera);
        pointer.pressed();
        pointer.moved(Vec2::new(201.0, 501.0), &mut camera);
        pointer.released(&mut camera, 600.0);

        assert_relative_eq!(camera.zoom, 1.2, epsilon = 1e-6);
        assert_eq!(camera.rotation, Vec2::ZERO);
    }

    #[test]
    fn drag_pans_and_does_not_tap() {
        let mut pointer = Pointer::default();
        let mut camera = Camera::default();
        pointer.moved(Vec2::new(100.0, 100.0), &mut camera);
        pointer.pressed();
        pointer.moved(Vec2::new(110.0, 100.0), &mut camera);
        pointer.moved(Vec2::new(120.0, 100.0), &mut camera);
        pointer.released(&mut camera, 600.0);

        assert_eq!(camera.zoom, 1.0);
        // 20 px total at 60x velocity scaling
        assert_relative_eq!(camera.rotation.x, -20.0 * 60.0 * 0.0004, epsilon = 1e-5);
        assert_eq!(camera.rotation.y, 0.0);
    }

    #[test]
    fn hover_without_press_does_nothing() {
        let mut pointer = Pointer::default();
        let mut camera = Camera::default();
        pointer.moved(Vec2::new(10.0, 10.0), &mut camera);
        pointer.moved(Vec2::new(300.0, 300.0), &mut camera);
        pointer.released(&mut camera, 600.0);
        assert_eq!(camera, Camera::default());
    }
}
