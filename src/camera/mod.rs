//! Perspective camera supplying view/projection matrices to the pipeline.
//!
//! The pipeline only reads: view matrix, projection matrix, and world
//! position (plus the previous frame's copies it keeps itself for motion
//! blur). Matrices are built on demand, so changing any field — aspect
//! after a resize, eye/target from a controller — is automatically picked
//! up by the next frame.

use glam::{Mat4, Vec3};

/// Right-handed perspective camera with a look-at orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World-space eye position.
    pub eye: Vec3,
    /// World-space look-at target.
    pub target: Vec3,
    /// Up vector (normally +Y).
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Near clip distance.
    pub znear: f32,
    /// Far clip distance.
    pub zfar: f32,
}

impl Camera {
    /// Create a camera at `eye` looking at `target` with sensible defaults
    /// (45° fov, 0.1..500 clip range).
    #[must_use]
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fovy: 45.0,
            aspect,
            znear: 0.1,
            zfar: 500.0,
        }
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// View-to-clip matrix with [0, 1] depth range (wgpu convention).
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// Combined world-to-clip matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space camera position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.eye
    }

    /// Update the aspect ratio; the projection is rebuilt on next access.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera =
            Camera::new(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, 16.0 / 9.0);
        let at_origin = camera.view_matrix().transform_point3(camera.eye);
        assert!(at_origin.length() < 1e-5);
    }

    #[test]
    fn set_aspect_changes_projection() {
        let mut camera = Camera::new(Vec3::Z * 5.0, Vec3::ZERO, 1.0);
        let square = camera.projection_matrix();
        camera.set_aspect(2.0);
        let wide = camera.projection_matrix();
        assert_ne!(square, wide);
        // Wider aspect shrinks x scale, leaves y scale alone.
        assert!(wide.col(0).x < square.col(0).x);
        assert_eq!(wide.col(1).y, square.col(1).y);
    }

    #[test]
    fn position_is_eye() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 1.0);
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
