/// Camera - model/view/projection matrices plus the view parameters they derive from
///
/// The camera computes nothing on its own. The geometry pipeline's update step
/// writes the matrices every frame from the view parameters stored here.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    position: Vec3,
    front: Vec3,
    up: Vec3,
    /// Vertical field of view in radians
    fov: f32,
}

impl Camera {
    pub fn new(position: Vec3, front: Vec3, up: Vec3, fov: f32) -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position,
            front,
            up,
            fov,
        }
    }

    // ===== GETTERS =====

    pub fn model(&self) -> &Mat4 {
        &self.model
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Combined model-view-projection matrix (projection * view * model)
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    // ===== SETTERS =====

    pub fn set_model(&mut self, matrix: Mat4) {
        self.model = matrix;
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection = matrix;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the viewing direction (normalized on store)
    pub fn set_front(&mut self, front: Vec3) {
        self.front = front.normalize_or_zero();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }
}

impl Default for Camera {
    /// Five units back on +Z, looking at the origin, 45 degree field of view
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::Y, 45.0_f32.to_radians())
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
