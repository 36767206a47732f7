//! Camera used to render trees and to map tree nodes back onto the raster

use crate::core::types::{Mat4, Quat, Vec2, Vec3};

/// Camera with position, rotation, and projection parameters
#[derive(Clone, Debug)]
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: Vec3, fov_y_degrees: f32, aspect: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Camera framing a full-height tree standing at the origin
    pub fn tree_view(width: u32, height: u32) -> Self {
        let mut camera = Self::new(Vec3::new(0.0, 6.0, 15.0), 60.0, 1.0);
        camera.set_aspect(width as f32, height as f32);
        camera
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-self.position);
        rotation_matrix * translation_matrix
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point to pixel coordinates.
    ///
    /// Applies the perspective divide and maps NDC onto a `width` x `height`
    /// viewport with the origin at the top-left corner (Y down). Returns
    /// `None` for points at or behind the camera plane.
    pub fn project_to_screen(&self, point: Vec3, width: u32, height: u32) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let w = width as f32;
        let h = height as f32;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * w,
            h - (ndc.y + 1.0) * 0.5 * h,
        ))
    }

    /// Update aspect ratio (call when the render target is resized)
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::tree_view(512, 512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_on_axis_projects_to_center() {
        let camera = Camera::tree_view(200, 100);
        let p = camera.project_to_screen(Vec3::new(0.0, 6.0, 0.0), 200, 100).unwrap();
        assert!((p.x - 100.0).abs() < 0.01);
        assert!((p.y - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_screen_y_is_flipped() {
        let camera = Camera::tree_view(100, 100);
        let high = camera.project_to_screen(Vec3::new(0.0, 8.0, 0.0), 100, 100).unwrap();
        let low = camera.project_to_screen(Vec3::new(0.0, 4.0, 0.0), 100, 100).unwrap();
        // Higher world points land closer to the top row
        assert!(high.y < low.y);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let camera = Camera::default();
        assert!(camera.project_to_screen(Vec3::new(0.0, 6.0, 30.0), 100, 100).is_none());
    }
}
