//! Perspective camera and drawable sizing.

use glam::{Mat4, Vec3};

use crate::params::scene_constants::MAX_PIXEL_RATIO;

/// Perspective camera looking at a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::new(30.0, 30.0, 100.0),
            target: Vec3::ZERO,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    /// Recomputes the projection after `fov`, `aspect`, `near` or `far` changed.
    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view()
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(55.0, 16.0 / 9.0, 1.0, 20_000.0)
    }
}

/// Logical size of the drawable and its pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    /// Viewport for a window reported in physical pixels at `scale_factor`.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self::new(
            (width as f64 / scale).round() as u32,
            (height as f64 / scale).round() as u32,
            scale_factor,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the backing surface in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            ((self.width as f64) * self.pixel_ratio).round().max(1.0) as u32,
            ((self.height as f64) * self.pixel_ratio).round().max(1.0) as u32,
        )
    }
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

/// Applies a host resize: updates the viewport and the camera projection.
/// Returns `false` and leaves both untouched for a zero-area size.
pub fn apply_resize(
    viewport: &mut Viewport,
    camera: &mut PerspectiveCamera,
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    *viewport = Viewport::new(width, height, device_pixel_ratio);
    camera.aspect = viewport.aspect();
    camera.update_projection();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_sets_aspect_and_caps_pixel_ratio() {
        let mut viewport = Viewport::new(800, 600, 1.0);
        let mut camera = PerspectiveCamera::default();
        assert!(apply_resize(&mut viewport, &mut camera, 1920, 1080, 3.0));
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(viewport.physical_size(), (3840, 2160));

        assert!(apply_resize(&mut viewport, &mut camera, 500, 1000, 1.5));
        assert_eq!(camera.aspect, 0.5);
        assert_eq!(viewport.pixel_ratio, 1.5);
    }

    #[test]
    fn physical_window_surface_keeps_the_capped_ratio() {
        let viewport = Viewport::from_physical(3000, 1500, 3.0);
        assert_eq!((viewport.width, viewport.height), (1000, 500));
        assert_eq!(viewport.physical_size(), (2000, 1000));

        let mut resized = viewport;
        let mut camera = PerspectiveCamera::default();
        apply_resize(&mut resized, &mut camera, viewport.width, viewport.height, 3.0);
        assert_eq!(resized.physical_size(), viewport.physical_size());
    }

    #[test]
    fn zero_area_resize_is_ignored() {
        let mut viewport = Viewport::new(800, 600, 1.0);
        let mut camera = PerspectiveCamera::new(55.0, viewport.aspect(), 1.0, 20_000.0);
        let before = camera.clone();
        assert!(!apply_resize(&mut viewport, &mut camera, 0, 600, 1.0));
        assert_eq!(camera, before);
        assert_eq!(viewport.width, 800);
    }

    #[test]
    fn projection_follows_aspect() {
        let mut camera = PerspectiveCamera::default();
        let wide = camera.projection();
        camera.aspect = 1.0;
        camera.update_projection();
        assert_ne!(camera.projection(), wide);
    }
}
