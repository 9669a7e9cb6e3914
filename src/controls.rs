//! Orbit-style camera controls with inertia.
//!
//! Input handlers accumulate rotation, dolly and pan deltas; [`OrbitControls::update`]
//! integrates them once per frame. With damping on, only a fraction of the
//! pending delta is applied each frame and the rest decays geometrically.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPS {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        crate::sun::from_spherical(self.radius, self.phi, self.theta)
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    /// Per-notch dolly multiplier.
    pub zoom_scale: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_scale: 0.95,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    /// Controls used by the seascape: orbit above the water, never under it.
    pub fn seascape() -> Self {
        Self {
            target: Vec3::new(0.0, 10.0, 0.0),
            min_distance: 40.0,
            max_distance: 200.0,
            max_polar_angle: PI * 0.495,
            enable_damping: true,
            ..Self::default()
        }
    }

    /// Rotates from a pointer drag of `(dx, dy)` pixels on a surface of
    /// `viewport_height` pixels.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(TAU * dx / height * self.rotate_speed);
        self.rotate_up(TAU * dy / height * self.rotate_speed);
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Positive notches move the camera closer.
    pub fn zoom(&mut self, notches: f32) {
        self.scale *= self.zoom_scale.powf(notches);
    }

    /// Pans the target in screen space by a pointer drag of `(dx, dy)` pixels.
    pub fn pan_by_pixels(
        &mut self,
        dx: f32,
        dy: f32,
        viewport_height: f32,
        camera: &PerspectiveCamera,
    ) {
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov_degrees.to_radians() / 2.0).tan();
        let height = viewport_height.max(1.0);
        let forward = (-offset).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        let left_amount = 2.0 * dx * target_distance / height;
        let up_amount = 2.0 * dy * target_distance / height;
        self.pan_offset += -right * left_amount + up * up_amount;
    }

    /// Integrates pending input into the camera. Returns `true` when the
    /// camera moved noticeably.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * factor;

        let new_position = self.target + spherical.to_offset();
        let moved = new_position.distance_squared(camera.position) > EPS;
        camera.position = new_position;
        camera.target = self.target;

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::default()
    }

    #[test]
    fn first_update_clamps_into_distance_range() {
        let mut controls = OrbitControls::seascape();
        let mut camera = camera();
        camera.position = Vec3::new(0.0, 10.0, 500.0);
        controls.update(&mut camera);
        let distance = camera.position.distance(controls.target);
        assert!((distance - 200.0).abs() < 1e-3);
        assert_eq!(camera.target, controls.target);
    }

    #[test]
    fn zoom_respects_minimum_distance() {
        let mut controls = OrbitControls::seascape();
        let mut camera = camera();
        for _ in 0..200 {
            controls.zoom(5.0);
            controls.update(&mut camera);
        }
        let distance = camera.position.distance(controls.target);
        assert!((distance - 40.0).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_never_dips_below_horizon() {
        let mut controls = OrbitControls::seascape();
        let mut camera = camera();
        controls.rotate_up(-10.0);
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        let offset = camera.position - controls.target;
        let phi = (offset.y / offset.length()).acos();
        assert!(phi <= PI * 0.495 + 1e-4);
        assert!(camera.position.y > controls.target.y);
    }

    #[test]
    fn damping_spreads_motion_and_comes_to_rest() {
        let mut controls = OrbitControls::seascape();
        let mut camera = camera();
        controls.update(&mut camera);
        let start = camera.position;

        controls.rotate_left(0.5);
        assert!(controls.update(&mut camera));
        let after_one = camera.position;
        assert!(after_one.distance(start) > 0.0);

        let mut frames = 0;
        while controls.update(&mut camera) {
            frames += 1;
            assert!(frames < 1_000, "controls never settled");
        }
        assert!(frames > 10);
    }

    #[test]
    fn without_damping_rotation_applies_at_once() {
        let mut controls = OrbitControls::seascape();
        controls.enable_damping = false;
        let mut camera = camera();
        controls.update(&mut camera);
        controls.rotate_left(0.25);
        controls.update(&mut camera);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn pan_moves_target() {
        let mut controls = OrbitControls::seascape();
        controls.enable_damping = false;
        let mut camera = camera();
        controls.update(&mut camera);
        let before = controls.target;
        controls.pan_by_pixels(100.0, 0.0, 720.0, &camera);
        controls.update(&mut camera);
        assert!(controls.target.distance(before) > 1.0);
    }
}
