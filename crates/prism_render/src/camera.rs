//! Deterministic pinhole camera.
//!
//! Ray generation samples pixel centers with no jitter, so rendering the
//! same camera twice produces identical images.

use prism_math::{Aabb, Ray, Vec3};

/// Camera position and lens settings, independent of any resolution.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,
    /// Vertical field of view in degrees.
    vfov: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            look_from: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
            vup: Vec3::Y,
            vfov: 45.0,
        }
    }

    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    pub fn with_vfov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// A camera looking at the center of `bounds` from far enough back to
    /// see all of it. Empty bounds (nothing instanced) get the default
    /// framing.
    pub fn framing(bounds: &Aabb) -> Self {
        let center = bounds.centroid();
        let radius = (bounds.max() - bounds.min()).length() * 0.5;
        if !center.is_finite() || !radius.is_finite() {
            return Self::new();
        }
        let distance = (radius * 2.5).max(1.0);

        Self::new().with_position(
            center + Vec3::new(0.0, radius * 0.5, distance),
            center,
            Vec3::Y,
        )
    }

    /// Rotate the eye around the target. `yaw` and `pitch` are radians;
    /// pitch is clamped short of the poles.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.look_from - self.look_at;
        let radius = offset.length();

        let mut theta = offset.z.atan2(offset.x);
        let mut phi = (offset.y / radius).asin();
        theta += yaw;
        phi = (phi + pitch).clamp(-1.5, 1.5);

        self.look_from = self.look_at
            + radius * Vec3::new(phi.cos() * theta.cos(), phi.sin(), phi.cos() * theta.sin());
    }

    /// Scale the eye-to-target distance. Factors below one move in.
    pub fn dolly(&mut self, factor: f32) {
        let offset = self.look_from - self.look_at;
        self.look_from = self.look_at + offset * factor.max(0.01);
    }

    /// Precompute the pixel grid for one resolution.
    pub fn ray_grid(&self, width: u32, height: u32) -> RayGrid {
        assert!(width > 0 && height > 0, "zero-sized ray grid");

        let theta = self.vfov.to_radians();
        let viewport_height = 2.0 * (theta / 2.0).tan();
        let viewport_width = viewport_height * (width as f32 / height as f32);

        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;
        let pixel_delta_u = viewport_u / width as f32;
        let pixel_delta_v = viewport_v / height as f32;

        let upper_left = self.look_from - w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00 = upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        RayGrid {
            origin: self.look_from,
            pixel00,
            pixel_delta_u,
            pixel_delta_v,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-resolution ray generation data derived from a `Camera`.
#[derive(Debug, Clone, Copy)]
pub struct RayGrid {
    origin: Vec3,
    pixel00: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl RayGrid {
    /// The ray through the center of pixel (x, y).
    pub fn ray_for(&self, x: u32, y: u32) -> Ray {
        let pixel = self.pixel00
            + x as f32 * self.pixel_delta_u
            + y as f32 * self.pixel_delta_v;
        Ray::new(self.origin, pixel - self.origin)
    }
}
