//! Pinhole camera for primary ray generation.

use lumen_math::{Ray, UVec2, Vec2, Vec3};

/// Pinhole camera with a near plane at distance 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    viewport: UVec2,
    center: Vec3,
    // Right, up and backward basis vectors
    u: Vec3,
    v: Vec3,
    w: Vec3,
    // Near plane extents
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
}

impl Camera {
    /// Create a camera at `center` looking at `look_at`.
    ///
    /// `fovy` is the vertical field of view in radians and `viewport` the
    /// output resolution in pixels.
    pub fn new(center: Vec3, look_at: Vec3, up: Vec3, fovy: f32, viewport: UVec2) -> Self {
        let w = (center - look_at).normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);

        let top = (fovy * 0.5).tan();
        let aspect = viewport.x as f32 / viewport.y.max(1) as f32;
        let right = aspect * top;

        Self {
            viewport,
            center,
            u,
            v,
            w,
            left: -right,
            right,
            bottom: -top,
            top,
        }
    }

    /// Output resolution in pixels.
    #[inline]
    pub fn viewport_size(&self) -> UVec2 {
        self.viewport
    }

    /// Ray from the eye through a continuous pixel position.
    ///
    /// Pixel `(i, j)` spans `[i, i + 1) x [j, j + 1)`, so its centre is
    /// `(i + 0.5, j + 0.5)`. Row 0 is the bottom of the image.
    pub fn get_ray(&self, pixel_pos: Vec2) -> Ray {
        let size = self.viewport.as_vec2();
        let x = self.left + (self.right - self.left) * pixel_pos.x / size.x;
        let y = self.bottom + (self.top - self.bottom) * pixel_pos.y / size.y;
        let direction = (-self.w + self.u * x + self.v * y).normalize();
        Ray::new(self.center, direction)
    }
}

impl Default for Camera {
    /// At the origin looking down -Z with +Y up, 90 degree fov, 1x1 pixels.
    fn default() -> Self {
        Self::new(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            std::f32::consts::FRAC_PI_2,
            UVec2::ONE,
        )
    }
}
