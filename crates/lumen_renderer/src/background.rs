//! Environment lighting sampled by rays that leave the scene.

use crate::Color;
use lumen_math::Vec3;

/// What a ray sees when it misses every shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    /// The same colour in every direction.
    Constant(Color),
    /// Three-colour gradient sky with a sun disc.
    Sky(SkyBackground),
}

impl Background {
    /// Colour seen along `direction` (unit length).
    pub fn sample(&self, direction: Vec3) -> Color {
        match self {
            Background::Constant(color) => *color,
            Background::Sky(sky) => sky.sample(direction),
        }
    }
}

impl From<SkyBackground> for Background {
    fn from(sky: SkyBackground) -> Self {
        Background::Sky(sky)
    }
}

/// Gradient sky from `top` through `horizon` to `bottom`, with a feathered
/// sun disc blended over it.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyBackground {
    top: Color,
    horizon: Color,
    bottom: Color,
    sun: Color,
    sun_direction: Vec3,
    // Cosines of the half-angles where the sun disc starts and ends fading
    cos_inner: f32,
    cos_outer: f32,
}

impl SkyBackground {
    /// Default angular diameter of the sun disc.
    pub const DEFAULT_SUN_ANGLE: f32 = 1.0 * std::f32::consts::PI / 180.0;
    /// Default width of the sun's soft edge.
    pub const DEFAULT_SUN_FEATHERING: f32 = 1.0 * std::f32::consts::PI / 180.0;

    /// Create a sky. Angles are in radians; `sun_direction` need not be
    /// normalized.
    pub fn new(
        top: Color,
        horizon: Color,
        bottom: Color,
        sun: Color,
        sun_direction: Vec3,
        sun_angle: f32,
        sun_feathering: f32,
    ) -> Self {
        Self {
            top,
            horizon,
            bottom,
            sun,
            sun_direction: sun_direction.normalize_or_zero(),
            cos_inner: ((sun_angle - sun_feathering) * 0.5).cos(),
            cos_outer: ((sun_angle + sun_feathering) * 0.5).cos(),
        }
    }

    /// Create a sky with the default sun size.
    pub fn with_default_sun(
        top: Color,
        horizon: Color,
        bottom: Color,
        sun: Color,
        sun_direction: Vec3,
    ) -> Self {
        Self::new(
            top,
            horizon,
            bottom,
            sun,
            sun_direction,
            Self::DEFAULT_SUN_ANGLE,
            Self::DEFAULT_SUN_FEATHERING,
        )
    }

    pub fn sample(&self, direction: Vec3) -> Color {
        let pole = if direction.y > 0.0 { self.top } else { self.bottom };
        let sky = self.horizon.lerp(pole, direction.y * direction.y);

        let sun_amount = smoothstep(
            self.cos_outer,
            self.cos_inner,
            direction.dot(self.sun_direction),
        );
        sky.lerp(self.sun, sun_amount)
    }
}

/// Hermite interpolation between `edge0` and `edge1`, clamped to `[0, 1]`.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
