//! Surface materials.
//!
//! A material answers one question: given where a path arrived and from
//! which direction, where does it go next, how much of the light coming back
//! along that direction survives, and how much light does the surface add
//! on its own.

use crate::{gen_f32, Color};
use lumen_math::Vec3;
use rand::RngCore;
use std::f32::consts::PI;

/// Index of a material in the scene's material arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// Result of sampling a material at a hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSample {
    /// Direction of the next ray, starting at the hit point (unit length
    /// whenever `factor` is non-zero)
    pub outgoing: Vec3,
    /// Multiplier for the light arriving back along `outgoing`
    pub factor: Color,
    /// Light emitted by the surface towards the incoming ray
    pub emission: Color,
}

/// Materials that describe how light interacts with surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Emits `light` equally in all directions and reflects nothing.
    Emissive { light: Color },
    /// Ideal diffuse reflector.
    Lambert { albedo: Color },
    /// Perfect mirror with Fresnel-weighted reflectance.
    SmoothMetal { specular: Color },
}

impl Material {
    /// Create an emissive material.
    pub fn emissive(light: Color) -> Self {
        Material::Emissive { light }
    }

    /// Create a Lambertian (diffuse) material with the given albedo color.
    pub fn lambert(albedo: Color) -> Self {
        Material::Lambert { albedo }
    }

    /// Create a smooth metal with the given reflectance at normal incidence.
    pub fn smooth_metal(specular: Color) -> Self {
        Material::SmoothMetal { specular }
    }

    /// Sample the material for a path arriving along `incoming` at `hit_point`.
    ///
    /// `hit_normal` must be unit length and face against `incoming`.
    pub fn sample(
        &self,
        incoming: Vec3,
        _hit_point: Vec3,
        hit_normal: Vec3,
        rng: &mut dyn RngCore,
    ) -> MaterialSample {
        match self {
            Material::Emissive { light } => MaterialSample {
                // Irrelevant: a zero factor ends the path here
                outgoing: incoming,
                factor: Color::ZERO,
                emission: *light,
            },
            Material::Lambert { albedo } => {
                // Cosine-weighted hemisphere sampling: the cosine and the pdf
                // cancel, leaving just the albedo as the factor.
                let direction = hit_normal + random_unit_vector(rng);
                let outgoing = direction.try_normalize().unwrap_or(hit_normal);
                MaterialSample {
                    outgoing,
                    factor: *albedo,
                    emission: Color::ZERO,
                }
            }
            Material::SmoothMetal { specular } => {
                let outgoing = reflect(incoming.normalize(), hit_normal);
                let cos_theta = outgoing.dot(hit_normal).clamp(0.0, 1.0);
                MaterialSample {
                    outgoing,
                    factor: schlick_fresnel(*specular, cos_theta),
                    emission: Color::ZERO,
                }
            }
        }
    }

    /// True if the material emits light.
    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::Emissive { light } if *light != Color::ZERO)
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Schlick's approximation of Fresnel reflectance.
#[inline]
fn schlick_fresnel(f0: Color, cos_theta: f32) -> Color {
    f0 + (Color::ONE - f0) * (1.0 - cos_theta).powi(5)
}

/// Generate a random unit vector, uniformly distributed on the unit sphere.
fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    let z = gen_f32(rng) * 2.0 - 1.0;
    let theta = gen_f32(rng) * 2.0 * PI;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}
