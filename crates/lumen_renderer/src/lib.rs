//! Lumen - CPU progressive path tracing.
//!
//! A Monte Carlo path tracer built around a surface-area-heuristic BVH.
//!
//! The pieces, leaf first:
//! - [`Hittable`] primitives ([`Sphere`], [`Triangle`], unified as [`Shape`])
//! - [`Bvh`], a flat node arena over primitive indices
//! - [`Scene`], which owns camera, background, materials and shapes and
//!   answers nearest-hit queries through the BVH or a linear scan
//! - the integrator in [`renderer`], which accumulates a running mean per
//!   pixel over buckets rendered in parallel

mod background;
mod bucket;
mod bvh;
mod camera;
mod color;
mod error;
mod film;
mod hittable;
mod material;
pub mod presets;
pub mod renderer;
mod scene;
mod shape;
mod sphere;
mod triangle;

pub use background::{Background, SkyBackground};
pub use bucket::{generate_buckets, Bucket, DEFAULT_BUCKET_SIZE};
pub use bvh::{find_best_split, leaf_cost, Bvh, BvhNode, BvhStats, SahSplit};
pub use camera::Camera;
pub use color::{encode_srgb, hsl_to_rgb, tonemap_reinhard, Color};
pub use error::{RenderError, RenderResult};
pub use film::ImageBuffer;
pub use hittable::{closest_hit_linear, Hittable, RayHit};
pub use material::{Material, MaterialId, MaterialSample};
pub use renderer::{
    debug_draw, render, render_progressive, running_mean, trace_path, DebugMode, RenderConfig,
    SampleProgress,
};
pub use scene::Scene;
pub use shape::Shape;
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from lumen_math
pub use lumen_math::{Aabb, Ray, UVec2, Vec2, Vec3};

use rand::{Rng, RngCore};

/// Uniform sample in `[0, 1)`.
#[inline]
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}
