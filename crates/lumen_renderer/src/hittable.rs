//! Hittable trait and RayHit for ray-primitive intersection.

use crate::MaterialId;
use lumen_math::{Aabb, Ray, Vec3};

/// Record of a ray-primitive intersection.
///
/// Also used as the "best hit so far" scratch value during traversal: the
/// default record has `distance == f32::INFINITY`, meaning nothing was hit
/// yet, and traversal only ever overwrites it with strictly closer hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit point (> 0 for real hits)
    pub distance: f32,
    /// Unit surface normal, facing against the incoming ray
    pub normal: Vec3,
    /// Material of the surface that was hit
    pub material: MaterialId,
    /// Index of the hit primitive in the collection that was searched
    pub primitive: usize,
}

impl Default for RayHit {
    fn default() -> Self {
        Self {
            distance: f32::INFINITY,
            normal: Vec3::ZERO,
            material: MaterialId::default(),
            primitive: usize::MAX,
        }
    }
}

impl RayHit {
    /// Create a hit record, orienting the normal against the ray direction.
    pub fn new(ray: &Ray, distance: f32, outward_normal: Vec3, material: MaterialId) -> Self {
        // If the ray and normal point in the same direction, we're inside
        let front_face = ray.direction.dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };
        Self {
            distance,
            normal,
            material,
            primitive: usize::MAX,
        }
    }

    /// Whether this record holds an actual hit.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.distance < f32::INFINITY
    }
}

/// Capability shared by everything a BVH can index.
pub trait Hittable: Send + Sync {
    /// Intersect the ray with this primitive, returning the nearest hit with
    /// a positive distance.
    fn intersect(&self, ray: &Ray) -> Option<RayHit>;

    /// Get the axis-aligned bounding box of this primitive.
    fn bounding_box(&self) -> Aabb;
}

/// Test the ray against every primitive and keep the closest hit.
///
/// The returned hit's `primitive` is the index into `primitives`.
pub fn closest_hit_linear<P: Hittable>(primitives: &[P], ray: &Ray) -> Option<RayHit> {
    let mut best = RayHit::default();
    for (index, primitive) in primitives.iter().enumerate() {
        if let Some(hit) = primitive.intersect(ray) {
            if hit.distance < best.distance {
                best = RayHit {
                    primitive: index,
                    ..hit
                };
            }
        }
    }
    best.is_hit().then_some(best)
}
