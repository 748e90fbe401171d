use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is the region between its `vmin` and `vmax` corners. Boxes built
/// from real geometry satisfy `vmin <= vmax` on every axis; the inverted
/// [`Aabb::EMPTY`] box only exists as the identity for [`Aabb::merge`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub vmin: Vec3,
    pub vmax: Vec3,
}

impl Aabb {
    /// The empty box. Merging it with any box yields that box unchanged.
    pub const EMPTY: Aabb = Aabb {
        vmin: Vec3::splat(f32::INFINITY),
        vmax: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from its min and max corners as given.
    pub fn new(vmin: Vec3, vmax: Vec3) -> Self {
        Self { vmin, vmax }
    }

    /// Create an AABB from two arbitrary corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            vmin: a.min(b),
            vmax: a.max(b),
        }
    }

    /// Create the AABB that encloses both boxes.
    ///
    /// Commutative and associative; merging a box contained in another
    /// returns the outer box.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            vmin: self.vmin.min(other.vmin),
            vmax: self.vmax.max(other.vmax),
        }
    }

    /// Size of the box along each axis.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.vmax - self.vmin
    }

    /// Surface area of the box, used as the SAH cost proxy.
    #[inline]
    pub fn surface_area(&self) -> f32 {
        let size = self.extent();
        2.0 * (size.x * size.y + size.y * size.z + size.z * size.x)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    ///
    /// Ties go to the lowest axis index.
    pub fn longest_axis(&self) -> usize {
        let size = self.extent();
        let mut axis = 0;
        if size.y > size[axis] {
            axis = 1;
        }
        if size.z > size[axis] {
            axis = 2;
        }
        axis
    }

    /// Returns true if the point lies inside the box or on its boundary.
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.vmin).all() && p.cmple(self.vmax).all()
    }

    /// Intersect a ray with the box using the slab method.
    ///
    /// Returns the entry distance on a hit. The entry distance is negative
    /// when the ray origin is inside the box. A box entirely behind the
    /// origin is a miss.
    ///
    /// Zero direction components produce infinite reciprocals, and the
    /// min/max reductions below order those correctly. A `NaN` slab
    /// distance (origin exactly on a plane of a parallel slab) is dropped
    /// by the reductions, since `f32::min`/`f32::max` prefer the non-NaN
    /// operand.
    #[inline]
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = ray.direction.recip();
        let t0 = (self.vmin - ray.origin) * inv_dir;
        let t1 = (self.vmax - ray.origin) * inv_dir;

        let t_entry = t0.min(t1).max_element();
        let t_exit = t0.max(t1).min_element();

        // Box is behind the ray
        if t_exit < 0.0 {
            return None;
        }
        if t_entry > t_exit {
            return None;
        }
        Some(t_entry)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
