//! The closed set of geometry kinds a scene can hold.

use crate::{Hittable, RayHit, Sphere, Triangle};
use lumen_math::{Aabb, Ray};

/// A scene primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Hittable for Shape {
    #[inline]
    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        match self {
            Shape::Sphere(s) => s.intersect(ray),
            Shape::Triangle(t) => t.intersect(ray),
        }
    }

    #[inline]
    fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.bounding_box(),
            Shape::Triangle(t) => t.bounding_box(),
        }
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Shape::Sphere(sphere)
    }
}

impl From<Triangle> for Shape {
    fn from(triangle: Triangle) -> Self {
        Shape::Triangle(triangle)
    }
}
