//! Scene: camera, background, materials and shapes, plus the optional BVH.

use crate::{
    closest_hit_linear, Background, Bvh, Camera, Color, Material, MaterialId, RayHit, Shape,
    Sphere, Triangle,
};
use lumen_math::{EulerRot, Mat3, Ray, Vec2, Vec3};

/// Everything a render needs to know about the world.
///
/// Shapes are added between [`Scene::start_construction`] and
/// [`Scene::finish_construction`]; the BVH (when enabled) is built by the
/// latter and indexes exactly the shapes present at that moment.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    camera: Camera,
    background: Option<Background>,
    materials: Vec<Material>,
    shapes: Vec<Shape>,
    bvh: Option<Bvh>,
    use_bvh: bool,
    bvh_stale: bool,
}

impl Scene {
    /// Create an empty scene with the default camera and no background.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = Some(background);
    }

    /// Remove the background; misses then sample black.
    pub fn clear_background(&mut self) {
        self.background = None;
    }

    pub fn use_bvh(&self) -> bool {
        self.use_bvh
    }

    /// Choose whether the next [`Scene::finish_construction`] builds a BVH.
    pub fn set_use_bvh(&mut self, value: bool) {
        self.use_bvh = value;
    }

    // -------------------------------------------------------------------------
    // Materials
    // -------------------------------------------------------------------------

    /// Store a material and return the id shapes refer to it by.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Look up a material. Ids come from [`Scene::add_material`] on this scene.
    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Remove every material, along with the shapes and BVH that refer to them.
    pub fn clear_materials(&mut self) {
        self.start_construction();
        self.materials.clear();
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Clear all shapes and the BVH. Materials are kept.
    pub fn start_construction(&mut self) {
        self.shapes.clear();
        self.bvh = None;
        self.bvh_stale = false;
    }

    /// Build the BVH over the current shapes if enabled, otherwise drop it.
    pub fn finish_construction(&mut self) {
        self.bvh = if self.use_bvh {
            let bvh = Bvh::build(&self.shapes);
            let stats = bvh.stats();
            log::info!(
                "Scene ready: {} shapes, BVH with {} nodes ({} leaves, depth {})",
                self.shapes.len(),
                stats.node_count,
                stats.leaf_count,
                stats.max_depth
            );
            Some(bvh)
        } else {
            log::info!("Scene ready: {} shapes, linear intersection", self.shapes.len());
            None
        };
        self.bvh_stale = false;
    }

    pub fn add_shape(&mut self, shape: impl Into<Shape>) {
        if self.bvh.is_some() && !self.bvh_stale {
            log::warn!(
                "Shape added after the BVH was built; call finish_construction() to rebuild it"
            );
            self.bvh_stale = true;
        }
        self.shapes.push(shape.into());
    }

    pub fn add_sphere(&mut self, material: MaterialId, center: Vec3, radius: f32) {
        self.add_shape(Sphere::new(center, radius, material));
    }

    pub fn add_triangle(&mut self, material: MaterialId, v0: Vec3, v1: Vec3, v2: Vec3) {
        self.add_shape(Triangle::new(v0, v1, v2, material));
    }

    /// Add a `size.x` by `size.y` rectangle as two triangles.
    ///
    /// Unrotated, the rectangle lies in the XZ plane facing +Y. `angles`
    /// holds (pitch, roll, yaw) in radians.
    pub fn add_rectangle(&mut self, material: MaterialId, center: Vec3, size: Vec2, angles: Vec3) {
        let rot = orientation(angles);
        let half = size * 0.5;
        let corner = |x: f32, z: f32| center + rot * Vec3::new(x, 0.0, z);
        let verts = [
            corner(-half.x, -half.y),
            corner(-half.x, half.y),
            corner(half.x, -half.y),
            corner(half.x, half.y),
        ];
        self.add_triangle(material, verts[0], verts[1], verts[3]);
        self.add_triangle(material, verts[0], verts[2], verts[3]);
    }

    /// Add a box as twelve triangles. `angles` as in [`Scene::add_rectangle`].
    pub fn add_cuboid(&mut self, material: MaterialId, center: Vec3, size: Vec3, angles: Vec3) {
        let rot = orientation(angles);
        let half = size * 0.5;
        // Bit 0 picks +z, bit 1 picks +x, bit 2 picks +y
        let verts: [Vec3; 8] = std::array::from_fn(|i| {
            let pick = |bit: usize, h: f32| if i & (1 << bit) != 0 { h } else { -h };
            center + rot * Vec3::new(pick(1, half.x), pick(2, half.y), pick(0, half.z))
        });

        const FACES: [[usize; 4]; 6] = [
            [0, 1, 3, 2], // bottom
            [4, 5, 7, 6], // top
            [0, 2, 6, 4], // back
            [1, 3, 7, 5], // front
            [0, 1, 5, 4], // left
            [2, 3, 7, 6], // right
        ];
        for [a, b, c, d] in FACES {
            self.add_triangle(material, verts[a], verts[b], verts[c]);
            self.add_triangle(material, verts[a], verts[d], verts[c]);
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// True when shapes were added after the BVH was built.
    pub fn is_bvh_stale(&self) -> bool {
        self.bvh_stale
    }

    /// Nearest hit along the ray, through the BVH when one was built.
    pub fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        match &self.bvh {
            Some(bvh) => {
                debug_assert!(
                    !self.bvh_stale,
                    "scene queried with a stale BVH; call finish_construction() after adding shapes"
                );
                bvh.closest_hit(&self.shapes, ray)
            }
            None => closest_hit_linear(&self.shapes, ray),
        }
    }

    /// Background colour along `direction`, black if there is no background.
    pub fn sample_background(&self, direction: Vec3) -> Color {
        self.background
            .as_ref()
            .map_or(Color::ZERO, |bg| bg.sample(direction))
    }
}

/// Rotation for (pitch, roll, yaw) Euler angles, applied roll first, then
/// pitch, then yaw.
fn orientation(angles: Vec3) -> Mat3 {
    Mat3::from_euler(EulerRot::YXZ, angles.z, angles.x, angles.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Hittable;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::FRAC_PI_2;

    fn scene_with_spheres(use_bvh: bool) -> Scene {
        let mut scene = Scene::new();
        scene.set_use_bvh(use_bvh);
        let white = scene.add_material(Material::lambert(Color::splat(0.8)));

        let mut rng = StdRng::seed_from_u64(3);
        scene.start_construction();
        for _ in 0..100 {
            let center = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            scene.add_sphere(white, center, rng.gen_range(0.2..1.0));
        }
        scene.add_cuboid(white, Vec3::ZERO, Vec3::splat(3.0), Vec3::new(0.3, 0.2, 0.1));
        scene.finish_construction();
        scene
    }

    #[test]
    fn test_bvh_and_linear_agree() {
        let with_bvh = scene_with_spheres(true);
        let linear = scene_with_spheres(false);
        assert!(with_bvh.bvh().is_some());
        assert!(linear.bvh().is_none());

        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..2000 {
            let origin = Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
            );
            let direction = (-origin + Vec3::splat(rng.gen_range(-3.0..3.0))).normalize();
            let ray = Ray::new(origin, direction);

            let a = with_bvh.intersect(&ray).map(|h| h.distance);
            let b = linear.intersect(&ray).map(|h| h.distance);
            match (a, b) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-4),
                (None, None) => {}
                other => panic!("BVH and linear scan disagree: {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_scene_never_hits() {
        let mut scene = Scene::new();
        scene.set_use_bvh(true);
        scene.start_construction();
        scene.finish_construction();

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(scene.intersect(&ray).is_none());
        assert_eq!(scene.sample_background(Vec3::Y), Color::ZERO);
    }

    #[test]
    fn test_sample_background() {
        let mut scene = Scene::new();
        scene.set_background(Background::Constant(Color::new(0.5, 0.6, 0.7)));
        assert_eq!(scene.sample_background(Vec3::X), Color::new(0.5, 0.6, 0.7));

        scene.clear_background();
        assert_eq!(scene.sample_background(Vec3::X), Color::ZERO);
    }

    #[test]
    fn test_rectangle_is_two_triangles_facing_up() {
        let mut scene = Scene::new();
        let m = scene.add_material(Material::lambert(Color::ONE));
        scene.start_construction();
        scene.add_rectangle(m, Vec3::new(0.0, -1.0, 0.0), Vec2::new(2.0, 4.0), Vec3::ZERO);
        scene.finish_construction();

        assert_eq!(scene.shapes().len(), 2);
        let bounds = scene.shapes()[0]
            .bounding_box()
            .merge(&scene.shapes()[1].bounding_box());
        assert_eq!(bounds.vmin, Vec3::new(-1.0, -1.0, -2.0));
        assert_eq!(bounds.vmax, Vec3::new(1.0, -1.0, 2.0));

        let hit = scene
            .intersect(&Ray::new(Vec3::new(0.3, 0.0, 0.1), Vec3::NEG_Y))
            .expect("rectangle below the origin");
        assert!((hit.distance - 1.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn test_pitched_rectangle_becomes_a_wall() {
        let mut scene = Scene::new();
        let m = scene.add_material(Material::lambert(Color::ONE));
        scene.start_construction();
        scene.add_rectangle(
            m,
            Vec3::new(0.0, 0.0, -1.0),
            Vec2::splat(2.0),
            Vec3::new(FRAC_PI_2, 0.0, 0.0),
        );
        scene.finish_construction();

        let hit = scene
            .intersect(&Ray::new(Vec3::new(0.3, 0.1, 0.0), Vec3::NEG_Z))
            .expect("wall in front of the origin");
        assert!((hit.distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cuboid_is_closed() {
        let mut scene = Scene::new();
        let m = scene.add_material(Material::lambert(Color::ONE));
        scene.start_construction();
        scene.add_cuboid(m, Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0), Vec3::ZERO);
        scene.finish_construction();
        assert_eq!(scene.shapes().len(), 12);

        // From the centre, every axis direction hits a face at the half size.
        // The small offset keeps the rays off the diagonals shared by face triangles.
        for (dir, dist) in [
            (Vec3::X, 1.0),
            (Vec3::NEG_X, 1.0),
            (Vec3::Y, 2.0),
            (Vec3::NEG_Y, 2.0),
            (Vec3::Z, 3.0),
            (Vec3::NEG_Z, 3.0),
        ] {
            let hit = scene
                .intersect(&Ray::new(Vec3::ZERO, (dir + Vec3::splat(1e-3)).normalize()))
                .expect("inside the box");
            assert!((hit.distance - dist).abs() < 1e-2, "{:?}: {}", dir, hit.distance);
        }
    }

    #[test]
    fn test_adding_after_finish_marks_bvh_stale() {
        let mut scene = Scene::new();
        scene.set_use_bvh(true);
        let m = scene.add_material(Material::lambert(Color::ONE));
        scene.start_construction();
        scene.add_sphere(m, Vec3::ZERO, 1.0);
        scene.finish_construction();
        assert!(!scene.is_bvh_stale());

        scene.add_sphere(m, Vec3::X * 5.0, 1.0);
        assert!(scene.is_bvh_stale());

        scene.finish_construction();
        assert!(!scene.is_bvh_stale());
        assert_eq!(scene.bvh().map(|b| b.primitive_count()), Some(2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stale BVH")]
    fn test_intersect_with_stale_bvh_panics_in_debug() {
        let mut scene = Scene::new();
        scene.set_use_bvh(true);
        let m = scene.add_material(Material::lambert(Color::ONE));
        scene.start_construction();
        scene.add_sphere(m, Vec3::ZERO, 1.0);
        scene.finish_construction();

        scene.add_sphere(m, Vec3::X * 5.0, 1.0);
        let _ = scene.intersect(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z));
    }

    #[test]
    fn test_clear_materials_drops_shapes_too() {
        let mut scene = scene_with_spheres(true);
        scene.clear_materials();
        assert!(scene.materials().is_empty());
        assert!(scene.shapes().is_empty());
        assert!(scene.bvh().is_none());
    }

    #[test]
    fn test_start_construction_clears_shapes_keeps_materials() {
        let mut scene = scene_with_spheres(true);
        let materials = scene.materials().len();
        scene.start_construction();
        assert!(scene.shapes().is_empty());
        assert!(scene.bvh().is_none());
        assert_eq!(scene.materials().len(), materials);
    }
}
