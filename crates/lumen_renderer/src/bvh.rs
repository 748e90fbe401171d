//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree built top-down with the Surface Area Heuristic. Nodes live
//! in a flat arena and refer to their children by index; leaves refer to a
//! contiguous run of a single index array that construction reorders, so
//! primitives are never copied or shared.

use crate::{Hittable, RayHit};
use lumen_math::{Aabb, Ray};
use std::time::Instant;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node with two children, addressed by node index.
    Branch {
        left: usize,
        right: usize,
        bbox: Aabb,
    },
    /// Leaf node over `indices[start..start + count]`.
    Leaf { start: usize, count: usize, bbox: Aabb },
}

impl BvhNode {
    /// Box covering everything below this node.
    #[inline]
    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => *bbox,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }
}

/// The cheapest split found for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SahSplit {
    /// Number of primitives that go to the left child
    pub index: usize,
    /// SAH cost of the split
    pub cost: f32,
    /// Box of the first `index` primitives
    pub left: Aabb,
    /// Box of the remaining primitives
    pub right: Aabb,
}

/// Cost of keeping `count` primitives in a single leaf.
#[inline]
pub fn leaf_cost(count: usize, bbox: &Aabb) -> f32 {
    count as f32 * bbox.surface_area()
}

/// Find the SAH-optimal split of primitives already sorted along the split axis.
///
/// Every split point `k` in `1..n - 1` is scored as
/// `k * SA(left) + (n - k) * SA(right)`, with the side boxes taken from one
/// forward and one backward prefix-merge pass. Returns `None` when no split is
/// strictly cheaper than keeping all primitives in one leaf under `bbox`.
/// Among equally cheap splits the lowest `k` wins. The last primitive is
/// never split off on its own, so a pair of primitives always stays in one
/// leaf.
pub fn find_best_split(sorted_bounds: &[Aabb], bbox: &Aabb) -> Option<SahSplit> {
    let n = sorted_bounds.len();
    if n <= 1 {
        return None;
    }

    // left[i] covers sorted_bounds[..=i], right[i] covers sorted_bounds[i..]
    let mut left = Vec::with_capacity(n);
    let mut acc = Aabb::EMPTY;
    for b in sorted_bounds {
        acc = acc.merge(b);
        left.push(acc);
    }
    let mut right = vec![Aabb::EMPTY; n];
    let mut acc = Aabb::EMPTY;
    for (i, b) in sorted_bounds.iter().enumerate().rev() {
        acc = acc.merge(b);
        right[i] = acc;
    }

    let mut best_cost = leaf_cost(n, bbox);
    let mut best = None;
    for k in 1..n - 1 {
        let cost = k as f32 * left[k - 1].surface_area()
            + (n - k) as f32 * right[k].surface_area();
        if cost < best_cost {
            best_cost = cost;
            best = Some(SahSplit {
                index: k,
                cost,
                left: left[k - 1],
                right: right[k],
            });
        }
    }
    best
}

/// Shape statistics of a built hierarchy, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub max_leaf_size: usize,
}

/// A bounding volume hierarchy over a slice of primitives.
///
/// The BVH does not own the primitives. It must be queried with the same
/// slice (same length, same order) it was built from.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<usize>,
}

impl Bvh {
    /// Build a BVH over the given primitives.
    pub fn build<P: Hittable>(primitives: &[P]) -> Self {
        let start = Instant::now();
        let n = primitives.len();
        let bounds: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();

        let mut bvh = Bvh {
            nodes: Vec::with_capacity(2 * n),
            indices: (0..n).collect(),
        };

        if n > 0 {
            let root_bbox = bounds.iter().fold(Aabb::EMPTY, |acc, b| acc.merge(b));
            bvh.build_node(&bounds, 0, n, root_bbox);
        }

        if log::log_enabled!(log::Level::Debug) {
            let stats = bvh.stats();
            log::debug!(
                "Built BVH over {} primitives: {} nodes, {} leaves, depth {} in {:?}",
                n,
                stats.node_count,
                stats.leaf_count,
                stats.max_depth,
                start.elapsed()
            );
        }
        bvh
    }

    /// Recursive SAH construction over `indices[start..end]`, whose merged
    /// bounds are `bbox`. Returns the index of the created node.
    fn build_node(&mut self, bounds: &[Aabb], start: usize, end: usize, bbox: Aabb) -> usize {
        let node_index = self.nodes.len();
        self.nodes.push(BvhNode::Leaf {
            start,
            count: end - start,
            bbox,
        });

        if end - start <= 1 {
            return node_index;
        }

        // Sort along the longest axis so every split is a contiguous slice
        let axis = bbox.longest_axis();
        self.indices[start..end]
            .sort_unstable_by(|&a, &b| bounds[a].vmin[axis].total_cmp(&bounds[b].vmin[axis]));

        let sorted: Vec<Aabb> = self.indices[start..end].iter().map(|&i| bounds[i]).collect();
        if let Some(split) = find_best_split(&sorted, &bbox) {
            let mid = start + split.index;
            let left = self.build_node(bounds, start, mid, split.left);
            let right = self.build_node(bounds, mid, end, split.right);
            self.nodes[node_index] = BvhNode::Branch { left, right, bbox };
        }

        node_index
    }

    /// The root node, or `None` for a hierarchy over no primitives.
    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.first()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitive indices in the order construction left them.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of primitives the hierarchy was built over.
    pub fn primitive_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Primitive indices owned by a leaf; empty for a branch.
    pub fn leaf_primitives(&self, node: &BvhNode) -> &[usize] {
        match *node {
            BvhNode::Leaf { start, count, .. } => &self.indices[start..start + count],
            BvhNode::Branch { .. } => &[],
        }
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            ..Default::default()
        };
        if self.nodes.is_empty() {
            return stats;
        }
        let mut stack = vec![(0usize, 1usize)];
        while let Some((index, depth)) = stack.pop() {
            stats.max_depth = stats.max_depth.max(depth);
            match self.nodes[index] {
                BvhNode::Leaf { count, .. } => {
                    stats.leaf_count += 1;
                    stats.max_leaf_size = stats.max_leaf_size.max(count);
                }
                BvhNode::Branch { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        stats
    }

    /// Find the closest hit along the ray.
    pub fn closest_hit<P: Hittable>(&self, primitives: &[P], ray: &Ray) -> Option<RayHit> {
        let mut best = RayHit::default();
        self.intersect(primitives, ray, &mut best).then_some(best)
    }

    /// Nearest-hit query against a caller-owned best hit.
    ///
    /// Returns true if some primitive produced a hit strictly closer than
    /// `best.distance`, in which case `best` now holds it. Start from
    /// `RayHit::default()` (distance = +inf) for a fresh query.
    pub fn intersect<P: Hittable>(&self, primitives: &[P], ray: &Ray, best: &mut RayHit) -> bool {
        debug_assert_eq!(
            primitives.len(),
            self.indices.len(),
            "BVH queried with a primitive collection it was not built from"
        );

        let Some(root) = self.nodes.first() else {
            return false;
        };
        // Rays that miss the whole scene pay for one box test only
        if root.bounding_box().intersect_ray(ray).is_none() {
            return false;
        }
        self.intersect_node(0, primitives, ray, best)
    }

    fn intersect_node<P: Hittable>(
        &self,
        index: usize,
        primitives: &[P],
        ray: &Ray,
        best: &mut RayHit,
    ) -> bool {
        match self.nodes[index] {
            BvhNode::Leaf { start, count, .. } => {
                let mut has_hit = false;
                for &i in &self.indices[start..start + count] {
                    if let Some(hit) = primitives[i].intersect(ray) {
                        if hit.distance < best.distance {
                            *best = RayHit { primitive: i, ..hit };
                            has_hit = true;
                        }
                    }
                }
                has_hit
            }
            BvhNode::Branch { left, right, .. } => {
                // A child is only worth visiting if its box starts before the
                // best hit found so far.
                let left_dist = self.child_entry(left, ray, best.distance);
                let right_dist = self.child_entry(right, ray, best.distance);

                match (left_dist, right_dist) {
                    (Some(l), Some(r)) => {
                        let (near, far, far_dist) = if l < r {
                            (left, right, r)
                        } else {
                            (right, left, l)
                        };
                        let near_hit = self.intersect_node(near, primitives, ray, best);
                        // The near child may have produced a hit that occludes the far box
                        let far_hit = far_dist < best.distance
                            && self.intersect_node(far, primitives, ray, best);
                        near_hit || far_hit
                    }
                    (Some(_), None) => self.intersect_node(left, primitives, ray, best),
                    (None, Some(_)) => self.intersect_node(right, primitives, ray, best),
                    (None, None) => false,
                }
            }
        }
    }

    #[inline]
    fn child_entry(&self, child: usize, ray: &Ray, best_distance: f32) -> Option<f32> {
        self.nodes[child]
            .bounding_box()
            .intersect_ray(ray)
            .filter(|&t| t < best_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{closest_hit_linear, MaterialId, Shape, Sphere, Triangle};
    use lumen_math::Vec3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sphere(center: Vec3, radius: f32) -> Shape {
        Shape::Sphere(Sphere::new(center, radius, MaterialId(0)))
    }

    fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
        Vec3::new(
            rng.gen_range(-range..range),
            rng.gen_range(-range..range),
            rng.gen_range(-range..range),
        )
    }

    fn random_scene(rng: &mut StdRng, count: usize) -> Vec<Shape> {
        (0..count)
            .map(|i| {
                let center = random_vec(rng, 20.0);
                if i % 2 == 0 {
                    sphere(center, rng.gen_range(0.1..1.5))
                } else {
                    Shape::Triangle(Triangle::new(
                        center + random_vec(rng, 2.0),
                        center + random_vec(rng, 2.0),
                        center + random_vec(rng, 2.0),
                        MaterialId(0),
                    ))
                }
            })
            .collect()
    }

    fn random_ray(rng: &mut StdRng) -> Ray {
        let origin = random_vec(rng, 30.0);
        let target = random_vec(rng, 20.0);
        Ray::new(origin, (target - origin).normalize())
    }

    #[test]
    fn test_bvh_empty() {
        let shapes: Vec<Shape> = Vec::new();
        let bvh = Bvh::build(&shapes);

        assert!(bvh.is_empty());
        assert!(bvh.root().is_none());
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(bvh.closest_hit(&shapes, &ray).is_none());
    }

    #[test]
    fn test_bvh_single_primitive_is_leaf() {
        let shapes = vec![sphere(Vec3::new(0.0, 0.0, -1.0), 0.5)];
        let bvh = Bvh::build(&shapes);

        let root = bvh.root().expect("root");
        assert!(root.is_leaf());
        assert_eq!(bvh.leaf_primitives(root), &[0]);
        assert_eq!(bvh.nodes().len(), 1);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = bvh.closest_hit(&shapes, &ray).expect("hit");
        assert!((hit.distance - 0.5).abs() < 1e-4);
        assert_eq!(hit.primitive, 0);
    }

    #[test]
    fn test_separated_pair_stays_in_one_leaf() {
        let shapes = vec![
            sphere(Vec3::new(-10.0, 0.0, 0.0), 0.5),
            sphere(Vec3::new(10.0, 0.0, 0.0), 0.5),
        ];
        let bvh = Bvh::build(&shapes);

        let root = bvh.root().expect("root");
        assert!(root.is_leaf());
        assert_eq!(bvh.leaf_primitives(root).len(), 2);
        assert_eq!(bvh.stats().leaf_count, 1);
    }

    #[test]
    fn test_split_never_isolates_last_primitive() {
        // Splitting off the far sphere would be cheapest, but k = n - 1 is not a candidate
        let bounds: Vec<Aabb> = [0.0, 0.2, 100.0]
            .iter()
            .map(|&x| sphere(Vec3::new(x, 0.0, 0.0), 0.5).bounding_box())
            .collect();
        let bbox = bounds.iter().fold(Aabb::EMPTY, |acc, b| acc.merge(b));

        let split = find_best_split(&bounds, &bbox).expect("split");
        assert_eq!(split.index, 1);
    }

    #[test]
    fn test_three_primitives_split_into_single_and_pair() {
        let shapes = vec![
            sphere(Vec3::new(0.0, 0.0, 0.0), 0.5),
            sphere(Vec3::new(0.2, 0.0, 0.0), 0.5),
            sphere(Vec3::new(100.0, 0.0, 0.0), 0.5),
        ];
        let bvh = Bvh::build(&shapes);

        let stats = bvh.stats();
        assert_eq!(stats.leaf_count, 2);
        assert_eq!(stats.max_leaf_size, 2);
        assert_eq!(bvh.leaf_primitives(&bvh.nodes()[1]), &[0]);
    }

    #[test]
    fn test_coincident_pair_stays_in_one_leaf() {
        // Splitting two identical boxes costs exactly as much as not splitting
        let shapes = vec![sphere(Vec3::ZERO, 1.0), sphere(Vec3::ZERO, 1.0)];
        let bvh = Bvh::build(&shapes);

        let root = bvh.root().expect("root");
        assert!(root.is_leaf());
        assert_eq!(bvh.leaf_primitives(root).len(), 2);
    }

    #[test]
    fn test_build_permutes_indices_and_leaves_partition_primitives() {
        let mut rng = StdRng::seed_from_u64(5);
        let shapes = random_scene(&mut rng, 300);
        let bvh = Bvh::build(&shapes);

        let mut sorted = bvh.indices().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..shapes.len()).collect::<Vec<_>>());

        let mut seen = vec![0usize; shapes.len()];
        for node in bvh.nodes() {
            match *node {
                BvhNode::Leaf { bbox, .. } => {
                    for &i in bvh.leaf_primitives(node) {
                        seen[i] += 1;
                        assert_eq!(bbox.merge(&shapes[i].bounding_box()), bbox);
                    }
                }
                BvhNode::Branch { left, right, bbox } => {
                    let children = bvh.nodes()[left]
                        .bounding_box()
                        .merge(&bvh.nodes()[right].bounding_box());
                    assert_eq!(children, bbox);
                }
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(42);
        let shapes = random_scene(&mut rng, 400);
        let bvh = Bvh::build(&shapes);

        let mut hits = 0;
        for _ in 0..10_000 {
            let ray = random_ray(&mut rng);
            let expected = closest_hit_linear(&shapes, &ray);
            let actual = bvh.closest_hit(&shapes, &ray);

            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => {
                    hits += 1;
                    assert!(
                        (e.distance - a.distance).abs() <= 1e-4 * e.distance.max(1.0),
                        "distance mismatch: linear {} vs bvh {}",
                        e.distance,
                        a.distance
                    );
                    if e.primitive != a.primitive {
                        // Only acceptable for an exact tie
                        assert_eq!(e.distance, a.distance);
                    }
                }
                (e, a) => panic!("hit mismatch: linear {:?} vs bvh {:?}", e, a),
            }
        }
        // Make sure the rays actually exercised the tree
        assert!(hits > 500, "only {} rays hit anything", hits);
    }

    #[test]
    fn test_near_cluster_prunes_far_cluster() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut shapes = Vec::new();
        // Cluster A around x = -100, cluster B around x = +100
        for _ in 0..50 {
            shapes.push(sphere(Vec3::new(-100.0, 0.0, 0.0) + random_vec(&mut rng, 5.0), 0.5));
        }
        for _ in 0..50 {
            shapes.push(sphere(Vec3::new(100.0, 0.0, 0.0) + random_vec(&mut rng, 5.0), 0.5));
        }
        let bvh = Bvh::build(&shapes);

        for i in 0..50 {
            let target = shapes[i].bounding_box();
            let center = (target.vmin + target.vmax) * 0.5;
            let origin = Vec3::new(-100.0, 0.0, 50.0);
            let ray = Ray::new(origin, (center - origin).normalize());

            let hit = bvh.closest_hit(&shapes, &ray).expect("aimed at a sphere");
            assert!(hit.primitive < 50, "ray aimed at cluster A hit cluster B");
        }
    }

    /// Counts how many primitive tests a query performs.
    struct Counted<'a> {
        shape: Shape,
        tests: &'a AtomicUsize,
    }

    impl Hittable for Counted<'_> {
        fn intersect(&self, ray: &Ray) -> Option<RayHit> {
            self.tests.fetch_add(1, Ordering::Relaxed);
            self.shape.intersect(ray)
        }

        fn bounding_box(&self) -> Aabb {
            self.shape.bounding_box()
        }
    }

    #[test]
    fn test_near_hit_skips_occluded_subtrees() {
        let tests = AtomicUsize::new(0);
        let shapes: Vec<Counted> = (0..20)
            .map(|i| Counted {
                shape: sphere(Vec3::new(i as f32 * 3.0, 0.0, 0.0), 1.0),
                tests: &tests,
            })
            .collect();
        let bvh = Bvh::build(&shapes);

        // Every sphere lies on the ray; the first one occludes the rest
        let ray = Ray::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::X);
        let hit = bvh.closest_hit(&shapes, &ray).expect("hit");
        assert_eq!(hit.primitive, 0);
        assert!((hit.distance - 9.0).abs() < 1e-4);

        let bvh_tests = tests.swap(0, Ordering::Relaxed);
        let linear = closest_hit_linear(&shapes, &ray).expect("hit");
        assert_eq!(linear.primitive, 0);
        assert_eq!(tests.load(Ordering::Relaxed), shapes.len());
        assert!(
            bvh_tests <= 2,
            "BVH tested {} primitives, linear scan {}",
            bvh_tests,
            shapes.len()
        );
    }

    #[test]
    fn test_ray_starting_inside_root_box() {
        let shapes = vec![
            sphere(Vec3::new(-5.0, 0.0, 0.0), 1.0),
            sphere(Vec3::new(5.0, 0.0, 0.0), 1.0),
        ];
        let bvh = Bvh::build(&shapes);

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = bvh.closest_hit(&shapes, &ray).expect("hit");
        assert_eq!(hit.primitive, 1);
        assert!((hit.distance - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_intersect_keeps_closer_existing_hit() {
        let shapes = vec![sphere(Vec3::new(0.0, 0.0, -10.0), 1.0)];
        let bvh = Bvh::build(&shapes);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let mut best = RayHit {
            distance: 2.0,
            ..RayHit::default()
        };
        assert!(!bvh.intersect(&shapes, &ray, &mut best));
        assert_eq!(best.distance, 2.0);
    }

    #[test]
    fn test_split_never_costs_more_than_leaf() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..200 {
            let count = rng.gen_range(2..40);
            let shapes = random_scene(&mut rng, count);
            let mut bounds: Vec<Aabb> = shapes.iter().map(|s| s.bounding_box()).collect();
            let bbox = bounds.iter().fold(Aabb::EMPTY, |acc, b| acc.merge(b));
            let axis = bbox.longest_axis();
            bounds.sort_unstable_by(|a, b| a.vmin[axis].total_cmp(&b.vmin[axis]));

            if let Some(split) = find_best_split(&bounds, &bbox) {
                assert!(split.cost < leaf_cost(count, &bbox));
                assert!(split.index >= 1 && split.index < count - 1);

                // Exhaustive check that no other candidate split point is cheaper
                for k in 1..count - 1 {
                    let l = bounds[..k].iter().fold(Aabb::EMPTY, |acc, b| acc.merge(b));
                    let r = bounds[k..].iter().fold(Aabb::EMPTY, |acc, b| acc.merge(b));
                    let cost = k as f32 * l.surface_area() + (count - k) as f32 * r.surface_area();
                    assert!(split.cost <= cost * (1.0 + 1e-5));
                }
            }
        }
    }

    #[test]
    fn test_find_best_split_degenerate_inputs() {
        let b = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        assert!(find_best_split(&[], &Aabb::EMPTY).is_none());
        assert!(find_best_split(&[b], &b).is_none());
    }
}
