//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! and in parallel using rayon. Each bucket keeps its own accumulator and
//! random state for the whole render, so no two workers ever touch the same
//! pixel and results do not depend on scheduling.

use crate::renderer::{running_mean, trace_path};
use crate::{gen_f32, Color, ImageBuffer, Scene};
use lumen_math::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of the bucket's first pixel column
    pub x: u32,
    /// Y coordinate of the bucket's first pixel row
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    /// Create a new bucket.
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Generate buckets for an image, sorted in spiral order from center.
///
/// Buckets are rendered from the center outward so the most important
/// part of the image converges first. A `bucket_size` of zero is treated
/// as one.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();
    let mut index = 0;

    // Generate grid of buckets
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    // Sort by distance from center (spiral order)
    sort_spiral(&mut buckets, width, height);

    // Update indices after sorting
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center. Equal distances keep grid order.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Seed for a bucket's random stream, derived from the render seed.
#[inline]
pub(crate) fn bucket_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// A bucket together with the running-mean accumulator for its pixels.
pub(crate) struct BucketTile {
    pub bucket: Bucket,
    /// Running means in row-major order within the bucket
    pub pixels: Vec<Color>,
    rng: StdRng,
}

impl BucketTile {
    pub fn new(bucket: Bucket, seed: u64) -> Self {
        Self {
            bucket,
            pixels: vec![Color::ZERO; bucket.pixel_count() as usize],
            rng: StdRng::seed_from_u64(bucket_seed(seed, bucket.index)),
        }
    }

    /// Trace one jittered path per pixel and fold it into the running means.
    ///
    /// `sample` is the 0-based index of the sample being added.
    pub fn render_sample(&mut self, scene: &Scene, max_bounces: u32, sample: u32) {
        let camera = scene.camera();
        let mut i = 0;
        for local_y in 0..self.bucket.height {
            for local_x in 0..self.bucket.width {
                let x = (self.bucket.x + local_x) as f32 + gen_f32(&mut self.rng);
                let y = (self.bucket.y + local_y) as f32 + gen_f32(&mut self.rng);
                let ray = camera.get_ray(Vec2::new(x, y));
                let color = trace_path(scene, ray, max_bounces, &mut self.rng);
                self.pixels[i] = running_mean(self.pixels[i], color, sample);
                i += 1;
            }
        }
    }

    /// Copy the accumulated pixels into their place in the full image.
    pub fn write_to(&self, image: &mut ImageBuffer) {
        let width = self.bucket.width as usize;
        for (local_y, row) in self.pixels.chunks_exact(width.max(1)).enumerate() {
            for (local_x, &color) in row.iter().enumerate() {
                image.set(
                    self.bucket.x + local_x as u32,
                    self.bucket.y + local_y as u32,
                    color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_buckets_exact_fit() {
        let buckets = generate_buckets(128, 128, 64);
        assert_eq!(buckets.len(), 4); // 2x2 grid

        // Total pixels should equal image size
        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_buckets_partial_fit() {
        let buckets = generate_buckets(100, 100, 64);
        assert_eq!(buckets.len(), 4); // 2x2 grid with partial buckets

        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 100);
    }

    #[test]
    fn test_spiral_order() {
        let buckets = generate_buckets(192, 192, 64);
        assert_eq!(buckets.len(), 9); // 3x3 grid

        // First bucket should be the center one
        let first = &buckets[0];
        assert_eq!(first.x, 64);
        assert_eq!(first.y, 64);
        assert!(buckets.iter().enumerate().all(|(i, b)| b.index == i));
    }

    #[test]
    fn test_zero_bucket_size_does_not_hang() {
        let buckets = generate_buckets(3, 2, 0);
        assert_eq!(buckets.len(), 6);
    }

    #[test]
    fn test_bucket_seeds_differ() {
        assert_eq!(bucket_seed(7, 0), 7);
        assert_ne!(bucket_seed(7, 1), bucket_seed(7, 2));
    }

    #[test]
    fn test_tile_write_to_places_pixels() {
        let bucket = Bucket::new(2, 1, 2, 2, 0);
        let mut tile = BucketTile::new(bucket, 0);
        tile.pixels = vec![
            Color::splat(1.0),
            Color::splat(2.0),
            Color::splat(3.0),
            Color::splat(4.0),
        ];

        let mut image = ImageBuffer::new(4, 3);
        tile.write_to(&mut image);
        assert_eq!(image.get(2, 1), Color::splat(1.0));
        assert_eq!(image.get(3, 1), Color::splat(2.0));
        assert_eq!(image.get(2, 2), Color::splat(3.0));
        assert_eq!(image.get(3, 2), Color::splat(4.0));
        assert_eq!(image.get(0, 0), Color::ZERO);
    }
}
