//! Progressive path tracing.
//!
//! Implements Monte Carlo path tracing with:
//! - A bounded bounce loop with no Russian roulette
//! - Anti-aliasing via jittered sub-pixel samples
//! - Online running-mean accumulation, observable after every sample
//! - Bucket-parallel rendering with per-bucket random streams

use crate::bucket::{generate_buckets, BucketTile, DEFAULT_BUCKET_SIZE};
use crate::{gen_f32, Color, ImageBuffer, Ray, RenderError, RenderResult, Scene};
use lumen_math::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Distance a bounced ray is moved along its direction to avoid re-hitting
/// the surface it left.
pub const RAY_EPSILON: f32 = 1e-4;

/// Colour written for pixels whose debug ray hits nothing.
pub const DEBUG_MISS_COLOR: Color = Color::splat(1_000_000.0);

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel
    pub samples_per_pixel: u32,
    /// Maximum number of scene queries per path
    pub max_bounces: u32,
    /// Build a BVH for the scene instead of testing every shape
    pub use_bvh: bool,
    /// Seed for all random streams of a render
    pub seed: u64,
    /// Edge length of the square buckets the image is split into
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1000,
            max_bounces: 5,
            use_bvh: true,
            seed: 0,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    /// Load a config from JSON. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.bucket_size == 0 {
            return Err(RenderError::InvalidConfig(
                "bucket_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Progress report passed to the callback of [`render_progressive`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleProgress {
    /// Samples per pixel accumulated so far
    pub completed: u32,
    pub total: u32,
    pub elapsed: Duration,
}

/// Fold sample number `sample_index` (0-based) into a running mean.
#[inline]
pub fn running_mean(mean: Color, sample: Color, sample_index: u32) -> Color {
    mean + (sample - mean) / (sample_index as f32 + 1.0)
}

/// Follow a single light path and return the radiance it carries back.
///
/// The path makes at most `max_bounces` scene queries. It ends early when it
/// escapes to the background or hits a surface that reflects nothing.
pub fn trace_path(scene: &Scene, mut ray: Ray, max_bounces: u32, rng: &mut dyn RngCore) -> Color {
    let mut throughput = Color::ONE;
    let mut radiance = Color::ZERO;

    for _ in 0..max_bounces {
        let Some(hit) = scene.intersect(&ray) else {
            radiance += throughput * scene.sample_background(ray.direction);
            break;
        };

        let point = ray.at(hit.distance);
        let sample = scene
            .material(hit.material)
            .sample(ray.direction, point, hit.normal, rng);

        radiance += throughput * sample.emission;
        throughput *= sample.factor;
        if sample.factor == Color::ZERO {
            break;
        }

        debug_assert!(
            sample.outgoing.is_normalized(),
            "material returned a non-unit direction {:?}",
            sample.outgoing
        );
        ray = Ray::new(point + sample.outgoing * RAY_EPSILON, sample.outgoing);
    }

    radiance
}

/// Render the scene, calling `on_sample` after every completed sample pass.
///
/// Every pass adds one sample to every pixel. `on_sample` only receives the
/// pass counters; the accumulated image is returned once all passes finish.
/// Buckets render in parallel; the output only depends on the scene and
/// `config`, not on the number of threads.
pub fn render_progressive<F>(scene: &Scene, config: &RenderConfig, mut on_sample: F) -> ImageBuffer
where
    F: FnMut(SampleProgress),
{
    let start = Instant::now();
    let viewport = scene.camera().viewport_size();
    let mut tiles: Vec<BucketTile> = generate_buckets(viewport.x, viewport.y, config.bucket_size)
        .into_iter()
        .map(|bucket| BucketTile::new(bucket, config.seed))
        .collect();

    log::debug!(
        "Rendering {}x{} in {} buckets, {} spp, {} bounces",
        viewport.x,
        viewport.y,
        tiles.len(),
        config.samples_per_pixel,
        config.max_bounces
    );

    for sample in 0..config.samples_per_pixel {
        tiles
            .par_iter_mut()
            .for_each(|tile| tile.render_sample(scene, config.max_bounces, sample));

        let progress = SampleProgress {
            completed: sample + 1,
            total: config.samples_per_pixel,
            elapsed: start.elapsed(),
        };
        log::debug!("Sample {}/{}", progress.completed, progress.total);
        on_sample(progress);
    }

    let mut image = ImageBuffer::new(viewport.x, viewport.y);
    for tile in &tiles {
        tile.write_to(&mut image);
    }
    image
}

/// Render the scene to completion.
pub fn render(scene: &Scene, config: &RenderConfig) -> ImageBuffer {
    let start = Instant::now();
    let image = render_progressive(scene, config, |_| {});
    log::info!(
        "Rendered {} samples per pixel in {:.2?}",
        config.samples_per_pixel,
        start.elapsed()
    );
    image
}

/// What a debug render shows per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugMode {
    /// Hit distance, scaled by 0.1, as grey
    Distance,
    /// Hit normal mapped from [-1, 1] to [0, 1]
    Normal,
}

impl DebugMode {
    /// Suffix used for default output file names.
    pub fn name(self) -> &'static str {
        match self {
            DebugMode::Distance => "distance",
            DebugMode::Normal => "normal",
        }
    }
}

/// Visualise first hits with one jittered ray per pixel.
///
/// Misses are written as [`DEBUG_MISS_COLOR`].
pub fn debug_draw(scene: &Scene, mode: DebugMode, seed: u64) -> ImageBuffer {
    log::info!("Debug drawing hit {}", mode.name());

    let camera = scene.camera();
    let viewport = camera.viewport_size();
    let mut image = ImageBuffer::new(viewport.x, viewport.y);
    let mut rng = StdRng::seed_from_u64(seed);

    for y in 0..viewport.y {
        for x in 0..viewport.x {
            let pixel = Vec2::new(x as f32 + gen_f32(&mut rng), y as f32 + gen_f32(&mut rng));
            let ray = camera.get_ray(pixel);
            let color = match scene.intersect(&ray) {
                Some(hit) => match mode {
                    DebugMode::Distance => Color::splat(hit.distance * 0.1),
                    DebugMode::Normal => hit.normal * 0.5 + 0.5,
                },
                None => DEBUG_MISS_COLOR,
            };
            image.set(x, y, color);
        }
    }
    image
}
