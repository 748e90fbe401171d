//! Simple path tracer example.
//!
//! Renders spheres on a ground plane under a sky and saves a PNG.

use lumen_renderer::{
    render_progressive, Background, Camera, Color, Material, RenderConfig, Scene, SkyBackground,
    UVec2, Vec2, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("Lumen Path Tracer - Simple Example");
    println!("==================================");

    // Build the scene
    let start = std::time::Instant::now();
    let scene = build_scene();
    println!("Scene built in {:?} ({} shapes)", start.elapsed(), scene.shapes().len());

    let config = RenderConfig {
        samples_per_pixel: 64,
        max_bounces: 8,
        ..Default::default()
    };

    let viewport = scene.camera().viewport_size();
    println!(
        "Rendering {}x{} @ {} spp...",
        viewport.x, viewport.y, config.samples_per_pixel
    );

    let start = std::time::Instant::now();
    let image = render_progressive(&scene, &config, |progress| {
        if progress.completed % 16 == 0 {
            println!("  {}/{} samples", progress.completed, progress.total);
        }
    });
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.png";
    image.save(filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> Scene {
    let mut scene = Scene::new();
    scene.set_use_bvh(true);
    scene.set_camera(Camera::new(
        Vec3::new(13.0, 2.0, 3.0),
        Vec3::ZERO,
        Vec3::Y,
        20f32.to_radians(),
        UVec2::new(640, 360),
    ));
    scene.set_background(Background::Sky(SkyBackground::new(
        Color::new(0.5, 0.7, 1.0),
        Color::ONE,
        Color::splat(0.3),
        Color::new(1.0, 0.9, 0.8) * 40.0,
        Vec3::new(-1.0, 2.0, 1.0),
        5f32.to_radians(),
        2f32.to_radians(),
    )));

    let ground = scene.add_material(Material::lambert(Color::splat(0.5)));
    let brown = scene.add_material(Material::lambert(Color::new(0.4, 0.2, 0.1)));
    let steel = scene.add_material(Material::smooth_metal(Color::new(0.7, 0.6, 0.5)));
    let lamp = scene.add_material(Material::emissive(Color::new(4.0, 3.5, 3.0)));

    scene.start_construction();

    scene.add_rectangle(ground, Vec3::ZERO, Vec2::splat(200.0), Vec3::ZERO);

    // Three main spheres
    scene.add_sphere(lamp, Vec3::new(0.0, 1.0, 0.0), 1.0);
    scene.add_sphere(brown, Vec3::new(-4.0, 1.0, 0.0), 1.0);
    scene.add_sphere(steel, Vec3::new(4.0, 1.0, 0.0), 1.0);

    // Small random spheres
    let mut rng = StdRng::seed_from_u64(42);
    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let material = if rng.gen::<f32>() < 0.8 {
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                Material::lambert(albedo)
            } else {
                let specular = Color::new(
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                );
                Material::smooth_metal(specular)
            };
            let material = scene.add_material(material);
            scene.add_sphere(material, center, 0.2);
        }
    }

    // Cuboids around the centre piece
    scene.add_cuboid(
        steel,
        Vec3::new(0.0, 0.25, 2.5),
        Vec3::new(1.5, 0.5, 0.5),
        Vec3::new(0.0, 0.0, 0.4),
    );

    scene.finish_construction();
    scene
}
