//! Built-in test scenes, selected by name.
//!
//! | name                  | contents                                          |
//! |-----------------------|---------------------------------------------------|
//! | `tri_test{v}.{r}`     | one emissive triangle, `r` = 0 for 4x4, 1 for 128x128 |
//! | `sph_test{v}.{r}`     | one emissive sphere, same resolutions             |
//! | `balls{0..2}`         | spheres on a ground plane under a sky             |
//! | `city{0..3}`          | a grid of towers, lit by the sun or street lights |
//! | `cornell_box{0..3}`   | the Cornell box with two blocks                   |
//! | anything else         | the name spelled out in glowing letters in a room |
//!
//! For the triangle and sphere tests, `v` picks the placement: 0 in view,
//! 1 shifted or tilted, 2 edge-on (triangle) or around the camera (sphere),
//! 3 behind the camera.

use crate::{hsl_to_rgb, Background, Camera, Color, Material, Scene, SkyBackground};
use lumen_math::{UVec2, Vec2, Vec3};

/// Names of the built-in scenes, excluding the text scene.
pub const SCENE_NAMES: &[&str] = &[
    "tri_test0.0",
    "tri_test0.1",
    "tri_test1.0",
    "tri_test1.1",
    "tri_test2.0",
    "tri_test2.1",
    "tri_test3.0",
    "tri_test3.1",
    "sph_test0.0",
    "sph_test0.1",
    "sph_test1.0",
    "sph_test1.1",
    "sph_test2.0",
    "sph_test2.1",
    "sph_test3.0",
    "sph_test3.1",
    "balls0",
    "balls1",
    "balls2",
    "city0",
    "city1",
    "city2",
    "city3",
    "cornell_box0",
    "cornell_box1",
    "cornell_box2",
    "cornell_box3",
];

/// Build the named scene into a fresh [`Scene`].
pub fn build(name: &str, use_bvh: bool) -> Scene {
    let mut scene = Scene::new();
    scene.set_use_bvh(use_bvh);
    setup(&mut scene, name);
    scene
}

/// Replace the contents of `scene` with the named preset.
///
/// Materials, shapes and the BVH already in `scene` are discarded, so a scene
/// can be reused across presets. Camera, background and the BVH setting are
/// overwritten or kept as the preset decides. Unknown names produce the text
/// scene for that name.
pub fn setup(scene: &mut Scene, name: &str) {
    scene.clear_materials();
    if let Some((version, size)) = name.strip_prefix("tri_test").and_then(parse_test_suffix) {
        triangle_test(scene, size, version);
    } else if let Some((version, size)) = name.strip_prefix("sph_test").and_then(parse_test_suffix)
    {
        sphere_test(scene, size, version);
    } else if let Some(version) = name.strip_prefix("balls").and_then(|v| parse_version(v, 2)) {
        balls(scene, version);
    } else if let Some(version) = name.strip_prefix("city").and_then(|v| parse_version(v, 3)) {
        city(scene, version);
    } else if let Some(version) = name
        .strip_prefix("cornell_box")
        .and_then(|v| parse_version(v, 3))
    {
        cornell_box(scene, version);
    } else {
        log::info!("No preset named '{}', building the text scene", name);
        text_scene(scene, name);
    }
}

/// Parse a single-digit version no greater than `max`.
fn parse_version(s: &str, max: u32) -> Option<u32> {
    let version: u32 = s.parse().ok()?;
    (s.len() == 1 && version <= max).then_some(version)
}

/// Parse `"{v}.{r}"` into a version and a square resolution.
fn parse_test_suffix(s: &str) -> Option<(u32, u32)> {
    let (version, resolution) = s.split_once('.')?;
    let version = parse_version(version, 3)?;
    let size = match resolution {
        "0" => 4,
        "1" => 128,
        _ => return None,
    };
    Some((version, size))
}

fn test_camera(size: u32) -> Camera {
    Camera::new(
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::ZERO,
        Vec3::Y,
        90f32.to_radians(),
        UVec2::splat(size),
    )
}

fn triangle_test(scene: &mut Scene, size: u32, version: u32) {
    scene.set_background(Background::Constant(Color::ZERO));
    scene.set_camera(test_camera(size));
    scene.start_construction();

    let light = scene.add_material(Material::emissive(Color::splat(2.0)));
    let [v0, v1, v2] = match version {
        0 => [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
        ],
        1 => [
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(0.0, 0.5, -0.5),
        ],
        2 => [
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.0, 0.0, 0.5),
        ],
        _ => [
            Vec3::new(-0.5, -0.5, 2.0),
            Vec3::new(0.5, -0.5, 2.0),
            Vec3::new(0.0, 0.5, 2.0),
        ],
    };
    scene.add_triangle(light, v0, v1, v2);

    scene.finish_construction();
}

fn sphere_test(scene: &mut Scene, size: u32, version: u32) {
    scene.set_background(Background::Constant(Color::ZERO));
    scene.set_camera(test_camera(size));
    scene.start_construction();

    let light = scene.add_material(Material::emissive(Color::splat(2.0)));
    let center = match version {
        0 => Vec3::ZERO,
        1 => Vec3::new(0.0, 0.1, 0.0),
        // Camera sits at the centre
        2 => Vec3::new(0.0, 0.0, 1.0),
        _ => Vec3::new(0.0, 0.0, 2.0),
    };
    scene.add_sphere(light, center, 0.5);

    scene.finish_construction();
}

fn evening_sky(sun_strength: f32, sun_direction: Vec3, sun_angle_degrees: f32) -> Background {
    SkyBackground::new(
        Color::new(0.4, 0.5, 1.0) * 2.0,
        Color::new(0.4, 0.3, 0.8),
        Color::new(0.2, 0.2, 0.3),
        Color::new(1.0, 0.9, 0.9) * sun_strength,
        sun_direction,
        sun_angle_degrees.to_radians(),
        SkyBackground::DEFAULT_SUN_FEATHERING,
    )
    .into()
}

fn balls(scene: &mut Scene, version: u32) {
    scene.set_background(evening_sky(50.0, Vec3::new(1.0, 1.0, -1.0), 30.0));
    scene.set_camera(Camera::new(
        Vec3::new(0.0, 1.0, 4.0),
        Vec3::ZERO,
        Vec3::Y,
        60f32.to_radians(),
        UVec2::splat(256),
    ));
    scene.start_construction();

    let white = scene.add_material(Material::lambert(Color::splat(0.8)));
    let ground = scene.add_material(Material::lambert(Color::new(0.8, 0.2, 0.1)));
    let silver = scene.add_material(Material::smooth_metal(Color::new(0.3, 0.4, 0.5)));

    scene.add_rectangle(ground, Vec3::new(0.0, -1.0, 0.0), Vec2::splat(100.0), Vec3::ZERO);

    let big = if version > 0 { silver } else { white };
    let small = if version > 1 { silver } else { white };
    scene.add_sphere(big, Vec3::ZERO, 1.0);
    for center in [
        Vec3::new(0.0, 1.5, 0.0),
        Vec3::new(1.0, -0.5, 1.0),
        Vec3::new(-1.0, -0.5, 1.0),
        Vec3::new(-1.0, -0.5, -1.0),
        Vec3::new(1.0, -0.5, -1.0),
    ] {
        scene.add_sphere(small, center, 0.5);
    }

    scene.finish_construction();
}

fn city(scene: &mut Scene, version: u32) {
    if version <= 1 {
        scene.set_background(evening_sky(100.0, Vec3::ONE, 20.0));
    } else {
        scene.set_background(Background::Constant(Color::ZERO));
    }
    scene.set_camera(Camera::new(
        Vec3::new(-6.0, 6.0, 10.0),
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::Y,
        60f32.to_radians(),
        UVec2::splat(256),
    ));
    scene.start_construction();

    let grey = scene.add_material(Material::lambert(Color::splat(0.5)));
    let ground = scene.add_material(Material::lambert(Color::new(0.8, 0.2, 0.1)));
    let silver = scene.add_material(Material::smooth_metal(Color::new(0.3, 0.4, 0.5)));
    let light = scene.add_material(Material::emissive(Color::splat(5.0)));

    const HEIGHTS: [[f32; 4]; 4] = [
        [3.0, 1.0, 4.0, 5.0],
        [1.0, 5.0, 2.0, 4.0],
        [1.0, 5.0, 5.0, 4.0],
        [1.0, 5.0, 4.0, 4.0],
    ];

    scene.add_rectangle(ground, Vec3::ZERO, Vec2::splat(1000.0), Vec3::ZERO);

    let building = if version % 2 == 0 { grey } else { silver };
    for (i, row) in HEIGHTS.iter().enumerate() {
        for (j, &height) in row.iter().enumerate() {
            let center = Vec3::new(i as f32 * 2.0 - 3.0, height * 0.5, j as f32 * 2.0 - 3.0);
            scene.add_cuboid(building, center, Vec3::new(1.0, height, 1.0), Vec3::ZERO);
        }
    }

    if version > 1 {
        // Street lights along both directions of the grid
        for i in 0..4 {
            for j in 0..4 {
                let (x, z) = (i as f32 * 2.0, j as f32 * 2.0);
                if i < 3 {
                    scene.add_sphere(light, Vec3::new(x - 2.0, 0.5, z - 3.0), 0.25);
                }
                if j < 3 {
                    scene.add_sphere(light, Vec3::new(x - 3.0, 0.5, z - 2.0), 0.25);
                }
            }
        }
    }

    scene.finish_construction();
}

fn cornell_box(scene: &mut Scene, version: u32) {
    scene.set_background(Background::Constant(Color::ZERO));
    scene.set_camera(Camera::new(
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::ZERO,
        Vec3::Y,
        50f32.to_radians(),
        UVec2::splat(256),
    ));
    scene.start_construction();

    let white = scene.add_material(Material::lambert(Color::splat(0.8)));
    let red = scene.add_material(Material::lambert(Color::new(0.8, 0.0, 0.0)));
    let green = scene.add_material(Material::lambert(Color::new(0.0, 0.8, 0.0)));
    let light = scene.add_material(Material::emissive(Color::splat(5.0)));
    let gold = scene.add_material(Material::smooth_metal(Color::new(1.0, 1.0, 0.0)));

    let quarter = 90f32.to_radians();
    let wall = Vec2::splat(2.0);
    scene.add_rectangle(white, Vec3::new(0.0, 0.0, -1.0), wall, Vec3::new(quarter, 0.0, 0.0));
    scene.add_rectangle(white, Vec3::new(0.0, 1.0, 0.0), wall, Vec3::ZERO);
    scene.add_rectangle(white, Vec3::new(0.0, -1.0, 0.0), wall, Vec3::ZERO);
    scene.add_rectangle(green, Vec3::new(1.0, 0.0, 0.0), wall, Vec3::new(0.0, quarter, 0.0));
    scene.add_rectangle(red, Vec3::new(-1.0, 0.0, 0.0), wall, Vec3::new(0.0, quarter, 0.0));

    scene.add_cuboid(
        white,
        Vec3::new(0.468, -0.7, 0.216),
        Vec3::splat(0.6),
        Vec3::new(0.0, 0.0, -0.314),
    );
    scene.add_cuboid(
        white,
        Vec3::new(-0.36, -0.4, -0.252),
        Vec3::new(0.6, 1.2, 0.6),
        Vec3::new(0.0, 0.0, 0.3925),
    );

    if version <= 1 {
        scene.add_rectangle(light, Vec3::new(0.0, 0.999, 0.0), Vec2::ONE, Vec3::ZERO);
    } else {
        scene.add_sphere(light, Vec3::new(0.5, -0.75, -0.5), 0.25);
    }

    if version % 2 == 1 {
        scene.add_sphere(gold, Vec3::new(0.468, -0.1, 0.216), 0.3);
    }

    scene.finish_construction();
}

// =============================================================================
// Text scene
// =============================================================================

/// Deterministic generator seeded from a scene name.
///
/// FNV-1a over the name's bytes, then a classic linear congruential step.
struct NameRng(u32);

impl NameRng {
    fn from_name(name: &str) -> Self {
        let mut seed: u32 = 2_166_136_261;
        for &b in name.as_bytes() {
            // Bytes are sign-extended like a C `char`
            seed = (seed ^ b as i8 as u32).wrapping_mul(16_777_619);
        }
        Self(seed)
    }

    /// Next value in `0..32768`.
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.0 % 32_768
    }

    /// Next value in `[0, 1]`.
    fn next_unit(&mut self) -> f32 {
        self.next() as f32 / 32_767.0
    }
}

/// 8x8 bitmap for a character, row 0 in the low byte and the bottom of the
/// glyph, column 0 in each byte's high bit. Unknown characters are blank.
fn glyph(c: u8) -> u64 {
    match c.to_ascii_lowercase() {
        b'0' => 0x3c66_6e7e_7666_3e00,
        b'1' => 0x1878_1818_1818_7e00,
        b'2' => 0x3c66_061c_3066_7e00,
        b'3' => 0x3c66_061c_0666_7e00,
        b'4' => 0x1c3c_6ccc_fe0c_0c00,
        b'5' => 0x7e60_7c06_0666_3c00,
        b'6' => 0x1c30_607c_6666_3c00,
        b'7' => 0x7e66_060c_1830_3000,
        b'8' => 0x3c66_663c_6666_3c00,
        b'9' => 0x3c66_663e_060c_3800,
        b'/' => 0x0307_0e1c_3870_f0c0,
        b'\\' => 0xc0f0_7038_1c0e_0703,
        b'@' => 0x3c66_6e6e_6062_3e00,
        b'a' => 0x183c_667e_6666_6600,
        b'b' => 0x7c66_667c_6666_7c00,
        b'c' => 0x3c66_6060_6066_3c00,
        b'd' => 0x786c_6666_666c_7800,
        b'e' => 0x7e60_6078_6060_7e00,
        b'f' => 0x7e60_6078_6060_6000,
        b'g' => 0x3c66_606e_6666_3c00,
        b'h' => 0x6666_667e_6666_6600,
        b'i' => 0x3c18_1818_1818_3c00,
        b'j' => 0x1e0c_0c0c_0c6c_3800,
        b'k' => 0x666c_7870_786c_6600,
        b'l' => 0x6060_6060_6060_7e00,
        b'm' => 0x6377_7f6b_6363_6300,
        b'n' => 0x6676_7e7e_6e66_6600,
        b'o' => 0x3c66_6666_6666_3c00,
        b'p' => 0x7c66_667c_6060_6000,
        b'q' => 0x3c66_6666_663c_0e00,
        b'r' => 0x7c66_667c_786c_6600,
        b's' => 0x3c66_603c_0666_3c00,
        b't' => 0x7e18_1818_1818_1800,
        b'u' => 0x6666_6666_6666_3c00,
        b'v' => 0x6666_6666_663c_1800,
        b'w' => 0x6363_636b_7f77_6300,
        b'x' => 0x6666_3c18_3c66_6600,
        b'y' => 0x6666_663c_1818_1800,
        b'z' => 0x7e06_0c18_3060_7e00,
        b'!' => 0x183c_3c18_1800_1800,
        b'?' => 0x7e66_060c_1800_1000,
        b'#' => 0x6666_ff66_ff66_6600,
        b'$' => 0x183e_603c_067c_1800,
        b'%' => 0x6266_0c18_3066_4600,
        b'&' => 0x3c66_3c38_6766_3f00,
        b'(' => 0x0c18_3030_3018_0c00,
        b')' => 0x3018_0c0c_0c18_3000,
        b'{' => 0x1c30_3060_3030_1c00,
        b'}' => 0x380c_0c06_0c0c_3800,
        b'[' => 0x3c30_3030_3030_3c00,
        b']' => 0x3c0c_0c0c_0c0c_3c00,
        b'|' => 0x1818_1818_1818_1800,
        b'*' => 0x0066_3cff_3c66_0000,
        b':' => 0x0000_1800_0018_0000,
        b'.' => 0x0000_0018_1800_0000,
        b',' => 0x0000_0018_1830_0000,
        b'"' => 0x6666_6600_0000_0000,
        b'-' => 0x0000_007e_0000_0000,
        b'_' => 0x0000_0000_0000_007e,
        b'~' => 0x0000_76fe_dc00_0000,
        b'`' => 0x6030_1800_0000_0000,
        b'+' => 0x0018_187e_1818_0000,
        b'=' => 0x0000_7e00_7e00_0000,
        b'\'' => 0x060c_1800_0000_0000,
        _ => 0,
    }
}

/// A room whose back wall spells the name (up to its first `_`) above
/// "is awesome", with randomly placed spheres on the floor.
fn text_scene(scene: &mut Scene, name: &str) {
    let mut rng = NameRng::from_name(name);

    scene.set_background(Background::Constant(Color::ZERO));
    scene.set_camera(Camera::new(
        Vec3::new(0.0, 0.0, 150.0),
        Vec3::ZERO,
        Vec3::Y,
        50f32.to_radians(),
        UVec2::splat(256),
    ));
    scene.start_construction();

    let white = scene.add_material(Material::lambert(Color::splat(0.8)));
    let light = scene.add_material(Material::emissive(Color::splat(0.9) * 5.0));

    let quarter = 90f32.to_radians();
    let title = name.split('_').next().unwrap_or_default();
    for (line_index, line) in ["is awesome", title].into_iter().enumerate() {
        let length = line.len() as f32;
        let start = Vec3::new(-3.5 - 4.0 * (length - 1.0), -10.0 + 12.0 * line_index as f32, 0.0);
        for (char_index, &c) in line.as_bytes().iter().enumerate() {
            let mask = glyph(c);
            for row in 0..8 {
                for col in 0..8 {
                    if mask & (1u64 << (row * 8 + 7 - col)) == 0 {
                        continue;
                    }
                    let offset = Vec3::new((char_index * 8 + col) as f32, row as f32, -49.99);
                    scene.add_rectangle(
                        light,
                        start + offset,
                        Vec2::ONE,
                        Vec3::new(quarter, 0.0, 0.0),
                    );
                }
            }
        }
    }

    let right = scene.add_material(Material::lambert(hsl_to_rgb(rng.next_unit(), 1.0, 0.5)));
    let left = scene.add_material(Material::lambert(hsl_to_rgb(rng.next_unit(), 1.0, 0.5)));

    let wall = Vec2::splat(100.0);
    scene.add_rectangle(white, Vec3::new(0.0, 0.0, -50.0), wall, Vec3::new(quarter, 0.0, 0.0));
    scene.add_rectangle(white, Vec3::new(0.0, 50.0, 0.0), wall, Vec3::ZERO);
    scene.add_rectangle(white, Vec3::new(0.0, -50.0, 0.0), wall, Vec3::ZERO);
    scene.add_rectangle(right, Vec3::new(50.0, 0.0, 0.0), wall, Vec3::new(0.0, quarter, 0.0));
    scene.add_rectangle(left, Vec3::new(-50.0, 0.0, 0.0), wall, Vec3::new(0.0, quarter, 0.0));

    let mix = |a: f32, b: f32, t: f32| a + (b - a) * t;
    for i in 0..4 {
        for j in 0..4 {
            let radius = mix(5.0, 10.0, rng.next_unit());
            let x = -50.0 + i as f32 * 25.0 + mix(radius, 25.0 - radius, rng.next_unit());
            let y = -50.0 + radius;
            let z = -50.0 + j as f32 * 25.0 + mix(radius, 25.0 - radius, rng.next_unit());
            let color = hsl_to_rgb(rng.next_unit(), 0.5, 0.5);
            let material = if rng.next() % 2 == 1 {
                Material::lambert(color)
            } else {
                Material::smooth_metal(color)
            };
            let material = scene.add_material(material);
            scene.add_sphere(material, Vec3::new(x, y, z), radius);
        }
    }

    scene.finish_construction();
}
