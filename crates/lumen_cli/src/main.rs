use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lumen_renderer::{debug_draw, presets, render_progressive, DebugMode, RenderConfig};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Render one of the built-in scenes with a progressive path tracer.
///
/// Any scene name that is not a built-in preset renders that name as text.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Name of the scene to render
    #[arg(default_value = "cornell_box1")]
    scene: String,

    /// Output image path (default: the scene name followed by .png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Samples per pixel
    #[arg(short, long)]
    samples: Option<u32>,

    /// Maximum number of bounces per path
    #[arg(short, long)]
    bounces: Option<u32>,

    /// Test every shape instead of building a bounding volume hierarchy
    #[arg(short = 'n', long)]
    no_bvh: bool,

    /// Draw first-hit distances or normals instead of path tracing
    #[arg(short, long, value_enum)]
    debug: Option<DebugArg>,

    /// Seed for the random number streams
    #[arg(long)]
    seed: Option<u64>,

    /// JSON render config; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DebugArg {
    Distance,
    Normal,
}

impl From<DebugArg> for DebugMode {
    fn from(arg: DebugArg) -> Self {
        match arg {
            DebugArg::Distance => DebugMode::Distance,
            DebugArg::Normal => DebugMode::Normal,
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::from_json_file(path)
                .with_context(|| format!("Failed to load render config {}", path.display()))?,
            None => RenderConfig::default(),
        };

        if let Some(samples) = self.samples {
            config.samples_per_pixel = samples;
        }
        if let Some(bounces) = self.bounces {
            config.max_bounces = bounces;
        }
        if self.no_bvh {
            config.use_bvh = false;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config.validate().context("Invalid render settings")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = cli.render_config()?;
    let scene_name = cli.scene.to_lowercase();

    log::info!("Setting up scene: {}", scene_name);
    let start = Instant::now();
    let scene = presets::build(&scene_name, config.use_bvh);
    log::info!("Scene set up in {:.2?}", start.elapsed());

    let debug_mode = cli.debug.map(DebugMode::from);
    let image = match debug_mode {
        Some(mode) => debug_draw(&scene, mode, config.seed),
        None => {
            log::info!(
                "Rendering scene: {} ({} spp, {} bounces)",
                scene_name,
                config.samples_per_pixel,
                config.max_bounces
            );
            let start = Instant::now();
            let image = render_progressive(&scene, &config, |progress| {
                eprint!("\rSample: {}/{}", progress.completed, progress.total);
                let _ = std::io::stderr().flush();
            });
            eprintln!();
            log::info!("Total render time: {:.2?}", start.elapsed());
            image
        }
    };

    let output = cli.output.unwrap_or_else(|| match debug_mode {
        Some(mode) => PathBuf::from(format!("{}-{}-debug.png", scene_name, mode.name())),
        None => PathBuf::from(format!("{}.png", scene_name)),
    });
    image
        .save(&output)
        .with_context(|| format!("Failed to save image to {}", output.display()))?;

    Ok(())
}
