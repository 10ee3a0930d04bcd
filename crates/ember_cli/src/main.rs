//! `ember`: render a built-in scene to a PNG.
//!
//! Usage: `ember <scene> [--config render.json] [--output out.png] [--texture image.png]`

mod scenes;

use anyhow::{Context, Result};
use clap::Parser;
use ember_renderer::RenderConfig;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(version, about = "Render a built-in scene to a PNG")]
struct Args {
    /// Scene to render (spheres, cornell)
    scene: String,

    /// JSON render settings; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output image path
    #[arg(long, default_value = "output.png")]
    output: PathBuf,

    /// Image texture for the textured sphere
    #[arg(long)]
    texture: Option<PathBuf>,
}

/// Load the render settings, or defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => RenderConfig::default(),
    };
    config.validate().context("invalid render config")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let (width, height) = (config.width, config.height);

    log::info!("Starting Ember: scene '{}'", args.scene);
    let scene = scenes::build(&args.scene, config, args.texture.as_deref())?;

    let start = Instant::now();
    let pixels = scene.render().context("render failed")?;
    log::info!("Rendered in {:.2?}", start.elapsed());

    image::save_buffer(&args.output, &pixels, width, height, image::ColorType::Rgb8)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}
