use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lux_renderer::{ProgressiveRenderer, Renderer};

mod config;
mod demo;

use config::FileConfig;

/// Progressive path tracer
#[derive(Parser, Debug)]
#[command(name = "lux", author, version, about = "Render the demo room to a PNG")]
struct Cli {
    /// Output image path
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Image width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Wavefront OBJ mesh to stand in the room
    #[arg(long, value_name = "PATH")]
    obj: Option<PathBuf>,

    /// JSON settings file (trace, render, progressive, octree sections)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    log::info!("Starting lux {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.render.seed = seed;
    }
    if let Some(threads) = cli.threads {
        config.render.threads = threads;
    }

    let mesh = cli
        .obj
        .as_ref()
        .map(|path| lux_core::load_obj(path).with_context(|| format!("Failed to load {}", path.display())))
        .transpose()?;

    let mut scene = demo::cornell_box(cli.width, cli.height, mesh, &config.octree)?
        .with_settings(config.trace);
    scene.prepare();

    let renderer = Renderer::new(config.render.clone())?;
    let mut result = renderer.create_result(cli.width, cli.height);

    let bar = ProgressBar::new(1000);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg} [{wide_bar:.cyan/blue}] {percent}%")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let summary = ProgressiveRenderer::new(&renderer, config.progressive.clone()).run(
        &scene,
        &mut result,
        |progress| {
            bar.set_message(format!("pass {}/{}", progress.pass + 1, progress.passes));
            bar.set_position((progress.fraction * 1000.0) as u64);
        },
    )?;
    bar.finish_and_clear();

    log::info!(
        "{} passes, {} samples in {:.2?} (noisy pixels per refinement: {:?})",
        summary.passes,
        summary.samples,
        start.elapsed(),
        summary.noisy_pixels
    );

    result
        .to_image()
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    log::info!("Wrote {}", cli.output.display());

    Ok(())
}
