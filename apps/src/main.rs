//! Headless orbit renderer
//!
//! Loads a mesh or point cloud, frames it and writes one PNG per degree of
//! a camera orbit around it.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use viscrate_gpu::WgpuEngine;
use viscrate_visualization::{load_geometry, render_geometry};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Some(model) = cli.model.clone() else {
        log::warn!("usage: viscrate-headless <model_path> [ibl_basename]");
        std::process::exit(-1);
    };

    let Some(geometry) = load_geometry(&model) else {
        log::error!("could not load {}", model.display());
        std::process::exit(-1);
    };

    let config = cli.config(model);
    let mut engine = WgpuEngine::new().context("failed to initialize the rendering engine")?;

    let summary = render_geometry(&mut engine, &geometry, &config).context("headless render failed")?;
    log::info!(
        "wrote {} of {} frames to {}",
        summary.saved,
        config.frames,
        config.output_dir.display()
    );
    Ok(())
}
