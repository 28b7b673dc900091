mod app;
mod cli;
mod settings;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vsearch_experiment::results::export_path;
use vsearch_experiment::{write_config, ExperimentSettings, ExperimentStateMachine};
use vsearch_render::SkiaRenderer;
use vsearch_timing::HighPrecisionTimer;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = settings::AppConfig::load_or_default(&args.config)?.apply_args(&args);
    let out_dir = cfg.output.dir.clone();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    if args.nogui {
        return run_headless(cfg.experiment, &out_dir);
    }

    App::new(cfg.experiment, out_dir)?.run()
}

/// One stimulus straight to disk, for checking a configuration without a display
fn run_headless(settings: ExperimentSettings, out_dir: &Path) -> Result<()> {
    let canvas = settings.trial.canvas_size;
    let mut machine = ExperimentStateMachine::new(settings, HighPrecisionTimer::new(), rand::rng());
    let preview = machine
        .generate_preview()
        .context("preview refused outside idle")?;
    info!(
        glyphs = preview.len(),
        targets = preview.targets().count(),
        "stimulus generated"
    );

    let mut renderer = SkiaRenderer::new(canvas)?;
    renderer.render(&machine.render_request())?;
    let png = export_path(out_dir, "visual-search-stimulus", "png");
    renderer.save_png(&png)?;
    info!(path = %png.display(), "snapshot written");

    write_config(out_dir, &machine.settings().trial)?;
    Ok(())
}
