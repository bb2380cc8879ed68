#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a level and builds the scene a camera sees.

mod config;
mod headless;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use level_scene_rendering::{
    project_annotations, Camera, RenderingBackend, SceneBuffers, SceneQuery, ScreenAnnotation,
};
use level_scene_world::{query, Level};
use log::info;
use serde::Serialize;

use crate::{config::SceneManifest, headless::HeadlessBackend};

/// Loads a level and reports the scene visible from a camera.
#[derive(Debug, Parser)]
#[command(name = "level-scene", author, version, about, long_about = None)]
struct CliArgs {
    /// Scene configuration file.
    #[arg(long, default_value = "assets/demo/scene.toml")]
    config: PathBuf,

    /// Horizontal camera position; defaults to the first object of the level.
    #[arg(long, allow_negative_numbers = true)]
    camera_x: Option<f32>,

    /// Vertical camera position; defaults to the first object of the level.
    #[arg(long, allow_negative_numbers = true)]
    camera_y: Option<f32>,

    /// Camera zoom factor, clamped to 0.01..=5.
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    /// Writes the frame buffers as JSON to this file.
    #[arg(long)]
    dump: Option<PathBuf>,
}

#[derive(Serialize)]
struct FrameDump<'a> {
    camera: [f32; 3],
    buffers: &'a SceneBuffers,
    annotations: &'a [ScreenAnnotation],
}

/// Entry point for the level scene command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = CliArgs::parse();
    run(&args)
}

fn run(args: &CliArgs) -> Result<()> {
    let manifest = SceneManifest::from_path(&args.config)?;
    let assets = manifest.load_assets()?;

    let mut level = Level::from_text(
        &assets.level_text,
        &assets.catalog,
        &assets.definitions,
        manifest.load_options,
    )
    .with_context(|| format!("failed to load level {}", manifest.level.display()))?;
    for annotation in &manifest.annotations {
        level.annotate(annotation.x, annotation.y, annotation.text.as_str());
    }

    let diagnostics = query::diagnostics(&level).len();
    if diagnostics > 0 {
        info!("level loaded with {diagnostics} diagnostics");
    }

    let origin = query::objects(&level)
        .first()
        .map_or((0.0, 0.0), |object| (object.placed.x, object.placed.y));
    let mut camera = Camera::new(
        args.camera_x.unwrap_or(origin.0),
        args.camera_y.unwrap_or(origin.1),
        args.zoom,
    );

    let mut scene = SceneQuery::new(manifest.scene);
    let buffers = scene.build(&camera, &level);
    let annotations = project_annotations(&camera, &level, manifest.scene.viewport);

    let mut backend = HeadlessBackend::new(io::stdout().lock());
    backend.present(buffers, &annotations)?;

    if let Some(path) = &args.dump {
        let dump = FrameDump {
            camera: [camera.x(), camera.y(), camera.zoom()],
            buffers,
            annotations: &annotations,
        };
        let file = File::create(path)
            .with_context(|| format!("failed to create dump file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &dump)
            .with_context(|| format!("failed to write dump file {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush dump file {}", path.display()))?;
        info!("wrote frame dump to {}", path.display());
    }

    camera.acknowledge();
    Ok(())
}
