// src/main.rs

mod adapters;
mod config;
mod depth_scheduler;
mod fusion;
mod pipeline;
mod smoother;
mod target_tracker;
mod types;

use adapters::{FixedBeacons, ScriptedTargetDetector, SyntheticDepth, SyntheticFrames};
use anyhow::Result;
use pipeline::PipelineOrchestrator;
use tracing::info;
use types::Config;

fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "beacon_range={}",
                    config.logging.level
                ))
            }),
        )
        .init();

    info!("Beacon ranging pipeline starting");
    info!(
        focal_px = config.camera.focal_length_px,
        depth_period = config.depth.period,
        alpha = config.tracking.ema_alpha,
        "Calibration loaded"
    );

    // Synthetic scene stands in for camera + models; swap in real adapters
    // behind the same traits for a live run.
    let mut source = SyntheticFrames::new(
        config.camera.frame_width,
        config.camera.frame_height,
        config.demo.num_frames,
    );
    let mut orchestrator = PipelineOrchestrator::new(
        &config,
        Box::new(ScriptedTargetDetector::new()),
        Box::new(SyntheticDepth),
        Box::new(FixedBeacons::new(true)),
    );

    orchestrator.run(&mut source)
}
