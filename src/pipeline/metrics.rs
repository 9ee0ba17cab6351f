// src/pipeline/metrics.rs
//
// Observability for the frame loop: counts and stage timings, exported to
// the logs at shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_no_target: Arc<AtomicU64>,
    pub frames_target_held: Arc<AtomicU64>,
    pub depth_invocations: Arc<AtomicU64>,
    pub beacon_ranges_3d: Arc<AtomicU64>,
    pub detect_time_us: Arc<AtomicU64>,
    pub depth_time_us: Arc<AtomicU64>,
    pub fusion_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_no_target: Arc::new(AtomicU64::new(0)),
            frames_target_held: Arc::new(AtomicU64::new(0)),
            depth_invocations: Arc::new(AtomicU64::new(0)),
            beacon_ranges_3d: Arc::new(AtomicU64::new(0)),
            detect_time_us: Arc::new(AtomicU64::new(0)),
            depth_time_us: Arc::new(AtomicU64::new(0)),
            fusion_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        info!(
            total_frames = self.total_frames.load(Ordering::Relaxed),
            frames_no_target = self.frames_no_target.load(Ordering::Relaxed),
            frames_target_held = self.frames_target_held.load(Ordering::Relaxed),
            depth_invocations = self.depth_invocations.load(Ordering::Relaxed),
            beacon_ranges_3d = self.beacon_ranges_3d.load(Ordering::Relaxed),
            fps = format!("{:.1}", self.fps()),
            "Pipeline summary"
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
