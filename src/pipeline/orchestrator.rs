// src/pipeline/orchestrator.rs
//
// Per-frame driver. Stage order is fixed: detect target and markers, depth
// decision, tracker update, fusion, hand-off. An adapter failure on one
// frame degrades to "nothing seen" for that stage and leaves the cross-frame
// state untouched; nothing in the frame path is fatal.

use crate::adapters::{DepthEstimator, FrameSource, MarkerDetector, TargetDetector};
use crate::depth_scheduler::DepthScheduler;
use crate::fusion::{FusionConfig, FusionEngine};
use crate::pipeline::frame_context::{FrameContext, TrackerContext};
use crate::pipeline::metrics::PipelineMetrics;
use crate::target_tracker::{TargetTracker, TrackerConfig, TrackerUpdate};
use crate::types::{Config, Frame};
use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct PipelineOrchestrator {
    detector: Box<dyn TargetDetector>,
    depth_estimator: Box<dyn DepthEstimator>,
    marker_detector: Box<dyn MarkerDetector>,
    fusion: FusionEngine,
    context: TrackerContext,
    metrics: PipelineMetrics,
}

impl PipelineOrchestrator {
    pub fn new(
        config: &Config,
        detector: Box<dyn TargetDetector>,
        depth_estimator: Box<dyn DepthEstimator>,
        marker_detector: Box<dyn MarkerDetector>,
    ) -> Self {
        if !marker_detector.is_available() {
            warn!("Marker detector unavailable; running without beacon data");
        }

        let tracker = TargetTracker::new(TrackerConfig {
            confidence_threshold: config.target.confidence_threshold,
            known_width_cm: config.target.known_width_cm,
            focal_length_px: config.camera.focal_length_px,
            ema_alpha: config.tracking.ema_alpha,
        });
        let depth = DepthScheduler::new(config.depth.period);
        let fusion = FusionEngine::new(FusionConfig {
            beacon_width_cm: config.beacon.known_width_cm,
            focal_length_px: config.camera.focal_length_px,
            depth_to_distance_scale: config.depth.depth_to_distance_scale,
            frame_width: config.camera.frame_width,
            frame_height: config.camera.frame_height,
        });

        Self {
            detector,
            depth_estimator,
            marker_detector,
            fusion,
            context: TrackerContext::new(tracker, depth),
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Drive the pipeline until the frame source runs dry. Only a
    /// frame-acquisition error terminates the loop.
    pub fn run(&mut self, source: &mut dyn FrameSource) -> Result<()> {
        info!("Pipeline started");
        while let Some(frame) = source.next_frame()? {
            let ctx = self.process_frame(&frame);
            self.render(&ctx);
        }
        self.metrics.log_summary();
        info!("Frame source exhausted, pipeline stopped");
        Ok(())
    }

    /// Process one frame in strict stage order and return everything
    /// produced on it. The frame counter increments unconditionally at the
    /// end, so the depth duty cycle stays locked to frame rate even on
    /// frames with no target.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameContext {
        let frame_id = self.context.frame_index;
        let mut ctx = FrameContext::new(frame_id, frame.timestamp_ms);

        let started = Instant::now();
        ctx.detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(err) => {
                warn!(frame_id, "Target detection failed: {:#}", err);
                Vec::new()
            }
        };
        ctx.markers = match self.marker_detector.detect_markers(frame) {
            Ok(markers) => markers,
            Err(err) => {
                warn!(frame_id, "Marker detection failed: {:#}", err);
                Vec::new()
            }
        };
        self.metrics.set_timing(
            &self.metrics.detect_time_us,
            started.elapsed().as_micros() as u64,
        );

        let depth_started = Instant::now();
        let depth_sample =
            self.context
                .depth
                .update(self.depth_estimator.as_mut(), frame, frame_id);
        if depth_sample.valid {
            self.metrics.inc(&self.metrics.depth_invocations);
        }
        self.metrics.set_timing(
            &self.metrics.depth_time_us,
            depth_started.elapsed().as_micros() as u64,
        );
        ctx.depth_valid = depth_sample.valid;

        let fusion_started = Instant::now();
        match self.context.tracker.update(&ctx.detections, frame_id) {
            TrackerUpdate::Tracked(state) => {
                if state.last_seen_frame != frame_id {
                    self.metrics.inc(&self.metrics.frames_target_held);
                }
                let result = self.fusion.compute(state, &ctx.markers, &depth_sample);
                self.metrics.add(
                    &self.metrics.beacon_ranges_3d,
                    result
                        .beacons
                        .iter()
                        .filter(|b| b.distance_3d_cm.is_some())
                        .count() as u64,
                );
                ctx.target = Some(state.clone());
                ctx.fusion = Some(result);
            }
            TrackerUpdate::NoTarget => {
                self.metrics.inc(&self.metrics.frames_no_target);
                debug!(frame_id, "No target this frame, fusion skipped");
            }
        }
        self.metrics.set_timing(
            &self.metrics.fusion_time_us,
            fusion_started.elapsed().as_micros() as u64,
        );

        self.metrics.inc(&self.metrics.total_frames);
        self.context.frame_index += 1;
        ctx
    }

    /// Hand-off to the (external) renderer: this build just logs what an
    /// overlay would draw.
    fn render(&self, ctx: &FrameContext) {
        match &ctx.fusion {
            Some(result) => {
                for beacon in &result.beacons {
                    match beacon.distance_3d_cm {
                        Some(d3) => debug!(
                            frame_id = ctx.frame_id,
                            marker_id = beacon.marker_id,
                            "Beacon at {:.1} cm (2-D), {:.1} cm (3-D)",
                            beacon.monocular_distance_cm,
                            d3
                        ),
                        None => debug!(
                            frame_id = ctx.frame_id,
                            marker_id = beacon.marker_id,
                            "Beacon at {:.1} cm (2-D), depth stale",
                            beacon.monocular_distance_cm
                        ),
                    }
                }
                info!(
                    frame_id = ctx.frame_id,
                    beacons = result.beacons.len(),
                    "Target at {:.1} cm",
                    result.target_distance_cm
                );
            }
            None => info!(frame_id = ctx.frame_id, "No target"),
        }
    }
}
