// src/fusion.rs
//
// Combines smoothed target state, this frame's beacon detections, and the
// depth sample into per-beacon distances. The 2-D monocular estimate is
// always produced; the 3-D estimate additionally needs a valid depth map
// and is absent (None) on every frame where depth was not recomputed.

use crate::depth_scheduler::{DepthMap, DepthSample};
use crate::types::{BeaconRange, FusionResult, MarkerDetection, TargetState};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Real-world width of a fiducial marker, in cm
    pub beacon_width_cm: f32,
    /// Pre-calibrated focal length, in pixels
    pub focal_length_px: f32,
    /// Empirical scale from relative-depth delta to cm
    pub depth_to_distance_scale: f32,
    /// Working frame size the depth map is resized to before cropping
    pub frame_width: usize,
    pub frame_height: usize,
}

pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn compute(
        &self,
        target: &TargetState,
        markers: &[MarkerDetection],
        depth: &DepthSample<'_>,
    ) -> FusionResult {
        // Depth model and detector run at different resolutions; bring the
        // map to frame coordinates once per frame, not once per beacon.
        let frame_depth = match (depth.valid, depth.map) {
            (true, Some(map)) => {
                Some(map.resized(self.config.frame_width, self.config.frame_height))
            }
            _ => None,
        };
        let depth_target = frame_depth
            .as_ref()
            .and_then(|map| map.mean_over(&target.bbox));

        let beacons = markers
            .iter()
            .map(|marker| {
                let monocular = self.monocular_distance(marker.bbox.width());
                let distance_3d = match (&frame_depth, depth_target) {
                    (Some(map), Some(depth_target)) => {
                        self.distance_3d(target, marker, map, depth_target)
                    }
                    _ => None,
                };
                BeaconRange {
                    marker_id: marker.id,
                    monocular_distance_cm: monocular,
                    distance_3d_cm: distance_3d,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            beacons = beacons.len(),
            ranged = beacons.iter().filter(|b| b.distance_3d_cm.is_some()).count(),
            "Fusion complete"
        );

        FusionResult {
            target_distance_cm: target.distance_cm,
            beacons,
        }
    }

    /// Pinhole distance from apparent marker width; 0 for a degenerate box.
    /// Needs no target state and no depth map.
    fn monocular_distance(&self, pixel_width: f32) -> f32 {
        if pixel_width > 0.0 {
            self.config.beacon_width_cm * self.config.focal_length_px / pixel_width
        } else {
            0.0
        }
    }

    fn distance_3d(
        &self,
        target: &TargetState,
        marker: &MarkerDetection,
        frame_depth: &DepthMap,
        depth_target: f32,
    ) -> Option<f32> {
        let depth_beacon = frame_depth.mean_over(&marker.bbox)?;

        // Lateral offsets in cm, using the target's monocular distance to
        // convert pixels at the target's depth plane.
        let scale_cm_per_px = target.distance_cm / self.config.focal_length_px;
        let beacon_center = marker.bbox.center();
        let dx = (target.center.x - beacon_center.x).abs() * scale_cm_per_px;
        let dy = (target.center.y - beacon_center.y).abs() * scale_cm_per_px;
        let dz = (depth_target - depth_beacon).abs() * self.config.depth_to_distance_scale;

        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }
}
