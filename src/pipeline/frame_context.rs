// src/pipeline/frame_context.rs
//
// Single source of truth for everything produced on a given frame. Every
// stage writes into the same context instead of consumers reading stale
// cached values from each other.

use crate::depth_scheduler::DepthScheduler;
use crate::target_tracker::TargetTracker;
use crate::types::{Detection, FusionResult, MarkerDetection, TargetState};

#[derive(Debug)]
pub struct FrameContext {
    pub frame_id: u64,
    pub timestamp_ms: f64,

    /// Raw detector output, detector-native order
    pub detections: Vec<Detection>,
    /// Fiducial markers seen this frame
    pub markers: Vec<MarkerDetection>,
    /// Whether the depth map was recomputed on this frame
    pub depth_valid: bool,
    /// Smoothed state after this frame's tracker update, if any target has
    /// ever been acquired
    pub target: Option<TargetState>,
    /// Absent on frames where no target has ever been acquired
    pub fusion: Option<FusionResult>,
}

impl FrameContext {
    pub fn new(frame_id: u64, timestamp_ms: f64) -> Self {
        Self {
            frame_id,
            timestamp_ms,
            detections: Vec::new(),
            markers: Vec::new(),
            depth_valid: false,
            target: None,
            fusion: None,
        }
    }

    /// True once a target has ever been acquired, even if this frame missed.
    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

/// The cross-frame mutable state, gathered in one place: the smoothed target
/// state, the depth cache, and the frame counter. Owned by the driver's
/// single update path per frame, so no locking is needed as long as frames
/// are processed strictly in order.
pub struct TrackerContext {
    pub tracker: TargetTracker,
    pub depth: DepthScheduler,
    pub frame_index: u64,
}

impl TrackerContext {
    pub fn new(tracker: TargetTracker, depth: DepthScheduler) -> Self {
        Self {
            tracker,
            depth,
            frame_index: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Point2D};

    #[test]
    fn context_starts_empty() {
        let ctx = FrameContext::new(3, 99.9);
        assert_eq!(ctx.frame_id, 3);
        assert!(!ctx.has_target());
        assert!(ctx.detections.is_empty());
        assert!(ctx.markers.is_empty());
        assert!(!ctx.depth_valid);
    }

    #[test]
    fn has_target_reflects_state() {
        let mut ctx = FrameContext::new(0, 0.0);
        ctx.target = Some(TargetState {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            center: Point2D { x: 5.0, y: 5.0 },
            distance_cm: 90.0,
            last_seen_frame: 0,
        });
        assert!(ctx.has_target());
    }
}
