// src/target_tracker.rs
//
// Converts raw per-frame detections into a stable smoothed TargetState,
// tolerant of missed detections. A miss freezes the last state instead of
// clearing it, so a few dropped frames never reset the distance estimate.

use crate::smoother::{ema, ema_box, ema_point};
use crate::types::{BoundingBox, Detection, ObjectLabel, TargetState};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum detector score for a detection to qualify as the target
    pub confidence_threshold: f32,
    /// Real-world width of the target, in cm
    pub known_width_cm: f32,
    /// Pre-calibrated focal length, in pixels
    pub focal_length_px: f32,
    /// EMA weight for new observations
    pub ema_alpha: f32,
}

/// Outcome of one tracker update. `NoTarget` occurs only before the first
/// qualifying detection; once a state exists it is held through misses.
#[derive(Debug)]
pub enum TrackerUpdate<'a> {
    Tracked(&'a TargetState),
    NoTarget,
}

pub struct TargetTracker {
    config: TrackerConfig,
    state: Option<TargetState>,
}

impl TargetTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config, state: None }
    }

    pub fn state(&self) -> Option<&TargetState> {
        self.state.as_ref()
    }

    /// Ingest this frame's raw detections and update the smoothed state.
    pub fn update(&mut self, detections: &[Detection], frame_index: u64) -> TrackerUpdate<'_> {
        let raw_box = match self.select_detection(detections) {
            Some(det) => {
                debug!(
                    frame_index,
                    score = det.score,
                    "Target detected at ({:.1},{:.1})-({:.1},{:.1})",
                    det.bbox.x1,
                    det.bbox.y1,
                    det.bbox.x2,
                    det.bbox.y2
                );
                det.bbox
            }
            None => {
                // Freeze-on-miss: holding the prior state is exactly
                // smoothing the prior box against itself, minus the float
                // rounding. `last_seen_frame` keeps the frame the target was
                // actually observed on.
                return match self.state.as_ref() {
                    Some(state) => {
                        debug!(frame_index, "No qualifying detection, holding last state");
                        TrackerUpdate::Tracked(state)
                    }
                    None => {
                        debug!(frame_index, "No qualifying detection and no prior state");
                        TrackerUpdate::NoTarget
                    }
                };
            }
        };

        let alpha = self.config.ema_alpha;
        let prev = self.state.as_ref();

        let bbox = ema_box(raw_box, prev.map(|s| s.bbox), alpha);
        let center = ema_point(bbox.center(), prev.map(|s| s.center), alpha);
        let distance_cm = ema(
            self.monocular_distance(&bbox),
            prev.map(|s| s.distance_cm),
            alpha,
        );

        TrackerUpdate::Tracked(self.state.insert(TargetState {
            bbox,
            center,
            distance_cm,
            last_seen_frame: frame_index,
        }))
    }

    /// First detection in detector output order with the target label and a
    /// score above threshold; the output is not re-sorted.
    fn select_detection<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        detections
            .iter()
            .find(|d| d.label == ObjectLabel::Target && d.score > self.config.confidence_threshold)
    }

    /// Pinhole distance from apparent width. A zero-width box yields 0,
    /// meaning "unmeasurable", never a division fault.
    fn monocular_distance(&self, bbox: &BoundingBox) -> f32 {
        let pixel_width = bbox.width();
        if pixel_width > 0.0 {
            self.config.known_width_cm * self.config.focal_length_px / pixel_width
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrackerConfig {
        TrackerConfig {
            confidence_threshold: 0.7,
            known_width_cm: 15.0,
            focal_length_px: 600.0,
            ema_alpha: 0.3,
        }
    }

    fn det(bbox: BoundingBox, label: ObjectLabel, score: f32) -> Detection {
        Detection { bbox, label, score }
    }

    #[test]
    fn first_detection_reported_unsmoothed() {
        let mut tracker = TargetTracker::new(config());
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 220.0);
        match tracker.update(&[det(bbox, ObjectLabel::Target, 0.9)], 0) {
            TrackerUpdate::Tracked(state) => {
                assert_eq!(state.bbox, bbox);
                // 15 * 600 / 100 = 90.0, no prior so no smoothing
                assert!((state.distance_cm - 90.0).abs() < 1e-4);
                assert_eq!(state.last_seen_frame, 0);
            }
            TrackerUpdate::NoTarget => panic!("expected a tracked target"),
        }
    }

    #[test]
    fn no_detection_and_no_prior_reports_no_target() {
        let mut tracker = TargetTracker::new(config());
        assert!(matches!(tracker.update(&[], 0), TrackerUpdate::NoTarget));
        assert!(tracker.state().is_none());
    }

    #[test]
    fn below_threshold_and_wrong_label_do_not_qualify() {
        let mut tracker = TargetTracker::new(config());
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let detections = vec![
            det(bbox, ObjectLabel::Target, 0.5),
            det(bbox, ObjectLabel::Other, 0.99),
        ];
        assert!(matches!(
            tracker.update(&detections, 0),
            TrackerUpdate::NoTarget
        ));
    }

    #[test]
    fn picks_first_qualifying_in_detector_order() {
        let mut tracker = TargetTracker::new(config());
        let first = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
        let second = BoundingBox::new(300.0, 300.0, 400.0, 400.0);
        let detections = vec![
            det(first, ObjectLabel::Other, 0.95),
            det(first, ObjectLabel::Target, 0.75),
            det(second, ObjectLabel::Target, 0.99),
        ];
        match tracker.update(&detections, 0) {
            TrackerUpdate::Tracked(state) => assert_eq!(state.bbox, first),
            TrackerUpdate::NoTarget => panic!("expected a tracked target"),
        }
    }

    #[test]
    fn freeze_on_miss_holds_state_through_gap() {
        let mut tracker = TargetTracker::new(config());
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 220.0);
        tracker.update(&[det(bbox, ObjectLabel::Target, 0.9)], 1);
        let after_frame_1 = tracker.state().unwrap().clone();

        // Frames 2-4: nothing detected. State must hold, not clear or decay.
        for frame in 2..=4 {
            match tracker.update(&[], frame) {
                TrackerUpdate::Tracked(state) => {
                    assert_eq!(state.bbox, after_frame_1.bbox);
                    assert_eq!(state.center, after_frame_1.center);
                    assert_eq!(state.distance_cm, after_frame_1.distance_cm);
                    assert_eq!(state.last_seen_frame, 1);
                }
                TrackerUpdate::NoTarget => panic!("state must survive a miss"),
            }
        }

        // Frame 5: reacquired at a new position, smoothing resumes.
        let moved = BoundingBox::new(110.0, 100.0, 210.0, 220.0);
        match tracker.update(&[det(moved, ObjectLabel::Target, 0.9)], 5) {
            TrackerUpdate::Tracked(state) => {
                assert!(state.bbox.x1 > after_frame_1.bbox.x1);
                assert!(state.bbox.x1 < moved.x1);
                assert_eq!(state.last_seen_frame, 5);
            }
            TrackerUpdate::NoTarget => panic!("expected a tracked target"),
        }
    }

    #[test]
    fn zero_width_box_reports_zero_distance() {
        let mut tracker = TargetTracker::new(config());
        let degenerate = BoundingBox::new(50.0, 10.0, 50.0, 80.0);
        match tracker.update(&[det(degenerate, ObjectLabel::Target, 0.9)], 0) {
            TrackerUpdate::Tracked(state) => assert_eq!(state.distance_cm, 0.0),
            TrackerUpdate::NoTarget => panic!("expected a tracked target"),
        }
    }

    #[test]
    fn smoothing_blends_consecutive_boxes() {
        let mut tracker = TargetTracker::new(config());
        let a = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
        let b = BoundingBox::new(120.0, 100.0, 220.0, 200.0);
        tracker.update(&[det(a, ObjectLabel::Target, 0.9)], 0);
        tracker.update(&[det(b, ObjectLabel::Target, 0.9)], 1);
        let state = tracker.state().unwrap();
        // 0.3 * 120 + 0.7 * 100 = 106
        assert!((state.bbox.x1 - 106.0).abs() < 1e-4);
        assert!(state.bbox.is_valid());
    }
}
