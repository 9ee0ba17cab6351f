// src/adapters.rs
//
// Boundary traits for the external collaborators: frame acquisition, the
// box detector, the dense depth model, and the fiducial-marker detector.
// The core never sees model internals, only these contracts. Synthetic
// implementations below let the binary run end-to-end without a camera or
// any model weights.

use crate::types::{BoundingBox, Detection, Frame, MarkerDetection, ObjectLabel};
use anyhow::Result;
use ndarray::Array2;

pub trait FrameSource {
    /// Next frame at the working resolution, or `None` when the stream ends.
    /// A frame-acquisition error is the one condition that ends the run.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

pub trait TargetDetector {
    /// Candidate boxes in detector-native order; may be empty.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

pub trait DepthEstimator {
    /// Dense relative-depth map, same aspect ratio as the input frame.
    /// Values are unitless and comparable only within one map.
    fn estimate_depth(&mut self, frame: &Frame) -> Result<Array2<f32>>;
}

pub trait MarkerDetector {
    /// Detected fiducial markers this frame; may be empty.
    fn detect_markers(&mut self, frame: &Frame) -> Result<Vec<MarkerDetection>>;

    /// False when the underlying marker library is missing. The pipeline
    /// logs this once at startup and runs with empty marker lists.
    fn is_available(&self) -> bool {
        true
    }
}

/// Scripted frame source: black frames at the working resolution for a
/// fixed number of frames.
pub struct SyntheticFrames {
    width: usize,
    height: usize,
    remaining: u64,
    frame_index: u64,
}

impl SyntheticFrames {
    pub fn new(width: usize, height: usize, num_frames: u64) -> Self {
        Self {
            width,
            height,
            remaining: num_frames,
            frame_index: 0,
        }
    }
}

impl FrameSource for SyntheticFrames {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let frame = Frame {
            data: vec![0u8; self.width * self.height * 3],
            width: self.width,
            height: self.height,
            timestamp_ms: self.frame_index as f64 * 33.3,
        };
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// Scripted detector: a target drifting right a pixel per frame, with a
/// short dropout window to exercise the freeze-on-miss path, plus a
/// low-confidence distractor that must never be selected.
pub struct ScriptedTargetDetector {
    frame_index: u64,
    dropout: std::ops::Range<u64>,
}

impl ScriptedTargetDetector {
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            dropout: 20..24,
        }
    }
}

impl Default for ScriptedTargetDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetDetector for ScriptedTargetDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        let n = self.frame_index;
        self.frame_index += 1;

        let mut detections = vec![Detection {
            bbox: BoundingBox::new(5.0, 5.0, 25.0, 25.0),
            label: ObjectLabel::Other,
            score: 0.95,
        }];
        if !self.dropout.contains(&n) {
            let x = 100.0 + n as f32;
            detections.push(Detection {
                bbox: BoundingBox::new(x, 120.0, x + 100.0, 240.0),
                label: ObjectLabel::Target,
                score: 0.92,
            });
        }
        Ok(detections)
    }
}

/// Scripted depth model: a horizontal gradient, so regions at different x
/// positions read different relative depths.
pub struct SyntheticDepth;

impl DepthEstimator for SyntheticDepth {
    fn estimate_depth(&mut self, frame: &Frame) -> Result<Array2<f32>> {
        let w = frame.width;
        Ok(Array2::from_shape_fn((frame.height, w), |(_, x)| {
            0.3 + 0.4 * x as f32 / w.max(1) as f32
        }))
    }
}

/// Two fixed beacons, as a fiducial board in a static scene would produce.
pub struct FixedBeacons {
    available: bool,
}

impl FixedBeacons {
    pub fn new(available: bool) -> Self {
        Self { available }
    }
}

impl MarkerDetector for FixedBeacons {
    fn detect_markers(&mut self, _frame: &Frame) -> Result<Vec<MarkerDetection>> {
        if !self.available {
            return Ok(Vec::new());
        }
        Ok(vec![
            MarkerDetection {
                id: 1,
                bbox: BoundingBox::new(40.0, 200.0, 90.0, 250.0),
            },
            MarkerDetection {
                id: 2,
                bbox: BoundingBox::new(500.0, 180.0, 560.0, 240.0),
            },
        ])
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_frames_end_after_configured_count() {
        let mut source = SyntheticFrames::new(64, 48, 2);
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn scripted_detector_drops_target_in_dropout_window() {
        let mut detector = ScriptedTargetDetector::new();
        let frame = Frame {
            data: Vec::new(),
            width: 640,
            height: 480,
            timestamp_ms: 0.0,
        };
        for n in 0..30u64 {
            let detections = detector.detect(&frame).unwrap();
            let has_target = detections.iter().any(|d| d.label == ObjectLabel::Target);
            assert_eq!(has_target, !(20..24).contains(&n));
        }
    }

    #[test]
    fn unavailable_marker_detector_degrades_to_empty() {
        let mut markers = FixedBeacons::new(false);
        let frame = Frame {
            data: Vec::new(),
            width: 640,
            height: 480,
            timestamp_ms: 0.0,
        };
        assert!(!markers.is_available());
        assert!(markers.detect_markers(&frame).unwrap().is_empty());
    }
}
