use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub target: TargetConfig,
    pub beacon: BeaconConfig,
    pub depth: DepthConfig,
    pub tracking: TrackingConfig,
    pub demo: DemoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Pre-calibrated focal length in pixels: (pixel_width * distance) / real_width
    pub focal_length_px: f32,
    /// Working resolution frames are downscaled to before detection
    pub frame_width: usize,
    pub frame_height: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            focal_length_px: 600.0,
            frame_width: 640,
            frame_height: 480,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Real-world width of the tracked object, in cm
    pub known_width_cm: f32,
    /// Minimum detector score for a detection to qualify
    pub confidence_threshold: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            known_width_cm: 15.0,
            confidence_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Real-world width of a fiducial marker, in cm
    pub known_width_cm: f32,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            known_width_cm: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Depth is recomputed every `period` frames and stale in between
    pub period: u64,
    /// Empirical scale from relative-depth delta to cm (calibration knob)
    pub depth_to_distance_scale: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            period: 5,
            depth_to_distance_scale: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// EMA weight for new observations; smaller = smoother but more latent
    pub ema_alpha: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self { ema_alpha: 0.3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub num_frames: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { num_frames: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One decoded frame at the working resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box in frame-pixel coordinates, invariant `x1<=x2 && y1<=y2`.
/// Width and height are always derived so they cannot drift out of sync with
/// the corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point2D {
        Point2D {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLabel {
    Target,
    Other,
}

/// Raw detector output for one frame; never retained across frames.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: ObjectLabel,
    pub score: f32,
}

/// One fiducial marker seen this frame; no cross-frame identity continuity.
#[derive(Debug, Clone)]
pub struct MarkerDetection {
    pub id: u32,
    pub bbox: BoundingBox,
}

/// The system's only cross-frame memory (history depth = 1). Created on the
/// first qualifying detection and updated forever after; a missed detection
/// leaves it stale-but-valid rather than clearing it.
#[derive(Debug, Clone)]
pub struct TargetState {
    pub bbox: BoundingBox,
    pub center: Point2D,
    pub distance_cm: f32,
    pub last_seen_frame: u64,
}

/// Per-beacon output. `distance_3d_cm` is `None` on frames where the depth
/// map was not recomputed, so the list stays one entry per detected marker.
#[derive(Debug, Clone)]
pub struct BeaconRange {
    pub marker_id: u32,
    pub monocular_distance_cm: f32,
    pub distance_3d_cm: Option<f32>,
}

/// Recomputed every frame; never persisted.
#[derive(Debug, Clone)]
pub struct FusionResult {
    pub target_distance_cm: f32,
    pub beacons: Vec<BeaconRange>,
}
