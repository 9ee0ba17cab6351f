// src/smoother.rs

use crate::types::{BoundingBox, Point2D};

/// Exponential moving average over a scalar.
///
/// With no prior value the new observation passes through unsmoothed, so the
/// first detection is reported exactly as seen. Otherwise blends
/// `alpha * new + (1 - alpha) * prev`; smaller alpha is smoother but lags
/// more behind the observations.
pub fn ema(new_value: f32, previous: Option<f32>, alpha: f32) -> f32 {
    match previous {
        None => new_value,
        Some(prev) => alpha * new_value + (1.0 - alpha) * prev,
    }
}

/// Element-wise EMA over a 2-D point.
pub fn ema_point(new_value: Point2D, previous: Option<Point2D>, alpha: f32) -> Point2D {
    match previous {
        None => new_value,
        Some(prev) => Point2D {
            x: ema(new_value.x, Some(prev.x), alpha),
            y: ema(new_value.y, Some(prev.y), alpha),
        },
    }
}

/// Corner-by-corner EMA over a bounding box. Blending each corner
/// independently keeps `x1<=x2 && y1<=y2` whenever both inputs satisfy it,
/// which an unconstrained vector blend would not guarantee.
pub fn ema_box(new_value: BoundingBox, previous: Option<BoundingBox>, alpha: f32) -> BoundingBox {
    match previous {
        None => new_value,
        Some(prev) => BoundingBox {
            x1: ema(new_value.x1, Some(prev.x1), alpha),
            y1: ema(new_value.y1, Some(prev.y1), alpha),
            x2: ema(new_value.x2, Some(prev.x2), alpha),
            y2: ema(new_value.y2, Some(prev.y2), alpha),
        },
    }
}
