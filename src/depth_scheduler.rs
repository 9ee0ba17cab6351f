// src/depth_scheduler.rs
//
// Rate-limits the expensive dense-depth pass. The estimator runs on a fixed
// frame period; every other frame gets an explicitly invalid sample so
// consumers must branch on validity instead of silently reading a stale map.

use crate::adapters::DepthEstimator;
use crate::types::{BoundingBox, Frame};
use ndarray::Array2;
use tracing::{debug, warn};

/// Dense relative-depth map. Values are unitless; only differences within
/// one map are meaningful.
#[derive(Debug, Clone)]
pub struct DepthMap {
    values: Array2<f32>,
}

impl DepthMap {
    pub fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Nearest-neighbour resize. The depth model and the detector may run at
    /// different working resolutions, so the map must be brought to frame
    /// size before boxes in frame coordinates can crop it.
    pub fn resized(&self, width: usize, height: usize) -> DepthMap {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        let src = &self.values;
        let (src_h, src_w) = (self.height(), self.width());
        let values = Array2::from_shape_fn((height, width), |(y, x)| {
            let sy = (y * src_h / height.max(1)).min(src_h.saturating_sub(1));
            let sx = (x * src_w / width.max(1)).min(src_w.saturating_sub(1));
            src[[sy, sx]]
        });
        DepthMap { values }
    }

    /// Mean depth over a bounding-box crop, clamped to map bounds.
    /// Returns `None` when the clamped crop is empty.
    pub fn mean_over(&self, bbox: &BoundingBox) -> Option<f32> {
        let x1 = (bbox.x1.max(0.0) as usize).min(self.width());
        let y1 = (bbox.y1.max(0.0) as usize).min(self.height());
        let x2 = (bbox.x2.max(0.0) as usize).min(self.width());
        let y2 = (bbox.y2.max(0.0) as usize).min(self.height());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        let crop = self.values.slice(ndarray::s![y1..y2, x1..x2]);
        Some(crop.sum() / crop.len() as f32)
    }
}

/// What the scheduler hands fusion each frame. `map` is present only when
/// `valid` is true, which happens only on frames where the estimator
/// actually ran.
pub struct DepthSample<'a> {
    pub map: Option<&'a DepthMap>,
    pub frame_index: u64,
    pub valid: bool,
}

struct DepthCache {
    map: DepthMap,
    frame_index: u64,
}

pub struct DepthScheduler {
    period: u64,
    cache: Option<DepthCache>,
    invocations: u64,
}

impl DepthScheduler {
    pub fn new(period: u64) -> Self {
        Self {
            // A zero period would divide by zero; treat it as every frame.
            period: period.max(1),
            cache: None,
            invocations: 0,
        }
    }

    /// Decide whether this frame gets a fresh depth map and return the
    /// tagged sample. Estimator failure leaves the cache untouched and the
    /// sample invalid; the pipeline carries on without depth that frame.
    pub fn update(
        &mut self,
        estimator: &mut dyn DepthEstimator,
        frame: &Frame,
        frame_index: u64,
    ) -> DepthSample<'_> {
        if frame_index % self.period != 0 {
            return DepthSample {
                map: None,
                frame_index,
                valid: false,
            };
        }

        match estimator.estimate_depth(frame) {
            Ok(values) => {
                debug!(frame_index, "Depth map recomputed");
                self.invocations += 1;
                self.cache = Some(DepthCache {
                    map: DepthMap::new(values),
                    frame_index,
                });
                DepthSample {
                    map: self.cache.as_ref().map(|c| &c.map),
                    frame_index,
                    valid: true,
                }
            }
            Err(err) => {
                warn!(frame_index, "Depth estimation failed: {:#}", err);
                DepthSample {
                    map: None,
                    frame_index,
                    valid: false,
                }
            }
        }
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn last_computed_frame(&self) -> Option<u64> {
        self.cache.as_ref().map(|c| c.frame_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ndarray::Array2;

    struct ConstantDepth(f32);

    impl DepthEstimator for ConstantDepth {
        fn estimate_depth(&mut self, frame: &Frame) -> Result<Array2<f32>> {
            Ok(Array2::from_elem((frame.height, frame.width), self.0))
        }
    }

    struct FailingDepth;

    impl DepthEstimator for FailingDepth {
        fn estimate_depth(&mut self, _frame: &Frame) -> Result<Array2<f32>> {
            anyhow::bail!("model not loaded")
        }
    }

    fn frame() -> Frame {
        Frame {
            data: Vec::new(),
            width: 8,
            height: 6,
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn valid_exactly_on_period_multiples() {
        for period in [1u64, 2, 5, 7] {
            let mut scheduler = DepthScheduler::new(period);
            let mut estimator = ConstantDepth(0.5);
            for frame_index in 0..20 {
                let sample = scheduler.update(&mut estimator, &frame(), frame_index);
                assert_eq!(sample.valid, frame_index % period == 0);
                assert_eq!(sample.map.is_some(), sample.valid);
                assert_eq!(sample.frame_index, frame_index);
            }
        }
    }

    #[test]
    fn previous_map_is_not_reused_between_periods() {
        let mut scheduler = DepthScheduler::new(5);
        let mut estimator = ConstantDepth(0.4);
        let sample = scheduler.update(&mut estimator, &frame(), 5);
        assert!(sample.valid);
        // Frame 6: a map exists in the cache but the sample must be invalid.
        let sample = scheduler.update(&mut estimator, &frame(), 6);
        assert!(!sample.valid);
        assert!(sample.map.is_none());
        assert_eq!(scheduler.last_computed_frame(), Some(5));
    }

    #[test]
    fn estimator_failure_leaves_cache_untouched() {
        let mut scheduler = DepthScheduler::new(5);
        let mut good = ConstantDepth(0.4);
        scheduler.update(&mut good, &frame(), 0);

        let mut bad = FailingDepth;
        let sample = scheduler.update(&mut bad, &frame(), 5);
        assert!(!sample.valid);
        assert_eq!(scheduler.last_computed_frame(), Some(0));
        assert_eq!(scheduler.invocations(), 1);
    }

    #[test]
    fn mean_over_crop_and_clamping() {
        let mut values = Array2::zeros((4, 4));
        values[[1, 1]] = 1.0;
        values[[1, 2]] = 3.0;
        let map = DepthMap::new(values);

        let crop = BoundingBox::new(1.0, 1.0, 3.0, 2.0);
        assert!((map.mean_over(&crop).unwrap() - 2.0).abs() < 1e-6);

        // Out-of-bounds box clamps to nothing.
        let outside = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        assert!(map.mean_over(&outside).is_none());

        // Degenerate box yields no mean.
        let empty = BoundingBox::new(1.0, 1.0, 1.0, 3.0);
        assert!(map.mean_over(&empty).is_none());
    }

    #[test]
    fn resize_preserves_constant_maps() {
        let map = DepthMap::new(Array2::from_elem((3, 4), 0.7));
        let resized = map.resized(8, 6);
        assert_eq!(resized.width(), 8);
        assert_eq!(resized.height(), 6);
        let whole = BoundingBox::new(0.0, 0.0, 8.0, 6.0);
        assert!((resized.mean_over(&whole).unwrap() - 0.7).abs() < 1e-6);
    }
}
