//! Bilateral-weighted normalized cross-correlation.
//!
//! Window pixels are weighted by spatial distance to the center and by
//! intensity similarity to the reference center. The reference weights and
//! statistics do not depend on the hypothesis, so they are computed once at
//! construction; each evaluation only accumulates the target side, reusing
//! the reference weights.

use crate::bilateral::{BilateralPrecompute, BilateralTableCache, BilateralTables};
use crate::image::Image;
use crate::metric::{check_pair, CostMetric, BAD_COST};
use crate::params::{MetricKind, Parameters};
use crate::sample::{Tap, Window};
use crate::util::math::Homography;
use crate::util::CostResult;
use std::sync::Arc;

/// Bilateral-weighted NCC; cost is `1 - r` in `[0, 2]`.
pub struct BilateralNccMetric<'a> {
    reference: &'a Image,
    target: &'a Image,
    window: Window,
    tables: Arc<BilateralTables>,
    precompute: BilateralPrecompute,
    min_variance: f64,
}

impl<'a> BilateralNccMetric<'a> {
    /// Builds the metric and precomputes the reference statistics.
    pub fn new(
        reference: &'a Image,
        target: &'a Image,
        params: &'a Parameters,
        tables: &BilateralTableCache,
    ) -> CostResult<Self> {
        check_pair(MetricKind::BilateralNcc, reference, target, params)?;
        let window = Window::new(params.half_window, params.step);
        let tables = tables.tables_for(params);
        let precompute = BilateralPrecompute::compute(reference, &window, &tables);
        Ok(Self {
            reference,
            target,
            window,
            tables,
            precompute,
            min_variance: params.min_variance,
        })
    }

    /// Returns the shared weight tables.
    pub fn tables(&self) -> &Arc<BilateralTables> {
        &self.tables
    }

    /// Returns the reference statistics computed at construction.
    pub fn precompute(&self) -> &BilateralPrecompute {
        &self.precompute
    }
}

impl CostMetric for BilateralNccMetric<'_> {
    fn kind(&self) -> MetricKind {
        MetricKind::BilateralNcc
    }

    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64 {
        if col >= self.precompute.width() || row >= self.precompute.height() {
            return BAD_COST;
        }
        let inv = self.precompute.inv_sum_weights(col, row);
        if inv == 0.0 {
            return BAD_COST;
        }
        let var_r = self.precompute.variance(col, row);
        if var_r <= self.min_variance {
            return BAD_COST;
        }
        let mean_r = self.precompute.mean(col, row);

        let width = self.reference.width();
        let ref_plane = self.reference.intensity().as_slice();
        let tgt_plane = self.target.intensity().as_slice();
        let center = f64::from(ref_plane[row * width + col]);

        let mut sum_wt = 0.0f64;
        let mut sum_wtt = 0.0f64;
        let mut sum_wrt = 0.0f64;
        for &(dx, dy) in self.window.offsets() {
            let x = (col as isize + dx) as usize;
            let y = (row as isize + dy) as usize;
            let Some(tap) = Tap::warp_into(self.target, h, x as f64, y as f64) else {
                return BAD_COST;
            };
            let r = f64::from(ref_plane[y * width + x]);
            let w = self.tables.weight(dx, dy, r - center);
            let t = tap.sample(tgt_plane);
            sum_wt += w * t;
            sum_wtt += w * t * t;
            sum_wrt += w * r * t;
        }

        let mean_t = sum_wt * inv;
        let var_t = sum_wtt * inv - mean_t * mean_t;
        if var_t <= self.min_variance {
            return BAD_COST;
        }
        let cov = sum_wrt * inv - mean_r * mean_t;
        let r = cov / (var_r * var_t).sqrt();
        if !r.is_finite() {
            return BAD_COST;
        }
        1.0 - r.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::BilateralNccMetric;
    use crate::bilateral::BilateralTableCache;
    use crate::image::Image;
    use crate::metric::{CostMetric, BAD_COST};
    use crate::params::{MetricKind, Parameters};
    use crate::util::math::Homography;

    /// Smooth texture: neighbours stay within the color sigma.
    fn textured(width: usize, height: usize, seed: usize) -> Image {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 7 + y * 3 + (x * y + seed) % 5 * 2) as u8);
            }
        }
        Image::from_gray(data, width, height).unwrap()
    }

    fn flat(width: usize, height: usize, value: u8) -> Image {
        Image::from_gray(vec![value; width * height], width, height).unwrap()
    }

    #[test]
    fn flat_target_is_degenerate() {
        let tables = BilateralTableCache::new();
        let params = Parameters::for_metric(MetricKind::BilateralNcc);
        let reference = textured(16, 16, 7);
        let target = flat(16, 16, 90);
        let metric = BilateralNccMetric::new(&reference, &target, &params, &tables).unwrap();

        assert!(metric.precompute().variance(8, 8) > params.min_variance);
        assert_eq!(metric.evaluate(8, 8, &Homography::identity()), BAD_COST);
    }

    #[test]
    fn flat_reference_is_degenerate() {
        let tables = BilateralTableCache::new();
        let params = Parameters::for_metric(MetricKind::BilateralNcc);
        let reference = flat(16, 16, 90);
        let target = textured(16, 16, 7);
        let metric = BilateralNccMetric::new(&reference, &target, &params, &tables).unwrap();

        assert!(metric.precompute().inv_sum_weights(8, 8) > 0.0);
        assert!(metric.precompute().variance(8, 8) <= params.min_variance);
        assert_eq!(metric.evaluate(8, 8, &Homography::identity()), BAD_COST);
    }

    #[test]
    fn textured_pair_scores_below_sentinel() {
        let tables = BilateralTableCache::new();
        let params = Parameters::for_metric(MetricKind::BilateralNcc);
        let reference = textured(16, 16, 7);
        let target = textured(16, 16, 40);
        let metric = BilateralNccMetric::new(&reference, &target, &params, &tables).unwrap();

        let cost = metric.evaluate(8, 8, &Homography::identity());
        assert!((0.0..=2.0).contains(&cost), "cost {cost}");
    }
}
