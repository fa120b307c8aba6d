//! Zero-mean normalized cross-correlation.

use crate::image::Image;
use crate::metric::{check_pair, CostMetric, BAD_COST};
use crate::params::{MetricKind, Parameters};
use crate::sample::{Tap, Window};
use crate::util::math::Homography;
use crate::util::CostResult;

/// ZNCC over a square window; cost is `1 - r` in `[0, 2]`.
pub struct NccMetric<'a> {
    reference: &'a Image,
    target: &'a Image,
    window: Window,
    min_variance: f64,
}

impl<'a> NccMetric<'a> {
    /// Builds the metric for one image pair.
    pub fn new(reference: &'a Image, target: &'a Image, params: &'a Parameters) -> CostResult<Self> {
        check_pair(MetricKind::Ncc, reference, target, params)?;
        Ok(Self {
            reference,
            target,
            window: Window::new(params.half_window, params.step),
            min_variance: params.min_variance,
        })
    }

    /// Returns the correlation coefficient, or `None` if it is undefined.
    pub fn correlation(&self, row: usize, col: usize, h: &Homography) -> Option<f64> {
        if !self.window.usable_in(self.reference, col, row) {
            return None;
        }
        let width = self.reference.width();
        let ref_plane = self.reference.intensity().as_slice();
        let tgt_plane = self.target.intensity().as_slice();

        let mut sum_r = 0.0f64;
        let mut sum_t = 0.0f64;
        let mut sum_rr = 0.0f64;
        let mut sum_tt = 0.0f64;
        let mut sum_rt = 0.0f64;

        for &(dx, dy) in self.window.offsets() {
            let x = (col as isize + dx) as usize;
            let y = (row as isize + dy) as usize;
            let tap = Tap::warp_into(self.target, h, x as f64, y as f64)?;
            let r = f64::from(ref_plane[y * width + x]);
            let t = tap.sample(tgt_plane);
            sum_r += r;
            sum_t += t;
            sum_rr += r * r;
            sum_tt += t * t;
            sum_rt += r * t;
        }

        let n = self.window.len() as f64;
        let var_r = sum_rr - sum_r * sum_r / n;
        let var_t = sum_tt - sum_t * sum_t / n;
        if var_r / n <= self.min_variance || var_t / n <= self.min_variance {
            return None;
        }
        let cov = sum_rt - sum_r * sum_t / n;
        let r = cov / (var_r * var_t).sqrt();
        if !r.is_finite() {
            return None;
        }
        Some(r.clamp(-1.0, 1.0))
    }
}

impl CostMetric for NccMetric<'_> {
    fn kind(&self) -> MetricKind {
        MetricKind::Ncc
    }

    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64 {
        match self.correlation(row, col, h) {
            Some(r) => 1.0 - r,
            None => BAD_COST,
        }
    }
}
