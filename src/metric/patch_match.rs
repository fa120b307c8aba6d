//! Robust cost for the inner loop of PatchMatch search.
//!
//! Both windows are z-normalized (mean removed, divided by their standard
//! deviation). Each window pixel contributes a residual mixing intensity and
//! gradient differences, each truncated so occluded or outlier pixels cannot
//! dominate:
//!
//! `rho = (1 - alpha) * min(0.5 * (z_r - z_t)^2, tau_i) + alpha * min(|grad z_r - grad z_t|_1, tau_g)`
//!
//! Residuals are averaged with adaptive-support weights that favour pixels
//! whose reference color resembles the window center. With `alpha = 0` and
//! no truncation the cost reduces to the NCC cost `1 - r`.

use crate::image::Image;
use crate::metric::{check_pair, CostMetric, BAD_COST};
use crate::params::{MetricKind, Parameters};
use crate::sample::{Tap, Window};
use crate::util::math::Homography;
use crate::util::CostResult;
use std::cell::RefCell;

/// Truncated, weighted z-score residual; lower is better.
pub struct PatchMatchMetric<'a> {
    reference: &'a Image,
    target: &'a Image,
    window: Window,
    params: &'a Parameters,
}

impl<'a> PatchMatchMetric<'a> {
    /// Builds the metric; both images must carry color and gradient planes.
    pub fn new(reference: &'a Image, target: &'a Image, params: &'a Parameters) -> CostResult<Self> {
        check_pair(MetricKind::PatchMatch, reference, target, params)?;
        Ok(Self {
            reference,
            target,
            window: Window::new(params.half_window, params.step),
            params,
        })
    }

    fn support_weight(&self, color: &[u8], center: usize, idx: usize) -> f64 {
        let mut diff = 0.0f64;
        for c in 0..3 {
            diff += (f64::from(color[idx * 3 + c]) - f64::from(color[center * 3 + c])).abs();
        }
        (-diff / (3.0 * self.params.gamma)).exp()
    }
}

impl CostMetric for PatchMatchMetric<'_> {
    fn kind(&self) -> MetricKind {
        MetricKind::PatchMatch
    }

    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64 {
        thread_local! {
            static TAPS: RefCell<Vec<(Tap, f64)>> = const { RefCell::new(Vec::new()) };
        }
        TAPS.with(|taps| self.evaluate_with(row, col, h, &mut taps.borrow_mut()))
    }
}

impl PatchMatchMetric<'_> {
    /// Scores one hypothesis; `taps` is scratch space reused across calls.
    fn evaluate_with(
        &self,
        row: usize,
        col: usize,
        h: &Homography,
        taps: &mut Vec<(Tap, f64)>,
    ) -> f64 {
        if !self.window.usable_in(self.reference, col, row) {
            return BAD_COST;
        }
        let (Some(ref_grad), Some(tgt_grad), Some(ref_color)) = (
            self.reference.gradient(),
            self.target.gradient(),
            self.reference.color(),
        ) else {
            return BAD_COST;
        };
        let width = self.reference.width();
        let ref_plane = self.reference.intensity().as_slice();
        let tgt_plane = self.target.intensity().as_slice();
        let n = self.window.len() as f64;

        // First pass: warp once, keep the taps, gather z-normalization stats.
        taps.clear();
        let mut sum_r = 0.0f64;
        let mut sum_t = 0.0f64;
        let mut sum_rr = 0.0f64;
        let mut sum_tt = 0.0f64;
        for &(dx, dy) in self.window.offsets() {
            let x = (col as isize + dx) as usize;
            let y = (row as isize + dy) as usize;
            let Some(tap) = Tap::warp_into(self.target, h, x as f64, y as f64) else {
                return BAD_COST;
            };
            let r = f64::from(ref_plane[y * width + x]);
            let t = tap.sample(tgt_plane);
            taps.push((tap, t));
            sum_r += r;
            sum_t += t;
            sum_rr += r * r;
            sum_tt += t * t;
        }
        let mean_r = sum_r / n;
        let mean_t = sum_t / n;
        let var_r = sum_rr / n - mean_r * mean_r;
        let var_t = sum_tt / n - mean_t * mean_t;
        if var_r <= self.params.min_variance || var_t <= self.params.min_variance {
            return BAD_COST;
        }
        let inv_std_r = 1.0 / var_r.sqrt();
        let inv_std_t = 1.0 / var_t.sqrt();

        let (ref_gx, ref_gy) = (ref_grad.gx().as_slice(), ref_grad.gy().as_slice());
        let (tgt_gx, tgt_gy) = (tgt_grad.gx().as_slice(), tgt_grad.gy().as_slice());
        let alpha = self.params.alpha;
        let center = row * width + col;

        let mut sum_w = 0.0f64;
        let mut sum_cost = 0.0f64;
        for (&(dx, dy), &(tap, t)) in self.window.offsets().iter().zip(taps.iter()) {
            let x = (col as isize + dx) as usize;
            let y = (row as isize + dy) as usize;
            let idx = y * width + x;

            let z_r = (f64::from(ref_plane[idx]) - mean_r) * inv_std_r;
            let z_t = (t - mean_t) * inv_std_t;
            let d_int = 0.5 * (z_r - z_t) * (z_r - z_t);

            let d_grad = (f64::from(ref_gx[idx]) * inv_std_r - tap.sample(tgt_gx) * inv_std_t)
                .abs()
                + (f64::from(ref_gy[idx]) * inv_std_r - tap.sample(tgt_gy) * inv_std_t).abs();

            let rho = (1.0 - alpha) * d_int.min(self.params.tau_intensity)
                + alpha * d_grad.min(self.params.tau_gradient);
            let w = self.support_weight(ref_color, center, idx);
            sum_w += w;
            sum_cost += w * rho;
        }

        let cost = sum_cost / sum_w;
        if cost.is_finite() {
            cost
        } else {
            BAD_COST
        }
    }
}
