//! Dense cost maps: one evaluation per reference pixel.
//!
//! The parallel variant (feature `rayon`) splits work by rows. Evaluations
//! are independent, so both variants produce identical maps. The parallel
//! variant warms the metric first so lazily built state is ready before any
//! worker runs.

use crate::metric::{CostMetric, BAD_COST};
use crate::trace::{trace_event, trace_span};
use crate::util::math::Homography;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Costs of every pixel of a `width x height` grid, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMap {
    width: usize,
    height: usize,
    costs: Vec<f64>,
}

/// Summary of the valid entries of a [`CostMap`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostStats {
    /// Number of pixels with a cost below [`BAD_COST`].
    pub valid: usize,
    /// Smallest valid cost.
    pub min: f64,
    /// Largest valid cost.
    pub max: f64,
    /// Mean valid cost.
    pub mean: f64,
}

impl CostMap {
    /// Returns the grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cost at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.costs.get(y * self.width + x).copied()
    }

    /// Returns all costs in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.costs
    }

    /// Returns statistics over the valid costs, or `None` if there are none.
    pub fn stats(&self) -> Option<CostStats> {
        let mut valid = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &c in self.costs.iter().filter(|&&c| c < BAD_COST) {
            valid += 1;
            min = min.min(c);
            max = max.max(c);
            sum += c;
        }
        if valid == 0 {
            return None;
        }
        Some(CostStats {
            valid,
            min,
            max,
            mean: sum / valid as f64,
        })
    }
}

fn eval_row<M, F>(metric: &M, width: usize, y: usize, homography_at: &F, out: &mut [f64])
where
    M: CostMetric + ?Sized,
    F: Fn(usize, usize) -> Homography,
{
    for (x, slot) in out.iter_mut().enumerate().take(width) {
        *slot = metric.evaluate(y, x, &homography_at(y, x));
    }
}

/// Evaluates `metric` at every pixel, sequentially.
///
/// `homography_at(row, col)` supplies the hypothesis for each pixel.
pub fn compute_cost_map<M, F>(metric: &M, width: usize, height: usize, homography_at: F) -> CostMap
where
    M: CostMetric + ?Sized,
    F: Fn(usize, usize) -> Homography,
{
    let _span = trace_span!("cost_map", width = width, height = height).entered();
    let mut costs = vec![BAD_COST; width * height];
    if width > 0 {
        for (y, row) in costs.chunks_mut(width).enumerate() {
            eval_row(metric, width, y, &homography_at, row);
        }
    }
    trace_event!("cost_map_done", pixels = width * height);
    CostMap {
        width,
        height,
        costs,
    }
}

/// Evaluates `metric` at every pixel with rows spread over the rayon pool.
#[cfg(feature = "rayon")]
pub fn compute_cost_map_par<M, F>(
    metric: &M,
    width: usize,
    height: usize,
    homography_at: F,
) -> CostMap
where
    M: CostMetric + ?Sized,
    F: Fn(usize, usize) -> Homography + Sync,
{
    let _span = trace_span!("cost_map_par", width = width, height = height).entered();
    // Lazy setup may itself use rayon; keep it out of the row jobs.
    metric.warm();
    let mut costs = vec![BAD_COST; width * height];
    if width > 0 {
        costs
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| eval_row(metric, width, y, &homography_at, row));
    }
    CostMap {
        width,
        height,
        costs,
    }
}
