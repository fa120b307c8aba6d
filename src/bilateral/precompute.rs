//! Per-pixel bilateral statistics of the reference image.

use crate::bilateral::BilateralTables;
use crate::image::Image;
use crate::sample::Window;
use crate::trace::trace_span;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[derive(Clone, Copy, Default)]
struct PixelStats {
    inv_sum_weights: f64,
    mean: f64,
    variance: f64,
}

/// Bilateral-weighted window statistics for every reference pixel.
///
/// Arrays share the reference image layout. Pixels whose window leaves the
/// image or touches a masked pixel store an inverse weight sum of zero.
pub struct BilateralPrecompute {
    width: usize,
    height: usize,
    inv_sum_weights: Vec<f64>,
    mean: Vec<f64>,
    variance: Vec<f64>,
}

impl BilateralPrecompute {
    /// Computes the statistics of every window of `reference`.
    pub fn compute(reference: &Image, window: &Window, tables: &BilateralTables) -> Self {
        let width = reference.width();
        let height = reference.height();
        let _span = trace_span!("bilateral_precompute", width = width, height = height).entered();
        let plane = reference.intensity().as_slice();

        let row_stats = |y: usize| -> Vec<PixelStats> {
            (0..width)
                .map(|x| {
                    if !window.usable_in(reference, x, y) {
                        return PixelStats::default();
                    }
                    let center = f64::from(plane[y * width + x]);
                    let mut sum_w = 0.0f64;
                    let mut sum_wi = 0.0f64;
                    let mut sum_wii = 0.0f64;
                    for &(dx, dy) in window.offsets() {
                        let px = (x as isize + dx) as usize;
                        let py = (y as isize + dy) as usize;
                        let v = f64::from(plane[py * width + px]);
                        let w = tables.weight(dx, dy, v - center);
                        sum_w += w;
                        sum_wi += w * v;
                        sum_wii += w * v * v;
                    }
                    let inv = 1.0 / sum_w;
                    let mean = sum_wi * inv;
                    PixelStats {
                        inv_sum_weights: inv,
                        mean,
                        variance: sum_wii * inv - mean * mean,
                    }
                })
                .collect()
        };

        #[cfg(feature = "rayon")]
        let rows: Vec<Vec<PixelStats>> = (0..height).into_par_iter().map(row_stats).collect();
        #[cfg(not(feature = "rayon"))]
        let rows: Vec<Vec<PixelStats>> = (0..height).map(row_stats).collect();

        let count = width * height;
        let mut inv_sum_weights = Vec::with_capacity(count);
        let mut mean = Vec::with_capacity(count);
        let mut variance = Vec::with_capacity(count);
        for stats in rows.into_iter().flatten() {
            inv_sum_weights.push(stats.inv_sum_weights);
            mean.push(stats.mean);
            variance.push(stats.variance);
        }

        Self {
            width,
            height,
            inv_sum_weights,
            mean,
            variance,
        }
    }

    /// Returns the width of the statistics grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the statistics grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `1 / sum(weights)` at `(x, y)`; zero marks an unusable window.
    #[inline]
    pub fn inv_sum_weights(&self, x: usize, y: usize) -> f64 {
        self.inv_sum_weights[y * self.width + x]
    }

    /// Returns the weighted mean intensity at `(x, y)`.
    #[inline]
    pub fn mean(&self, x: usize, y: usize) -> f64 {
        self.mean[y * self.width + x]
    }

    /// Returns the weighted variance at `(x, y)`.
    #[inline]
    pub fn variance(&self, x: usize, y: usize) -> f64 {
        self.variance[y * self.width + x]
    }
}
