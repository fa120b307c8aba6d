//! Mathematical helpers for homography warps and weighting kernels.

use nalgebra::{Matrix3, Vector3};

/// 3x3 projective transform from reference pixels to target pixels.
///
/// Points are homogeneous `(x, y, 1)` with `x` the column and `y` the row.
pub type Homography = Matrix3<f64>;

const EPS: f64 = 1e-12;

/// Maps `(x, y)` through `h`, returning `None` for points sent to infinity.
#[inline]
pub(crate) fn warp_point(h: &Homography, x: f64, y: f64) -> Option<(f64, f64)> {
    let v = h * Vector3::new(x, y, 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS {
        return None;
    }
    let u = v[0] / w;
    let t = v[1] / w;
    if !u.is_finite() || !t.is_finite() {
        return None;
    }
    Some((u, t))
}

/// Unnormalized Gaussian `exp(-d2 / (2 sigma^2))` evaluated on a squared distance.
#[inline]
pub(crate) fn gaussian_sq(d2: f64, sigma: f64) -> f64 {
    (-d2 / (2.0 * sigma * sigma)).exp()
}

/// Normalized 1D Gaussian kernel with radius `ceil(3 sigma)`.
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let mut sum = 0.0f32;
    for i in 0..=2 * radius {
        let d = i as f32 - radius as f32;
        let v = (-(d * d) / (2.0 * sigma * sigma)).exp();
        kernel.push(v);
        sum += v;
    }
    for v in kernel.iter_mut() {
        *v /= sum;
    }
    kernel
}
