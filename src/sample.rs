//! Pixel sampling under a homography warp.
//!
//! A [`Window`] enumerates the integer offsets of a matching window around a
//! reference pixel. Each offset is warped into the target image and resolved
//! into a [`Tap`]: the four bilinear neighbours and their weights. A tap only
//! exists when all four neighbours are inside the target image and not
//! masked out, so metrics can treat a missing tap as "use the bad cost".

use crate::image::Image;
use crate::util::math::{warp_point, Homography};

/// Integer offsets `(dx, dy)` of a matching window, center included.
#[derive(Clone, Debug)]
pub struct Window {
    half: usize,
    offsets: Vec<(isize, isize)>,
    center: usize,
}

impl Window {
    /// Builds offsets `k * step` with `|k * step| <= half` along each axis.
    pub fn new(half: usize, step: usize) -> Self {
        let step = step.max(1);
        let reach = (half / step) as isize;
        let step = step as isize;
        let mut offsets = Vec::with_capacity(((2 * reach + 1) * (2 * reach + 1)) as usize);
        let mut center = 0;
        for ky in -reach..=reach {
            for kx in -reach..=reach {
                if kx == 0 && ky == 0 {
                    center = offsets.len();
                }
                offsets.push((kx * step, ky * step));
            }
        }
        Self {
            half,
            offsets,
            center,
        }
    }

    /// Returns the window half-size in pixels.
    pub fn half(&self) -> usize {
        self.half
    }

    /// Returns all offsets in row-major order.
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// Returns the number of samples in the window.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if the window has no samples.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the index of the `(0, 0)` offset.
    pub fn center_index(&self) -> usize {
        self.center
    }

    /// Returns true if the window centered at `(x, y)` lies inside `width x height`.
    #[inline]
    pub fn fits(&self, x: usize, y: usize, width: usize, height: usize) -> bool {
        x >= self.half && y >= self.half && x + self.half < width && y + self.half < height
    }

    /// Returns true if the window fits and every reference pixel is unmasked.
    pub(crate) fn usable_in(&self, image: &Image, x: usize, y: usize) -> bool {
        if !self.fits(x, y, image.width(), image.height()) {
            return false;
        }
        if image.mask().is_none() {
            return true;
        }
        self.offsets.iter().all(|&(dx, dy)| {
            image.is_usable((x as isize + dx) as usize, (y as isize + dy) as usize)
        })
    }
}

/// Bilinear interpolation taps into a contiguous plane.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tap {
    idx: [usize; 4],
    w: [f64; 4],
}

impl Tap {
    /// Resolves `(x, y)` into taps if it lies in `[0, w-1] x [0, h-1]`.
    #[inline]
    pub(crate) fn locate(width: usize, height: usize, x: f64, y: f64) -> Option<Self> {
        let max_x = (width - 1) as f64;
        let max_y = (height - 1) as f64;
        if !(x >= 0.0 && y >= 0.0 && x <= max_x && y <= max_y) {
            return None;
        }
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;
        Some(Self {
            idx: [
                y0 * width + x0,
                y0 * width + x1,
                y1 * width + x0,
                y1 * width + x1,
            ],
            w: [
                (1.0 - fx) * (1.0 - fy),
                fx * (1.0 - fy),
                (1.0 - fx) * fy,
                fx * fy,
            ],
        })
    }

    /// Resolves `(x, y)` in `image`, rejecting masked neighbours that carry weight.
    #[inline]
    pub(crate) fn locate_in(image: &Image, x: f64, y: f64) -> Option<Self> {
        let tap = Self::locate(image.width(), image.height(), x, y)?;
        if let Some(mask) = image.mask() {
            if tap
                .idx
                .iter()
                .zip(tap.w)
                .any(|(&i, w)| w > 0.0 && mask[i] == 0)
            {
                return None;
            }
        }
        Some(tap)
    }

    /// Warps reference pixel `(x, y)` and resolves it in `target`.
    #[inline]
    pub(crate) fn warp_into(target: &Image, h: &Homography, x: f64, y: f64) -> Option<Self> {
        let (u, v) = warp_point(h, x, y)?;
        Self::locate_in(target, u, v)
    }

    /// Interpolates a single-channel contiguous plane.
    #[inline]
    pub(crate) fn sample<T: Copy + Into<f64>>(&self, plane: &[T]) -> f64 {
        let mut acc = 0.0;
        for k in 0..4 {
            acc += self.w[k] * plane[self.idx[k]].into();
        }
        acc
    }

    /// Returns the pixel indices and weights of the four neighbours.
    #[inline]
    pub(crate) fn parts(&self) -> ([usize; 4], [f64; 4]) {
        (self.idx, self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::{Tap, Window};
    use crate::image::Image;

    #[test]
    fn window_includes_center_with_step() {
        let win = Window::new(3, 2);
        assert_eq!(win.len(), 9);
        assert_eq!(win.offsets()[win.center_index()], (0, 0));
        assert!(win.offsets().contains(&(-2, 2)));
        assert!(!win.offsets().iter().any(|&(dx, _)| dx.abs() > 3));
    }

    #[test]
    fn window_fit_respects_borders() {
        let win = Window::new(2, 1);
        assert!(win.fits(2, 2, 5, 5));
        assert!(!win.fits(1, 2, 5, 5));
        assert!(!win.fits(3, 2, 5, 5));
    }

    #[test]
    fn taps_interpolate_inside_closed_bounds() {
        let plane = [0u8, 10, 20, 30];
        let mid = Tap::locate(2, 2, 0.5, 0.5).unwrap();
        assert!((mid.sample(&plane) - 15.0).abs() < 1e-12);
        let corner = Tap::locate(2, 2, 1.0, 1.0).unwrap();
        assert_eq!(corner.sample(&plane), 30.0);
        assert!(Tap::locate(2, 2, 1.01, 0.0).is_none());
        assert!(Tap::locate(2, 2, -0.01, 0.0).is_none());
    }

    #[test]
    fn masked_taps_are_rejected() {
        let img = Image::from_gray(vec![5; 9], 3, 3)
            .unwrap()
            .with_mask(vec![1, 1, 1, 1, 0, 1, 1, 1, 1])
            .unwrap();
        assert!(Tap::locate_in(&img, 0.0, 0.0).is_some());
        assert!(Tap::locate_in(&img, 0.5, 0.5).is_none());
        let tap = Tap::locate_in(&img, 2.0, 0.0).unwrap();
        assert_eq!(tap.sample(&[1u8, 2, 3, 4, 5, 6, 7, 8, 9]), 3.0);
    }
}
