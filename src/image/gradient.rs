//! Intensity gradients by central differences with border clamping.

use crate::image::ImageView;

/// Per-pixel horizontal and vertical intensity derivatives.
#[derive(Clone, Debug)]
pub struct Gradient {
    width: usize,
    height: usize,
    gx: Vec<f32>,
    gy: Vec<f32>,
}

impl Gradient {
    /// Computes `gx = (I(x+1) - I(x-1)) / 2` and the analogous `gy`.
    pub fn central(img: ImageView<'_, u8>) -> Self {
        let width = img.width();
        let height = img.height();
        let mut gx = vec![0.0f32; width * height];
        let mut gy = vec![0.0f32; width * height];
        let at = |x: usize, y: usize| -> f32 {
            img.get(x, y).copied().map(f32::from).unwrap_or(0.0)
        };

        for y in 0..height {
            let ym = y.saturating_sub(1);
            let yp = (y + 1).min(height - 1);
            for x in 0..width {
                let xm = x.saturating_sub(1);
                let xp = (x + 1).min(width - 1);
                let idx = y * width + x;
                gx[idx] = 0.5 * (at(xp, y) - at(xm, y));
                gy[idx] = 0.5 * (at(x, yp) - at(x, ym));
            }
        }

        Self {
            width,
            height,
            gx,
            gy,
        }
    }

    /// Returns a view of the horizontal derivative.
    pub fn gx(&self) -> ImageView<'_, f32> {
        ImageView::plane(&self.gx, self.width, self.height)
    }

    /// Returns a view of the vertical derivative.
    pub fn gy(&self) -> ImageView<'_, f32> {
        ImageView::plane(&self.gy, self.width, self.height)
    }
}
