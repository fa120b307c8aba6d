//! DAISY-style dense descriptor.
//!
//! Gradients are projected onto `orientations` directions (negative parts
//! clipped), giving one orientation map per direction. Each map is blurred
//! with one Gaussian per ring. A pixel's descriptor concatenates the
//! orientation histogram at the pixel (smallest blur) with the histograms
//! sampled at `ring_points` points on each ring, the blur growing with the
//! ring radius. Every histogram is L2-normalized.

use crate::descriptor::{DescriptorExtractor, DescriptorVolume};
use crate::image::{Gradient, Image};
use crate::util::math::gaussian_kernel;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Sampling layout of the descriptor.
#[derive(Clone, Debug)]
pub struct DaisyConfig {
    /// Radius of the outermost ring in pixels.
    pub radius: f32,
    /// Number of rings.
    pub rings: usize,
    /// Sample points per ring.
    pub ring_points: usize,
    /// Histogram bins (gradient orientations).
    pub orientations: usize,
}

impl Default for DaisyConfig {
    fn default() -> Self {
        Self {
            radius: 8.0,
            rings: 2,
            ring_points: 8,
            orientations: 8,
        }
    }
}

impl DaisyConfig {
    /// Returns the descriptor length `(1 + rings * ring_points) * orientations`.
    pub fn dimension(&self) -> usize {
        (1 + self.rings * self.ring_points) * self.orientations
    }

    fn ring_sigma(&self, ring: usize) -> f32 {
        self.radius * (ring + 1) as f32 / (2 * self.rings) as f32
    }

    fn ring_offsets(&self, ring: usize) -> Vec<(isize, isize)> {
        let r = self.radius * (ring + 1) as f32 / self.rings as f32;
        (0..self.ring_points)
            .map(|j| {
                let theta = std::f32::consts::TAU * j as f32 / self.ring_points as f32;
                (
                    (r * theta.cos()).round() as isize,
                    (r * theta.sin()).round() as isize,
                )
            })
            .collect()
    }
}

/// DAISY-style extractor.
#[derive(Clone, Debug, Default)]
pub struct Daisy {
    cfg: DaisyConfig,
}

impl Daisy {
    /// Creates an extractor with a custom layout.
    pub fn new(cfg: DaisyConfig) -> Self {
        Self { cfg }
    }

    /// Returns the layout.
    pub fn config(&self) -> &DaisyConfig {
        &self.cfg
    }
}

impl DescriptorExtractor for Daisy {
    fn dimension(&self) -> usize {
        self.cfg.dimension()
    }

    fn compute(&self, image: &Image) -> DescriptorVolume {
        let width = image.width();
        let height = image.height();
        let cfg = &self.cfg;
        let bins = cfg.orientations.max(1);
        let dim = cfg.dimension();

        let owned;
        let grad = match image.gradient() {
            Some(grad) => grad,
            None => {
                owned = Gradient::central(image.intensity());
                &owned
            }
        };

        let layers = orientation_layers(grad, bins);
        // levels[ring][bin] holds the blurred orientation map.
        let levels: Vec<Vec<Vec<f32>>> = (0..cfg.rings.max(1))
            .map(|ring| {
                let kernel = gaussian_kernel(cfg.ring_sigma(ring));
                layers
                    .iter()
                    .map(|layer| blur(layer, width, height, &kernel))
                    .collect()
            })
            .collect();
        let rings: Vec<Vec<(isize, isize)>> =
            (0..cfg.rings).map(|ring| cfg.ring_offsets(ring)).collect();

        let fill_row = |y: usize, out: &mut [f32]| {
            for x in 0..width {
                let desc = &mut out[x * dim..(x + 1) * dim];
                write_histogram(&levels[0], width, x, y, &mut desc[..bins]);
                let mut cursor = bins;
                for (ring, offsets) in rings.iter().enumerate() {
                    for &(dx, dy) in offsets {
                        let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                        let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
                        write_histogram(
                            &levels[ring],
                            width,
                            sx,
                            sy,
                            &mut desc[cursor..cursor + bins],
                        );
                        cursor += bins;
                    }
                }
            }
        };

        let mut data = vec![0.0f32; width * height * dim];
        #[cfg(feature = "rayon")]
        data.par_chunks_mut(width * dim)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));
        #[cfg(not(feature = "rayon"))]
        data.chunks_mut(width * dim)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));

        DescriptorVolume {
            width,
            height,
            dim,
            data,
        }
    }
}

fn orientation_layers(grad: &Gradient, bins: usize) -> Vec<Vec<f32>> {
    let gx = grad.gx().as_slice();
    let gy = grad.gy().as_slice();
    (0..bins)
        .map(|o| {
            let theta = std::f32::consts::TAU * o as f32 / bins as f32;
            let (s, c) = theta.sin_cos();
            gx.iter()
                .zip(gy)
                .map(|(&x, &y)| (x * c + y * s).max(0.0))
                .collect()
        })
        .collect()
}

fn write_histogram(level: &[Vec<f32>], width: usize, x: usize, y: usize, out: &mut [f32]) {
    let idx = y * width + x;
    let mut norm = 0.0f32;
    for (bin, layer) in out.iter_mut().zip(level) {
        *bin = layer[idx];
        norm += *bin * *bin;
    }
    if norm > 1e-12 {
        let inv = 1.0 / norm.sqrt();
        for bin in out.iter_mut() {
            *bin *= inv;
        }
    }
}

/// Separable convolution with border clamping.
fn blur(src: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as isize;
    let mut tmp = vec![0.0f32; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - radius).clamp(0, width as isize - 1);
                acc += w * row[sx as usize];
            }
            tmp[y * width + x] = acc;
        }
    }
    let mut out = vec![0.0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - radius).clamp(0, height as isize - 1);
                acc += w * tmp[sy as usize * width + x];
            }
            out[y * width + x] = acc;
        }
    }
    out
}
