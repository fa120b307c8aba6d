//! Image views and multi-representation images.
//!
//! `ImageView` is a borrowed row-major plane; every plane an `Image` owns is
//! contiguous, so rows start at multiples of the width.
//!
//! `Image` owns the intensity plane plus the optional auxiliary planes a cost
//! metric may need (color, gradient, region-of-interest mask). Each image is
//! tagged with an [`ImageId`] handed out at construction; caches key on that
//! identity and never on pixel content.

use crate::load_type::{LoadType, Representation};
use crate::trace::trace_event;
use crate::util::{CostError, CostResult};
use std::sync::atomic::{AtomicU64, Ordering};

mod gradient;
#[cfg(feature = "image-io")]
pub mod io;

pub use gradient::Gradient;

/// Borrowed contiguous plane of `width * height` samples.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Wraps `data`, which must hold exactly `width * height` samples.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> CostResult<Self> {
        let needed = pixel_count(width, height)?;
        if data.len() != needed {
            return Err(CostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self::plane(data, width, height))
    }

    /// Wraps a plane whose length the owner has already checked.
    pub(crate) fn plane(data: &'a [T], width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the samples in row-major order.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Returns row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }
}

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an [`Image`], stable for the lifetime of the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Owned image with an intensity plane and optional auxiliary planes.
///
/// `Image` is deliberately not `Clone`: a copy would share pixels but not
/// identity, which is what descriptor caches key on.
pub struct Image {
    id: ImageId,
    width: usize,
    height: usize,
    intensity: Vec<u8>,
    color: Option<Vec<u8>>,
    gradient: Option<Gradient>,
    mask: Option<Vec<u8>>,
}

impl Image {
    /// Creates a grayscale image from a contiguous buffer.
    pub fn from_gray(data: Vec<u8>, width: usize, height: usize) -> CostResult<Self> {
        let needed = pixel_count(width, height)?;
        if data.len() != needed {
            return Err(CostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            id: ImageId::next(),
            width,
            height,
            intensity: data,
            color: None,
            gradient: None,
            mask: None,
        })
    }

    /// Creates an image from interleaved RGB data, deriving the intensity plane.
    pub fn from_rgb(rgb: Vec<u8>, width: usize, height: usize) -> CostResult<Self> {
        let count = pixel_count(width, height)?;
        let needed = count * 3;
        if rgb.len() != needed {
            return Err(CostError::BufferTooSmall {
                needed,
                got: rgb.len(),
            });
        }
        let intensity = rgb.chunks_exact(3).map(luma).collect();
        Ok(Self {
            id: ImageId::next(),
            width,
            height,
            intensity,
            color: Some(rgb),
            gradient: None,
            mask: None,
        })
    }

    /// Attaches a region-of-interest mask; nonzero entries are usable pixels.
    pub fn with_mask(mut self, mask: Vec<u8>) -> CostResult<Self> {
        let expected = self.width * self.height;
        if mask.len() != expected {
            return Err(CostError::MaskMismatch {
                expected,
                got: mask.len(),
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    /// Builds every representation requested by `load` that is not present yet.
    ///
    /// A grayscale image asked for color gets gray replicated into RGB.
    pub fn prepare(&mut self, load: LoadType) {
        if load.contains(Representation::Color) && self.color.is_none() {
            let mut rgb = Vec::with_capacity(self.intensity.len() * 3);
            for &v in &self.intensity {
                rgb.extend_from_slice(&[v, v, v]);
            }
            self.color = Some(rgb);
        }
        if load.contains(Representation::Gradient) && self.gradient.is_none() {
            self.gradient = Some(Gradient::central(self.intensity()));
        }
        trace_event!("image_prepared", id = self.id.get(), bits = load.bits());
    }

    /// Returns the first representation in `load` this image does not carry.
    pub fn missing(&self, load: LoadType) -> Option<Representation> {
        load.iter().find(|&rep| !self.has(rep))
    }

    /// Returns true if the representation is available.
    pub fn has(&self, rep: Representation) -> bool {
        match rep {
            Representation::Intensity => true,
            Representation::Color => self.color.is_some(),
            Representation::Gradient => self.gradient.is_some(),
        }
    }

    /// Returns the identity used by caches.
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a view of the intensity plane.
    pub fn intensity(&self) -> ImageView<'_, u8> {
        ImageView::plane(&self.intensity, self.width, self.height)
    }

    /// Returns the interleaved RGB plane if present.
    pub fn color(&self) -> Option<&[u8]> {
        self.color.as_deref()
    }

    /// Returns the gradient planes if present.
    pub fn gradient(&self) -> Option<&Gradient> {
        self.gradient.as_ref()
    }

    /// Returns the mask if present.
    pub fn mask(&self) -> Option<&[u8]> {
        self.mask.as_deref()
    }

    /// Returns true if `(x, y)` is inside the image and not masked out.
    #[inline]
    pub fn is_usable(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        match &self.mask {
            Some(mask) => mask[y * self.width + x] != 0,
            None => true,
        }
    }
}

fn pixel_count(width: usize, height: usize) -> CostResult<usize> {
    if width == 0 || height == 0 {
        return Err(CostError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(CostError::InvalidDimensions { width, height })
}

fn luma(px: &[u8]) -> u8 {
    let v = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
    v.round().clamp(0.0, 255.0) as u8
}
