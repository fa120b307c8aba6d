//! Dense per-pixel descriptors and their shared cache.
//!
//! Descriptor volumes are the largest per-image buffers in a depth-map run,
//! so they are computed at most once per image and shared by every metric
//! that references the image. The cache keys on [`ImageId`], hands out
//! `Arc`s to published volumes, and is emptied explicitly with
//! [`DescriptorCache::release`] once the run no longer needs them.

mod daisy;
pub(crate) mod distance;

pub use daisy::{Daisy, DaisyConfig};

use crate::image::{Image, ImageId};
use crate::trace::{trace_debug, trace_event, trace_span};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// One descriptor vector per pixel, stored row-major.
pub struct DescriptorVolume {
    width: usize,
    height: usize,
    dim: usize,
    data: Vec<f32>,
}

impl DescriptorVolume {
    /// Wraps a row-major buffer of `width * height * dim` values.
    ///
    /// Returns `None` if the buffer length does not match.
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize, dim: usize) -> Option<Self> {
        if dim == 0 || data.len() != width.checked_mul(height)?.checked_mul(dim)? {
            return None;
        }
        Some(Self {
            width,
            height,
            dim,
            data,
        })
    }

    /// Returns the volume width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the volume height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the descriptor length.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the descriptor at `(x, y)`.
    pub fn descriptor(&self, x: usize, y: usize) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.dim;
        self.data.get(start..start + self.dim)
    }

    /// Returns the full buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Computes a dense descriptor volume for an image.
pub trait DescriptorExtractor: Send + Sync {
    /// Returns the length of each descriptor vector.
    fn dimension(&self) -> usize;

    /// Computes descriptors for every pixel of `image`.
    fn compute(&self, image: &Image) -> DescriptorVolume;
}

type Slot = Arc<OnceLock<Arc<DescriptorVolume>>>;

/// Compute-once cache of descriptor volumes keyed by image identity.
pub struct DescriptorCache {
    extractor: Arc<dyn DescriptorExtractor>,
    slots: Mutex<HashMap<ImageId, Slot>>,
    computed: AtomicUsize,
}

impl DescriptorCache {
    /// Creates an empty cache backed by `extractor`.
    pub fn new(extractor: Arc<dyn DescriptorExtractor>) -> Self {
        Self {
            extractor,
            slots: Mutex::new(HashMap::new()),
            computed: AtomicUsize::new(0),
        }
    }

    /// Returns the volume for `image`, computing it if no one has yet.
    ///
    /// Concurrent callers for the same image wait on a single computation;
    /// the map lock is not held while computing.
    pub fn get_or_compute(&self, image: &Image) -> Arc<DescriptorVolume> {
        let id = image.id();
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(id).or_default())
        };
        if let Some(volume) = slot.get() {
            trace_debug!("descriptor_cache_hit", id = id.get());
            return Arc::clone(volume);
        }
        let volume = slot.get_or_init(|| {
            let _span = trace_span!(
                "descriptor_compute",
                id = id.get(),
                dim = self.extractor.dimension()
            )
            .entered();
            self.computed.fetch_add(1, Ordering::Relaxed);
            Arc::new(self.extractor.compute(image))
        });
        Arc::clone(volume)
    }

    /// Returns the published volume for `id`, if any.
    pub fn get(&self, id: ImageId) -> Option<Arc<DescriptorVolume>> {
        let slots = self.slots.lock();
        slots.get(&id).and_then(|slot| slot.get().cloned())
    }

    /// Returns the number of images with a cache entry.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Returns how many volumes have been computed over the cache lifetime.
    pub fn computed_count(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }

    /// Drops all entries and returns how many there were.
    pub fn release(&self) -> usize {
        let mut slots = self.slots.lock();
        let count = slots.len();
        slots.clear();
        trace_event!("descriptor_cache_cleared", count = count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::DescriptorVolume;

    #[test]
    fn volume_rejects_mismatched_buffers() {
        assert!(DescriptorVolume::from_vec(vec![0.0; 11], 2, 2, 3).is_none());
        let vol = DescriptorVolume::from_vec((0..12).map(|v| v as f32).collect(), 2, 2, 3).unwrap();
        assert_eq!(vol.descriptor(1, 1).unwrap(), &[9.0, 10.0, 11.0]);
        assert!(vol.descriptor(2, 0).is_none());
    }
}
