//! Shared state owned by the orchestrator of a depth-map computation.

use crate::bilateral::BilateralTableCache;
use crate::descriptor::{Daisy, DescriptorCache, DescriptorExtractor};
use std::sync::{Arc, OnceLock};

/// Caches shared by all metrics of a depth-map computation.
///
/// Holds the per-image descriptor volumes and the bilateral weight tables.
/// Create one per run and pass it to [`crate::Metric::new`], or use
/// [`MetricContext::global`] for a process-wide instance.
pub struct MetricContext {
    descriptors: DescriptorCache,
    bilateral: BilateralTableCache,
}

impl MetricContext {
    /// Creates a context with the default dense descriptor.
    pub fn new() -> Self {
        Self::with_extractor(Arc::new(Daisy::default()))
    }

    /// Creates a context that computes descriptors with `extractor`.
    pub fn with_extractor(extractor: Arc<dyn DescriptorExtractor>) -> Self {
        Self {
            descriptors: DescriptorCache::new(extractor),
            bilateral: BilateralTableCache::new(),
        }
    }

    /// Returns the process-wide context, creating it on first use.
    pub fn global() -> &'static MetricContext {
        static GLOBAL: OnceLock<MetricContext> = OnceLock::new();
        GLOBAL.get_or_init(MetricContext::new)
    }

    /// Returns the descriptor cache.
    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    /// Returns the bilateral weight table cache.
    pub fn bilateral_tables(&self) -> &BilateralTableCache {
        &self.bilateral
    }

    /// Drops every cached descriptor volume and returns how many were held.
    ///
    /// Call once after the last image pair that uses descriptors. Metrics
    /// still alive keep their own handles to the volumes they resolved.
    pub fn release_cached_descriptors(&self) -> usize {
        self.descriptors.release()
    }
}

impl Default for MetricContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the descriptor volumes held by [`MetricContext::global`].
pub fn release_cached_descriptors() -> usize {
    MetricContext::global().release_cached_descriptors()
}
