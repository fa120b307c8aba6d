//! Bilateral weighting shared by bilateral-weighted NCC.
//!
//! The spatial and color weight tables depend only on the window layout and
//! the two sigmas, so every metric built from the same configuration shares
//! one `Arc<BilateralTables>` handed out by [`BilateralTableCache`].

mod precompute;

pub use precompute::BilateralPrecompute;

use crate::params::Parameters;
use crate::trace::trace_event;
use crate::util::math::gaussian_sq;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of color buckets: one per integer intensity difference.
const COLOR_BUCKETS: usize = 256;

/// Lookup tables for spatial and color weights.
#[derive(Debug)]
pub struct BilateralTables {
    half: usize,
    side: usize,
    spatial: Vec<f64>,
    color: Vec<f64>,
}

impl BilateralTables {
    /// Builds the tables for a window of half-size `half`.
    pub fn new(half: usize, sigma_spatial: f64, sigma_color: f64) -> Self {
        let side = 2 * half + 1;
        let mut spatial = Vec::with_capacity(side * side);
        for dy in -(half as isize)..=half as isize {
            for dx in -(half as isize)..=half as isize {
                spatial.push(gaussian_sq((dx * dx + dy * dy) as f64, sigma_spatial));
            }
        }
        let color = (0..COLOR_BUCKETS)
            .map(|d| gaussian_sq((d * d) as f64, sigma_color))
            .collect();
        Self {
            half,
            side,
            spatial,
            color,
        }
    }

    /// Returns the spatial weight of offset `(dx, dy)`.
    #[inline]
    pub fn spatial(&self, dx: isize, dy: isize) -> f64 {
        let ix = (dx + self.half as isize) as usize;
        let iy = (dy + self.half as isize) as usize;
        self.spatial[iy * self.side + ix]
    }

    /// Returns the color weight of an intensity difference, bucketed to integers.
    #[inline]
    pub fn color(&self, delta: f64) -> f64 {
        let bucket = (delta.abs().round() as usize).min(COLOR_BUCKETS - 1);
        self.color[bucket]
    }

    /// Returns the combined weight.
    #[inline]
    pub fn weight(&self, dx: isize, dy: isize, delta: f64) -> f64 {
        self.spatial(dx, dy) * self.color(delta)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TableKey {
    half: usize,
    sigma_spatial: u64,
    sigma_color: u64,
}

impl TableKey {
    fn from_params(params: &Parameters) -> Self {
        Self {
            half: params.half_window,
            sigma_spatial: params.sigma_spatial.to_bits(),
            sigma_color: params.sigma_color.to_bits(),
        }
    }
}

/// Build-once registry of weight tables keyed by configuration.
#[derive(Default)]
pub struct BilateralTableCache {
    tables: Mutex<HashMap<TableKey, Arc<BilateralTables>>>,
    built: AtomicUsize,
}

impl BilateralTableCache {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tables for `params`, building them on first request.
    pub fn tables_for(&self, params: &Parameters) -> Arc<BilateralTables> {
        let key = TableKey::from_params(params);
        let mut tables = self.tables.lock();
        let entry = tables.entry(key).or_insert_with(|| {
            self.built.fetch_add(1, Ordering::Relaxed);
            trace_event!(
                "bilateral_tables_built",
                half = key.half,
                sigma_spatial = params.sigma_spatial,
                sigma_color = params.sigma_color
            );
            Arc::new(BilateralTables::new(
                params.half_window,
                params.sigma_spatial,
                params.sigma_color,
            ))
        });
        Arc::clone(entry)
    }

    /// Returns how many table sets have been built.
    pub fn built_count(&self) -> usize {
        self.built.load(Ordering::Relaxed)
    }
}
