//! mvscost evaluates matching costs for dense multi-view stereo.
//!
//! A depth-map search proposes, for every reference pixel, a homography into
//! a target image. The metrics in this crate score such a hypothesis by
//! comparing a window around the reference pixel with the warped target
//! window; lower costs are better and [`BAD_COST`] marks hypotheses that
//! cannot be evaluated.
//!
//! Five metrics are available (see [`MetricKind`]): zero-mean NCC, a robust
//! PatchMatch residual, census Hamming distance, dense-descriptor distance
//! and bilateral-weighted NCC. [`resolve_load_type`] tells the image layer
//! which planes to prepare; [`MetricContext`] owns the descriptor and weight
//! table caches shared across image pairs.
//!
//! Optional features: `rayon` (parallel precompute and cost maps), `simd`
//! (vectorized descriptor distances), `image-io` (loading via `image`) and
//! `tracing` (spans and events).

pub mod bilateral;
pub mod descriptor;
pub mod image;
mod load_type;
pub mod map;
pub mod metric;
mod params;
pub mod sample;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;
pub use image::{Image, ImageId, ImageView};
pub use load_type::{resolve_load_type, LoadType, Representation};
pub use map::{compute_cost_map, CostMap, CostStats};
#[cfg(feature = "rayon")]
pub use map::compute_cost_map_par;
pub use metric::{
    release_cached_descriptors, BilateralNccMetric, CensusMetric, CostMetric, DescriptorMetric,
    Metric, MetricContext, NccMetric, PatchMatchMetric, BAD_COST,
};
pub use params::{DescriptorDistance, MetricKind, Parameters};
pub use util::math::Homography;
pub use util::{CostError, CostResult};
