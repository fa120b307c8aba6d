//! Matching-cost metrics.
//!
//! Every metric scores a reference pixel against the target image under a
//! homography and reports a cost where lower is better. Failure to evaluate
//! (warp outside the target, masked pixels, flat windows) is reported as
//! [`BAD_COST`] rather than as an error, so a search loop only has to compare
//! against one sentinel value.
//!
//! [`Metric`] is a tagged variant over the five implementations selected by
//! [`MetricKind`]; each implementation is also usable on its own.

mod bilateral;
mod census;
mod context;
mod descriptor;
mod ncc;
mod patch_match;

pub use bilateral::BilateralNccMetric;
pub use census::{CensusCode, CensusMetric, MAX_CENSUS_BITS};
pub use context::{release_cached_descriptors, MetricContext};
pub use descriptor::DescriptorMetric;
pub use ncc::NccMetric;
pub use patch_match::PatchMatchMetric;

use crate::image::Image;
use crate::load_type::resolve_load_type;
use crate::params::{MetricKind, Parameters};
use crate::trace::trace_span;
use crate::util::math::Homography;
use crate::util::{CostError, CostResult};

/// Cost reported for hypotheses that cannot be evaluated.
pub const BAD_COST: f64 = f64::MAX / 2.0;

/// Common contract of all matching-cost metrics.
///
/// `evaluate` is pure and may be called concurrently from many threads.
pub trait CostMetric: Send + Sync {
    /// Returns the algorithm implemented by this metric.
    fn kind(&self) -> MetricKind;

    /// Scores reference pixel `(row, col)` warped by `h` into the target.
    ///
    /// Returns [`BAD_COST`] when any sample leaves the target image, hits a
    /// masked pixel, or the window statistics are degenerate.
    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64;

    /// Builds any state `evaluate` would otherwise create on first use.
    ///
    /// Call before fanning evaluations out to a thread pool so lazy setup
    /// never runs inside a pool worker.
    fn warm(&self) {}
}

/// Cost metric dispatched on [`MetricKind`].
pub enum Metric<'a> {
    /// See [`NccMetric`].
    Ncc(NccMetric<'a>),
    /// See [`PatchMatchMetric`].
    PatchMatch(PatchMatchMetric<'a>),
    /// See [`CensusMetric`].
    Census(CensusMetric<'a>),
    /// See [`DescriptorMetric`].
    Descriptor(DescriptorMetric<'a>),
    /// See [`BilateralNccMetric`].
    BilateralNcc(BilateralNccMetric<'a>),
}

impl<'a> Metric<'a> {
    /// Builds the metric selected by `params.metric` for one image pair.
    ///
    /// `ctx` supplies the shared descriptor cache and bilateral weight tables.
    pub fn new(
        reference: &'a Image,
        target: &'a Image,
        params: &'a Parameters,
        ctx: &'a MetricContext,
    ) -> CostResult<Self> {
        let _span = trace_span!(
            "metric_new",
            kind = params.metric.name(),
            width = reference.width(),
            height = reference.height()
        )
        .entered();

        Ok(match params.metric {
            MetricKind::Ncc => Metric::Ncc(NccMetric::new(reference, target, params)?),
            MetricKind::PatchMatch => {
                Metric::PatchMatch(PatchMatchMetric::new(reference, target, params)?)
            }
            MetricKind::Census => Metric::Census(CensusMetric::new(reference, target, params)?),
            MetricKind::Descriptor => Metric::Descriptor(DescriptorMetric::new(
                reference,
                target,
                params,
                ctx.descriptors(),
            )?),
            MetricKind::BilateralNcc => Metric::BilateralNcc(BilateralNccMetric::new(
                reference,
                target,
                params,
                ctx.bilateral_tables(),
            )?),
        })
    }
}

impl CostMetric for Metric<'_> {
    fn kind(&self) -> MetricKind {
        match self {
            Metric::Ncc(m) => m.kind(),
            Metric::PatchMatch(m) => m.kind(),
            Metric::Census(m) => m.kind(),
            Metric::Descriptor(m) => m.kind(),
            Metric::BilateralNcc(m) => m.kind(),
        }
    }

    #[inline]
    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64 {
        match self {
            Metric::Ncc(m) => m.evaluate(row, col, h),
            Metric::PatchMatch(m) => m.evaluate(row, col, h),
            Metric::Census(m) => m.evaluate(row, col, h),
            Metric::Descriptor(m) => m.evaluate(row, col, h),
            Metric::BilateralNcc(m) => m.evaluate(row, col, h),
        }
    }

    fn warm(&self) {
        if let Metric::Descriptor(m) = self {
            m.warm();
        }
    }
}

/// Validates parameters and checks that both images suit `kind`.
pub(crate) fn check_pair(
    kind: MetricKind,
    reference: &Image,
    target: &Image,
    params: &Parameters,
) -> CostResult<()> {
    params.validate()?;
    let window = params.window_size();
    for img in [reference, target] {
        if window > img.width() || window > img.height() {
            return Err(CostError::WindowTooLarge {
                window,
                width: img.width(),
                height: img.height(),
            });
        }
        if let Some(representation) = img.missing(resolve_load_type(kind)) {
            return Err(CostError::MissingRepresentation { representation });
        }
    }
    Ok(())
}
