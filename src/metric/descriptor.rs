//! Dense-descriptor distance.

use crate::descriptor::distance::blended_distance;
use crate::descriptor::{DescriptorCache, DescriptorVolume};
use crate::image::Image;
use crate::metric::{check_pair, CostMetric, BAD_COST};
use crate::params::{DescriptorDistance, MetricKind, Parameters};
use crate::sample::Tap;
use crate::util::math::Homography;
use crate::util::CostResult;
use std::sync::{Arc, OnceLock};

/// Distance between the reference descriptor at a pixel and the target
/// descriptor interpolated at the warped location.
///
/// Both volumes are resolved through the shared cache on the first
/// evaluation and held by the metric afterwards.
pub struct DescriptorMetric<'a> {
    reference: &'a Image,
    target: &'a Image,
    cache: &'a DescriptorCache,
    distance: DescriptorDistance,
    ref_volume: OnceLock<Arc<DescriptorVolume>>,
    tgt_volume: OnceLock<Arc<DescriptorVolume>>,
}

impl<'a> DescriptorMetric<'a> {
    /// Builds the metric; descriptors are not computed until first use.
    pub fn new(
        reference: &'a Image,
        target: &'a Image,
        params: &'a Parameters,
        cache: &'a DescriptorCache,
    ) -> CostResult<Self> {
        check_pair(MetricKind::Descriptor, reference, target, params)?;
        Ok(Self {
            reference,
            target,
            cache,
            distance: params.descriptor_distance,
            ref_volume: OnceLock::new(),
            tgt_volume: OnceLock::new(),
        })
    }

    fn reference_volume(&self) -> &DescriptorVolume {
        self.ref_volume
            .get_or_init(|| self.cache.get_or_compute(self.reference))
    }

    fn target_volume(&self) -> &DescriptorVolume {
        self.tgt_volume
            .get_or_init(|| self.cache.get_or_compute(self.target))
    }
}

impl CostMetric for DescriptorMetric<'_> {
    fn kind(&self) -> MetricKind {
        MetricKind::Descriptor
    }

    /// Resolves both descriptor volumes through the cache.
    fn warm(&self) {
        self.reference_volume();
        self.target_volume();
    }

    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64 {
        if !self.reference.is_usable(col, row) {
            return BAD_COST;
        }
        let Some(tap) = Tap::warp_into(self.target, h, col as f64, row as f64) else {
            return BAD_COST;
        };
        let Some(reference) = self.reference_volume().descriptor(col, row) else {
            return BAD_COST;
        };
        let target = self.target_volume();
        if target.dim() != reference.len()
            || target.width() != self.target.width()
            || target.height() != self.target.height()
        {
            return BAD_COST;
        }
        let (idx, w) = tap.parts();
        blended_distance(reference, target.as_slice(), idx, w, self.distance)
    }
}
