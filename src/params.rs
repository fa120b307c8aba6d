//! Configuration shared by every metric of a depth-map pass.

use crate::util::{CostError, CostResult};
use std::fmt;
use std::str::FromStr;

/// Matching-cost algorithm selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Zero-mean normalized cross-correlation.
    Ncc,
    /// Truncated, adaptive-support-weighted residual for PatchMatch search.
    PatchMatch,
    /// Hamming distance between census codes.
    Census,
    /// Distance between dense descriptors.
    Descriptor,
    /// Bilateral-weighted normalized cross-correlation.
    BilateralNcc,
}

impl MetricKind {
    /// All metric kinds in declaration order.
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Ncc,
        MetricKind::PatchMatch,
        MetricKind::Census,
        MetricKind::Descriptor,
        MetricKind::BilateralNcc,
    ];

    /// Returns the canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Ncc => "ncc",
            MetricKind::PatchMatch => "patch_match",
            MetricKind::Census => "census",
            MetricKind::Descriptor => "descriptor",
            MetricKind::BilateralNcc => "bilateral_ncc",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "ncc" | "zncc" => Ok(MetricKind::Ncc),
            "patch_match" | "patchmatch" | "pm" => Ok(MetricKind::PatchMatch),
            "census" => Ok(MetricKind::Census),
            "descriptor" | "daisy" => Ok(MetricKind::Descriptor),
            "bilateral_ncc" | "bilateral" => Ok(MetricKind::BilateralNcc),
            _ => Err(CostError::UnknownMetric(s.to_string())),
        }
    }
}

/// Vector distance used by the descriptor metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorDistance {
    /// Sum of absolute differences.
    L1,
    /// Euclidean distance.
    L2,
}

/// Immutable configuration for cost evaluation.
#[derive(Clone, Debug)]
pub struct Parameters {
    /// Selected cost metric.
    pub metric: MetricKind,
    /// Window half-size; the window side is `2 * half_window + 1`.
    pub half_window: usize,
    /// Sampling step inside the window.
    pub step: usize,
    /// Bilateral color sigma in intensity units.
    pub sigma_color: f64,
    /// Bilateral spatial sigma in pixels.
    pub sigma_spatial: f64,
    /// Per-sample variance floor below which a window counts as flat.
    pub min_variance: f64,
    /// PatchMatch balance between intensity (0) and gradient (1) residuals.
    pub alpha: f64,
    /// PatchMatch truncation of the intensity residual.
    pub tau_intensity: f64,
    /// PatchMatch truncation of the gradient residual.
    pub tau_gradient: f64,
    /// PatchMatch adaptive-support color falloff.
    pub gamma: f64,
    /// Distance used by the descriptor metric.
    pub descriptor_distance: DescriptorDistance,
    /// Divide the census Hamming distance by the code length.
    pub normalize_census: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            metric: MetricKind::Ncc,
            half_window: 3,
            step: 1,
            sigma_color: 12.0,
            sigma_spatial: 3.0,
            min_variance: 1e-4,
            alpha: 0.9,
            tau_intensity: 1.0,
            tau_gradient: 1.0,
            gamma: 10.0,
            descriptor_distance: DescriptorDistance::L2,
            normalize_census: true,
        }
    }
}

impl Parameters {
    /// Returns default parameters for `metric`.
    pub fn for_metric(metric: MetricKind) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    /// Returns the window side length in pixels.
    pub fn window_size(&self) -> usize {
        2 * self.half_window + 1
    }

    /// Checks every value and reports the first invalid one.
    pub fn validate(&self) -> CostResult<()> {
        if self.half_window == 0 {
            return Err(invalid("half_window", "must be > 0"));
        }
        if self.step == 0 {
            return Err(invalid("step", "must be > 0"));
        }
        if self.step > self.half_window {
            return Err(invalid("step", "must not exceed half_window"));
        }
        positive("sigma_color", self.sigma_color)?;
        positive("sigma_spatial", self.sigma_spatial)?;
        positive("min_variance", self.min_variance)?;
        positive("tau_intensity", self.tau_intensity)?;
        positive("tau_gradient", self.tau_gradient)?;
        positive("gamma", self.gamma)?;
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(invalid("alpha", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: &'static str) -> CostError {
    CostError::InvalidParameter { name, reason }
}

fn positive(name: &'static str, value: f64) -> CostResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(name, "must be finite and > 0"));
    }
    Ok(())
}
