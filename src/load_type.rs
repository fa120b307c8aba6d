//! Resolution of the image representations a metric needs before evaluation.

use crate::params::MetricKind;

/// Auxiliary per-image representation that can be prepared up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Representation {
    /// 8-bit grayscale intensity; always present.
    Intensity,
    /// Interleaved RGB color.
    Color,
    /// Horizontal and vertical intensity derivatives.
    Gradient,
}

impl Representation {
    const ALL: [Representation; 3] = [
        Representation::Intensity,
        Representation::Color,
        Representation::Gradient,
    ];

    const fn bit(self) -> u8 {
        match self {
            Representation::Intensity => 1,
            Representation::Color => 1 << 1,
            Representation::Gradient => 1 << 2,
        }
    }
}

/// Set of representations to load or compute for each image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadType {
    bits: u8,
}

impl LoadType {
    /// Intensity only.
    pub const INTENSITY: LoadType = LoadType {
        bits: Representation::Intensity.bit(),
    };

    /// Returns a copy with `rep` added.
    pub const fn with(self, rep: Representation) -> Self {
        Self {
            bits: self.bits | rep.bit(),
        }
    }

    /// Returns true if `rep` is part of the set.
    pub fn contains(self, rep: Representation) -> bool {
        self.bits & rep.bit() != 0
    }

    /// Returns the raw bit set.
    pub fn bits(self) -> u8 {
        self.bits
    }

    /// Iterates over the contained representations in a fixed order.
    pub fn iter(self) -> impl Iterator<Item = Representation> {
        Representation::ALL
            .into_iter()
            .filter(move |rep| self.contains(*rep))
    }
}

/// Returns the representations `kind` requires before any metric is built.
///
/// Descriptor volumes are not listed: the descriptor metric computes and
/// caches them itself on first use.
pub fn resolve_load_type(kind: MetricKind) -> LoadType {
    match kind {
        MetricKind::Ncc => LoadType::INTENSITY,
        MetricKind::PatchMatch => LoadType::INTENSITY
            .with(Representation::Color)
            .with(Representation::Gradient),
        MetricKind::Census => LoadType::INTENSITY,
        MetricKind::Descriptor => LoadType::INTENSITY,
        MetricKind::BilateralNcc => LoadType::INTENSITY,
    }
}
