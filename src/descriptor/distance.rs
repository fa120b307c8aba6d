//! Distance between a reference descriptor and a bilinearly interpolated one.
//!
//! The interpolated descriptor is never materialized: each component is
//! blended from the four neighbouring vectors and compared on the fly. With
//! the `simd` feature the blend runs 8 components at a time using `f32x8`.

use crate::params::DescriptorDistance;

/// Distance between `reference` and the blend of four vectors of `volume`.
///
/// `idx` are pixel indices into the volume, `w` the bilinear weights.
#[inline]
pub(crate) fn blended_distance(
    reference: &[f32],
    volume: &[f32],
    idx: [usize; 4],
    w: [f64; 4],
    kind: DescriptorDistance,
) -> f64 {
    #[cfg(feature = "simd")]
    {
        simd::blended_distance(reference, volume, idx, w, kind)
    }
    #[cfg(not(feature = "simd"))]
    {
        blended_distance_scalar(reference, volume, idx, w, kind)
    }
}

#[cfg_attr(feature = "simd", allow(dead_code))]
pub(crate) fn blended_distance_scalar(
    reference: &[f32],
    volume: &[f32],
    idx: [usize; 4],
    w: [f64; 4],
    kind: DescriptorDistance,
) -> f64 {
    let dim = reference.len();
    let base = idx.map(|i| i * dim);
    let w = w.map(|v| v as f32);
    let mut acc = 0.0f32;
    for (k, &r) in reference.iter().enumerate() {
        let v = w[0] * volume[base[0] + k]
            + w[1] * volume[base[1] + k]
            + w[2] * volume[base[2] + k]
            + w[3] * volume[base[3] + k];
        let d = r - v;
        acc += match kind {
            DescriptorDistance::L1 => d.abs(),
            DescriptorDistance::L2 => d * d,
        };
    }
    finish(acc, kind)
}

#[inline]
fn finish(acc: f32, kind: DescriptorDistance) -> f64 {
    match kind {
        DescriptorDistance::L1 => f64::from(acc),
        DescriptorDistance::L2 => f64::from(acc).sqrt(),
    }
}

#[cfg(feature = "simd")]
mod simd {
    use super::finish;
    use crate::params::DescriptorDistance;
    use wide::f32x8;

    const LANES: usize = 8;

    #[inline]
    fn load_f32x8(slice: &[f32]) -> f32x8 {
        f32x8::from([
            slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
        ])
    }

    #[inline]
    fn hsum(v: f32x8) -> f32 {
        let arr = v.to_array();
        arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
    }

    pub(super) fn blended_distance(
        reference: &[f32],
        volume: &[f32],
        idx: [usize; 4],
        w: [f64; 4],
        kind: DescriptorDistance,
    ) -> f64 {
        let dim = reference.len();
        let base = idx.map(|i| i * dim);
        let ws = w.map(|v| v as f32);
        let wv = ws.map(f32x8::splat);
        let simd_end = dim / LANES * LANES;

        let mut acc_vec = f32x8::ZERO;
        let mut k = 0;
        while k < simd_end {
            let v = wv[0] * load_f32x8(&volume[base[0] + k..])
                + wv[1] * load_f32x8(&volume[base[1] + k..])
                + wv[2] * load_f32x8(&volume[base[2] + k..])
                + wv[3] * load_f32x8(&volume[base[3] + k..]);
            let d = load_f32x8(&reference[k..]) - v;
            acc_vec += match kind {
                DescriptorDistance::L1 => d.abs(),
                DescriptorDistance::L2 => d * d,
            };
            k += LANES;
        }

        let mut acc = hsum(acc_vec);
        while k < dim {
            let v = ws[0] * volume[base[0] + k]
                + ws[1] * volume[base[1] + k]
                + ws[2] * volume[base[2] + k]
                + ws[3] * volume[base[3] + k];
            let d = reference[k] - v;
            acc += match kind {
                DescriptorDistance::L1 => d.abs(),
                DescriptorDistance::L2 => d * d,
            };
            k += 1;
        }
        finish(acc, kind)
    }
}
