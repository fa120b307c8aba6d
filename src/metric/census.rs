//! Census transform matching.
//!
//! Each non-center window sample contributes one bit, set when the sample is
//! at least as bright as the window center. The cost is the Hamming distance
//! between the reference code and the code of the warped target window,
//! optionally divided by the code length. Codes are invariant to gain and
//! offset changes and stay defined on flat windows.

use crate::image::Image;
use crate::metric::{check_pair, CostMetric, BAD_COST};
use crate::params::{MetricKind, Parameters};
use crate::sample::{Tap, Window};
use crate::util::math::Homography;
use crate::util::{CostError, CostResult};

const CENSUS_WORDS: usize = 8;

/// Largest supported census code, in bits.
pub const MAX_CENSUS_BITS: usize = CENSUS_WORDS * 64;

/// Fixed-capacity census bit string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CensusCode {
    words: [u64; CENSUS_WORDS],
    len: usize,
}

impl CensusCode {
    fn new(len: usize) -> Self {
        debug_assert!(len <= MAX_CENSUS_BITS);
        Self {
            words: [0; CENSUS_WORDS],
            len,
        }
    }

    #[inline]
    fn set(&mut self, bit: usize) {
        self.words[bit / 64] |= 1u64 << (bit % 64);
    }

    /// Returns the number of bits in the code.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the code has no bits.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns bit `i`.
    pub fn bit(&self, i: usize) -> bool {
        i < self.len && self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    /// Counts differing bits.
    pub fn hamming(&self, other: &CensusCode) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Hamming distance between census codes.
pub struct CensusMetric<'a> {
    reference: &'a Image,
    target: &'a Image,
    window: Window,
    normalize: bool,
}

impl<'a> CensusMetric<'a> {
    /// Builds the metric; the window must yield at most [`MAX_CENSUS_BITS`] bits.
    pub fn new(reference: &'a Image, target: &'a Image, params: &'a Parameters) -> CostResult<Self> {
        check_pair(MetricKind::Census, reference, target, params)?;
        let window = Window::new(params.half_window, params.step);
        let bits = window.len() - 1;
        if bits > MAX_CENSUS_BITS {
            return Err(CostError::CensusTooLong {
                bits,
                max_bits: MAX_CENSUS_BITS,
            });
        }
        Ok(Self {
            reference,
            target,
            window,
            normalize: params.normalize_census,
        })
    }

    /// Returns the code length in bits (window samples minus the center).
    pub fn code_len(&self) -> usize {
        self.window.len() - 1
    }

    /// Computes the reference and warped target codes at `(row, col)`.
    pub fn codes(&self, row: usize, col: usize, h: &Homography) -> Option<(CensusCode, CensusCode)> {
        if !self.window.usable_in(self.reference, col, row) {
            return None;
        }
        let width = self.reference.width();
        let ref_plane = self.reference.intensity().as_slice();
        let tgt_plane = self.target.intensity().as_slice();

        let ref_center = ref_plane[row * width + col];
        let tgt_center = Tap::warp_into(self.target, h, col as f64, row as f64)?.sample(tgt_plane);

        let mut ref_code = CensusCode::new(self.code_len());
        let mut tgt_code = CensusCode::new(self.code_len());
        let mut bit = 0usize;
        for (i, &(dx, dy)) in self.window.offsets().iter().enumerate() {
            if i == self.window.center_index() {
                continue;
            }
            let x = (col as isize + dx) as usize;
            let y = (row as isize + dy) as usize;
            let tap = Tap::warp_into(self.target, h, x as f64, y as f64)?;
            if ref_plane[y * width + x] >= ref_center {
                ref_code.set(bit);
            }
            if tap.sample(tgt_plane) >= tgt_center {
                tgt_code.set(bit);
            }
            bit += 1;
        }
        Some((ref_code, tgt_code))
    }
}

impl CostMetric for CensusMetric<'_> {
    fn kind(&self) -> MetricKind {
        MetricKind::Census
    }

    fn evaluate(&self, row: usize, col: usize, h: &Homography) -> f64 {
        let Some((ref_code, tgt_code)) = self.codes(row, col, h) else {
            return BAD_COST;
        };
        let distance = f64::from(ref_code.hamming(&tgt_code));
        if self.normalize {
            distance / self.code_len() as f64
        } else {
            distance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CensusCode, CensusMetric, MAX_CENSUS_BITS};
    use crate::image::Image;
    use crate::metric::CostMetric;
    use crate::params::{MetricKind, Parameters};
    use crate::util::math::Homography;
    use crate::util::CostError;

    #[test]
    fn hamming_counts_across_words() {
        let mut a = CensusCode::new(130);
        let b = CensusCode::new(130);
        a.set(0);
        a.set(64);
        a.set(129);
        assert_eq!(a.hamming(&b), 3);
        assert!(a.bit(129));
        assert!(!a.bit(128));
    }

    #[test]
    fn flat_windows_match_trivially() {
        let reference = Image::from_gray(vec![40; 100], 10, 10).unwrap();
        let target = Image::from_gray(vec![200; 100], 10, 10).unwrap();
        let params = Parameters::for_metric(MetricKind::Census);
        let metric = CensusMetric::new(&reference, &target, &params).unwrap();
        assert_eq!(metric.evaluate(5, 5, &Homography::identity()), 0.0);
    }

    #[test]
    fn oversized_window_is_rejected() {
        let reference = Image::from_gray(vec![0; 64 * 64], 64, 64).unwrap();
        let params = Parameters {
            metric: MetricKind::Census,
            half_window: 12,
            ..Parameters::default()
        };
        let err = CensusMetric::new(&reference, &reference, &params)
            .err()
            .unwrap();
        assert_eq!(
            err,
            CostError::CensusTooLong {
                bits: 624,
                max_bits: MAX_CENSUS_BITS,
            }
        );
    }
}
