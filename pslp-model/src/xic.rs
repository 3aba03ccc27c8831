//! The XIC (extracted-ion-chromatogram) kernel (spec §4.8.4): for a
//! feature's mass trace, sum raw intensities per scan and optionally
//! normalise by the per-feature maximum so `max_s XIC_weight(f,s) = 1`.
//!
//! Grounded on `PSLPFormulation::getXIC_`/`calculateXICs_`, which walk a
//! feature's `(scan, mz_index)` endpoint pairs against the raw experiment
//! matrix rather than re-integrating peak lists from scratch.

use std::collections::BTreeMap;

/// A source of raw MS1 intensities, indexed by scan and m/z bin. Callers
/// adapt whatever storage backs their MS1 matrix (a dense `ndarray`, a
/// sparse map, …) to this trait.
pub trait IntensityMatrix {
    /// Raw intensity at `(scan, mz_index)`, or `0.0` if nothing was recorded
    /// there.
    fn intensity(&self, scan: u32, mz_index: usize) -> f64;
}

/// One scan's mass-trace span for a feature: the inclusive range of m/z bin
/// indices the feature occupies in that scan (spec §3 `Feature.convex_hull`,
/// flattened to the bin indices the XIC kernel actually integrates over).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSpan {
    pub scan: u32,
    pub mz_lo: usize,
    pub mz_hi: usize,
}

/// A feature's full mass trace: one [`ScanSpan`] per scan it appears in.
#[derive(Clone, Debug, Default)]
pub struct FeatureTrace {
    pub spans: Vec<ScanSpan>,
}

/// Integrate `Σ_{j=lo..=hi} intensity[scan][j]` for every span in `trace`,
/// then, if `normalise` is set, divide every resulting scalar by the
/// per-feature maximum (spec §4.8.4's XIC kernel definition). Scans are
/// returned in ascending order; a scan present more than once in `trace`
/// (unusual, but not forbidden) has its spans summed together.
pub fn xic_weights(trace: &FeatureTrace, matrix: &dyn IntensityMatrix, normalise: bool) -> BTreeMap<u32, f64> {
    let mut weights: BTreeMap<u32, f64> = BTreeMap::new();
    for span in &trace.spans {
        let sum: f64 = (span.mz_lo..=span.mz_hi).map(|j| matrix.intensity(span.scan, j)).sum();
        *weights.entry(span.scan).or_insert(0.0) += sum;
    }
    if normalise {
        let max = weights.values().copied().fold(0.0_f64, f64::max);
        if max > 0.0 {
            for value in weights.values_mut() {
                *value /= max;
            }
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DenseMatrix {
        rows: Vec<Vec<f64>>,
    }

    impl IntensityMatrix for DenseMatrix {
        fn intensity(&self, scan: u32, mz_index: usize) -> f64 {
            self.rows.get(scan as usize).and_then(|row| row.get(mz_index)).copied().unwrap_or(0.0)
        }
    }

    #[test]
    fn sums_span_intensities_per_scan() {
        let matrix = DenseMatrix {
            rows: vec![vec![1.0, 2.0, 3.0], vec![4.0, 0.0, 0.0]],
        };
        let trace = FeatureTrace {
            spans: vec![ScanSpan { scan: 0, mz_lo: 0, mz_hi: 2 }, ScanSpan { scan: 1, mz_lo: 0, mz_hi: 0 }],
        };
        let weights = xic_weights(&trace, &matrix, false);
        assert_eq!(weights[&0], 6.0);
        assert_eq!(weights[&1], 4.0);
    }

    #[test]
    fn normalisation_divides_by_feature_max() {
        let matrix = DenseMatrix {
            rows: vec![vec![2.0], vec![8.0]],
        };
        let trace = FeatureTrace {
            spans: vec![ScanSpan { scan: 0, mz_lo: 0, mz_hi: 0 }, ScanSpan { scan: 1, mz_lo: 0, mz_hi: 0 }],
        };
        let weights = xic_weights(&trace, &matrix, true);
        assert!((weights[&0] - 0.25).abs() < 1e-9);
        assert!((weights[&1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_max_weight_leaves_all_weights_zero() {
        let matrix = DenseMatrix { rows: vec![vec![0.0]] };
        let trace = FeatureTrace {
            spans: vec![ScanSpan { scan: 0, mz_lo: 0, mz_hi: 0 }],
        };
        let weights = xic_weights(&trace, &matrix, true);
        assert_eq!(weights[&0], 0.0);
    }
}
