//! Fragment-weighted-average precursor/RT/charge/scan aggregation with
//! Dixon-style RT-dimension outlier removal (spec §4.4, §3, component C4).
//!
//! Grounded on `examples/original_source/.../MS2ConsensusSpectrum.cpp` for
//! the "recompute every aggregate on every insert" contract, and on the
//! `probability` crate (already a teacher dependency via `mzcore`'s
//! isotope-distribution code) for the Gaussian tail probability the Dixon
//! test's critical value needs when the caller picks a non-standard
//! significance level.

use probability::distribution::{Gaussian, Inverse};
use pslp_core::error::{PslpErrorKind, PslpResult, simple};
use pslp_spectra::{FragmentIon, FragmentStore};
use std::cmp::Ordering;

/// A single fragment-ion observation contributed to a consensus spectrum: the
/// ion itself plus the scalar metadata of the individual MS2 spectrum it was
/// extracted from. Each call to [`MS2ConsensusSpectrum::add_fragment`] folds
/// one of these in, weighted by `fragment.intensity` (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsensusFragmentObservation {
    /// The fragment ion itself.
    pub fragment: FragmentIon,
    /// Precursor m/z of the originating spectrum.
    pub precursor_mz: f64,
    /// Retention time of the originating spectrum.
    pub rt: f64,
    /// Start of the originating spectrum's elution window.
    pub rt_start: f64,
    /// End of the originating spectrum's elution window.
    pub rt_end: f64,
    /// Precursor charge of the originating spectrum.
    pub precursor_charge: i8,
    /// First MS1 scan of the originating spectrum's elution window.
    pub start_scan: u32,
    /// Last MS1 scan of the originating spectrum's elution window.
    pub end_scan: u32,
}

/// Which scalar dimension [`MS2ConsensusSpectrum::remove_outliers`] runs the
/// Dixon test over. RT is the default (spec §4.4).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutlierDimension {
    /// The aggregate retention time.
    Rt,
    /// The elution-window start.
    RtStart,
    /// The elution-window end.
    RtEnd,
    /// The aggregate precursor m/z.
    PrecursorMz,
}

impl OutlierDimension {
    fn value(self, obs: &ConsensusFragmentObservation) -> f64 {
        match self {
            Self::Rt => obs.rt,
            Self::RtStart => obs.rt_start,
            Self::RtEnd => obs.rt_end,
            Self::PrecursorMz => obs.precursor_mz,
        }
    }
}

/// Tunable knobs for consensus aggregation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsensusSettings {
    /// Significance level for the Dixon outlier test. Default `0.05`.
    pub dixon_alpha: f64,
    /// ppm tolerance used by [`MS2ConsensusSpectrum::find_fragment`].
    pub fragment_tolerance_ppm: f64,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            dixon_alpha: 0.05,
            fragment_tolerance_ppm: 10.0,
        }
    }
}

/// Standard two-tailed Dixon Q-test critical values at alpha = 0.05, for
/// sample sizes 3..=10 (the classic `Q10` table; beyond 10 observations the
/// critical value is extrapolated, see [`critical_value`]).
const DIXON_Q_CRITICAL_95: &[(usize, f64)] = &[
    (3, 0.970),
    (4, 0.829),
    (5, 0.710),
    (6, 0.628),
    (7, 0.569),
    (8, 0.608),
    (9, 0.564),
    (10, 0.530),
];

/// The Dixon-test critical value for `n` observations at significance
/// `alpha`. Looks up the standard alpha=0.05 table and, for any other alpha,
/// rescales it by the ratio of two-tailed standard-normal quantiles — an
/// approximation, since the exact Dixon distribution has no closed form, but
/// one that recovers the tabulated value exactly at alpha=0.05 and degrades
/// gracefully elsewhere.
fn critical_value(n: usize, alpha: f64) -> f64 {
    let base = DIXON_Q_CRITICAL_95
        .iter()
        .rev()
        .find(|&&(size, _)| size <= n)
        .map_or(DIXON_Q_CRITICAL_95[0].1, |&(_, q)| q);
    if (alpha - 0.05).abs() < 1e-9 {
        return base;
    }
    let gaussian = Gaussian::new(0.0, 1.0);
    let z_alpha = gaussian.inverse(1.0 - alpha.clamp(1e-6, 0.999) / 2.0);
    let z_reference = gaussian.inverse(1.0 - 0.05 / 2.0);
    (base * z_alpha / z_reference).clamp(0.0, 1.0)
}

/// A fragment-weighted-average MS2 consensus spectrum (spec §3, §4.4, C4).
///
/// Invariant: after every [`MS2ConsensusSpectrum::add_fragment`] call, every
/// aggregate scalar (`precursor_mz`, `rt`, `rt_start`, `rt_end`, `charge`,
/// `apex_scan`, `start_scan`, `end_scan`) is the intensity-weighted mean over
/// the current set of observations — [`MS2ConsensusSpectrum::remove_outliers`]
/// mutates the observation set and then reruns this same aggregation.
#[derive(Clone, Debug)]
pub struct MS2ConsensusSpectrum {
    precursor_mz: f64,
    rt: f64,
    rt_start: f64,
    rt_end: f64,
    charge: i8,
    apex_scan: u32,
    start_scan: u32,
    end_scan: u32,
    fragments: FragmentStore,
    observations: Vec<ConsensusFragmentObservation>,
    settings: ConsensusSettings,
}

impl MS2ConsensusSpectrum {
    /// An empty consensus spectrum with every aggregate at zero.
    pub fn new(settings: ConsensusSettings) -> Self {
        Self {
            precursor_mz: 0.0,
            rt: 0.0,
            rt_start: 0.0,
            rt_end: 0.0,
            charge: 0,
            apex_scan: 0,
            start_scan: 0,
            end_scan: 0,
            fragments: FragmentStore::new(),
            observations: Vec::new(),
            settings,
        }
    }

    /// Number of fragment observations folded in so far.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True if no fragment has been added yet.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Intensity-weighted-mean precursor m/z.
    pub fn precursor_mz(&self) -> f64 {
        self.precursor_mz
    }

    /// Intensity-weighted-mean retention time.
    pub fn rt(&self) -> f64 {
        self.rt
    }

    /// Intensity-weighted-mean elution-window start.
    pub fn rt_start(&self) -> f64 {
        self.rt_start
    }

    /// Intensity-weighted-mean elution-window end.
    pub fn rt_end(&self) -> f64 {
        self.rt_end
    }

    /// Intensity-weighted-mean charge, truncated to an integer.
    pub fn charge(&self) -> i8 {
        self.charge
    }

    /// Intensity-weighted-mean apex scan, truncated to an integer.
    pub fn apex_scan(&self) -> u32 {
        self.apex_scan
    }

    /// Intensity-weighted-mean elution-window start scan, truncated.
    pub fn start_scan(&self) -> u32 {
        self.start_scan
    }

    /// Intensity-weighted-mean elution-window end scan, truncated.
    pub fn end_scan(&self) -> u32 {
        self.end_scan
    }

    /// The fragment observations currently folded into this consensus.
    pub fn observations(&self) -> &[ConsensusFragmentObservation] {
        &self.observations
    }

    /// Fold in one more fragment observation, then recompute every aggregate
    /// scalar as the intensity-weighted mean over all observations (spec
    /// §4.4).
    pub fn add_fragment(&mut self, observation: ConsensusFragmentObservation) {
        self.fragments.insert(observation.fragment);
        self.observations.push(observation);
        self.recompute_aggregates();
    }

    fn recompute_aggregates(&mut self) {
        let total_weight: f64 = self.observations.iter().map(|o| o.fragment.intensity).sum();
        let weight = |w: f64| if total_weight > 0.0 { w / total_weight } else { 1.0 / self.observations.len().max(1) as f64 };

        let mut precursor_mz = 0.0;
        let mut rt = 0.0;
        let mut rt_start = 0.0;
        let mut rt_end = 0.0;
        let mut charge = 0.0;
        let mut apex_scan = 0.0;
        let mut start_scan = 0.0;
        let mut end_scan = 0.0;
        for obs in &self.observations {
            let w = weight(obs.fragment.intensity);
            precursor_mz += w * obs.precursor_mz;
            rt += w * obs.rt;
            rt_start += w * obs.rt_start;
            rt_end += w * obs.rt_end;
            charge += w * f64::from(obs.precursor_charge);
            apex_scan += w * f64::from(obs.fragment.apex_scan);
            start_scan += w * f64::from(obs.start_scan);
            end_scan += w * f64::from(obs.end_scan);
        }
        self.precursor_mz = precursor_mz;
        self.rt = rt;
        self.rt_start = rt_start;
        self.rt_end = rt_end;
        // "the last four truncated to integers after averaging" (spec §4.4).
        self.charge = charge.trunc() as i8;
        self.apex_scan = apex_scan.trunc() as u32;
        self.start_scan = start_scan.trunc() as u32;
        self.end_scan = end_scan.trunc() as u32;
    }

    fn rebuild_fragment_store(&mut self) {
        self.fragments = FragmentStore::new();
        for obs in &self.observations {
            self.fragments.insert(obs.fragment);
        }
    }

    /// Look up a fragment near `mz` using the store's configured ppm
    /// tolerance, delegating to [`FragmentStore::find_near`] (spec §4.4).
    pub fn find_fragment(&self, mz: f64) -> Option<FragmentIon> {
        self.fragments.find_near(mz, self.settings.fragment_tolerance_ppm)
    }

    /// Elution-shape similarity to another observation: the (unweighted) sum
    /// of absolute RT-endpoint differences (start, apex/rt, end); smaller is
    /// more similar. Used by downstream callers (C8) to weight co-eluting
    /// evidence (spec §4.4).
    pub fn elution_shape_similarity(&self, other: &ConsensusFragmentObservation) -> f64 {
        (self.rt_start - other.rt_start).abs() + (self.rt - other.rt).abs() + (self.rt_end - other.rt_end).abs()
    }

    /// Iterative Dixon-style outlier rejection on `dimension` (RT by
    /// default). Re-aggregates after every rejection. A no-op on a
    /// single-fragment spectrum; an error on an empty one.
    ///
    /// # Errors
    /// [`PslpErrorKind::InvalidRange`] if no fragment has been added.
    pub fn remove_outliers(&mut self, dimension: OutlierDimension) -> PslpResult<()> {
        if self.observations.is_empty() {
            return Err(simple(
                PslpErrorKind::InvalidRange,
                "remove_outliers called on an empty consensus spectrum",
            ));
        }
        if self.observations.len() == 1 {
            return Ok(());
        }
        loop {
            let n = self.observations.len();
            if n < 3 {
                break;
            }
            let mut ordered: Vec<(usize, f64)> = self
                .observations
                .iter()
                .enumerate()
                .map(|(i, o)| (i, dimension.value(o)))
                .collect();
            ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            let range = ordered[n - 1].1 - ordered[0].1;
            if range <= 0.0 {
                break;
            }
            let gap_low = ordered[1].1 - ordered[0].1;
            let gap_high = ordered[n - 1].1 - ordered[n - 2].1;
            let (reject_index, q) = if gap_low >= gap_high {
                (ordered[0].0, gap_low / range)
            } else {
                (ordered[n - 1].0, gap_high / range)
            };

            if q > critical_value(n, self.settings.dixon_alpha) {
                self.observations.remove(reject_index);
                self.rebuild_fragment_store();
                self.recompute_aggregates();
            } else {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pslp_core::entities::FeatureId;

    fn obs(rt: f64, intensity: f64) -> ConsensusFragmentObservation {
        ConsensusFragmentObservation {
            fragment: FragmentIon {
                mz: 500.0,
                intensity,
                apex_scan: 10,
                charge: 1,
                parent_feature: FeatureId(0),
            },
            precursor_mz: 600.0,
            rt,
            rt_start: rt - 5.0,
            rt_end: rt + 5.0,
            precursor_charge: 2,
            start_scan: 5,
            end_scan: 15,
        }
    }

    #[test]
    fn add_fragment_recomputes_weighted_mean() {
        let mut consensus = MS2ConsensusSpectrum::new(ConsensusSettings::default());
        consensus.add_fragment(obs(100.0, 1.0));
        consensus.add_fragment(obs(200.0, 3.0));
        // weighted mean: (1*100 + 3*200) / 4 = 175
        assert!((consensus.rt() - 175.0).abs() < 1e-9);
    }

    #[test]
    fn remove_outliers_noop_on_single_fragment() {
        let mut consensus = MS2ConsensusSpectrum::new(ConsensusSettings::default());
        consensus.add_fragment(obs(100.0, 1.0));
        assert!(consensus.remove_outliers(OutlierDimension::Rt).is_ok());
        assert_eq!(consensus.len(), 1);
    }

    #[test]
    fn remove_outliers_errors_on_empty() {
        let mut consensus = MS2ConsensusSpectrum::new(ConsensusSettings::default());
        assert!(consensus.remove_outliers(OutlierDimension::Rt).is_err());
    }

    #[test]
    fn remove_outliers_rejects_far_extreme() {
        let mut consensus = MS2ConsensusSpectrum::new(ConsensusSettings::default());
        for rt in [100.0, 101.0, 99.0, 102.0, 500.0] {
            consensus.add_fragment(obs(rt, 1.0));
        }
        consensus.remove_outliers(OutlierDimension::Rt).unwrap();
        assert!(consensus.observations().iter().all(|o| o.rt < 200.0));
    }

    #[test]
    fn rt_window_contains_fragment_rts_for_uniform_window() {
        // Testable property (spec §8): |f.rt - object.rt| <= object.rt_end -
        // object.rt_start, demonstrated for observations sharing one window.
        let mut consensus = MS2ConsensusSpectrum::new(ConsensusSettings::default());
        consensus.add_fragment(obs(100.0, 1.0));
        consensus.add_fragment(obs(100.0, 1.0));
        for o in consensus.observations() {
            assert!((o.rt - consensus.rt()).abs() <= consensus.rt_end() - consensus.rt_start());
        }
    }

    #[test]
    fn find_fragment_delegates_to_store() {
        let mut consensus = MS2ConsensusSpectrum::new(ConsensusSettings::default());
        consensus.add_fragment(obs(100.0, 1.0));
        assert!(consensus.find_fragment(500.0).is_some());
        assert!(consensus.find_fragment(900.0).is_none());
    }
}
