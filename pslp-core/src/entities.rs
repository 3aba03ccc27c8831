//! The small set of entities most other crates in the workspace reference
//! (spec §3). These are plain, serializable data types with no behaviour
//! beyond what their invariants require; they are owned read-only by the core
//! once constructed (spec §3: "Created by upstream feature-finder; consumed
//! read-only by core").

use serde::{Deserialize, Serialize};

/// A single `(mz, intensity)` pair. Immutable after creation; it has no
/// identity beyond its position within a [`Spectrum`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Mass-to-charge ratio.
    pub mz: f64,
    /// Signal intensity.
    pub intensity: f64,
}

impl Peak {
    /// Construct a new peak.
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self { mz, intensity }
    }
}

/// Instrument ionisation polarity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Polarity {
    /// Positive-mode ionisation.
    Positive,
    /// Negative-mode ionisation.
    Negative,
    /// Unknown or not recorded.
    Unknown,
}

/// A precursor ion selected for MS2 fragmentation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Precursor {
    /// Precursor m/z.
    pub mz: f64,
    /// Signed charge state.
    pub charge: i8,
    /// Lower bound of the isolation window.
    pub isolation_lower: f64,
    /// Upper bound of the isolation window.
    pub isolation_upper: f64,
}

/// An ordered sequence of [`Peak`]s with acquisition metadata.
///
/// Invariant: `peaks` is sorted ascending by `mz`; every constructor and
/// mutator of this type re-establishes that invariant before returning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    peaks: Vec<Peak>,
    /// Retention time this spectrum was recorded at.
    pub rt: f64,
    /// MS level (1 for survey scans, 2 for fragmentation scans, …).
    pub ms_level: u8,
    /// Precursors this spectrum was generated from (empty for MS1).
    pub precursors: Vec<Precursor>,
    /// Instrument ionisation polarity.
    pub polarity: Polarity,
}

impl Spectrum {
    /// Build a spectrum from an unsorted peak list, sorting it by `mz`.
    pub fn new(mut peaks: Vec<Peak>, rt: f64, ms_level: u8, precursors: Vec<Precursor>, polarity: Polarity) -> Self {
        peaks.sort_by(|a, b| a.mz.partial_cmp(&b.mz).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            peaks,
            rt,
            ms_level,
            precursors,
            polarity,
        }
    }

    /// The spectrum's peaks, guaranteed sorted ascending by `mz`.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }
}

/// Stable identifier for a [`Feature`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

/// A 2-D (RT x m/z) peak produced by an upstream feature-finder. Created
/// externally (spec §6) and consumed read-only by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable identifier.
    pub id: FeatureId,
    /// Apex m/z.
    pub mz: f64,
    /// Apex retention time.
    pub rt: f64,
    /// Apex intensity.
    pub intensity: f64,
    /// Charge state.
    pub charge: i8,
    /// Convex hull(s) in the (rt, mz) plane, one polygon per mass trace.
    pub convex_hull: Vec<Vec<(f64, f64)>>,
}

/// A single `(mz, rt_min, rt_max)` target window (spec §3, §4.10).
///
/// Invariant: `rt_min <= rt_max`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Target m/z.
    pub mz: f64,
    /// Window start (inclusive).
    pub rt_min: f64,
    /// Window end (inclusive).
    pub rt_max: f64,
}

impl Window {
    /// Construct a window, swapping `rt_min`/`rt_max` if given out of order
    /// so the invariant always holds.
    pub fn new(mz: f64, rt_min: f64, rt_max: f64) -> Self {
        let (rt_min, rt_max) = if rt_min <= rt_max {
            (rt_min, rt_max)
        } else {
            (rt_max, rt_min)
        };
        Self { mz, rt_min, rt_max }
    }

    /// True if `self` and `other`'s RT ranges overlap within `rt_tol`
    /// seconds.
    pub fn rt_overlaps(&self, other: &Window, rt_tol: f64) -> bool {
        self.rt_min - rt_tol <= other.rt_max && other.rt_min - rt_tol <= self.rt_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_sorts_peaks_on_construction() {
        let s = Spectrum::new(
            vec![Peak::new(300.0, 1.0), Peak::new(100.0, 2.0), Peak::new(200.0, 3.0)],
            12.0,
            1,
            vec![],
            Polarity::Positive,
        );
        let mzs: Vec<f64> = s.peaks().iter().map(|p| p.mz).collect();
        assert_eq!(mzs, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn window_normalises_inverted_bounds() {
        let w = Window::new(500.0, 20.0, 10.0);
        assert!(w.rt_min <= w.rt_max);
    }

    #[test]
    fn window_overlap_within_tolerance() {
        let a = Window::new(500.0, 10.0, 20.0);
        let b = Window::new(500.0, 20.5, 30.0);
        assert!(!a.rt_overlaps(&b, 0.1));
        assert!(a.rt_overlaps(&b, 1.0));
    }

    #[test]
    fn feature_round_trips_through_json() {
        // Exercises the `Serialize`/`Deserialize` derives every entity here
        // carries (spec's config section: "callers may load them from any
        // format of their choosing").
        let feature = Feature {
            id: FeatureId(7),
            mz: 500.25,
            rt: 123.4,
            intensity: 9001.0,
            charge: 2,
            convex_hull: vec![vec![(100.0, 499.0), (150.0, 501.0)]],
        };
        let json = serde_json::to_string(&feature).unwrap();
        let round_tripped: Feature = serde_json::from_str(&json).unwrap();
        assert_eq!(feature, round_tripped);
    }
}
