//! An indexable, ppm-tolerant multimap of m/z -> fragment (spec §4.2, C2).

use ordered_float::OrderedFloat;
use pslp_core::entities::FeatureId;
use pslp_core::numeric::ppm_equal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thin_vec::ThinVec;

/// A single fragment ion observed for a feature, carrying its LC apex scan
/// so downstream consensus building (C4) can weight co-eluting evidence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FragmentIon {
    /// Fragment m/z.
    pub mz: f64,
    /// Fragment intensity.
    pub intensity: f64,
    /// Scan at which this fragment's LC apex was observed.
    pub apex_scan: u32,
    /// Fragment charge state.
    pub charge: i8,
    /// The feature this fragment was extracted from.
    pub parent_feature: FeatureId,
}

struct Entry {
    sequence: u64,
    fragment: FragmentIon,
}

/// An ordered multimap of m/z -> [`FragmentIon`], keyed so that a ppm-window
/// lookup is a `BTreeMap` range scan rather than a linear search. The
/// tolerance used by [`FragmentStore::find_near`] is carried by the call,
/// not the key, matching spec §3's "lookup tolerance is a ppm value carried
/// by the surrounding store, not by the key".
#[derive(Default)]
pub struct FragmentStore {
    by_mz: BTreeMap<OrderedFloat<f64>, ThinVec<Entry>>,
    next_sequence: u64,
}

impl FragmentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment, preserving insertion order for tie-breaking in
    /// [`FragmentStore::find_near`]. O(log n).
    pub fn insert(&mut self, fragment: FragmentIon) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.by_mz
            .entry(OrderedFloat(fragment.mz))
            .or_default()
            .push(Entry { sequence, fragment });
    }

    /// Number of fragments currently stored.
    pub fn len(&self) -> usize {
        self.by_mz.values().map(ThinVec::len).sum()
    }

    /// True if the store holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.by_mz.is_empty()
    }

    /// All fragments, in ascending m/z order (insertion order within a tied
    /// m/z bucket).
    pub fn iter(&self) -> impl Iterator<Item = &FragmentIon> {
        self.by_mz.values().flat_map(|bucket| bucket.iter().map(|e| &e.fragment))
    }

    /// The fragment minimising `|f.mz - mz|` among fragments that satisfy
    /// `ppm_equal(f.mz, mz, tol_ppm) AND ppm_equal(mz, f.mz, tol_ppm)` — both
    /// directions are checked because the tolerance is asymmetric (spec
    /// §4.2, GLOSSARY "ppm"). Ties are broken by lower insertion order.
    pub fn find_near(&self, mz: f64, tol_ppm: f64) -> Option<FragmentIon> {
        // A generous absolute window to bound the BTreeMap range scan; the
        // exact bidirectional ppm predicate below is what actually decides
        // membership, this bound only needs to be a superset.
        let half_window = mz.abs() * tol_ppm * 1e-6 * 2.0 + 1e-9;
        let lower = OrderedFloat(mz - half_window);
        let upper = OrderedFloat(mz + half_window);

        let mut best: Option<(&Entry, f64)> = None;
        for (_, bucket) in self.by_mz.range(lower..=upper) {
            for entry in bucket {
                let f = entry.fragment;
                if ppm_equal(f.mz, mz, tol_ppm) && ppm_equal(mz, f.mz, tol_ppm) {
                    let diff = (f.mz - mz).abs();
                    best = match best {
                        None => Some((entry, diff)),
                        Some((current, current_diff)) => {
                            if diff < current_diff
                                || (diff == current_diff && entry.sequence < current.sequence)
                            {
                                Some((entry, diff))
                            } else {
                                Some((current, current_diff))
                            }
                        }
                    };
                }
            }
        }
        best.map(|(entry, _)| entry.fragment)
    }

    /// Remove every fragment in `[precursor_mz - width, precursor_mz)`. An
    /// optional hook (default off, spec §4.2) used to strip isotope-loss
    /// satellite peaks around a precursor before consensus building.
    pub fn remove_isotope_loss_window(&mut self, precursor_mz: f64, width: f64) {
        let lower = OrderedFloat(precursor_mz - width);
        let upper = OrderedFloat(precursor_mz);
        let keys: Vec<OrderedFloat<f64>> = self.by_mz.range(lower..upper).map(|(k, _)| *k).collect();
        for key in keys {
            self.by_mz.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(mz: f64, intensity: f64) -> FragmentIon {
        FragmentIon {
            mz,
            intensity,
            apex_scan: 0,
            charge: 1,
            parent_feature: FeatureId(0),
        }
    }

    #[test]
    fn find_near_picks_closest_within_tolerance() {
        let mut store = FragmentStore::new();
        store.insert(frag(500.0001, 10.0));
        store.insert(frag(500.0003, 10.0));
        store.insert(frag(700.0, 10.0));
        let found = store.find_near(500.0, 10.0).unwrap();
        assert!((found.mz - 500.0001).abs() < 1e-9);
    }

    #[test]
    fn find_near_ties_broken_by_insertion_order() {
        let mut store = FragmentStore::new();
        store.insert(frag(500.0001, 10.0));
        store.insert(frag(499.9999, 20.0));
        let found = store.find_near(500.0, 10.0).unwrap();
        assert!((found.intensity - 10.0).abs() < 1e-9);
    }

    #[test]
    fn find_near_returns_none_outside_tolerance() {
        let mut store = FragmentStore::new();
        store.insert(frag(600.0, 10.0));
        assert!(store.find_near(500.0, 1.0).is_none());
    }

    #[test]
    fn remove_isotope_loss_window_removes_only_targeted_range() {
        let mut store = FragmentStore::new();
        store.insert(frag(498.0, 1.0));
        store.insert(frag(499.5, 1.0));
        store.insert(frag(500.0, 1.0));
        store.remove_isotope_loss_window(500.0, 2.0);
        let remaining: Vec<f64> = store.iter().map(|f| f.mz).collect();
        assert_eq!(remaining, vec![500.0]);
    }
}
