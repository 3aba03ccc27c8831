//! The RT-alignment algorithm proper (spec §4.5): per-run median tables,
//! reference choice, and per-run piecewise-linear [`Transform`]s with an
//! outlier guard.

use crate::transform::Transform;
use itertools::{Itertools, MinMaxResult};
use pslp_core::diagnostics::Diagnostics;
use pslp_core::numeric::median;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An opaque molecule key: the modified peptide sequence, optionally
/// annotated with an adduct (`"name+[adduct]"`), spec §3 `IDMolecule`.
pub type IdMolecule = String;

/// A single RT observation for one molecule within one replicate
/// acquisition (spec §3 `RTObservation`).
#[derive(Clone, Debug, PartialEq)]
pub struct RtObservation {
    /// The molecule this observation identifies.
    pub molecule: IdMolecule,
    /// Observed retention time.
    pub rt: f64,
    /// Identification confidence score, higher is better, if available.
    pub score: Option<f64>,
}

/// One replicate acquisition's worth of observations.
pub type Replicate = Vec<RtObservation>;

/// One LC-MS run, potentially assembled from several replicate acquisitions
/// that were pooled before alignment (spec §4.5 step 1/2: step 1's
/// per-molecule "keep at most one observation" dedup runs *within* a
/// replicate; step 2's "list of RTs observed in that run, across
/// replicates" is exactly the per-replicate results collected here — see
/// the Open Question note in `DESIGN.md`).
pub type Run = Vec<Replicate>;

/// Tunable knobs for [`align_runs`] (spec §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSettings {
    /// Minimum number of runs a molecule must be observed in to contribute
    /// to the reference (and, when no explicit reference run is given, to
    /// survive into `median_per_seq`).
    pub min_run_occur: usize,
    /// Maximum allowed deviation between a run's per-molecule RT and the
    /// reference RT. A value `> 1.0` is an absolute RT unit; a value in
    /// `(0.0, 1.0]` is a fraction of the reference RT range; `<= 0.0`
    /// disables the filter entirely (spec §4.5 step 6, §8 scenario 2).
    pub max_rt_shift: f64,
    /// If set, use this run's median table as the reference instead of the
    /// median of per-run medians.
    pub reference_run: Option<usize>,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            min_run_occur: 1,
            max_rt_shift: 0.0,
            reference_run: None,
        }
    }
}

fn pick_best_per_molecule(replicate: &Replicate) -> BTreeMap<IdMolecule, f64> {
    let mut best: BTreeMap<IdMolecule, (f64, Option<f64>)> = BTreeMap::new();
    for obs in replicate {
        best.entry(obs.molecule.clone())
            .and_modify(|existing| {
                let replace = match (obs.score, existing.1) {
                    (Some(new_score), Some(current_score)) => new_score > current_score,
                    (Some(_), None) => true,
                    _ => false,
                };
                if replace {
                    *existing = (obs.rt, obs.score);
                }
            })
            .or_insert((obs.rt, obs.score));
    }
    best.into_iter().map(|(molecule, (rt, _))| (molecule, rt)).collect()
}

fn seq_to_list(run: &Run) -> BTreeMap<IdMolecule, Vec<f64>> {
    let mut lists: BTreeMap<IdMolecule, Vec<f64>> = BTreeMap::new();
    for replicate in run {
        for (molecule, rt) in pick_best_per_molecule(replicate) {
            lists.entry(molecule).or_default().push(rt);
        }
    }
    lists
}

fn median_per_run(run: &Run) -> BTreeMap<IdMolecule, f64> {
    seq_to_list(run)
        .into_iter()
        .map(|(molecule, rts)| {
            let m = median(&rts, false).expect("non-empty by construction");
            (molecule, m)
        })
        .collect()
}

fn rt_range(values: impl Iterator<Item = f64>) -> f64 {
    match values.minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)) {
        MinMaxResult::NoElements => 0.0,
        MinMaxResult::OneElement(_) => 0.0,
        MinMaxResult::MinMax(lo, hi) => hi - lo,
    }
}

/// Align `runs`' RT coordinates to a common reference (spec §4.5, C5).
///
/// Returns one [`Transform`] per run, in input order. Degenerate inputs
/// degrade to [`Transform::identity`] rather than failing (spec: "no hard
/// failures"); `diagnostics` records the warnings the original emits for
/// those cases.
pub fn align_runs(runs: &[Run], settings: &AlignmentSettings, diagnostics: &mut Diagnostics) -> Vec<Transform> {
    if runs.is_empty() {
        return Vec::new();
    }
    if settings.min_run_occur > runs.len() {
        diagnostics.warn(format!(
            "min_run_occur ({}) exceeds the number of runs ({})",
            settings.min_run_occur,
            runs.len()
        ));
    }

    let per_run_medians: Vec<BTreeMap<IdMolecule, f64>> = runs.iter().map(median_per_run).collect();

    // median_per_seq: molecule -> one median RT per run that observed it.
    let mut median_per_seq: BTreeMap<IdMolecule, Vec<f64>> = BTreeMap::new();
    for table in &per_run_medians {
        for (molecule, &rt) in table {
            median_per_seq.entry(molecule.clone()).or_default().push(rt);
        }
    }

    let reference: BTreeMap<IdMolecule, f64> = match settings.reference_run {
        Some(idx) if idx < per_run_medians.len() => per_run_medians[idx]
            .iter()
            .filter(|(molecule, _)| {
                median_per_seq
                    .get(*molecule)
                    .is_some_and(|occurrences| occurrences.len() >= settings.min_run_occur)
            })
            .map(|(m, &rt)| (m.clone(), rt))
            .collect(),
        _ => median_per_seq
            .iter()
            .filter(|(_, occurrences)| occurrences.len() >= settings.min_run_occur)
            .map(|(molecule, occurrences)| {
                let m = median(occurrences, false).expect("non-empty by construction");
                (molecule.clone(), m)
            })
            .collect(),
    };

    if reference.is_empty() {
        diagnostics.warn("RT alignment reference table is empty after filtering");
        return runs.iter().map(|_| Transform::identity()).collect();
    }

    let max_shift = if settings.max_rt_shift <= 0.0 {
        f64::INFINITY
    } else if settings.max_rt_shift > 1.0 {
        settings.max_rt_shift
    } else {
        settings.max_rt_shift * rt_range(reference.values().copied())
    };

    per_run_medians
        .iter()
        .map(|run_medians| {
            let mut points = Vec::new();
            let mut rejected = 0usize;
            for (molecule, &rt_run) in run_medians {
                if let Some(&rt_ref) = reference.get(molecule) {
                    if (rt_run - rt_ref).abs() <= max_shift {
                        points.push((rt_run, rt_ref, 1.0));
                    } else {
                        rejected += 1;
                    }
                }
            }
            if rejected > 0 {
                diagnostics.info(format!("RT alignment rejected {rejected} outlier molecule(s) beyond max_rt_shift"));
            }
            if points.is_empty() {
                diagnostics.warn("RT alignment run has no surviving reference intersection, falling back to identity");
                Transform::identity()
            } else {
                Transform::piecewise_linear(points)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(molecule: &str, rt: f64) -> RtObservation {
        RtObservation {
            molecule: molecule.to_string(),
            rt,
            score: None,
        }
    }

    #[test]
    fn identical_runs_produce_identity_like_transforms() {
        let run_a: Run = vec![vec![obs("PEPTIDE", 100.0), obs("ELVIS", 200.0)]];
        let run_b = run_a.clone();
        let settings = AlignmentSettings {
            min_run_occur: 2,
            ..AlignmentSettings::default()
        };
        let mut diag = Diagnostics::new();
        let transforms = align_runs(&[run_a, run_b], &settings, &mut diag);
        assert_eq!(transforms.len(), 2);
        for t in &transforms {
            assert_eq!(t.points().len(), 2);
            assert!((t.apply(100.0) - 100.0).abs() < 1e-9);
            assert!((t.apply(200.0) - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn shifted_run_aligns_to_median_of_medians() {
        let run_a: Run = vec![vec![obs("PEPTIDE", 100.0), obs("ELVIS", 200.0)]];
        let run_b: Run = vec![vec![obs("PEPTIDE", 110.0), obs("ELVIS", 210.0)]];
        let settings = AlignmentSettings {
            min_run_occur: 2,
            max_rt_shift: 0.0,
            reference_run: None,
        };
        let mut diag = Diagnostics::new();
        let transforms = align_runs(&[run_a, run_b], &settings, &mut diag);
        assert!((transforms[0].apply(100.0) - 105.0).abs() < 1e-9);
        assert!((transforms[0].apply(200.0) - 205.0).abs() < 1e-9);
        assert!((transforms[1].apply(110.0) - 105.0).abs() < 1e-9);
        assert!((transforms[1].apply(210.0) - 205.0).abs() < 1e-9);
    }

    #[test]
    fn empty_runs_input_returns_empty_transforms() {
        let mut diag = Diagnostics::new();
        assert!(align_runs(&[], &AlignmentSettings::default(), &mut diag).is_empty());
    }

    #[test]
    fn min_run_occur_above_run_count_warns() {
        let run_a: Run = vec![vec![obs("PEPTIDE", 100.0)]];
        let settings = AlignmentSettings {
            min_run_occur: 5,
            ..AlignmentSettings::default()
        };
        let mut diag = Diagnostics::new();
        align_runs(&[run_a], &settings, &mut diag);
        assert!(!diag.is_clean());
    }

    #[test]
    fn outlier_beyond_max_shift_is_rejected() {
        let run_a: Run = vec![vec![obs("A", 100.0), obs("B", 200.0)]];
        let run_b: Run = vec![vec![obs("A", 100.5), obs("B", 500.0)]];
        let settings = AlignmentSettings {
            min_run_occur: 1,
            max_rt_shift: 5.0,
            reference_run: Some(0),
        };
        let mut diag = Diagnostics::new();
        let transforms = align_runs(&[run_a, run_b], &settings, &mut diag);
        // run_b's "B" (500 vs reference 200) exceeds max_rt_shift and is dropped.
        assert_eq!(transforms[1].points().len(), 1);
    }
}
