//! Target-window emission and file output (spec §4.10, §6, C10).
//!
//! Grounded on `InclusionExclusionList`'s three `writeTargets()` overloads
//! (FASTA+RT-model digestion source, `FeatureMap` source, and
//! `PeptideIdentification` source) and `writeToFile_`'s tab-separated,
//! 8-decimal output contract.

use pslp_core::entities::{Feature, Window};
use pslp_core::error::{PslpErrorKind, PslpResult};
use pslp_core::registry::ResidueTable;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::clustering::WeightedWindow;

/// Whether an RT window is expressed relative to the observed/predicted RT
/// (`rt ± rel * rt`) or as an absolute half-width (`rt ± abs`), per spec
/// §4.10.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RtWindowKind {
    Relative(f64),
    Absolute(f64),
}

fn rt_window(rt: f64, kind: RtWindowKind) -> (f64, f64) {
    match kind {
        RtWindowKind::Relative(rel) => (rt - rel * rt, rt + rel * rt),
        RtWindowKind::Absolute(abs) => (rt - abs, rt + abs),
    }
}

/// A single piece of evidence tying a peptide hit to a protein (spec §6
/// `PeptideIdentification`).
#[derive(Clone, Debug, PartialEq)]
pub struct Evidence {
    pub protein_accession: String,
    pub aa_before: char,
    pub aa_after: char,
}

/// One peptide-spectrum match (spec §6 `PeptideHit`).
#[derive(Clone, Debug, PartialEq)]
pub struct PeptideHit {
    pub score: f64,
    pub sequence: String,
    pub charge: i8,
    pub evidences: Vec<Evidence>,
}

/// An identified spectrum with experimental RT (spec §6
/// `PeptideIdentification`).
#[derive(Clone, Debug, PartialEq)]
pub struct PeptideIdentification {
    pub rt: f64,
    pub mz: Option<f64>,
    pub hits: Vec<PeptideHit>,
}

/// Emit one window per feature (spec §4.10 "feature-based" source),
/// weighted by the feature's own intensity.
pub fn windows_from_features(features: &[Feature], window: RtWindowKind) -> Vec<WeightedWindow> {
    features
        .iter()
        .map(|f| {
            let (rt_min, rt_max) = rt_window(f.rt, window);
            WeightedWindow {
                window: Window::new(f.mz, rt_min, rt_max),
                intensity: f.intensity,
            }
        })
        .collect()
}

/// Emit windows from digested sequences with RT predicted by `predict_rt`
/// (spec §4.10 "FASTA + RT model" source, spec §6 "RT predictor: pure
/// function `sequence -> rt`"), one window per `(sequence, charge)` pair.
pub fn windows_from_sequences(sequences: &[String], charges: &[i8], predict_rt: impl Fn(&str) -> f64, window: RtWindowKind, table: &ResidueTable) -> Vec<WeightedWindow> {
    let mut out = Vec::with_capacity(sequences.len() * charges.len());
    for sequence in sequences {
        let rt = predict_rt(sequence);
        let (rt_min, rt_max) = rt_window(rt, window);
        let neutral_mass = table.peptide_mass(sequence);
        for &charge in charges {
            let mz = table.mz_at_charge(neutral_mass, charge.unsigned_abs());
            out.push(WeightedWindow {
                window: Window::new(mz, rt_min, rt_max),
                intensity: 1.0,
            });
        }
    }
    out
}

/// Emit windows from identified peptides with experimental RT (spec §4.10
/// "peptide-IDs" source), one window per hit. Uses the identification's own
/// `mz` when present, else derives it from the hit's sequence and charge.
/// Hits are weighted by their score (floored at zero).
pub fn windows_from_identifications(identifications: &[PeptideIdentification], window: RtWindowKind, table: &ResidueTable) -> Vec<WeightedWindow> {
    let mut out = Vec::new();
    for identification in identifications {
        let (rt_min, rt_max) = rt_window(identification.rt, window);
        for hit in &identification.hits {
            let mz = identification.mz.unwrap_or_else(|| {
                let neutral_mass = table.peptide_mass(&hit.sequence);
                table.mz_at_charge(neutral_mass, hit.charge.unsigned_abs())
            });
            out.push(WeightedWindow {
                window: Window::new(mz, rt_min, rt_max),
                intensity: hit.score.max(0.0),
            });
        }
    }
    out
}

/// The time unit an inclusion-list file is written in (spec §6, caller's
/// choice).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
}

fn minutes_factor(unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::Seconds => 1.0,
        TimeUnit::Minutes => 1.0 / 60.0,
    }
}

/// Render `windows` as tab-separated `mz \t rt_min \t rt_max` lines, 8
/// decimal places, in `unit` (spec §6 "Inclusion-list file").
pub fn format_targets(windows: &[Window], unit: TimeUnit) -> String {
    let factor = minutes_factor(unit);
    let mut out = String::new();
    for w in windows {
        let _ = writeln!(out, "{:.8}\t{:.8}\t{:.8}", w.mz, w.rt_min * factor, w.rt_max * factor);
    }
    out
}

/// Write `windows` to `path` via [`format_targets`].
///
/// # Errors
/// [`PslpErrorKind::Io`] if the file cannot be written.
pub fn write_targets(path: &Path, windows: &[Window], unit: TimeUnit) -> PslpResult<()> {
    std::fs::write(path, format_targets(windows, unit)).map_err(|e| context_error::BoxedError::small(PslpErrorKind::Io, "io failure", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_window_scales_with_rt() {
        let (lo, hi) = rt_window(100.0, RtWindowKind::Relative(0.1));
        assert!((lo - 90.0).abs() < 1e-9);
        assert!((hi - 110.0).abs() < 1e-9);
    }

    #[test]
    fn absolute_window_is_constant_width() {
        let (lo, hi) = rt_window(100.0, RtWindowKind::Absolute(5.0));
        assert!((lo - 95.0).abs() < 1e-9);
        assert!((hi - 105.0).abs() < 1e-9);
    }

    #[test]
    fn format_targets_uses_eight_decimals_and_tabs() {
        let windows = vec![Window::new(500.123_456_789, 10.0, 20.0)];
        let text = format_targets(&windows, TimeUnit::Seconds);
        assert_eq!(text, "500.12345679\t10.00000000\t20.00000000\n");
    }

    #[test]
    fn minutes_unit_divides_by_sixty() {
        let windows = vec![Window::new(500.0, 60.0, 120.0)];
        let text = format_targets(&windows, TimeUnit::Minutes);
        assert!(text.starts_with("500.00000000\t1.00000000\t2.00000000"));
    }

    #[test]
    fn sequence_source_computes_mz_per_charge() {
        let table = ResidueTable::standard();
        let windows = windows_from_sequences(&["PEPTIDE".to_string()], &[1, 2], |_| 100.0, RtWindowKind::Absolute(1.0), &table);
        assert_eq!(windows.len(), 2);
        assert!(windows[0].window.mz > windows[1].window.mz);
    }
}
