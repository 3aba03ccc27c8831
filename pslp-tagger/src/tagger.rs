//! Peptide-tag enumeration from an observed peak ladder (spec §4.6).
//!
//! Re-purposes the mass-ladder-walk idea behind
//! `mzcore::isobaric_sets::building_blocks` (there used to generate isobaric
//! peptide sequences from a target mass; here used to walk *observed* peaks
//! and report every residue-mass ladder they support).

use pslp_core::numeric::ppm_equal_either_direction;
use pslp_core::registry::ResidueTable;
use serde::{Deserialize, Serialize};

/// Tunable knobs for [`enumerate_tags`] (spec §4.6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggerSettings {
    /// Minimum tag length (number of residues), inclusive.
    pub min_tag_len: usize,
    /// Maximum tag length (number of residues), inclusive.
    pub max_tag_len: usize,
    /// Minimum fragment charge considered when converting m/z differences to
    /// neutral mass differences.
    pub min_charge: u8,
    /// Maximum fragment charge considered.
    pub max_charge: u8,
    /// ppm tolerance for matching a peak-to-peak mass difference against a
    /// residue (or modified-residue) mass.
    pub fragment_mz_tolerance_ppm: f64,
    /// Catalogue keys for modifications that are always available as
    /// supplementary ladder-edge masses.
    pub fixed_modifications: Vec<String>,
    /// Catalogue keys for modifications that may optionally appear,
    /// multiplying the number of possible walks (spec §4.6).
    pub variable_modifications: Vec<String>,
}

impl Default for TaggerSettings {
    fn default() -> Self {
        Self {
            min_tag_len: 2,
            max_tag_len: 4,
            min_charge: 1,
            max_charge: 1,
            fragment_mz_tolerance_ppm: 20.0,
            fixed_modifications: Vec::new(),
            variable_modifications: Vec::new(),
        }
    }
}

/// A candidate ladder edge: a residue (or modified-residue) label and the
/// neutral mass it corresponds to.
struct LadderEdge {
    label: String,
    mass: f64,
}

fn candidate_edges(table: &ResidueTable, settings: &TaggerSettings) -> Vec<LadderEdge> {
    let mut edges: Vec<LadderEdge> = table
        .residues()
        .map(|(residue, mass)| LadderEdge {
            label: residue.to_string(),
            mass,
        })
        .collect();
    for name in settings.fixed_modifications.iter().chain(&settings.variable_modifications) {
        if let Some(mass) = table.modification_delta(name) {
            edges.push(LadderEdge {
                label: format!("[{name}]"),
                mass,
            });
        }
    }
    edges
}

/// Directed edges of the peak-ladder graph: `edges[i]` lists every `(j,
/// label)` such that `j > i` and the mass difference between peaks `i` and
/// `j` (scaled to a neutral mass at the given charge) matches a candidate
/// ladder edge within tolerance.
fn build_graph(peaks: &[f64], charge: u8, candidates: &[LadderEdge], tolerance_ppm: f64) -> Vec<Vec<(usize, String)>> {
    let z = f64::from(charge.max(1));
    let n = peaks.len();
    let mut edges = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let delta_mass = (peaks[j] - peaks[i]) * z;
            if delta_mass <= 0.0 {
                continue;
            }
            for candidate in candidates {
                if ppm_equal_either_direction(candidate.mass, delta_mass, tolerance_ppm) {
                    edges[i].push((j, candidate.label.clone()));
                }
            }
        }
    }
    edges
}

#[allow(clippy::too_many_arguments)]
fn walk(
    node: usize,
    edges: &[Vec<(usize, String)>],
    path: &mut String,
    depth: usize,
    min_len: usize,
    max_len: usize,
    out: &mut Vec<String>,
) {
    if depth >= max_len {
        return;
    }
    for (next, label) in &edges[node] {
        let pushed = label.len();
        path.push_str(label);
        let new_depth = depth + 1;
        if new_depth >= min_len {
            out.push(path.clone());
        }
        walk(*next, edges, path, new_depth, min_len, max_len, out);
        path.truncate(path.len() - pushed);
    }
}

/// Enumerate every mass-ladder tag supported by `peaks` (spec §4.6, C6).
///
/// A tag is emitted *each time* a walk through the peak list yields a valid
/// mass ladder of length in `[min_tag_len, max_tag_len]`; duplicate tags
/// therefore count with multiplicity, matching downstream scoring that
/// consumes this as a multiset. `peaks` must already be sorted ascending.
pub fn enumerate_tags(peaks: &[f64], table: &ResidueTable, settings: &TaggerSettings) -> Vec<String> {
    let candidates = candidate_edges(table, settings);
    let mut tags = Vec::new();
    for charge in settings.min_charge..=settings.max_charge.max(settings.min_charge) {
        let graph = build_graph(peaks, charge, &candidates, settings.fragment_mz_tolerance_ppm);
        for start in 0..peaks.len() {
            let mut path = String::new();
            walk(start, &graph, &mut path, 0, settings.min_tag_len, settings.max_tag_len, &mut tags);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    /// b-ion-style ladder for "TEST": peaks at the cumulative residue mass
    /// plus a constant offset (standing in for a b-ion series' shared
    /// N-terminal fragment mass).
    fn test_ladder(table: &ResidueTable) -> Vec<f64> {
        let residues = ['T', 'E', 'S', 'T'];
        let mut mz = 1.0;
        let mut peaks = vec![mz];
        for r in residues {
            mz += table.residue_mass(r).unwrap();
            peaks.push(mz);
        }
        peaks
    }

    #[test]
    fn enumerates_overlapping_tags_of_bounded_length() {
        let table = ResidueTable::standard();
        let peaks = test_ladder(&table);
        let settings = TaggerSettings {
            min_tag_len: 2,
            max_tag_len: 3,
            min_charge: 1,
            max_charge: 1,
            fragment_mz_tolerance_ppm: 5.0,
            ..TaggerSettings::default()
        };
        let tags = enumerate_tags(&peaks, &table, &settings);
        for expected in ["TE", "ES", "ST", "TES", "EST"] {
            assert!(tags.iter().any(|t| t == expected), "missing tag {expected}, got {tags:?}");
        }
        assert!(!tags.iter().any(|t| t == "TEST"));
    }

    #[test]
    fn no_peaks_yields_no_tags() {
        let table = ResidueTable::standard();
        let settings = TaggerSettings::default();
        assert!(enumerate_tags(&[], &table, &settings).is_empty());
    }
}
