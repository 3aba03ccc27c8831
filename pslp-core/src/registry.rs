//! The residue/modification catalogue: a process-wide, immutable table
//! seeded once at construction and never mutated afterwards (spec §5, §9:
//! "Process-wide singletons ... model as explicit registries passed by
//! shared ownership into each component constructor").
//!
//! Grounded on `mzcv::CVIndex`'s init-once, `Arc`-shared registry pattern.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Monoisotopic residue masses for the twenty standard amino acids, in
/// Daltons. Grounded on the standard values used throughout the teacher
/// workspace's chemistry tables.
const STANDARD_RESIDUES: &[(char, f64)] = &[
    ('G', 57.021_464),
    ('A', 71.037_114),
    ('S', 87.032_028),
    ('P', 97.052_764),
    ('V', 99.068_414),
    ('T', 101.047_679),
    ('C', 103.009_185),
    ('L', 113.084_064),
    ('I', 113.084_064),
    ('N', 114.042_927),
    ('D', 115.026_943),
    ('Q', 128.058_578),
    ('K', 128.094_963),
    ('E', 129.042_593),
    ('M', 131.040_485),
    ('H', 137.058_912),
    ('F', 147.068_414),
    ('R', 156.101_111),
    ('Y', 163.063_329),
    ('W', 186.079_313),
];

/// Water's monoisotopic mass, added to a residue-mass sum to get a peptide's
/// neutral monoisotopic mass.
pub const WATER_MASS: f64 = 18.010_565;

/// Mass of a single proton, used to convert a neutral mass to m/z at a given
/// charge.
pub const PROTON_MASS: f64 = 1.007_276;

/// A fixed or variable modification's mass delta, keyed by a catalogue name
/// matching spec §3's "catalogue keys matching the residue/modification
/// table".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModificationDelta {
    /// Mass offset in Daltons, added to the residue it decorates.
    pub delta_mass: f64,
}

/// The read-only residue/modification catalogue. Build once with
/// [`ResidueTable::standard`] and share the result via `Arc` into every
/// component that needs residue masses (tagger, decoy generator, target-list
/// m/z computation).
#[derive(Clone, Debug)]
pub struct ResidueTable {
    residues: BTreeMap<char, f64>,
    modifications: BTreeMap<String, ModificationDelta>,
}

impl ResidueTable {
    /// The standard twenty-amino-acid table with no modifications
    /// registered, wrapped in an `Arc` for cheap sharing.
    pub fn standard() -> Arc<Self> {
        Arc::new(Self {
            residues: STANDARD_RESIDUES.iter().copied().collect(),
            modifications: BTreeMap::new(),
        })
    }

    /// Build a table with additional (or overriding) modification entries.
    /// Still immutable once returned — there is no setter, only this
    /// constructor.
    pub fn with_modifications(mods: impl IntoIterator<Item = (String, ModificationDelta)>) -> Arc<Self> {
        Arc::new(Self {
            residues: STANDARD_RESIDUES.iter().copied().collect(),
            modifications: mods.into_iter().collect(),
        })
    }

    /// Monoisotopic mass of a single residue, or `None` for an unknown
    /// one-letter code.
    pub fn residue_mass(&self, residue: char) -> Option<f64> {
        self.residues.get(&residue.to_ascii_uppercase()).copied()
    }

    /// The mass delta registered for a named modification, or `None`.
    pub fn modification_delta(&self, name: &str) -> Option<f64> {
        self.modifications.get(name).map(|m| m.delta_mass)
    }

    /// All registered one-letter residue codes and their monoisotopic
    /// masses, in ascending code order. Used by the tagger (C6) to build the
    /// set of candidate mass-ladder edges.
    pub fn residues(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.residues.iter().map(|(&c, &m)| (c, m))
    }

    /// All registered modification catalogue keys and their mass deltas, in
    /// ascending key order.
    pub fn modifications(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.modifications.iter().map(|(k, m)| (k.as_str(), m.delta_mass))
    }

    /// Monoisotopic neutral mass of a full (unmodified) peptide sequence.
    /// Unknown residues contribute zero mass.
    pub fn peptide_mass(&self, sequence: &str) -> f64 {
        sequence
            .chars()
            .map(|c| self.residue_mass(c).unwrap_or(0.0))
            .sum::<f64>()
            + WATER_MASS
    }

    /// m/z of a peptide at the given charge, from its monoisotopic neutral
    /// mass: `(mass + charge * proton_mass) / charge`.
    pub fn mz_at_charge(&self, neutral_mass: f64, charge: u8) -> f64 {
        let z = f64::from(charge.max(1));
        (neutral_mass + z * PROTON_MASS) / z
    }

    /// True if a residue boundary at `before | after` is a tryptic site:
    /// `before` is `K` or `R` and `after` is not `P` (GLOSSARY: Tryptic).
    pub fn is_tryptic_site(before: char, after: char) -> bool {
        matches!(before.to_ascii_uppercase(), 'K' | 'R') && after.to_ascii_uppercase() != 'P'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peptide_mass_matches_residue_sum_plus_water() {
        let table = ResidueTable::standard();
        let mass = table.peptide_mass("GA");
        let expected = table.residue_mass('G').unwrap() + table.residue_mass('A').unwrap() + WATER_MASS;
        assert!((mass - expected).abs() < 1e-9);
    }

    #[test]
    fn tryptic_site_rule() {
        assert!(ResidueTable::is_tryptic_site('K', 'A'));
        assert!(ResidueTable::is_tryptic_site('R', 'A'));
        assert!(!ResidueTable::is_tryptic_site('K', 'P'));
        assert!(!ResidueTable::is_tryptic_site('A', 'A'));
    }

    #[test]
    fn unknown_residue_is_none() {
        let table = ResidueTable::standard();
        assert!(table.residue_mass('X').is_none());
    }
}
