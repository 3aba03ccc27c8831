//! Reverse, pseudo-reverse and shuffle decoy generation for a single
//! modified peptide (spec §4.7, C7). Grounded on `mzident/src/formats/fasta.rs`
//! for the modified-sequence shape and `mzcore/src/rand.rs` for threading an
//! injected `rand::Rng` instead of reading module-global RNG state.

use pslp_core::registry::ResidueTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A single modification pinned to a zero-based residue position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionedModification {
    pub location: usize,
    pub delta_mass: f64,
}

/// A peptide sequence plus its positioned modifications, the unit every
/// decoy strategy below operates on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSequence {
    pub sequence: String,
    pub modifications: Vec<PositionedModification>,
}

impl AnnotatedSequence {
    pub fn new(sequence: impl Into<String>, modifications: Vec<PositionedModification>) -> Self {
        Self { sequence: sequence.into(), modifications }
    }

    pub fn unmodified(sequence: impl Into<String>) -> Self {
        Self::new(sequence, Vec::new())
    }

    fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    /// Build a new annotated sequence from a permuted character vector and a
    /// mapping from each original position to its position in the permuted
    /// output; modifications are relocated along with the residue they were
    /// attached to.
    fn remapped(&self, permuted: &[char], new_pos_of_old: &[usize]) -> Self {
        let modifications = self
            .modifications
            .iter()
            .map(|m| PositionedModification {
                location: new_pos_of_old.get(m.location).copied().unwrap_or(m.location),
                delta_mass: m.delta_mass,
            })
            .collect();
        Self {
            sequence: permuted.iter().collect(),
            modifications,
        }
    }
}

/// Full reverse: residue order is flipped end to end, `location=k` moves to
/// `len-1-k`. Reversing twice restores the original sequence (§8 invariant).
pub fn reverse(seq: &AnnotatedSequence) -> AnnotatedSequence {
    let chars: Vec<char> = seq.sequence.chars().collect();
    let n = chars.len();
    let permuted: Vec<char> = chars.iter().rev().copied().collect();
    let new_pos_of_old: Vec<usize> = (0..n).map(|old| n - 1 - old).collect();
    seq.remapped(&permuted, &new_pos_of_old)
}

/// Pseudo-reverse: the C-terminal residue stays fixed in place, everything
/// before it is reversed. Grounded on the original `MRMDecoy::pseudoreversePeptide`
/// behaviour (verified against `"TESTPEPTIDE" -> "DITPEPTSETE"`), which keeps
/// the terminus fixed rather than reversing the whole sequence.
pub fn pseudo_reverse(seq: &AnnotatedSequence) -> AnnotatedSequence {
    let chars: Vec<char> = seq.sequence.chars().collect();
    let n = chars.len();
    if n <= 1 {
        return seq.clone();
    }
    let mut permuted = chars.clone();
    permuted[..n - 1].reverse();
    let mut new_pos_of_old: Vec<usize> = (0..n).collect();
    for (old, slot) in new_pos_of_old.iter_mut().enumerate().take(n - 1) {
        *slot = n - 2 - old;
    }
    seq.remapped(&permuted, &new_pos_of_old)
}

/// Position-wise sequence identity: the fraction of positions at which two
/// equal-length sequences carry the same residue. Matches the original
/// `MRMDecoy::AASequenceIdentity` definition (not an alignment score).
pub fn sequence_identity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

/// Tunable knobs for [`shuffle`] (spec §4.7).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShuffleSettings {
    /// Re-shuffle while the decoy's identity against the target exceeds this
    /// fraction.
    pub identity_threshold: f64,
    /// Number of Fisher-Yates attempts before falling back to a forced
    /// single-residue mutation.
    pub max_attempts: u32,
    /// Seed for the injected RNG; a fixed default makes identical inputs
    /// produce identical decoys across runs.
    pub seed: u64,
    /// Positions that must keep their original residue through shuffling.
    /// Shorter than the sequence is padded with `false` (free to shuffle);
    /// longer is truncated.
    pub non_shuffle_pattern: Vec<bool>,
}

impl Default for ShuffleSettings {
    fn default() -> Self {
        Self {
            identity_threshold: 0.5,
            max_attempts: 10,
            seed: 0x7357_5eed,
            non_shuffle_pattern: Vec::new(),
        }
    }
}

impl ShuffleSettings {
    fn fixed_mask(&self, len: usize) -> Vec<bool> {
        (0..len).map(|i| self.non_shuffle_pattern.get(i).copied().unwrap_or(false)).collect()
    }
}

fn fisher_yates_indices(indices: &mut [usize], rng: &mut impl Rng) {
    for i in (1..indices.len()).rev() {
        let j = rng.random_range(0..=i);
        indices.swap(i, j);
    }
}

/// Fisher-Yates shuffle with a fixed-seed injected RNG (spec §4.7, §9 "RNG
/// from module state"); positions marked in `settings.non_shuffle_pattern`
/// never move. After each attempt the position-wise identity against the
/// target is computed; if it still exceeds `identity_threshold`, the shuffle
/// is retried up to `max_attempts` times. On exhaustion one movable residue
/// is mutated in place (its replacement drawn from `table`'s residue
/// alphabet) and the result is accepted unconditionally.
pub fn shuffle(seq: &AnnotatedSequence, table: &ResidueTable, settings: &ShuffleSettings) -> AnnotatedSequence {
    let chars: Vec<char> = seq.sequence.chars().collect();
    let n = chars.len();
    let fixed = settings.fixed_mask(n);
    let movable: Vec<usize> = (0..n).filter(|&i| !fixed[i]).collect();
    let mut rng = StdRng::seed_from_u64(settings.seed);

    if movable.len() < 2 {
        return seq.clone();
    }

    let mut last_candidate = chars.clone();
    let mut last_new_pos_of_old: Vec<usize> = (0..n).collect();

    for _ in 0..settings.max_attempts.max(1) {
        let mut perm = movable.clone();
        fisher_yates_indices(&mut perm, &mut rng);

        let mut candidate = chars.clone();
        let mut new_pos_of_old: Vec<usize> = (0..n).collect();
        for (slot, &origin) in movable.iter().zip(perm.iter()) {
            candidate[*slot] = chars[origin];
            new_pos_of_old[origin] = *slot;
        }

        let candidate_seq: String = candidate.iter().collect();
        last_candidate = candidate;
        last_new_pos_of_old = new_pos_of_old;
        if sequence_identity(&seq.sequence, &candidate_seq) <= settings.identity_threshold {
            return seq.remapped(&last_candidate, &last_new_pos_of_old);
        }
    }

    let mutate_at = movable[0];
    let current = last_candidate[mutate_at];
    let alphabet: Vec<char> = table.residues().map(|(c, _)| c).filter(|&c| c != current).collect();
    if !alphabet.is_empty() {
        last_candidate[mutate_at] = alphabet[rng.random_range(0..alphabet.len())];
    }
    seq.remapped(&last_candidate, &last_new_pos_of_old)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmodified(s: &str) -> AnnotatedSequence {
        AnnotatedSequence::unmodified(s)
    }

    #[test]
    fn reverse_round_trip_restores_original() {
        let seq = AnnotatedSequence::new("PEPTIDE", vec![PositionedModification { location: 2, delta_mass: 15.99 }]);
        let twice = reverse(&reverse(&seq));
        assert_eq!(twice, seq);
    }

    #[test]
    fn pseudo_reverse_matches_grounded_example() {
        let seq = unmodified("TESTPEPTIDE");
        let decoy = pseudo_reverse(&seq);
        assert_eq!(decoy.sequence, "DITPEPTSETE");
    }

    #[test]
    fn pseudo_reverse_keeps_c_terminal_residue_fixed() {
        let seq = unmodified("PEPTIDE");
        let decoy = pseudo_reverse(&seq);
        assert_eq!(decoy.sequence.chars().last(), seq.sequence.chars().last());
    }

    #[test]
    fn sequence_identity_matches_grounded_example() {
        let identity = sequence_identity("TESTPEPTIDE", "EDITPEPTSET");
        assert!((identity - 5.0 / 11.0).abs() < 1e-6);
    }

    #[test]
    fn shuffle_respects_fixed_positions() {
        let table = ResidueTable::standard();
        let seq = unmodified("TESTPEPTIDE");
        let settings = ShuffleSettings {
            non_shuffle_pattern: vec![true, false, false, false, false, false, false, false, false, false, true],
            ..ShuffleSettings::default()
        };
        let decoy = shuffle(&seq, &table, &settings);
        let chars: Vec<char> = decoy.sequence.chars().collect();
        assert_eq!(chars[0], 'T');
        assert_eq!(chars[10], 'E');
    }

    #[test]
    fn shuffle_preserves_residue_multiset() {
        let table = ResidueTable::standard();
        let seq = unmodified("TESTPEPTIDE");
        let decoy = shuffle(&seq, &table, &ShuffleSettings::default());
        let mut original: Vec<char> = seq.sequence.chars().collect();
        let mut shuffled: Vec<char> = decoy.sequence.chars().collect();
        original.sort_unstable();
        shuffled.sort_unstable();
        // A forced single-residue mutation on exhaustion is the only case
        // that can break the multiset invariant, and is out of scope here
        // since the default threshold (0.5) is easy to satisfy for this
        // sequence.
        assert_eq!(original, shuffled);
    }

    #[test]
    fn shuffle_is_deterministic_for_a_fixed_seed() {
        let table = ResidueTable::standard();
        let seq = unmodified("TESTPEPTIDE");
        let a = shuffle(&seq, &table, &ShuffleSettings::default());
        let b = shuffle(&seq, &table, &ShuffleSettings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn shuffle_relocates_modifications_with_their_residue() {
        let table = ResidueTable::standard();
        let seq = AnnotatedSequence::new("TESTPEPTIDE", vec![PositionedModification { location: 2, delta_mass: 79.9663 }]);
        let decoy = shuffle(&seq, &table, &ShuffleSettings::default());
        let original_residue = seq.sequence.chars().nth(2).unwrap();
        let new_location = decoy.modifications[0].location;
        assert_eq!(decoy.sequence.chars().nth(new_location).unwrap(), original_residue);
    }

    #[test]
    fn too_few_movable_positions_leaves_sequence_unchanged() {
        let table = ResidueTable::standard();
        let seq = unmodified("AK");
        let settings = ShuffleSettings {
            non_shuffle_pattern: vec![true, false],
            ..ShuffleSettings::default()
        };
        let decoy = shuffle(&seq, &table, &settings);
        assert_eq!(decoy.sequence, seq.sequence);
    }
}
