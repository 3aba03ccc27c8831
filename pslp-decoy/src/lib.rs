//! Decoy peptide generation: reverse, pseudo-reverse and identity-bounded
//! shuffle, plus tryptic protein-level digestion decoys (spec §4.7, C7).
//!
//! Grounded on `mzident/src/formats/fasta.rs` for the modified-sequence
//! shape and `mzcore/src/rand.rs` for threading an injected `rand::Rng`
//! rather than reading module-global state.

pub mod digest;
pub mod sequence;

pub use digest::{DigestDecoySettings, reverse_digest, split_tryptic};
pub use sequence::{AnnotatedSequence, PositionedModification, ShuffleSettings, pseudo_reverse, reverse, sequence_identity, shuffle};

/// The three decoy-generation strategies named in spec §4.7.
#[derive(Clone, Debug, PartialEq)]
pub enum DecoyStrategy {
    Reverse,
    PseudoReverse,
    Shuffle(ShuffleSettings),
}

/// Apply the selected strategy to a single modified peptide.
pub fn generate_decoy(seq: &AnnotatedSequence, table: &pslp_core::registry::ResidueTable, strategy: &DecoyStrategy) -> AnnotatedSequence {
    match strategy {
        DecoyStrategy::Reverse => reverse(seq),
        DecoyStrategy::PseudoReverse => pseudo_reverse(seq),
        DecoyStrategy::Shuffle(settings) => shuffle(seq, table, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_decoy_dispatches_reverse() {
        let table = pslp_core::registry::ResidueTable::standard();
        let seq = AnnotatedSequence::unmodified("PEPTIDE");
        let decoy = generate_decoy(&seq, &table, &DecoyStrategy::Reverse);
        assert_eq!(decoy, reverse(&seq));
    }
}
