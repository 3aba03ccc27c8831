//! Mass-ladder peptide tag enumeration and enhanced-suffix-array tryptic
//! candidate search (spec §4.6, component C6).
//!
//! Grounded on `mzcore::isobaric_sets::building_blocks` (the residue-mass
//! building-block enumeration idea, re-purposed here to walk *observed*
//! peaks instead of generating isobaric sequences) and
//! `examples/original_source/include/OpenMS/DATASTRUCTURES/SuffixArraySeqan.h`
//! for the enhanced suffix array + skip table + DFS contract.

pub mod suffix_array;
pub mod tagger;

pub use suffix_array::{Candidate, EnhancedSuffixArray};
pub use tagger::{TaggerSettings, enumerate_tags};
