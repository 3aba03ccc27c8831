//! Inclusion/exclusion target-list generation (spec §4.10, component C10).
//!
//! Grounded on `InclusionExclusionList.C`/`.h`: window emission from
//! features, FASTA+RT models or peptide IDs (`targets`), then single-linkage
//! clustering of overlapping windows (`clustering`) and tab-separated file
//! output.

pub mod clustering;
pub mod targets;

pub use clustering::{ClusteringReport, ClusteringSettings, MzTolerance, WeightedWindow, cluster};
pub use targets::{Evidence, PeptideHit, PeptideIdentification, RtWindowKind, TimeUnit, format_targets, windows_from_features, windows_from_identifications, windows_from_sequences, write_targets};
