//! The precursor-selection ILP formulation (spec §4.8, C8): variables,
//! objective, constraints, and the sequential scheduling loop, built on top
//! of [`pslp_lp::LpModel`].
//!
//! Grounded on `PSLPFormulation.h`: the `IndexTriple` arena, the XIC kernel,
//! the feature-only and protein-coverage-combined formulations, and the
//! `updateStepSizeConstraint` sequential-iteration control structure.

pub mod pslp;
pub mod sequential;
pub mod xic;

pub use pslp::{FeatureInput, IndexTriple, PslpModel, PslpSettings, apply_exclusion_coupling, build_combined, build_feature_only};
pub use sequential::{SequentialReport, SequentialScheduler, SequentialSettings};
pub use xic::{FeatureTrace, IntensityMatrix, ScanSpan, xic_weights};
