//! PSLP: an ILP-driven precursor-ion selection and scheduling engine for
//! LC-MS/MS acquisition.
//!
//! This crate is a thin facade over the workspace's per-concern crates,
//! mirroring the teacher's own history: `rusteomics-mzcore` started as one
//! monolithic `rustyms` crate and was later split into `mzcore`/`mzalign`/
//! `mzannotate`/`mzident`/… while keeping a top-level crate that re-exports
//! them for downstream users who want one dependency instead of ten.
//!
//! - [`spectra`] — fragment store and per-feature LC profiles (C2, C3).
//! - [`consensus`] — MS2 consensus spectra (C4).
//! - [`align`] — identification-driven RT alignment (C5).
//! - [`tagger`] — mass-ladder tags and the enhanced suffix array (C6).
//! - [`decoy`] — decoy peptide/transition generation (C7).
//! - [`model`] — the precursor-selection ILP formulation (C8).
//! - [`lp`] — the solver-independent LP/MIP driver (C9).
//! - [`targets`] — inclusion/exclusion target-list generation (C10).
//! - [`raster`] — RT x m/z bilinear rasterisation (C11).

/// Numeric primitives, shared entities, error taxonomy, diagnostics sink and
/// the residue/modification registry (C1).
pub mod core {
    pub use pslp_core::*;
}

/// Fragment store and per-feature LC profiles (C2, C3).
pub mod spectra {
    pub use pslp_spectra::*;
}

/// Fragment-weighted MS2 consensus spectra (C4).
pub mod consensus {
    pub use pslp_consensus::*;
}

/// Identification-driven retention-time alignment (C5).
pub mod align {
    pub use pslp_align::*;
}

/// Mass-ladder tag enumeration and the enhanced suffix array (C6).
pub mod tagger {
    pub use pslp_tagger::*;
}

/// Decoy peptide and transition generation (C7).
pub mod decoy {
    pub use pslp_decoy::*;
}

/// The precursor-selection ILP formulation (C8).
pub mod model {
    pub use pslp_model::*;
}

/// The solver-independent LP/MIP driver (C9).
pub mod lp {
    pub use pslp_lp::*;
}

/// Inclusion/exclusion target-list generation (C10).
pub mod targets {
    pub use pslp_targets::*;
}

/// RT x m/z bilinear rasterisation (C11).
pub mod raster {
    pub use pslp_raster::*;
}

/// A subset of the types most downstream users of the whole pipeline need;
/// importing this is the recommended starting point.
pub mod prelude {
    pub use crate::align::{AlignmentSettings, Run, RtObservation, Transform, align_runs};
    pub use crate::consensus::{ConsensusSettings, MS2ConsensusSpectrum};
    pub use crate::core::entities::{Feature, FeatureId, Peak, Polarity, Precursor, Spectrum, Window};
    pub use crate::core::error::{Error, PslpErrorKind, PslpResult};
    pub use crate::decoy::{DecoyStrategy, generate_decoy};
    pub use crate::lp::{LpModel, SolverStatus};
    pub use crate::model::{PslpModel, PslpSettings, build_combined, build_feature_only};
    pub use crate::raster::{Raster, RasterSettings};
    pub use crate::spectra::{FragmentIon, FragmentStore, LcProfile};
    pub use crate::tagger::{EnhancedSuffixArray, enumerate_tags};
    pub use crate::targets::{RtWindowKind, TimeUnit, cluster};
}
