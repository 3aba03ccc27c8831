//! Fragment-weighted MS2 consensus spectra (spec §4.4, component C4).

pub mod consensus;

pub use consensus::{ConsensusSettings, MS2ConsensusSpectrum, OutlierDimension};
