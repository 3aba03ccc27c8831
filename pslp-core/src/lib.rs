//! Shared substrate for the PSLP precursor-selection workspace: ppm-aware
//! numeric primitives, the small set of entities every other crate builds on
//! (`Peak`, `Spectrum`, `Precursor`, `Feature`, `Window`), the error taxonomy,
//! a diagnostics sink for non-fatal warnings, and the process-wide residue
//! registry.

pub mod diagnostics;
pub mod entities;
pub mod error;
pub mod numeric;
pub mod registry;

/// A subset of the types most other crates in the workspace need; importing
/// this is the recommended starting point.
pub mod prelude {
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Level};
    pub use crate::entities::{Feature, FeatureId, Peak, Polarity, Precursor, Spectrum, Window};
    pub use crate::error::{Error, PslpErrorKind};
    pub use crate::registry::ResidueTable;
}
