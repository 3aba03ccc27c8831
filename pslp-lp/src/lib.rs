//! A solver-independent column/row LP & MIP driver (spec §4.9, C9), backed
//! by `good_lp` with a pluggable `microlp`/`highs` back-end.
//!
//! Grounded on `PSLPFormulation.h`'s arena-of-`IndexTriple` design: the
//! `pslp-model` crate builds a [`LpModel`] by appending columns/rows and
//! remembering the [`ColumnId`]/[`RowId`] handles it gets back, rather than
//! re-deriving indices from a solver-native representation.

pub mod format;
pub mod model;
pub mod status;

pub use model::LpModel;
pub use status::{ColumnId, ModelFormat, RowId, RowKind, Sense, SolveParams, SolverStatus, VariableKind};
