//! Solver-independent status codes and the small value types the driver
//! deals in (spec §4.9).

use serde::{Deserialize, Serialize};

/// Outcome of a [`crate::LpModel::solve`] call. Never wrapped in a `Result`:
/// per spec §7/§9, the ILP layer does not turn a solver status into an
/// exception, it is up to the caller to decide whether `Infeasible` warrants
/// a retry with relaxed capacities.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SolverStatus {
    #[default]
    Undefined,
    Feasible,
    Optimal,
    Infeasible,
    Unbounded,
}

/// Whether a column is free, integral, or constrained to `{0, 1}`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum VariableKind {
    Continuous,
    Integer,
    Binary,
}

/// The relational operator a row's bounds are interpreted under.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RowKind {
    Le,
    Ge,
    Eq,
    Range,
}

/// Optimisation direction, set once per model via `set_sense`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Sense {
    Min,
    Max,
}

/// An opaque handle to a column created by `add_column`. Indices, never
/// owning pointers (spec §9 "arena + integer indices").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ColumnId(pub usize);

/// An opaque handle to a row created by `add_row`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RowId(pub usize);

/// Solver tuning knobs passed to `solve`. Neither back-end exposes a rich
/// parameter surface through `good_lp`'s common trait, so this stays small;
/// fields are best-effort hints rather than guaranteed behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveParams {
    /// Wall-clock budget in seconds, if the active back-end honours one.
    pub time_limit_seconds: Option<f64>,
}

/// The file format used by `LpModel::read`/`write`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ModelFormat {
    Lp,
    Mps,
}
