//! Arena-indexed LP/MIP model: the solver-independent driver (spec §4.9, C9).
//!
//! Columns are never removed once added — an `IndexTriple`'s `variable_id`
//! must stay valid for the life of the model (spec §3). Rows may be deleted,
//! but only by tombstoning: the slot is kept and later rows keep their
//! indices, matching §4.8.4's "deleting a row ... must not renumber
//! columns" (the same arena discipline extends to rows themselves, so a
//! `RowId` handed out once never changes).
//!
//! `good_lp` has no row-deletion primitive of its own, so this model owns
//! the arena and only consults `good_lp` at `solve()` time: every call
//! rebuilds a fresh problem from the currently-live rows.

use crate::status::{ColumnId, RowId, RowKind, Sense, SolveParams, SolverStatus, VariableKind};
use good_lp::{Expression, ProblemVariables, Solution, SolverModel, variable};
use pslp_core::error::{PslpErrorKind, PslpResult, simple};

#[cfg(feature = "highs")]
use good_lp::solvers::highs::highs as backend;
#[cfg(not(feature = "highs"))]
use good_lp::solvers::microlp::microlp as backend;

#[derive(Clone, Debug)]
struct Column {
    name: String,
    lower: f64,
    upper: f64,
    obj: f64,
    kind: VariableKind,
}

#[derive(Clone, Debug)]
struct Row {
    name: String,
    coefficients: Vec<(ColumnId, f64)>,
    lower: f64,
    upper: f64,
    kind: RowKind,
    tombstoned: bool,
}

/// A solver-independent column/row LP & MIP model (spec §4.9, §3 `LPModel`).
#[derive(Clone, Debug)]
pub struct LpModel {
    columns: Vec<Column>,
    rows: Vec<Row>,
    sense: Sense,
    solution: Option<Vec<f64>>,
    objective_value: f64,
}

impl Default for LpModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LpModel {
    /// An empty model with no columns or rows, minimising by default.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            sense: Sense::Min,
            solution: None,
            objective_value: 0.0,
        }
    }

    /// Add a column (decision variable). `variable_id` stability for the
    /// life of the model is an invariant the `pslp-model` crate's
    /// `IndexTriple`s rely on: columns are only ever appended, never removed.
    pub fn add_column(&mut self, name: impl Into<String>, lower: f64, upper: f64, obj: f64, kind: VariableKind) -> ColumnId {
        let id = ColumnId(self.columns.len());
        self.columns.push(Column {
            name: name.into(),
            lower,
            upper,
            obj,
            kind,
        });
        id
    }

    /// Add a row (constraint) over the given sparse coefficients.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if a coefficient references a
    /// column that does not exist.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        coefficients: impl IntoIterator<Item = (ColumnId, f64)>,
        lower: f64,
        upper: f64,
        kind: RowKind,
    ) -> PslpResult<RowId> {
        let coefficients: Vec<(ColumnId, f64)> = coefficients.into_iter().collect();
        for &(col, _) in &coefficients {
            if col.0 >= self.columns.len() {
                return Err(simple(PslpErrorKind::IndexOutOfRange, "add_row: coefficient references an unknown column"));
            }
        }
        let id = RowId(self.rows.len());
        self.rows.push(Row {
            name: name.into(),
            coefficients,
            lower,
            upper,
            kind,
            tombstoned: false,
        });
        Ok(id)
    }

    fn column(&self, col: ColumnId) -> PslpResult<&Column> {
        self.columns
            .get(col.0)
            .ok_or_else(|| simple(PslpErrorKind::IndexOutOfRange, "column index out of range"))
    }

    fn column_mut(&mut self, col: ColumnId) -> PslpResult<&mut Column> {
        self.columns
            .get_mut(col.0)
            .ok_or_else(|| simple(PslpErrorKind::IndexOutOfRange, "column index out of range"))
    }

    fn row(&self, row: RowId) -> PslpResult<&Row> {
        self.rows
            .get(row.0)
            .filter(|r| !r.tombstoned)
            .ok_or_else(|| simple(PslpErrorKind::IndexOutOfRange, "row index out of range or deleted"))
    }

    fn row_mut(&mut self, row: RowId) -> PslpResult<&mut Row> {
        self.rows
            .get_mut(row.0)
            .filter(|r| !r.tombstoned)
            .ok_or_else(|| simple(PslpErrorKind::IndexOutOfRange, "row index out of range or deleted"))
    }

    /// Change a column's bounds.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `col` is unknown.
    pub fn set_bounds_col(&mut self, col: ColumnId, lower: f64, upper: f64) -> PslpResult<()> {
        let column = self.column_mut(col)?;
        column.lower = lower;
        column.upper = upper;
        Ok(())
    }

    /// Change a row's bounds, analogous to [`LpModel::set_bounds_col`].
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `row` is unknown or deleted.
    pub fn set_bounds_row(&mut self, row: RowId, lower: f64, upper: f64) -> PslpResult<()> {
        let r = self.row_mut(row)?;
        r.lower = lower;
        r.upper = upper;
        Ok(())
    }

    /// A row's current `(lower, upper)` bounds.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `row` is unknown or deleted.
    pub fn row_bounds(&self, row: RowId) -> PslpResult<(f64, f64)> {
        let r = self.row(row)?;
        Ok((r.lower, r.upper))
    }

    /// Set a single column's objective coefficient.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `col` is unknown.
    pub fn set_objective(&mut self, col: ColumnId, c: f64) -> PslpResult<()> {
        self.column_mut(col)?.obj = c;
        Ok(())
    }

    /// Set the optimisation direction for the whole model.
    pub fn set_sense(&mut self, sense: Sense) {
        self.sense = sense;
    }

    /// Tombstone a row. Its slot is kept (so no other row is renumbered) and
    /// it is excluded from every subsequent `solve()`.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `row` is unknown or already
    /// deleted.
    pub fn delete_row(&mut self, row: RowId) -> PslpResult<()> {
        self.row_mut(row)?.tombstoned = true;
        Ok(())
    }

    /// The column indices with a non-zero coefficient in `row`, in the
    /// order they were added (spec §4.8.4: "iterators over a row return the
    /// column indices, not names").
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `row` is unknown or deleted.
    pub fn non_zero_cols_of_row(&self, row: RowId) -> PslpResult<Vec<ColumnId>> {
        Ok(self
            .row(row)?
            .coefficients
            .iter()
            .filter(|&&(_, coeff)| coeff != 0.0)
            .map(|&(col, _)| col)
            .collect())
    }

    /// Number of columns ever added (never shrinks).
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of live (non-tombstoned) rows.
    pub fn row_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.tombstoned).count()
    }

    /// A column's name.
    pub fn column_name(&self, col: ColumnId) -> PslpResult<&str> {
        Ok(self.column(col)?.name.as_str())
    }

    /// The value of `col` in the last solution, or `0.0` if `solve` has
    /// never succeeded.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if `col` is unknown.
    pub fn value(&self, col: ColumnId) -> PslpResult<f64> {
        self.column(col)?;
        Ok(self.solution.as_ref().and_then(|s| s.get(col.0)).copied().unwrap_or(0.0))
    }

    /// The objective value of the last successful solve.
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    fn build_problem(&self) -> (ProblemVariables, Vec<good_lp::Variable>) {
        let mut vars = ProblemVariables::new();
        let mut handles = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let v = match column.kind {
                VariableKind::Continuous => variable().min(column.lower).max(column.upper),
                VariableKind::Integer => variable().integer().min(column.lower).max(column.upper),
                VariableKind::Binary => variable().binary(),
            };
            handles.push(vars.add(v));
        }
        (vars, handles)
    }

    fn row_expression(&self, row: &Row, handles: &[good_lp::Variable]) -> Expression {
        let mut expr: Expression = 0.0 * handles[0];
        for &(col, coeff) in &row.coefficients {
            expr = expr + coeff * handles[col.0];
        }
        expr
    }

    /// Build a fresh `good_lp` problem from the live rows and solve it.
    ///
    /// Per spec §7/§9, an infeasible or unbounded model is not an error —
    /// the status is a plain value, never wrapped in `Result`; only
    /// structural problems (an empty model) fail with an `Err`.
    ///
    /// # Errors
    /// [`PslpErrorKind::EmptyModel`] if the model has no columns or no live
    /// rows (spec §4.8.6, §7).
    pub fn solve(&mut self, _params: SolveParams) -> PslpResult<SolverStatus> {
        if self.columns.is_empty() || self.row_count() == 0 {
            return Err(simple(PslpErrorKind::EmptyModel, "ILP has zero variables or zero live rows"));
        }

        let (vars, handles) = self.build_problem();
        let mut objective: Expression = 0.0 * handles[0];
        for (column, &v) in self.columns.iter().zip(&handles) {
            objective = objective + column.obj * v;
        }

        let mut problem = match self.sense {
            Sense::Max => vars.maximise(objective).using(backend),
            Sense::Min => vars.minimise(objective).using(backend),
        };
        for row in &self.rows {
            if row.tombstoned {
                continue;
            }
            let expr = self.row_expression(row, &handles);
            problem = match row.kind {
                RowKind::Le => problem.with(expr.leq(row.upper)),
                RowKind::Ge => problem.with(expr.geq(row.lower)),
                RowKind::Eq => problem.with(expr.eq(row.lower)),
                RowKind::Range => problem.with(expr.clone().geq(row.lower)).with(expr.leq(row.upper)),
            };
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = handles.iter().map(|&v| solution.value(v)).collect();
                self.objective_value = self.columns.iter().zip(&values).map(|(c, v)| c.obj * v).sum();
                self.solution = Some(values);
                Ok(SolverStatus::Optimal)
            }
            Err(good_lp::ResolutionError::Infeasible) => Ok(SolverStatus::Infeasible),
            Err(good_lp::ResolutionError::Unbounded) => Ok(SolverStatus::Unbounded),
            // Back-end timeouts and other solver-internal failures are
            // reported as `Undefined`; the prior solution (if any) stays
            // retrievable through `value`/`objective_value` (spec §4.8.6).
            Err(_) => Ok(SolverStatus::Undefined),
        }
    }

    pub(crate) fn columns_for_format(&self) -> impl Iterator<Item = (ColumnId, &str, f64, f64, f64, VariableKind)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (ColumnId(i), c.name.as_str(), c.lower, c.upper, c.obj, c.kind))
    }

    pub(crate) fn rows_for_format(&self) -> impl Iterator<Item = (RowId, &str, &[(ColumnId, f64)], f64, f64, RowKind)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.tombstoned)
            .map(|(i, r)| (RowId(i), r.name.as_str(), r.coefficients.as_slice(), r.lower, r.upper, r.kind))
    }

    pub(crate) fn sense(&self) -> Sense {
        self.sense
    }

    /// Change a column's kind after the fact. Used by the `LP`/`MPS` readers,
    /// which only learn whether a variable is integer/binary once they reach
    /// the `Generals`/`Binaries`/`BOUNDS` section, after the column itself
    /// has already been created.
    pub(crate) fn set_kind(&mut self, col: ColumnId, kind: VariableKind) -> PslpResult<()> {
        self.column_mut(col)?.kind = kind;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bin_cap_picks_one_of_two_equal_features() {
        // spec §8 scenario 4: two features share an RT bin, B=1, equal
        // weight 0.5 each; expect objective 0.5, exactly one variable at 1.
        let mut model = LpModel::new();
        let x0 = model.add_column("x0", 0.0, 1.0, 0.5, VariableKind::Binary);
        let x1 = model.add_column("x1", 0.0, 1.0, 0.5, VariableKind::Binary);
        model.set_sense(Sense::Max);
        model.add_row("rt_bin", [(x0, 1.0), (x1, 1.0)], 0.0, 1.0, RowKind::Le).unwrap();

        let status = model.solve(SolveParams::default()).unwrap();
        assert_eq!(status, SolverStatus::Optimal);
        assert!((model.objective_value() - 0.5).abs() < 1e-6);
        let total = model.value(x0).unwrap() + model.value(x1).unwrap();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn deleting_a_row_does_not_renumber_columns_or_rows() {
        let mut model = LpModel::new();
        let x0 = model.add_column("x0", 0.0, 1.0, 1.0, VariableKind::Continuous);
        let x1 = model.add_column("x1", 0.0, 1.0, 1.0, VariableKind::Continuous);
        let r0 = model.add_row("r0", [(x0, 1.0)], 0.0, 1.0, RowKind::Le).unwrap();
        let r1 = model.add_row("r1", [(x1, 1.0)], 0.0, 1.0, RowKind::Le).unwrap();
        model.delete_row(r0).unwrap();
        assert_eq!(r1.0, 1);
        assert_eq!(model.column_count(), 2);
        assert_eq!(model.row_count(), 1);
        assert!(model.row(r0).is_err());
    }

    #[test]
    fn solve_on_empty_model_is_an_error() {
        let mut model = LpModel::new();
        assert!(model.solve(SolveParams::default()).is_err());
    }

    #[test]
    fn add_row_rejects_unknown_column() {
        let mut model = LpModel::new();
        model.add_column("x0", 0.0, 1.0, 1.0, VariableKind::Continuous);
        let bogus = ColumnId(42);
        assert!(model.add_row("r", [(bogus, 1.0)], 0.0, 1.0, RowKind::Le).is_err());
    }
}
