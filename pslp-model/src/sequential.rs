//! The sequential scheduling loop (spec §4.8.5), supplemented from
//! `PSLPFormulation::createAndSolveCombinedLPForKnownLCMSMapFeatureBased`'s
//! `step_size`/`sequential_order` iteration: `spec.md` only states the
//! termination conditions in prose, this is the literal driver loop.
//!
//! Each round: solve, record newly-fixed variables, tighten the cumulative
//! step-size cap by that count, optionally widen every RT-bin row's
//! capacity, and re-solve. Stops when a round fixes nothing new or the
//! inclusion-list cap is reached.

use crate::pslp::PslpModel;
use pslp_core::error::PslpResult;
use pslp_lp::{ColumnId, LpModel, RowId, RowKind, SolveParams, SolverStatus};
use std::collections::BTreeSet;

/// Knobs for [`SequentialScheduler::run`] (spec §4.8.3 constraint 5,
/// §4.8.5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequentialSettings {
    /// Maximum number of variables newly fixed to `1` per round.
    pub step_size: u32,
    /// Additional RT-bin row capacity granted after every round that made
    /// progress (`0.0` disables widening).
    pub widen_rt_bins_by: f64,
    /// Hard cap on the number of rounds, independent of the other
    /// termination conditions (a safety backstop against a misconfigured
    /// step size that never converges).
    pub max_iterations: u32,
}

/// Per-round and totals summary returned by [`SequentialScheduler::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct SequentialReport {
    pub iterations: u32,
    pub total_fixed: usize,
    pub newly_fixed_per_round: Vec<usize>,
    pub final_status: SolverStatus,
}

/// Drives the solve/fix/widen/re-solve loop over an already-built
/// [`PslpModel`]. Owns the step-size row it adds to the model.
pub struct SequentialScheduler {
    step_row: RowId,
    fixed: BTreeSet<ColumnId>,
}

impl SequentialScheduler {
    /// Add the step-size cap row (`Σ x <= step_size`) over every variable in
    /// `pslp_model` and return a scheduler ready to `run`.
    ///
    /// # Errors
    /// Propagates [`LpModel::add_row`]'s errors.
    pub fn new(model: &mut LpModel, pslp_model: &PslpModel, settings: &SequentialSettings) -> PslpResult<Self> {
        let columns: Vec<ColumnId> = pslp_model.variables.iter().map(|v| v.variable).collect();
        let step_row = model.add_row("sequential_step_cap", columns.into_iter().map(|c| (c, 1.0)), f64::NEG_INFINITY, f64::from(settings.step_size), RowKind::Le)?;
        Ok(Self {
            step_row,
            fixed: BTreeSet::new(),
        })
    }

    /// Run the iteration loop to completion (spec §4.8.5).
    ///
    /// # Errors
    /// Propagates [`LpModel::solve`]'s structural errors (e.g. `EmptyModel`
    /// if every row ends up tombstoned — not expected in normal use).
    pub fn run(&mut self, model: &mut LpModel, pslp_model: &PslpModel, settings: &SequentialSettings) -> PslpResult<SequentialReport> {
        let all_columns: Vec<ColumnId> = pslp_model.variables.iter().map(|v| v.variable).collect();
        let mut newly_fixed_per_round = Vec::new();
        let mut iterations = 0_u32;
        let mut final_status = SolverStatus::Undefined;

        loop {
            iterations += 1;
            final_status = model.solve(SolveParams::default())?;
            if !matches!(final_status, SolverStatus::Optimal | SolverStatus::Feasible) {
                break;
            }

            let newly_fixed: Vec<ColumnId> = all_columns
                .iter()
                .copied()
                .filter(|c| !self.fixed.contains(c))
                .filter(|&c| model.value(c).unwrap_or(0.0) > 0.5)
                .collect();
            newly_fixed_per_round.push(newly_fixed.len());

            if newly_fixed.is_empty() {
                break;
            }
            for &column in &newly_fixed {
                model.set_bounds_col(column, 1.0, 1.0)?;
                self.fixed.insert(column);
            }

            if iterations >= settings.max_iterations {
                break;
            }

            let next_cap = f64::from(iterations + 1) * f64::from(settings.step_size);
            model.set_bounds_row(self.step_row, f64::NEG_INFINITY, next_cap)?;

            if settings.widen_rt_bins_by > 0.0 {
                for &row in pslp_model.rt_bin_rows.values() {
                    widen_row_upper(model, row, settings.widen_rt_bins_by)?;
                }
            }
        }

        Ok(SequentialReport {
            iterations,
            total_fixed: self.fixed.len(),
            newly_fixed_per_round,
            final_status,
        })
    }
}

fn widen_row_upper(model: &mut LpModel, row: RowId, by: f64) -> PslpResult<()> {
    let (lower, upper) = model.row_bounds(row)?;
    model.set_bounds_row(row, lower, upper + by)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pslp::{FeatureInput, PslpSettings, build_feature_only};
    use crate::xic::{FeatureTrace, IntensityMatrix, ScanSpan};
    use pslp_core::entities::FeatureId;
    use std::collections::BTreeMap;

    struct FlatMatrix;
    impl IntensityMatrix for FlatMatrix {
        fn intensity(&self, _scan: u32, _mz_index: usize) -> f64 {
            1.0
        }
    }

    fn feature(id: u64, scan: u32, weight: f64) -> FeatureInput {
        let mut score_prior = BTreeMap::new();
        score_prior.insert(2, weight);
        FeatureInput {
            feature: FeatureId(id),
            charges: vec![2],
            trace: FeatureTrace {
                spans: vec![ScanSpan { scan, mz_lo: 0, mz_hi: 0 }],
            },
            rt_probability: 1.0,
            score_prior,
            protein: None,
        }
    }

    #[test]
    fn stops_when_a_round_fixes_nothing_new() {
        let mut model = LpModel::new();
        let features = vec![feature(1, 0, 1.0), feature(2, 1, 1.0), feature(3, 2, 1.0)];
        let pslp_model = build_feature_only(&mut model, &features, &FlatMatrix, &PslpSettings::default()).unwrap();

        let settings = SequentialSettings {
            step_size: 2,
            widen_rt_bins_by: 0.0,
            max_iterations: 10,
        };
        let mut scheduler = SequentialScheduler::new(&mut model, &pslp_model, &settings).unwrap();
        let report = scheduler.run(&mut model, &pslp_model, &settings).unwrap();

        assert!(report.total_fixed <= 3);
        assert_eq!(report.final_status, SolverStatus::Optimal);
        assert!(!report.newly_fixed_per_round.is_empty());
    }
}
