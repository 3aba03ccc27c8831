//! The PSLP ILP formulation itself (spec §4.8, C8): variables, objective,
//! and the six constraint families, built on top of [`pslp_lp::LpModel`].
//!
//! Grounded on `PSLPFormulation::createAndSolveILPForKnownLCMSMapFeatureBased`
//! (feature-only) and `createAndSolveCombinedLPForKnownLCMSMapFeatureBased`
//! (protein-coverage combined formulation); both build the same `x_{f,s,z}`
//! variable family, differing only in whether `p_a` auxiliary columns and
//! the coverage rows are added.

use crate::xic::{FeatureTrace, IntensityMatrix, xic_weights};
use pslp_core::entities::FeatureId;
use pslp_core::error::{PslpErrorKind, PslpResult, simple};
use pslp_lp::{ColumnId, LpModel, RowId, RowKind, Sense, VariableKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tunable caps and weights named in spec §4.8.3/§9 OQ3.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PslpSettings {
    /// `K`: per-feature acquisition cap (constraint 1).
    pub max_ms2_per_feature: u32,
    /// `B`: per-RT-bin capacity (constraint 2).
    pub max_per_rt_bin: u32,
    /// `L`: inclusion-list size cap (constraint 3).
    pub max_inclusion_list_size: u32,
    /// `λ`: the combined formulation's single protein-coverage weight (spec
    /// §9 OQ3). Zero selects the feature-only formulation.
    pub protein_coverage_weight: f64,
    /// Whether XIC weights are normalised per feature before weighting the
    /// objective (spec §4.8.1's "when normalisation is requested").
    pub normalise_xic: bool,
}

impl Default for PslpSettings {
    fn default() -> Self {
        Self {
            max_ms2_per_feature: 1,
            max_per_rt_bin: 1,
            max_inclusion_list_size: u32::MAX,
            protein_coverage_weight: 0.0,
            normalise_xic: false,
        }
    }
}

/// One candidate feature's inputs to the ILP build (spec §4.8.1).
#[derive(Clone, Debug)]
pub struct FeatureInput {
    pub feature: FeatureId,
    /// Charges this feature is feasible at (`z ∈ feature.charges`).
    pub charges: Vec<i8>,
    /// The feature's mass trace, consumed by the XIC kernel.
    pub trace: FeatureTrace,
    /// `rt_probability(f)` (spec §4.8.2).
    pub rt_probability: f64,
    /// `score_prior(f, z)` per candidate charge; charges absent from this
    /// map default to a prior of `1.0`.
    pub score_prior: BTreeMap<i8, f64>,
    /// The protein this feature's peptide is assigned to, if any, and the
    /// coverage prior `q_{f,a}` (spec §4.8.3 constraint 4). Ignored in the
    /// feature-only formulation.
    pub protein: Option<(String, f64)>,
}

/// An `(feature, scan, variable)` record, stable for the life of the model
/// (spec §3 `IndexTriple`, §9 "arena + integer indices").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexTriple {
    pub feature: FeatureId,
    pub scan: u32,
    pub variable: ColumnId,
    pub rt_probability: f64,
    pub signal_weight: f64,
    pub protein_accession: Option<String>,
}

/// The built PSLP model: the `IndexTriple` arena plus the row handles
/// needed to relax or extend constraints afterwards (sequential mode,
/// exclusion coupling).
#[derive(Clone, Debug)]
pub struct PslpModel {
    pub variables: Vec<IndexTriple>,
    pub protein_variables: BTreeMap<String, ColumnId>,
    pub feature_cap_rows: BTreeMap<FeatureId, RowId>,
    pub rt_bin_rows: BTreeMap<u32, RowId>,
    pub inclusion_list_row: Option<RowId>,
    pub protein_coverage_rows: BTreeMap<String, RowId>,
}

impl PslpModel {
    /// Fix `(feature, scan)`'s variable to `1` (spec §4.8.3 constraint 6,
    /// "exclusion coupling"): equivalent to `x >= 1 ∧ x <= 1`.
    ///
    /// # Errors
    /// [`PslpErrorKind::IndexOutOfRange`] if no such variable was built.
    pub fn fix_to_one(&self, model: &mut LpModel, feature: FeatureId, scan: u32) -> PslpResult<()> {
        let triple = self
            .variables
            .iter()
            .find(|v| v.feature == feature && v.scan == scan)
            .ok_or_else(|| simple(PslpErrorKind::IndexOutOfRange, "fix_to_one: no such (feature, scan) variable"))?;
        model.set_bounds_col(triple.variable, 1.0, 1.0)
    }
}

fn column_name(feature: FeatureId, scan: u32, charge: i8) -> String {
    format!("x_f{}_s{scan}_z{charge}", feature.0)
}

/// Build the feature-only PSLP formulation (spec §4.8, `λ = 0`): one binary
/// `x_{f,s,z}` per feasible `(feature, scan, charge)` tuple, plus constraints
/// 1-3 and 6.
///
/// # Errors
/// [`PslpErrorKind::EmptyModel`] if no feature produced a single feasible
/// variable.
pub fn build_feature_only(model: &mut LpModel, features: &[FeatureInput], matrix: &dyn IntensityMatrix, settings: &PslpSettings) -> PslpResult<PslpModel> {
    build(model, features, &BTreeMap::new(), matrix, settings)
}

/// Build the combined, protein-coverage-driven PSLP formulation (spec
/// §4.8.1-3, `λ = settings.protein_coverage_weight`): in addition to the
/// feature-only variables, one continuous `p_a ∈ [0,1]` per protein
/// accession named in `protein_priors`, with the coverage-saturation row
/// (constraint 4).
///
/// # Errors
/// [`PslpErrorKind::EmptyModel`] if no feature produced a single feasible
/// variable.
pub fn build_combined(model: &mut LpModel, features: &[FeatureInput], protein_priors: &BTreeMap<String, f64>, matrix: &dyn IntensityMatrix, settings: &PslpSettings) -> PslpResult<PslpModel> {
    build(model, features, protein_priors, matrix, settings)
}

fn build(model: &mut LpModel, features: &[FeatureInput], protein_priors: &BTreeMap<String, f64>, matrix: &dyn IntensityMatrix, settings: &PslpSettings) -> PslpResult<PslpModel> {
    model.set_sense(Sense::Max);
    let combined = settings.protein_coverage_weight > 0.0 && !protein_priors.is_empty();

    let mut variables = Vec::new();
    let mut feature_cols: BTreeMap<FeatureId, Vec<ColumnId>> = BTreeMap::new();
    let mut rt_bin_cols: BTreeMap<u32, Vec<ColumnId>> = BTreeMap::new();
    let mut protein_cols: BTreeMap<String, Vec<(ColumnId, f64)>> = BTreeMap::new();

    for feature in features {
        let weights = xic_weights(&feature.trace, matrix, settings.normalise_xic);
        for (&scan, &xic_weight) in &weights {
            if xic_weight <= 0.0 {
                continue;
            }
            for &charge in &feature.charges {
                let score_prior = feature.score_prior.get(&charge).copied().unwrap_or(1.0);
                let weight = xic_weight * feature.rt_probability * score_prior;
                let col = model.add_column(column_name(feature.feature, scan, charge), 0.0, 1.0, weight, VariableKind::Binary);
                feature_cols.entry(feature.feature).or_default().push(col);
                rt_bin_cols.entry(scan).or_default().push(col);
                let protein_accession = feature.protein.as_ref().map(|(acc, _)| acc.clone());
                if combined {
                    if let Some((acc, prior)) = &feature.protein {
                        protein_cols.entry(acc.clone()).or_default().push((col, *prior));
                    }
                }
                variables.push(IndexTriple {
                    feature: feature.feature,
                    scan,
                    variable: col,
                    rt_probability: feature.rt_probability,
                    signal_weight: xic_weight,
                    protein_accession,
                });
            }
        }
    }

    if variables.is_empty() {
        return Err(simple(PslpErrorKind::EmptyModel, "PSLP build produced zero feasible variables"));
    }

    let max_ms2 = f64::from(settings.max_ms2_per_feature);
    let mut feature_cap_rows = BTreeMap::new();
    for (&feature, cols) in &feature_cols {
        let row = model.add_row(format!("cap_f{}", feature.0), cols.iter().map(|&c| (c, 1.0)), f64::NEG_INFINITY, max_ms2, RowKind::Le)?;
        feature_cap_rows.insert(feature, row);
    }

    let max_per_bin = f64::from(settings.max_per_rt_bin);
    let mut rt_bin_rows = BTreeMap::new();
    for (&scan, cols) in &rt_bin_cols {
        let row = model.add_row(format!("rt_bin_{scan}"), cols.iter().map(|&c| (c, 1.0)), f64::NEG_INFINITY, max_per_bin, RowKind::Le)?;
        rt_bin_rows.insert(scan, row);
    }

    let inclusion_list_row = if settings.max_inclusion_list_size < u32::MAX {
        let row = model.add_row(
            "inclusion_list_size",
            variables.iter().map(|v| (v.variable, 1.0)),
            f64::NEG_INFINITY,
            f64::from(settings.max_inclusion_list_size),
            RowKind::Le,
        )?;
        Some(row)
    } else {
        None
    };

    let mut protein_variables = BTreeMap::new();
    let mut protein_coverage_rows = BTreeMap::new();
    if combined {
        for (accession, pairs) in &protein_cols {
            let coverage_prior = protein_priors.get(accession).copied().unwrap_or(0.0);
            let p_col = model.add_column(format!("p_{accession}"), 0.0, 1.0, settings.protein_coverage_weight * coverage_prior, VariableKind::Continuous);
            let mut coefficients = vec![(p_col, 1.0)];
            coefficients.extend(pairs.iter().map(|&(col, q)| (col, -q)));
            let row = model.add_row(format!("cov_{accession}"), coefficients, f64::NEG_INFINITY, 0.0, RowKind::Le)?;
            protein_variables.insert(accession.clone(), p_col);
            protein_coverage_rows.insert(accession.clone(), row);
        }
    }

    Ok(PslpModel {
        variables,
        protein_variables,
        feature_cap_rows,
        rt_bin_rows,
        inclusion_list_row,
        protein_coverage_rows,
    })
}

/// Apply the exclusion-coupling constraint (spec §4.8.3 constraint 6) to
/// every `(feature, scan)` pair named in `fixed`.
///
/// # Errors
/// [`PslpErrorKind::IndexOutOfRange`] if any named pair has no built
/// variable.
pub fn apply_exclusion_coupling(model: &mut LpModel, pslp_model: &PslpModel, fixed: &BTreeSet<(FeatureId, u32)>) -> PslpResult<()> {
    for &(feature, scan) in fixed {
        pslp_model.fix_to_one(model, feature, scan)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xic::ScanSpan;
    use pslp_lp::{SolveParams, SolverStatus};

    struct FlatMatrix;
    impl IntensityMatrix for FlatMatrix {
        fn intensity(&self, _scan: u32, _mz_index: usize) -> f64 {
            1.0
        }
    }

    fn feature(id: u64, scan: u32) -> FeatureInput {
        FeatureInput {
            feature: FeatureId(id),
            charges: vec![2],
            trace: FeatureTrace {
                spans: vec![ScanSpan { scan, mz_lo: 0, mz_hi: 0 }],
            },
            rt_probability: 0.5,
            score_prior: BTreeMap::new(),
            protein: None,
        }
    }

    #[test]
    fn single_bin_cap_picks_one_of_two_equal_features() {
        // spec §8 scenario 4, reproduced through the builder rather than
        // against a hand-assembled LpModel.
        let mut model = LpModel::new();
        let features = vec![feature(1, 0), feature(2, 0)];
        let settings = PslpSettings {
            max_ms2_per_feature: 1,
            max_per_rt_bin: 1,
            max_inclusion_list_size: u32::MAX,
            protein_coverage_weight: 0.0,
            normalise_xic: false,
        };
        let pslp_model = build_feature_only(&mut model, &features, &FlatMatrix, &settings).unwrap();
        assert_eq!(pslp_model.variables.len(), 2);

        let status = model.solve(SolveParams::default()).unwrap();
        assert_eq!(status, SolverStatus::Optimal);
        assert!((model.objective_value() - 0.5).abs() < 1e-6);
        let total: f64 = pslp_model.variables.iter().map(|v| model.value(v.variable).unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn build_rejects_all_infeasible_features() {
        let mut model = LpModel::new();
        struct ZeroMatrix;
        impl IntensityMatrix for ZeroMatrix {
            fn intensity(&self, _scan: u32, _mz_index: usize) -> f64 {
                0.0
            }
        }
        let features = vec![feature(1, 0)];
        let err = build_feature_only(&mut model, &features, &ZeroMatrix, &PslpSettings::default());
        assert!(err.is_err());
    }

    #[test]
    fn combined_formulation_adds_protein_variable() {
        let mut model = LpModel::new();
        let mut priors = BTreeMap::new();
        priors.insert("PROT1".to_string(), 1.0);
        let mut feat = feature(1, 0);
        feat.protein = Some(("PROT1".to_string(), 0.9));
        let settings = PslpSettings {
            protein_coverage_weight: 0.2,
            ..PslpSettings::default()
        };
        let pslp_model = build_combined(&mut model, &[feat], &priors, &FlatMatrix, &settings).unwrap();
        assert!(pslp_model.protein_variables.contains_key("PROT1"));
        let status = model.solve(SolveParams::default()).unwrap();
        assert_eq!(status, SolverStatus::Optimal);
    }
}
