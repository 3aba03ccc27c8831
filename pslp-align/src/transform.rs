//! `Transform`: an ordered sequence of `(x, y, weight)` control points plus a
//! model tag (spec §3, C5). Points are always sorted by `x`; `identity` has
//! no points.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which mapping a [`Transform`] applies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Model {
    /// `y = x`, unconditionally.
    Identity,
    /// A single globally-fitted line through the control points.
    Linear,
    /// Linear interpolation between consecutive control points, with
    /// monotonic (constant-slope) extrapolation beyond the first/last point.
    PiecewiseLinear,
}

/// A fitted RT-to-reference-RT mapping (spec §3).
///
/// Invariant: `points` is sorted ascending by `x`; `Model::Identity`
/// transforms carry no points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    model: Model,
    points: Vec<(f64, f64, f64)>,
    linear_slope: f64,
    linear_intercept: f64,
}

impl Transform {
    /// The identity transform: `apply(x) == x` for every `x`.
    pub fn identity() -> Self {
        Self {
            model: Model::Identity,
            points: Vec::new(),
            linear_slope: 1.0,
            linear_intercept: 0.0,
        }
    }

    /// Fit a single weighted-least-squares line through `points` and tag the
    /// result `Model::Linear`.
    pub fn linear(mut points: Vec<(f64, f64, f64)>) -> Self {
        points.sort_by(cmp_by_x);
        let (slope, intercept) = weighted_least_squares(&points);
        Self {
            model: Model::Linear,
            points,
            linear_slope: slope,
            linear_intercept: intercept,
        }
    }

    /// Build a piecewise-linear transform from `points`, sorting them by `x`
    /// first (spec §3 invariant). A single-point transform degenerates to a
    /// constant-offset shift; an empty one degenerates to identity.
    pub fn piecewise_linear(mut points: Vec<(f64, f64, f64)>) -> Self {
        points.sort_by(cmp_by_x);
        if points.is_empty() {
            return Self::identity();
        }
        Self {
            model: Model::PiecewiseLinear,
            points,
            linear_slope: 1.0,
            linear_intercept: 0.0,
        }
    }

    /// The model this transform applies.
    pub fn model(&self) -> Model {
        self.model
    }

    /// The control points backing this transform, sorted by `x`.
    pub fn points(&self) -> &[(f64, f64, f64)] {
        &self.points
    }

    /// Map a local RT `x` to the reference coordinate.
    pub fn apply(&self, x: f64) -> f64 {
        match self.model {
            Model::Identity => x,
            Model::Linear => self.linear_slope.mul_add(x, self.linear_intercept),
            Model::PiecewiseLinear => self.apply_piecewise(x),
        }
    }

    fn apply_piecewise(&self, x: f64) -> f64 {
        let n = self.points.len();
        if n == 0 {
            return x;
        }
        if n == 1 {
            let (px, py, _) = self.points[0];
            return x + (py - px);
        }
        if x <= self.points[0].0 {
            let (x0, y0, _) = self.points[0];
            let (x1, y1, _) = self.points[1];
            return lerp_slope(x0, y0, x1, y1, x);
        }
        if x >= self.points[n - 1].0 {
            let (x0, y0, _) = self.points[n - 2];
            let (x1, y1, _) = self.points[n - 1];
            return lerp_slope(x0, y0, x1, y1, x);
        }
        // Binary-search the bracketing segment; points are sorted by x.
        let segment = self
            .points
            .windows(2)
            .find(|w| x >= w[0].0 && x <= w[1].0)
            .expect("x is within [first.x, last.x], a bracketing segment must exist");
        let (x0, y0, _) = segment[0];
        let (x1, y1, _) = segment[1];
        lerp_slope(x0, y0, x1, y1, x)
    }
}

fn lerp_slope(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if (x1 - x0).abs() < f64::EPSILON {
        return y0;
    }
    let t = (x - x0) / (x1 - x0);
    y0 + t * (y1 - y0)
}

fn cmp_by_x(a: &(f64, f64, f64), b: &(f64, f64, f64)) -> Ordering {
    a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal)
}

fn weighted_least_squares(points: &[(f64, f64, f64)]) -> (f64, f64) {
    if points.is_empty() {
        return (1.0, 0.0);
    }
    let total_weight: f64 = points.iter().map(|&(_, _, w)| w).sum();
    if total_weight <= 0.0 {
        return (1.0, 0.0);
    }
    let mean_x = points.iter().map(|&(x, _, w)| x * w).sum::<f64>() / total_weight;
    let mean_y = points.iter().map(|&(_, y, w)| y * w).sum::<f64>() / total_weight;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for &(x, y, w) in points {
        cov += w * (x - mean_x) * (y - mean_y);
        var_x += w * (x - mean_x).powi(2);
    }
    if var_x <= 0.0 {
        return (1.0, mean_y - mean_x);
    }
    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;
    (slope, intercept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_has_no_points_and_is_a_no_op() {
        let t = Transform::identity();
        assert!(t.points().is_empty());
        assert_eq!(t.apply(42.0), 42.0);
    }

    #[test]
    fn piecewise_linear_exact_at_control_points() {
        let t = Transform::piecewise_linear(vec![(100.0, 105.0, 1.0), (200.0, 205.0, 1.0)]);
        assert!((t.apply(100.0) - 105.0).abs() < 1e-9);
        assert!((t.apply(200.0) - 205.0).abs() < 1e-9);
        assert!((t.apply(150.0) - 155.0).abs() < 1e-9);
    }

    #[test]
    fn piecewise_linear_extrapolates_with_segment_slope() {
        let t = Transform::piecewise_linear(vec![(100.0, 100.0, 1.0), (200.0, 220.0, 1.0)]);
        // slope 1.2 from the sole segment
        assert!((t.apply(300.0) - 340.0).abs() < 1e-9);
        assert!((t.apply(0.0) - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn diagonal_points_behave_like_identity() {
        let t = Transform::piecewise_linear(vec![(100.0, 100.0, 1.0), (200.0, 200.0, 1.0)]);
        assert_eq!(t.points().len(), 2);
        assert!((t.apply(100.0) - 100.0).abs() < 1e-9);
        assert!((t.apply(200.0) - 200.0).abs() < 1e-9);
        assert!((t.apply(50.0) - 50.0).abs() < 1e-9);
        assert!((t.apply(250.0) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn sorts_points_by_x_on_construction() {
        let t = Transform::piecewise_linear(vec![(200.0, 2.0, 1.0), (100.0, 1.0, 1.0)]);
        assert_eq!(t.points()[0].0, 100.0);
    }
}
