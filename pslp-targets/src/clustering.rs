//! Single-linkage window clustering (spec §4.10, C10).
//!
//! Grounded on `InclusionExclusionList::mergeOverlappingWindows_`: a
//! `WindowDistance_` functor combines an RT-overlap test and an m/z-closeness
//! test into a 0/1 distance, `SingleLinkage` clusters at a cutoff of `1.0`
//! (any dimension's intolerance blocks a merge), and each resulting cluster
//! is merged into one window with an intensity-weighted mean m/z and the
//! outer-hull RT range. The original also logs a cluster-size histogram
//! after merging; that is supplied here as [`ClusteringReport`].

use pslp_core::entities::Window;
use pslp_core::numeric::ppm_equal_either_direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two ways an m/z tolerance can be expressed (spec §4.10: "Da or ppm as
/// configured").
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MzTolerance {
    Ppm(f64),
    Da(f64),
}

fn mz_close(a: f64, b: f64, tol: MzTolerance) -> bool {
    match tol {
        MzTolerance::Da(delta) => (a - b).abs() <= delta,
        MzTolerance::Ppm(ppm) => ppm_equal_either_direction(a, b, ppm),
    }
}

/// Clustering knobs (spec §4.10).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusteringSettings {
    pub rt_tol: f64,
    pub mz_tol: MzTolerance,
}

/// A window plus the intensity it should contribute to a merged cluster's
/// weighted-mean m/z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedWindow {
    pub window: Window,
    pub intensity: f64,
}

/// The cluster-size histogram supplementing the merged window list (spec
/// §4.10's "reports the cluster size distribution as a diagnostic").
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusteringReport {
    /// `cluster_sizes[&k]` = number of clusters with exactly `k` members.
    pub cluster_sizes: BTreeMap<usize, usize>,
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Single-linkage-cluster `windows` under the 2-D max-distance `d(w1, w2) =
/// max(d_rt, d_mz)` with cutoff `1.0`: two windows merge transitively
/// whenever both their RT ranges overlap (within `rt_tol`) and their m/z
/// values are close (within `mz_tol`). Output windows are sorted ascending
/// by m/z.
pub fn cluster(windows: &[WeightedWindow], settings: &ClusteringSettings) -> (Vec<Window>, ClusteringReport) {
    let n = windows.len();
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let a = &windows[i].window;
            let b = &windows[j].window;
            if a.rt_overlaps(b, settings.rt_tol) && mz_close(a.mz, b.mz, settings.mz_tol) {
                uf.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        let root = uf.find(i);
        groups.entry(root).or_default().push(i);
    }

    let mut merged = Vec::with_capacity(groups.len());
    let mut cluster_sizes = BTreeMap::new();
    for indices in groups.values() {
        *cluster_sizes.entry(indices.len()).or_insert(0) += 1;

        let total_intensity: f64 = indices.iter().map(|&i| windows[i].intensity).sum();
        let mz = if total_intensity > 0.0 {
            indices.iter().map(|&i| windows[i].window.mz * windows[i].intensity).sum::<f64>() / total_intensity
        } else {
            indices.iter().map(|&i| windows[i].window.mz).sum::<f64>() / indices.len() as f64
        };
        let rt_min = indices.iter().map(|&i| windows[i].window.rt_min).fold(f64::INFINITY, f64::min);
        let rt_max = indices.iter().map(|&i| windows[i].window.rt_max).fold(f64::NEG_INFINITY, f64::max);
        merged.push(Window::new(mz, rt_min, rt_max));
    }
    merged.sort_by(|a, b| a.mz.partial_cmp(&b.mz).unwrap_or(std::cmp::Ordering::Equal));

    (merged, ClusteringReport { cluster_sizes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clustering_scenario() {
        // spec §8 scenario 3.
        let windows = vec![
            WeightedWindow { window: Window::new(500.0, 10.0, 20.0), intensity: 1.0 },
            WeightedWindow { window: Window::new(500.0002, 15.0, 25.0), intensity: 1.0 },
            WeightedWindow { window: Window::new(700.0, 10.0, 20.0), intensity: 1.0 },
        ];
        let settings = ClusteringSettings { rt_tol: 1.0, mz_tol: MzTolerance::Ppm(5.0) };
        let (merged, report) = cluster(&windows, &settings);

        assert_eq!(merged.len(), 2);
        assert!((merged[0].mz - 500.0001).abs() < 1e-6);
        assert!((merged[0].rt_min - 10.0).abs() < 1e-9);
        assert!((merged[0].rt_max - 25.0).abs() < 1e-9);
        assert!((merged[1].mz - 700.0).abs() < 1e-9);

        assert_eq!(report.cluster_sizes.get(&2), Some(&1));
        assert_eq!(report.cluster_sizes.get(&1), Some(&1));
    }

    #[test]
    fn disjoint_windows_stay_separate() {
        let windows = vec![
            WeightedWindow { window: Window::new(100.0, 0.0, 1.0), intensity: 1.0 },
            WeightedWindow { window: Window::new(200.0, 0.0, 1.0), intensity: 1.0 },
        ];
        let settings = ClusteringSettings { rt_tol: 0.1, mz_tol: MzTolerance::Da(0.01) };
        let (merged, report) = cluster(&windows, &settings);
        assert_eq!(merged.len(), 2);
        assert_eq!(report.cluster_sizes.get(&1), Some(&2));
    }
}
