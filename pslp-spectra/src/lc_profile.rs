//! Per-feature list of elution signals with apex tracking (spec §4.3, C3).

use pslp_core::error::PslpResult;
use pslp_core::numeric::pearson_correlation;
use std::collections::BTreeMap;

/// A single MS1 signal observed at a particular scan: its retention time and
/// intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ms1Signal {
    /// Retention time of this signal.
    pub rt: f64,
    /// Intensity of this signal.
    pub intensity: f64,
}

impl Ms1Signal {
    /// The uninitialised sentinel apex: negative intensity marks "no
    /// elution signal has been added yet" (spec §3).
    const UNINITIALISED: Self = Self {
        rt: 0.0,
        intensity: -1.0,
    };
}

/// A feature's LC elution profile: the apex signal, the ordered elution
/// trace proper, and any signals observed outside the elution window.
///
/// Invariants (spec §3, §4.3): `apex.intensity == max(elution.intensity)`
/// once non-empty, or `apex.intensity < 0` while uninitialised;
/// `peak_area == sum(elution.intensity * delta_rt)`. No operation on this
/// type mutates intensities; `shift_rt` only translates the time axis.
#[derive(Clone, Debug)]
pub struct LcProfile {
    apex: Ms1Signal,
    elution: BTreeMap<u32, Ms1Signal>,
    outside: BTreeMap<u32, Ms1Signal>,
    peak_area: f64,
}

impl Default for LcProfile {
    fn default() -> Self {
        Self {
            apex: Ms1Signal::UNINITIALISED,
            elution: BTreeMap::new(),
            outside: BTreeMap::new(),
            peak_area: 0.0,
        }
    }
}

impl LcProfile {
    /// An empty, uninitialised profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current apex signal (`intensity < 0` if no elution point has
    /// been added yet).
    pub fn apex(&self) -> Ms1Signal {
        self.apex
    }

    /// The ordered elution trace, keyed by scan id.
    pub fn elution(&self) -> &BTreeMap<u32, Ms1Signal> {
        &self.elution
    }

    /// Signals observed outside the elution window (e.g. overlapping
    /// baseline), keyed by scan id.
    pub fn outside(&self) -> &BTreeMap<u32, Ms1Signal> {
        &self.outside
    }

    /// The integrated peak area under the elution trace.
    pub fn peak_area(&self) -> f64 {
        self.peak_area
    }

    /// Add an elution-window signal at `scan_id`, updating the apex and
    /// recomputing `peak_area`.
    pub fn add_elution_point(&mut self, scan_id: u32, signal: Ms1Signal) {
        self.elution.insert(scan_id, signal);
        if signal.intensity > self.apex.intensity {
            self.apex = signal;
        }
        self.recompute_peak_area();
    }

    /// Add a signal observed outside the elution window. Does not affect the
    /// apex or `peak_area`.
    pub fn add_outside_point(&mut self, scan_id: u32, signal: Ms1Signal) {
        self.outside.insert(scan_id, signal);
    }

    fn recompute_peak_area(&mut self) {
        let points: Vec<Ms1Signal> = self.elution.values().copied().collect();
        self.peak_area = match points.len() {
            0 => 0.0,
            // A single observed point has no interval to integrate over;
            // its intensity stands in for the area of a unit-width bin so
            // the "peak_area > 0 once non-empty" invariant still holds.
            1 => points[0].intensity,
            _ => points
                .windows(2)
                .map(|w| w[0].intensity * (w[1].rt - w[0].rt))
                .sum(),
        };
    }

    /// Elution-shape similarity to `other` as a Pearson correlation of
    /// intensities over the scans the two profiles share (`StatisticFunctions.h`'s
    /// correlation coefficient, supplementing spec §4.3/§4.4's RT-endpoint
    /// `sim` with an intensity-shape metric). Used optionally alongside C4's
    /// `elution_shape_similarity` when co-eluting evidence is weighted.
    ///
    /// # Errors
    /// [`pslp_core::error::PslpErrorKind::InvalidRange`] if the two profiles
    /// share fewer than two scans.
    pub fn correlation_with(&self, other: &LcProfile) -> PslpResult<f64> {
        let (mut xs, mut ys) = (Vec::new(), Vec::new());
        for (scan, signal) in &self.elution {
            if let Some(other_signal) = other.elution.get(scan) {
                xs.push(signal.intensity);
                ys.push(other_signal.intensity);
            }
        }
        if xs.len() < 2 {
            return Err(pslp_core::error::simple(
                pslp_core::error::PslpErrorKind::InvalidRange,
                "correlation_with requires at least two shared scans",
            ));
        }
        pearson_correlation(&xs, &ys)
    }

    /// Translate the whole profile's time axis by `delta`: every scan's `rt`
    /// and the apex's `rt` gain `delta`. Intensities, and therefore
    /// `peak_area`, are unaffected.
    pub fn shift_rt(&mut self, delta: f64) {
        self.apex.rt += delta;
        for signal in self.elution.values_mut() {
            signal.rt += delta;
        }
        for signal in self.outside.values_mut() {
            signal.rt += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apex_starts_uninitialised() {
        let profile = LcProfile::new();
        assert!(profile.apex().intensity < 0.0);
    }

    #[test]
    fn apex_tracks_maximum_intensity() {
        let mut profile = LcProfile::new();
        profile.add_elution_point(1, Ms1Signal { rt: 1.0, intensity: 5.0 });
        profile.add_elution_point(2, Ms1Signal { rt: 2.0, intensity: 9.0 });
        profile.add_elution_point(3, Ms1Signal { rt: 3.0, intensity: 2.0 });
        assert_eq!(profile.apex().intensity, 9.0);
        assert!(profile.peak_area() > 0.0);
    }

    #[test]
    fn correlation_with_matches_for_proportional_profiles() {
        let mut a = LcProfile::new();
        let mut b = LcProfile::new();
        for (scan, intensity) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
            a.add_elution_point(scan, Ms1Signal { rt: f64::from(scan), intensity });
            b.add_elution_point(scan, Ms1Signal { rt: f64::from(scan), intensity: intensity * 2.0 });
        }
        assert!((a.correlation_with(&b).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_with_rejects_fewer_than_two_shared_scans() {
        let mut a = LcProfile::new();
        let mut b = LcProfile::new();
        a.add_elution_point(1, Ms1Signal { rt: 1.0, intensity: 1.0 });
        b.add_elution_point(1, Ms1Signal { rt: 1.0, intensity: 1.0 });
        assert!(a.correlation_with(&b).is_err());
    }

    #[test]
    fn shift_rt_moves_apex_and_elution_only() {
        let mut profile = LcProfile::new();
        profile.add_elution_point(1, Ms1Signal { rt: 1.0, intensity: 5.0 });
        profile.add_elution_point(2, Ms1Signal { rt: 2.0, intensity: 9.0 });
        let area_before = profile.peak_area();
        profile.shift_rt(10.0);
        assert_eq!(profile.apex().rt, 12.0);
        assert_eq!(profile.elution()[&1].rt, 11.0);
        assert_eq!(profile.peak_area(), area_before);
    }
}
