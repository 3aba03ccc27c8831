//! RT x m/z bilinear rasterisation of an MS1 survey (spec §4.11, C11).
//!
//! Grounded on `examples/original_source/.../VISUAL/.../ImageCreator` (from
//! the retrieval pack's OpenMS sources): a rectangular `(rows, cols)` grid
//! spanning `[min_rt, max_rt] x [min_mz, max_mz]` (or transposed), filled by
//! bilinear splatting of each MS1 peak's intensity, then remapped through an
//! [`IntensityTransform`] and a piecewise-linear [`Gradient`]. The numerical
//! mapping is the contract this crate owns; image *encoding* (PNG, …) is an
//! external collaborator per spec §1.

use ndarray::Array2;
use pslp_core::entities::Spectrum;
use pslp_core::error::{PslpErrorKind, PslpResult, simple};
use pslp_core::numeric::Grid;

/// How raw intensities are remapped before colour lookup (spec §4.11).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntensityTransform {
    /// No remapping.
    Raw,
    /// `value / max * 100`.
    PercentageOfMax,
    /// `value / max * 2^24`, the original's "snap brightest pixel to
    /// `2^24`" convention.
    Snapped,
    /// `ln(1 + value)`.
    Log,
}

fn apply_transform(value: f64, max: f64, transform: IntensityTransform) -> f64 {
    match transform {
        IntensityTransform::Raw => value,
        IntensityTransform::PercentageOfMax => {
            if max > 0.0 {
                value / max * 100.0
            } else {
                0.0
            }
        }
        IntensityTransform::Snapped => {
            if max > 0.0 {
                value / max * f64::from(1_u32 << 24)
            } else {
                0.0
            }
        }
        IntensityTransform::Log => (1.0 + value.max(0.0)).ln(),
    }
}

/// Whether the RT axis is rows and m/z is columns, or the reverse (spec
/// §4.11 "or transposed").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axes {
    /// Rows = RT, columns = m/z.
    RtRows,
    /// Rows = m/z, columns = RT.
    Transposed,
}

/// Rasterisation knobs (spec §4.11).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterSettings {
    pub rows: usize,
    pub cols: usize,
    pub axes: Axes,
    /// Keep MS2 precursor positions as markers rather than grid intensity
    /// (spec §4.11: "restricted to MS1 (optionally retaining MS2 for
    /// markers)").
    pub retain_ms2_markers: bool,
}

/// An MS2 marker position retained alongside the MS1 raster, when
/// [`RasterSettings::retain_ms2_markers`] is set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ms2Marker {
    pub rt: f64,
    pub mz: f64,
}

/// The rasterised MS1 grid plus any retained MS2 markers.
#[derive(Clone, Debug)]
pub struct Raster {
    grid: Grid,
    axes: Axes,
    pub markers: Vec<Ms2Marker>,
}

impl Raster {
    /// Build a raster from `spectra`, restricted to MS1 peaks, spanning the
    /// RT range of the MS1 spectra and the m/z range of their peaks.
    ///
    /// # Errors
    /// [`PslpErrorKind::InvalidRange`] if `spectra` contains no MS1 scans.
    pub fn build(spectra: &[Spectrum], settings: &RasterSettings) -> PslpResult<Self> {
        let ms1: Vec<&Spectrum> = spectra.iter().filter(|s| s.ms_level == 1).collect();
        if ms1.is_empty() {
            return Err(simple(PslpErrorKind::InvalidRange, "no MS1 spectra to rasterise"));
        }

        let min_rt = ms1.iter().map(|s| s.rt).fold(f64::INFINITY, f64::min);
        let max_rt = ms1.iter().map(|s| s.rt).fold(f64::NEG_INFINITY, f64::max);
        let min_mz = ms1
            .iter()
            .flat_map(|s| s.peaks().iter().map(|p| p.mz))
            .fold(f64::INFINITY, f64::min);
        let max_mz = ms1
            .iter()
            .flat_map(|s| s.peaks().iter().map(|p| p.mz))
            .fold(f64::NEG_INFINITY, f64::max);

        // A single-scan input has zero RT span; widen by a half-scan so the
        // grid bounds stay non-degenerate (spec requires `x_min < x_max`).
        let (min_rt, max_rt) = if min_rt < max_rt { (min_rt, max_rt) } else { (min_rt - 0.5, max_rt + 0.5) };
        let (min_mz, max_mz) = if min_mz < max_mz { (min_mz, max_mz) } else { (min_mz - 0.5, max_mz + 0.5) };

        let (x_min, x_max, y_min, y_max) = match settings.axes {
            Axes::RtRows => (min_mz, max_mz, min_rt, max_rt),
            Axes::Transposed => (min_rt, max_rt, min_mz, max_mz),
        };
        let mut grid = Grid::new(settings.rows, settings.cols, x_min, x_max, y_min, y_max)?;

        let mut markers = Vec::new();
        for spectrum in &ms1 {
            for peak in spectrum.peaks() {
                let (x, y) = match settings.axes {
                    Axes::RtRows => (peak.mz, spectrum.rt),
                    Axes::Transposed => (spectrum.rt, peak.mz),
                };
                grid.splat(x, y, peak.intensity);
            }
        }
        if settings.retain_ms2_markers {
            for spectrum in spectra.iter().filter(|s| s.ms_level == 2) {
                for precursor in &spectrum.precursors {
                    markers.push(Ms2Marker { rt: spectrum.rt, mz: precursor.mz });
                }
            }
        }

        Ok(Self { grid, axes: settings.axes, markers })
    }

    /// Read the raster's cell values through `transform`, returned as a
    /// `(rows, cols)` array in `(row, col)` = `(y, x)` grid order regardless
    /// of [`Axes`] (the caller reinterprets axes via [`Raster::axes`]).
    pub fn to_array(&self, transform: IntensityTransform) -> Array2<f64> {
        let max = self.grid.max_value().max(0.0);
        let mut out = Array2::zeros((self.grid.rows(), self.grid.cols()));
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                out[[row, col]] = apply_transform(self.grid.get(row, col), max, transform);
            }
        }
        out
    }

    /// Bilinear-interpolated intensity at raw `(x, y)` grid coordinates
    /// (before axis reinterpretation), sharing the clamp-to-edge convention
    /// used by RT-bin scoring (spec §4.1).
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.grid.bilinear_interp(x, y)
    }

    /// Which axis is RT and which is m/z.
    pub fn axes(&self) -> Axes {
        self.axes
    }
}

/// One stop of a piecewise-linear colour gradient (spec §4.11 "piecewise-
/// linear gradient").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position in `[0, 1]` along the gradient.
    pub position: f64,
    pub color: (u8, u8, u8),
}

/// A piecewise-linear RGB gradient, optionally pre-calibrated in log space
/// (spec §4.11: "if `log` is active and the gradient comes from config,
/// intensities are log-transformed before gradient lookup, else the
/// gradient itself is log-calibrated").
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
    log_calibrated: bool,
}

impl Gradient {
    /// Build a gradient from stops sorted ascending by `position`.
    ///
    /// # Errors
    /// [`PslpErrorKind::InvalidValue`] if `stops` has fewer than two entries
    /// or is not sorted ascending by position.
    pub fn new(stops: Vec<GradientStop>, log_calibrated: bool) -> PslpResult<Self> {
        if stops.len() < 2 {
            return Err(simple(PslpErrorKind::InvalidValue, "gradient needs at least two stops"));
        }
        if stops.windows(2).any(|w| w[0].position > w[1].position) {
            return Err(simple(PslpErrorKind::InvalidValue, "gradient stops must be sorted ascending"));
        }
        Ok(Self { stops, log_calibrated })
    }

    /// Look up the colour at `value` (expected to already be normalised to
    /// roughly `[0, 1]`; out-of-range values clamp to the nearest stop).
    /// `log_active` indicates whether the caller already applied a log
    /// transform upstream of this lookup.
    pub fn colour_at(&self, value: f64, log_active: bool) -> (u8, u8, u8) {
        let v = if self.log_calibrated && !log_active {
            (1.0 + value.max(0.0)).ln()
        } else {
            value
        };
        let v = v.clamp(self.stops[0].position, self.stops[self.stops.len() - 1].position);

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if v >= a.position && v <= b.position {
                let span = b.position - a.position;
                let t = if span > 0.0 { (v - a.position) / span } else { 0.0 };
                return lerp_colour(a.color, b.color, t);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

fn lerp_colour(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let lerp = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * t).round() as u8;
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pslp_core::entities::{Peak, Polarity, Precursor, Spectrum};

    fn ms1(rt: f64, peaks: Vec<Peak>) -> Spectrum {
        Spectrum::new(peaks, rt, 1, vec![], Polarity::Positive)
    }

    #[test]
    fn builds_grid_spanning_ms1_range() {
        let spectra = vec![
            ms1(10.0, vec![Peak::new(500.0, 100.0)]),
            ms1(20.0, vec![Peak::new(600.0, 200.0)]),
        ];
        let settings = RasterSettings { rows: 8, cols: 8, axes: Axes::RtRows, retain_ms2_markers: false };
        let raster = Raster::build(&spectra, &settings).unwrap();
        assert_eq!(raster.to_array(IntensityTransform::Raw).dim(), (8, 8));
    }

    #[test]
    fn rejects_all_ms2_input() {
        let spectrum = Spectrum::new(vec![Peak::new(500.0, 1.0)], 1.0, 2, vec![], Polarity::Positive);
        let settings = RasterSettings { rows: 4, cols: 4, axes: Axes::RtRows, retain_ms2_markers: false };
        assert!(Raster::build(&[spectrum], &settings).is_err());
    }

    #[test]
    fn retains_ms2_markers_when_requested() {
        let ms2 = Spectrum::new(
            vec![Peak::new(100.0, 1.0)],
            15.0,
            2,
            vec![Precursor { mz: 555.0, charge: 2, isolation_lower: 554.0, isolation_upper: 556.0 }],
            Polarity::Positive,
        );
        let spectra = vec![ms1(10.0, vec![Peak::new(500.0, 100.0)]), ms2, ms1(20.0, vec![Peak::new(600.0, 200.0)])];
        let settings = RasterSettings { rows: 4, cols: 4, axes: Axes::RtRows, retain_ms2_markers: true };
        let raster = Raster::build(&spectra, &settings).unwrap();
        assert_eq!(raster.markers.len(), 1);
        assert!((raster.markers[0].mz - 555.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_of_max_normalises_to_hundred() {
        let spectra = vec![ms1(10.0, vec![Peak::new(500.0, 100.0)])];
        let settings = RasterSettings { rows: 2, cols: 2, axes: Axes::RtRows, retain_ms2_markers: false };
        let raster = Raster::build(&spectra, &settings).unwrap();
        let arr = raster.to_array(IntensityTransform::PercentageOfMax);
        let max = arr.iter().cloned().fold(f64::MIN, f64::max);
        assert!((max - 100.0).abs() < 1e-6);
    }

    #[test]
    fn gradient_requires_sorted_stops() {
        let stops = vec![GradientStop { position: 1.0, color: (0, 0, 0) }, GradientStop { position: 0.0, color: (255, 255, 255) }];
        assert!(Gradient::new(stops, false).is_err());
    }

    #[test]
    fn gradient_interpolates_linearly() {
        let stops = vec![GradientStop { position: 0.0, color: (0, 0, 0) }, GradientStop { position: 1.0, color: (200, 0, 0) }];
        let gradient = Gradient::new(stops, false).unwrap();
        assert_eq!(gradient.colour_at(0.5, false), (100, 0, 0));
    }
}
