//! 2-D RT x m/z rasterisation (spec §4.11, component C11).
//!
//! Orthogonal to the scheduling pipeline but shares its RT/mz coordinate
//! algebra (`pslp_core::numeric::Grid`'s bilinear splat/interpolate), which
//! is also what the ILP's RT-bin scoring uses — the clamp-to-edge
//! extrapolation convention must match between the two.

pub mod raster;

pub use raster::{Axes, Gradient, GradientStop, IntensityTransform, Ms2Marker, Raster, RasterSettings};
