//! Shared domain types.
//!
//! These types are kept small and mostly serializable so they can be:
//!
//! - passed between pipeline stages without copying through ad-hoc tuples
//! - exported to JSON/CSV
//! - reloaded later for inspection

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PanoError;

/// A 2D grid of booleans (row-major), typically one thresholded slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<bool>) -> Result<Self, PanoError> {
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| PanoError::invalid("Mask size overflow."))?;
        if data.len() != expected {
            return Err(PanoError::invalid(format!(
                "Mask size mismatch: expected {expected} pixels, got {}.",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Pixel value; out-of-bounds reads are background.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x]
    }

    /// Signed lookup used by neighborhood scans.
    pub fn get_signed(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && self.get(x as usize, y as usize)
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// First foreground pixel in raster (row-major) order.
    pub fn first_foreground(&self) -> Option<PixelCoord> {
        let idx = self.data.iter().position(|&v| v)?;
        Some(PixelCoord {
            x: idx % self.width,
            y: idx / self.width,
        })
    }

    /// Build a mask from text rows, `#` being foreground. Handy in tests.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        Self::from_fn(width, height, |x, y| rows[y].as_bytes().get(x) == Some(&b'#'))
    }
}

/// Integer pixel coordinate (`x` = column, `y` = row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: usize,
    pub y: usize,
}

impl PixelCoord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Apply a signed offset, returning `None` when it leaves the first quadrant.
    pub fn offset(self, dx: isize, dy: isize) -> Option<PixelCoord> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(PixelCoord { x, y })
    }
}

/// Ordered pixel path produced by the skeleton walk. Coordinates never repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointChain {
    points: Vec<PixelCoord>,
}

impl PointChain {
    pub(crate) fn from_points(points: Vec<PixelCoord>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PixelCoord] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x as f64).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y as f64).collect()
    }
}

/// Bézier control polygon stored as interleaved coordinates `x0, y0, x1, y1, ...`.
///
/// A degree-`d` curve has `2(d + 1)` coordinates; degree must be at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ControlPolygon {
    coords: Vec<f64>,
}

impl ControlPolygon {
    pub fn from_flat(coords: Vec<f64>) -> Result<Self, PanoError> {
        if coords.len() < 4 || coords.len() % 2 != 0 {
            return Err(PanoError::InvalidControlPolygon { len: coords.len() });
        }
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(PanoError::invalid("Control polygon contains non-finite coordinates."));
        }
        Ok(Self { coords })
    }

    pub fn from_points(points: &[[f64; 2]]) -> Result<Self, PanoError> {
        Self::from_flat(points.iter().flat_map(|p| [p[0], p[1]]).collect())
    }

    pub fn degree(&self) -> usize {
        self.coords.len() / 2 - 1
    }

    pub fn len(&self) -> usize {
        self.coords.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.coords
    }

    pub fn xs(&self) -> Vec<f64> {
        self.coords.iter().step_by(2).copied().collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.coords.iter().skip(1).step_by(2).copied().collect()
    }

    pub fn point(&self, i: usize) -> [f64; 2] {
        [self.coords[2 * i], self.coords[2 * i + 1]]
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.coords.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
    }
}

impl TryFrom<Vec<f64>> for ControlPolygon {
    type Error = PanoError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        ControlPolygon::from_flat(value)
    }
}

impl From<ControlPolygon> for Vec<f64> {
    fn from(value: ControlPolygon) -> Self {
        value.coords
    }
}

/// A curve sampled on a uniform parameter grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SampledCurve {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn point(&self, i: usize) -> [f64; 2] {
        [self.x[i], self.y[i]]
    }
}

/// Ordered set of parallel curves, most negative offset first.
///
/// `offsets[i]` is the signed normal displacement of `curves[i]`; the
/// zero-offset (fitted) curve appears exactly once, in the middle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFamily {
    pub distance: f64,
    pub count: usize,
    pub offsets: Vec<f64>,
    pub curves: Vec<SampledCurve>,
}

impl CurveFamily {
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// The zero-offset curve.
    pub fn center(&self) -> &SampledCurve {
        &self.curves[self.count]
    }

    /// Samples per curve.
    pub fn npoints(&self) -> usize {
        self.curves.first().map(SampledCurve::len).unwrap_or(0)
    }
}

/// Physical voxel size (x = column, y = row, z = slice).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub sx: f64,
    pub sy: f64,
    pub sz: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            sz: 1.0,
        }
    }
}

/// Voxel size of the flattened volume: `(s_curve, sz, distance)`.
///
/// `s_curve` is the mean physical distance between sample pairs
/// `(2j, 2j + 1)` of the center curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanoramicSpacing {
    pub s_curve: f64,
    pub sz: f64,
    pub distance: f64,
}

/// Portable result of a run (`pano run --output`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub created: DateTime<Utc>,
    /// Slice the arcade was extracted from.
    pub slice: usize,
    pub control_points: ControlPolygon,
    pub objective: f64,
    pub converged: bool,
    pub spacing: PanoramicSpacing,
    pub family: CurveFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton_family: Option<CurveFamily>,
}

/// Scalar volume stored slice-major: `data[(z * height + y) * width + x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    depth: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
    pub spacing: Spacing,
}

impl Volume {
    pub fn from_vec(
        depth: usize,
        height: usize,
        width: usize,
        data: Vec<f32>,
        spacing: Spacing,
    ) -> Result<Self, PanoError> {
        let expected = depth
            .checked_mul(height)
            .and_then(|v| v.checked_mul(width))
            .ok_or_else(|| PanoError::invalid("Volume size overflow."))?;
        if data.len() != expected {
            return Err(PanoError::invalid(format!(
                "Volume size mismatch: shape {depth}x{height}x{width} needs {expected} voxels, got {}.",
                data.len()
            )));
        }
        Ok(Self {
            depth,
            height,
            width,
            data,
            spacing,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(depth, height, width)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.depth, self.height, self.width)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn slice(&self, z: usize) -> &[f32] {
        let n = self.height * self.width;
        &self.data[z * n..(z + 1) * n]
    }

    /// Binary mask of slice `z` with `value >= threshold`.
    pub fn threshold_slice(&self, z: usize, threshold: f32) -> BinaryMask {
        let data = self.slice(z).iter().map(|&v| v >= threshold).collect();
        BinaryMask {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// How the point chain is parametrized before spline interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Parametrization {
    /// `t_i = i / (m - 1)`: uniform in index, not in length.
    IndexFraction,
    /// Cumulative Euclidean length normalized to `[0, 1]`.
    ArcLength,
}

/// Which distance aggregate the fitter minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveKind {
    /// Sum of per-point Euclidean distances.
    DistanceSum,
    /// Square root of the summed squared distances.
    ResidualNorm,
}

/// Minimizer strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizerKind {
    /// Derivative-free downhill simplex.
    NelderMead,
    /// Quasi-Newton with analytic gradients.
    Bfgs,
}

/// How the first control polygon is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InitKind {
    /// Uniform random points inside the targets' bounding box.
    Random,
    /// Exact linear least-squares solution for the squared residuals.
    LeastSquares,
}

/// Parameters of the skeleton extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonParams {
    /// Side of the square dilation neighborhood.
    pub dilation_size: usize,
    /// Gaussian sigma used to smooth the dilated blob.
    pub blur_sigma: f64,
}

impl Default for SkeletonParams {
    fn default() -> Self {
        Self {
            dilation_size: 30,
            blur_sigma: 2.0,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` overrides and defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Voxels with `value >= threshold` belong to the arcade.
    pub threshold: f32,
    pub skeleton: SkeletonParams,
    pub parametrization: Parametrization,

    /// Distance between neighboring curves of the family.
    pub distance: f64,
    /// Curves on each side of the fitted curve.
    pub ncurves: usize,
    /// Samples per curve.
    pub npoints: usize,
    /// Bézier control points (degree + 1).
    pub nctrl_points: usize,

    pub objective: ObjectiveKind,
    pub optimizer: OptimizerKind,
    pub init: InitKind,
    pub seed: u64,
    pub restarts: usize,
    pub max_iters: usize,
    pub tolerance: f64,

    /// Also build a family from the skeleton itself (discrete normals).
    pub skeleton_family: bool,
    pub export_csv: Option<PathBuf>,
    pub debug_bundle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_polygon_rejects_odd_and_short_inputs() {
        assert_eq!(
            ControlPolygon::from_flat(vec![0.0, 1.0, 2.0]),
            Err(PanoError::InvalidControlPolygon { len: 3 })
        );
        assert_eq!(
            ControlPolygon::from_flat(vec![0.0, 1.0]),
            Err(PanoError::InvalidControlPolygon { len: 2 })
        );
        let cp = ControlPolygon::from_flat(vec![0.0, 0.0, 1.0, 2.0, 3.0, 2.0]).unwrap();
        assert_eq!(cp.degree(), 2);
        assert_eq!(cp.xs(), vec![0.0, 1.0, 3.0]);
        assert_eq!(cp.ys(), vec![0.0, 2.0, 2.0]);
    }

    #[test]
    fn control_polygon_json_is_validated() {
        let ok: ControlPolygon = serde_json::from_str("[0, 0, 4, 0]").unwrap();
        assert_eq!(ok.degree(), 1);
        assert!(serde_json::from_str::<ControlPolygon>("[0, 0, 4]").is_err());
    }

    #[test]
    fn mask_raster_helpers() {
        let mask = BinaryMask::from_ascii(&["....", "..#.", "#..."]);
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.first_foreground(), Some(PixelCoord::new(2, 1)));
        assert!(!mask.get(10, 10));
        assert!(!mask.get_signed(-1, 0));
    }

    #[test]
    fn volume_threshold_slice() {
        let data = vec![0.0, 5.0, 10.0, 1.0, 20.0, 0.0, 0.0, 30.0];
        let vol = Volume::from_vec(2, 2, 2, data, Spacing::default()).unwrap();
        let mask = vol.threshold_slice(1, 10.0);
        assert_eq!(mask.data(), &[true, false, false, true]);
        assert!(Volume::from_vec(2, 2, 2, vec![0.0; 7], Spacing::default()).is_err());
    }
}
