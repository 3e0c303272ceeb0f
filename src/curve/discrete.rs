//! Parallel curves of a sampled polyline.
//!
//! Used to build a family straight from the normalized skeleton, without a
//! Bézier fit. Tangents come from the discrete gradient of each coordinate
//! (central differences inside, one-sided differences at both ends).

use crate::curve::bezier::{normalize_in_place, offset_curve};
use crate::curve::family::{assemble_family, validate_family_args};
use crate::domain::{CurveFamily, SampledCurve};
use crate::error::PanoError;

/// Discrete gradient with unit sample spacing.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    values[1] - values[0]
                } else if i == n - 1 {
                    values[n - 1] - values[n - 2]
                } else {
                    (values[i + 1] - values[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Unit normals (`+90°` rotation of the unit gradient).
pub fn polyline_normals(curve: &SampledCurve) -> Result<SampledCurve, PanoError> {
    let mut tangent = SampledCurve::new(gradient(&curve.x), gradient(&curve.y));
    normalize_in_place(&mut tangent)?;
    let nx = tangent.y.iter().map(|ty| -ty).collect();
    Ok(SampledCurve::new(nx, tangent.x))
}

/// Offset copies of `curve` at `i · distance`, `i = 1..=count`.
pub fn polyline_parallel_curves(
    curve: &SampledCurve,
    distance: f64,
    count: usize,
) -> Result<Vec<SampledCurve>, PanoError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let normal = polyline_normals(curve)?;
    Ok((1..=count)
        .map(|i| offset_curve(curve, &normal, i as f64 * distance))
        .collect())
}

/// `2n + 1` family around a sampled polyline, ordered like `build_family`.
pub fn build_polyline_family(
    curve: &SampledCurve,
    distance: f64,
    count: usize,
) -> Result<CurveFamily, PanoError> {
    validate_family_args(distance, curve.len())?;
    let negative = polyline_parallel_curves(curve, -distance, count)?;
    let positive = polyline_parallel_curves(curve, distance, count)?;
    Ok(assemble_family(negative, curve.clone(), positive, distance))
}
