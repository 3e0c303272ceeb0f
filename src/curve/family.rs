//! Curve family assembly.
//!
//! The family handed to the resampler is ordered by signed offset:
//!
//! ```text
//! -n·d, ..., -d, 0, +d, ..., +n·d
//! ```
//!
//! Each side is produced by `parallel_curves` (which returns increasing
//! multiples), so the negative side is reversed before concatenation.

use crate::curve::bezier::BezierEvaluator;
use crate::domain::{ControlPolygon, CurveFamily, SampledCurve};
use crate::error::PanoError;

/// Build the `2n + 1` curve family around a fitted Bézier curve.
pub fn build_family(
    evaluator: &BezierEvaluator,
    cp: &ControlPolygon,
    distance: f64,
    count: usize,
    npoints: usize,
) -> Result<CurveFamily, PanoError> {
    validate_family_args(distance, npoints)?;

    let negative = evaluator.parallel_curves(cp, -distance, count, npoints)?;
    let center = evaluator.sample(cp, npoints)?;
    let positive = evaluator.parallel_curves(cp, distance, count, npoints)?;

    Ok(assemble_family(negative, center, positive, distance))
}

pub(crate) fn validate_family_args(distance: f64, npoints: usize) -> Result<(), PanoError> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(PanoError::invalid(format!(
            "Curve distance must be finite and > 0, got {distance}."
        )));
    }
    if npoints == 0 {
        return Err(PanoError::invalid("Curves need at least one sample point."));
    }
    Ok(())
}

/// Concatenate `reverse(negative) ++ [center] ++ positive`.
///
/// `negative[i]` and `positive[i]` must be the curves at `(i + 1) · distance`
/// on their side.
pub(crate) fn assemble_family(
    mut negative: Vec<SampledCurve>,
    center: SampledCurve,
    positive: Vec<SampledCurve>,
    distance: f64,
) -> CurveFamily {
    let count = positive.len();
    debug_assert_eq!(negative.len(), count);
    negative.reverse();

    let offsets = (-(count as i64)..=count as i64)
        .map(|i| i as f64 * distance)
        .collect();

    let mut curves = negative;
    curves.reserve(count + 1);
    curves.push(center);
    curves.extend(positive);

    CurveFamily {
        distance,
        count,
        offsets,
        curves,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> ControlPolygon {
        ControlPolygon::from_points(&[[10.0, 80.0], [30.0, 10.0], [70.0, 10.0], [90.0, 80.0]])
            .unwrap()
    }

    #[test]
    fn family_has_two_n_plus_one_curves_in_offset_order() {
        let ev = BezierEvaluator::new();
        let fam = build_family(&ev, &arch(), 3.0, 4, 100).unwrap();
        assert_eq!(fam.len(), 9);
        assert_eq!(fam.npoints(), 100);
        assert_eq!(fam.offsets, vec![-12.0, -9.0, -6.0, -3.0, 0.0, 3.0, 6.0, 9.0, 12.0]);

        let center = ev.sample(&arch(), 100).unwrap();
        assert_eq!(fam.center(), &center);

        // Signed distance along the normal grows monotonically through the family.
        let normal = ev.normal(&arch(), &crate::math::unit_grid(100)).unwrap();
        let j = 37;
        let mut prev = f64::NEG_INFINITY;
        for (curve, offset) in fam.curves.iter().zip(&fam.offsets) {
            let along = (curve.x[j] - center.x[j]) * normal.x[j] + (curve.y[j] - center.y[j]) * normal.y[j];
            assert!((along - offset).abs() < 1e-9);
            assert!(along > prev);
            prev = along;
        }
    }

    #[test]
    fn zero_count_family_is_just_the_curve() {
        let ev = BezierEvaluator::new();
        let fam = build_family(&ev, &arch(), 2.0, 0, 20).unwrap();
        assert_eq!(fam.len(), 1);
        assert_eq!(fam.offsets, vec![0.0]);
    }

    #[test]
    fn family_rejects_bad_arguments() {
        let ev = BezierEvaluator::new();
        assert!(build_family(&ev, &arch(), 0.0, 2, 20).is_err());
        assert!(build_family(&ev, &arch(), f64::NAN, 2, 20).is_err());
        assert!(build_family(&ev, &arch(), 1.0, 2, 0).is_err());
    }

    #[test]
    fn degenerate_curve_propagates_tangent_error() {
        let ev = BezierEvaluator::new();
        let cp = ControlPolygon::from_points(&[[5.0, 5.0], [5.0, 5.0]]).unwrap();
        assert!(matches!(
            build_family(&ev, &cp, 1.0, 1, 10),
            Err(PanoError::DegenerateTangent { .. })
        ));
    }
}
