//! Bézier curve evaluation on parameter grids.
//!
//! For a control polygon with weights `w_0..w_d` (one coordinate at a time):
//!
//! ```text
//! B(t)  = Σ_{k=0..d} w_k C(d,k) (1-t)^{d-k} t^k
//! B'(t) = d Σ_{i=0..d-1} C(d-1,i) (1-t)^{d-1-i} t^i (w_{i+1} - w_i)
//! ```
//!
//! Every operation takes a whole grid of `t` values and returns arrays of the
//! same length; the fitter evaluates a full grid per objective call.
//!
//! The binomial coefficients come from a `BinomialTable` owned by the
//! evaluator behind an `RwLock`: lookups share the read lock and only a
//! missing row takes the write lock to append. One evaluator can therefore be
//! shared by parallel fitting runs.

use std::sync::{PoisonError, RwLock};

use nalgebra::DMatrix;

use crate::domain::{ControlPolygon, SampledCurve};
use crate::error::PanoError;
use crate::math::{BinomialTable, unit_grid};

#[derive(Debug, Default)]
pub struct BezierEvaluator {
    table: RwLock<BinomialTable>,
}

impl BezierEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing coefficient table, typically pre-extended to the
    /// degree about to be fitted so parallel restarts only take read locks.
    pub fn with_table(table: BinomialTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Number of Pascal rows cached so far.
    pub fn cached_rows(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Row `n` of Pascal's triangle, extending the table if needed.
    fn coefficients(&self, n: usize) -> Vec<f64> {
        {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(row) = table.row(n) {
                return row.to_vec();
            }
        }

        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.extend_to(n);
        table.row(n).map(<[f64]>::to_vec).unwrap_or_default()
    }

    /// `Σ_k w_k C(n,k) (1-t)^{n-k} t^k` over the whole grid.
    fn bernstein_sum(&self, n: usize, ts: &[f64], weights: &[f64]) -> Result<Vec<f64>, PanoError> {
        let coeffs = self.coefficients(n);
        let mut sum = vec![0.0; ts.len()];
        for (k, (&w, &c)) in weights.iter().zip(coeffs.iter()).enumerate() {
            let wk = w * c;
            let (pa, pb) = ((n - k) as i32, k as i32);
            for (s, &t) in sum.iter_mut().zip(ts) {
                *s += wk * (1.0 - t).powi(pa) * t.powi(pb);
            }
        }
        Ok(sum)
    }

    /// Curve points at every `t` in `ts`.
    pub fn evaluate(&self, cp: &ControlPolygon, ts: &[f64]) -> Result<SampledCurve, PanoError> {
        let d = cp.degree();
        let x = self.bernstein_sum(d, ts, &cp.xs())?;
        let y = self.bernstein_sum(d, ts, &cp.ys())?;
        Ok(SampledCurve::new(x, y))
    }

    pub fn evaluate_point(&self, cp: &ControlPolygon, t: f64) -> Result<[f64; 2], PanoError> {
        let c = self.evaluate(cp, &[t])?;
        Ok(c.point(0))
    }

    /// `npoints` samples on the uniform grid over `[0, 1]`.
    pub fn sample(&self, cp: &ControlPolygon, npoints: usize) -> Result<SampledCurve, PanoError> {
        self.evaluate(cp, &unit_grid(npoints))
    }

    /// Analytic first derivative `(x'(t), y'(t))`.
    pub fn derivative(&self, cp: &ControlPolygon, ts: &[f64]) -> Result<SampledCurve, PanoError> {
        let d = cp.degree();
        let scale = d as f64;
        let diff = |w: Vec<f64>| -> Vec<f64> { w.windows(2).map(|p| p[1] - p[0]).collect() };

        let mut x = self.bernstein_sum(d - 1, ts, &diff(cp.xs()))?;
        let mut y = self.bernstein_sum(d - 1, ts, &diff(cp.ys()))?;
        x.iter_mut().for_each(|v| *v *= scale);
        y.iter_mut().for_each(|v| *v *= scale);
        Ok(SampledCurve::new(x, y))
    }

    /// Tangent vectors; unit length when `normalize` is set.
    ///
    /// Normalizing fails with `DegenerateTangent` at the first sample whose
    /// derivative vanishes (e.g. repeated control points). The raw derivative
    /// (`normalize = false`) never fails and is the caller's fallback.
    pub fn tangent(
        &self,
        cp: &ControlPolygon,
        ts: &[f64],
        normalize: bool,
    ) -> Result<SampledCurve, PanoError> {
        let mut tangent = self.derivative(cp, ts)?;
        if normalize {
            normalize_in_place(&mut tangent)?;
        }
        Ok(tangent)
    }

    /// Unit normals: the unit tangent rotated by +90°, i.e. `(-ty, tx)`.
    ///
    /// This is the left-hand side of the direction of travel.
    pub fn normal(&self, cp: &ControlPolygon, ts: &[f64]) -> Result<SampledCurve, PanoError> {
        let tangent = self.tangent(cp, ts, true)?;
        let nx = tangent.y.iter().map(|ty| -ty).collect();
        Ok(SampledCurve::new(nx, tangent.x))
    }

    /// Offset curves `base(t) + i · distance · normal(t)` for `i = 1..=count`.
    pub fn parallel_curves(
        &self,
        cp: &ControlPolygon,
        distance: f64,
        count: usize,
        npoints: usize,
    ) -> Result<Vec<SampledCurve>, PanoError> {
        if !distance.is_finite() {
            return Err(PanoError::invalid("Offset distance must be finite."));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let ts = unit_grid(npoints);
        let base = self.evaluate(cp, &ts)?;
        let normal = self.normal(cp, &ts)?;

        Ok((1..=count)
            .map(|i| offset_curve(&base, &normal, i as f64 * distance))
            .collect())
    }

    /// Bernstein design matrix (`ts.len()` rows, `degree + 1` columns).
    pub fn basis_matrix(&self, degree: usize, ts: &[f64]) -> Result<DMatrix<f64>, PanoError> {
        let coeffs = self.coefficients(degree);
        Ok(DMatrix::from_fn(ts.len(), degree + 1, |r, k| {
            let t = ts[r];
            coeffs[k] * (1.0 - t).powi((degree - k) as i32) * t.powi(k as i32)
        }))
    }
}

/// Scale every `(x, y)` pair to unit length.
pub(crate) fn normalize_in_place(v: &mut SampledCurve) -> Result<(), PanoError> {
    for (index, (x, y)) in v.x.iter_mut().zip(v.y.iter_mut()).enumerate() {
        let mag = x.hypot(*y);
        if !(mag > 0.0 && mag.is_finite()) {
            return Err(PanoError::DegenerateTangent { index });
        }
        *x /= mag;
        *y /= mag;
    }
    Ok(())
}

/// `base + offset · normal`, sample by sample.
pub(crate) fn offset_curve(base: &SampledCurve, normal: &SampledCurve, offset: f64) -> SampledCurve {
    let x = base.x.iter().zip(&normal.x).map(|(b, n)| b + offset * n).collect();
    let y = base.y.iter().zip(&normal.y).map(|(b, n)| b + offset * n).collect();
    SampledCurve::new(x, y)
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rand::rngs::StdRng;

    use super::*;

    fn cubic() -> ControlPolygon {
        ControlPolygon::from_points(&[[0.0, 0.0], [1.0, 2.0], [3.0, 2.0], [4.0, 0.0]]).unwrap()
    }

    fn random_polygon(rng: &mut StdRng, npoints: usize) -> ControlPolygon {
        let coords = (0..2 * npoints).map(|_| rng.gen_range(-50.0..50.0)).collect();
        ControlPolygon::from_flat(coords).unwrap()
    }

    #[test]
    fn cubic_midpoint_uses_bernstein_weights() {
        let ev = BezierEvaluator::new();
        let p = ev.evaluate_point(&cubic(), 0.5).unwrap();
        assert!((p[0] - 2.0).abs() < 1e-12, "x = {}", p[0]);
        assert!((p[1] - 1.5).abs() < 1e-12, "y = {}", p[1]);
    }

    #[test]
    fn endpoints_are_interpolated() {
        let ev = BezierEvaluator::new();
        let mut rng = StdRng::seed_from_u64(7);
        for n in 2..12 {
            let cp = random_polygon(&mut rng, n);
            let c = ev.evaluate(&cp, &[0.0, 1.0]).unwrap();
            let first = cp.point(0);
            let last = cp.point(cp.degree());
            assert!((c.x[0] - first[0]).abs() < 1e-9 && (c.y[0] - first[1]).abs() < 1e-9);
            assert!((c.x[1] - last[0]).abs() < 1e-9 && (c.y[1] - last[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn derivative_matches_central_differences() {
        let ev = BezierEvaluator::new();
        let mut rng = StdRng::seed_from_u64(11);
        let h = 1e-6;
        for n in 2..9 {
            let cp = random_polygon(&mut rng, n);
            let ts: Vec<f64> = (1..20).map(|i| i as f64 / 20.0).collect();
            let d = ev.derivative(&cp, &ts).unwrap();
            let plus: Vec<f64> = ts.iter().map(|t| t + h).collect();
            let minus: Vec<f64> = ts.iter().map(|t| t - h).collect();
            let fp = ev.evaluate(&cp, &plus).unwrap();
            let fm = ev.evaluate(&cp, &minus).unwrap();
            for i in 0..ts.len() {
                let fx = (fp.x[i] - fm.x[i]) / (2.0 * h);
                let fy = (fp.y[i] - fm.y[i]) / (2.0 * h);
                assert!((d.x[i] - fx).abs() < 1e-4, "x' at t={} : {} vs {}", ts[i], d.x[i], fx);
                assert!((d.y[i] - fy).abs() < 1e-4, "y' at t={} : {} vs {}", ts[i], d.y[i], fy);
            }
        }
    }

    #[test]
    fn zero_count_gives_empty_family() {
        let ev = BezierEvaluator::new();
        assert!(ev.parallel_curves(&cubic(), 2.0, 0, 50).unwrap().is_empty());
    }

    #[test]
    fn line_offsets_are_at_exact_distance() {
        let ev = BezierEvaluator::new();
        let cp = ControlPolygon::from_points(&[[1.0, 1.0], [7.0, 9.0]]).unwrap();
        let base = ev.sample(&cp, 40).unwrap();
        let curves = ev.parallel_curves(&cp, 2.5, 3, 40).unwrap();
        assert_eq!(curves.len(), 3);
        for (i, c) in curves.iter().enumerate() {
            let expected = 2.5 * (i + 1) as f64;
            for j in 0..c.len() {
                let dist = (c.x[j] - base.x[j]).hypot(c.y[j] - base.y[j]);
                assert!((dist - expected).abs() < 1e-12, "curve {i}, sample {j}: {dist}");
            }
        }
    }

    #[test]
    fn normal_points_left_of_travel() {
        let ev = BezierEvaluator::new();
        let cp = ControlPolygon::from_points(&[[0.0, 0.0], [10.0, 0.0]]).unwrap();
        let n = ev.normal(&cp, &[0.25, 0.75]).unwrap();
        for i in 0..2 {
            assert!(n.x[i].abs() < 1e-12);
            assert!((n.y[i] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn repeated_points_give_degenerate_tangent() {
        let ev = BezierEvaluator::new();
        let cp = ControlPolygon::from_points(&[[3.0, 3.0], [3.0, 3.0], [3.0, 3.0]]).unwrap();
        let ts = unit_grid(5);
        assert_eq!(
            ev.tangent(&cp, &ts, true),
            Err(PanoError::DegenerateTangent { index: 0 })
        );
        // The raw derivative is still available as a fallback.
        let raw = ev.tangent(&cp, &ts, false).unwrap();
        assert!(raw.x.iter().chain(raw.y.iter()).all(|v| *v == 0.0));
        assert!(ev.parallel_curves(&cp, 1.0, 2, 5).is_err());
    }

    #[test]
    fn high_degree_extends_the_table_once() {
        let ev = BezierEvaluator::new();
        assert_eq!(ev.cached_rows(), 7);
        let mut rng = StdRng::seed_from_u64(3);
        let cp = random_polygon(&mut rng, 13);
        ev.sample(&cp, 10).unwrap();
        assert_eq!(ev.cached_rows(), 13);
        ev.sample(&cp, 10).unwrap();
        assert_eq!(ev.cached_rows(), 13);
    }

    #[test]
    fn pre_extended_table_is_used_as_is() {
        let mut table = BinomialTable::new();
        table.extend_to(20);
        let ev = BezierEvaluator::with_table(table);
        assert_eq!(ev.cached_rows(), 21);
        let mut rng = StdRng::seed_from_u64(5);
        ev.sample(&random_polygon(&mut rng, 15), 10).unwrap();
        assert_eq!(ev.cached_rows(), 21);
    }

    #[test]
    fn very_high_degree_keeps_linear_precision() {
        // Evenly spaced collinear control points trace the segment at speed 1.
        let n = 90;
        let pts: Vec<[f64; 2]> = (0..n)
            .map(|k| {
                let s = k as f64 / (n - 1) as f64;
                [10.0 * s, 20.0 * s]
            })
            .collect();
        let cp = ControlPolygon::from_points(&pts).unwrap();
        let ev = BezierEvaluator::new();
        let ts = unit_grid(11);
        let c = ev.evaluate(&cp, &ts).unwrap();
        for (i, &t) in ts.iter().enumerate() {
            assert!((c.x[i] - 10.0 * t).abs() < 1e-9, "x at t={t}");
            assert!((c.y[i] - 20.0 * t).abs() < 1e-9, "y at t={t}");
        }
    }

    #[test]
    fn basis_matrix_reproduces_evaluation() {
        let ev = BezierEvaluator::new();
        let cp = cubic();
        let ts = unit_grid(9);
        let b = ev.basis_matrix(cp.degree(), &ts).unwrap();
        let wx = nalgebra::DVector::from_vec(cp.xs());
        let x = &b * wx;
        let c = ev.evaluate(&cp, &ts).unwrap();
        for i in 0..ts.len() {
            assert!((x[i] - c.x[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn evaluator_is_shareable() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<BezierEvaluator>();
    }
}
