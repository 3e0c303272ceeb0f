//! Resample a pixel chain to a fixed number of points.
//!
//! Each coordinate is interpolated with a natural cubic spline over a
//! per-point parameter in `[0, 1]` and evaluated on a uniform grid. With
//! `Parametrization::IndexFraction` the parameter is `i / (m - 1)`, which is
//! uniform in index but not in length (diagonal steps are longer than
//! straight ones). `ArcLength` uses the normalized cumulative length instead.

use crate::domain::{Parametrization, PointChain, SampledCurve};
use crate::error::PanoError;
use crate::math::{NaturalCubicSpline, linspace, unit_grid};

/// Parameter value of every chain point.
pub fn chain_parameters(xs: &[f64], ys: &[f64], parametrization: Parametrization) -> Vec<f64> {
    let m = xs.len();
    if m < 2 {
        return vec![0.0; m];
    }
    match parametrization {
        Parametrization::IndexFraction => linspace(0.0, 1.0, m),
        Parametrization::ArcLength => {
            let mut acc = Vec::with_capacity(m);
            let mut total = 0.0;
            acc.push(0.0);
            for i in 1..m {
                total += (xs[i] - xs[i - 1]).hypot(ys[i] - ys[i - 1]);
                acc.push(total);
            }
            if total > 0.0 {
                acc.iter_mut().for_each(|v| *v /= total);
                // Exact endpoint, like `linspace`.
                acc[m - 1] = 1.0;
                acc
            } else {
                linspace(0.0, 1.0, m)
            }
        }
    }
}

/// Resample raw coordinates to `npoints` uniformly parametrized points.
pub fn normalize_points(
    xs: &[f64],
    ys: &[f64],
    npoints: usize,
    parametrization: Parametrization,
) -> Result<SampledCurve, PanoError> {
    if xs.len() != ys.len() {
        return Err(PanoError::invalid(format!(
            "Coordinate length mismatch: {} x values, {} y values.",
            xs.len(),
            ys.len()
        )));
    }
    match xs.len() {
        0 => Err(PanoError::EmptyArcade),
        1 => Ok(SampledCurve::new(vec![xs[0]; npoints], vec![ys[0]; npoints])),
        _ => {
            let t = chain_parameters(xs, ys, parametrization);
            let fx = NaturalCubicSpline::new(&t, xs)?;
            let fy = NaturalCubicSpline::new(&t, ys)?;
            let nt = unit_grid(npoints);
            Ok(SampledCurve::new(fx.eval_many(&nt), fy.eval_many(&nt)))
        }
    }
}

/// Resample a skeleton chain to `npoints` points.
pub fn normalize_chain(
    chain: &PointChain,
    npoints: usize,
    parametrization: Parametrization,
) -> Result<SampledCurve, PanoError> {
    normalize_points(&chain.xs(), &chain.ys(), npoints, parametrization)
}
