//! Initial control polygons for the fitter.

use nalgebra::DVector;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::curve::BezierEvaluator;
use crate::domain::{InitKind, SampledCurve};
use crate::error::PanoError;
use crate::math::solve_least_squares;

/// Starting point of a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initialization {
    /// Control points drawn uniformly from the targets' bounding box.
    /// Restart `r` uses seed `seed + r`.
    Random { seed: u64 },
    /// Least-squares solution of the squared residuals on the same grid.
    LeastSquares,
}

impl Initialization {
    pub fn from_kind(kind: InitKind, seed: u64) -> Self {
        match kind {
            InitKind::Random => Initialization::Random { seed },
            InitKind::LeastSquares => Initialization::LeastSquares,
        }
    }

    /// Whether different restarts can start from different points.
    pub fn is_randomized(&self) -> bool {
        matches!(self, Initialization::Random { .. })
    }
}

/// Axis-aligned bounding box `(min_x, max_x, min_y, max_y)`.
fn bounding_box(targets: &SampledCurve) -> Result<(f64, f64, f64, f64), PanoError> {
    if targets.is_empty() {
        return Err(PanoError::invalid("Cannot initialize a fit without target points."));
    }
    let mut bb = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for (&x, &y) in targets.x.iter().zip(&targets.y) {
        if !(x.is_finite() && y.is_finite()) {
            return Err(PanoError::invalid("Target points must be finite."));
        }
        bb.0 = bb.0.min(x);
        bb.1 = bb.1.max(x);
        bb.2 = bb.2.min(y);
        bb.3 = bb.3.max(y);
    }
    Ok(bb)
}

/// Interleaved `x0,y0,x1,y1,...` drawn from the targets' bounding box.
pub fn random_guess(
    targets: &SampledCurve,
    nctrl_points: usize,
    seed: u64,
) -> Result<Vec<f64>, PanoError> {
    let (x0, x1, y0, y1) = bounding_box(targets)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let ux = Uniform::new_inclusive(x0, x1);
    let uy = Uniform::new_inclusive(y0, y1);

    let mut out = Vec::with_capacity(2 * nctrl_points);
    for _ in 0..nctrl_points {
        out.push(ux.sample(&mut rng));
        out.push(uy.sample(&mut rng));
    }
    Ok(out)
}

/// Control points minimizing the summed squared residuals at `ts`.
pub fn least_squares_guess(
    evaluator: &BezierEvaluator,
    targets: &SampledCurve,
    ts: &[f64],
    nctrl_points: usize,
) -> Result<Vec<f64>, PanoError> {
    bounding_box(targets)?;
    if ts.len() != targets.len() {
        return Err(PanoError::invalid(format!(
            "Parameter grid has {} values for {} targets.",
            ts.len(),
            targets.len()
        )));
    }
    if nctrl_points < 2 {
        return Err(PanoError::InvalidControlPolygon {
            len: 2 * nctrl_points,
        });
    }

    let basis = evaluator.basis_matrix(nctrl_points - 1, ts)?;
    let solve = |values: &[f64]| {
        solve_least_squares(&basis, &DVector::from_column_slice(values)).ok_or_else(|| {
            PanoError::invalid("Least-squares initialization failed (singular design).")
        })
    };
    let px = solve(&targets.x)?;
    let py = solve(&targets.y)?;

    Ok(px.iter().zip(py.iter()).flat_map(|(&x, &y)| [x, y]).collect())
}

/// Starting vector of restart `restart`.
pub fn initial_guess(
    init: Initialization,
    evaluator: &BezierEvaluator,
    targets: &SampledCurve,
    ts: &[f64],
    nctrl_points: usize,
    restart: usize,
) -> Result<Vec<f64>, PanoError> {
    match init {
        Initialization::Random { seed } => {
            random_guess(targets, nctrl_points, seed.wrapping_add(restart as u64))
        }
        Initialization::LeastSquares => least_squares_guess(evaluator, targets, ts, nctrl_points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ControlPolygon;
    use crate::math::unit_grid;

    fn cubic() -> ControlPolygon {
        ControlPolygon::from_flat(vec![0.0, 0.0, 1.0, 2.0, 3.0, 2.0, 4.0, 0.0]).unwrap()
    }

    #[test]
    fn random_guess_stays_in_bounding_box_and_is_seeded() {
        let targets = SampledCurve::new(vec![1.0, 5.0, 3.0], vec![-2.0, 0.0, 4.0]);
        let a = random_guess(&targets, 6, 42).unwrap();
        let b = random_guess(&targets, 6, 42).unwrap();
        let c = random_guess(&targets, 6, 43).unwrap();
        assert_eq!(a.len(), 12);
        assert_eq!(a, b);
        assert_ne!(a, c);
        for pair in a.chunks(2) {
            assert!((1.0..=5.0).contains(&pair[0]));
            assert!((-2.0..=4.0).contains(&pair[1]));
        }
    }

    #[test]
    fn random_guess_accepts_flat_targets() {
        let targets = SampledCurve::new(vec![0.0, 1.0, 2.0], vec![3.0; 3]);
        let guess = random_guess(&targets, 3, 7).unwrap();
        assert!(guess.chunks(2).all(|p| p[1] == 3.0));
    }

    #[test]
    fn least_squares_recovers_exact_control_points() {
        let ev = BezierEvaluator::new();
        let ts = unit_grid(40);
        let targets = ev.evaluate(&cubic(), &ts).unwrap();
        let guess = least_squares_guess(&ev, &targets, &ts, 4).unwrap();
        for (g, e) in guess.iter().zip(cubic().as_flat()) {
            assert!((g - e).abs() < 1e-8, "{g} vs {e}");
        }
    }

    #[test]
    fn empty_targets_are_rejected() {
        let ev = BezierEvaluator::new();
        let empty = SampledCurve::new(Vec::new(), Vec::new());
        assert!(matches!(
            initial_guess(Initialization::Random { seed: 0 }, &ev, &empty, &[], 4, 0),
            Err(PanoError::InvalidInput(_))
        ));
    }
}
