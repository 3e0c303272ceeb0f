//! Bézier fit to the normalized skeleton.
//!
//! Given:
//! - target points `q_i` (the normalized skeleton, `N` of them)
//! - a degree `d` (`nctrl_points - 1`)
//!
//! we look for control points `P_k` such that the curve sampled at
//! `t_i = i / (N - 1)` lies as close as possible to the targets. Since
//! `C(t_i) = Σ_k B_k(t_i) P_k`, residuals are linear in the control points
//! and both objectives have closed-form gradients.
//!
//! Several restarts run in parallel and the lowest objective wins.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::curve::BezierEvaluator;
use crate::domain::{ControlPolygon, ObjectiveKind, OptimizerKind, SampledCurve};
use crate::error::PanoError;
use crate::fit::init::{Initialization, initial_guess};
use crate::fit::optimizer::{Bfgs, Minimizer, Minimum, NelderMead, Objective};
use crate::math::unit_grid;

/// Options for one curve fit.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub objective: ObjectiveKind,
    pub optimizer: OptimizerKind,
    pub init: Initialization,
    /// Independent starts; at least one.
    pub restarts: usize,
    pub max_iters: usize,
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            objective: ObjectiveKind::DistanceSum,
            optimizer: OptimizerKind::NelderMead,
            init: Initialization::Random { seed: 0 },
            restarts: 1,
            max_iters: 20_000,
            tolerance: 1e-4,
        }
    }
}

impl FitOptions {
    pub fn minimizer(&self) -> Box<dyn Minimizer> {
        match self.optimizer {
            OptimizerKind::NelderMead => Box::new(NelderMead {
                max_iters: self.max_iters,
                tolerance: self.tolerance,
            }),
            OptimizerKind::Bfgs => Box::new(Bfgs {
                max_iters: self.max_iters,
                gradient_tolerance: self.tolerance,
                tolerance: 1e-12,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    Converged,
    /// Iteration cap reached (or the line search stalled) before tolerance.
    NonConvergent,
}

/// Best control polygon found.
#[derive(Debug, Clone)]
pub struct CurveFit {
    pub control: ControlPolygon,
    pub objective: f64,
    pub iterations: usize,
    pub status: FitStatus,
    /// Index of the winning restart.
    pub restart: usize,
}

impl CurveFit {
    pub fn is_converged(&self) -> bool {
        self.status == FitStatus::Converged
    }

    /// Turn a soft convergence failure into `NonConvergentFit`.
    pub fn require_converged(self) -> Result<Self, PanoError> {
        match self.status {
            FitStatus::Converged => Ok(self),
            FitStatus::NonConvergent => Err(PanoError::NonConvergentFit {
                iterations: self.iterations,
                objective: self.objective,
            }),
        }
    }
}

/// Distance between a candidate curve and the targets.
///
/// Parameters are the interleaved control coordinates `x0,y0,x1,y1,...`.
#[derive(Debug, Clone)]
pub struct CurveObjective {
    kind: ObjectiveKind,
    /// `N x (d + 1)` Bernstein basis at the target parameters.
    basis: DMatrix<f64>,
    tx: Vec<f64>,
    ty: Vec<f64>,
}

impl CurveObjective {
    pub fn new(
        evaluator: &BezierEvaluator,
        kind: ObjectiveKind,
        targets: &SampledCurve,
        ts: &[f64],
        nctrl_points: usize,
    ) -> Result<Self, PanoError> {
        if nctrl_points < 2 {
            return Err(PanoError::InvalidControlPolygon {
                len: 2 * nctrl_points,
            });
        }
        if ts.len() != targets.len() {
            return Err(PanoError::invalid(format!(
                "Parameter grid has {} values for {} targets.",
                ts.len(),
                targets.len()
            )));
        }
        Ok(Self {
            kind,
            basis: evaluator.basis_matrix(nctrl_points - 1, ts)?,
            tx: targets.x.clone(),
            ty: targets.y.clone(),
        })
    }

    /// Per-target residual vectors `C(t_i) - q_i`.
    fn residuals(&self, params: &[f64]) -> Vec<(f64, f64)> {
        let ncols = self.basis.ncols();
        (0..self.basis.nrows())
            .map(|i| {
                let (mut cx, mut cy) = (0.0, 0.0);
                for k in 0..ncols {
                    let b = self.basis[(i, k)];
                    cx += b * params[2 * k];
                    cy += b * params[2 * k + 1];
                }
                (cx - self.tx[i], cy - self.ty[i])
            })
            .collect()
    }
}

impl Objective for CurveObjective {
    fn dim(&self) -> usize {
        2 * self.basis.ncols()
    }

    fn value(&self, params: &[f64]) -> f64 {
        let residuals = self.residuals(params);
        match self.kind {
            ObjectiveKind::DistanceSum => residuals.iter().map(|(rx, ry)| rx.hypot(*ry)).sum(),
            ObjectiveKind::ResidualNorm => residuals
                .iter()
                .map(|(rx, ry)| rx * rx + ry * ry)
                .sum::<f64>()
                .sqrt(),
        }
    }

    fn gradient(&self, params: &[f64], grad: &mut [f64]) {
        let residuals = self.residuals(params);
        grad.iter_mut().for_each(|g| *g = 0.0);

        // Per-residual weight `w_i` such that `∂f/∂C_i = w_i r_i`.
        let weights: Vec<f64> = match self.kind {
            ObjectiveKind::DistanceSum => residuals
                .iter()
                .map(|(rx, ry)| {
                    let d = rx.hypot(*ry);
                    if d > 0.0 { 1.0 / d } else { 0.0 }
                })
                .collect(),
            ObjectiveKind::ResidualNorm => {
                let norm = residuals
                    .iter()
                    .map(|(rx, ry)| rx * rx + ry * ry)
                    .sum::<f64>()
                    .sqrt();
                let w = if norm > 0.0 { 1.0 / norm } else { 0.0 };
                vec![w; residuals.len()]
            }
        };

        for (i, ((rx, ry), w)) in residuals.iter().zip(&weights).enumerate() {
            for k in 0..self.basis.ncols() {
                let b = self.basis[(i, k)] * w;
                grad[2 * k] += b * rx;
                grad[2 * k + 1] += b * ry;
            }
        }
    }
}

/// Fit a Bézier curve with `nctrl_points` control points to `targets`.
///
/// Restarts are evaluated in parallel; the minimum objective wins and ties
/// go to the lowest restart index. A non-converged winner is returned with
/// `FitStatus::NonConvergent`.
pub fn fit_curve(
    evaluator: &BezierEvaluator,
    targets: &SampledCurve,
    nctrl_points: usize,
    opts: &FitOptions,
) -> Result<CurveFit, PanoError> {
    if targets.is_empty() {
        return Err(PanoError::invalid("No target points to fit."));
    }
    if opts.restarts == 0 {
        return Err(PanoError::invalid("Restart count must be > 0."));
    }
    if !(opts.tolerance.is_finite() && opts.tolerance > 0.0) {
        return Err(PanoError::invalid("Fit tolerance must be finite and > 0."));
    }

    let ts = unit_grid(targets.len());
    let objective = CurveObjective::new(evaluator, opts.objective, targets, &ts, nctrl_points)?;
    let minimizer = opts.minimizer();

    // Identical starts would give identical results.
    let restarts = if opts.init.is_randomized() {
        opts.restarts
    } else {
        1
    };

    log::info!(
        "fitting {nctrl_points} control points to {} targets ({}, {:?}, {restarts} restart(s))",
        targets.len(),
        minimizer.name(),
        opts.objective
    );

    let minima: Vec<(usize, Minimum)> = (0..restarts)
        .into_par_iter()
        .map(|restart| -> Result<(usize, Minimum), PanoError> {
            let start = initial_guess(opts.init, evaluator, targets, &ts, nctrl_points, restart)?;
            Ok((restart, minimizer.minimize(&objective, &start)))
        })
        .collect::<Result<_, _>>()?;

    // Deterministic selection: minimum objective, ties by restart index.
    let mut best = &minima[0];
    for m in &minima[1..] {
        if m.1.value < best.1.value || (m.1.value == best.1.value && m.0 < best.0) {
            best = m;
        }
    }
    let (restart, minimum) = best;

    let status = if minimum.converged {
        FitStatus::Converged
    } else {
        log::warn!(
            "curve fit did not converge after {} iterations (objective {:.6})",
            minimum.iterations,
            minimum.value
        );
        FitStatus::NonConvergent
    };

    Ok(CurveFit {
        control: ControlPolygon::from_flat(minimum.params.clone())?,
        objective: minimum.value,
        iterations: minimum.iterations,
        status,
        restart: *restart,
    })
}
