//! Unconstrained minimizers.
//!
//! Both strategies work on flat `f64` parameter vectors and report the best
//! iterate together with a convergence flag. Running out of iterations is not
//! an error here; the caller decides what a non-converged minimum means.

use nalgebra::{DMatrix, DVector};

/// A scalar function of `dim()` parameters.
pub trait Objective: Sync {
    fn dim(&self) -> usize;

    fn value(&self, params: &[f64]) -> f64;

    /// Gradient into `grad` (length `dim()`).
    ///
    /// The default uses central differences; implementors with an analytic
    /// gradient should override it.
    fn gradient(&self, params: &[f64], grad: &mut [f64]) {
        let mut probe = params.to_vec();
        for (i, g) in grad.iter_mut().enumerate() {
            let h = 1e-6 * params[i].abs().max(1.0);
            probe[i] = params[i] + h;
            let up = self.value(&probe);
            probe[i] = params[i] - h;
            let down = self.value(&probe);
            probe[i] = params[i];
            *g = (up - down) / (2.0 * h);
        }
    }
}

/// Result of one minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub params: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimization strategy.
pub trait Minimizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn minimize(&self, objective: &dyn Objective, start: &[f64]) -> Minimum;
}

/// NaN compares as +inf so it never wins.
fn finite_or_inf(v: f64) -> f64 {
    if v.is_nan() { f64::INFINITY } else { v }
}

/// Downhill simplex (Nelder–Mead) with the standard coefficients
/// (reflection 1, expansion 2, contraction 0.5, shrink 0.5).
#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iters: usize,
    /// Absolute tolerance on both the simplex value spread and its size.
    pub tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iters: 20_000,
            tolerance: 1e-4,
        }
    }
}

impl NelderMead {
    fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
        let mut simplex = vec![start.to_vec()];
        for i in 0..start.len() {
            let mut v = start.to_vec();
            v[i] = if v[i] != 0.0 { v[i] * 1.05 } else { 2.5e-4 };
            simplex.push(v);
        }
        simplex
    }

    fn has_converged(&self, points: &[Vec<f64>], values: &[f64]) -> bool {
        let f_spread = values[1..]
            .iter()
            .map(|v| (v - values[0]).abs())
            .fold(0.0, f64::max);
        let x_spread = points[1..]
            .iter()
            .flat_map(|p| p.iter().zip(&points[0]).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        f_spread <= self.tolerance && x_spread <= self.tolerance
    }
}

fn sort_simplex(points: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *points = order.iter().map(|&i| points[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}

/// `c + coef * (c - p)`
fn along(c: &[f64], p: &[f64], coef: f64) -> Vec<f64> {
    c.iter().zip(p).map(|(ci, pi)| ci + coef * (ci - pi)).collect()
}

impl Minimizer for NelderMead {
    fn name(&self) -> &'static str {
        "nelder-mead"
    }

    fn minimize(&self, objective: &dyn Objective, start: &[f64]) -> Minimum {
        let n = start.len();
        let eval = |p: &[f64]| finite_or_inf(objective.value(p));

        let mut points = Self::initial_simplex(start);
        let mut values: Vec<f64> = points.iter().map(|p| eval(p.as_slice())).collect();
        sort_simplex(&mut points, &mut values);

        let mut iterations = 0;
        let mut converged = n == 0 || self.has_converged(&points, &values);

        while !converged && iterations < self.max_iters {
            iterations += 1;

            let mut centroid = vec![0.0; n];
            for p in &points[..n] {
                for (c, v) in centroid.iter_mut().zip(p) {
                    *c += v / n as f64;
                }
            }

            let worst = points[n].clone();
            let f_worst = values[n];
            let reflected = along(&centroid, &worst, 1.0);
            let f_reflected = eval(reflected.as_slice());

            let mut replacement = None;
            if f_reflected < values[0] {
                let expanded = along(&centroid, &worst, 2.0);
                let f_expanded = eval(expanded.as_slice());
                replacement = Some(if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                });
            } else if f_reflected < values[n - 1] {
                replacement = Some((reflected, f_reflected));
            } else if f_reflected < f_worst {
                let outside = along(&centroid, &worst, 0.5);
                let f_outside = eval(outside.as_slice());
                if f_outside <= f_reflected {
                    replacement = Some((outside, f_outside));
                }
            } else {
                let inside = along(&centroid, &worst, -0.5);
                let f_inside = eval(inside.as_slice());
                if f_inside < f_worst {
                    replacement = Some((inside, f_inside));
                }
            }

            match replacement {
                Some((p, f)) => {
                    points[n] = p;
                    values[n] = f;
                }
                None => {
                    // Shrink towards the best vertex.
                    let best = points[0].clone();
                    for i in 1..=n {
                        points[i] = along(&best, &points[i], -0.5);
                        values[i] = eval(points[i].as_slice());
                    }
                }
            }

            sort_simplex(&mut points, &mut values);
            converged = self.has_converged(&points, &values);
        }

        log::debug!(
            "nelder-mead: {iterations} iterations, f = {:.6e}, converged = {converged}",
            values[0]
        );
        Minimum {
            params: points.swap_remove(0),
            value: values[0],
            iterations,
            converged,
        }
    }
}

/// Quasi-Newton BFGS with a backtracking (Armijo) line search.
#[derive(Debug, Clone)]
pub struct Bfgs {
    pub max_iters: usize,
    /// Stop when the max-norm of the gradient drops below this.
    pub gradient_tolerance: f64,
    /// Stop when one step lowers the value by less than `tolerance * (1 + |f|)`.
    pub tolerance: f64,
}

impl Default for Bfgs {
    fn default() -> Self {
        Self {
            max_iters: 1_000,
            gradient_tolerance: 1e-6,
            tolerance: 1e-12,
        }
    }
}

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;

impl Bfgs {
    fn gradient(objective: &dyn Objective, x: &DVector<f64>) -> DVector<f64> {
        let mut g = vec![0.0; x.len()];
        objective.gradient(x.as_slice(), &mut g);
        DVector::from_vec(g)
    }

    /// Largest step `alpha = 0.5^k` satisfying the Armijo condition.
    fn line_search(
        objective: &dyn Objective,
        x: &DVector<f64>,
        f: f64,
        direction: &DVector<f64>,
        slope: f64,
    ) -> Option<(DVector<f64>, f64)> {
        let mut alpha = 1.0;
        for _ in 0..MAX_BACKTRACKS {
            let candidate = x + direction * alpha;
            let value = finite_or_inf(objective.value(candidate.as_slice()));
            if value <= f + ARMIJO_C1 * alpha * slope {
                return Some((candidate, value));
            }
            alpha *= 0.5;
        }
        None
    }
}

impl Minimizer for Bfgs {
    fn name(&self) -> &'static str {
        "bfgs"
    }

    fn minimize(&self, objective: &dyn Objective, start: &[f64]) -> Minimum {
        let n = start.len();
        let identity = DMatrix::<f64>::identity(n, n);

        let mut x = DVector::from_column_slice(start);
        let mut f = finite_or_inf(objective.value(start));
        let mut g = Self::gradient(objective, &x);
        let mut h_inv = identity.clone();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iters {
            if g.amax() <= self.gradient_tolerance {
                converged = true;
                break;
            }
            iterations += 1;

            let mut direction = -(&h_inv * &g);
            let mut slope = g.dot(&direction);
            if slope >= 0.0 {
                // Lost positive definiteness: restart from steepest descent.
                h_inv = identity.clone();
                direction = -g.clone();
                slope = -g.norm_squared();
            }

            let Some((x_next, f_next)) = Self::line_search(objective, &x, f, &direction, slope)
            else {
                log::debug!("bfgs: line search failed at iteration {iterations}, f = {f:.6e}");
                break;
            };

            let g_next = Self::gradient(objective, &x_next);
            let s = &x_next - &x;
            let y = &g_next - &g;
            let decrease = f - f_next;

            x = x_next;
            f = f_next;
            g = g_next;

            let sy = s.dot(&y);
            if sy > 1e-12 {
                let rho = 1.0 / sy;
                let left = &identity - (&s * y.transpose()) * rho;
                let right = &identity - (&y * s.transpose()) * rho;
                h_inv = left * &h_inv * right + (&s * s.transpose()) * rho;
            }

            if decrease <= self.tolerance * (1.0 + f.abs()) {
                converged = true;
                break;
            }
        }

        log::debug!("bfgs: {iterations} iterations, f = {f:.6e}, converged = {converged}");
        Minimum {
            params: x.iter().copied().collect(),
            value: f,
            iterations,
            converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shifted, scaled quadratic bowl with minimum 3 at (1, -2).
    struct Bowl;

    impl Objective for Bowl {
        fn dim(&self) -> usize {
            2
        }

        fn value(&self, p: &[f64]) -> f64 {
            (p[0] - 1.0).powi(2) + 4.0 * (p[1] + 2.0).powi(2) + 3.0
        }
    }

    struct Rosenbrock;

    impl Objective for Rosenbrock {
        fn dim(&self) -> usize {
            2
        }

        fn value(&self, p: &[f64]) -> f64 {
            (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2)
        }

        fn gradient(&self, p: &[f64], grad: &mut [f64]) {
            grad[0] = -2.0 * (1.0 - p[0]) - 400.0 * p[0] * (p[1] - p[0] * p[0]);
            grad[1] = 200.0 * (p[1] - p[0] * p[0]);
        }
    }

    #[test]
    fn default_gradient_uses_central_differences() {
        let mut g = [0.0; 2];
        Bowl.gradient(&[0.0, 0.0], &mut g);
        assert!((g[0] + 2.0).abs() < 1e-6, "g0 = {}", g[0]);
        assert!((g[1] - 16.0).abs() < 1e-6, "g1 = {}", g[1]);
    }

    #[test]
    fn nelder_mead_finds_bowl_minimum() {
        let nm = NelderMead {
            max_iters: 2_000,
            tolerance: 1e-8,
        };
        let m = nm.minimize(&Bowl, &[5.0, 5.0]);
        assert!(m.converged);
        assert!((m.params[0] - 1.0).abs() < 1e-3, "x = {:?}", m.params);
        assert!((m.params[1] + 2.0).abs() < 1e-3, "x = {:?}", m.params);
        assert!((m.value - 3.0).abs() < 1e-6);
    }

    #[test]
    fn nelder_mead_reports_iteration_cap() {
        let nm = NelderMead {
            max_iters: 3,
            tolerance: 1e-12,
        };
        let m = nm.minimize(&Rosenbrock, &[-1.2, 1.0]);
        assert!(!m.converged);
        assert_eq!(m.iterations, 3);
        assert!(m.value <= Rosenbrock.value(&[-1.2, 1.0]));
    }

    #[test]
    fn bfgs_solves_rosenbrock() {
        let m = Bfgs::default().minimize(&Rosenbrock, &[-1.2, 1.0]);
        assert!(m.converged);
        assert!((m.params[0] - 1.0).abs() < 1e-4, "x = {:?}", m.params);
        assert!((m.params[1] - 1.0).abs() < 1e-4, "x = {:?}", m.params);
    }

    #[test]
    fn bfgs_starting_at_the_minimum_stops_immediately() {
        let m = Bfgs::default().minimize(&Rosenbrock, &[1.0, 1.0]);
        assert!(m.converged);
        assert_eq!(m.iterations, 0);
        assert_eq!(m.value, 0.0);
    }
}
