//! Natural cubic spline interpolation.
//!
//! Given strictly increasing knots `t_i` and values `y_i`, we solve the
//! tridiagonal system for the second derivatives `M_i` with the natural
//! boundary condition `M_0 = M_{n-1} = 0`, then evaluate
//!
//! ```text
//! S(t) = a y_i + b y_{i+1} + ((a^3 - a) M_i + (b^3 - b) M_{i+1}) h^2 / 6
//! ```
//!
//! with `h = t_{i+1} - t_i`, `a = (t_{i+1} - t) / h`, `b = 1 - a`.
//! Outside the knot range the end segments are extended.

use crate::error::PanoError;

#[derive(Debug, Clone)]
pub struct NaturalCubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second: Vec<f64>,
}

impl NaturalCubicSpline {
    pub fn new(knots: &[f64], values: &[f64]) -> Result<Self, PanoError> {
        if knots.len() != values.len() {
            return Err(PanoError::invalid(format!(
                "Spline knots/values length mismatch: {} vs {}.",
                knots.len(),
                values.len()
            )));
        }
        if knots.is_empty() {
            return Err(PanoError::invalid("Spline needs at least one knot."));
        }
        if knots.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(PanoError::invalid("Spline input contains non-finite values."));
        }
        if knots.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PanoError::invalid("Spline knots must be strictly increasing."));
        }

        let second = solve_second_derivatives(knots, values);
        Ok(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            second,
        })
    }

    pub fn eval(&self, t: f64) -> f64 {
        let n = self.knots.len();
        if n == 1 {
            return self.values[0];
        }

        // Segment index i such that knots[i] <= t < knots[i + 1], clamped to the ends.
        let i = self
            .knots
            .partition_point(|&k| k <= t)
            .saturating_sub(1)
            .min(n - 2);

        let h = self.knots[i + 1] - self.knots[i];
        let a = (self.knots[i + 1] - t) / h;
        let b = (t - self.knots[i]) / h;
        a * self.values[i]
            + b * self.values[i + 1]
            + ((a * a * a - a) * self.second[i] + (b * b * b - b) * self.second[i + 1]) * h * h
                / 6.0
    }

    pub fn eval_many(&self, ts: &[f64]) -> Vec<f64> {
        ts.iter().map(|&t| self.eval(t)).collect()
    }
}

fn solve_second_derivatives(t: &[f64], y: &[f64]) -> Vec<f64> {
    let n = t.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    // Interior unknowns M_1..M_{n-2}; Thomas algorithm on the tridiagonal system.
    let k = n - 2;
    let mut diag = vec![0.0; k];
    let mut upper = vec![0.0; k];
    let mut rhs = vec![0.0; k];
    for j in 0..k {
        let i = j + 1;
        let h0 = t[i] - t[i - 1];
        let h1 = t[i + 1] - t[i];
        diag[j] = 2.0 * (h0 + h1);
        upper[j] = h1;
        rhs[j] = 6.0 * ((y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0);
    }

    for j in 1..k {
        let lower = t[j + 1] - t[j];
        let w = lower / diag[j - 1];
        diag[j] -= w * upper[j - 1];
        rhs[j] -= w * rhs[j - 1];
    }

    m[k] = rhs[k - 1] / diag[k - 1];
    for j in (0..k - 1).rev() {
        m[j + 1] = (rhs[j] - upper[j] * m[j + 2]) / diag[j];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spline_interpolates_knots() {
        let t = [0.0, 0.3, 0.5, 0.9, 1.0];
        let y = [1.0, -2.0, 0.5, 4.0, 3.0];
        let s = NaturalCubicSpline::new(&t, &y).unwrap();
        for (ti, yi) in t.iter().zip(y.iter()) {
            assert!((s.eval(*ti) - yi).abs() < 1e-12, "S({ti}) != {yi}");
        }
    }

    #[test]
    fn spline_reproduces_lines_exactly() {
        let t: Vec<f64> = (0..6).map(|i| i as f64 / 5.0).collect();
        let y: Vec<f64> = t.iter().map(|v| 3.0 * v - 1.0).collect();
        let s = NaturalCubicSpline::new(&t, &y).unwrap();
        for &q in &[0.05, 0.33, 0.71, 0.99] {
            assert!((s.eval(q) - (3.0 * q - 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn natural_boundary_matches_hand_solution() {
        // Three knots at 0, 1, 2 with values 0, 1, 0: M_1 = 6 * (-1 - 1) / 4 = -3.
        let s = NaturalCubicSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        // S(0.5) = 0.5 * 1 + (0.125 - 0.5) * (-3) / 6 = 0.6875
        assert!((s.eval(0.5) - 0.6875).abs() < 1e-12);
    }

    #[test]
    fn spline_rejects_bad_knots() {
        assert!(NaturalCubicSpline::new(&[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(NaturalCubicSpline::new(&[0.0], &[1.0, 2.0]).is_err());
        let single = NaturalCubicSpline::new(&[0.0], &[7.0]).unwrap();
        assert_eq!(single.eval(0.4), 7.0);
    }
}
