//! Uniform parameter grids.

/// `steps` evenly spaced values from `start` to `end` (both inclusive).
///
/// `steps = 0` yields an empty grid and `steps = 1` yields `[start]`.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| start + step * i as f64).collect();
            // Pin the last sample so endpoint evaluation is exact.
            out[steps - 1] = end;
            out
        }
    }
}

/// `linspace(0, 1, steps)`: the curve parameter grid.
pub fn unit_grid(steps: usize) -> Vec<f64> {
    linspace(0.0, 1.0, steps)
}
