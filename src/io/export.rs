//! CSV exports.
//!
//! - curve family: one row per sample, `curve,offset,index,x,y`, curves in
//!   family order
//! - single curve (normalized skeleton): `index,x,y`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{CurveFamily, SampledCurve};
use crate::error::AppError;

/// Render the family as CSV text.
pub fn family_csv(family: &CurveFamily) -> String {
    let mut out = String::from("curve,offset,index,x,y\n");
    for (c, (curve, offset)) in family.curves.iter().zip(&family.offsets).enumerate() {
        for (i, (x, y)) in curve.x.iter().zip(&curve.y).enumerate() {
            out.push_str(&format!("{c},{offset:.6},{i},{x:.6},{y:.6}\n"));
        }
    }
    out
}

/// Write the family to a CSV file.
pub fn write_family_csv(path: &Path, family: &CurveFamily) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    file.write_all(family_csv(family).as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV: {e}")))?;

    Ok(())
}

/// Render one sampled curve as CSV text.
pub fn points_csv(curve: &SampledCurve) -> String {
    let mut out = String::from("index,x,y\n");
    for (i, (x, y)) in curve.x.iter().zip(&curve.y).enumerate() {
        out.push_str(&format!("{i},{x:.6},{y:.6}\n"));
    }
    out
}

/// Write one sampled curve to a CSV file.
pub fn write_points_csv(path: &Path, curve: &SampledCurve) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create points CSV '{}': {e}", path.display())))?;

    file.write_all(points_csv(curve).as_bytes())
        .map_err(|e| AppError::new(2, format!("Failed to write points CSV: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_family_order() {
        let family = CurveFamily {
            distance: 2.0,
            count: 1,
            offsets: vec![-2.0, 0.0, 2.0],
            curves: vec![
                SampledCurve::new(vec![0.0, 1.0], vec![-2.0, -2.0]),
                SampledCurve::new(vec![0.0, 1.0], vec![0.0, 0.0]),
                SampledCurve::new(vec![0.0, 1.0], vec![2.0, 2.0]),
            ],
        };
        let csv = family_csv(&family);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "curve,offset,index,x,y");
        assert_eq!(lines[1], "0,-2.000000,0,0.000000,-2.000000");
        assert_eq!(lines[6], "2,2.000000,1,1.000000,2.000000");
    }

    #[test]
    fn points_csv_has_one_row_per_sample() {
        let csv = points_csv(&SampledCurve::new(vec![1.5, 2.0], vec![3.0, 4.25]));
        assert_eq!(csv, "index,x,y\n0,1.500000,3.000000\n1,2.000000,4.250000\n");
    }
}
