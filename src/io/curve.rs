//! Read/write curve JSON files.
//!
//! Curve JSON is the portable result of a run:
//! - fitted control points and fit quality
//! - the ordered curve family handed to the resampler
//! - derived spacing of the flattened volume
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::app::pipeline::RunOutput;
use crate::domain::CurveFile;
use crate::error::AppError;

/// Snapshot a run as a `CurveFile`.
pub fn curve_file(run: &RunOutput) -> CurveFile {
    CurveFile {
        tool: "pano".to_string(),
        created: Utc::now(),
        slice: run.arcade.slice,
        control_points: run.fit.control.clone(),
        objective: run.fit.objective,
        converged: run.fit.is_converged(),
        spacing: run.spacing,
        family: run.family.clone(),
        skeleton_family: run.skeleton_family.as_ref().map(|(f, _)| f.clone()),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}
