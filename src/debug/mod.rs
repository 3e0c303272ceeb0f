//! Debug bundle writer for inspecting a run: chosen slice, skeleton, fit and
//! curve family.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{CurveFamily, PipelineConfig};
use crate::error::AppError;

/// Write `pano_debug_slice<z>_<timestamp>.md` under `dir`.
pub fn write_debug_bundle(
    dir: &Path,
    run: &RunOutput,
    config: &PipelineConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("pano_debug_slice{}_{ts}.md", run.arcade.slice));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    write_bundle(&mut file, run, config)?;

    log::info!("debug bundle written to '{}'", path.display());
    Ok(path)
}

fn debug_err(e: std::io::Error) -> AppError {
    AppError::new(4, format!("Failed to write debug: {e}"))
}

/// Markdown body of the bundle.
pub fn write_bundle(
    out: &mut impl Write,
    run: &RunOutput,
    config: &PipelineConfig,
) -> Result<(), AppError> {
    writeln!(out, "# pano debug bundle").map_err(debug_err)?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339()).map_err(debug_err)?;
    writeln!(out, "- input: {}", config.input.display()).map_err(debug_err)?;
    writeln!(out, "- threshold: {}", config.threshold).map_err(debug_err)?;
    writeln!(
        out,
        "- skeleton: dilation={}, sigma={:.2}, parametrization={:?}",
        config.skeleton.dilation_size, config.skeleton.blur_sigma, config.parametrization
    )
    .map_err(debug_err)?;
    writeln!(
        out,
        "- fit: {:?} / {:?} / {:?}, seed={}, restarts={}, max_iters={}, tol={:e}",
        config.objective,
        config.optimizer,
        config.init,
        config.seed,
        config.restarts,
        config.max_iters,
        config.tolerance
    )
    .map_err(debug_err)?;

    let ex = &run.arcade.extraction;
    writeln!(out, "\n## Arcade").map_err(debug_err)?;
    writeln!(out, "| slice | foreground | components | component px | skeleton px | chain px |")
        .map_err(debug_err)?;
    writeln!(out, "| - | - | - | - | - | - |").map_err(debug_err)?;
    writeln!(
        out,
        "| {} | {} | {} | {} | {} | {} |",
        run.arcade.slice,
        run.arcade.foreground,
        ex.n_components,
        ex.component.count(),
        ex.skeleton.count(),
        ex.chain.len()
    )
    .map_err(debug_err)?;

    writeln!(out, "\n## Fit").map_err(debug_err)?;
    writeln!(
        out,
        "- status: {:?} (restart {}, {} iterations)",
        run.fit.status, run.fit.restart, run.fit.iterations
    )
    .map_err(debug_err)?;
    writeln!(out, "- objective: {:.6}", run.fit.objective).map_err(debug_err)?;
    writeln!(out, "\n| k | x | y |").map_err(debug_err)?;
    writeln!(out, "| - | - | - |").map_err(debug_err)?;
    for (k, [x, y]) in run.fit.control.points().into_iter().enumerate() {
        writeln!(out, "| {k} | {x:.4} | {y:.4} |").map_err(debug_err)?;
    }

    writeln!(out, "\n## Spacing").map_err(debug_err)?;
    writeln!(
        out,
        "- bezier: s_curve={:.6}, sz={:.6}, distance={:.3}",
        run.spacing.s_curve, run.spacing.sz, run.spacing.distance
    )
    .map_err(debug_err)?;
    if let Some((_, spacing)) = &run.skeleton_family {
        writeln!(
            out,
            "- skeleton: s_curve={:.6}, sz={:.6}, distance={:.3}",
            spacing.s_curve, spacing.sz, spacing.distance
        )
        .map_err(debug_err)?;
    }

    write_family_table(out, "Bézier family", &run.family)?;
    if let Some((family, _)) = &run.skeleton_family {
        write_family_table(out, "Skeleton family", family)?;
    }

    Ok(())
}

fn write_family_table(out: &mut impl Write, title: &str, family: &CurveFamily) -> Result<(), AppError> {
    writeln!(out, "\n## {title}").map_err(debug_err)?;
    writeln!(out, "| curve | offset | first | last |").map_err(debug_err)?;
    writeln!(out, "| - | - | - | - |").map_err(debug_err)?;
    for (i, (curve, offset)) in family.curves.iter().zip(&family.offsets).enumerate() {
        let first = curve.x.first().zip(curve.y.first());
        let last = curve.x.last().zip(curve.y.last());
        writeln!(
            out,
            "| {i} | {offset:.3} | {} | {} |",
            fmt_point(first),
            fmt_point(last)
        )
        .map_err(debug_err)?;
    }
    Ok(())
}

fn fmt_point(p: Option<(&f64, &f64)>) -> String {
    match p {
        Some((x, y)) => format!("({x:.2}, {y:.2})"),
        None => "-".to_string(),
    }
}
