//! Shared "panoramic" pipeline used by the `run` and `skeleton` commands.
//!
//! Volume -> best slice -> skeleton -> normalized targets -> Bézier fit ->
//! curve family -> derived spacing.
//!
//! The final resampling step is not done here; callers hand the family and
//! the volume to a `Resampler` (see `planify_checked`).

use crate::curve::{BezierEvaluator, build_family, build_polyline_family};
use crate::domain::{
    CurveFamily, PanoramicSpacing, PipelineConfig, SampledCurve, SkeletonParams, Spacing, Volume,
};
use crate::error::{AppError, PanoError};
use crate::fit::{CurveFit, FitOptions, Initialization, fit_curve};
use crate::math::BinomialTable;
use crate::skeleton::{SkeletonExtraction, extract_skeleton, normalize_chain};

/// Turns a curve family plus the source volume into the flattened volume.
pub trait Resampler {
    /// Must return a volume of shape `(npoints, depth, 2n + 1)`.
    fn planify(&self, volume: &Volume, family: &CurveFamily) -> Result<Volume, AppError>;
}

/// Slice chosen as the dental arcade, with its skeleton.
#[derive(Debug, Clone)]
pub struct ArcadeSlice {
    pub slice: usize,
    /// Thresholded pixel count of `slice`.
    pub foreground: usize,
    pub extraction: SkeletonExtraction,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub arcade: ArcadeSlice,
    /// Normalized skeleton the curve was fit to.
    pub targets: SampledCurve,
    pub fit: CurveFit,
    pub family: CurveFamily,
    pub spacing: PanoramicSpacing,
    /// Family built from the skeleton itself (`--skeleton`).
    pub skeleton_family: Option<(CurveFamily, PanoramicSpacing)>,
}

/// Threshold every slice, keep the one with the most foreground pixels
/// (first on ties) and extract its skeleton.
pub fn find_dental_arcade(
    volume: &Volume,
    threshold: f32,
    params: &SkeletonParams,
) -> Result<ArcadeSlice, PanoError> {
    if volume.depth() == 0 {
        return Err(PanoError::EmptyArcade);
    }

    let (slice, foreground) = best_slice(volume, threshold);
    log::info!("arcade slice: {slice} ({foreground} voxels >= {threshold})");

    let mask = volume.threshold_slice(slice, threshold);
    let extraction = extract_skeleton(&mask, params)?;
    log::info!(
        "skeleton: {} px, chain of {} px",
        extraction.skeleton.count(),
        extraction.chain.len()
    );

    Ok(ArcadeSlice {
        slice,
        foreground,
        extraction,
    })
}

/// `(slice, count)` of the slice with the most voxels `>= threshold`.
pub fn best_slice(volume: &Volume, threshold: f32) -> (usize, usize) {
    let mut best = (0, 0);
    for z in 0..volume.depth() {
        let count = volume.slice(z).iter().filter(|&&v| v >= threshold).count();
        if count > best.1 {
            best = (z, count);
        }
    }
    best
}

/// Physical spacing of the flattened volume built along `curve`.
pub fn derive_spacing(
    curve: &SampledCurve,
    spacing: &Spacing,
    distance: f64,
) -> Result<PanoramicSpacing, PanoError> {
    let pairs = curve.len() / 2;
    if pairs == 0 {
        return Err(PanoError::invalid(
            "Spacing needs a curve with at least two samples.",
        ));
    }
    let total: f64 = (0..pairs)
        .map(|j| {
            let [x0, y0] = curve.point(2 * j);
            let [x1, y1] = curve.point(2 * j + 1);
            (spacing.sx * (x0 - x1)).hypot(spacing.sy * (y0 - y1))
        })
        .sum();

    Ok(PanoramicSpacing {
        s_curve: total / pairs as f64,
        sz: spacing.sz,
        distance,
    })
}

pub fn fit_options(config: &PipelineConfig) -> FitOptions {
    FitOptions {
        objective: config.objective,
        optimizer: config.optimizer,
        init: Initialization::from_kind(config.init, config.seed),
        restarts: config.restarts,
        max_iters: config.max_iters,
        tolerance: config.tolerance,
    }
}

/// Execute the full pipeline on an in-memory volume.
pub fn run_pipeline(volume: &Volume, config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let arcade = find_dental_arcade(volume, config.threshold, &config.skeleton)?;

    let targets = normalize_chain(
        &arcade.extraction.chain,
        config.npoints,
        config.parametrization,
    )?;

    let mut table = BinomialTable::new();
    table.extend_to(config.nctrl_points.saturating_sub(1));
    let evaluator = BezierEvaluator::with_table(table);
    let fit = fit_curve(&evaluator, &targets, config.nctrl_points, &fit_options(config))?;
    log::info!(
        "fit: objective {:.4}, {} iterations, {:?} (restart {})",
        fit.objective,
        fit.iterations,
        fit.status,
        fit.restart
    );

    let family = build_family(
        &evaluator,
        &fit.control,
        config.distance,
        config.ncurves,
        config.npoints,
    )?;
    let spacing = derive_spacing(family.center(), &volume.spacing, config.distance)?;

    let skeleton_family = if config.skeleton_family {
        let family = build_polyline_family(&targets, config.distance, config.ncurves)?;
        let spacing = derive_spacing(&targets, &volume.spacing, config.distance)?;
        Some((family, spacing))
    } else {
        None
    };

    Ok(RunOutput {
        arcade,
        targets,
        fit,
        family,
        spacing,
        skeleton_family,
    })
}

/// Run the resampler and check the shape it returns.
pub fn planify_checked(
    resampler: &dyn Resampler,
    volume: &Volume,
    family: &CurveFamily,
) -> Result<Volume, AppError> {
    let out = resampler.planify(volume, family)?;
    let expected = (family.npoints(), volume.depth(), family.len());
    if out.shape() != expected {
        return Err(AppError::new(
            4,
            format!(
                "Resampler returned shape {:?}, expected {:?} (npoints, depth, curves).",
                out.shape(),
                expected
            ),
        ));
    }
    Ok(out)
}
