//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` overrides and parses CLI arguments
//! - reads the raw volume
//! - runs skeleton extraction, curve fitting and family building
//! - prints a summary and writes exports

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Command, RunArgs, SkeletonArgs, VolumeArgs};
use crate::domain::{PipelineConfig, SkeletonParams, Spacing};
use crate::error::AppError;
use crate::io::{RawLayout, read_raw_volume};

pub mod pipeline;

const DEFAULT_THRESHOLD: f32 = 1500.0;
const DEFAULT_SEED: u64 = 42;

/// Entry point for the `pano` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let env = EnvOverrides::from_env()?;
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args, &env),
        Command::Skeleton(args) => handle_skeleton(args, &env),
    }
}

/// Defaults taken from the environment (or `.env`) when flags are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub seed: Option<u64>,
    pub threshold: Option<f32>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            seed: parse_env_var("PANO_SEED")?,
            threshold: parse_env_var("PANO_THRESHOLD")?,
        })
    }
}

fn parse_env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::new(2, format!("Invalid value for {name}: '{raw}'."))),
        Err(_) => Ok(None),
    }
}

fn handle_run(args: RunArgs, env: &EnvOverrides) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args, env)?;
    let volume = read_raw_volume(&config.input, &raw_layout(&args.volume)?)?;

    let run = pipeline::run_pipeline(&volume, &config)?;
    if args.strict {
        run.fit.clone().require_converged()?;
    }

    println!("{}", format_run_summary(&run, &config));

    crate::io::write_curve_json(&config.output, &crate::io::curve_file(&run))?;
    log::info!("curve family written to '{}'", config.output.display());

    if let Some(path) = &config.export_csv {
        crate::io::write_family_csv(path, &run.family)?;
        if let Some((family, _)) = &run.skeleton_family {
            crate::io::write_family_csv(&skeleton_sibling(path), family)?;
        }
    }
    if config.debug_bundle {
        crate::debug::write_debug_bundle(Path::new("debug"), &run, &config)?;
    }

    Ok(())
}

fn handle_skeleton(args: SkeletonArgs, env: &EnvOverrides) -> Result<(), AppError> {
    let volume = read_raw_volume(&args.volume.input, &raw_layout(&args.volume)?)?;
    let threshold = resolve_threshold(&args.volume, env)?;

    let arcade = pipeline::find_dental_arcade(&volume, threshold, &skeleton_params(&args.volume)?)?;
    let points = crate::skeleton::normalize_chain(
        &arcade.extraction.chain,
        args.volume.npoints,
        args.volume.parametrization,
    )?;

    println!(
        "slice {}: {} foreground px, {} component(s), skeleton {} px, chain {} px -> {} points",
        arcade.slice,
        arcade.foreground,
        arcade.extraction.n_components,
        arcade.extraction.skeleton.count(),
        arcade.extraction.chain.len(),
        points.len()
    );

    if let Some(path) = &args.output {
        crate::io::write_points_csv(path, &points)?;
    }
    Ok(())
}

pub fn raw_layout(args: &VolumeArgs) -> Result<RawLayout, AppError> {
    let [depth, height, width] = args.shape[..] else {
        return Err(AppError::new(
            2,
            format!("--shape needs DEPTH,HEIGHT,WIDTH, got {} value(s).", args.shape.len()),
        ));
    };
    let [sx, sy, sz] = args.spacing[..] else {
        return Err(AppError::new(
            2,
            format!("--spacing needs SX,SY,SZ, got {} value(s).", args.spacing.len()),
        ));
    };
    if ![sx, sy, sz].iter().all(|s| s.is_finite() && *s > 0.0) {
        return Err(AppError::new(2, "Spacing values must be finite and > 0."));
    }
    Ok(RawLayout {
        depth,
        height,
        width,
        voxel: args.dtype,
        spacing: Spacing { sx, sy, sz },
    })
}

fn resolve_threshold(args: &VolumeArgs, env: &EnvOverrides) -> Result<f32, AppError> {
    let threshold = args
        .threshold
        .or(env.threshold)
        .unwrap_or(DEFAULT_THRESHOLD);
    if !threshold.is_finite() {
        return Err(AppError::new(2, "Threshold must be finite."));
    }
    Ok(threshold)
}

fn skeleton_params(args: &VolumeArgs) -> Result<SkeletonParams, AppError> {
    if args.dilation == 0 {
        return Err(AppError::new(2, "Dilation size must be > 0."));
    }
    if !(args.blur_sigma.is_finite() && args.blur_sigma >= 0.0) {
        return Err(AppError::new(2, "Blur sigma must be finite and >= 0."));
    }
    Ok(SkeletonParams {
        dilation_size: args.dilation,
        blur_sigma: args.blur_sigma,
    })
}

pub fn pipeline_config_from_args(
    args: &RunArgs,
    env: &EnvOverrides,
) -> Result<PipelineConfig, AppError> {
    if args.volume.npoints < 2 {
        return Err(AppError::new(2, "--npoints must be >= 2."));
    }
    if args.nctrl_points < 2 {
        return Err(AppError::new(2, "--nctrl-points must be >= 2."));
    }
    if !(args.distance.is_finite() && args.distance > 0.0) {
        return Err(AppError::new(2, "--distance must be finite and > 0."));
    }

    Ok(PipelineConfig {
        input: args.volume.input.clone(),
        output: args.output.clone(),
        threshold: resolve_threshold(&args.volume, env)?,
        skeleton: skeleton_params(&args.volume)?,
        parametrization: args.volume.parametrization,
        distance: args.distance,
        ncurves: args.ncurves,
        npoints: args.volume.npoints,
        nctrl_points: args.nctrl_points,
        objective: args.objective,
        optimizer: args.optimizer,
        init: args.init,
        seed: args.seed.or(env.seed).unwrap_or(DEFAULT_SEED),
        restarts: args.restarts,
        max_iters: args.max_iters,
        tolerance: args.tolerance,
        skeleton_family: args.skeleton,
        export_csv: args.export_csv.clone(),
        debug_bundle: args.debug,
    })
}

/// `dir/name.ext` -> `dir/name_skeleton.ext`.
fn skeleton_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_skeleton.{}", ext.to_string_lossy()),
        None => format!("{stem}_skeleton"),
    };
    path.with_file_name(name)
}

fn format_run_summary(run: &pipeline::RunOutput, config: &PipelineConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Arcade slice {} ({} px >= {}), skeleton chain {} px\n",
        run.arcade.slice,
        run.arcade.foreground,
        config.threshold,
        run.arcade.extraction.chain.len()
    ));
    out.push_str(&format!(
        "Fit: {} control points, objective {:.4}, {:?} after {} iterations\n",
        run.fit.control.len(),
        run.fit.objective,
        run.fit.status,
        run.fit.iterations
    ));
    out.push_str(&format!(
        "Family: {} curves x {} points, offsets {:.2}..{:.2}\n",
        run.family.len(),
        run.family.npoints(),
        run.family.offsets.first().copied().unwrap_or(0.0),
        run.family.offsets.last().copied().unwrap_or(0.0)
    ));
    out.push_str(&format!(
        "Spacing: ({:.4}, {:.4}, {:.4})",
        run.spacing.s_curve, run.spacing.sz, run.spacing.distance
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["pano", "run", "scan.raw", "--shape", "2,8,8"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            Command::Skeleton(_) => unreachable!(),
        }
    }

    #[test]
    fn flags_beat_env_which_beats_defaults() {
        let env = EnvOverrides {
            seed: Some(7),
            threshold: Some(900.0),
        };

        let config = pipeline_config_from_args(&run_args(&[]), &EnvOverrides::default()).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);

        let config = pipeline_config_from_args(&run_args(&[]), &env).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.threshold, 900.0);

        let config =
            pipeline_config_from_args(&run_args(&["--seed", "1", "-t", "10"]), &env).unwrap();
        assert_eq!(config.seed, 1);
        assert_eq!(config.threshold, 10.0);
    }

    #[test]
    fn bad_geometry_flags_are_rejected() {
        let env = EnvOverrides::default();
        let err = pipeline_config_from_args(&run_args(&["--distance", "0"]), &env).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = pipeline_config_from_args(&run_args(&["-c", "1"]), &env).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn layout_needs_three_values() {
        let args = run_args(&["--spacing", "0.5,0.5,0.25"]);
        let layout = raw_layout(&args.volume).unwrap();
        assert_eq!((layout.depth, layout.height, layout.width), (2, 8, 8));
        assert_eq!(layout.spacing.sz, 0.25);

        let bad = RunArgs {
            volume: VolumeArgs {
                shape: vec![2, 8],
                ..args.volume.clone()
            },
            ..args
        };
        assert!(raw_layout(&bad.volume).is_err());
    }

    #[test]
    fn skeleton_sibling_keeps_extension() {
        assert_eq!(
            skeleton_sibling(Path::new("out/family.csv")),
            PathBuf::from("out/family_skeleton.csv")
        );
        assert_eq!(skeleton_sibling(Path::new("family")), PathBuf::from("family_skeleton"));
    }
}
