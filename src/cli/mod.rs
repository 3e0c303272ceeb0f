//! Command-line parsing for the panoramic arch generator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the geometry/fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{InitKind, ObjectiveKind, OptimizerKind, Parametrization};
use crate::io::VoxelType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pano", version, about = "Panoramic dental arch reconstruction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a Bézier curve to the dental arcade and export the curve family.
    Run(RunArgs),
    /// Only extract and normalize the arcade skeleton (no fit).
    Skeleton(SkeletonArgs),
}

/// Raw volume and arcade detection options shared by all commands.
#[derive(Debug, Args, Clone)]
pub struct VolumeArgs {
    /// Raw little-endian volume file.
    #[arg(value_name = "VOLUME")]
    pub input: PathBuf,

    /// Volume shape as DEPTH,HEIGHT,WIDTH.
    #[arg(long, value_delimiter = ',', required = true)]
    pub shape: Vec<usize>,

    /// Voxel type of the raw file.
    #[arg(long, value_enum, default_value_t = VoxelType::I16)]
    pub dtype: VoxelType,

    /// Voxel spacing as SX,SY,SZ.
    #[arg(long, value_delimiter = ',', default_values_t = [1.0, 1.0, 1.0])]
    pub spacing: Vec<f64>,

    /// Intensity threshold for the arcade (falls back to `PANO_THRESHOLD`, then 1500).
    #[arg(short = 't', long)]
    pub threshold: Option<f32>,

    /// Side of the square dilation neighborhood.
    #[arg(long, default_value_t = 30)]
    pub dilation: usize,

    /// Gaussian sigma used before re-binarizing.
    #[arg(long, default_value_t = 2.0)]
    pub blur_sigma: f64,

    /// How the skeleton chain is parametrized before resampling.
    #[arg(long, value_enum, default_value_t = Parametrization::IndexFraction)]
    pub parametrization: Parametrization,

    /// Samples per curve.
    #[arg(short = 'p', long, default_value_t = 500)]
    pub npoints: usize,
}

/// Options for `pano run`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,

    /// Output curve JSON.
    #[arg(short = 'o', long, default_value = "panoramic.json")]
    pub output: PathBuf,

    /// Distance between neighboring curves (pixels).
    #[arg(short = 'd', long, default_value_t = 3.0)]
    pub distance: f64,

    /// Curves on each side of the fitted curve.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub ncurves: usize,

    /// Bézier control points.
    #[arg(short = 'c', long, default_value_t = 10)]
    pub nctrl_points: usize,

    /// Also build a curve family from the skeleton itself.
    #[arg(short = 's', long)]
    pub skeleton: bool,

    /// Distance aggregate minimized by the fitter.
    #[arg(long, value_enum, default_value_t = ObjectiveKind::DistanceSum)]
    pub objective: ObjectiveKind,

    /// Minimizer strategy.
    #[arg(long, value_enum, default_value_t = OptimizerKind::NelderMead)]
    pub optimizer: OptimizerKind,

    /// Initial control polygon.
    #[arg(long, value_enum, default_value_t = InitKind::Random)]
    pub init: InitKind,

    /// Random seed for initialization (falls back to `PANO_SEED`, then 42).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Independent fit restarts (run in parallel).
    #[arg(long, default_value_t = 4)]
    pub restarts: usize,

    /// Iteration cap per restart.
    #[arg(long, default_value_t = 20_000)]
    pub max_iters: usize,

    /// Convergence tolerance.
    #[arg(long, default_value_t = 1e-4)]
    pub tolerance: f64,

    /// Fail instead of warning when the fit does not converge.
    #[arg(long)]
    pub strict: bool,

    /// Export the curve family to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Write a markdown debug bundle under `./debug`.
    #[arg(long)]
    pub debug: bool,
}

/// Options for `pano skeleton`.
#[derive(Debug, Args, Clone)]
pub struct SkeletonArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,

    /// Write the normalized skeleton points as CSV (`index,x,y`).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_match_the_classic_tool() {
        let cli = Cli::try_parse_from(["pano", "run", "scan.raw", "--shape", "4,64,64"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.volume.shape, vec![4, 64, 64]);
        assert_eq!(args.volume.spacing, vec![1.0, 1.0, 1.0]);
        assert_eq!(args.volume.npoints, 500);
        assert_eq!(args.distance, 3.0);
        assert_eq!(args.ncurves, 10);
        assert_eq!(args.nctrl_points, 10);
        assert_eq!(args.volume.threshold, None);
        assert_eq!(args.output, PathBuf::from("panoramic.json"));
        assert!(!args.skeleton);
    }

    #[test]
    fn shape_is_required() {
        assert!(Cli::try_parse_from(["pano", "skeleton", "scan.raw"]).is_err());
    }

    #[test]
    fn enums_use_kebab_case() {
        let cli = Cli::try_parse_from([
            "pano",
            "run",
            "scan.raw",
            "--shape",
            "1,2,3",
            "--optimizer",
            "bfgs",
            "--init",
            "least-squares",
            "--objective",
            "residual-norm",
            "--dtype",
            "f32",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.optimizer, OptimizerKind::Bfgs);
        assert_eq!(args.init, InitKind::LeastSquares);
        assert_eq!(args.objective, ObjectiveKind::ResidualNorm);
        assert_eq!(args.volume.dtype, VoxelType::F32);
    }
}
