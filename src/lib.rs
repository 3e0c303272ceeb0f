//! `panoramic-arch` library crate.
//!
//! The binary (`pano`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the geometry core (skeleton, Bézier evaluator, fitter) can be driven by
//!   other front-ends that bring their own volume I/O and resampler

pub mod app;
pub mod cli;
pub mod curve;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod skeleton;
