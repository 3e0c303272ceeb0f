//! Curve fitting.
//!
//! Responsibilities:
//!
//! - pick starting control polygons (random or least squares)
//! - minimize the curve-to-skeleton distance (Nelder–Mead or BFGS)
//! - run restarts in parallel and keep the best one deterministically

pub mod fitter;
pub mod init;
pub mod optimizer;

pub use fitter::*;
pub use init::*;
pub use optimizer::*;
