//! Numerical building blocks: binomial coefficients, uniform grids, natural
//! cubic splines and linear least squares.

pub mod binomial;
pub mod grid;
pub mod ols;
pub mod spline;

pub use binomial::*;
pub use grid::*;
pub use ols::*;
pub use spline::*;
