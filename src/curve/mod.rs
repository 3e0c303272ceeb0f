//! Curve geometry.
//!
//! - `bezier`: evaluator (points, derivatives, tangents, normals, offsets)
//! - `family`: ordered `2n + 1` offset family for the resampler
//! - `discrete`: the same offsets for a sampled polyline (skeleton family)

pub mod bezier;
pub mod discrete;
pub mod family;

pub use bezier::*;
pub use discrete::*;
pub use family::*;
