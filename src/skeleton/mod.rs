//! Skeleton extraction and chain normalization.
//!
//! Responsibilities:
//!
//! - clean up one thresholded slice (`morphology`, `components`)
//! - thin it to a centerline (`thinning`) and order its pixels (`walk`)
//! - resample the ordered pixels to a fixed point count (`normalize`)

pub mod components;
pub mod extract;
pub mod morphology;
pub mod normalize;
pub mod thinning;
pub mod walk;

pub use extract::*;
pub use normalize::*;
