//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raster inputs (`BinaryMask`, `Volume`, `Spacing`)
//! - skeleton outputs (`PixelCoord`, `PointChain`)
//! - curve data (`ControlPolygon`, `SampledCurve`, `CurveFamily`)
//! - run configuration enums and `PipelineConfig`

pub mod types;

pub use types::*;
