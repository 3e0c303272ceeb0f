//! Input/output helpers.
//!
//! - raw volume reader (`volume`)
//! - curve family CSV export (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod volume;

pub use curve::*;
pub use export::*;
pub use volume::*;
