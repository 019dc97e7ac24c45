//! `pyramid_shared`
//!
//! Shared libraries used by the viewer and the test tooling.
//!
//! Design goals:
//! - Deterministic and pure where practical: geometry is derived from a
//!   [`pyramid::PyramidSpec`] value on demand, never cached.
//! - Clear separation of concerns (math, basis, metrics, wireframe, report).
//! - Traits for abstraction and dependency injection (render, metrics sink).
//! - No `unsafe`.

pub mod basis;
pub mod config;
pub mod console;
pub mod math;
pub mod metrics;
pub mod pyramid;
pub mod render;
pub mod report;
pub mod wireframe;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::basis::{build_spec, generate, SeedSampler};
    pub use crate::config::*;
    pub use crate::math::*;
    pub use crate::metrics::*;
    pub use crate::pyramid::*;
    pub use crate::report::*;
    pub use crate::wireframe::*;
}
