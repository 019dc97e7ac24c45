//! `pyramid_viewer`
//!
//! Host-side systems:
//! - Key bindings and input classification
//! - The generator host (regeneration trigger + per-frame render pull)
//! - Console commands for tuning and inspection

pub mod generator;
pub mod input;

pub use generator::PyramidGenerator;
