//! Vector basis builder.
//!
//! Derives the three edge vectors of a pyramid from a single seed
//! direction by successive cross products, which always yields a
//! right-handed orthogonal triad.

use std::f32::consts::TAU;

use rand::Rng;

use crate::{
    config::GeneratorConfig,
    math::Vec3,
    pyramid::{step_count_for, PyramidSpec},
};

/// `|dot|` above which the previous `v1` counts as parallel to [`Vec3::UP`].
pub const PARALLEL_THRESHOLD: f32 = 0.99;

/// Picks the reference axis crossed with `v1` to get `v2`.
///
/// Uses [`Vec3::UP`] unless the previous `v1` was nearly parallel to it, in
/// which case [`Vec3::FORWARD`] is used.
pub fn reference_axis(previous_v1: Vec3) -> Vec3 {
    let prev = previous_v1.normalize_or_zero();
    if prev.dot(Vec3::UP).abs() > PARALLEL_THRESHOLD {
        Vec3::FORWARD
    } else {
        Vec3::UP
    }
}

/// Builds a spec from a seed direction and length.
///
/// Returns [`PyramidSpec::EMPTY`] when `v1` is (near) zero or `v3_frac` is
/// not a positive finite number.
pub fn build_spec(seed_direction: Vec3, seed_length: f32, v3_frac: f32, previous_v1: Vec3) -> PyramidSpec {
    let v1 = seed_direction * seed_length;
    let len_v1 = v1.length();
    if v1.is_near_zero() || !len_v1.is_finite() || !(v3_frac.is_finite() && v3_frac > 0.0) {
        return PyramidSpec::EMPTY;
    }

    let reference = reference_axis(previous_v1);
    let side = match v1.cross(reference).try_normalize() {
        Some(dir) => dir,
        None => {
            // The new v1 itself lies along the reference axis.
            let other = if reference == Vec3::UP { Vec3::FORWARD } else { Vec3::UP };
            match v1.cross(other).try_normalize() {
                Some(dir) => dir,
                None => return PyramidSpec::EMPTY,
            }
        }
    };
    let v2 = side * len_v1;

    let Some(vertical) = v1.cross(v2).try_normalize() else {
        return PyramidSpec::EMPTY;
    };
    let v3 = vertical * (len_v1 / v3_frac);

    PyramidSpec {
        v1,
        v2,
        v3,
        step_count: step_count_for(len_v1, v3.length()),
    }
}

/// Draws seed directions and lengths.
#[derive(Debug, Clone, Copy)]
pub struct SeedSampler {
    pub length_min: f32,
    pub length_max: f32,
}

impl SeedSampler {
    pub fn from_config(cfg: &GeneratorConfig) -> Self {
        Self {
            length_min: cfg.seed_length_min,
            length_max: cfg.seed_length_max,
        }
    }

    /// Uniformly distributed unit vector.
    pub fn direction<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let z: f32 = rng.gen_range(-1.0..=1.0);
        let phi: f32 = rng.gen_range(0.0..TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    }

    /// Uniform length in `[length_min, length_max]`.
    ///
    /// Falls back to `length_min` when the range is empty or not finite.
    pub fn length<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = (self.length_min, self.length_max);
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return self.length_min;
        }
        rng.gen_range(lo..=hi)
    }
}

/// Samples a seed and builds the next spec.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, cfg: &GeneratorConfig, previous_v1: Vec3) -> PyramidSpec {
    let sampler = SeedSampler::from_config(cfg);
    let direction = sampler.direction(rng);
    let length = sampler.length(rng);
    build_spec(direction, length, cfg.v3_frac, previous_v1)
}
