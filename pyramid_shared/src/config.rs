//! Configuration system.
//!
//! Loads generator configuration from JSON strings (file IO left to app).

use std::ops::RangeInclusive;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Accepted range for [`GeneratorConfig::v3_frac`].
pub const V3_FRAC_RANGE: RangeInclusive<f32> = 6.0..=100.0;

/// Generator settings shared by the viewer and the test tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Ratio `|v1| / |v3|`; sets how many steps the pyramid gets.
    pub v3_frac: f32,
    /// Lower bound of the random base length.
    pub seed_length_min: f32,
    /// Upper bound of the random base length.
    pub seed_length_max: f32,
    /// World-space origin of the pyramid's base corner.
    pub origin: [f32; 3],
    /// Key bound to the `regen` command.
    pub regen_key: String,
    /// Render pull rate of the viewer.
    pub frame_hz: u32,
    /// Draw the raw edge vectors as debug rays.
    pub show_rays: bool,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            v3_frac: 10.0,
            seed_length_min: 3.0,
            seed_length_max: 10.0,
            origin: [0.0; 3],
            regen_key: "r".to_string(),
            frame_hz: 30,
            show_rays: true,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(s).context("parse generator config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serialize generator config")
    }

    /// Rejects settings the generator cannot honor.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !V3_FRAC_RANGE.contains(&self.v3_frac) {
            bail!(
                "v3_frac {} outside {}..={}",
                self.v3_frac,
                V3_FRAC_RANGE.start(),
                V3_FRAC_RANGE.end()
            );
        }
        if !(self.seed_length_min > 0.0 && self.seed_length_min.is_finite()) {
            bail!("seed_length_min must be positive, got {}", self.seed_length_min);
        }
        if !self.seed_length_max.is_finite() || self.seed_length_max < self.seed_length_min {
            bail!(
                "seed length range {}..={} is inverted",
                self.seed_length_min,
                self.seed_length_max
            );
        }
        if self.regen_key.trim().is_empty() {
            bail!("regen_key must not be empty");
        }
        if self.frame_hz == 0 {
            bail!("frame_hz must be at least 1");
        }
        Ok(())
    }

    pub fn origin(&self) -> Vec3 {
        Vec3::from(self.origin)
    }
}

/// Clamps a requested `v3_frac` into [`V3_FRAC_RANGE`].
pub fn clamp_v3_frac(v: f32) -> f32 {
    v.clamp(*V3_FRAC_RANGE.start(), *V3_FRAC_RANGE.end())
}
