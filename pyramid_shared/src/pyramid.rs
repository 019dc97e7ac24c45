//! Pyramid vectors and step descriptors.
//!
//! A [`PyramidSpec`] is the only stored geometry state. Everything else
//! (step boxes, metrics, wireframe) is derived from it on demand and is
//! cheap enough to recompute every frame.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Step count for a base length `len_v1` and step height `len_v3`.
///
/// `round(len_v1 / (2 * len_v3))`, ties to even. Returns 0 when the ratio is
/// not a positive finite number.
pub fn step_count_for(len_v1: f32, len_v3: f32) -> u32 {
    let ratio = len_v1 / (2.0 * len_v3);
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    let rounded = ratio.round_ties_even();
    if rounded >= u32::MAX as f32 {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Edge vectors and step count of one stepped pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PyramidSpec {
    /// Base length axis.
    pub v1: Vec3,
    /// Base width axis.
    pub v2: Vec3,
    /// Step height axis.
    pub v3: Vec3,
    pub step_count: u32,
}

impl PyramidSpec {
    /// No geometry.
    pub const EMPTY: Self = Self {
        v1: Vec3::ZERO,
        v2: Vec3::ZERO,
        v3: Vec3::ZERO,
        step_count: 0,
    };

    /// Builds a spec from hand-authored vectors, deriving the step count.
    ///
    /// The vectors are taken as given; no orthogonalization happens here.
    pub fn from_vectors(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Self {
            v1,
            v2,
            v3,
            step_count: step_count_for(v1.length(), v3.length()),
        }
    }

    /// True when nothing can be measured or drawn.
    pub fn is_degenerate(&self) -> bool {
        self.step_count == 0
            || self.v1.is_near_zero()
            || self.v2.is_near_zero()
            || self.v3.is_near_zero()
    }

    /// Step height, constant for every step.
    pub fn step_height(&self) -> f32 {
        self.v3.length()
    }

    /// Scale factor of step `index`: `1 - index / step_count`.
    pub fn step_scale(&self, index: u32) -> f32 {
        if self.step_count == 0 {
            return 0.0;
        }
        1.0 - index as f32 / self.step_count as f32
    }

    /// Center of the bottom face of step 0.
    pub fn base_center(&self, origin: Vec3) -> Vec3 {
        origin + (self.v1 + self.v2) * 0.5
    }

    /// Lazily derived step boxes, bottom to top. Empty for a degenerate spec.
    pub fn steps(&self, origin: Vec3) -> Steps {
        let count = if self.is_degenerate() { 0 } else { self.step_count };
        Steps {
            frame: StepFrame::new(self, origin),
            step_count: count,
            next: 0,
        }
    }
}

/// Per-spec values shared by every step.
#[derive(Debug, Clone, Copy)]
struct StepFrame {
    dir_v1: Vec3,
    dir_v2: Vec3,
    vertical: Vec3,
    len_v1: f32,
    len_v2: f32,
    height: f32,
    base_center: Vec3,
    step_count: u32,
}

impl StepFrame {
    fn new(spec: &PyramidSpec, origin: Vec3) -> Self {
        Self {
            dir_v1: spec.v1.normalize_or_zero(),
            dir_v2: spec.v2.normalize_or_zero(),
            vertical: spec.v3.normalize_or_zero(),
            len_v1: spec.v1.length(),
            len_v2: spec.v2.length(),
            height: spec.step_height(),
            base_center: spec.base_center(origin),
            step_count: spec.step_count,
        }
    }

    fn descriptor(&self, index: u32) -> StepDescriptor {
        let scale = 1.0 - index as f32 / self.step_count as f32;
        let length = self.len_v1 * scale;
        let width = self.len_v2 * scale;
        StepDescriptor {
            index,
            scale,
            length,
            width,
            height: self.height,
            origin: self.base_center + self.vertical * (self.height * index as f32),
            half_v1: self.dir_v1 * (length * 0.5),
            half_v2: self.dir_v2 * (width * 0.5),
            up: self.vertical * self.height,
        }
    }
}

/// One rectangular step of the solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDescriptor {
    pub index: u32,
    pub scale: f32,
    /// Extent along `v1`.
    pub length: f32,
    /// Extent along `v2`.
    pub width: f32,
    pub height: f32,
    /// Center of the step's bottom face.
    pub origin: Vec3,
    pub half_v1: Vec3,
    pub half_v2: Vec3,
    /// Full-height offset from the bottom face to the top face.
    pub up: Vec3,
}

impl StepDescriptor {
    /// Bottom corners in cyclic order `(-,-), (+,-), (+,+), (-,+)`.
    pub fn bottom_corners(&self) -> [Vec3; 4] {
        let o = self.origin;
        [
            o - self.half_v1 - self.half_v2,
            o + self.half_v1 - self.half_v2,
            o + self.half_v1 + self.half_v2,
            o - self.half_v1 + self.half_v2,
        ]
    }

    pub fn top_corners(&self) -> [Vec3; 4] {
        self.bottom_corners().map(|c| c + self.up)
    }

    /// All eight corners: bottom four then top four.
    pub fn corners(&self) -> [Vec3; 8] {
        let b = self.bottom_corners();
        let t = self.top_corners();
        [b[0], b[1], b[2], b[3], t[0], t[1], t[2], t[3]]
    }
}

/// Iterator over [`StepDescriptor`]s.
#[derive(Debug, Clone)]
pub struct Steps {
    frame: StepFrame,
    step_count: u32,
    next: u32,
}

impl Iterator for Steps {
    type Item = StepDescriptor;

    fn next(&mut self) -> Option<StepDescriptor> {
        if self.next >= self.step_count {
            return None;
        }
        let step = self.frame.descriptor(self.next);
        self.next += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.step_count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Steps {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PyramidSpec {
        PyramidSpec::from_vectors(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        )
    }

    #[test]
    fn step_count_follows_half_ratio() {
        assert_eq!(step_count_for(6.0, 1.0), 3);
        assert_eq!(step_count_for(10.0, 1.0), 5);
        // Ties go to even.
        assert_eq!(step_count_for(5.0, 1.0), 2);
        assert_eq!(step_count_for(7.0, 1.0), 4);
    }

    #[test]
    fn step_count_guards_zero_height() {
        assert_eq!(step_count_for(6.0, 0.0), 0);
        assert_eq!(step_count_for(0.0, 0.0), 0);
        assert_eq!(step_count_for(0.0, 1.0), 0);
    }

    #[test]
    fn empty_spec_is_degenerate_and_has_no_steps() {
        assert!(PyramidSpec::EMPTY.is_degenerate());
        assert_eq!(PyramidSpec::EMPTY.steps(Vec3::ZERO).count(), 0);
    }

    #[test]
    fn steps_shrink_and_stack() {
        let spec = sample();
        assert_eq!(spec.step_count, 3);
        let steps: Vec<_> = spec.steps(Vec3::ZERO).collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].length, 6.0);
        assert_eq!(steps[0].origin, Vec3::new(3.0, 3.0, 0.0));
        assert_eq!(steps[2].origin, Vec3::new(3.0, 3.0, 2.0));
        assert!((steps[2].width - 2.0).abs() < 1e-5);
        assert!(steps.iter().all(|s| s.height == 1.0));
    }

    #[test]
    fn corners_of_base_step_cover_footprint() {
        let spec = sample();
        let base = spec.steps(Vec3::ZERO).next().unwrap();
        let c = base.corners();
        assert_eq!(c[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(c[1], Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(c[2], Vec3::new(6.0, 6.0, 0.0));
        assert_eq!(c[3], Vec3::new(0.0, 6.0, 0.0));
        assert_eq!(c[6], Vec3::new(6.0, 6.0, 1.0));
    }
}
