//! Per-step and aggregate measurements of the stepped solid.

use serde::{Deserialize, Serialize};

use crate::pyramid::PyramidSpec;

/// Measurements of one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub index: u32,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub perimeter: f64,
    /// Footprint of the step above, hidden from the outside.
    pub occluded_area: f64,
    /// Exposed surface area.
    pub area: f64,
    pub volume: f64,
}

/// Measurements of the whole pyramid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PyramidMetrics {
    pub steps: Vec<StepMetrics>,
    pub total_perimeter: f64,
    pub total_area: f64,
    pub total_volume: f64,
}

impl PyramidMetrics {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Cap on the up-front allocation. Hand-built specs can carry huge step counts.
const MAX_RESERVED_STEPS: u32 = 1024;

/// Computes metrics for `spec`. Degenerate specs give empty metrics.
///
/// The hidden footprint of the next step is taken as `next_size²` with
/// `next_size` measured along `v1`. That is exact for the square bases the
/// basis builder produces and approximate when `|v1| != |v2|`.
pub fn compute_metrics(spec: &PyramidSpec) -> PyramidMetrics {
    let mut out = PyramidMetrics::default();
    if spec.is_degenerate() {
        return out;
    }

    let len_v1 = spec.v1.length() as f64;
    let len_v2 = spec.v2.length() as f64;
    let height = spec.v3.length() as f64;
    let count = spec.step_count;
    let denom = count as f64;

    out.steps.reserve(count.min(MAX_RESERVED_STEPS) as usize);
    for i in 0..count {
        let scale = 1.0 - i as f64 / denom;
        let width = len_v2 * scale;
        let length = len_v1 * scale;

        let perimeter = 4.0 * (length + width + height);

        let occluded_area = if i + 1 < count {
            let next_scale = 1.0 - (i + 1) as f64 / denom;
            let next_size = len_v1 * next_scale;
            next_size * next_size
        } else {
            0.0
        };

        let mut area = 2.0 * (width * height) + 2.0 * (length * height) + width * length - occluded_area;
        if i == 0 {
            // Bottom face.
            area += width * length;
        }

        let volume = length * width * height;

        out.total_perimeter += perimeter;
        out.total_area += area;
        out.total_volume += volume;
        out.steps.push(StepMetrics {
            index: i,
            width,
            length,
            height,
            perimeter,
            occluded_area,
            area,
            volume,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    const TOL: f64 = 1e-9;

    fn sample() -> PyramidSpec {
        PyramidSpec::from_vectors(
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOL
    }

    #[test]
    fn three_step_reference_values() {
        let m = compute_metrics(&sample());
        assert_eq!(m.steps.len(), 3);

        let s0 = m.steps[0];
        assert!(close(s0.width, 6.0) && close(s0.length, 6.0) && close(s0.height, 1.0));
        assert!(close(s0.perimeter, 52.0));
        assert!(close(s0.occluded_area, 16.0));
        assert!(close(s0.area, 80.0));
        assert!(close(s0.volume, 36.0));

        let s1 = m.steps[1];
        assert!(close(s1.perimeter, 36.0));
        assert!(close(s1.occluded_area, 4.0));
        assert!(close(s1.area, 28.0));
        assert!(close(s1.volume, 16.0));

        let s2 = m.steps[2];
        assert!(close(s2.width, 2.0) && close(s2.length, 2.0));
        assert!(close(s2.perimeter, 20.0));
        assert_eq!(s2.occluded_area, 0.0);
        assert!(close(s2.area, 12.0));
        assert!(close(s2.volume, 4.0));

        assert!(close(m.total_perimeter, 108.0));
        assert!(close(m.total_area, 120.0));
        assert!(close(m.total_volume, 56.0));
    }

    #[test]
    fn single_step_has_bottom_face_and_no_occlusion() {
        let spec = PyramidSpec::from_vectors(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(spec.step_count, 1);
        let m = compute_metrics(&spec);
        assert_eq!(m.steps.len(), 1);
        assert_eq!(m.steps[0].occluded_area, 0.0);
        // 2*2 + 2*2 + 4 (top) + 4 (bottom)
        assert!(close(m.steps[0].area, 16.0));
    }

    #[test]
    fn degenerate_spec_gives_empty_metrics() {
        let m = compute_metrics(&PyramidSpec::EMPTY);
        assert!(m.is_empty());
        assert_eq!(m.total_volume, 0.0);

        let flat = PyramidSpec {
            v2: Vec3::ZERO,
            ..sample()
        };
        assert!(compute_metrics(&flat).is_empty());
    }

    #[test]
    fn repeated_computation_is_identical() {
        let spec = sample();
        assert_eq!(compute_metrics(&spec), compute_metrics(&spec));
    }

    #[test]
    fn large_step_count_is_measured_in_full() {
        let spec = PyramidSpec::from_vectors(
            Vec3::new(2000.0, 0.0, 0.0),
            Vec3::new(0.0, 2000.0, 0.0),
            Vec3::new(0.0, 0.0, 0.01),
        );
        assert_eq!(spec.step_count, 100_000);
        let m = compute_metrics(&spec);
        assert_eq!(m.steps.len(), 100_000);
        assert_eq!(m.steps[m.steps.len() - 1].occluded_area, 0.0);
    }
}
