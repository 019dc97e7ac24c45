//! Property tests over randomly seeded pyramids.

use proptest::prelude::*;
use pyramid_shared::basis::build_spec;
use pyramid_shared::math::Vec3;
use pyramid_shared::metrics::compute_metrics;
use pyramid_shared::pyramid::step_count_for;
use pyramid_shared::wireframe::{compute_wireframe, SEGMENTS_PER_STEP};

/// Relative tolerance for dot products of non-unit vectors.
const ORTHO_TOL: f32 = 1e-4;

fn arb_direction() -> impl Strategy<Value = Vec3> {
    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
        .prop_map(|(x, y, z)| Vec3::new(x, y, z))
        .prop_filter("non-zero direction", |v| v.length() > 0.1)
        .prop_map(|v| v.normalize_or_zero())
}

fn arb_previous() -> impl Strategy<Value = Vec3> {
    prop_oneof![
        Just(Vec3::ZERO),
        Just(Vec3::new(0.0, 7.0, 0.0)),
        (-10.0f32..10.0, -10.0f32..10.0, -10.0f32..10.0).prop_map(|(x, y, z)| Vec3::new(x, y, z)),
    ]
}

fn cos_between(a: Vec3, b: Vec3) -> f32 {
    a.dot(b).abs() / (a.length() * b.length())
}

// ---------------------------------------------------------------------------
// Basis
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn generated_basis_is_orthogonal(
        dir in arb_direction(),
        len in 3.0f32..10.0,
        frac in 6.0f32..100.0,
        prev in arb_previous(),
    ) {
        let spec = build_spec(dir, len, frac, prev);
        prop_assert!(spec.step_count >= 1);
        prop_assert!(cos_between(spec.v1, spec.v2) < ORTHO_TOL);
        prop_assert!(cos_between(spec.v1, spec.v3) < ORTHO_TOL);
        prop_assert!(cos_between(spec.v2, spec.v3) < ORTHO_TOL);
        prop_assert!((spec.v2.length() - spec.v1.length()).abs() < 1e-3 * len);
    }
}

proptest! {
    #[test]
    fn step_count_matches_formula(
        dir in arb_direction(),
        len in 3.0f32..10.0,
        frac in 6.0f32..100.0,
    ) {
        let spec = build_spec(dir, len, frac, Vec3::ZERO);
        prop_assert_eq!(spec.step_count, step_count_for(spec.v1.length(), spec.v3.length()));
    }
}

// ---------------------------------------------------------------------------
// Metrics and wireframe
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn totals_are_sums_of_steps(
        dir in arb_direction(),
        len in 3.0f32..10.0,
        frac in 6.0f32..100.0,
    ) {
        let spec = build_spec(dir, len, frac, Vec3::ZERO);
        let m = compute_metrics(&spec);
        prop_assert_eq!(m.steps.len(), spec.step_count as usize);

        let volume: f64 = m.steps.iter().map(|s| s.volume).sum();
        let area: f64 = m.steps.iter().map(|s| s.area).sum();
        let perimeter: f64 = m.steps.iter().map(|s| s.perimeter).sum();
        prop_assert!((m.total_volume - volume).abs() <= 1e-9 * volume.max(1.0));
        prop_assert!((m.total_area - area).abs() <= 1e-9 * area.max(1.0));
        prop_assert!((m.total_perimeter - perimeter).abs() <= 1e-9 * perimeter.max(1.0));

        let first = m.steps[0];
        let last = m.steps[m.steps.len() - 1];
        prop_assert_eq!(last.occluded_area, 0.0);
        let expected_first = 2.0 * first.width * first.height
            + 2.0 * first.length * first.height
            + 2.0 * first.width * first.length
            - first.occluded_area;
        prop_assert!((first.area - expected_first).abs() < 1e-9 * expected_first.max(1.0));
    }
}

proptest! {
    #[test]
    fn wireframe_has_twelve_segments_per_step(
        dir in arb_direction(),
        len in 3.0f32..10.0,
        frac in 6.0f32..100.0,
        ox in -50.0f32..50.0,
    ) {
        let spec = build_spec(dir, len, frac, Vec3::ZERO);
        let wf = compute_wireframe(&spec, Vec3::new(ox, 0.0, 0.0));
        prop_assert_eq!(wf.len(), spec.step_count as usize * SEGMENTS_PER_STEP);
        prop_assert_eq!(wf.segments().count(), wf.len());
    }
}

proptest! {
    #[test]
    fn derivations_are_idempotent(
        dir in arb_direction(),
        len in 3.0f32..10.0,
        frac in 6.0f32..100.0,
    ) {
        let spec = build_spec(dir, len, frac, Vec3::ZERO);
        prop_assert_eq!(compute_metrics(&spec), compute_metrics(&spec));
        let wf = compute_wireframe(&spec, Vec3::ZERO);
        let a: Vec<_> = wf.segments().collect();
        let b: Vec<_> = wf.segments().collect();
        prop_assert_eq!(a, b);
    }
}
