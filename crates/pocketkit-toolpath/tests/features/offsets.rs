use pocketkit_core::{CancellationToken, Curve, Point, Region, RegionAlgebra};
use pocketkit_toolpath::{curve_list, decompose, offsets, CutMode, PlanContext};
use proptest::prelude::*;

fn square(min: f64, max: f64) -> Region {
    Region::rectangle(Point::new(min, min), Point::new(max, max))
}

fn width(curve: &Curve) -> f64 {
    curve.bounding_box().map(|bb| bb.width()).unwrap_or(0.0)
}

#[test]
fn test_square_shrinks_by_stepover_each_level() {
    let loops = offsets(
        &square(0.0, 10.0),
        2.0,
        false,
        CutMode::Conventional,
        &PlanContext::default(),
    )
    .unwrap();
    let widths: Vec<f64> = loops.iter().map(width).collect();
    assert_eq!(widths.len(), 3);
    for (got, want) in widths.iter().zip([10.0, 6.0, 2.0]) {
        assert!((got - want).abs() < 1e-6, "{} vs {}", got, want);
    }
}

#[test]
fn test_from_center_reverses_level_order() {
    let loops = offsets(
        &square(0.0, 10.0),
        2.0,
        true,
        CutMode::Conventional,
        &PlanContext::default(),
    )
    .unwrap();
    let widths: Vec<f64> = loops.iter().map(width).collect();
    assert!((widths[0] - 2.0).abs() < 1e-6);
    assert!((widths[2] - 10.0).abs() < 1e-6);
}

#[test]
fn test_levels_nest_inside_their_parent() {
    let levels = decompose(&square(0.0, 10.0), 1.5, false, &PlanContext::default()).unwrap();
    for pair in levels.windows(2) {
        let outer = pair[0].bounding_box().unwrap();
        let inner = pair[1].bounding_box().unwrap();
        assert!(outer.contains_box(&inner, 1e-6));
        assert!(pair[1].area() < pair[0].area());
    }
}

#[test]
fn test_climb_reverses_loops() {
    let loops = offsets(
        &square(0.0, 10.0),
        2.0,
        false,
        CutMode::Climb,
        &PlanContext::default(),
    )
    .unwrap();
    assert!(loops.iter().all(|c| c.is_clockwise()));
}

#[test]
fn test_island_splits_into_separate_pieces() {
    // A narrow wall between two cavities separates after the first shrink.
    let mut region = Region::rectangle(Point::new(0.0, 0.0), Point::new(22.0, 10.0));
    region
        .subtract(&Region::rectangle(Point::new(10.0, -1.0), Point::new(12.0, 8.0)))
        .unwrap();
    let levels = decompose(&region, 2.0, false, &PlanContext::default()).unwrap();
    assert!(levels.len() > 2);
    let loops = curve_list(&levels, false);
    let bounds = region.bounding_box().unwrap();
    assert!(loops
        .iter()
        .filter_map(|c| c.bounding_box())
        .all(|bb| bounds.contains_box(&bb, 1e-6)));
}

#[test]
fn test_empty_region_has_no_loops() {
    let loops = offsets(
        &Region::new(),
        1.0,
        false,
        CutMode::Conventional,
        &PlanContext::default(),
    )
    .unwrap();
    assert!(loops.is_empty());
}

#[test]
fn test_cancelled_decomposition_stops() {
    let token = CancellationToken::new();
    let ctx = PlanContext::default().with_cancel(token.clone());
    token.cancel();
    let result = decompose(&square(0.0, 10.0), 1.0, false, &ctx);
    assert!(matches!(
        result,
        Err(pocketkit_toolpath::ToolpathError::Cancelled)
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_rectangles_terminate_with_shrinking_levels(
        w in 1.0f64..30.0,
        h in 1.0f64..30.0,
        stepover in 0.4f64..5.0,
    ) {
        let region = Region::rectangle(Point::zero(), Point::new(w, h));
        let levels = decompose(&region, stepover, false, &PlanContext::default()).unwrap();
        let bound = (w.min(h) / 2.0 / stepover).floor() as usize + 1;
        prop_assert!(!levels.is_empty());
        prop_assert!(levels.len() <= bound);
        for pair in levels.windows(2) {
            prop_assert!(pair[1].area() < pair[0].area());
        }
    }

    #[test]
    fn prop_reversing_twice_restores_loops(
        x0 in -20.0f64..0.0,
        y0 in -20.0f64..0.0,
        w in 0.5f64..20.0,
        h in 0.5f64..20.0,
        r in 0.1f64..5.0,
    ) {
        let region = Region::from_loops(vec![
            Curve::rectangle(Point::new(x0, y0), Point::new(x0 + w, y0 + h)),
            Curve::circle(Point::new(40.0, 0.0), r),
        ]);
        let forward = curve_list(&[region.clone()], false);
        let once = curve_list(&[region], true);
        let twice = curve_list(&[Region::from_loops(once)], true);
        prop_assert_eq!(twice, forward);
    }
}
