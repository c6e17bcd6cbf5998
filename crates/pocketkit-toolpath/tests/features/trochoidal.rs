use pocketkit_core::{Curve, Point, Region, RegionAlgebra, VertexKind};
use pocketkit_toolpath::{
    trochoidal, CutMode, MedialAxis, MedialAxisError, PlanContext, ToolpathError,
    TrochoidalOptions,
};
use proptest::prelude::*;

fn l_shape() -> Region {
    Region::from_loops(vec![Curve::polygon(&[
        Point::new(0.0, 0.0),
        Point::new(30.0, 0.0),
        Point::new(30.0, 10.0),
        Point::new(10.0, 10.0),
        Point::new(10.0, 30.0),
        Point::new(0.0, 30.0),
    ])])
}

fn square_with_island() -> Region {
    let mut region = Region::rectangle(Point::zero(), Point::new(40.0, 40.0));
    region
        .subtract(&Region::rectangle(
            Point::new(15.0, 15.0),
            Point::new(25.0, 25.0),
        ))
        .unwrap();
    region
}

/// Inside when enclosed by an odd number of loops or lying on the boundary.
fn inside(region: &Region, p: Point) -> bool {
    let on_boundary = region
        .loops()
        .iter()
        .flat_map(|l| l.spans())
        .any(|s| s.distance_to(p) <= 5e-3);
    let enclosing = region.loops().iter().filter(|l| l.contains_point(p)).count();
    on_boundary || enclosing % 2 == 1
}

fn assert_curves_inside(region: &Region, curves: &[Curve]) {
    for (i, curve) in curves.iter().enumerate() {
        for span in curve.spans() {
            for k in 0..=16 {
                let p = span.point_at(k as f64 / 16.0);
                assert!(
                    inside(region, p),
                    "curve {} leaves the region at ({:.4}, {:.4})",
                    i,
                    p.x,
                    p.y
                );
            }
        }
    }
}

#[test]
fn test_l_shape_loops_stay_inside() {
    let region = l_shape();
    let curves = trochoidal(
        &region,
        2.0,
        CutMode::Conventional,
        &TrochoidalOptions::default(),
        &PlanContext::default(),
    )
    .unwrap();
    assert!(curves.len() > 1);
    assert_curves_inside(&region, &curves);
}

#[test]
fn test_island_square_loops_stay_inside() {
    let region = square_with_island();
    assert_eq!(region.loop_count(), 2);
    for cut_mode in [CutMode::Conventional, CutMode::Climb] {
        let curves = trochoidal(
            &region,
            2.0,
            cut_mode,
            &TrochoidalOptions::default(),
            &PlanContext::default(),
        )
        .unwrap();
        assert!(curves.len() > 1);
        assert_curves_inside(&region, &curves);
    }
}

#[test]
fn test_largest_circle_leads_the_ordering() {
    let region = l_shape();
    let axis = MedialAxis::build(
        region.loops(),
        &TrochoidalOptions::default(),
        1.0,
        &PlanContext::default(),
    )
    .unwrap();
    let ordered = axis.ordered();
    assert!(!ordered.is_empty());
    let first = ordered[0].circle.unwrap().radius;
    let max = axis
        .candidates
        .iter()
        .filter_map(|c| c.circle)
        .map(|c| c.radius)
        .fold(0.0, f64::max);
    assert_eq!(first, max);
    // Circles never poke through the walls.
    for c in axis.candidates.iter().filter_map(|c| c.circle) {
        let clearance = axis
            .spans
            .iter()
            .map(|s| s.distance_to(c.center))
            .fold(f64::INFINITY, f64::min);
        assert!(c.radius <= clearance + 1e-9);
    }
}

#[test]
fn test_conventional_and_climb_mirror_the_spiral() {
    let region = Region::rectangle(Point::zero(), Point::new(16.0, 16.0));
    let ctx = PlanContext::default();
    let options = TrochoidalOptions::default();
    let conventional = trochoidal(&region, 1.0, CutMode::Conventional, &options, &ctx).unwrap();
    let climb = trochoidal(&region, 1.0, CutMode::Climb, &options, &ctx).unwrap();

    let arcs = |c: &Curve, kind: VertexKind| c.vertices().iter().filter(|v| v.kind == kind).count();
    assert!(arcs(&conventional[0], VertexKind::ArcCw) > 0);
    assert_eq!(arcs(&conventional[0], VertexKind::ArcCcw), 0);
    assert!(arcs(&climb[0], VertexKind::ArcCcw) > 0);
    assert_eq!(arcs(&climb[0], VertexKind::ArcCw), 0);
}

#[test]
fn test_candidate_arcs_stay_on_their_circle() {
    let region = Region::rectangle(Point::zero(), Point::new(40.0, 12.0));
    let curves = trochoidal(
        &region,
        2.0,
        CutMode::Conventional,
        &TrochoidalOptions::default(),
        &PlanContext::default(),
    )
    .unwrap();
    for curve in curves.iter().skip(1) {
        let last = curve.spans().last().unwrap();
        assert!(last.kind.is_arc());
        let r_start = last.start.distance_to(&last.center);
        let r_end = last.end.distance_to(&last.center);
        assert!((r_start - r_end).abs() < 1e-2);
    }
}

#[test]
fn test_fails_without_boundary() {
    let result = trochoidal(
        &Region::new(),
        1.0,
        CutMode::Conventional,
        &TrochoidalOptions::default(),
        &PlanContext::default(),
    );
    assert!(matches!(
        result,
        Err(ToolpathError::MedialAxis(MedialAxisError::NoBoundarySpans))
    ));
}

#[test]
fn test_options_deserialize_with_defaults() {
    let options: TrochoidalOptions = serde_json::from_str(r#"{"max_iterations": 10}"#).unwrap();
    assert_eq!(options.max_iterations, 10);
    assert_eq!(options.seed_radius, 1000.0);
    assert_eq!(options.sampling_length, None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_spiral_stays_within_largest_circle(
        w in 6.0f64..30.0,
        h in 6.0f64..30.0,
        stepover in 0.5f64..3.0,
    ) {
        let region = Region::rectangle(Point::zero(), Point::new(w, h));
        let ctx = PlanContext::default();
        let options = TrochoidalOptions::default();
        let mut normalized = region.clone();
        normalized.reorder().unwrap();
        let axis = MedialAxis::build(normalized.loops(), &options, stepover, &ctx).unwrap();
        let mic = axis.ordered()[0].circle.unwrap();

        let curves = trochoidal(&region, stepover, CutMode::Conventional, &options, &ctx).unwrap();
        let spiral = &curves[0];
        prop_assert!(spiral.first_point().unwrap().approx_eq(&mic.center, 1e-9));
        for v in spiral.vertices() {
            prop_assert!(v.point.distance_to(&mic.center) <= mic.radius + 1e-6);
        }
    }
}
