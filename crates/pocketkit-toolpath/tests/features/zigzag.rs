use pocketkit_core::{Point, Region, RegionAlgebra, Rotation};
use pocketkit_toolpath::{strip_rows, zigzag, PlanContext, ToolpathError, MAX_STRIPS};

fn square() -> Region {
    Region::rectangle(Point::zero(), Point::new(10.0, 10.0))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_square_rows_alternate_between_edges() {
    let region = square();
    let rows = strip_rows(&region.bounding_box().unwrap(), 2.0, 1.0);
    assert_eq!(rows.len(), 6);

    let zigs = zigzag(&region, 2.0, false, 0.0, &PlanContext::default()).unwrap();
    // The sixth strip lies above the square.
    assert_eq!(zigs.len(), 5);

    for (k, zig) in zigs.iter().take(4).enumerate() {
        let start = zig.first_point().unwrap();
        let end = zig.last_point().unwrap();
        let y0 = 0.1 + 2.0 * k as f64;
        assert!(close(start.y, y0));
        assert!(close(end.y, y0 + 2.0));
        let (from_x, to_x) = if k % 2 == 0 { (10.0, 0.0) } else { (0.0, 10.0) };
        assert!(close(start.x, from_x), "zig {} starts at {:?}", k, start);
        assert!(close(end.x, to_x), "zig {} ends at {:?}", k, end);
    }
}

#[test]
fn test_consecutive_zigs_chain() {
    let zigs = zigzag(&square(), 2.0, false, 0.0, &PlanContext::default()).unwrap();
    for pair in zigs.windows(2) {
        let end = pair[0].last_point().unwrap();
        let start = pair[1].first_point().unwrap();
        assert!(end.approx_eq(&start, 0.002));
    }
}

#[test]
fn test_unidirectional_zigs_end_on_their_bottom_row() {
    for angle in [0.0, 30.0, 90.0] {
        let zigs = zigzag(&square(), 1.5, true, angle, &PlanContext::default()).unwrap();
        assert!(!zigs.is_empty());
        let rotation = Rotation::from_degrees(-angle);
        for zig in &zigs {
            let start = rotation.apply(zig.first_point().unwrap());
            let end = rotation.apply(zig.last_point().unwrap());
            assert!((start.y - end.y).abs() < 0.002, "angle {}: {:?}", angle, zig);
        }
    }
}

#[test]
fn test_rotated_raster_stays_inside_region() {
    let region = square();
    let zigs = zigzag(&region, 1.0, false, 45.0, &PlanContext::default()).unwrap();
    assert!(!zigs.is_empty());
    let bounds = region.bounding_box().unwrap();
    for zig in &zigs {
        assert!(bounds.contains_box(&zig.bounding_box().unwrap(), 1e-6));
    }
}

#[test]
fn test_island_splits_rows() {
    let mut region = Region::rectangle(Point::zero(), Point::new(20.0, 10.0));
    region
        .subtract(&Region::rectangle(Point::new(8.0, 3.0), Point::new(12.0, 7.0)))
        .unwrap();
    let zigs = zigzag(&region, 1.0, false, 0.0, &PlanContext::default()).unwrap();
    // No zig point lies strictly inside the island.
    for zig in &zigs {
        for v in zig.vertices() {
            let p = v.point;
            let inside = p.x > 8.0 + 1e-6 && p.x < 12.0 - 1e-6 && p.y > 3.0 + 1e-6 && p.y < 7.0 - 1e-6;
            assert!(!inside, "{:?} inside the island", p);
        }
    }
    assert!(zigs.len() >= 10);
}

#[test]
fn test_empty_region_and_bad_stepover() {
    let ctx = PlanContext::default();
    assert!(zigzag(&Region::new(), 1.0, false, 0.0, &ctx)
        .unwrap()
        .is_empty());
    assert!(matches!(
        zigzag(&square(), 0.0, false, 0.0, &ctx),
        Err(ToolpathError::InvalidParameters(_))
    ));
}

#[test]
fn test_tiny_stepover_is_rejected() {
    let ctx = PlanContext::default();
    assert!(matches!(
        zigzag(&square(), 1e-9, false, 0.0, &ctx),
        Err(ToolpathError::InvalidParameters(_))
    ));
    // Just under the cap still plans.
    let stepover = 10.0 / (MAX_STRIPS as f64 / 100.0);
    assert!(zigzag(&square(), stepover, true, 0.0, &ctx).is_ok());
}
