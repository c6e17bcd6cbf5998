use pocketkit_core::Point;
use pocketkit_toolpath::KdTree;
use proptest::prelude::*;

fn brute_force(points: &[Point], query: Point, k: usize) -> Vec<(usize, f64)> {
    let mut all: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (query.distance_squared_to(p), i))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    all.into_iter()
        .take(k)
        .map(|(d2, i)| (i, d2.sqrt()))
        .collect()
}

#[test]
fn test_duplicate_points_break_ties_by_index() {
    let points = vec![
        Point::new(1.0, 1.0),
        Point::new(3.0, 3.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 1.0),
    ];
    let tree = KdTree::build(&points);
    let found: Vec<usize> = tree
        .nearest_k(Point::new(0.0, 0.0), 3)
        .iter()
        .map(|n| n.index)
        .collect();
    assert_eq!(found, vec![0, 2, 3]);
}

proptest! {
    #[test]
    fn prop_nearest_k_matches_brute_force(
        coords in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 0..80),
        qx in -120.0f64..120.0,
        qy in -120.0f64..120.0,
        k in 1usize..6,
    ) {
        let points: Vec<Point> = coords.iter().map(|(x, y)| Point::new(*x, *y)).collect();
        let tree = KdTree::build(&points);
        let query = Point::new(qx, qy);
        let found: Vec<(usize, f64)> = tree
            .nearest_k(query, k)
            .iter()
            .map(|n| (n.index, n.distance))
            .collect();
        prop_assert_eq!(found, brute_force(&points, query, k));
    }

    #[test]
    fn prop_grid_points_tie_like_brute_force(
        coords in prop::collection::vec((0i32..6, 0i32..6), 1..40),
        qx in 0i32..6,
        qy in 0i32..6,
    ) {
        let points: Vec<Point> = coords
            .iter()
            .map(|(x, y)| Point::new(*x as f64, *y as f64))
            .collect();
        let tree = KdTree::build(&points);
        let query = Point::new(qx as f64 + 0.5, qy as f64 + 0.5);
        let found: Vec<usize> = tree.nearest_k(query, 4).iter().map(|n| n.index).collect();
        let expected: Vec<usize> = brute_force(&points, query, 4).iter().map(|n| n.0).collect();
        prop_assert_eq!(found, expected);
    }
}
