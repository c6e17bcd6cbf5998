use pocketkit_core::{Point, Region, RegionAlgebra};
use pocketkit_toolpath::{
    feed_possible, plan_batch, pocket, DepthParams, GcodeOptions, GcodeWriter, Move,
    MoveRecorder, PlanContext, PocketJob, PocketParams, PocketStrategy,
};
use proptest::prelude::*;

fn square(min: f64, max: f64) -> Region {
    Region::rectangle(Point::new(min, min), Point::new(max, max))
}

fn single_depth() -> DepthParams {
    DepthParams::new(5.0, 1.0, 0.0, 2.0, -1.0)
}

#[test]
fn test_feed_possible_scenario() {
    let mut region = square(0.0, 10.0);
    region.offset(1.0).unwrap();
    assert!(feed_possible(Point::new(0.0, 0.0), Point::new(5.0, 0.0), &region, 0.5).unwrap());
    assert!(!feed_possible(Point::new(0.0, 0.0), Point::new(20.0, 0.0), &region, 0.5).unwrap());
}

#[test]
fn test_feed_across_an_island_is_refused() {
    let mut region = square(0.0, 20.0);
    region.subtract(&square(8.0, 12.0)).unwrap();
    assert!(!feed_possible(Point::new(2.0, 10.0), Point::new(18.0, 10.0), &region, 1.0).unwrap());
    assert!(feed_possible(Point::new(2.0, 2.0), Point::new(18.0, 2.0), &region, 1.0).unwrap());
}

#[test]
fn test_concentric_loops_stay_down() {
    let mut sink = MoveRecorder::new();
    let params = PocketParams::new(1.0, 2.0, PocketStrategy::Offsets);
    let summary = pocket(
        &square(0.0, 20.0),
        &params,
        &single_depth(),
        &PlanContext::default(),
        &mut sink,
    )
    .unwrap();
    assert!(summary.loops > 2);
    assert_eq!(summary.retracts, 0);
    assert_eq!(sink.count_rapids_to(5.0), 0);
}

#[test]
fn test_separate_pockets_need_a_retract() {
    let region = Region::from_loops(vec![
        pocketkit_core::Curve::rectangle(Point::new(0.0, 0.0), Point::new(10.0, 10.0)),
        pocketkit_core::Curve::rectangle(Point::new(30.0, 0.0), Point::new(40.0, 10.0)),
    ]);
    let mut sink = MoveRecorder::new();
    let params = PocketParams::new(1.0, 2.0, PocketStrategy::Offsets);
    let summary = pocket(
        &region,
        &params,
        &single_depth(),
        &PlanContext::default(),
        &mut sink,
    )
    .unwrap();
    assert!(summary.retracts >= 1);
    assert_eq!(sink.count_rapids_to(5.0), summary.retracts);
}

#[test]
fn test_moves_follow_loop_geometry() {
    let mut sink = MoveRecorder::new();
    let params = PocketParams::new(0.0, 2.0, PocketStrategy::Zigzag);
    pocket(
        &square(0.0, 10.0),
        &params,
        &single_depth(),
        &PlanContext::default(),
        &mut sink,
    )
    .unwrap();
    // Every cutting move lands inside the pocket.
    for m in &sink.moves {
        if let Some((x, y)) = m.xy() {
            assert!((-1e-6..=10.0 + 1e-6).contains(&x));
            assert!((-1e-6..=10.0 + 1e-6).contains(&y));
        }
    }
    let plunge = sink
        .moves
        .iter()
        .position(|m| matches!(m, Move::Feed { z: Some(z), .. } if *z == -1.0))
        .unwrap();
    assert!(sink.moves[..plunge].iter().all(Move::is_rapid));
}

#[test]
fn test_gcode_output() {
    let mut writer = GcodeWriter::new(GcodeOptions::default());
    let params = PocketParams::new(1.0, 2.0, PocketStrategy::Trochoidal);
    pocket(
        &square(0.0, 20.0),
        &params,
        &single_depth(),
        &PlanContext::default(),
        &mut writer,
    )
    .unwrap();
    let program = writer.finish();
    assert!(program.starts_with("; Generated by pocketkit"));
    assert!(program.contains("G02"));
    assert!(program.contains("G01 Z-1.000 F150"));
    assert!(program.trim_end().ends_with("; End program"));
}

#[test]
fn test_batch_matches_sequential_planning() {
    let jobs: Vec<PocketJob<Region>> = [PocketStrategy::Offsets, PocketStrategy::Zigzag]
        .into_iter()
        .map(|strategy| PocketJob {
            region: square(0.0, 12.0),
            params: PocketParams::new(1.0, 1.5, strategy),
            depths: DepthParams::default(),
        })
        .collect();
    let ctx = PlanContext::default();
    let results = plan_batch(&jobs, &ctx);
    for (job, result) in jobs.iter().zip(results) {
        let mut sink = MoveRecorder::new();
        let summary = pocket(&job.region, &job.params, &job.depths, &ctx, &mut sink).unwrap();
        let planned = result.unwrap();
        assert_eq!(planned.summary, summary);
        assert_eq!(planned.moves, sink);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_feed_to_same_point_is_always_possible(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        r in 0.0f64..10.0,
    ) {
        let p = Point::new(x, y);
        prop_assert!(feed_possible(p, p, &square(0.0, 1.0), r).unwrap());
        prop_assert!(feed_possible(p, p, &Region::new(), r).unwrap());
    }
}
