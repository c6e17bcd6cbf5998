//! Pocket planning and depth-stepping traversal.
//!
//! [`pocket`] offsets the region for the tool, asks the selected strategy for
//! an ordered loop list and then cuts that list at every depth level. Between
//! loops the tool stays down whenever a straight feed to the next loop start
//! only crosses material that is already cleared; otherwise it retracts.

use crate::context::PlanContext;
use crate::depth::DepthParams;
use crate::error::{ParameterError, ParameterResult, ToolpathResult};
use crate::motion::{MotionSink, MoveRecorder};
use crate::offsets::offsets;
use crate::profile::{NearestPointAnchor, StartAnchor};
use crate::trochoidal::{trochoidal, TrochoidalOptions};
use crate::zigzag::zigzag;
use pocketkit_core::{
    Curve, GeometryError, Point, RegionAlgebra, VertexKind, AREA_TOLERANCE, POINT_TOLERANCE,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Amount by which the feed-safety region reaches past the material boundary.
pub const FEED_SAFETY_MARGIN: f64 = 0.01;

/// Smallest disc radius used for the feed-safety sweep.
const MIN_SWEEP_RADIUS: f64 = 1e-3;

/// Cut direction relative to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    #[default]
    Conventional,
    Climb,
}

/// Area clearing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PocketStrategy {
    /// Raster rows alternating direction.
    Zigzag,
    /// Raster rows all cut in the same direction.
    ZigzagUnidirectional,
    /// Concentric inward offsets.
    #[default]
    Offsets,
    /// Looping moves along the medial axis.
    Trochoidal,
}

impl PocketStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PocketStrategy::Zigzag => "zigzag",
            PocketStrategy::ZigzagUnidirectional => "zigzag-unidirectional",
            PocketStrategy::Offsets => "offsets",
            PocketStrategy::Trochoidal => "trochoidal",
        }
    }
}

impl fmt::Display for PocketStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of one pocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PocketParams {
    pub tool_radius: f64,
    /// Material left on the pocket walls.
    pub extra_offset: f64,
    /// Distance between adjacent passes.
    pub stepover: f64,
    pub strategy: PocketStrategy,
    pub cut_mode: CutMode,
    /// Raster angle in degrees, zigzag strategies only.
    pub zig_angle: f64,
    /// Cut offset levels from the middle outwards.
    pub from_center: bool,
    /// Start the first loop at the boundary point nearest this position.
    pub start_point: Option<Point>,
    pub trochoidal: TrochoidalOptions,
}

impl Default for PocketParams {
    fn default() -> Self {
        Self {
            tool_radius: 3.0,
            extra_offset: 0.0,
            stepover: 2.0,
            strategy: PocketStrategy::default(),
            cut_mode: CutMode::default(),
            zig_angle: 0.0,
            from_center: false,
            start_point: None,
            trochoidal: TrochoidalOptions::default(),
        }
    }
}

impl PocketParams {
    pub fn new(tool_radius: f64, stepover: f64, strategy: PocketStrategy) -> Self {
        Self {
            tool_radius,
            stepover,
            strategy,
            ..Self::default()
        }
    }

    /// Checks the tool radius and stepover.
    pub fn validate(&self) -> ParameterResult<()> {
        if !(self.stepover.is_finite() && self.stepover > 0.0) {
            return Err(ParameterError::OutOfRange {
                name: "stepover".to_string(),
                value: self.stepover,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if !(self.tool_radius.is_finite() && self.tool_radius >= 0.0) {
            return Err(ParameterError::OutOfRange {
                name: "tool_radius".to_string(),
                value: self.tool_radius,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if !self.extra_offset.is_finite() {
            return Err(ParameterError::InvalidValue {
                name: "extra_offset".to_string(),
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// Counts reported after a pocket has been cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PocketSummary {
    pub loops: usize,
    pub depths: usize,
    pub retracts: usize,
}

/// Whether the tool may feed straight from `p0` to `p1` without leaving
/// `safety_region`.
///
/// The disc of `tool_radius` swept along the segment must lie entirely inside
/// the safety region.
pub fn feed_possible<R: RegionAlgebra>(
    p0: Point,
    p1: Point,
    safety_region: &R,
    tool_radius: f64,
) -> ToolpathResult<bool> {
    if p0 == p1 {
        return Ok(true);
    }
    let radius = tool_radius.max(MIN_SWEEP_RADIUS);
    let mut swept = R::from_loops(vec![Curve::stadium(p0, p1, radius)]);
    swept.subtract(safety_region)?;
    Ok(swept.area().abs() <= AREA_TOLERANCE)
}

/// Cut region (tool centre area) and feed-safety region for `region`.
pub fn prepare_regions<R: RegionAlgebra>(
    region: &R,
    params: &PocketParams,
) -> ToolpathResult<(R, R)> {
    let mut safety = region.clone();
    safety.offset(-(params.extra_offset - FEED_SAFETY_MARGIN))?;

    let mut cut = region.clone();
    cut.offset(-(params.tool_radius + params.extra_offset))?;
    cut.reorder()?;
    if cut.is_empty() {
        warn!(
            "tool radius {} leaves nothing to cut in a region of {} loops",
            params.tool_radius,
            region.loop_count()
        );
    }
    Ok((cut, safety))
}

/// Ordered loops produced by the configured strategy for `cut_region`.
pub fn plan_loops<R: RegionAlgebra>(
    cut_region: &R,
    params: &PocketParams,
    ctx: &PlanContext,
) -> ToolpathResult<Vec<Curve>> {
    let loops = match params.strategy {
        PocketStrategy::Zigzag => zigzag(cut_region, params.stepover, false, params.zig_angle, ctx)?,
        PocketStrategy::ZigzagUnidirectional => {
            zigzag(cut_region, params.stepover, true, params.zig_angle, ctx)?
        }
        PocketStrategy::Offsets => offsets(
            cut_region,
            params.stepover,
            params.from_center,
            params.cut_mode,
            ctx,
        )?,
        PocketStrategy::Trochoidal => trochoidal(
            cut_region,
            params.stepover,
            params.cut_mode,
            &params.trochoidal,
            ctx,
        )?,
    };
    debug!("{} produced {} loops", params.strategy, loops.len());
    Ok(loops)
}

/// Plans and cuts a pocket, emitting every move on `sink`.
///
/// Parameters and the depth schedule are validated before any move is
/// emitted. A start point, when set, is honoured with [`NearestPointAnchor`].
pub fn pocket<R: RegionAlgebra, S: MotionSink>(
    region: &R,
    params: &PocketParams,
    depth_params: &DepthParams,
    ctx: &PlanContext,
    sink: &mut S,
) -> ToolpathResult<PocketSummary> {
    pocket_with_anchor(region, params, depth_params, &NearestPointAnchor, ctx, sink)
}

/// [`pocket`] with a caller-supplied start anchoring strategy.
pub fn pocket_with_anchor<R: RegionAlgebra, S: MotionSink>(
    region: &R,
    params: &PocketParams,
    depth_params: &DepthParams,
    anchor: &dyn StartAnchor,
    ctx: &PlanContext,
    sink: &mut S,
) -> ToolpathResult<PocketSummary> {
    params.validate()?;
    let depths = depth_params.depths()?;

    let (cut_region, safety_region) = prepare_regions(region, params)?;
    let mut loops = plan_loops(&cut_region, params, ctx)?;
    if loops.iter().any(|c| c.is_empty()) {
        return Err(GeometryError::EmptyCurve.into());
    }

    let mut traversal = Traversal {
        sink,
        safety_region: &safety_region,
        tool_radius: params.tool_radius,
        depth_params,
        prev: None,
        slot_pending: true,
        retracts: 0,
    };

    let mut start_depth = depth_params.start_depth;
    match params.start_point {
        None => {
            for &depth in &depths {
                ctx.check_cancelled()?;
                for curve in &loops {
                    let retract = traversal.needs_retract(curve)?;
                    traversal.cut_loop(curve, retract, start_depth, depth);
                }
                start_depth = depth;
            }
        }
        Some(point) => {
            if let Some(first) = loops.first_mut() {
                *first = anchor.trim_to_start(first, point);
            }
            for &depth in &depths {
                ctx.check_cancelled()?;
                for (index, curve) in loops.iter().enumerate() {
                    let retract = index == 0 || traversal.needs_retract(curve)?;
                    traversal.cut_loop(curve, retract, start_depth, depth);
                }
                traversal.sink.rapid(None, None, Some(depth_params.clearance_height));
                start_depth = depth;
            }
        }
    }

    let summary = PocketSummary {
        loops: loops.len(),
        depths: depths.len(),
        retracts: traversal.retracts,
    };
    info!(
        "pocket planned: strategy={}, loops={}, depths={}, retracts={}",
        params.strategy, summary.loops, summary.depths, summary.retracts
    );
    Ok(summary)
}

/// Per-pocket traversal state: last tool position and the pending slot entry.
struct Traversal<'a, R, S> {
    sink: &'a mut S,
    safety_region: &'a R,
    tool_radius: f64,
    depth_params: &'a DepthParams,
    prev: Option<Point>,
    slot_pending: bool,
    retracts: usize,
}

impl<R: RegionAlgebra, S: MotionSink> Traversal<'_, R, S> {
    fn needs_retract(&self, curve: &Curve) -> ToolpathResult<bool> {
        let (Some(prev), Some(start)) = (self.prev, curve.first_point()) else {
            return Ok(false);
        };
        if prev.approx_eq(&start, POINT_TOLERANCE) {
            return Ok(false);
        }
        Ok(!feed_possible(prev, start, self.safety_region, self.tool_radius)?)
    }

    fn cut_loop(&mut self, curve: &Curve, retract: bool, start_depth: f64, depth: f64) {
        let Some((first, rest)) = curve.vertices().split_first() else {
            return;
        };
        let start = first.point;
        let approach = start_depth + self.depth_params.rapid_safety_space;
        if retract {
            self.retracts += 1;
            self.sink
                .rapid(None, None, Some(self.depth_params.clearance_height));
            self.sink.rapid(Some(start.x), Some(start.y), None);
            self.sink.rapid(None, None, Some(approach));
        } else {
            self.sink.rapid(None, None, Some(approach));
            self.sink.rapid(Some(start.x), Some(start.y), None);
        }
        self.sink.feed(0.0, None, None, Some(depth));

        let mut prev = start;
        for v in rest {
            let scale = if std::mem::take(&mut self.slot_pending) {
                1.0
            } else {
                0.0
            };
            let (i, j) = (v.center.x - prev.x, v.center.y - prev.y);
            match v.kind {
                VertexKind::Line => self.sink.feed(scale, Some(v.point.x), Some(v.point.y), None),
                VertexKind::ArcCw => self.sink.arc_cw(scale, v.point.x, v.point.y, i, j),
                VertexKind::ArcCcw => self.sink.arc_ccw(scale, v.point.x, v.point.y, i, j),
            }
            prev = v.point;
        }
        self.prev = Some(prev);
    }
}

/// One region to plan in a batch.
#[derive(Debug, Clone)]
pub struct PocketJob<R> {
    pub region: R,
    pub params: PocketParams,
    pub depths: DepthParams,
}

/// Moves and counts of a pocket planned by [`plan_batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPocket {
    pub moves: MoveRecorder,
    pub summary: PocketSummary,
}

/// Plans independent pockets in parallel.
///
/// Results come back in job order; a failure in one job leaves the others
/// untouched.
pub fn plan_batch<R: RegionAlgebra>(
    jobs: &[PocketJob<R>],
    ctx: &PlanContext,
) -> Vec<ToolpathResult<PlannedPocket>> {
    jobs.par_iter()
        .map(|job| {
            let mut moves = MoveRecorder::new();
            let summary = pocket(&job.region, &job.params, &job.depths, ctx, &mut moves)?;
            Ok(PlannedPocket { moves, summary })
        })
        .collect()
}
