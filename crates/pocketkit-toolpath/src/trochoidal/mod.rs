//! Trochoidal clearing along the region's medial axis.
//!
//! The planner samples the boundary, solves an inscribed circle at every
//! sample, and starts with a spiral out to the largest circle. From there it
//! walks the remaining circles in boundary order, tapering over to each one
//! and sweeping an arc across it between its two contact points. A circle the
//! tool cannot reach in a straight line without leaving the region starts a
//! loop of its own.

pub mod kdtree;
pub mod medial_axis;
pub mod spiral;

use crate::context::PlanContext;
use crate::error::{MedialAxisError, ToolpathError, ToolpathResult};
use crate::pocket::{feed_possible, CutMode};
use medial_axis::{InscribedCircle, MedialAxis, MedialAxisCandidate};
use pocketkit_core::{Curve, Point, RegionAlgebra, Vertex, VertexKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use kdtree::{KdTree, Neighbour};
pub use spiral::{close_circle, spiral_archimedes, taper, SPIRAL_STEP};

/// Distance below which two tool positions are treated as the same.
pub const EPSILON: f64 = 1.0e-3;

/// Slack allowed when comparing a circle's advance with the stepover.
pub const RESOLUTION: f64 = 0.05;

/// Shrinking-ball solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrochoidalOptions {
    /// Radius of the initial ball; solves that grow past it count as diverged.
    pub seed_radius: f64,
    pub max_iterations: usize,
    /// Radius change at which the solve is considered converged.
    pub tolerance: f64,
    /// Longest boundary span between samples. Defaults to the stepover.
    pub sampling_length: Option<f64>,
}

impl Default for TrochoidalOptions {
    fn default() -> Self {
        Self {
            seed_radius: 1000.0,
            max_iterations: 64,
            tolerance: 1e-3,
            sampling_length: None,
        }
    }
}

/// Trochoidal loops clearing `cut_region`.
///
/// The first curve is the entry spiral around the maximum inscribed circle.
/// A later curve starts where the previous one ended when the straight
/// approach stays inside the region, otherwise at its own entry contact.
/// Conventional milling spirals clockwise, climb milling counter-clockwise.
pub fn trochoidal<R: RegionAlgebra>(
    cut_region: &R,
    stepover: f64,
    cut_mode: CutMode,
    options: &TrochoidalOptions,
    ctx: &PlanContext,
) -> ToolpathResult<Vec<Curve>> {
    if stepover.is_nan() || stepover <= 0.0 {
        return Err(ToolpathError::InvalidParameters(format!(
            "trochoidal stepover must be positive, got {}",
            stepover
        )));
    }
    let mut region = cut_region.clone();
    region.reorder()?;

    let sampling = options
        .sampling_length
        .filter(|s| *s > 0.0)
        .unwrap_or(stepover);
    let axis = MedialAxis::build(region.loops(), options, sampling, ctx)?;
    // Approaches may graze the boundary by up to EPSILON.
    let mut reach = region.clone();
    reach.offset(2.0 * EPSILON)?;
    let ordered = axis.ordered();
    let Some(mic) = ordered.first().and_then(|c| c.circle) else {
        return Err(MedialAxisError::NoInscribedCircle(axis.candidates.len()).into());
    };
    debug!(
        "maximum inscribed circle r={:.4} at ({:.4}, {:.4})",
        mic.radius, mic.center.x, mic.center.y
    );

    let clockwise = cut_mode == CutMode::Conventional;
    let outdir = ordered[1..]
        .iter()
        .filter_map(|c| c.circle)
        .find_map(|c| (c.center - mic.center).normalized())
        .unwrap_or(Point::new(1.0, 0.0));

    let mut curves = Vec::new();
    let mut entry = Curve::from_vertices(vec![Vertex::line(mic.center)]);
    spiral_archimedes(
        &mut entry,
        mic.center,
        mic.radius,
        outdir,
        SPIRAL_STEP,
        stepover,
        clockwise,
    );
    if mic.radius >= EPSILON {
        close_circle(&mut entry, mic.center, outdir * mic.radius, clockwise);
    }
    let mut loc = entry.last_point().unwrap_or(mic.center);
    curves.push(entry);

    let mut prev = mic;
    let mut skipped = 0usize;
    for candidate in ordered[1..].iter().copied() {
        ctx.check_cancelled()?;
        let Some(circle) = candidate.circle else {
            continue;
        };
        if circle.radius < EPSILON || advance(&prev, &circle) < stepover - RESOLUTION {
            skipped += 1;
            continue;
        }

        curves.push(sweep_candidate(
            &axis, &reach, candidate, &circle, loc, stepover,
        )?);
        loc = curves
            .last()
            .and_then(|c| c.last_point())
            .unwrap_or(loc);
        prev = circle;
    }

    debug!(
        "trochoidal: {} loops from {} candidates ({} thinned)",
        curves.len(),
        ordered.len(),
        skipped
    );
    Ok(curves)
}

/// How far the leading edge of `next` lies beyond that of `prev`.
fn advance(prev: &InscribedCircle, next: &InscribedCircle) -> f64 {
    let Some(v) = (next.center - prev.center).normalized() else {
        return 0.0;
    };
    let leading_prev = prev.center + v * prev.radius;
    let leading_next = next.center + v * next.radius;
    leading_next.distance_to(&leading_prev)
}

/// Taper from `loc` onto the candidate's circle, then arc across it.
///
/// When the straight line from `loc` to the entry contact leaves `reach`, the
/// curve starts at the entry contact instead.
fn sweep_candidate<R: RegionAlgebra>(
    axis: &MedialAxis,
    reach: &R,
    candidate: &MedialAxisCandidate,
    circle: &InscribedCircle,
    loc: Point,
    stepover: f64,
) -> ToolpathResult<Curve> {
    let boundary_contact = circle.center - candidate.normal * circle.radius;
    let touch_contact = (circle.touch - circle.center)
        .normalized()
        .map(|d| circle.center + d * circle.radius)
        .unwrap_or(boundary_contact);

    let (first, second, kind) =
        if loc.distance_to(&touch_contact) < loc.distance_to(&boundary_contact) {
            (touch_contact, boundary_contact, VertexKind::ArcCw)
        } else {
            (boundary_contact, touch_contact, VertexKind::ArcCcw)
        };

    let mut curve = if loc.distance_to(&first) <= EPSILON {
        Curve::from_vertices(vec![Vertex::line(loc)])
    } else if feed_possible(loc, first, reach, EPSILON)? {
        let boundary_dir = axis.spans[candidate.prev_span]
            .end_tangent()
            .or_else(|| axis.spans[candidate.span].start_tangent())
            .unwrap_or(Point::new(1.0, 0.0));
        let mut curve = Curve::from_vertices(vec![Vertex::line(loc)]);
        taper(
            &mut curve,
            loc,
            first,
            boundary_dir,
            stepover,
            EPSILON,
            |p| axis.clearance(p),
        );
        curve
    } else {
        debug!(
            "approach ({:.3}, {:.3}) -> ({:.3}, {:.3}) leaves the region",
            loc.x, loc.y, first.x, first.y
        );
        Curve::from_vertices(vec![Vertex::line(first)])
    };
    curve.push(Vertex::new(kind, second, circle.center));
    Ok(curve)
}
