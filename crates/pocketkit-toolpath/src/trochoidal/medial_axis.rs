//! Approximate medial axis from boundary samples.
//!
//! Every boundary span start becomes a candidate. Its locally inscribed circle
//! is found with the shrinking-ball method: a large ball tangent to the
//! boundary at the candidate is shrunk until no other boundary sample lies
//! inside it.

use super::kdtree::KdTree;
use super::TrochoidalOptions;
use crate::context::PlanContext;
use crate::error::{MedialAxisError, ToolpathResult};
use pocketkit_core::{Curve, Point, Span};
use tracing::{debug, warn};

/// Circle inscribed in the region at a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InscribedCircle {
    pub center: Point,
    pub radius: f64,
    /// Second boundary point the circle touches.
    pub touch: Point,
}

/// Boundary sample with its inscribed circle.
#[derive(Debug, Clone, PartialEq)]
pub struct MedialAxisCandidate {
    pub point: Point,
    /// Unit normal pointing into the region.
    pub normal: Point,
    /// Index of the span ending at `point`.
    pub prev_span: usize,
    /// Index of the span starting at `point`.
    pub span: usize,
    /// `None` when the solve diverged (locally flat or open boundary).
    pub circle: Option<InscribedCircle>,
}

/// Boundary spans and the candidates sampled from them.
#[derive(Debug, Clone)]
pub struct MedialAxis {
    pub spans: Vec<Span>,
    pub candidates: Vec<MedialAxisCandidate>,
}

impl MedialAxis {
    /// Samples the boundary `loops` and solves every candidate's circle.
    ///
    /// Loops must follow the region winding convention (interior on the left).
    pub fn build(
        loops: &[Curve],
        options: &TrochoidalOptions,
        sampling: f64,
        ctx: &PlanContext,
    ) -> ToolpathResult<Self> {
        let (spans, mut candidates) = sample_boundary(loops, sampling);
        if spans.is_empty() {
            return Err(MedialAxisError::NoBoundarySpans.into());
        }

        let points: Vec<Point> = candidates.iter().map(|c| c.point).collect();
        let tree = KdTree::build(&points);
        let mut diverged = 0usize;
        for (index, candidate) in candidates.iter_mut().enumerate() {
            ctx.check_cancelled()?;
            candidate.circle = shrinking_ball(candidate, index, &tree, options)
                .map(|circle| clamp_to_boundary(circle, &spans));
            if candidate.circle.is_none() {
                diverged += 1;
            }
        }
        if diverged > 0 {
            warn!(
                "shrinking ball diverged for {} of {} candidates",
                diverged,
                candidates.len()
            );
        }
        debug!(
            "medial axis: {} spans, {} candidates",
            spans.len(),
            candidates.len()
        );
        Ok(Self { spans, candidates })
    }

    /// Distance from `p` to the nearest boundary span.
    pub fn clearance(&self, p: Point) -> f64 {
        self.spans
            .iter()
            .map(|s| s.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Candidates with a circle, rotated so the largest circle comes first.
    ///
    /// Ties keep the earliest candidate.
    pub fn ordered(&self) -> Vec<&MedialAxisCandidate> {
        let solved: Vec<&MedialAxisCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.circle.is_some())
            .collect();
        let mut best = 0;
        let mut best_radius = f64::NEG_INFINITY;
        for (i, c) in solved.iter().enumerate() {
            let r = c.circle.map(|c| c.radius).unwrap_or(f64::NEG_INFINITY);
            if r > best_radius {
                best = i;
                best_radius = r;
            }
        }
        let mut ordered = solved;
        let last = ordered.len().saturating_sub(1);
        ordered.rotate_left(best.min(last));
        ordered
    }
}

/// Splits loops into spans no longer than `sampling` and seeds one candidate per span.
fn sample_boundary(loops: &[Curve], sampling: f64) -> (Vec<Span>, Vec<MedialAxisCandidate>) {
    let mut spans = Vec::new();
    let mut candidates = Vec::new();
    for curve in loops {
        let first = spans.len();
        spans.extend(
            curve
                .spans()
                .filter(|s| !s.is_degenerate())
                .flat_map(|s| s.subdivide(sampling)),
        );
        let count = spans.len() - first;
        for k in 0..count {
            let span = first + k;
            let prev_span = first + (k + count - 1) % count;
            let Some(normal) = inward_normal(&spans[prev_span], &spans[span]) else {
                continue;
            };
            candidates.push(MedialAxisCandidate {
                point: spans[span].start,
                normal,
                prev_span,
                span,
                circle: None,
            });
        }
    }
    (spans, candidates)
}

/// Left normal of the averaged tangent at the joint between two spans.
fn inward_normal(prev: &Span, span: &Span) -> Option<Point> {
    let own = span.start_tangent()?;
    let tangent = prev
        .end_tangent()
        .and_then(|t| (t + own).normalized())
        .unwrap_or(own);
    Some(tangent.perp())
}

/// Shrinks a ball tangent at the candidate until it touches a second sample.
fn shrinking_ball(
    candidate: &MedialAxisCandidate,
    own: usize,
    tree: &KdTree,
    options: &TrochoidalOptions,
) -> Option<InscribedCircle> {
    let p = candidate.point;
    let n = candidate.normal;
    let seed = options.seed_radius;
    let tolerance = options.tolerance;

    let mut radius = seed;
    let mut center = p + n * radius;
    let mut touch: Option<Point> = None;
    let mut previous = 0.0;

    for _ in 0..options.max_iterations {
        let q = tree
            .nearest_k(center, 2)
            .into_iter()
            .find(|nb| nb.index != own && !tree.point(nb.index).approx_eq(&p, 1e-12))?;
        let q_point = tree.point(q.index);
        if touch.is_some() && q.distance >= radius - tolerance {
            break;
        }

        let denominator = 2.0 * n.dot(&(q_point - p));
        let next = if denominator > 1e-12 {
            (q_point - p).length_squared() / denominator
        } else {
            seed
        };
        if next > seed {
            return None;
        }
        touch = Some(q_point);
        center = p + n * next;
        if (next - previous).abs() < tolerance {
            radius = next;
            break;
        }
        previous = next;
        radius = next;
    }

    touch.map(|touch| InscribedCircle {
        center,
        radius,
        touch,
    })
}

/// Shrinks the circle to the true distance from its center to the boundary.
fn clamp_to_boundary(circle: InscribedCircle, spans: &[Span]) -> InscribedCircle {
    let nearest = spans
        .iter()
        .map(|s| s.closest_point(circle.center).0)
        .min_by(|a, b| {
            a.distance_to(&circle.center)
                .total_cmp(&b.distance_to(&circle.center))
        });
    match nearest {
        Some(q) if q.distance_to(&circle.center) < circle.radius - 1e-9 => InscribedCircle {
            radius: q.distance_to(&circle.center),
            touch: q,
            ..circle
        },
        _ => circle,
    }
}
