//! Curves made of line and arc spans.
//!
//! A [`Curve`] is an ordered list of [`Vertex`] values. The first vertex is the
//! start position; every following vertex describes the motion from the
//! previous vertex to its own `point`, either straight or around `center`.
//! Closed boundary loops repeat the start position as their last point.

use crate::geometry::{BoundingBox, Point, POINT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Tolerance used to decide whether a curve returns to its start.
pub const CLOSURE_TOLERANCE: f64 = 1e-6;

/// Motion type of a vertex relative to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    Line,
    ArcCw,
    ArcCcw,
}

impl VertexKind {
    pub fn is_arc(&self) -> bool {
        !matches!(self, VertexKind::Line)
    }

    /// The kind that traces the same geometry in the opposite direction.
    pub fn reversed(&self) -> VertexKind {
        match self {
            VertexKind::Line => VertexKind::Line,
            VertexKind::ArcCw => VertexKind::ArcCcw,
            VertexKind::ArcCcw => VertexKind::ArcCw,
        }
    }
}

/// A curve vertex: target point plus the arc center for arc kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub kind: VertexKind,
    pub point: Point,
    /// Only meaningful when `kind` is an arc.
    #[serde(default)]
    pub center: Point,
}

impl Vertex {
    pub fn line(point: Point) -> Self {
        Self {
            kind: VertexKind::Line,
            point,
            center: Point::zero(),
        }
    }

    pub fn arc_cw(point: Point, center: Point) -> Self {
        Self {
            kind: VertexKind::ArcCw,
            point,
            center,
        }
    }

    pub fn arc_ccw(point: Point, center: Point) -> Self {
        Self {
            kind: VertexKind::ArcCcw,
            point,
            center,
        }
    }

    pub fn new(kind: VertexKind, point: Point, center: Point) -> Self {
        match kind {
            VertexKind::Line => Self::line(point),
            _ => Self {
                kind,
                point,
                center,
            },
        }
    }

    /// Applies `f` to the point and, for arcs, to the center.
    pub fn map(&self, f: impl Fn(Point) -> Point) -> Vertex {
        if self.kind.is_arc() {
            Vertex::new(self.kind, f(self.point), f(self.center))
        } else {
            Vertex::line(f(self.point))
        }
    }
}

/// One piece of a curve between two consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: Point,
    pub end: Point,
    pub kind: VertexKind,
    pub center: Point,
}

impl Span {
    pub fn line(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            kind: VertexKind::Line,
            center: Point::zero(),
        }
    }

    pub fn radius(&self) -> f64 {
        self.start.distance_to(&self.center)
    }

    /// Signed swept angle of an arc span (positive counter-clockwise); zero for lines.
    ///
    /// An arc whose start and end coincide is a full circle.
    pub fn sweep(&self) -> f64 {
        let a0 = (self.start - self.center).angle();
        let a1 = (self.end - self.center).angle();
        match self.kind {
            VertexKind::Line => 0.0,
            VertexKind::ArcCcw => {
                let s = (a1 - a0).rem_euclid(TAU);
                if s <= 1e-12 {
                    TAU
                } else {
                    s
                }
            }
            VertexKind::ArcCw => {
                let s = (a0 - a1).rem_euclid(TAU);
                if s <= 1e-12 {
                    -TAU
                } else {
                    -s
                }
            }
        }
    }

    pub fn length(&self) -> f64 {
        match self.kind {
            VertexKind::Line => self.start.distance_to(&self.end),
            _ => self.radius() * self.sweep().abs(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() <= POINT_TOLERANCE
    }

    /// Point at parameter `t` in `[0, 1]` along the span.
    pub fn point_at(&self, t: f64) -> Point {
        match self.kind {
            VertexKind::Line => self.start.lerp(&self.end, t),
            _ => self.center + (self.start - self.center).rotated(self.sweep() * t),
        }
    }

    /// Unit tangent (direction of travel) at parameter `t`.
    pub fn tangent_at(&self, t: f64) -> Option<Point> {
        match self.kind {
            VertexKind::Line => (self.end - self.start).normalized(),
            VertexKind::ArcCcw => (self.point_at(t) - self.center).perp().normalized(),
            VertexKind::ArcCw => (-(self.point_at(t) - self.center).perp()).normalized(),
        }
    }

    pub fn start_tangent(&self) -> Option<Point> {
        match self.kind {
            VertexKind::Line => self.tangent_at(0.0),
            VertexKind::ArcCcw => (self.start - self.center).perp().normalized(),
            VertexKind::ArcCw => (-(self.start - self.center).perp()).normalized(),
        }
    }

    pub fn end_tangent(&self) -> Option<Point> {
        match self.kind {
            VertexKind::Line => self.tangent_at(1.0),
            VertexKind::ArcCcw => (self.end - self.center).perp().normalized(),
            VertexKind::ArcCw => (-(self.end - self.center).perp()).normalized(),
        }
    }

    /// Closest point on the span to `p` and its parameter.
    pub fn closest_point(&self, p: Point) -> (Point, f64) {
        match self.kind {
            VertexKind::Line => {
                let d = self.end - self.start;
                let len2 = d.length_squared();
                if len2 <= POINT_TOLERANCE * POINT_TOLERANCE {
                    return (self.start, 0.0);
                }
                let t = ((p - self.start).dot(&d) / len2).clamp(0.0, 1.0);
                (self.start.lerp(&self.end, t), t)
            }
            _ => {
                let sweep = self.sweep();
                let a0 = (self.start - self.center).angle();
                let rel = if sweep > 0.0 {
                    ((p - self.center).angle() - a0).rem_euclid(TAU)
                } else {
                    (a0 - (p - self.center).angle()).rem_euclid(TAU)
                };
                if p.distance_to(&self.center) > POINT_TOLERANCE && rel <= sweep.abs() {
                    let t = rel / sweep.abs();
                    (self.point_at(t), t)
                } else if p.distance_to(&self.start) <= p.distance_to(&self.end) {
                    (self.start, 0.0)
                } else {
                    (self.end, 1.0)
                }
            }
        }
    }

    pub fn distance_to(&self, p: Point) -> f64 {
        self.closest_point(p).0.distance_to(&p)
    }

    /// Splits the span at parameter `t`.
    pub fn split(&self, t: f64) -> (Span, Span) {
        let mid = self.point_at(t);
        (
            Span {
                end: mid,
                ..*self
            },
            Span {
                start: mid,
                ..*self
            },
        )
    }

    /// Breaks the span into equal pieces no longer than `max_length`.
    pub fn subdivide(&self, max_length: f64) -> Vec<Span> {
        let len = self.length();
        if max_length <= 0.0 || len <= max_length {
            return vec![*self];
        }
        let pieces = (len / max_length).ceil() as usize;
        (0..pieces)
            .map(|i| {
                let t0 = i as f64 / pieces as f64;
                let t1 = (i + 1) as f64 / pieces as f64;
                Span {
                    start: self.point_at(t0),
                    end: if i + 1 == pieces {
                        self.end
                    } else {
                        self.point_at(t1)
                    },
                    ..*self
                }
            })
            .collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::from_point(self.start);
        bb.include_point(self.end);
        if self.kind.is_arc() {
            let r = self.radius();
            let sweep = self.sweep();
            let a0 = (self.start - self.center).angle();
            for k in 0..4 {
                let axis = k as f64 * FRAC_PI_2;
                let rel = if sweep > 0.0 {
                    (axis - a0).rem_euclid(TAU)
                } else {
                    (a0 - axis).rem_euclid(TAU)
                };
                if rel <= sweep.abs() {
                    bb.include_point(self.center + Point::new(axis.cos(), axis.sin()) * r);
                }
            }
        }
        bb
    }

    /// Signed area contribution of the span to its closed curve (shoelace plus arc segment).
    fn area_contribution(&self) -> f64 {
        let chord = 0.5 * self.start.cross(&self.end);
        if self.kind.is_arc() {
            let r = self.radius();
            let s = self.sweep();
            chord + 0.5 * r * r * (s - s.sin())
        } else {
            chord
        }
    }

    pub fn vertex(&self) -> Vertex {
        Vertex::new(self.kind, self.end, self.center)
    }
}

/// Ordered sequence of vertices. Boundary loops of a region are closed and never
/// self-intersect; toolpath curves produced by the planners may be open.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Curve {
    vertices: Vec<Vertex>,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Closed polygon through `points`; the start point is repeated at the end.
    pub fn polygon(points: &[Point]) -> Self {
        let mut curve = Curve::new();
        for p in points {
            curve.push(Vertex::line(*p));
        }
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if !first.approx_eq(last, CLOSURE_TOLERANCE) {
                curve.push(Vertex::line(*first));
            }
        }
        curve
    }

    /// Counter-clockwise axis-aligned rectangle.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::polygon(&[
            Point::new(min.x, min.y),
            Point::new(max.x, min.y),
            Point::new(max.x, max.y),
            Point::new(min.x, max.y),
        ])
    }

    /// Counter-clockwise circle made of two half arcs.
    pub fn circle(center: Point, radius: f64) -> Self {
        let east = center + Point::new(radius, 0.0);
        let west = center - Point::new(radius, 0.0);
        Self::from_vertices(vec![
            Vertex::line(east),
            Vertex::arc_ccw(west, center),
            Vertex::arc_ccw(east, center),
        ])
    }

    /// Counter-clockwise obround around the segment `p0`..`p1`.
    ///
    /// Coincident end points give a circle.
    pub fn stadium(p0: Point, p1: Point, radius: f64) -> Self {
        let Some(dir) = (p1 - p0).normalized() else {
            return Self::circle(p0, radius);
        };
        let right = Point::new(dir.y, -dir.x) * radius;
        Self::from_vertices(vec![
            Vertex::line(p0 + right),
            Vertex::line(p1 + right),
            Vertex::arc_ccw(p1 - right, p1),
            Vertex::line(p0 - right),
            Vertex::arc_ccw(p0 + right, p0),
        ])
    }

    pub fn push(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn first_point(&self) -> Option<Point> {
        self.vertices.first().map(|v| v.point)
    }

    pub fn last_point(&self) -> Option<Point> {
        self.vertices.last().map(|v| v.point)
    }

    pub fn is_closed(&self) -> bool {
        match (self.first_point(), self.last_point()) {
            (Some(a), Some(b)) => self.vertices.len() > 1 && a.approx_eq(&b, CLOSURE_TOLERANCE),
            _ => false,
        }
    }

    /// Iterates the spans between consecutive vertices.
    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.vertices.windows(2).map(|w| Span {
            start: w[0].point,
            end: w[1].point,
            kind: w[1].kind,
            center: w[1].center,
        })
    }

    pub fn length(&self) -> f64 {
        self.spans().map(|s| s.length()).sum()
    }

    /// Signed enclosed area, positive for counter-clockwise curves.
    pub fn signed_area(&self) -> f64 {
        self.spans().map(|s| s.area_contribution()).sum()
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverses the direction of travel in place, keeping the geometry.
    pub fn reverse(&mut self) {
        let Some(last) = self.vertices.last() else {
            return;
        };
        let mut reversed = Vec::with_capacity(self.vertices.len());
        reversed.push(Vertex::line(last.point));
        for i in (1..self.vertices.len()).rev() {
            let v = &self.vertices[i];
            reversed.push(Vertex::new(
                v.kind.reversed(),
                self.vertices[i - 1].point,
                v.center,
            ));
        }
        self.vertices = reversed;
    }

    pub fn reversed(&self) -> Curve {
        let mut c = self.clone();
        c.reverse();
        c
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.first_point()?;
        Some(
            self.spans()
                .fold(BoundingBox::from_point(first), |bb, s| {
                    bb.union(&s.bounding_box())
                }),
        )
    }

    /// Maps every point and arc center. Only valid for rigid motions.
    pub fn transformed(&self, f: impl Fn(Point) -> Point) -> Curve {
        Curve::from_vertices(self.vertices.iter().map(|v| v.map(&f)).collect())
    }

    /// Approximates the curve by points, arcs chorded within `tolerance`.
    pub fn flatten(&self, tolerance: f64) -> Vec<Point> {
        let mut points: Vec<Point> = self.first_point().into_iter().collect();
        for span in self.spans() {
            if span.kind.is_arc() {
                let r = span.radius();
                let step = if tolerance < r {
                    2.0 * (1.0 - tolerance / r).acos()
                } else {
                    FRAC_PI_2
                };
                let n = ((span.sweep().abs() / step.max(1e-3)).ceil() as usize).clamp(1, 4096);
                for i in 1..=n {
                    points.push(span.point_at(i as f64 / n as f64));
                }
            } else {
                points.push(span.end);
            }
        }
        points
    }

    /// Winding-number containment test on the flattened curve.
    pub fn contains_point(&self, p: Point) -> bool {
        let pts = self.flatten(1e-3);
        let mut winding = 0i32;
        for w in pts.windows(2) {
            let (a, b) = (w[0], w[1]);
            let side = (b - a).cross(&(p - a));
            if a.y <= p.y {
                if b.y > p.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= p.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding != 0
    }

    /// Nearest point on the curve to `p`: span index, point, span parameter.
    pub fn nearest_point(&self, p: Point) -> Option<(usize, Point, f64)> {
        self.spans()
            .enumerate()
            .map(|(i, s)| {
                let (q, t) = s.closest_point(p);
                (i, q, t)
            })
            .min_by(|a, b| a.1.distance_to(&p).total_cmp(&b.1.distance_to(&p)))
    }

    /// Re-anchors a closed curve so it starts (and ends) at the boundary point nearest `p`.
    ///
    /// Open curves are returned unchanged.
    pub fn starting_near(&self, p: Point) -> Curve {
        if !self.is_closed() {
            return self.clone();
        }
        let Some((index, anchor, t)) = self.nearest_point(p) else {
            return self.clone();
        };
        let spans: Vec<Span> = self.spans().collect();
        let (head, tail) = spans[index].split(t);

        let mut out = Curve::new();
        out.push(Vertex::line(anchor));
        let mut emit = |s: Span| {
            if !s.is_degenerate() {
                out.push(s.vertex());
            }
        };
        emit(tail);
        for s in spans.iter().skip(index + 1) {
            emit(*s);
        }
        for s in spans.iter().take(index) {
            emit(*s);
        }
        emit(head);
        out
    }
}
