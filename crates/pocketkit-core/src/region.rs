//! Region algebra over closed boundary loops.
//!
//! [`RegionAlgebra`] is the seam between the toolpath strategies and the
//! geometry kernel. [`Region`] is the default implementation, backed by
//! `cavalier_contours` polylines (bulge-encoded arcs) and shapes.

use crate::curve::{Curve, Vertex};
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{BoundingBox, Point};
use cavalier_contours::polyline::{
    BooleanOp, BooleanResult, PlineSource, PlineSourceMut, PlineVertex, Polyline,
};
use cavalier_contours::shape_algorithms::{Shape, ShapeOffsetOptions};
use std::f64::consts::PI;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Loops enclosing less area than this are dropped from kernel results.
pub const AREA_TOLERANCE: f64 = 1e-9;

const BULGE_EPSILON: f64 = 1e-12;

/// How a kernel hands back the loops of an offset result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetTopology {
    /// Every loop, hole or not, is independent and can be processed on its own.
    LinkedHoles,
    /// Loops come back outer first, each followed by the holes it contains.
    Nested,
}

/// Boolean, offset and winding operations on 2D regions.
///
/// Regions are plain values: every mutating operation works in place and
/// callers clone explicitly when they need to keep the original.
pub trait RegionAlgebra: Clone + Send + Sync {
    fn from_loops(loops: Vec<Curve>) -> Self;

    fn loops(&self) -> &[Curve];

    fn append(&mut self, curve: Curve);

    /// Grows the region by `distance` (shrinks it when negative).
    fn offset(&mut self, distance: f64) -> GeometryResult<()>;

    /// Removes `other` from this region.
    fn subtract(&mut self, other: &Self) -> GeometryResult<()>;

    /// Keeps only the part of this region that lies inside `other`.
    fn intersect(&mut self, other: &Self) -> GeometryResult<()>;

    /// Normalizes winding (outer loops counter-clockwise, holes clockwise) and
    /// orders each outer loop before the holes it contains.
    fn reorder(&mut self) -> GeometryResult<()>;

    fn offset_topology(&self) -> OffsetTopology;

    fn loop_count(&self) -> usize {
        self.loops().len()
    }

    fn is_empty(&self) -> bool {
        self.loops().is_empty()
    }

    fn is_clockwise(&self, index: usize) -> bool {
        self.loops()
            .get(index)
            .map(|c| c.is_clockwise())
            .unwrap_or(false)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        self.loops()
            .iter()
            .filter_map(|c| c.bounding_box())
            .reduce(|a, b| a.union(&b))
    }

    /// Net enclosed area: outer loops add, holes subtract.
    fn area(&self) -> f64 {
        self.loops().iter().map(|c| c.signed_area()).sum()
    }
}

/// Default region backed by `cavalier_contours`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    loops: Vec<Curve>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Axis-aligned rectangular region.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_loops(vec![Curve::rectangle(min, max)])
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::from_loops(vec![Curve::circle(center, radius)])
    }

    /// Obround swept by a disc of `radius` moving from `p0` to `p1`.
    pub fn stadium(p0: Point, p1: Point, radius: f64) -> Self {
        Self::from_loops(vec![Curve::stadium(p0, p1, radius)])
    }

    fn faces(&self) -> Vec<Face> {
        Face::from_loops(&self.loops)
    }

    fn set_faces(&mut self, faces: Vec<Face>) {
        self.loops = faces.into_iter().flat_map(Face::into_loops).collect();
    }
}

impl RegionAlgebra for Region {
    fn from_loops(loops: Vec<Curve>) -> Self {
        Self { loops }
    }

    fn loops(&self) -> &[Curve] {
        &self.loops
    }

    fn append(&mut self, curve: Curve) {
        self.loops.push(curve);
    }

    fn offset(&mut self, distance: f64) -> GeometryResult<()> {
        if self.loops.is_empty() || distance == 0.0 {
            return Ok(());
        }
        let mut plines = Vec::with_capacity(self.loops.len());
        for face in self.faces() {
            plines.push(curve_to_pline(&face.outer)?);
            for hole in &face.holes {
                plines.push(curve_to_pline(hole)?);
            }
        }
        let shape = Shape::from_plines(plines);
        // Positive kernel offsets move counter-clockwise loops inward.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            shape.parallel_offset(-distance, ShapeOffsetOptions::default())
        }))
        .map_err(|_| GeometryError::Kernel("shape offset panicked".to_string()))?;

        self.loops = result
            .ccw_plines
            .iter()
            .chain(result.cw_plines.iter())
            .map(|indexed| pline_to_curve(&indexed.polyline))
            .filter(is_significant)
            .collect();
        debug!("offset {:.4} produced {} loops", distance, self.loops.len());
        self.reorder()
    }

    fn subtract(&mut self, other: &Self) -> GeometryResult<()> {
        let cutters = other.faces();
        let mut out = Vec::new();
        for face in self.faces() {
            let mut current = vec![face];
            for cutter in &cutters {
                let mut next = Vec::new();
                for f in &current {
                    next.extend(f.subtract_loop(&cutter.outer)?);
                    for hole in &cutter.holes {
                        next.extend(f.intersect_loop(hole)?);
                    }
                }
                current = next;
            }
            out.extend(current);
        }
        self.set_faces(out);
        Ok(())
    }

    fn intersect(&mut self, other: &Self) -> GeometryResult<()> {
        let clips = other.faces();
        let mut out = Vec::new();
        for face in self.faces() {
            for clip in &clips {
                let mut pieces = face.intersect_loop(&clip.outer)?;
                for hole in &clip.holes {
                    let mut next = Vec::new();
                    for piece in &pieces {
                        next.extend(piece.subtract_loop(hole)?);
                    }
                    pieces = next;
                }
                out.extend(pieces);
            }
        }
        self.set_faces(out);
        Ok(())
    }

    fn reorder(&mut self) -> GeometryResult<()> {
        if self.loops.iter().any(|c| c.is_empty()) {
            return Err(GeometryError::EmptyCurve);
        }
        let faces = self.faces();
        self.set_faces(faces);
        Ok(())
    }

    fn offset_topology(&self) -> OffsetTopology {
        OffsetTopology::Nested
    }
}

/// One outer loop with the holes it directly contains.
#[derive(Debug, Clone)]
struct Face {
    outer: Curve,
    holes: Vec<Curve>,
}

impl Face {
    fn new(outer: Curve) -> Self {
        Self {
            outer: oriented(outer, false),
            holes: Vec::new(),
        }
    }

    /// Groups loops by containment depth: even depths are outers, odd depths holes.
    fn from_loops(loops: &[Curve]) -> Vec<Face> {
        let areas: Vec<f64> = loops.iter().map(|c| c.signed_area().abs()).collect();
        let samples: Vec<Point> = loops.iter().map(sample_point).collect();

        let parents: Vec<Option<usize>> = (0..loops.len())
            .map(|i| {
                (0..loops.len())
                    .filter(|&j| j != i && areas[j] > areas[i])
                    .filter(|&j| loops[j].contains_point(samples[i]))
                    .min_by(|&a, &b| areas[a].total_cmp(&areas[b]))
            })
            .collect();
        let depth = |mut i: usize| {
            let mut d = 0usize;
            while let Some(p) = parents[i] {
                d += 1;
                i = p;
            }
            d
        };

        let mut faces = Vec::new();
        let mut face_of = vec![None; loops.len()];
        for (i, curve) in loops.iter().enumerate() {
            if depth(i) % 2 == 0 {
                face_of[i] = Some(faces.len());
                faces.push(Face::new(curve.clone()));
            }
        }
        for (i, curve) in loops.iter().enumerate() {
            if let Some(face) = parents[i].and_then(|p| face_of[p]).filter(|_| face_of[i].is_none()) {
                faces[face].holes.push(oriented(curve.clone(), true));
            }
        }
        faces
    }

    fn into_loops(self) -> impl Iterator<Item = Curve> {
        std::iter::once(self.outer).chain(self.holes)
    }

    /// This face minus the area inside `cutter`.
    fn subtract_loop(&self, cutter: &Curve) -> GeometryResult<Vec<Face>> {
        let mut cutter = cutter.clone();
        let mut kept = self.holes.clone();
        // Merge every hole the cutter touches into the cutter first.
        loop {
            let mut merged = false;
            let mut remaining = Vec::with_capacity(kept.len());
            for hole in kept {
                let (pos, _) = boolean(&cutter, &hole, BooleanOp::Or)?;
                if pos.len() == 1 {
                    cutter = pos.into_iter().next().unwrap_or(cutter);
                    merged = true;
                } else {
                    remaining.push(hole);
                }
            }
            kept = remaining;
            if !merged {
                break;
            }
        }

        let (pos, neg) = boolean(&self.outer, &cutter, BooleanOp::Not)?;
        if !neg.is_empty() {
            let mut face = self.clone();
            face.holes = kept;
            face.holes.extend(neg.into_iter().map(|c| oriented(c, true)));
            return Ok(vec![face]);
        }
        Ok(pos
            .into_iter()
            .map(|piece| {
                let mut face = Face::new(piece);
                face.holes = kept
                    .iter()
                    .filter(|h| face.outer.contains_point(sample_point(h)))
                    .cloned()
                    .collect();
                face
            })
            .collect())
    }

    /// This face restricted to the inside of `clip`.
    fn intersect_loop(&self, clip: &Curve) -> GeometryResult<Vec<Face>> {
        let (pos, _) = boolean(&self.outer, clip, BooleanOp::And)?;
        let mut faces: Vec<Face> = pos.into_iter().map(Face::new).collect();
        for hole in &self.holes {
            let mut next = Vec::new();
            for face in &faces {
                next.extend(face.subtract_loop(hole)?);
            }
            faces = next;
        }
        Ok(faces)
    }
}

fn sample_point(curve: &Curve) -> Point {
    curve
        .spans()
        .find(|s| !s.is_degenerate())
        .map(|s| s.point_at(0.5))
        .or_else(|| curve.first_point())
        .unwrap_or_default()
}

fn is_significant(curve: &Curve) -> bool {
    curve.len() > 1 && curve.signed_area().abs() > AREA_TOLERANCE
}

fn oriented(curve: Curve, clockwise: bool) -> Curve {
    if curve.is_clockwise() == clockwise {
        curve
    } else {
        curve.reversed()
    }
}

/// Runs a polyline boolean on counter-clockwise copies of both loops.
///
/// Returns the positive (material) and negative (enclosed hole) result loops.
fn boolean(a: &Curve, b: &Curve, op: BooleanOp) -> GeometryResult<(Vec<Curve>, Vec<Curve>)> {
    let pa = curve_to_pline(&oriented(a.clone(), false))?;
    let pb = curve_to_pline(&oriented(b.clone(), false))?;
    let result: BooleanResult<Polyline<f64>> =
        panic::catch_unwind(AssertUnwindSafe(|| pa.boolean(&pb, op)))
            .map_err(|_| GeometryError::Kernel("polyline boolean panicked".to_string()))?;

    let pos = result
        .pos_plines
        .iter()
        .map(|r| pline_to_curve(&r.pline))
        .filter(is_significant)
        .collect();
    let neg = result
        .neg_plines
        .iter()
        .map(|r| pline_to_curve(&r.pline))
        .filter(is_significant)
        .collect();
    Ok((pos, neg))
}

/// Converts a closed curve into a closed bulge polyline.
///
/// Arcs sweeping more than half a turn are split so every bulge stays within `[-1, 1]`.
pub fn curve_to_pline(curve: &Curve) -> GeometryResult<Polyline<f64>> {
    if curve.is_empty() {
        return Err(GeometryError::EmptyCurve);
    }
    if !curve.is_closed() {
        return Err(GeometryError::Degenerate(
            "boundary loop is not closed".to_string(),
        ));
    }
    let mut pline = Polyline::new();
    for span in curve.spans().filter(|s| !s.is_degenerate()) {
        let sweep = span.sweep();
        if span.kind.is_arc() && sweep.abs() > PI + 1e-9 {
            let (head, tail) = span.split(0.5);
            let bulge = (sweep / 8.0).tan();
            pline.add_vertex(PlineVertex::new(head.start.x, head.start.y, bulge));
            pline.add_vertex(PlineVertex::new(tail.start.x, tail.start.y, bulge));
        } else {
            pline.add_vertex(PlineVertex::new(span.start.x, span.start.y, (sweep / 4.0).tan()));
        }
    }
    if pline.vertex_count() < 2 {
        warn!("dropping boundary loop with {} usable spans", pline.vertex_count());
        return Err(GeometryError::Degenerate(
            "boundary loop has fewer than two spans".to_string(),
        ));
    }
    pline.set_is_closed(true);
    Ok(pline)
}

/// Converts a bulge polyline back into a curve, repeating the start point when closed.
pub fn pline_to_curve(pline: &Polyline<f64>) -> Curve {
    let count = pline.vertex_count();
    let mut curve = Curve::new();
    if count == 0 {
        return curve;
    }
    let first = pline.at(0);
    curve.push(Vertex::line(Point::new(first.x, first.y)));
    let segments = if pline.is_closed() { count } else { count - 1 };
    for i in 0..segments {
        let v0 = pline.at(i);
        let v1 = pline.at((i + 1) % count);
        let p0 = Point::new(v0.x, v0.y);
        let p1 = Point::new(v1.x, v1.y);
        if v0.bulge.abs() < BULGE_EPSILON {
            curve.push(Vertex::line(p1));
        } else {
            let center = bulge_center(p0, p1, v0.bulge);
            if v0.bulge > 0.0 {
                curve.push(Vertex::arc_ccw(p1, center));
            } else {
                curve.push(Vertex::arc_cw(p1, center));
            }
        }
    }
    curve
}

fn bulge_center(p0: Point, p1: Point, bulge: f64) -> Point {
    let chord = p1 - p0;
    let mid = (p0 + p1) * 0.5;
    mid + chord.perp() * ((1.0 - bulge * bulge) / (4.0 * bulge))
}
