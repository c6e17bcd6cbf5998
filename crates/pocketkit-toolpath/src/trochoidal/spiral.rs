//! Entry spiral and tapered approach moves.

use pocketkit_core::{circle_through_points, Curve, Point, Vertex, VertexKind};
use std::f64::consts::TAU;

/// Angular step of the entry spiral.
pub const SPIRAL_STEP: f64 = std::f64::consts::PI / 16.0;

/// Appends an Archimedean spiral from `center` out to radius `r1`.
///
/// The radius grows by `step` per turn and the spiral ends at
/// `center + outdir * r1`. Each angular step becomes one arc through the
/// step's start, middle and end points. The curve must already end at
/// `center`.
pub fn spiral_archimedes(
    curve: &mut Curve,
    center: Point,
    r1: f64,
    outdir: Point,
    dtheta: f64,
    step: f64,
    clockwise: bool,
) {
    if r1 <= 0.0 || step <= 0.0 || dtheta <= 0.0 {
        return;
    }
    let b = step / TAU;
    let theta_max = r1 / step * TAU;
    let out_angle = outdir.angle();
    let point_at = |theta: f64| {
        let remaining = theta_max - theta;
        let angle = if clockwise {
            out_angle + remaining
        } else {
            out_angle - remaining
        };
        center + Point::new(angle.cos(), angle.sin()) * (b * theta)
    };

    let mut previous = center;
    let mut previous_theta = 0.0;
    let mut theta = dtheta;
    while theta <= theta_max + 1e-12 {
        let end = point_at(theta);
        push_arc_through(curve, previous, point_at(theta - dtheta / 2.0), end);
        previous = end;
        previous_theta = theta;
        theta += dtheta;
    }
    if theta_max - previous_theta > 1e-9 {
        let end = point_at(theta_max);
        push_arc_through(
            curve,
            previous,
            point_at((previous_theta + theta_max) / 2.0),
            end,
        );
    }
}

/// Appends the full circle of radius `|outdir|` about `center`, starting and
/// ending at `center + outdir`, as two half arcs.
pub fn close_circle(curve: &mut Curve, center: Point, outdir: Point, clockwise: bool) {
    let kind = if clockwise {
        VertexKind::ArcCw
    } else {
        VertexKind::ArcCcw
    };
    curve.push(Vertex::new(kind, center - outdir, center));
    curve.push(Vertex::new(kind, center + outdir, center));
}

fn push_arc_through(curve: &mut Curve, start: Point, mid: Point, end: Point) {
    match circle_through_points(start, mid, end) {
        Some(c) => {
            let turn = (mid - start).cross(&(end - mid));
            let kind = if turn < 0.0 {
                VertexKind::ArcCw
            } else {
                VertexKind::ArcCcw
            };
            curve.push(Vertex::new(kind, end, c));
        }
        None => curve.push(Vertex::line(end)),
    }
}

/// Appends a tapering approach from `from` to `to`.
///
/// The tool advances `step` at a time and sweeps sideways across the travel
/// direction with semicircular arcs. The half-width at each station is the
/// remaining distance times the tangent of the angle between `boundary_dir`
/// and the travel direction, so it reaches zero at `to`.
///
/// `clearance` gives the free distance around a station. Each half-width
/// stays at least `step + epsilon` below it, which keeps the arcs and the
/// connecting lines inside the free area whenever the straight segment from
/// `from` to `to` is. The curve must already end at `from`.
pub fn taper(
    curve: &mut Curve,
    from: Point,
    to: Point,
    boundary_dir: Point,
    step: f64,
    epsilon: f64,
    clearance: impl Fn(Point) -> f64,
) {
    let length = from.distance_to(&to);
    let Some(u) = (to - from).normalized() else {
        return;
    };
    let v = u.perp();
    let along = boundary_dir.dot(&u).abs();
    let across = boundary_dir.cross(&u).abs();
    let tan_angle = if along > 1e-12 {
        across / along
    } else {
        f64::INFINITY
    };

    let mut travelled = step;
    let mut on_left = false;
    while step > 0.0 && travelled < length - epsilon {
        let station = from + u * travelled;
        let half_width =
            ((length - travelled) * tan_angle).min(clearance(station) - step - epsilon);
        if half_width < epsilon {
            curve.push(Vertex::line(station));
        } else {
            let side = v * half_width;
            let (first, second, kind) = if on_left {
                (station + side, station - side, VertexKind::ArcCw)
            } else {
                (station - side, station + side, VertexKind::ArcCcw)
            };
            curve.push(Vertex::line(first));
            curve.push(Vertex::new(kind, second, station));
            on_left = !on_left;
        }
        travelled += step;
    }
    curve.push(Vertex::line(to));
}
