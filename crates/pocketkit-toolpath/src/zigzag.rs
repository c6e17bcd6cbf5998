//! Raster clearing.
//!
//! The region is rotated so the raster runs along X, cut into horizontal
//! strips one stepover high, and each clipped strip loop is turned into a
//! zig: a pass along the bottom row of the strip followed by the climb up its
//! side to the next row.

use crate::context::PlanContext;
use crate::error::{ToolpathError, ToolpathResult};
use pocketkit_core::{BoundingBox, Curve, Point, RegionAlgebra, Rotation, Vertex, VertexKind};
use tracing::{debug, warn};

/// Horizontal padding of the strip rectangles beyond the region's bounds.
const STRIP_MARGIN: f64 = 1.0;

/// Offset of the first strip row above the region's lowest point, in mm.
const FIRST_ROW_OFFSET: f64 = 0.1;

/// Row and chain matching tolerance, in mm.
const ZIG_TOLERANCE: f64 = 0.002;

/// Most strips a single raster may be cut into.
pub const MAX_STRIPS: usize = 100_000;

/// Zig loops clearing `cut_region` with rows at `zig_angle_degrees` from the X axis.
///
/// Successive strips alternate direction unless `unidirectional`, in which
/// case every zig keeps only its cut along the bottom row.
pub fn zigzag<R: RegionAlgebra>(
    cut_region: &R,
    stepover: f64,
    unidirectional: bool,
    zig_angle_degrees: f64,
    ctx: &PlanContext,
) -> ToolpathResult<Vec<Curve>> {
    if cut_region.is_empty() {
        return Ok(Vec::new());
    }
    if stepover.is_nan() || stepover <= 0.0 {
        return Err(ToolpathError::InvalidParameters(format!(
            "zigzag stepover must be positive, got {}",
            stepover
        )));
    }

    let rotation = Rotation::from_degrees(-zig_angle_degrees);
    let rotated = R::from_loops(
        cut_region
            .loops()
            .iter()
            .map(|c| c.transformed(|p| rotation.apply(p)))
            .collect(),
    );
    let Some(bounds) = rotated.bounding_box() else {
        return Ok(Vec::new());
    };

    if bounds.height() / stepover >= MAX_STRIPS as f64 {
        return Err(ToolpathError::InvalidParameters(format!(
            "zigzag stepover {} needs more than {} strips over height {:.3}",
            stepover,
            MAX_STRIPS,
            bounds.height()
        )));
    }

    let tolerance = ZIG_TOLERANCE * ctx.one_over_units();
    let x0 = bounds.min_x - STRIP_MARGIN;
    let x1 = bounds.max_x + STRIP_MARGIN;
    let mut rightward = true;
    let mut zigs = Vec::new();

    for (y0, y1) in strip_rows(&bounds, stepover, ctx.one_over_units()) {
        ctx.check_cancelled()?;
        let mut strip = R::from_loops(vec![Curve::rectangle(
            Point::new(x0, y0),
            Point::new(x1, y1),
        )]);
        strip.intersect(&rotated)?;

        for curve in strip.loops() {
            match make_zig(curve, y0, y1, rightward, unidirectional, tolerance) {
                Some(zig) => zigs.push(zig),
                None => debug!("no zig found in strip {:.3}..{:.3}", y0, y1),
            }
        }
        if !unidirectional {
            rightward = !rightward;
        }
    }

    Ok(reorder_zigs(zigs, tolerance)
        .into_iter()
        .map(|zig| zig.transformed(|p| rotation.invert(p)))
        .collect())
}

/// Strip rows `(y0, y1)` covering `bounds`, one stepover apart.
///
/// At most [`MAX_STRIPS`] rows are returned.
pub fn strip_rows(bounds: &BoundingBox, stepover: f64, one_over_units: f64) -> Vec<(f64, f64)> {
    let count = bounds.height() / stepover + 1.0;
    let steps = if count.is_finite() && count > 0.0 {
        (count as usize).min(MAX_STRIPS)
    } else {
        0
    };
    let mut y = bounds.min_y + FIRST_ROW_OFFSET * one_over_units;
    (0..steps)
        .map(|_| {
            let y0 = y;
            y += stepover;
            (y0, y)
        })
        .collect()
}

/// Extracts the zig from one clipped strip loop.
fn make_zig(
    curve: &Curve,
    y0: f64,
    y1: f64,
    rightward: bool,
    unidirectional: bool,
    tolerance: f64,
) -> Option<Curve> {
    let curve = if rightward {
        curve.reversed()
    } else {
        curve.clone()
    };
    let vertices = curve.vertices();
    let on_row = |p: Point, y: f64| (p.y - y).abs() < tolerance;

    // Highest point, ties going to the side the sweep enters from.
    let mut high: Option<Point> = None;
    for v in vertices {
        high = match high {
            None => Some(v.point),
            Some(h) if v.point.y > h.y => Some(v.point),
            Some(h) if (v.point.y - h.y).abs() < tolerance => {
                if (rightward && v.point.x < h.x) || (!rightward && v.point.x > h.x) {
                    Some(v.point)
                } else {
                    Some(h)
                }
            }
            keep => keep,
        };
    }
    let high = high?;

    let mut zig: Vec<Vertex> = Vec::new();
    let mut high_found = false;
    let mut finished = false;
    // The loop may start anywhere, so walk it twice.
    'passes: for _ in 0..2 {
        let mut prev: Option<Point> = None;
        for v in vertices {
            if let Some(p) = prev {
                if !zig.is_empty() {
                    zig.push(*v);
                    let back_at_start = v.point.approx_eq(&zig[0].point, tolerance);
                    if on_row(v.point, y1) || back_at_start {
                        finished = true;
                        break 'passes;
                    }
                } else if high_found {
                    if on_row(v.point, y0) && on_row(p, y0) && v.kind == VertexKind::Line {
                        zig.push(Vertex::line(p));
                        zig.push(*v);
                    }
                } else if v.point == high {
                    high_found = true;
                }
            }
            prev = Some(v.point);
        }
    }

    if zig.is_empty() {
        return None;
    }
    if !finished {
        warn!("zig in strip {:.3}..{:.3} never returned to the upper row", y0, y1);
    }
    if unidirectional {
        // Drop the climb to the next row.
        while zig.len() > 2 && zig.last().is_some_and(|v| !on_row(v.point, y0)) {
            zig.pop();
        }
    }
    Some(Curve::from_vertices(zig))
}

/// Chains zigs whose start meets an existing chain's end; chains keep first-seen order.
fn reorder_zigs(zigs: Vec<Curve>, tolerance: f64) -> Vec<Curve> {
    let mut chains: Vec<Vec<Curve>> = Vec::new();
    for zig in zigs {
        let Some(start) = zig.first_point() else {
            continue;
        };
        let chain = chains.iter_mut().find(|chain| {
            chain
                .last()
                .and_then(|c| c.last_point())
                .is_some_and(|end| {
                    (start.x - end.x).abs() < tolerance && (start.y - end.y).abs() < tolerance
                })
        });
        match chain {
            Some(chain) => chain.push(zig),
            None => chains.push(vec![zig]),
        }
    }
    chains.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_loop(x0: f64, y0: f64, x1: f64, y1: f64) -> Curve {
        Curve::rectangle(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_strip_rows_cover_box() {
        let rows = strip_rows(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), 2.0, 1.0);
        assert_eq!(rows.len(), 6);
        assert!((rows[0].0 - 0.1).abs() < 1e-12);
        assert!((rows[5].1 - 12.1).abs() < 1e-9);
    }

    #[test]
    fn test_strip_rows_are_capped() {
        let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(strip_rows(&bounds, 1e-9, 1.0).len(), MAX_STRIPS);
        assert!(strip_rows(&bounds, 0.0, 1.0).len() <= MAX_STRIPS);
        assert!(strip_rows(&bounds, f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn test_rightward_zig_runs_left_then_climbs() {
        let zig = make_zig(&strip_loop(0.0, 0.1, 10.0, 2.1), 0.1, 2.1, true, false, 0.002).unwrap();
        let pts: Vec<Point> = zig.vertices().iter().map(|v| v.point).collect();
        assert_eq!(
            pts,
            vec![Point::new(10.0, 0.1), Point::new(0.0, 0.1), Point::new(0.0, 2.1)]
        );
    }

    #[test]
    fn test_leftward_zig_runs_right_then_climbs() {
        let zig = make_zig(&strip_loop(0.0, 2.1, 10.0, 4.1), 2.1, 4.1, false, false, 0.002).unwrap();
        let pts: Vec<Point> = zig.vertices().iter().map(|v| v.point).collect();
        assert_eq!(
            pts,
            vec![Point::new(0.0, 2.1), Point::new(10.0, 2.1), Point::new(10.0, 4.1)]
        );
    }

    #[test]
    fn test_unidirectional_zig_ends_on_bottom_row() {
        let zig = make_zig(&strip_loop(0.0, 0.1, 10.0, 2.1), 0.1, 2.1, true, true, 0.002).unwrap();
        assert_eq!(zig.len(), 2);
        assert!((zig.last_point().unwrap().y - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_partial_strip_is_traced_once() {
        // Strip top row lies above the clipped loop.
        let zig = make_zig(&strip_loop(0.0, 8.1, 10.0, 10.0), 8.1, 10.1, true, false, 0.002).unwrap();
        assert!(zig.is_closed());
        assert_eq!(zig.len(), 5);
    }

    #[test]
    fn test_reorder_chains_connected_zigs() {
        let a = Curve::from_vertices(vec![
            Vertex::line(Point::new(0.0, 0.0)),
            Vertex::line(Point::new(1.0, 0.0)),
        ]);
        let b = Curve::from_vertices(vec![
            Vertex::line(Point::new(5.0, 5.0)),
            Vertex::line(Point::new(6.0, 5.0)),
        ]);
        let c = Curve::from_vertices(vec![
            Vertex::line(Point::new(1.0, 0.0)),
            Vertex::line(Point::new(1.0, 1.0)),
        ]);
        let ordered = reorder_zigs(vec![a.clone(), b.clone(), c.clone()], 0.002);
        assert_eq!(ordered, vec![a, c, b]);
    }
}
