//! Start-point anchoring for the first loop of a pocket.

use pocketkit_core::{Curve, Point};

/// Re-anchors a loop so machining begins near a requested point.
pub trait StartAnchor: Send + Sync {
    /// Returns `curve` rearranged to start as close to `point` as possible.
    fn trim_to_start(&self, curve: &Curve, point: Point) -> Curve;
}

/// Starts closed loops at their boundary point nearest the request.
///
/// Open loops are kept as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestPointAnchor;

impl StartAnchor for NearestPointAnchor {
    fn trim_to_start(&self, curve: &Curve, point: Point) -> Curve {
        curve.starting_near(point)
    }
}
