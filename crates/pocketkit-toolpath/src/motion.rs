//! Machine motion emission.
//!
//! The engine describes tool motion as an ordered stream of calls on a
//! [`MotionSink`]. Order is part of the contract: sinks must apply calls
//! exactly as received.

use serde::{Deserialize, Serialize};

/// Receiver of rapid, feed and arc moves.
///
/// `feed_scale` is the slot ratio of a cutting move: `1.0` marks a full-width
/// slotting entry, `0.0` a normal cut. Arc centers are given relative to the
/// arc's start point (`i`, `j`).
pub trait MotionSink {
    fn rapid(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>);

    fn feed(&mut self, feed_scale: f64, x: Option<f64>, y: Option<f64>, z: Option<f64>);

    fn arc_cw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64);

    fn arc_ccw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64);
}

/// One recorded motion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    Rapid {
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    Feed {
        feed_scale: f64,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
    },
    ArcCw {
        feed_scale: f64,
        x: f64,
        y: f64,
        i: f64,
        j: f64,
    },
    ArcCcw {
        feed_scale: f64,
        x: f64,
        y: f64,
        i: f64,
        j: f64,
    },
}

impl Move {
    pub fn is_rapid(&self) -> bool {
        matches!(self, Move::Rapid { .. })
    }

    pub fn feed_scale(&self) -> Option<f64> {
        match self {
            Move::Rapid { .. } => None,
            Move::Feed { feed_scale, .. }
            | Move::ArcCw { feed_scale, .. }
            | Move::ArcCcw { feed_scale, .. } => Some(*feed_scale),
        }
    }

    /// Target Z if the move sets one.
    pub fn z(&self) -> Option<f64> {
        match self {
            Move::Rapid { z, .. } | Move::Feed { z, .. } => *z,
            _ => None,
        }
    }

    /// In-plane target if the move has one.
    pub fn xy(&self) -> Option<(f64, f64)> {
        match self {
            Move::Rapid {
                x: Some(x),
                y: Some(y),
                ..
            }
            | Move::Feed {
                x: Some(x),
                y: Some(y),
                ..
            } => Some((*x, *y)),
            Move::ArcCw { x, y, .. } | Move::ArcCcw { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }
}

/// Sink that keeps every call, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveRecorder {
    pub moves: Vec<Move>,
}

impl MoveRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rapids up to `height`.
    pub fn count_rapids_to(&self, height: f64) -> usize {
        self.moves
            .iter()
            .filter(|m| {
                matches!(m, Move::Rapid { x: None, y: None, z: Some(z) } if (z - height).abs() < 1e-9)
            })
            .count()
    }
}

impl MotionSink for MoveRecorder {
    fn rapid(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.moves.push(Move::Rapid { x, y, z });
    }

    fn feed(&mut self, feed_scale: f64, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.moves.push(Move::Feed {
            feed_scale,
            x,
            y,
            z,
        });
    }

    fn arc_cw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        self.moves.push(Move::ArcCw {
            feed_scale,
            x,
            y,
            i,
            j,
        });
    }

    fn arc_ccw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        self.moves.push(Move::ArcCcw {
            feed_scale,
            x,
            y,
            i,
            j,
        });
    }
}

impl<S: MotionSink + ?Sized> MotionSink for &mut S {
    fn rapid(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        (**self).rapid(x, y, z)
    }

    fn feed(&mut self, feed_scale: f64, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        (**self).feed(feed_scale, x, y, z)
    }

    fn arc_cw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        (**self).arc_cw(feed_scale, x, y, i, j)
    }

    fn arc_ccw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        (**self).arc_ccw(feed_scale, x, y, i, j)
    }
}
