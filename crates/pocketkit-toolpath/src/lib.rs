//! # pocketkit toolpath
//!
//! Pocket (area clearing) planning on top of `pocketkit-core` regions.
//!
//! ## Strategies
//!
//! - **Offsets**: concentric inward offsets, split wherever the region falls apart
//! - **Zigzag**: rotated raster rows, bidirectional or unidirectional
//! - **Trochoidal**: spiral entry and looping moves along the medial axis
//!
//! ## Traversal
//!
//! - **Pocket engine**: depth stepping, stay-down versus retract decisions and
//!   the swept feed-safety test
//! - **Motion sinks**: [`MoveRecorder`] for inspection, [`GcodeWriter`] for
//!   program text
//! - **Batch planning**: independent pockets planned in parallel

pub mod context;
pub mod depth;
pub mod error;
pub mod gcode_gen;
pub mod motion;
pub mod offsets;
pub mod pocket;
pub mod profile;
pub mod trochoidal;
pub mod zigzag;

pub use context::PlanContext;
pub use depth::DepthParams;
pub use error::{
    MedialAxisError, ParameterError, ParameterResult, ToolpathError, ToolpathResult,
};
pub use gcode_gen::{GcodeOptions, GcodeWriter};
pub use motion::{MotionSink, Move, MoveRecorder};
pub use offsets::{curve_list, decompose, offsets};
pub use pocket::{
    feed_possible, plan_batch, plan_loops, pocket, pocket_with_anchor, prepare_regions, CutMode,
    PlannedPocket, PocketJob, PocketParams, PocketStrategy, PocketSummary, FEED_SAFETY_MARGIN,
};
pub use profile::{NearestPointAnchor, StartAnchor};
pub use trochoidal::medial_axis::{InscribedCircle, MedialAxis, MedialAxisCandidate};
pub use trochoidal::{trochoidal, KdTree, Neighbour, TrochoidalOptions};
pub use zigzag::{strip_rows, zigzag, MAX_STRIPS};
