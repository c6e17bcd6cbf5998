//! # PocketKit
//!
//! Pocket (area clearing) toolpath planning for 2.5D milling:
//! - Concentric offset, zigzag and trochoidal clearing strategies
//! - Retract-minimizing traversal with a swept feed-safety test
//! - Depth stepping with finishing and break-through layers
//! - G-code output for arc-capable controllers
//!
//! ## Architecture
//!
//! PocketKit is organized as a workspace with multiple crates:
//!
//! 1. **pocketkit-core** - Points, curves, regions and the region algebra kernel
//! 2. **pocketkit-toolpath** - Strategies, pocket engine, motion sinks
//! 3. **pocketkit** - Job files and the command line front end

pub mod job;

pub use job::{Job, JobError, JobResult, ShapeSpec};
pub use pocketkit_core::{
    BoundingBox, CancellationToken, Curve, GeometryError, Point, Region, RegionAlgebra, Vertex,
    VertexKind,
};
pub use pocketkit_toolpath::{
    plan_batch, plan_loops, pocket, prepare_regions, CutMode, DepthParams, GcodeOptions,
    GcodeWriter, MotionSink, Move, MoveRecorder, PlanContext, PocketJob, PocketParams,
    PocketStrategy, PocketSummary, ToolpathError, TrochoidalOptions,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support
/// - Pretty console output, or one JSON object per event when `json` is set
/// - Output on stderr so G-code on stdout stays clean
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
