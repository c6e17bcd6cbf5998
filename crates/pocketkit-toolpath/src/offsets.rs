//! Concentric offset decomposition.
//!
//! A cut region is shrunk by the stepover until nothing remains. Every
//! intermediate region becomes one level of the clearing pattern; when a
//! shrink splits the region apart, each piece is followed on its own.

use crate::context::PlanContext;
use crate::error::ToolpathResult;
use crate::pocket::CutMode;
use pocketkit_core::{Curve, OffsetTopology, RegionAlgebra};
use tracing::debug;

/// Loops for clearing `cut_region` by repeated inward offsets of `stepover`.
///
/// With `from_center` the innermost levels come first, otherwise the
/// outermost. Climb milling reverses every loop.
pub fn offsets<R: RegionAlgebra>(
    cut_region: &R,
    stepover: f64,
    from_center: bool,
    cut_mode: CutMode,
    ctx: &PlanContext,
) -> ToolpathResult<Vec<Curve>> {
    let areas = decompose(cut_region, stepover, from_center, ctx)?;
    Ok(curve_list(&areas, cut_mode == CutMode::Climb))
}

/// Nested regions in traversal order.
///
/// A pending stack replaces recursion; children are pushed in reverse so they
/// pop in kernel order, which yields the same pre-order as a recursive walk.
pub fn decompose<R: RegionAlgebra>(
    cut_region: &R,
    stepover: f64,
    from_center: bool,
    ctx: &PlanContext,
) -> ToolpathResult<Vec<R>> {
    let mut areas = Vec::new();
    let mut pending = vec![cut_region.clone()];

    while let Some(area) = pending.pop() {
        if area.is_empty() {
            continue;
        }
        ctx.check_cancelled()?;

        let mut inner = area.clone();
        inner.offset(-stepover)?;
        areas.push(area);

        let children = split_regions(inner);
        debug!(
            "offset level {} split into {} sub-regions",
            areas.len(),
            children.len()
        );
        pending.extend(children.into_iter().rev());
    }

    if from_center {
        areas.reverse();
    }
    Ok(areas)
}

/// Splits an offset result into the sub-regions to shrink independently.
fn split_regions<R: RegionAlgebra>(inner: R) -> Vec<R> {
    match inner.offset_topology() {
        OffsetTopology::LinkedHoles => inner
            .loops()
            .iter()
            .map(|c| R::from_loops(vec![c.clone()]))
            .collect(),
        OffsetTopology::Nested => {
            let mut regions = Vec::new();
            let mut current: Option<R> = None;
            for (index, curve) in inner.loops().iter().enumerate() {
                if inner.is_clockwise(index) {
                    if let Some(region) = current.as_mut() {
                        region.append(curve.clone());
                    }
                } else {
                    regions.extend(current.take());
                    current = Some(R::from_loops(vec![curve.clone()]));
                }
            }
            regions.extend(current);
            regions
        }
    }
}

/// Flattens the loops of all regions in list order, reversing each for climb milling.
pub fn curve_list<R: RegionAlgebra>(areas: &[R], reverse_loops: bool) -> Vec<Curve> {
    areas
        .iter()
        .flat_map(|area| area.loops().iter())
        .map(|curve| {
            if reverse_loops {
                curve.reversed()
            } else {
                curve.clone()
            }
        })
        .collect()
}
