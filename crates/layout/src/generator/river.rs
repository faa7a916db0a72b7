//! River carve-out and bridge placement.
//!
//! The river runs along z between column `river_cut_column` and the column
//! east of it. Blocks at or west of the cut are already shifted by
//! `river_width - street_width` when they are placed (see
//! [`super::block_center`]), so the band computed here fits exactly.

use std::collections::BTreeSet;

use crate::config::{LayoutConfig, BRIDGE_LANDING, BRIDGE_WIDTH, RIVER_PADDING};

use super::types::{Block, Bridge, Building, Plaza, River};

/// Build the river descriptor from the placed buildings' z-extent.
///
/// Returns `None` for an empty city.
pub fn carve(config: &LayoutConfig, buildings: &[Building]) -> Option<River> {
    if buildings.is_empty() {
        return None;
    }

    let span = config.block_span();
    let x_min = config.axis_center(config.river_cut_column, true) - config.shift_for_river()
        + span * 0.5;

    let (z_min, z_max) = buildings.iter().fold((f32::MAX, f32::MIN), |(lo, hi), b| {
        (lo.min(b.min_z()), hi.max(b.max_z()))
    });

    Some(River {
        x_min,
        width: config.river_width,
        center_z: (z_min + z_max) * 0.5,
        length: (z_max - z_min) + RIVER_PADDING * 2.0,
    })
}

/// One bridge per street row that reaches the river from either bank.
pub fn place_bridges(
    config: &LayoutConfig,
    river: &River,
    blocks: &[Block],
    plazas: &[Plaza],
) -> Vec<Bridge> {
    let cut = config.river_cut_column;
    let rows: BTreeSet<i32> = blocks
        .iter()
        .map(|b| (b.bx, b.by))
        .chain(plazas.iter().map(|p| (p.bx, p.by)))
        .filter(|&(bx, _)| bx == cut || bx == cut + 1)
        .map(|(_, by)| by)
        .collect();

    let span = config.block_span();
    let z_min = river.center_z - river.length * 0.5;
    let z_max = river.center_z + river.length * 0.5;

    rows.into_iter()
        .map(|by| {
            config.axis_center(by, false) + span * 0.5 + config.gap_width(by, false) * 0.5
        })
        .filter(|&z| z >= z_min && z <= z_max)
        .map(|z| Bridge {
            x: river.center_x(),
            z,
            length: river.width + BRIDGE_LANDING * 2.0,
            width: BRIDGE_WIDTH,
        })
        .collect()
}
