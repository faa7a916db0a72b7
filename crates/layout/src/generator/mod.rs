//! City layout generation.
//!
//! Turns a district-ordered roster into a fully specified city: buildings
//! packed into blocks along a centre-outward spiral, plazas in reserved
//! spiral slots, a river carved between two block columns, bridges across it
//! and decorative props everywhere else.
//!
//! ## Pipeline
//!
//! 1. [`crate::sanitize_entities`] normalizes the raw roster.
//! 2. [`crate::group_by_district`] orders it heaviest category first.
//! 3. [`generate`] walks [`SpiralIter`]. Plaza slots emit a plaza and consume
//!    nothing; every other slot becomes a block holding up to N x N
//!    buildings, filled row-major. A block never mixes two districts.
//! 4. The river band and bridges are derived from the placed buildings.
//! 5. Props are emitted per block and per plaza.
//!
//! Generation is a pure function of the ordered roster and the
//! [`LayoutConfig`]. The output is immutable and replaced wholesale whenever
//! the roster changes.

pub mod decorations;
pub mod river;
pub mod types;

use std::collections::HashMap;

use crate::config::{LayoutConfig, PALETTE_COUNT};
use crate::districts::{by_primary_desc, group_by_district, DistrictOrder};
use crate::entity::{sanitize_entities, CityEntity};
use crate::formulas::{building_dims, MetricMaxima};
use crate::hash;
use crate::spiral::SpiralIter;

pub use types::{
    Block, Bridge, Building, Decoration, DecorationKind, GeneratedCity, Plaza, River,
};

/// World-space centre of block `(bx, by)`, river shift included.
pub fn block_center(config: &LayoutConfig, bx: i32, by: i32) -> (f32, f32) {
    let mut x = config.axis_center(bx, true);
    if bx <= config.river_cut_column {
        x -= config.shift_for_river();
    }
    (x, config.axis_center(by, false))
}

/// Offset of lot `lot` (row-major) from its block centre.
pub fn lot_offset(config: &LayoutConfig, lot: usize) -> (f32, f32) {
    let n = config.block_lots.max(1);
    let row = (lot / n) as f32;
    let col = (lot % n) as f32;
    let mid = (n as f32 - 1.0) * 0.5;
    let pitch = config.lot_pitch();
    ((col - mid) * pitch, (row - mid) * pitch)
}

/// Sanitize, group and generate in one call.
pub fn generate_city(raw: &[CityEntity], config: &LayoutConfig) -> GeneratedCity {
    let clean = sanitize_entities(raw);
    generate(&group_by_district(&clean), config)
}

/// Lay out an already district-ordered roster.
pub fn generate(order: &DistrictOrder, config: &LayoutConfig) -> GeneratedCity {
    let entities = &order.entities;
    if entities.is_empty() {
        return GeneratedCity::default();
    }

    let maxima = MetricMaxima::observe(entities);
    let ranks = fallback_ranks(entities);
    let per_block = config.lots_per_block().max(1);

    let mut city = GeneratedCity {
        buildings: Vec::with_capacity(entities.len()),
        districts: order.districts.clone(),
        ..Default::default()
    };

    let mut next = 0;
    for (spiral_index, (bx, by)) in SpiralIter::new().enumerate() {
        if next >= entities.len() {
            break;
        }
        let (cx, cz) = block_center(config, bx, by);

        if config.is_plaza_slot(spiral_index) {
            city.plazas.push(Plaza {
                spiral_index,
                bx,
                by,
                x: cx,
                z: cz,
                size: config.block_span(),
                variance_seed: hash::index_seed(spiral_index as u32),
            });
            continue;
        }

        // Stop the block at the end of the current district.
        let district = order.district_of(next).unwrap_or(0);
        let district_end = order
            .districts
            .get(district)
            .map_or(entities.len(), |d| d.start + d.len);
        let take = per_block.min(district_end - next);

        let block_index = city.blocks.len();
        let first_building = city.buildings.len();
        for lot in 0..take {
            let position = next + lot;
            let entity = &entities[position];
            let dims = building_dims(entity, &maxima);
            let (ox, oz) = lot_offset(config, lot);
            city.buildings.push(Building {
                identity: entity.identity.clone(),
                x: cx + ox,
                z: cz + oz,
                width: dims.width,
                depth: dims.depth,
                height: dims.height,
                floors: dims.floors,
                windows_front: dims.windows_front,
                windows_side: dims.windows_side,
                lit_fraction: dims.lit_fraction,
                district,
                rank: entity.rank.unwrap_or(ranks[position]),
                palette: (district % PALETTE_COUNT as usize) as u8,
                facade_variant: dims.facade_variant,
                block: block_index,
            });
        }
        city.blocks.push(Block {
            bx,
            by,
            spiral_index,
            center_x: cx,
            center_z: cz,
            first_building,
            building_count: take,
        });
        if let Some(run) = city.districts.get_mut(district) {
            run.blocks += 1;
        }
        next += take;
    }

    city.river = river::carve(config, &city.buildings);
    if let Some(river) = city.river.as_ref() {
        city.bridges = river::place_bridges(config, river, &city.blocks, &city.plazas);
    }

    let river = city.river.as_ref();
    let mut props = Vec::new();
    for block in &city.blocks {
        decorations::block_props(config, block, &city.buildings, river, &mut props);
    }
    decorations::road_markings(config, &city.blocks, river, &mut props);
    for (i, plaza) in city.plazas.iter().enumerate() {
        decorations::plaza_props(plaza, i == 0, &mut props);
    }
    city.decorations = props;

    city.lookup = city
        .buildings
        .iter()
        .enumerate()
        .map(|(i, b)| (b.identity.clone(), i))
        .collect::<HashMap<_, _>>();

    city
}

/// 1-based rank by primary metric, used when the roster carries no rank.
fn fallback_ranks(entities: &[CityEntity]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..entities.len()).collect();
    order.sort_by(|&a, &b| by_primary_desc(&entities[a], &entities[b]));
    let mut ranks = vec![0u32; entities.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank as u32 + 1;
    }
    ranks
}
