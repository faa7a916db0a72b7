//! Cosmetic props for blocks and plazas.
//!
//! Every prop position comes from a [`DetRng`] seeded by the block coordinate,
//! the plaza seed or the building identity, never from shared RNG state.
//! Anything that would land inside the river band is dropped.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::config::{LayoutConfig, DASH_LENGTH};
use crate::hash::{self, DetRng};

use super::types::{Block, Building, Decoration, DecorationKind, Plaza, River};

const LAMP_SETBACK: f32 = 2.5;
const LAMP_HALF: f32 = 0.5;
const TREE_SETBACK: f32 = 7.0;
const TREE_HALF: f32 = 2.0;
const TREE_VARIANTS: u32 = 4;

const CAR_CHANCE: f32 = 0.4;
const CAR_SALT: u32 = 20;
const CAR_OFFSET_SALT: u32 = 21;
const CAR_HEADING_SALT: u32 = 22;
const CAR_VARIANT_SALT: u32 = 23;
const CAR_VARIANTS: u32 = 5;
const CAR_SETBACK: f32 = 2.0;
const CAR_HALF_LEN: f32 = 2.25;
const CAR_HALF_WIDTH: f32 = 1.0;

const MARKING_HALF_WIDTH: f32 = 0.25;

const BENCH_HALF_LEN: f32 = 1.0;
const BENCH_HALF_WIDTH: f32 = 0.4;
const FOUNTAIN_RADIUS_FRACTION: f32 = 0.12;

/// Block edges, clockwise from north (-z).
#[derive(Debug, Clone, Copy)]
enum Edge {
    North,
    East,
    South,
    West,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::North, Edge::East, Edge::South, Edge::West];

    fn from_index(i: u32) -> Self {
        Self::ALL[(i % 4) as usize]
    }

    /// Point `along` units from the edge midpoint, pushed `setback` units
    /// outward from the block.
    fn point(self, cx: f32, cz: f32, half_span: f32, along: f32, setback: f32) -> (f32, f32) {
        match self {
            Edge::North => (cx + along, cz - half_span - setback),
            Edge::South => (cx + along, cz + half_span + setback),
            Edge::West => (cx - half_span - setback, cz + along),
            Edge::East => (cx + half_span + setback, cz + along),
        }
    }
}

fn clear_of_river(river: Option<&River>, min_x: f32, max_x: f32) -> bool {
    !matches!(river, Some(r) if r.overlaps_x(min_x, max_x))
}

fn prop(
    kind: DecorationKind,
    x: f32,
    z: f32,
    rotation: f32,
    variant: u32,
    half: (f32, f32),
) -> Decoration {
    Decoration {
        kind,
        x,
        z,
        rotation,
        variant: variant.min(u8::MAX as u32) as u8,
        half_x: half.0,
        half_z: half.1,
    }
}

/// Sidewalk, lamps, trees and parked cars for one block.
pub fn block_props(
    config: &LayoutConfig,
    block: &Block,
    buildings: &[Building],
    river: Option<&River>,
    out: &mut Vec<Decoration>,
) {
    let half_span = config.block_span() * 0.5;
    let (cx, cz) = (block.center_x, block.center_z);
    let mut rng = DetRng::new(hash::grid_seed(block.bx, block.by));

    out.push(prop(
        DecorationKind::Sidewalk,
        cx,
        cz,
        0.0,
        0,
        (half_span, half_span),
    ));

    // 2-4 street lamps scattered over the block edges.
    let lamps = rng.range_inclusive(2, 4);
    for _ in 0..lamps {
        let edge = Edge::from_index(rng.next_u32());
        let along = rng.range_f32(-0.45, 0.45) * half_span * 2.0;
        let (x, z) = edge.point(cx, cz, half_span, along, LAMP_SETBACK);
        if clear_of_river(river, x - LAMP_HALF, x + LAMP_HALF) {
            out.push(prop(
                DecorationKind::StreetLamp,
                x,
                z,
                0.0,
                0,
                (LAMP_HALF, LAMP_HALF),
            ));
        }
    }

    // 1-2 trees per edge.
    for edge in Edge::ALL {
        let count = if rng.next_f32() < 0.5 { 1 } else { 2 };
        for _ in 0..count {
            let along = rng.range_f32(-0.4, 0.4) * half_span * 2.0;
            let (x, z) = edge.point(cx, cz, half_span, along, TREE_SETBACK);
            let variant = rng.next_u32() % TREE_VARIANTS;
            let yaw = rng.next_f32() * TAU;
            if clear_of_river(river, x - TREE_HALF, x + TREE_HALF) {
                out.push(prop(
                    DecorationKind::Tree,
                    x,
                    z,
                    yaw,
                    variant,
                    (TREE_HALF, TREE_HALF),
                ));
            }
        }
    }

    for building in &buildings[block.buildings()] {
        if let Some(car) = parked_car(building) {
            out.push(car);
        }
    }
}

/// About 40% of buildings get a car parked in front, chosen by identity hash.
pub fn parked_car(building: &Building) -> Option<Decoration> {
    let seed = hash::identity_seed(&building.identity);
    if hash::unit(seed, CAR_SALT) >= CAR_CHANCE {
        return None;
    }
    let offset = (hash::unit(seed, CAR_OFFSET_SALT) - 0.5) * building.width * 0.5;
    let heading = if hash::unit(seed, CAR_HEADING_SALT) < 0.5 { 0.0 } else { PI };
    let variant = (hash::unit(seed, CAR_VARIANT_SALT) * CAR_VARIANTS as f32) as u32;
    Some(prop(
        DecorationKind::ParkedCar,
        building.x + offset,
        building.max_z() + CAR_SETBACK,
        heading,
        variant.min(CAR_VARIANTS - 1),
        (CAR_HALF_LEN, CAR_HALF_WIDTH),
    ))
}

/// Dashed centre lines along the streets between neighbouring blocks.
///
/// A block with an east neighbour gets a run along x on its south street; a
/// block with a south neighbour gets a run along z on its east street.
pub fn road_markings(
    config: &LayoutConfig,
    blocks: &[Block],
    river: Option<&River>,
    out: &mut Vec<Decoration>,
) {
    let by_coord: HashMap<(i32, i32), usize> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| ((b.bx, b.by), i))
        .collect();
    let half_span = config.block_span() * 0.5;
    let spacing = config.dash_spacing.max(DASH_LENGTH + 1.0);
    let half_dash = DASH_LENGTH * 0.5;

    for block in blocks {
        if let Some(&east) = by_coord.get(&(block.bx + 1, block.by)) {
            let z = block.center_z + half_span + config.gap_width(block.by, false) * 0.5;
            let end = blocks[east].center_x;
            let mut x = block.center_x + spacing * 0.5;
            while x < end {
                if clear_of_river(river, x - half_dash, x + half_dash) {
                    out.push(prop(
                        DecorationKind::RoadMarking,
                        x,
                        z,
                        0.0,
                        0,
                        (half_dash, MARKING_HALF_WIDTH),
                    ));
                }
                x += spacing;
            }
        }

        if let Some(&south) = by_coord.get(&(block.bx, block.by + 1)) {
            let x = block.center_x + half_span + config.gap_width(block.bx, true) * 0.5;
            if !clear_of_river(river, x - MARKING_HALF_WIDTH, x + MARKING_HALF_WIDTH) {
                continue;
            }
            let end = blocks[south].center_z;
            let mut z = block.center_z + spacing * 0.5;
            while z < end {
                out.push(prop(
                    DecorationKind::RoadMarking,
                    x,
                    z,
                    FRAC_PI_2,
                    0,
                    (MARKING_HALF_WIDTH, half_dash),
                ));
                z += spacing;
            }
        }
    }
}

/// 4-8 trees and 2-3 benches per plaza, plus the city's single fountain in
/// the first plaza.
pub fn plaza_props(plaza: &Plaza, is_first: bool, out: &mut Vec<Decoration>) {
    let mut rng = DetRng::new(plaza.variance_seed);
    let half = plaza.size * 0.5;

    let trees = rng.range_inclusive(4, 8);
    for _ in 0..trees {
        let angle = rng.next_f32() * TAU;
        let radius = rng.range_f32(0.55, 0.85) * half;
        let variant = rng.next_u32() % TREE_VARIANTS;
        out.push(prop(
            DecorationKind::Tree,
            plaza.x + angle.cos() * radius,
            plaza.z + angle.sin() * radius,
            rng.next_f32() * TAU,
            variant,
            (TREE_HALF, TREE_HALF),
        ));
    }

    let benches = rng.range_inclusive(2, 3);
    for i in 0..benches {
        let angle = (i as f32 / benches as f32) * TAU + rng.next_f32() * 0.5;
        let radius = 0.35 * half;
        out.push(prop(
            DecorationKind::Bench,
            plaza.x + angle.cos() * radius,
            plaza.z + angle.sin() * radius,
            // Face the plaza centre.
            angle + PI,
            0,
            (BENCH_HALF_LEN, BENCH_HALF_WIDTH),
        ));
    }

    if is_first {
        let r = plaza.size * FOUNTAIN_RADIUS_FRACTION;
        out.push(prop(DecorationKind::Fountain, plaza.x, plaza.z, 0.0, 0, (r, r)));
    }
}
