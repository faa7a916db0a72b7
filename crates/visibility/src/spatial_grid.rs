use std::collections::HashMap;

use bevy::prelude::*;

use layout::Building;

use crate::config::CELL_SIZE;

/// Uniform grid bucketing building indices by `(floor(x / cell), floor(z / cell))`.
///
/// The city has no fixed bounds (the spiral grows outward in every direction),
/// so cells live in a hash map instead of a flat array. Rebuilt wholesale
/// whenever the building list changes; `generation` records which layout it
/// was built from.
#[derive(Resource, Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<u32>>,
    generation: u64,
    len: usize,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { CELL_SIZE },
            cells: HashMap::new(),
            generation: 0,
            len: 0,
        }
    }

    pub fn build(buildings: &[Building], cell_size: f32, generation: u64) -> Self {
        let mut index = Self::new(cell_size);
        index.generation = generation;
        for (i, building) in buildings.iter().enumerate() {
            index.insert(i as u32, building.x, building.z);
        }
        index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    #[inline]
    pub fn cell_of(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, building: u32, x: f32, z: f32) {
        let cell = self.cell_of(x, z);
        self.cells.entry(cell).or_default().push(building);
        self.len += 1;
    }

    /// Append every building whose cell intersects the rectangle to `out`.
    pub fn query_rect(&self, min_x: f32, min_z: f32, max_x: f32, max_z: f32, out: &mut Vec<u32>) {
        let (min_cx, min_cz) = self.cell_of(min_x, min_z);
        let (max_cx, max_cz) = self.cell_of(max_x, max_z);
        for cz in min_cz..=max_cz {
            for cx in min_cx..=max_cx {
                if let Some(bucket) = self.cells.get(&(cx, cz)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Clear `out` and fill it with every building in a cell touched by the
    /// circle. This is a superset; callers filter by exact distance.
    pub fn query_radius(&self, center: Vec2, radius: f32, out: &mut Vec<u32>) {
        out.clear();
        if !radius.is_finite() || radius < 0.0 {
            return;
        }
        self.query_rect(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
            out,
        );
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
