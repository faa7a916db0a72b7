//! Plain data emitted by the layout generator. No behaviour beyond geometry helpers.

use std::collections::HashMap;

use bevy::math::{Vec2, Vec3};
use serde::Serialize;

use crate::districts::DistrictRun;

// =============================================================================
// Buildings and blocks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Building {
    pub identity: String,
    /// Ground position. Buildings always stand at y = 0.
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub floors: u32,
    pub windows_front: u32,
    pub windows_side: u32,
    pub lit_fraction: f32,
    /// Index into [`GeneratedCity::districts`].
    pub district: usize,
    pub rank: u32,
    pub palette: u8,
    pub facade_variant: u8,
    /// Index into [`GeneratedCity::blocks`].
    pub block: usize,
}

impl Building {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }

    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    pub fn min_x(&self) -> f32 {
        self.x - self.width * 0.5
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width * 0.5
    }

    pub fn min_z(&self) -> f32 {
        self.z - self.depth * 0.5
    }

    pub fn max_z(&self) -> f32 {
        self.z + self.depth * 0.5
    }

    /// Axis-aligned footprint intersection. Touching edges do not count.
    pub fn overlaps(&self, other: &Building) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_z() < other.max_z()
            && other.min_z() < self.max_z()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub bx: i32,
    pub by: i32,
    pub spiral_index: usize,
    pub center_x: f32,
    pub center_z: f32,
    pub first_building: usize,
    pub building_count: usize,
}

impl Block {
    pub fn buildings(&self) -> std::ops::Range<usize> {
        self.first_building..self.first_building + self.building_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plaza {
    pub spiral_index: usize,
    pub bx: i32,
    pub by: i32,
    pub x: f32,
    pub z: f32,
    pub size: f32,
    pub variance_seed: u32,
}

// =============================================================================
// River and bridges
// =============================================================================

/// A single band running along z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct River {
    pub x_min: f32,
    pub width: f32,
    pub center_z: f32,
    pub length: f32,
}

impl River {
    pub fn x_max(&self) -> f32 {
        self.x_min + self.width
    }

    pub fn center_x(&self) -> f32 {
        self.x_min + self.width * 0.5
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x_min && x <= self.x_max()
    }

    /// True if `[min, max]` shares any point with the band.
    pub fn overlaps_x(&self, min: f32, max: f32) -> bool {
        min <= self.x_max() && max >= self.x_min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bridge {
    pub x: f32,
    pub z: f32,
    /// Extent along x (across the river).
    pub length: f32,
    /// Extent along z.
    pub width: f32,
}

// =============================================================================
// Decorations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    Tree,
    StreetLamp,
    ParkedCar,
    Bench,
    Fountain,
    Sidewalk,
    RoadMarking,
}

/// Cosmetic prop. Never consulted by layout or visibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub x: f32,
    pub z: f32,
    /// Yaw in radians.
    pub rotation: f32,
    pub variant: u8,
    /// World-axis half extents of the prop's footprint.
    pub half_x: f32,
    pub half_z: f32,
}

impl Decoration {
    pub fn min_x(&self) -> f32 {
        self.x - self.half_x
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.half_x
    }
}

// =============================================================================
// Whole city
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedCity {
    pub buildings: Vec<Building>,
    pub blocks: Vec<Block>,
    pub plazas: Vec<Plaza>,
    pub decorations: Vec<Decoration>,
    pub river: Option<River>,
    pub bridges: Vec<Bridge>,
    pub districts: Vec<DistrictRun>,
    #[serde(skip)]
    pub(crate) lookup: HashMap<String, usize>,
}

impl GeneratedCity {
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn building_index(&self, identity: &str) -> Option<usize> {
        self.lookup.get(identity).copied()
    }

    pub fn building(&self, identity: &str) -> Option<&Building> {
        self.building_index(identity).map(|i| &self.buildings[i])
    }

    pub fn category_of(&self, building: &Building) -> Option<&str> {
        self.districts
            .get(building.district)
            .map(|d| d.category.as_str())
    }

    pub fn count_decorations(&self, kind: DecorationKind) -> usize {
        self.decorations.iter().filter(|d| d.kind == kind).count()
    }
}
