use bevy::prelude::*;

/// Buildings per block side. A block holds up to `BLOCK_LOTS * BLOCK_LOTS` buildings.
pub const BLOCK_LOTS: usize = 4;
/// Largest footprint a single lot can hold (width or depth).
pub const LOT_SIZE: f32 = 40.0;
pub const ALLEY_GAP: f32 = 4.0;
pub const STREET_WIDTH: f32 = 25.0;
pub const AVENUE_WIDTH: f32 = 45.0;
/// Every `AVENUE_INTERVAL`-th gap between block columns/rows is an avenue.
pub const AVENUE_INTERVAL: i32 = 4;

pub const RIVER_WIDTH: f32 = 40.0;
/// Blocks at or below this column are pushed west to open the river band.
pub const RIVER_CUT_COLUMN: i32 = -2;
pub const RIVER_PADDING: f32 = 200.0;
pub const BRIDGE_WIDTH: f32 = 18.0;
pub const BRIDGE_LANDING: f32 = 4.0;

pub const MIN_HEIGHT: f32 = 25.0;
pub const MAX_HEIGHT: f32 = 420.0;
pub const FLOOR_HEIGHT: f32 = 4.0;
pub const MIN_FLOORS: u32 = 3;
pub const WINDOW_SPACING: f32 = 3.5;
pub const MIN_WINDOWS: u32 = 2;

pub const MIN_FOOTPRINT: f32 = 12.0;
pub const MAX_FOOTPRINT: f32 = LOT_SIZE;
pub const FOOTPRINT_BASE: f32 = 14.0;
pub const FOOTPRINT_RANGE: f32 = 20.0;
pub const FOOTPRINT_JITTER: f32 = 6.0;

pub const MIN_LIT_FRACTION: f32 = 0.1;
pub const MAX_LIT_FRACTION: f32 = 0.95;

pub const PALETTE_COUNT: u8 = 8;
pub const FACADE_VARIANTS: u8 = 6;

/// Spiral slots reserved for plazas. Sparse, roughly regular, never slot 0.
pub const DEFAULT_PLAZA_SLOTS: &[usize] = &[4, 15, 32, 55, 84, 119, 160, 207];

/// Spacing between dashes of a road marking run.
pub const DASH_SPACING: f32 = 12.0;
pub const DASH_LENGTH: f32 = 5.0;

/// Side length of a block: all lots plus the alleys between them.
pub const BLOCK_SPAN: f32 = BLOCK_LOTS as f32 * LOT_SIZE + (BLOCK_LOTS as f32 - 1.0) * ALLEY_GAP;

/// Runtime layout parameters. Defaults mirror the constants above.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub block_lots: usize,
    pub lot_size: f32,
    pub alley_gap: f32,
    pub street_width: f32,
    pub avenue_width: f32,
    pub avenue_interval: i32,
    pub plaza_slots: Vec<usize>,
    pub river_width: f32,
    pub river_cut_column: i32,
    pub dash_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            block_lots: BLOCK_LOTS,
            lot_size: LOT_SIZE,
            alley_gap: ALLEY_GAP,
            street_width: STREET_WIDTH,
            avenue_width: AVENUE_WIDTH,
            avenue_interval: AVENUE_INTERVAL,
            plaza_slots: DEFAULT_PLAZA_SLOTS.to_vec(),
            river_width: RIVER_WIDTH,
            river_cut_column: RIVER_CUT_COLUMN,
            dash_spacing: DASH_SPACING,
        }
    }
}

impl LayoutConfig {
    pub fn lots_per_block(&self) -> usize {
        self.block_lots * self.block_lots
    }

    pub fn block_span(&self) -> f32 {
        self.block_lots as f32 * self.lot_size + (self.block_lots as f32 - 1.0) * self.alley_gap
    }

    /// Distance between neighbouring lot centres inside a block.
    pub fn lot_pitch(&self) -> f32 {
        self.lot_size + self.alley_gap
    }

    /// How far every block at or beyond the cut column moves to fit the river.
    pub fn shift_for_river(&self) -> f32 {
        (self.river_width - self.street_width).max(0.0)
    }

    pub fn is_plaza_slot(&self, spiral_index: usize) -> bool {
        self.plaza_slots.contains(&spiral_index)
    }

    /// Width of the gap between block `gap` and block `gap + 1` along one axis.
    ///
    /// The gap flanking the river cut is always a plain street so that the
    /// carved band ends up exactly `river_width` wide.
    pub fn gap_width(&self, gap: i32, is_x_axis: bool) -> f32 {
        if is_x_axis && gap == self.river_cut_column {
            return self.street_width;
        }
        if self.avenue_interval > 0 && gap.rem_euclid(self.avenue_interval) == self.avenue_interval - 1
        {
            self.avenue_width
        } else {
            self.street_width
        }
    }

    /// Centre coordinate of block `index` along one axis, before the river shift.
    pub fn axis_center(&self, index: i32, is_x_axis: bool) -> f32 {
        let span = self.block_span();
        let mut offset = 0.0;
        if index > 0 {
            for gap in 0..index {
                offset += span + self.gap_width(gap, is_x_axis);
            }
        } else {
            for gap in index..0 {
                offset -= span + self.gap_width(gap, is_x_axis);
            }
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_span_matches_constant() {
        assert_eq!(LayoutConfig::default().block_span(), BLOCK_SPAN);
    }

    #[test]
    fn test_river_shift_is_width_minus_street() {
        let config = LayoutConfig {
            river_width: 40.0,
            street_width: 25.0,
            ..Default::default()
        };
        assert_eq!(config.shift_for_river(), 15.0);
    }

    #[test]
    fn test_avenues_are_periodic_and_wider() {
        let config = LayoutConfig::default();
        let avenues: Vec<i32> = (-8..8)
            .filter(|&g| config.gap_width(g, false) == AVENUE_WIDTH)
            .collect();
        assert_eq!(avenues, vec![-5, -1, 3, 7]);
        assert!(AVENUE_WIDTH > STREET_WIDTH);
    }

    #[test]
    fn test_river_gap_is_never_an_avenue() {
        let config = LayoutConfig {
            river_cut_column: -1,
            ..Default::default()
        };
        assert_eq!(config.gap_width(-1, true), STREET_WIDTH);
        assert_eq!(config.gap_width(-1, false), AVENUE_WIDTH);
    }

    #[test]
    fn test_axis_center_is_symmetric_for_uniform_streets() {
        let config = LayoutConfig {
            avenue_interval: 0,
            ..Default::default()
        };
        assert_eq!(config.axis_center(0, true), 0.0);
        assert_eq!(config.axis_center(2, true), -config.axis_center(-2, true));
        assert_eq!(config.axis_center(1, false), BLOCK_SPAN + STREET_WIDTH);
    }

    #[test]
    fn test_plaza_slots_skip_origin() {
        assert!(!LayoutConfig::default().is_plaza_slot(0));
    }
}
