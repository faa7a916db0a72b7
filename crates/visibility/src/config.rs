use std::time::Duration;

use bevy::prelude::*;

/// World units per spatial index cell.
pub const CELL_SIZE: f32 = 200.0;

/// Buildings closer than this enter the near set.
pub const NEAR_RADIUS: f32 = 600.0;
/// Near-set members leave only once they are farther than this.
pub const FAR_RADIUS: f32 = 850.0;

/// Radii while the scripted intro flyover is running. The camera is high and
/// fast, so the band is wider.
pub const FLYOVER_NEAR_RADIUS: f32 = 1400.0;
pub const FLYOVER_FAR_RADIUS: f32 = 1800.0;

/// Newly promoted buildings admitted per tick.
pub const MOUNT_BUDGET: usize = 6;

/// Minimum time between two near-set recomputations.
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// At most this many entities can be focused at once (profile + compare).
pub const MAX_FOCUS: usize = 2;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct VisibilityConfig {
    pub cell_size: f32,
    pub near_radius: f32,
    pub far_radius: f32,
    pub flyover_near_radius: f32,
    pub flyover_far_radius: f32,
    pub mount_budget: usize,
    pub tick_interval: Duration,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            near_radius: NEAR_RADIUS,
            far_radius: FAR_RADIUS,
            flyover_near_radius: FLYOVER_NEAR_RADIUS,
            flyover_far_radius: FLYOVER_FAR_RADIUS,
            mount_budget: MOUNT_BUDGET,
            tick_interval: TICK_INTERVAL,
        }
    }
}

impl VisibilityConfig {
    /// `(near, far)` for the current mode. `far` is never below `near`.
    pub fn radii(&self, flyover: bool) -> (f32, f32) {
        let (near, far) = if flyover {
            (self.flyover_near_radius, self.flyover_far_radius)
        } else {
            (self.near_radius, self.far_radius)
        };
        (near, far.max(near))
    }
}
