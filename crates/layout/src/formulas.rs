//! Metric-to-geometry formulas.
//!
//! Each metric is normalized against a capped maximum (observed max, but never
//! above a per-kind ceiling) and then bent with a power curve < 1 so a single
//! outlier can't flatten the rest of the skyline.

use crate::config::{
    FACADE_VARIANTS, FLOOR_HEIGHT, FOOTPRINT_BASE, FOOTPRINT_JITTER, FOOTPRINT_RANGE,
    MAX_FOOTPRINT, MAX_HEIGHT, MAX_LIT_FRACTION, MIN_FLOORS, MIN_FOOTPRINT, MIN_HEIGHT,
    MIN_LIT_FRACTION, MIN_WINDOWS, WINDOW_SPACING,
};
use crate::entity::{CityEntity, EntityKind, EntityMetrics};
use crate::hash;

const PRIMARY_EXPONENT: f64 = 0.5;
const SECONDARY_EXPONENT: f64 = 0.55;

const PRIMARY_WEIGHT: f64 = 0.55;
const BREADTH_WEIGHT: f64 = 0.25;
const REACH_WEIGHT: f64 = 0.20;

/// Keeps normalization from dividing by zero when every entity reports 0.
const MIN_MAXIMUM: f64 = 1e-9;

const WIDTH_SALT: u32 = 1;
const DEPTH_SALT: u32 = 2;
const FACADE_SALT: u32 = 3;

/// Hard caps per metric. Anything above is treated as the cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCeilings {
    pub primary: f64,
    pub activity: f64,
    pub breadth: f64,
    pub reach: f64,
}

impl MetricCeilings {
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Protocol => Self {
                primary: 50e9,
                activity: 5e9,
                breadth: 40.0,
                reach: 2e6,
            },
            EntityKind::Developer => Self {
                primary: 50_000.0,
                activity: 5_000.0,
                breadth: 500.0,
                reach: 500_000.0,
            },
        }
    }
}

/// Read-only aggregates computed once per layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricMaxima {
    pub protocol: EntityMetrics,
    pub developer: EntityMetrics,
}

impl MetricMaxima {
    pub fn observe(entities: &[CityEntity]) -> Self {
        let mut protocol = EntityMetrics::default();
        let mut developer = EntityMetrics::default();
        for entity in entities {
            let max = match entity.kind {
                EntityKind::Protocol => &mut protocol,
                EntityKind::Developer => &mut developer,
            };
            let m = &entity.metrics;
            max.primary = max.primary.max(finite(m.primary));
            max.activity = max.activity.max(finite(m.activity));
            max.breadth = max.breadth.max(finite(m.breadth));
            max.reach = max.reach.max(finite(m.reach));
        }
        Self {
            protocol: cap(protocol, MetricCeilings::for_kind(EntityKind::Protocol)),
            developer: cap(developer, MetricCeilings::for_kind(EntityKind::Developer)),
        }
    }

    pub fn for_kind(&self, kind: EntityKind) -> &EntityMetrics {
        match kind {
            EntityKind::Protocol => &self.protocol,
            EntityKind::Developer => &self.developer,
        }
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn cap(observed: EntityMetrics, ceilings: MetricCeilings) -> EntityMetrics {
    EntityMetrics {
        primary: observed.primary.min(ceilings.primary).max(MIN_MAXIMUM),
        activity: observed.activity.min(ceilings.activity).max(MIN_MAXIMUM),
        breadth: observed.breadth.min(ceilings.breadth).max(MIN_MAXIMUM),
        reach: observed.reach.min(ceilings.reach).max(MIN_MAXIMUM),
    }
}

/// `value / max` clamped into [0, 1]. Garbage in gives 0.
pub fn normalize(value: f64, max: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 || max <= 0.0 {
        return 0.0;
    }
    (value / max).min(1.0)
}

pub fn curve(normalized: f64, exponent: f64) -> f64 {
    normalized.clamp(0.0, 1.0).powf(exponent)
}

/// Full geometry for one building, before placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingDims {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub floors: u32,
    pub windows_front: u32,
    pub windows_side: u32,
    pub lit_fraction: f32,
    pub facade_variant: u8,
}

/// Weighted composite of the curved metrics, in [0, 1].
///
/// Zero primary value means a stub building: the composite is 0 regardless of
/// the secondary metrics.
pub fn composite_score(metrics: &EntityMetrics, max: &EntityMetrics) -> f64 {
    let primary = normalize(metrics.primary, max.primary);
    if primary <= 0.0 {
        return 0.0;
    }
    let score = PRIMARY_WEIGHT * curve(primary, PRIMARY_EXPONENT)
        + BREADTH_WEIGHT * curve(normalize(metrics.breadth, max.breadth), SECONDARY_EXPONENT)
        + REACH_WEIGHT * curve(normalize(metrics.reach, max.reach), SECONDARY_EXPONENT);
    score.clamp(0.0, 1.0)
}

pub fn building_height(metrics: &EntityMetrics, max: &EntityMetrics) -> f32 {
    let composite = composite_score(metrics, max) as f32;
    (MIN_HEIGHT + composite * (MAX_HEIGHT - MIN_HEIGHT)).clamp(MIN_HEIGHT, MAX_HEIGHT)
}

/// Footprint side from the activity score plus an identity-hashed jitter.
pub fn footprint(activity_score: f64, identity_seed: u32, salt: u32) -> f32 {
    let jitter = (hash::unit(identity_seed, salt) - 0.5) * FOOTPRINT_JITTER;
    let side = FOOTPRINT_BASE + activity_score as f32 * FOOTPRINT_RANGE + jitter;
    side.clamp(MIN_FOOTPRINT, MAX_FOOTPRINT)
}

pub fn lit_fraction(activity: f64, max_activity: f64) -> f32 {
    let ratio = normalize(activity, max_activity).sqrt() as f32;
    (MIN_LIT_FRACTION + ratio * (MAX_LIT_FRACTION - MIN_LIT_FRACTION))
        .clamp(MIN_LIT_FRACTION, MAX_LIT_FRACTION)
}

pub fn floor_count(height: f32) -> u32 {
    ((height / FLOOR_HEIGHT).floor() as u32).max(MIN_FLOORS)
}

pub fn windows_along(side: f32) -> u32 {
    ((side / WINDOW_SPACING).floor() as u32).max(MIN_WINDOWS)
}

pub fn building_dims(entity: &CityEntity, maxima: &MetricMaxima) -> BuildingDims {
    let max = maxima.for_kind(entity.kind);
    let seed = hash::identity_seed(&entity.identity);
    let activity_score = curve(
        normalize(entity.metrics.activity, max.activity),
        SECONDARY_EXPONENT,
    );

    let height = building_height(&entity.metrics, max);
    let width = footprint(activity_score, seed, WIDTH_SALT);
    let depth = footprint(activity_score, seed, DEPTH_SALT);
    let facade_variant =
        ((hash::unit(seed, FACADE_SALT) * FACADE_VARIANTS as f32) as u8).min(FACADE_VARIANTS - 1);

    BuildingDims {
        width,
        depth,
        height,
        floors: floor_count(height),
        windows_front: windows_along(width),
        windows_side: windows_along(depth),
        lit_fraction: lit_fraction(entity.metrics.activity, max.activity),
        facade_variant,
    }
}
