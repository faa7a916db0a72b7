//! Input records and their normalization.
//!
//! The roster comes from an external data source. One malformed record must
//! never abort generation for the whole city, so bad values are replaced with
//! safe defaults and a warning is logged instead.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub const FALLBACK_CATEGORY: &str = "uncategorized";

/// What a building stands for. Selects the metric ceilings used for scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// DeFi protocol: value locked, 24h volume, chain count, user count.
    #[default]
    Protocol,
    /// Developer: contributions, recent contributions, repo count, star count.
    Developer,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityMetrics {
    /// Value metric that drives height and district weight.
    pub primary: f64,
    /// Activity metric that drives footprint and window lighting.
    pub activity: f64,
    pub breadth: f64,
    pub reach: f64,
}

impl EntityMetrics {
    pub fn new(primary: f64, activity: f64, breadth: f64, reach: f64) -> Self {
        Self {
            primary,
            activity,
            breadth,
            reach,
        }
    }

    /// Replace non-finite and negative values with zero. Returns true if
    /// anything changed.
    fn normalize(&mut self) -> bool {
        let mut changed = false;
        for value in [
            &mut self.primary,
            &mut self.activity,
            &mut self.breadth,
            &mut self.reach,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
                changed = true;
            }
        }
        changed
    }
}

/// One ranked record supplied by the data layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CityEntity {
    pub identity: String,
    pub category: String,
    pub kind: EntityKind,
    pub metrics: EntityMetrics,
    pub rank: Option<u32>,
}

impl CityEntity {
    pub fn new(
        identity: impl Into<String>,
        category: impl Into<String>,
        metrics: EntityMetrics,
    ) -> Self {
        Self {
            identity: identity.into(),
            category: category.into(),
            kind: EntityKind::Protocol,
            metrics,
            rank: None,
        }
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// Normalize a raw roster into records the generator can trust:
///
/// - empty identity -> `entity-{index}`
/// - duplicate identity -> `{identity}~{n}`
/// - blank category -> [`FALLBACK_CATEGORY`]
/// - non-finite or negative metric -> 0
pub fn sanitize_entities(raw: &[CityEntity]) -> Vec<CityEntity> {
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    // Next suffix to try per duplicated identity.
    let mut suffixes: HashMap<String, u32> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());

    for (index, entity) in raw.iter().enumerate() {
        let mut entity = entity.clone();

        let trimmed = entity.identity.trim().to_string();
        if trimmed.is_empty() {
            warn!("Roster entry {} has no identity, using fallback", index);
            entity.identity = format!("entity-{}", index);
        } else {
            entity.identity = trimmed;
        }

        if taken.contains(&entity.identity) {
            let suffix = suffixes.entry(entity.identity.clone()).or_insert(0);
            let renamed = loop {
                *suffix += 1;
                let candidate = format!("{}~{}", entity.identity, suffix);
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            warn!(
                "Roster identity '{}' is duplicated, renaming to '{}'",
                entity.identity, renamed
            );
            entity.identity = renamed;
        }
        taken.insert(entity.identity.clone());

        if entity.category.trim().is_empty() {
            entity.category = FALLBACK_CATEGORY.to_string();
        }

        if entity.metrics.normalize() {
            warn!(
                "Roster entity '{}' had non-finite or negative metrics, clamped to 0",
                entity.identity
            );
        }

        out.push(entity);
    }

    out
}
