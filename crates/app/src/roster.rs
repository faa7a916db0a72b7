//! Where the entity roster comes from: a JSON file, or a seeded synthetic
//! roster shaped like real data (a handful of whales, a long tail).

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use layout::{CityEntity, EntityKind, EntityMetrics};

pub const DEFAULT_ENTITY_COUNT: usize = 1_500;
pub const DEFAULT_SEED: u64 = 0x5EED;

const CATEGORIES: [&str; 10] = [
    "dex",
    "lending",
    "bridge",
    "liquid-staking",
    "derivatives",
    "yield",
    "cdp",
    "rwa",
    "launchpad",
    "insurance",
];

/// Read a JSON array of entities. Malformed records inside the array are
/// normalized later by the generator; only unreadable files fail here.
pub fn load_roster(path: &Path) -> Result<Vec<CityEntity>, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("parse {}: {e}", path.display()))
}

/// Deterministic power-law roster. The same seed always yields the same city.
pub fn synthetic_roster(seed: u64, count: usize) -> Vec<CityEntity> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            // Pareto-ish: most entities are tiny, a few dominate.
            let u: f64 = rng.gen_range(1e-4..1.0);
            let scale = u.powf(-1.6).min(1e5) / 1e5;
            let category = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];

            if rng.gen_bool(0.15) {
                CityEntity::new(
                    format!("dev-{i:04}"),
                    category,
                    EntityMetrics::new(
                        (scale * 40_000.0).round(),
                        (scale * 2_000.0 * rng.gen::<f64>()).round(),
                        rng.gen_range(1..120) as f64,
                        (scale * 150_000.0).round(),
                    ),
                )
                .with_kind(EntityKind::Developer)
            } else {
                CityEntity::new(
                    format!("{category}-{i:04}"),
                    category,
                    EntityMetrics::new(
                        scale * 5e10,
                        scale * 4e9 * rng.gen::<f64>(),
                        rng.gen_range(1..40) as f64,
                        (scale * 3e6).round(),
                    ),
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_roster_is_deterministic() {
        assert_eq!(synthetic_roster(1, 200), synthetic_roster(1, 200));
        assert_ne!(synthetic_roster(1, 200), synthetic_roster(2, 200));
    }

    #[test]
    fn test_synthetic_roster_has_whales_and_tail() {
        let roster = synthetic_roster(DEFAULT_SEED, DEFAULT_ENTITY_COUNT);
        assert_eq!(roster.len(), DEFAULT_ENTITY_COUNT);
        let mut primaries: Vec<f64> = roster
            .iter()
            .filter(|e| e.kind == EntityKind::Protocol)
            .map(|e| e.metrics.primary)
            .collect();
        primaries.sort_by(|a, b| b.total_cmp(a));
        let median = primaries[primaries.len() / 2];
        assert!(primaries[0] > median * 100.0);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load_roster(Path::new("/nonexistent/roster.json")).unwrap_err();
        assert!(err.contains("roster.json"));
    }

    #[test]
    fn test_load_roster_from_json() {
        let path = std::env::temp_dir().join(format!("skyline-roster-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"identity":"uni","category":"dex","metrics":{"primary":5e9}},
                {"identity":"aave","category":"lending","kind":"protocol"}]"#,
        )
        .unwrap();
        let roster = load_roster(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].metrics.primary, 5e9);
    }
}
