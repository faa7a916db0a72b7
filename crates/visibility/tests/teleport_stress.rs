//! Teleporting between districts must never mount more than the budget per
//! tick, and the near set must settle once the camera stops.

use std::time::Duration;

use bevy::math::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use layout::{generate_city, CityEntity, EntityMetrics, GeneratedCity, LayoutConfig};
use visibility::{NearSetInputs, NearSetManager, SpatialIndex, TickOutcome, VisibilityConfig};

const CATEGORIES: [&str; 6] = ["dex", "lending", "bridge", "staking", "yield", "rwa"];

fn random_city(seed: u64, n: usize) -> GeneratedCity {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let entities: Vec<CityEntity> = (0..n)
        .map(|i| {
            let scale: f64 = rng.gen::<f64>().powi(3);
            CityEntity::new(
                format!("e{i}"),
                CATEGORIES[rng.gen_range(0..CATEGORIES.len())],
                EntityMetrics::new(
                    scale * 1e10,
                    scale * 1e9 * rng.gen::<f64>(),
                    rng.gen_range(0..40) as f64,
                    rng.gen_range(10..1_000_000) as f64,
                ),
            )
        })
        .collect();
    generate_city(&entities, &LayoutConfig::default())
}

fn step(
    manager: &mut NearSetManager,
    config: &VisibilityConfig,
    city: &GeneratedCity,
    index: &SpatialIndex,
    now: Duration,
    viewpoint: Vec2,
) -> TickOutcome {
    manager.tick(
        config,
        &NearSetInputs {
            now,
            viewpoint,
            buildings: &city.buildings,
            index,
            focused: &[],
            flyover: false,
        },
    )
}

#[test]
fn test_teleport_growth_is_bounded() {
    let city = random_city(42, 2_000);
    let config = VisibilityConfig::default();
    let index = SpatialIndex::build(&city.buildings, config.cell_size, 0);
    let mut manager = NearSetManager::default();
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    let mut now = Duration::ZERO;
    for _ in 0..20 {
        // Jump onto a random building: always a dense spot.
        let target = city.buildings[rng.gen_range(0..city.buildings.len())].planar();
        let mut previous = manager.len();
        let mut settled = false;

        for _ in 0..200 {
            let outcome = step(&mut manager, &config, &city, &index, now, target);
            now += config.tick_interval;
            match outcome {
                TickOutcome::Changed(delta) => {
                    assert!(delta.admitted <= config.mount_budget);
                    assert!(manager.len() <= previous + config.mount_budget);
                }
                TickOutcome::Unchanged { deferred: 0 } => {
                    settled = true;
                    break;
                }
                TickOutcome::Unchanged { .. } => {}
                TickOutcome::Skipped => panic!("ticks are spaced by the interval"),
            }
            previous = manager.len();
        }
        assert!(settled, "near set never settled at {target:?}");

        let (near, far) = config.radii(false);
        for &i in manager.published().iter() {
            let d = target.distance(city.buildings[i as usize].planar());
            assert!(d <= far + 1e-3, "member {i} at {d} beyond far radius");
        }
        for (i, b) in city.buildings.iter().enumerate() {
            if target.distance(b.planar()) < near {
                assert!(manager.contains(i as u32), "building {i} inside near radius missing");
            }
        }
    }
}

#[test]
fn test_rapid_jitter_does_not_churn() {
    let city = random_city(7, 800);
    let config = VisibilityConfig {
        mount_budget: usize::MAX,
        ..Default::default()
    };
    let index = SpatialIndex::build(&city.buildings, config.cell_size, 0);
    let mut manager = NearSetManager::default();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let center = city.buildings[0].planar();
    step(&mut manager, &config, &city, &index, Duration::ZERO, center);

    let mut now = config.tick_interval;
    for _ in 0..100 {
        let jitter = Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));
        let outcome = step(&mut manager, &config, &city, &index, now, center + jitter);
        now += config.tick_interval;
        if let TickOutcome::Changed(delta) = outcome {
            assert_eq!(delta.evicted, 0, "jitter well inside the hysteresis band evicted");
        }
    }
}
