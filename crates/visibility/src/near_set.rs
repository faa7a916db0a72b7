use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use layout::Building;

use crate::config::VisibilityConfig;
use crate::spatial_grid::SpatialIndex;

/// Everything one near-set tick looks at.
pub struct NearSetInputs<'a> {
    pub now: Duration,
    /// Ground-plane viewpoint (x, z).
    pub viewpoint: Vec2,
    pub buildings: &'a [Building],
    pub index: &'a SpatialIndex,
    /// Building indices that must be members regardless of distance.
    pub focused: &'a [u32],
    pub flyover: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearSetDelta {
    pub admitted: usize,
    pub evicted: usize,
    /// Qualifying newcomers held back by the mount budget.
    pub deferred: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Inside the tick interval; nothing was computed.
    Skipped,
    Unchanged { deferred: usize },
    Changed(NearSetDelta),
}

/// Decides which buildings get full detail.
///
/// Membership uses hysteresis: a building enters once it is closer than the
/// near radius and leaves only once it is farther than the far radius.
/// At most `mount_budget` newcomers are admitted per tick, nearest first, so
/// teleporting into a dense district fills in over several ticks instead of
/// mounting hundreds of buildings at once. Focused buildings bypass both the
/// radius and the budget. During a flyover nothing is ever evicted.
///
/// Scratch buffers are kept across ticks. A new membership snapshot is only
/// allocated when membership actually changes.
#[derive(Resource, Debug)]
pub struct NearSetManager {
    generation: u64,
    last_tick: Option<Duration>,
    members: HashSet<u32>,
    next: HashSet<u32>,
    candidates: Vec<u32>,
    newcomers: Vec<(f32, u32)>,
    published: Arc<[u32]>,
}

impl Default for NearSetManager {
    fn default() -> Self {
        Self {
            generation: 0,
            last_tick: None,
            members: HashSet::with_capacity(256),
            next: HashSet::with_capacity(256),
            candidates: Vec::with_capacity(1024),
            newcomers: Vec::with_capacity(256),
            published: Arc::from(Vec::new()),
        }
    }
}

impl NearSetManager {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sorted snapshot of the current members. Cheap to clone.
    pub fn published(&self) -> Arc<[u32]> {
        Arc::clone(&self.published)
    }

    pub fn contains(&self, building: u32) -> bool {
        self.members.contains(&building)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Forget all membership. Required whenever the building list is replaced:
    /// old indices may point at different buildings or past the end.
    pub fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.last_tick = None;
        self.members.clear();
        self.next.clear();
        self.candidates.clear();
        self.newcomers.clear();
        self.published = Arc::from(Vec::new());
    }

    pub fn tick(&mut self, config: &VisibilityConfig, inputs: &NearSetInputs) -> TickOutcome {
        if inputs.index.generation() != self.generation {
            warn!(
                "Near set built for layout generation {} but index is at {}, resetting",
                self.generation,
                inputs.index.generation()
            );
            self.reset(inputs.index.generation());
        }

        if let Some(last) = self.last_tick {
            // A clock that went backwards counts as elapsed.
            if inputs.now >= last && inputs.now - last < config.tick_interval {
                return TickOutcome::Skipped;
            }
        }
        self.last_tick = Some(inputs.now);

        let (near, far) = config.radii(inputs.flyover);
        let near_sq = near * near;
        let far_sq = far * far;
        let view = inputs.viewpoint;
        let building_count = inputs.buildings.len();

        self.next.clear();
        self.newcomers.clear();

        if inputs.flyover {
            self.next.extend(self.members.iter().copied());
        }

        inputs.index.query_radius(view, far, &mut self.candidates);
        for &i in &self.candidates {
            let Some(building) = inputs.buildings.get(i as usize) else {
                continue;
            };
            let d_sq = view.distance_squared(building.planar());
            if self.members.contains(&i) {
                if d_sq < far_sq {
                    self.next.insert(i);
                }
            } else if d_sq < near_sq {
                self.newcomers.push((d_sq, i));
            }
        }

        for &i in inputs.focused {
            if (i as usize) < building_count {
                self.next.insert(i);
            }
        }

        // Focused newcomers are already in; they do not use up the budget.
        let next = &self.next;
        self.newcomers.retain(|(_, i)| !next.contains(i));
        self.newcomers
            .sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let budget = config.mount_budget.min(self.newcomers.len());
        for &(_, i) in &self.newcomers[..budget] {
            self.next.insert(i);
        }
        let deferred = self.newcomers.len() - budget;

        let admitted = self.next.difference(&self.members).count();
        let evicted = self.members.difference(&self.next).count();
        std::mem::swap(&mut self.members, &mut self.next);

        if admitted == 0 && evicted == 0 {
            return TickOutcome::Unchanged { deferred };
        }

        let mut snapshot: Vec<u32> = self.members.iter().copied().collect();
        snapshot.sort_unstable();
        self.published = Arc::from(snapshot);

        TickOutcome::Changed(NearSetDelta {
            admitted,
            evicted,
            deferred,
            total: self.members.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FAR_RADIUS, MOUNT_BUDGET, NEAR_RADIUS, TICK_INTERVAL};
    use layout::{generate_city, CityEntity, EntityMetrics, GeneratedCity, LayoutConfig};

    fn city(n: usize) -> GeneratedCity {
        let entities: Vec<CityEntity> = (0..n)
            .map(|i| {
                CityEntity::new(
                    format!("p{i}"),
                    ["dex", "lending", "bridge"][i % 3],
                    EntityMetrics::new(1e6 / (i as f64 + 1.0), 1e4, 3.0, 100.0),
                )
            })
            .collect();
        generate_city(&entities, &LayoutConfig::default())
    }

    fn index(city: &GeneratedCity, generation: u64) -> SpatialIndex {
        SpatialIndex::build(&city.buildings, 200.0, generation)
    }

    fn at(step: u32) -> Duration {
        TICK_INTERVAL * step
    }

    fn tick(
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
    fn test_oscillating_at_near_radius_does_not_toggle() {
        let city = city(1);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();
        let b = city.buildings[0].planar();

        let inside = b + Vec2::new(NEAR_RADIUS - 1.0, 0.0);
        let outside = b + Vec2::new(NEAR_RADIUS + 1.0, 0.0);

        let first = tick(&mut manager, &config, &city, &index, at(0), inside);
        assert!(matches!(first, TickOutcome::Changed(d) if d.admitted == 1));

        for step in 1..20 {
            let view = if step % 2 == 0 { inside } else { outside };
            let outcome = tick(&mut manager, &config, &city, &index, at(step), view);
            assert_eq!(outcome, TickOutcome::Unchanged { deferred: 0 });
            assert!(manager.contains(0));
        }
    }

    #[test]
    fn test_just_outside_near_radius_never_enters() {
        let city = city(1);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();
        let view = city.buildings[0].planar() + Vec2::new(NEAR_RADIUS + 1.0, 0.0);

        for step in 0..5 {
            tick(&mut manager, &config, &city, &index, at(step), view);
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_member_leaves_beyond_far_radius() {
        let city = city(1);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();
        let b = city.buildings[0].planar();

        tick(&mut manager, &config, &city, &index, at(0), b);
        let outcome = tick(
            &mut manager,
            &config,
            &city,
            &index,
            at(1),
            b + Vec2::new(FAR_RADIUS + 1.0, 0.0),
        );
        assert!(matches!(outcome, TickOutcome::Changed(d) if d.evicted == 1 && d.total == 0));
    }

    #[test]
    fn test_member_at_exact_far_radius_is_evicted() {
        let mut single = city(1);
        single.buildings[0].x = 0.0;
        single.buildings[0].z = 0.0;
        let index = index(&single, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();

        tick(&mut manager, &config, &single, &index, at(0), Vec2::ZERO);
        assert!(manager.contains(0));

        let inside = tick(
            &mut manager,
            &config,
            &single,
            &index,
            at(1),
            Vec2::new(FAR_RADIUS - 1.0, 0.0),
        );
        assert_eq!(inside, TickOutcome::Unchanged { deferred: 0 });

        let outcome = tick(
            &mut manager,
            &config,
            &single,
            &index,
            at(2),
            Vec2::new(FAR_RADIUS, 0.0),
        );
        assert!(matches!(outcome, TickOutcome::Changed(d) if d.evicted == 1));
        assert!(!manager.contains(0));
    }

    #[test]
    fn test_tick_interval_gates_recompute() {
        let city = city(1);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();
        let b = city.buildings[0].planar();

        assert_ne!(tick(&mut manager, &config, &city, &index, Duration::ZERO, b), TickOutcome::Skipped);
        assert_eq!(
            tick(&mut manager, &config, &city, &index, Duration::from_millis(100), b),
            TickOutcome::Skipped
        );
        assert_ne!(
            tick(&mut manager, &config, &city, &index, Duration::from_millis(200), b),
            TickOutcome::Skipped
        );
    }

    #[test]
    fn test_mount_budget_admits_nearest_first() {
        let city = city(300);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();
        let view = Vec2::ZERO;

        let TickOutcome::Changed(delta) = tick(&mut manager, &config, &city, &index, at(0), view)
        else {
            panic!("first tick should admit");
        };
        assert_eq!(delta.admitted, MOUNT_BUDGET);
        assert!(delta.deferred > 0);

        let mut qualifying: Vec<(f32, u32)> = city
            .buildings
            .iter()
            .enumerate()
            .map(|(i, b)| (view.distance_squared(b.planar()), i as u32))
            .filter(|(d, _)| *d < NEAR_RADIUS * NEAR_RADIUS)
            .collect();
        qualifying.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut expected: Vec<u32> = qualifying[..MOUNT_BUDGET].iter().map(|(_, i)| *i).collect();
        expected.sort_unstable();
        assert_eq!(&*manager.published(), expected.as_slice());

        // Later ticks keep filling in without exceeding the budget.
        let mut step = 1;
        loop {
            match tick(&mut manager, &config, &city, &index, at(step), view) {
                TickOutcome::Changed(d) => {
                    assert!(d.admitted <= MOUNT_BUDGET);
                    assert_eq!(d.evicted, 0);
                }
                TickOutcome::Unchanged { deferred } => {
                    assert_eq!(deferred, 0);
                    break;
                }
                TickOutcome::Skipped => unreachable!(),
            }
            step += 1;
        }
        assert_eq!(manager.len(), qualifying.len());
    }

    #[test]
    fn test_focused_building_far_away_is_member() {
        let city = city(10);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();
        let far_away = Vec2::new(1e6, 1e6);

        let outcome = manager.tick(
            &config,
            &NearSetInputs {
                now: at(0),
                viewpoint: far_away,
                buildings: &city.buildings,
                index: &index,
                focused: &[3],
                flyover: false,
            },
        );
        assert!(matches!(outcome, TickOutcome::Changed(d) if d.total == 1));
        assert!(manager.contains(3));

        // Unfocusing lets distance decide again.
        let outcome = tick(&mut manager, &config, &city, &index, at(1), far_away);
        assert!(matches!(outcome, TickOutcome::Changed(d) if d.evicted == 1));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_focus_does_not_use_mount_budget() {
        let city = city(300);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();

        let outcome = manager.tick(
            &config,
            &NearSetInputs {
                now: at(0),
                viewpoint: Vec2::ZERO,
                buildings: &city.buildings,
                index: &index,
                focused: &[299, 298],
                flyover: false,
            },
        );
        let TickOutcome::Changed(delta) = outcome else {
            panic!("expected change");
        };
        assert_eq!(delta.admitted, MOUNT_BUDGET + 2);
    }

    #[test]
    fn test_flyover_never_evicts() {
        let city = city(60);
        let index = index(&city, 0);
        let config = VisibilityConfig::default();
        let mut manager = NearSetManager::default();

        let flyover = |manager: &mut NearSetManager, step: u32, view: Vec2, on: bool| {
            manager.tick(
                &config,
                &NearSetInputs {
                    now: at(step),
                    viewpoint: view,
                    buildings: &city.buildings,
                    index: &index,
                    focused: &[],
                    flyover: on,
                },
            )
        };

        flyover(&mut manager, 0, Vec2::ZERO, true);
        let mut previous = manager.len();
        assert!(previous > 0);
        for step in 1..10 {
            let view = Vec2::new(step as f32 * 5_000.0, 0.0);
            if let TickOutcome::Changed(d) = flyover(&mut manager, step, view, true) {
                assert_eq!(d.evicted, 0);
            }
            assert!(manager.len() >= previous);
            previous = manager.len();
        }

        // Once the flyover ends, distance rules apply.
        flyover(&mut manager, 10, Vec2::new(1e6, 0.0), false);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_stale_generation_resets_membership() {
        let big = city(300);
        let big_index = index(&big, 1);
        let config = VisibilityConfig {
            mount_budget: usize::MAX,
            ..Default::default()
        };
        let mut manager = NearSetManager::default();
        manager.reset(1);
        tick(&mut manager, &config, &big, &big_index, at(0), Vec2::ZERO);
        assert!(manager.published().iter().any(|&i| i >= 3));

        let small = city(3);
        let small_index = index(&small, 2);
        tick(&mut manager, &config, &small, &small_index, at(1), Vec2::new(1e6, 0.0));
        assert_eq!(manager.generation(), 2);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_unchanged_tick_keeps_snapshot() {
        let city = city(20);
        let index = index(&city, 0);
        let config = VisibilityConfig {
            mount_budget: usize::MAX,
            ..Default::default()
        };
        let mut manager = NearSetManager::default();

        tick(&mut manager, &config, &city, &index, at(0), Vec2::ZERO);
        let before = manager.published();
        let outcome = tick(&mut manager, &config, &city, &index, at(1), Vec2::ZERO);
        assert!(matches!(outcome, TickOutcome::Unchanged { .. }));
        assert!(Arc::ptr_eq(&before, &manager.published()));
    }
}
