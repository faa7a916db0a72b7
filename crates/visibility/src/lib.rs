use std::sync::Arc;

use bevy::prelude::*;

use layout::{CityLayout, CityUpdateSet, LayoutPlugin};

pub mod config;
pub mod near_set;
pub mod spatial_grid;
pub mod viewpoint;

pub use config::VisibilityConfig;
pub use near_set::{NearSetDelta, NearSetInputs, NearSetManager, TickOutcome};
pub use spatial_grid::SpatialIndex;
pub use viewpoint::{
    project_to_screen, refresh_focus_readout, FlyoverMode, FocusInfo, FocusReadout, FocusTargets,
    Viewpoint,
};

use config::MAX_FOCUS;

// ---------------------------------------------------------------------------
// Resources and events
// ---------------------------------------------------------------------------

/// Buildings that should currently be drawn at full detail, sorted by index
/// into `CityLayout.city.buildings`. Only replaced when membership changes.
#[derive(Resource, Debug, Clone)]
pub struct NearSet {
    pub generation: u64,
    pub buildings: Arc<[u32]>,
}

impl Default for NearSet {
    fn default() -> Self {
        Self {
            generation: 0,
            buildings: Arc::from(Vec::new()),
        }
    }
}

impl NearSet {
    pub fn contains(&self, building: u32) -> bool {
        self.buildings.binary_search(&building).is_ok()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearSetChanged {
    pub generation: u64,
    pub admitted: usize,
    pub evicted: usize,
    pub deferred: usize,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Rebuild the spatial index and drop all near-set state when the layout is
/// replaced. Runs before [`tick_near_set`] in the same frame.
pub fn rebuild_spatial_index(
    layout: Res<CityLayout>,
    config: Res<VisibilityConfig>,
    mut index: ResMut<SpatialIndex>,
    mut manager: ResMut<NearSetManager>,
    mut near_set: ResMut<NearSet>,
    mut readout: ResMut<FocusReadout>,
) {
    if !layout.is_changed() && !config.is_changed() {
        return;
    }

    *index = SpatialIndex::build(&layout.city.buildings, config.cell_size, layout.generation);
    manager.reset(layout.generation);
    *near_set = NearSet {
        generation: layout.generation,
        buildings: manager.published(),
    };
    readout.clear();

    debug!(
        "Spatial index rebuilt for generation {}: {} buildings in {} cells",
        layout.generation,
        index.len(),
        index.cell_count()
    );
}

#[allow(clippy::too_many_arguments)]
pub fn tick_near_set(
    time: Res<Time>,
    config: Res<VisibilityConfig>,
    layout: Res<CityLayout>,
    index: Res<SpatialIndex>,
    viewpoint: Res<Viewpoint>,
    focus: Res<FocusTargets>,
    flyover: Res<FlyoverMode>,
    mut manager: ResMut<NearSetManager>,
    mut near_set: ResMut<NearSet>,
    mut readout: ResMut<FocusReadout>,
    mut changed: EventWriter<NearSetChanged>,
) {
    let city = &layout.city;

    let mut focused = [0u32; MAX_FOCUS];
    let mut focus_count = 0;
    for identity in focus.identities().iter().take(MAX_FOCUS) {
        if let Some(i) = city.building_index(identity) {
            focused[focus_count] = i as u32;
            focus_count += 1;
        }
    }

    let outcome = manager.tick(
        &config,
        &NearSetInputs {
            now: time.elapsed(),
            viewpoint: viewpoint.planar(),
            buildings: &city.buildings,
            index: &index,
            focused: &focused[..focus_count],
            flyover: flyover.0,
        },
    );

    match outcome {
        TickOutcome::Skipped => return,
        TickOutcome::Unchanged { .. } => {}
        TickOutcome::Changed(delta) => {
            *near_set = NearSet {
                generation: manager.generation(),
                buildings: manager.published(),
            };
            changed.send(NearSetChanged {
                generation: manager.generation(),
                admitted: delta.admitted,
                evicted: delta.evicted,
                deferred: delta.deferred,
                total: delta.total,
            });
        }
    }

    refresh_focus_readout(city, &viewpoint, &focus, &mut readout);
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct VisibilityPlugin;

impl Plugin for VisibilityPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<LayoutPlugin>() {
            app.add_plugins(LayoutPlugin);
        }

        app.init_resource::<VisibilityConfig>()
            .init_resource::<SpatialIndex>()
            .init_resource::<NearSetManager>()
            .init_resource::<NearSet>()
            .init_resource::<Viewpoint>()
            .init_resource::<FocusTargets>()
            .init_resource::<FlyoverMode>()
            .init_resource::<FocusReadout>()
            .add_event::<NearSetChanged>()
            .add_systems(
                Update,
                (rebuild_spatial_index, tick_near_set)
                    .chain()
                    .in_set(CityUpdateSet::Visibility),
            );
    }
}
