use std::sync::Arc;

use bevy::prelude::*;

pub mod config;
pub mod districts;
pub mod entity;
pub mod formulas;
pub mod generator;
pub mod hash;
pub mod spiral;

pub use config::LayoutConfig;
pub use districts::{group_by_district, DistrictOrder, DistrictRun};
pub use entity::{sanitize_entities, CityEntity, EntityKind, EntityMetrics};
pub use generator::{
    generate, generate_city, Block, Bridge, Building, Decoration, DecorationKind, GeneratedCity,
    Plaza, River,
};

// ---------------------------------------------------------------------------
// System sets
// ---------------------------------------------------------------------------

/// Ordering for everything that reacts to roster changes within one frame:
/// the layout is regenerated before visibility looks at it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CityUpdateSet {
    Layout,
    Visibility,
}

// ---------------------------------------------------------------------------
// Resources and events
// ---------------------------------------------------------------------------

/// The ranked entity list as last delivered by the data layer.
///
/// Any mutation (full reload or a single added entity) regenerates the whole
/// city on the next update; nothing is patched in place.
#[derive(Resource, Debug, Clone, Default)]
pub struct EntityRoster {
    entities: Vec<CityEntity>,
}

impl EntityRoster {
    pub fn new(entities: Vec<CityEntity>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[CityEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn replace(&mut self, entities: Vec<CityEntity>) {
        self.entities = entities;
    }

    pub fn push(&mut self, entity: CityEntity) {
        self.entities.push(entity);
    }
}

/// The current generated city. Swapped as a whole on every regeneration so
/// anything derived from the previous `Arc` (spatial index, near set) can
/// detect staleness by comparing `generation`.
#[derive(Resource, Debug, Clone, Default)]
pub struct CityLayout {
    pub generation: u64,
    pub city: Arc<GeneratedCity>,
}

/// Sent after the layout has been regenerated.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRebuilt {
    pub generation: u64,
    pub buildings: usize,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Regenerate the city whenever the roster or the layout config changes.
pub fn regenerate_city(
    roster: Res<EntityRoster>,
    config: Res<LayoutConfig>,
    mut layout: ResMut<CityLayout>,
    mut rebuilt: EventWriter<LayoutRebuilt>,
) {
    if !roster.is_changed() && !config.is_changed() {
        return;
    }

    let city = generate_city(roster.entities(), &config);
    let generation = layout.generation.wrapping_add(1);
    info!(
        "City layout generation {}: {} buildings in {} blocks, {} districts, {} plazas, {} bridges, {} decorations",
        generation,
        city.buildings.len(),
        city.blocks.len(),
        city.districts.len(),
        city.plazas.len(),
        city.bridges.len(),
        city.decorations.len(),
    );

    let buildings = city.buildings.len();
    *layout = CityLayout {
        generation,
        city: Arc::new(city),
    };
    rebuilt.send(LayoutRebuilt {
        generation,
        buildings,
    });
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct LayoutPlugin;

impl Plugin for LayoutPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EntityRoster>()
            .init_resource::<LayoutConfig>()
            .init_resource::<CityLayout>()
            .add_event::<LayoutRebuilt>()
            .configure_sets(
                Update,
                (CityUpdateSet::Layout, CityUpdateSet::Visibility).chain(),
            )
            .add_systems(Update, regenerate_city.in_set(CityUpdateSet::Layout));
    }
}
