use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use layout::{EntityRoster, LayoutPlugin};
use visibility::VisibilityPlugin;

mod roster;
mod tour;

use tour::{Tour, TourPlugin};

const DEFAULT_TOUR_SECS: f32 = 30.0;

/// Parse `name` from the environment, falling back to `default` when it is
/// unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring {}={:?}: not a valid value", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn main() {
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
        LogPlugin::default(),
    ))
    .add_plugins((LayoutPlugin, VisibilityPlugin));

    // Roster: SKYLINE_ROSTER file, or a synthetic one when that is missing or broken.
    let seed = env_or("SKYLINE_SEED", roster::DEFAULT_SEED);
    let count = env_or("SKYLINE_ENTITIES", roster::DEFAULT_ENTITY_COUNT);
    let entities = match std::env::var_os("SKYLINE_ROSTER").map(PathBuf::from) {
        Some(path) => match roster::load_roster(&path) {
            Ok(entities) => {
                info!("Loaded {} entities from {}", entities.len(), path.display());
                entities
            }
            Err(e) => {
                warn!("Roster unavailable ({}), using synthetic roster", e);
                roster::synthetic_roster(seed, count)
            }
        },
        None => {
            info!("Synthesizing {} entities (seed {})", count, seed);
            roster::synthetic_roster(seed, count)
        }
    };
    app.insert_resource(EntityRoster::new(entities));

    let tour_secs = env_or("SKYLINE_TOUR_SECS", DEFAULT_TOUR_SECS);
    let duration = if tour_secs.is_finite() && tour_secs > 0.0 {
        Duration::from_secs_f32(tour_secs)
    } else {
        warn!("SKYLINE_TOUR_SECS must be positive, using {}", DEFAULT_TOUR_SECS);
        Duration::from_secs_f32(DEFAULT_TOUR_SECS)
    };
    let dump_path = std::env::var_os("SKYLINE_DUMP").map(PathBuf::from);

    app.add_plugins(TourPlugin {
        tour: Tour::new(duration, dump_path),
    });

    app.run();
}
