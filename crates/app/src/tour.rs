//! Scripted camera tour for the headless binary.
//!
//! The first third of the tour orbits the city in flyover mode. The rest is
//! a low ground sweep between the two top-ranked buildings with both of them
//! focused. Near-set churn and focus readouts are logged as it goes.

use std::f32::consts::{FRAC_PI_4, TAU};
use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;

use layout::{CityLayout, CityUpdateSet, GeneratedCity, LayoutRebuilt};
use visibility::{FlyoverMode, FocusReadout, FocusTargets, NearSetChanged, Viewpoint};

const ORBIT_HEIGHT: f32 = 900.0;
const SWEEP_HEIGHT: f32 = 40.0;
const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Resource, Debug, Clone)]
pub struct Tour {
    pub duration: Duration,
    pub dump_path: Option<PathBuf>,
    last_report: Duration,
}

impl Tour {
    pub fn new(duration: Duration, dump_path: Option<PathBuf>) -> Self {
        Self {
            duration,
            dump_path,
            last_report: Duration::ZERO,
        }
    }

    /// End of the flyover intro.
    fn intro_end(&self) -> Duration {
        self.duration / 3
    }
}

/// Planar radius that encloses every block.
fn city_radius(city: &GeneratedCity) -> f32 {
    city.blocks
        .iter()
        .map(|b| Vec2::new(b.center_x, b.center_z).length())
        .fold(0.0, f32::max)
        + 200.0
}

/// The two best-ranked buildings, best first.
fn top_two(city: &GeneratedCity) -> Vec<usize> {
    let mut order: Vec<usize> = (0..city.buildings.len()).collect();
    order.sort_by_key(|&i| (city.buildings[i].rank, i));
    order.truncate(2);
    order
}

fn camera(eye: Vec3, target: Vec3) -> Option<Mat4> {
    if eye.distance_squared(target) < f32::EPSILON {
        return None;
    }
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    let proj = Mat4::perspective_rh(FRAC_PI_4, VIEWPORT.x / VIEWPORT.y, 1.0, 20_000.0);
    Some(proj * view)
}

/// Position the viewpoint for the current moment of the tour.
pub fn drive_tour(
    time: Res<Time>,
    tour: Res<Tour>,
    layout: Res<CityLayout>,
    mut viewpoint: ResMut<Viewpoint>,
    mut flyover: ResMut<FlyoverMode>,
    mut focus: ResMut<FocusTargets>,
) {
    let city = &layout.city;
    if city.is_empty() {
        return;
    }
    let now = time.elapsed();
    let intro_end = tour.intro_end();

    if now < intro_end {
        let t = now.as_secs_f32() / intro_end.as_secs_f32().max(f32::EPSILON);
        let angle = t * TAU;
        let radius = city_radius(city);
        let eye = Vec3::new(angle.cos() * radius, ORBIT_HEIGHT, angle.sin() * radius);
        *viewpoint = Viewpoint {
            position: eye,
            view_proj: camera(eye, Vec3::ZERO),
            viewport: VIEWPORT,
        };
        if !flyover.0 {
            flyover.0 = true;
        }
        return;
    }

    if flyover.0 {
        flyover.0 = false;
        let top = top_two(city);
        focus.set(top.iter().map(|&i| city.buildings[i].identity.clone()));
        info!("Flyover finished, focusing {:?}", focus.identities());
    }

    let top = top_two(city);
    let from = city.buildings[top[0]].position();
    let to = top
        .get(1)
        .map_or(from + Vec3::new(600.0, 0.0, 0.0), |&i| city.buildings[i].position());

    // Ping-pong between the two buildings.
    let sweep = (tour.duration - intro_end).as_secs_f32().max(f32::EPSILON);
    let phase = ((now - intro_end).as_secs_f32() / sweep * 2.0).fract();
    let s = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
    let ground = from.lerp(to, s);
    let eye = Vec3::new(ground.x, SWEEP_HEIGHT, ground.z + 120.0);

    *viewpoint = Viewpoint {
        position: eye,
        view_proj: camera(eye, Vec3::new(to.x, 0.0, to.z)),
        viewport: VIEWPORT,
    };
}

pub fn report_near_set(mut changes: EventReader<NearSetChanged>) {
    for change in changes.read() {
        info!(
            "Near set gen {}: +{} -{} ({} deferred) -> {} buildings",
            change.generation, change.admitted, change.evicted, change.deferred, change.total
        );
    }
}

pub fn report_focus(time: Res<Time>, mut tour: ResMut<Tour>, readout: Res<FocusReadout>) {
    let now = time.elapsed();
    if now.saturating_sub(tour.last_report) < REPORT_INTERVAL {
        return;
    }
    tour.last_report = now;
    for info in &readout.entries {
        info!(
            "Focus {} (building {}): {:.0}m away, screen ({:.0}, {:.0}){}",
            info.identity,
            info.building,
            info.distance,
            info.screen_x,
            info.screen_y,
            if info.on_screen { "" } else { " off-screen" }
        );
    }
}

/// Write the generated city to `dump_path` after each regeneration.
pub fn dump_city(
    mut rebuilt: EventReader<LayoutRebuilt>,
    tour: Res<Tour>,
    layout: Res<CityLayout>,
) {
    let Some(last) = rebuilt.read().last() else {
        return;
    };
    let Some(path) = tour.dump_path.as_ref() else {
        return;
    };
    let json = match serde_json::to_vec_pretty(layout.city.as_ref()) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize city generation {}: {}", last.generation, e);
            return;
        }
    };
    match std::fs::write(path, json) {
        Ok(()) => info!(
            "Wrote city generation {} ({} buildings) to {}",
            last.generation,
            last.buildings,
            path.display()
        ),
        Err(e) => warn!("Failed to write {}: {}", path.display(), e),
    }
}

pub fn finish_tour(time: Res<Time>, tour: Res<Tour>, mut exit: EventWriter<AppExit>) {
    if time.elapsed() >= tour.duration {
        info!("Tour finished after {:.1}s", time.elapsed_secs());
        exit.send(AppExit::Success);
    }
}

pub struct TourPlugin {
    pub tour: Tour,
}

impl Plugin for TourPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.tour.clone())
            .add_systems(Update, drive_tour.before(CityUpdateSet::Visibility))
            .add_systems(
                Update,
                (report_near_set, report_focus, dump_city, finish_tour)
                    .after(CityUpdateSet::Visibility),
            );
    }
}
