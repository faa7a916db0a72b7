//! Camera-side inputs to the near set, plus the focus readout that anchors
//! profile/compare overlays to buildings on screen.

use bevy::prelude::*;

use layout::{Building, GeneratedCity};

use crate::config::MAX_FOCUS;

/// Where the camera is and, when a renderer is attached, how it projects.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub position: Vec3,
    /// Combined projection * view matrix. `None` when headless.
    pub view_proj: Option<Mat4>,
    /// Viewport size in logical pixels.
    pub viewport: Vec2,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 120.0, 0.0),
            view_proj: None,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

impl Viewpoint {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Ground-plane position used for all radius checks.
    #[inline]
    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

/// True while the scripted intro flyover runs. Membership only grows.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlyoverMode(pub bool);

/// Identities the user has focused (profile, compare). Always in the near set.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusTargets {
    identities: Vec<String>,
}

impl FocusTargets {
    pub fn identities(&self) -> &[String] {
        &self.identities
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Replace the focus. Extra identities past [`MAX_FOCUS`] are dropped.
    pub fn set<I, S>(&mut self, identities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identities.clear();
        for id in identities {
            let id = id.into();
            if self.identities.contains(&id) {
                continue;
            }
            if self.identities.len() == MAX_FOCUS {
                warn!("Focus limited to {} entities, ignoring '{}'", MAX_FOCUS, id);
                continue;
            }
            self.identities.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.identities.clear();
    }
}

/// Screen anchor for one focused building.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusInfo {
    pub identity: String,
    pub building: u32,
    /// Straight-line distance from the viewpoint to the rooftop anchor.
    pub distance: f32,
    pub screen_x: f32,
    pub screen_y: f32,
    /// False when the anchor is behind the camera or outside the viewport.
    pub on_screen: bool,
}

/// Refreshed on every near-set tick that runs.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct FocusReadout {
    pub entries: Vec<FocusInfo>,
}

impl FocusReadout {
    pub fn get(&self, identity: &str) -> Option<&FocusInfo> {
        self.entries.iter().find(|e| e.identity == identity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Project a world point into viewport pixels (origin top-left).
///
/// Returns `None` when the point is at or behind the camera plane.
pub fn project_to_screen(view_proj: &Mat4, viewport: Vec2, world: Vec3) -> Option<Vec2> {
    let clip = *view_proj * world.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    ))
}

fn rooftop(building: &Building) -> Vec3 {
    Vec3::new(building.x, building.height, building.z)
}

/// Rebuild `readout` from the current focus. Unknown identities are skipped.
pub fn refresh_focus_readout(
    city: &GeneratedCity,
    viewpoint: &Viewpoint,
    focus: &FocusTargets,
    readout: &mut FocusReadout,
) {
    readout.entries.clear();
    for identity in focus.identities() {
        let Some(index) = city.building_index(identity) else {
            continue;
        };
        let building = &city.buildings[index];
        let anchor = rooftop(building);
        let distance = viewpoint.position.distance(anchor);

        let (screen, on_screen) = match viewpoint.view_proj {
            Some(view_proj) => match project_to_screen(&view_proj, viewpoint.viewport, anchor) {
                Some(p) => {
                    let inside = p.x >= 0.0
                        && p.y >= 0.0
                        && p.x <= viewpoint.viewport.x
                        && p.y <= viewpoint.viewport.y;
                    (p, inside)
                }
                None => (Vec2::splat(-1.0), false),
            },
            None => (Vec2::splat(-1.0), false),
        };

        readout.entries.push(FocusInfo {
            identity: identity.clone(),
            building: index as u32,
            distance,
            screen_x: screen.x,
            screen_y: screen.y,
            on_screen,
        });
    }
}
