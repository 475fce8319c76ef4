//! The quests map: pins, the focused quest and camera handling on a render surface.
//!
//! ## Module Structure
//!
//! - [`focus`] - Camera moves onto a quest and back
//! - [`selection`] - Selection rings around the focused quest's pins
//! - [`point_markers`] - Markers placed while answering a quest
//! - [`pick`] - Resolving taps to quests or map clicks
//! - [`pins`] - Pin features and the properties identifying quests
//! - [`listener`] - Receivers of tap outcomes
//!
//! The surface only exists between [`QuestsMap::on_map_ready`] and
//! [`QuestsMap::on_map_destroyed`]. Every operation is a no-op while it is
//! absent.

mod focus;
mod listener;
mod pick;
mod pins;
mod point_markers;
mod selection;


pub use focus::FocusSession;
pub use listener::{PickOutbox, PickOutcome, QuestsMapListener};
pub use pick::{PickDispatcher, finger_radius_px};
pub use pins::{
    MARKER_ELEMENT_ID, MARKER_ELEMENT_TYPE, MARKER_NOTE_ID, MARKER_QUEST_TYPE,
    quest_key_from_properties, quest_pin_features, selected_pin_features,
};
pub use point_markers::PointMarkers;
pub use selection::SelectionMarkers;

use std::time::Duration;

use bevy::prelude::*;

use crate::camera::{CameraHistory, CameraPose, CameraUpdate, Easing};
use crate::constants::{
    CENTER_POSITION_ANIMATION, GEOMETRY_LAYER, QUESTS_LAYER, SELECTED_QUESTS_LAYER,
};
use crate::geo::LatLon;
use crate::quest::{Quest, QuestKey};
use crate::surface::{LayerId, MarkerIcon, RenderSurface, ViewportInsets};

/// A ready surface together with everything created on it
pub struct MapHandle<S> {
    surface: S,
    geometry_layer: LayerId,
    quests_layer: LayerId,
    selected_pins_layer: LayerId,
    selection: SelectionMarkers,
    point_markers: PointMarkers,
}

impl<S: RenderSurface> MapHandle<S> {
    fn new(mut surface: S, selection_ring: MarkerIcon) -> Self {
        let geometry_layer = surface.add_data_layer(GEOMETRY_LAYER);
        let quests_layer = surface.add_data_layer(QUESTS_LAYER);
        let selected_pins_layer = surface.add_data_layer(SELECTED_QUESTS_LAYER);
        let selection = SelectionMarkers::new(selection_ring, surface.display_density());
        Self {
            surface,
            geometry_layer,
            quests_layer,
            selected_pins_layer,
            selection,
            point_markers: PointMarkers::default(),
        }
    }

    fn clear_focus(&mut self) {
        self.surface.clear_layer(self.geometry_layer);
        self.point_markers.clear(&mut self.surface);
        self.selection.hide(&mut self.surface);
        self.surface.clear_layer(self.selected_pins_layer);
    }
}

/// Whether the map follows the user's location, and the last known location
#[derive(Debug, Default, Clone)]
struct PositionTracking {
    following: bool,
    location: Option<LatLon>,
}

/// Controller for the map showing quest pins and the focused quest
#[derive(Resource)]
pub struct QuestsMap<S, L> {
    map: Option<MapHandle<S>>,
    listener: L,
    selection_ring: MarkerIcon,
    camera_history: CameraHistory,
    focus: Option<FocusSession>,
    picks: PickDispatcher,
    tracking: PositionTracking,
}

impl<S: RenderSurface, L: QuestsMapListener> QuestsMap<S, L> {
    pub fn new(listener: L, selection_ring: MarkerIcon) -> Self {
        Self {
            map: None,
            listener,
            selection_ring,
            camera_history: CameraHistory::default(),
            focus: None,
            picks: PickDispatcher::default(),
            tracking: PositionTracking::default(),
        }
    }

    /// Take ownership of a surface that finished loading and set up the layers on it
    pub fn on_map_ready(&mut self, surface: S) {
        if self.map.is_some() {
            warn!("Map ready while a previous surface is still attached, replacing it");
            self.on_map_destroyed();
        }
        self.map = Some(MapHandle::new(surface, self.selection_ring.clone()));
        info!("Quests map ready");
    }

    /// Release the surface. Pending taps are discarded and the focus is dropped;
    /// the camera pose to restore is kept.
    pub fn on_map_destroyed(&mut self) -> Option<S> {
        let map = self.map.take()?;
        let discarded = self.picks.pending();
        self.picks.discard();
        self.focus = None;
        info!("Quests map destroyed, discarded {} pending picks", discarded);
        Some(map.surface)
    }

    pub fn is_map_ready(&self) -> bool {
        self.map.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.map.as_ref().map(|m| &m.surface)
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.map.as_mut().map(|m| &mut m.surface)
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Advance camera animations on the surface by one frame
    pub fn advance(&mut self, delta: Duration) {
        if let Some(map) = self.map.as_mut() {
            map.surface.advance(delta);
        }
    }

    /// Start resolving a confirmed single tap. The outcome reaches the listener
    /// from [`QuestsMap::poll_picks`].
    pub fn on_single_tap_confirmed(&mut self, screen: Vec2) -> bool {
        let Some(map) = self.map.as_ref() else {
            return false;
        };
        self.picks.start(&map.surface, screen);
        true
    }

    /// Poll pending taps once and report the ones that resolved
    pub fn poll_picks(&mut self) {
        let Some(map) = self.map.as_ref() else {
            return;
        };
        for outcome in self.picks.poll(&map.surface) {
            match outcome {
                PickOutcome::QuestPicked(key) => {
                    debug!("Picked quest {:?}", key);
                    self.listener.on_quest_picked(key);
                }
                PickOutcome::MapClicked { position, radius_m } => {
                    debug!("Clicked map at {:?} (radius {:.1}m)", position, radius_m);
                    self.listener.on_map_clicked(position, radius_m);
                }
            }
        }
    }

    pub fn pending_picks(&self) -> usize {
        self.picks.pending()
    }

    /// Replace the pickable pins with those of `quests`
    pub fn set_quest_pins(&mut self, quests: &[Quest]) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let features = quests.iter().flat_map(quest_pin_features).collect();
        map.surface.set_layer_features(map.quests_layer, features);
    }

    /// Highlight `quest` and move the camera onto it. A quest that is already
    /// focused is cleared first; the camera pose from before the first focus is kept.
    pub fn start_focus_quest(&mut self, quest: &Quest, offset: ViewportInsets) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if let Some(previous) = self.focus.take() {
            debug!("Replacing focus on {:?}", previous.key);
            map.clear_focus();
        }

        if let Some(before) = focus::zoom_and_move_to_contain(&mut map.surface, &quest.geometry, &offset) {
            self.camera_history.remember(before);
        }
        let marker_count = map.selection.show(&mut map.surface, &quest.marker_locations);
        map.surface
            .set_layer_features(map.selected_pins_layer, selected_pin_features(quest));
        map.surface
            .set_layer_features(map.geometry_layer, quest.geometry.to_features());

        info!("Focused quest {:?}", quest.key);
        self.focus = Some(FocusSession {
            key: quest.key.clone(),
            geometry: quest.geometry.clone(),
            marker_count,
        });
    }

    /// Remove the focused quest's highlighting but do not move the camera back yet
    pub fn clear_focus_quest(&mut self) {
        self.focus = None;
        if let Some(map) = self.map.as_mut() {
            map.clear_focus();
        }
    }

    /// Clear the focus, return the camera to where it was and resume following the user
    pub fn end_focus_quest(&mut self) {
        self.clear_focus_quest();
        self.restore_camera_pose();
        self.center_current_position_if_following();
    }

    fn restore_camera_pose(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if let Some(pose) = self.camera_history.take() {
            debug!("Restoring camera to {:?}", pose);
            focus::restore_camera_pose(&mut map.surface, &pose);
        }
    }

    pub fn focus(&self) -> Option<&FocusSession> {
        self.focus.as_ref()
    }

    pub fn focused_quest(&self) -> Option<&QuestKey> {
        self.focus.as_ref().map(|f| &f.key)
    }

    /// Camera pose that will be restored when the focus ends
    pub fn camera_pose_before_focus(&self) -> Option<&CameraPose> {
        self.camera_history.peek()
    }

    pub fn put_marker_for_current_quest(&mut self, pos: LatLon, icon: &MarkerIcon) {
        if let Some(map) = self.map.as_mut() {
            map.point_markers.put(&mut map.surface, pos, icon);
        }
    }

    pub fn delete_marker_for_current_quest(&mut self, pos: LatLon) {
        if let Some(map) = self.map.as_mut() {
            map.point_markers.delete(&mut map.surface, pos);
        }
    }

    pub fn clear_markers_for_current_quest(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.point_markers.clear(&mut map.surface);
        }
    }

    pub fn set_follow_position(&mut self, following: bool) {
        self.tracking.following = following;
        self.center_current_position_if_following();
    }

    pub fn is_following_position(&self) -> bool {
        self.tracking.following
    }

    /// New location of the user. Recenters the map if following.
    pub fn set_display_location(&mut self, location: Option<LatLon>) {
        self.tracking.location = location;
        self.center_current_position_if_following();
    }

    /// Whether the map may be centered on the user. Never while a camera pose
    /// is waiting to be restored after showing a quest.
    pub fn should_center_current_position(&self) -> bool {
        self.tracking.following
            && self.tracking.location.is_some()
            && !self.camera_history.is_pending()
    }

    pub fn center_current_position_if_following(&mut self) {
        if !self.should_center_current_position() {
            return;
        }
        let (Some(map), Some(location)) = (self.map.as_mut(), self.tracking.location) else {
            return;
        };
        map.surface.animate_camera(
            CameraUpdate {
                position: Some(location),
                ..Default::default()
            },
            CENTER_POSITION_ANIMATION,
            Easing::Decelerate,
        );
    }
}
