//! Moving the camera onto a quest and back.

use bevy::log::debug;

use crate::camera::{CameraPose, CameraUpdate, Easing, zoom_animation_duration};
use crate::constants::{
    MAX_FOCUS_ZOOM, MIN_FOCUS_ANIMATION, MIN_FOCUS_ZOOM_DELTA, MIN_RESTORE_ANIMATION,
};
use crate::osm::ElementGeometry;
use crate::quest::QuestKey;
use crate::surface::{RenderSurface, ViewportInsets};

/// The quest currently highlighted on the map
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSession {
    pub key: QuestKey,
    pub geometry: ElementGeometry,
    /// Number of selection rings shown for it
    pub marker_count: usize,
}

/// Animate the camera so `geometry` fills the viewport minus `offset`, unless
/// it is already nicely in view. Returns the pose before the animation if one
/// was started.
pub fn zoom_and_move_to_contain<S: RenderSurface>(
    surface: &mut S,
    geometry: &ElementGeometry,
    offset: &ViewportInsets,
) -> Option<CameraPose> {
    let bounds = geometry.bounds();
    let target = surface.enclosing_camera_pose(&bounds, offset)?;
    let current = surface.camera_pose();
    let target_zoom = target.zoom.min(MAX_FOCUS_ZOOM);

    if surface.screen_area_contains(&bounds, offset) && target_zoom - current.zoom < MIN_FOCUS_ZOOM_DELTA {
        debug!("Quest geometry already in view, not moving camera");
        return None;
    }

    let duration = zoom_animation_duration(current.zoom, target_zoom, MIN_FOCUS_ANIMATION);
    debug!(
        "Zooming from {} to {} over {:?}",
        current.zoom, target_zoom, duration
    );
    surface.animate_camera(
        CameraUpdate {
            position: Some(target.position),
            zoom: Some(target_zoom),
            ..Default::default()
        },
        duration,
        Easing::AccelerateDecelerate,
    );
    Some(current)
}

/// Animate the camera back to `pose`, restoring position, zoom, tilt and rotation together
pub fn restore_camera_pose<S: RenderSurface>(surface: &mut S, pose: &CameraPose) {
    let current = surface.camera_pose();
    let duration = zoom_animation_duration(current.zoom, pose.zoom, MIN_RESTORE_ANIMATION);
    surface.animate_camera(
        CameraUpdate::to_pose(pose),
        duration,
        Easing::AccelerateDecelerate,
    );
}
