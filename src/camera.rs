//! Camera poses, animated camera updates and the pre-focus camera history.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::ZOOM_TIME_PER_LEVEL_MS;
use crate::geo::LatLon;

/// Full camera state of the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: LatLon,
    pub zoom: f32,
    /// Tilt in radians, 0 looks straight down
    pub tilt: f32,
    /// Rotation in radians, counter-clockwise
    pub rotation: f32,
}

impl CameraPose {
    pub fn new(position: LatLon, zoom: f32) -> Self {
        Self {
            position,
            zoom,
            tilt: 0.0,
            rotation: 0.0,
        }
    }

    /// Apply `update` on top of this pose
    pub fn updated(&self, update: &CameraUpdate) -> CameraPose {
        CameraPose {
            position: update.position.unwrap_or(self.position),
            zoom: update.zoom.unwrap_or(self.zoom),
            tilt: update.tilt.unwrap_or(self.tilt),
            rotation: update.rotation.unwrap_or(self.rotation),
        }
    }
}

/// A partial camera change. Fields left `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraUpdate {
    pub position: Option<LatLon>,
    pub zoom: Option<f32>,
    pub tilt: Option<f32>,
    pub rotation: Option<f32>,
}

impl CameraUpdate {
    /// Update that sets every field of `pose`
    pub fn to_pose(pose: &CameraPose) -> Self {
        Self {
            position: Some(pose.position),
            zoom: Some(pose.zoom),
            tilt: Some(pose.tilt),
            rotation: Some(pose.rotation),
        }
    }
}

/// Interpolation curve of a camera animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    AccelerateDecelerate,
    Decelerate,
}

impl Easing {
    /// Map linear progress `t` in `0..=1` onto the curve
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::AccelerateDecelerate => ((t + 1.0) * std::f32::consts::PI).cos() / 2.0 + 0.5,
            Easing::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Duration of a zoom animation: 300ms per zoom level, but at least `min`
pub fn zoom_animation_duration(from_zoom: f32, to_zoom: f32, min: Duration) -> Duration {
    let ms = ((from_zoom - to_zoom).abs() * ZOOM_TIME_PER_LEVEL_MS).round() as u64;
    Duration::from_millis(ms).max(min)
}

/// Remembers where the camera was before a quest was focused
#[derive(Debug, Default, Clone)]
pub struct CameraHistory {
    saved: Option<CameraPose>,
}

impl CameraHistory {
    /// Remember `pose` unless a pose is already waiting to be restored
    pub fn remember(&mut self, pose: CameraPose) {
        if self.saved.is_none() {
            self.saved = Some(pose);
        }
    }

    /// Take the remembered pose, leaving the history empty
    pub fn take(&mut self) -> Option<CameraPose> {
        self.saved.take()
    }

    /// Whether a pose is waiting to be restored
    pub fn is_pending(&self) -> bool {
        self.saved.is_some()
    }

    pub fn peek(&self) -> Option<&CameraPose> {
        self.saved.as_ref()
    }
}
