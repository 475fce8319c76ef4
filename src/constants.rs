//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

use std::time::Duration;

/// Data layer showing the geometry of the focused quest's element
pub const GEOMETRY_LAYER: &str = "streetcomplete_geometry";

/// Data layer holding all pickable quest pins
pub const QUESTS_LAYER: &str = "streetcomplete_quests";

/// Data layer holding the pins of the focused quest
pub const SELECTED_QUESTS_LAYER: &str = "streetcomplete_selected_quests";

/// Never zoom in further than this when focusing a quest
pub const MAX_FOCUS_ZOOM: f32 = 20.0;

/// Geometry already on screen is not zoomed to unless it would gain this many zoom levels
pub const MIN_FOCUS_ZOOM_DELTA: f32 = 2.0;

/// Camera animation time per zoom level travelled
pub const ZOOM_TIME_PER_LEVEL_MS: f32 = 300.0;

/// Shortest animation when moving the camera onto a quest
pub const MIN_FOCUS_ANIMATION: Duration = Duration::from_millis(450);

/// Shortest animation when moving the camera back after a quest
pub const MIN_RESTORE_ANIMATION: Duration = Duration::from_millis(300);

/// Animation used when centering the map on the user's location
pub const CENTER_POSITION_ANIMATION: Duration = Duration::from_millis(600);

/// Size of the area (in dp) a finger covers when tapping the map
pub const CLICK_AREA_SIZE_DP: f32 = 48.0;

/// Vertical offset of the selection ring so it surrounds the pin head, not the pin tip
pub const SELECTION_RING_OFFSET_PX: f32 = -38.0;

/// Maximum zoom level the scene surface can display
pub const MAX_SURFACE_ZOOM: f32 = 23.0;

/// Tile edge length in pixels at zoom 0
pub const TILE_SIZE_PX: f64 = 256.0;

/// Mean earth radius in meters, used for distances between coordinates
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
