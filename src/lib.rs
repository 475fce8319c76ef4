//! Quest focus, pin picking and camera handling for a map of OSM quests.
//!
//! [`quests_map::QuestsMap`] is the controller; it drives any
//! [`surface::RenderSurface`]. [`plugin::QuestMapPlugin`] runs it inside a
//! Bevy app.

pub mod camera;
pub mod config;
pub mod constants;
pub mod data;
pub mod geo;
pub mod osm;
pub mod paths;
pub mod plugin;
pub mod quest;
pub mod quests_map;
pub mod surface;
