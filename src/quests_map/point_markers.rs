//! Markers placed while answering the focused quest, one per position.

use std::collections::HashMap;

use bevy::math::Vec2;

use crate::geo::LatLon;
use crate::surface::{MarkerIcon, MarkerId, MarkerStyle, RenderSurface};

#[derive(Default)]
pub struct PointMarkers {
    markers: HashMap<(u64, u64), MarkerId>,
}

impl PointMarkers {
    fn style(icon: &MarkerIcon, density: f32) -> MarkerStyle {
        MarkerStyle {
            style: "points".to_string(),
            color: "white".to_string(),
            size: Vec2::new(icon.width_px as f32, icon.height_px as f32) / density,
            flat: false,
            collide: false,
            offset: Vec2::ZERO,
        }
    }

    /// Put a marker with `icon` at `pos`, replacing the icon of one already there
    pub fn put<S: RenderSurface>(&mut self, surface: &mut S, pos: LatLon, icon: &MarkerIcon) {
        let style = Self::style(icon, surface.display_density());
        let marker = match self.markers.get(&pos.key()) {
            Some(&marker) => marker,
            None => {
                let Some(marker) = surface.add_marker() else {
                    return;
                };
                surface.set_marker_point(marker, pos);
                surface.set_marker_visible(marker, true);
                self.markers.insert(pos.key(), marker);
                marker
            }
        };
        surface.set_marker_styling(marker, &style);
        surface.set_marker_icon(marker, icon);
    }

    pub fn delete<S: RenderSurface>(&mut self, surface: &mut S, pos: LatLon) {
        if let Some(marker) = self.markers.remove(&pos.key()) {
            surface.remove_marker(marker);
        }
    }

    pub fn clear<S: RenderSurface>(&mut self, surface: &mut S) {
        for (_, marker) in self.markers.drain() {
            surface.remove_marker(marker);
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
