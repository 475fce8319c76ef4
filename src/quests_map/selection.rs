//! Ring markers highlighting the pins of the focused quest.

use bevy::math::Vec2;
use bevy::log::warn;

use crate::constants::SELECTION_RING_OFFSET_PX;
use crate::geo::LatLon;
use crate::surface::{MarkerIcon, MarkerId, MarkerStyle, RenderSurface};

/// Selection ring markers. Markers are created on demand and only ever hidden,
/// never removed, so showing a quest again is cheap.
pub struct SelectionMarkers {
    markers: Vec<MarkerId>,
    icon: MarkerIcon,
    style: MarkerStyle,
}

impl SelectionMarkers {
    pub fn new(icon: MarkerIcon, density: f32) -> Self {
        let style = MarkerStyle {
            style: "quest-selection".to_string(),
            color: "white".to_string(),
            size: Vec2::new(icon.width_px as f32, icon.height_px as f32) / density,
            flat: false,
            collide: false,
            offset: Vec2::new(0.0, SELECTION_RING_OFFSET_PX),
        };
        Self {
            markers: Vec::new(),
            icon,
            style,
        }
    }

    fn create<S: RenderSurface>(&self, surface: &mut S) -> Option<MarkerId> {
        let marker = surface.add_marker()?;
        surface.set_marker_styling(marker, &self.style);
        surface.set_marker_icon(marker, &self.icon);
        Some(marker)
    }

    /// Show one ring per position. Returns how many could be shown.
    pub fn show<S: RenderSurface>(&mut self, surface: &mut S, positions: &[LatLon]) -> usize {
        while self.markers.len() < positions.len() {
            let Some(marker) = self.create(surface) else {
                warn!(
                    "Could only create {} of {} selection markers",
                    self.markers.len(),
                    positions.len()
                );
                break;
            };
            self.markers.push(marker);
        }

        for (i, &marker) in self.markers.iter().enumerate() {
            match positions.get(i) {
                Some(pos) => {
                    surface.set_marker_point(marker, *pos);
                    surface.set_marker_visible(marker, true);
                }
                None => surface.set_marker_visible(marker, false),
            }
        }
        self.markers.len().min(positions.len())
    }

    pub fn hide<S: RenderSurface>(&self, surface: &mut S) {
        for &marker in &self.markers {
            surface.set_marker_visible(marker, false);
        }
    }

    /// Number of markers created so far
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraPose;
    use crate::surface::SceneSurface;

    fn ring() -> MarkerIcon {
        MarkerIcon {
            name: "quest_selection_ring".to_string(),
            width_px: 96,
            height_px: 96,
        }
    }

    fn surface() -> SceneSurface {
        SceneSurface::new(
            Vec2::new(800.0, 600.0),
            2.0,
            CameraPose::new(LatLon::new(0.0, 0.0), 15.0),
        )
    }

    fn positions(n: usize) -> Vec<LatLon> {
        (0..n).map(|i| LatLon::new(0.0, i as f64 * 0.001)).collect()
    }

    #[test]
    fn test_style_uses_icon_size_in_dp() {
        let markers = SelectionMarkers::new(ring(), 2.0);
        assert_eq!(markers.style().size, Vec2::new(48.0, 48.0));
        assert_eq!(markers.style().offset, Vec2::new(0.0, -38.0));
    }

    #[test]
    fn test_show_exactly_n_visible() {
        let mut s = surface();
        let mut markers = SelectionMarkers::new(ring(), 2.0);
        assert_eq!(markers.show(&mut s, &positions(3)), 3);
        assert_eq!(s.visible_markers().len(), 3);

        // Shrinking hides the surplus without destroying it
        assert_eq!(markers.show(&mut s, &positions(1)), 1);
        assert_eq!(s.visible_markers().len(), 1);
        assert_eq!(s.marker_count(), 3);
        assert_eq!(markers.len(), 3);
    }

    #[test]
    fn test_markers_are_reused() {
        let mut s = surface();
        let mut markers = SelectionMarkers::new(ring(), 2.0);
        markers.show(&mut s, &positions(2));
        markers.hide(&mut s);
        assert!(s.visible_markers().is_empty());
        markers.show(&mut s, &positions(2));
        assert_eq!(s.marker_count(), 2);
        assert_eq!(s.visible_markers().len(), 2);
    }

    #[test]
    fn test_show_degrades_when_creation_fails() {
        let mut s = surface().with_max_markers(2);
        let mut markers = SelectionMarkers::new(ring(), 2.0);
        assert_eq!(markers.show(&mut s, &positions(4)), 2);
        assert_eq!(s.visible_markers().len(), 2);
    }
}
