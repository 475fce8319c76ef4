//! The render surface the quests map draws onto.
//!
//! [`RenderSurface`] is everything the quest controller needs from a vector map
//! engine: data layers, markers, label/marker picking, projection and camera
//! animation. Layers and markers are addressed by id handles owned by the
//! surface. [`SceneSurface`] is an in-process implementation used by the demo
//! binary and the tests.

mod scene;

pub use scene::{CameraAnimation, SceneMarker, SceneSurface};

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraPose, CameraUpdate, Easing};
use crate::geo::{BoundingBox, LatLon};

/// Key-value properties attached to a feature, returned when its label is picked
pub type Properties = BTreeMap<String, String>;

/// Pending result of a pick query. Polled once per frame until ready.
pub type PickFuture<T> = Pin<Box<dyn Future<Output = T> + Send + Sync + 'static>>;

/// Handle to a data layer created on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u32);

/// Handle to a marker created on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(LatLon),
    Polyline(Vec<LatLon>),
    /// Outer ring first, then holes
    Polygon(Vec<Vec<LatLon>>),
}

/// A geometry with properties, as put into a data layer
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub properties: Properties,
}

impl Feature {
    pub fn point(position: LatLon, properties: Properties) -> Self {
        Self {
            geometry: FeatureGeometry::Point(position),
            properties,
        }
    }
}

/// Screen space (in px) covered by UI on each side of the map
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportInsets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ViewportInsets {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// A bitmap used for a marker, with its intrinsic size in pixels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub name: String,
    pub width_px: u32,
    pub height_px: u32,
}

/// Styling of a marker as understood by the scene
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub style: String,
    pub color: String,
    pub size: Vec2,
    pub flat: bool,
    pub collide: bool,
    pub offset: Vec2,
}

impl MarkerStyle {
    /// Scene-language representation of this style
    pub fn to_scene_string(&self) -> String {
        format!(
            "{{ style: '{}', color: '{}', size: [{}px, {}px], flat: {}, collide: {}, offset: ['{}px', '{}px'] }}",
            self.style,
            self.color,
            self.size.x,
            self.size.y,
            self.flat,
            self.collide,
            self.offset.x,
            self.offset.y
        )
    }
}

/// A live vector map. All calls happen on the thread that owns the map.
pub trait RenderSurface {
    fn add_data_layer(&mut self, name: &str) -> LayerId;
    fn set_layer_features(&mut self, layer: LayerId, features: Vec<Feature>);
    fn clear_layer(&mut self, layer: LayerId);

    /// Create a new, invisible marker. Fails when the surface cannot hold more.
    fn add_marker(&mut self) -> Option<MarkerId>;
    fn remove_marker(&mut self, marker: MarkerId);
    fn set_marker_styling(&mut self, marker: MarkerId, style: &MarkerStyle);
    fn set_marker_icon(&mut self, marker: MarkerId, icon: &MarkerIcon);
    fn set_marker_point(&mut self, marker: MarkerId, position: LatLon);
    fn set_marker_visible(&mut self, marker: MarkerId, visible: bool);

    /// Properties of the topmost label at the screen position
    fn pick_label_at(&self, screen: Vec2) -> PickFuture<Option<Properties>>;
    /// Topmost visible marker at the screen position
    fn pick_marker_at(&self, screen: Vec2) -> PickFuture<Option<MarkerId>>;

    fn screen_to_geo(&self, screen: Vec2) -> Option<LatLon>;
    /// Camera pose that shows all of `bounds` within the viewport minus `insets`
    fn enclosing_camera_pose(
        &self,
        bounds: &BoundingBox,
        insets: &ViewportInsets,
    ) -> Option<CameraPose>;
    /// Whether all of `bounds` is visible within the viewport minus `insets`
    fn screen_area_contains(&self, bounds: &BoundingBox, insets: &ViewportInsets) -> bool;

    fn camera_pose(&self) -> CameraPose;
    fn animate_camera(&mut self, update: CameraUpdate, duration: Duration, easing: Easing);

    /// Physical pixels per density-independent pixel
    fn display_density(&self) -> f32;

    /// Advance running animations by one frame
    fn advance(&mut self, _delta: Duration) {}
}
