//! In-process Web Mercator map with layers, markers and an animated camera.

use std::collections::HashSet;
use std::time::Duration;

use bevy::math::{DVec2, Vec2};
use futures_lite::future;

use crate::camera::{CameraPose, CameraUpdate, Easing};
use crate::constants::{MAX_SURFACE_ZOOM, QUESTS_LAYER};
use crate::geo::{BoundingBox, LatLon, from_world, to_world};

use super::{
    Feature, FeatureGeometry, LayerId, MarkerIcon, MarkerId, MarkerStyle, PickFuture, Properties,
    RenderSurface, ViewportInsets,
};

/// Half the edge length (in dp) of the square a pin label occupies around its point
const LABEL_HALF_EXTENT_DP: f32 = 16.0;

/// Marker hit area when the marker has no explicit size
const DEFAULT_MARKER_SIZE_PX: f32 = 32.0;

/// A camera animation in progress
#[derive(Debug, Clone, PartialEq)]
pub struct CameraAnimation {
    pub from: CameraPose,
    pub to: CameraPose,
    pub duration: Duration,
    pub elapsed: Duration,
    pub easing: Easing,
}

impl CameraAnimation {
    fn pose_at(&self, progress: f32) -> CameraPose {
        let t = self.easing.apply(progress);
        let lerp32 = |a: f32, b: f32| a + (b - a) * t;
        let lerp64 = |a: f64, b: f64| a + (b - a) * t as f64;
        CameraPose {
            position: LatLon::new(
                lerp64(self.from.position.latitude, self.to.position.latitude),
                lerp64(self.from.position.longitude, self.to.position.longitude),
            ),
            zoom: lerp32(self.from.zoom, self.to.zoom),
            tilt: lerp32(self.from.tilt, self.to.tilt),
            rotation: lerp32(self.from.rotation, self.to.rotation),
        }
    }
}

/// A marker as held by the scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMarker {
    pub point: Option<LatLon>,
    pub visible: bool,
    pub style: Option<MarkerStyle>,
    pub icon: Option<MarkerIcon>,
}

struct SceneLayer {
    name: String,
    features: Vec<Feature>,
}

/// Software model of a vector map surface
pub struct SceneSurface {
    /// Screen size in physical pixels
    size: Vec2,
    density: f32,
    pose: CameraPose,
    animation: Option<CameraAnimation>,
    issued_animations: Vec<CameraAnimation>,
    layers: Vec<SceneLayer>,
    interactive_layers: HashSet<String>,
    markers: Vec<Option<SceneMarker>>,
    max_markers: Option<usize>,
    /// Number of polls a pick query stays pending
    pick_latency: u32,
}

impl SceneSurface {
    pub fn new(size: Vec2, density: f32, pose: CameraPose) -> Self {
        Self {
            size,
            density,
            pose,
            animation: None,
            issued_animations: Vec::new(),
            layers: Vec::new(),
            interactive_layers: HashSet::from([QUESTS_LAYER.to_string()]),
            markers: Vec::new(),
            max_markers: None,
            pick_latency: 0,
        }
    }

    /// Labels of features on this layer can be picked
    pub fn with_interactive_layer(mut self, name: &str) -> Self {
        self.interactive_layers.insert(name.to_string());
        self
    }

    /// Limit the number of live markers; further creation fails
    pub fn with_max_markers(mut self, max: usize) -> Self {
        self.max_markers = Some(max);
        self
    }

    /// Keep pick results pending for this many polls
    pub fn with_pick_latency(mut self, polls: u32) -> Self {
        self.pick_latency = polls;
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Jump to `pose` immediately, cancelling any running animation
    pub fn set_camera_pose(&mut self, pose: CameraPose) {
        self.animation = None;
        self.pose = pose;
    }

    pub fn animation(&self) -> Option<&CameraAnimation> {
        self.animation.as_ref()
    }

    /// Every animation started on this surface, oldest first
    pub fn issued_animations(&self) -> &[CameraAnimation] {
        &self.issued_animations
    }

    /// Run the current animation to its end
    pub fn finish_animation(&mut self) {
        if let Some(animation) = self.animation.take() {
            self.pose = animation.to;
        }
    }

    pub fn layer_by_name(&self, name: &str) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.name == name)
            .map(|i| LayerId(i as u32))
    }

    pub fn layer_features(&self, layer: LayerId) -> &[Feature] {
        self.layers
            .get(layer.0 as usize)
            .map(|l| l.features.as_slice())
            .unwrap_or(&[])
    }

    pub fn marker(&self, marker: MarkerId) -> Option<&SceneMarker> {
        self.markers.get(marker.0 as usize).and_then(|m| m.as_ref())
    }

    /// Number of markers that exist, visible or not
    pub fn marker_count(&self) -> usize {
        self.markers.iter().flatten().count()
    }

    pub fn visible_markers(&self) -> Vec<MarkerId> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.as_ref().is_some_and(|m| m.visible))
            .map(|(i, _)| MarkerId(i as u32))
            .collect()
    }

    /// Screen position of a coordinate at the current camera pose
    pub fn geo_to_screen(&self, pos: &LatLon) -> Vec2 {
        let zoom = self.pose.zoom as f64;
        let d = to_world(pos, zoom) - to_world(&self.pose.position, zoom);
        let d = rotate(d, self.pose.rotation as f64);
        self.size / 2.0 + d.as_vec2()
    }

    fn marker_mut(&mut self, marker: MarkerId) -> Option<&mut SceneMarker> {
        self.markers
            .get_mut(marker.0 as usize)
            .and_then(|m| m.as_mut())
    }

    fn pick_label_now(&self, screen: Vec2) -> Option<Properties> {
        let half_extent = LABEL_HALF_EXTENT_DP * self.density;
        self.layers
            .iter()
            .rev()
            .filter(|layer| self.interactive_layers.contains(&layer.name))
            .flat_map(|layer| layer.features.iter().rev())
            .find(|feature| match &feature.geometry {
                FeatureGeometry::Point(pos) => {
                    let d = (self.geo_to_screen(pos) - screen).abs();
                    d.x <= half_extent && d.y <= half_extent
                }
                _ => false,
            })
            .map(|feature| feature.properties.clone())
    }

    fn pick_marker_now(&self, screen: Vec2) -> Option<MarkerId> {
        self.markers
            .iter()
            .enumerate()
            .rev()
            .find(|(_, marker)| {
                let Some(marker) = marker else {
                    return false;
                };
                let Some(point) = marker.point.filter(|_| marker.visible) else {
                    return false;
                };
                let (size, offset) = marker
                    .style
                    .as_ref()
                    .map(|s| (s.size, s.offset))
                    .unwrap_or((Vec2::splat(DEFAULT_MARKER_SIZE_PX), Vec2::ZERO));
                let center = self.geo_to_screen(&point) + offset;
                let d = (center - screen).abs();
                d.x <= size.x / 2.0 && d.y <= size.y / 2.0
            })
            .map(|(i, _)| MarkerId(i as u32))
    }
}

/// Rotate a vector counter-clockwise by `angle` radians
fn rotate(v: DVec2, angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Resolve to `value` after being polled `polls` times
fn deferred<T: Send + Sync + 'static>(value: T, polls: u32) -> PickFuture<T> {
    Box::pin(async move {
        for _ in 0..polls {
            future::yield_now().await;
        }
        value
    })
}

impl RenderSurface for SceneSurface {
    fn add_data_layer(&mut self, name: &str) -> LayerId {
        self.layers.push(SceneLayer {
            name: name.to_string(),
            features: Vec::new(),
        });
        LayerId((self.layers.len() - 1) as u32)
    }

    fn set_layer_features(&mut self, layer: LayerId, features: Vec<Feature>) {
        if let Some(layer) = self.layers.get_mut(layer.0 as usize) {
            layer.features = features;
        }
    }

    fn clear_layer(&mut self, layer: LayerId) {
        if let Some(layer) = self.layers.get_mut(layer.0 as usize) {
            layer.features.clear();
        }
    }

    fn add_marker(&mut self) -> Option<MarkerId> {
        if self
            .max_markers
            .is_some_and(|max| self.marker_count() >= max)
        {
            return None;
        }
        self.markers.push(Some(SceneMarker::default()));
        Some(MarkerId((self.markers.len() - 1) as u32))
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        if let Some(slot) = self.markers.get_mut(marker.0 as usize) {
            *slot = None;
        }
    }

    fn set_marker_styling(&mut self, marker: MarkerId, style: &MarkerStyle) {
        if let Some(m) = self.marker_mut(marker) {
            m.style = Some(style.clone());
        }
    }

    fn set_marker_icon(&mut self, marker: MarkerId, icon: &MarkerIcon) {
        if let Some(m) = self.marker_mut(marker) {
            m.icon = Some(icon.clone());
        }
    }

    fn set_marker_point(&mut self, marker: MarkerId, position: LatLon) {
        if let Some(m) = self.marker_mut(marker) {
            m.point = Some(position);
        }
    }

    fn set_marker_visible(&mut self, marker: MarkerId, visible: bool) {
        if let Some(m) = self.marker_mut(marker) {
            m.visible = visible;
        }
    }

    fn pick_label_at(&self, screen: Vec2) -> PickFuture<Option<Properties>> {
        deferred(self.pick_label_now(screen), self.pick_latency)
    }

    fn pick_marker_at(&self, screen: Vec2) -> PickFuture<Option<MarkerId>> {
        deferred(self.pick_marker_now(screen), self.pick_latency)
    }

    fn screen_to_geo(&self, screen: Vec2) -> Option<LatLon> {
        let zoom = self.pose.zoom as f64;
        let d = rotate((screen - self.size / 2.0).as_dvec2(), -self.pose.rotation as f64);
        from_world(to_world(&self.pose.position, zoom) + d, zoom)
    }

    fn enclosing_camera_pose(
        &self,
        bounds: &BoundingBox,
        insets: &ViewportInsets,
    ) -> Option<CameraPose> {
        let available = Vec2::new(
            self.size.x - insets.left - insets.right,
            self.size.y - insets.top - insets.bottom,
        );
        if available.x <= 0.0 || available.y <= 0.0 {
            return None;
        }

        // Bounds corners at zoom 0, turned to screen orientation
        let rotation = self.pose.rotation as f64;
        let corners = bounds
            .corners()
            .map(|corner| rotate(to_world(&corner, 0.0), rotation));
        let min = corners.iter().fold(DVec2::INFINITY, |acc, c| acc.min(*c));
        let max = corners.iter().fold(DVec2::NEG_INFINITY, |acc, c| acc.max(*c));
        let extent = max - min;

        let fit = (available.x as f64 / extent.x).min(available.y as f64 / extent.y);
        let zoom = if fit.is_finite() {
            (fit.log2() as f32).clamp(0.0, MAX_SURFACE_ZOOM)
        } else {
            MAX_SURFACE_ZOOM
        };

        // The padded area's center is off the screen center by this much
        let offset = DVec2::new(
            (insets.left - insets.right) as f64 / 2.0,
            (insets.top - insets.bottom) as f64 / 2.0,
        );
        let offset = rotate(offset, -rotation);
        let scale = 2f64.powf(zoom as f64);
        let center = rotate((min + max) / 2.0, -rotation) * scale - offset;

        Some(CameraPose {
            position: from_world(center, zoom as f64)?,
            zoom,
            tilt: self.pose.tilt,
            rotation: self.pose.rotation,
        })
    }

    fn screen_area_contains(&self, bounds: &BoundingBox, insets: &ViewportInsets) -> bool {
        let min = Vec2::new(insets.left, insets.top);
        let max = self.size - Vec2::new(insets.right, insets.bottom);
        bounds.corners().iter().all(|corner| {
            let p = self.geo_to_screen(corner);
            p.x >= min.x && p.y >= min.y && p.x <= max.x && p.y <= max.y
        })
    }

    fn camera_pose(&self) -> CameraPose {
        self.pose
    }

    fn animate_camera(&mut self, update: CameraUpdate, duration: Duration, easing: Easing) {
        let animation = CameraAnimation {
            from: self.pose,
            to: self.pose.updated(&update),
            duration,
            elapsed: Duration::ZERO,
            easing,
        };
        self.issued_animations.push(animation.clone());
        if duration.is_zero() {
            self.pose = animation.to;
            self.animation = None;
        } else {
            self.animation = Some(animation);
        }
    }

    fn display_density(&self) -> f32 {
        self.density
    }

    fn advance(&mut self, delta: Duration) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        animation.elapsed += delta;
        if animation.elapsed >= animation.duration {
            self.finish_animation();
        } else {
            let progress = animation.elapsed.as_secs_f32() / animation.duration.as_secs_f32();
            self.pose = animation.pose_at(progress);
        }
    }
}
