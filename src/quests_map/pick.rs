//! Resolving taps on the map to quests or plain map clicks.
//!
//! A tap first asks the surface for the label under the finger. If its
//! properties identify a quest, that quest was picked. Otherwise the surface
//! is asked for a marker, and only if there is none the tap counts as a click
//! on the map. Each tap resolves independently; nothing is queued or cancelled.

use bevy::math::Vec2;
use futures_lite::future;

use crate::constants::CLICK_AREA_SIZE_DP;
use crate::surface::{MarkerId, PickFuture, Properties, RenderSurface};

use super::listener::PickOutcome;
use super::pins::quest_key_from_properties;

enum PickStage {
    Label(PickFuture<Option<Properties>>),
    Marker(PickFuture<Option<MarkerId>>),
}

struct PendingPick {
    screen: Vec2,
    stage: PickStage,
}

impl PendingPick {
    /// Advance this pick. `None` while still waiting on the surface,
    /// otherwise the outcome (if the tap resolved to anything worth reporting).
    fn poll<S: RenderSurface>(&mut self, surface: &S) -> Option<Option<PickOutcome>> {
        loop {
            match &mut self.stage {
                PickStage::Label(pick) => {
                    let props = future::block_on(future::poll_once(pick))?;
                    if let Some(key) = props.as_ref().and_then(quest_key_from_properties) {
                        return Some(Some(PickOutcome::QuestPicked(key)));
                    }
                    self.stage = PickStage::Marker(surface.pick_marker_at(self.screen));
                }
                PickStage::Marker(pick) => {
                    let marker = future::block_on(future::poll_once(pick))?;
                    if marker.is_some() {
                        // Markers handle their own taps
                        return Some(None);
                    }
                    return Some(map_click(surface, self.screen));
                }
            }
        }
    }
}

/// Radius in px that a finger covers on the screen
pub fn finger_radius_px(density: f32) -> f32 {
    CLICK_AREA_SIZE_DP * density / 2.0
}

/// Resolve a tap that hit nothing to a position and the finger's radius in meters there
pub fn map_click<S: RenderSurface>(surface: &S, screen: Vec2) -> Option<PickOutcome> {
    let position = surface.screen_to_geo(screen)?;
    let radius = finger_radius_px(surface.display_density());
    let edge = surface.screen_to_geo(screen + Vec2::new(radius, 0.0))?;
    Some(PickOutcome::MapClicked {
        position,
        radius_m: position.distance_to(&edge),
    })
}

/// Taps waiting for the surface to answer
#[derive(Default)]
pub struct PickDispatcher {
    pending: Vec<PendingPick>,
}

impl PickDispatcher {
    pub fn start<S: RenderSurface>(&mut self, surface: &S, screen: Vec2) {
        self.pending.push(PendingPick {
            screen,
            stage: PickStage::Label(surface.pick_label_at(screen)),
        });
    }

    /// Poll all pending picks once, returning the outcomes of those that finished
    pub fn poll<S: RenderSurface>(&mut self, surface: &S) -> Vec<PickOutcome> {
        let mut outcomes = Vec::new();
        self.pending.retain_mut(|pick| match pick.poll(surface) {
            Some(outcome) => {
                outcomes.extend(outcome);
                false
            }
            None => true,
        });
        outcomes
    }

    /// Drop all pending picks without resolving them
    pub fn discard(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
