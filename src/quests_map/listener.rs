//! Receivers of resolved map taps.

use std::collections::VecDeque;

use crate::geo::LatLon;
use crate::quest::QuestKey;

/// Told what a tap on the map resolved to
pub trait QuestsMapListener {
    fn on_quest_picked(&mut self, key: QuestKey);
    /// A tap that hit no quest, with the radius in meters a finger covers there
    fn on_map_clicked(&mut self, position: LatLon, radius_m: f64);
}

/// What a single tap resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    QuestPicked(QuestKey),
    MapClicked { position: LatLon, radius_m: f64 },
}

/// Listener that queues outcomes until someone drains them
#[derive(Debug, Default)]
pub struct PickOutbox {
    outcomes: VecDeque<PickOutcome>,
}

impl PickOutbox {
    pub fn drain(&mut self) -> impl Iterator<Item = PickOutcome> + '_ {
        self.outcomes.drain(..)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl QuestsMapListener for PickOutbox {
    fn on_quest_picked(&mut self, key: QuestKey) {
        self.outcomes.push_back(PickOutcome::QuestPicked(key));
    }

    fn on_map_clicked(&mut self, position: LatLon, radius_m: f64) {
        self.outcomes
            .push_back(PickOutcome::MapClicked { position, radius_m });
    }
}
