//! Quests: identity, what is shown on the map, and quest type definitions.

mod camping;

pub use camping::AddCampDrinkingWater;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::LatLon;
use crate::osm::{Element, ElementGeometry, ElementType, Tags};

/// Icon shown for note quests
pub const NOTE_QUEST_ICON: &str = "ic_quest_notes";

/// Identity of a quest instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestKey {
    Note {
        note_id: i64,
    },
    Element {
        element_type: ElementType,
        element_id: i64,
        quest_type_name: String,
    },
}

/// A quest as shown on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    pub key: QuestKey,
    /// Name of the quest type's icon, used as pin kind
    pub icon: String,
    pub geometry: ElementGeometry,
    /// Where the quest's pins are placed
    pub marker_locations: Vec<LatLon>,
}

impl Quest {
    /// A quest of type `Q` about `element`, pinned at the geometry's center
    pub fn for_element<Q: QuestType>(quest_type: &Q, element: &Element, geometry: ElementGeometry) -> Self {
        Self {
            key: QuestKey::Element {
                element_type: element.element_type,
                element_id: element.id,
                quest_type_name: quest_type.name().to_string(),
            },
            icon: quest_type.icon().to_string(),
            marker_locations: vec![geometry.center()],
            geometry,
        }
    }

    /// A quest about an open note at `position`
    pub fn for_note(note_id: i64, position: LatLon) -> Self {
        Self {
            key: QuestKey::Note { note_id },
            icon: NOTE_QUEST_ICON.to_string(),
            geometry: ElementGeometry::Point { center: position },
            marker_locations: vec![position],
        }
    }
}

/// Definition of one kind of question asked about OSM elements
pub trait QuestType {
    type Answer;

    /// Stable name, used in quest keys and persisted answers
    fn name(&self) -> &'static str;
    fn icon(&self) -> &'static str;
    fn changeset_comment(&self) -> &'static str;
    fn wiki_link(&self) -> Option<&'static str>;
    fn title(&self, tags: &std::collections::BTreeMap<String, String>) -> &'static str;

    /// Whether the question should be asked for `element` at time `now`
    fn is_applicable_to(&self, element: &Element, now: DateTime<Utc>) -> bool;

    /// Whether `element` should be highlighted as context while answering
    fn is_highlighted(&self, _element: &Element) -> bool {
        false
    }

    fn apply_answer_to(&self, answer: &Self::Answer, tags: &mut Tags, now: DateTime<Utc>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_quest() {
        let pos = LatLon::new(10.0, 20.0);
        let quest = Quest::for_note(5, pos);
        assert_eq!(quest.key, QuestKey::Note { note_id: 5 });
        assert_eq!(quest.marker_locations, vec![pos]);
        assert_eq!(quest.icon, NOTE_QUEST_ICON);
    }

    #[test]
    fn test_element_quest_key() {
        let element = Element::new(ElementType::Way, 42, Utc::now());
        let geometry = ElementGeometry::Point {
            center: LatLon::new(1.0, 1.0),
        };
        let quest = Quest::for_element(&AddCampDrinkingWater, &element, geometry);
        assert_eq!(
            quest.key,
            QuestKey::Element {
                element_type: ElementType::Way,
                element_id: 42,
                quest_type_name: "AddCampDrinkingWater".to_string(),
            }
        );
        assert_eq!(quest.icon, "ic_quest_drinking_water");
    }
}
