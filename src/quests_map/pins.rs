//! Pin features and the properties that identify a quest when its pin is picked.

use crate::osm::ElementType;
use crate::quest::{Quest, QuestKey};
use crate::surface::{Feature, Properties};

pub const MARKER_NOTE_ID: &str = "note_id";
pub const MARKER_ELEMENT_ID: &str = "element_id";
pub const MARKER_ELEMENT_TYPE: &str = "element_type";
pub const MARKER_QUEST_TYPE: &str = "quest_type";

/// Resolve picked label properties to a quest. Malformed values count as absent.
pub fn quest_key_from_properties(props: &Properties) -> Option<QuestKey> {
    let note_id = props
        .get(MARKER_NOTE_ID)
        .and_then(|v| v.parse::<i64>().ok());
    if let Some(note_id) = note_id {
        return Some(QuestKey::Note { note_id });
    }

    let element_id = props.get(MARKER_ELEMENT_ID)?.parse::<i64>().ok()?;
    let element_type = props.get(MARKER_ELEMENT_TYPE)?.parse::<ElementType>().ok()?;
    let quest_type_name = props.get(MARKER_QUEST_TYPE)?.clone();
    Some(QuestKey::Element {
        element_type,
        element_id,
        quest_type_name,
    })
}

fn key_properties(key: &QuestKey) -> Properties {
    match key {
        QuestKey::Note { note_id } => Properties::from([(MARKER_NOTE_ID.to_string(), note_id.to_string())]),
        QuestKey::Element {
            element_type,
            element_id,
            quest_type_name,
        } => Properties::from([
            (MARKER_ELEMENT_ID.to_string(), element_id.to_string()),
            (MARKER_ELEMENT_TYPE.to_string(), element_type.to_string()),
            (MARKER_QUEST_TYPE.to_string(), quest_type_name.clone()),
        ]),
    }
}

/// Pickable pins for the quests layer
pub fn quest_pin_features(quest: &Quest) -> Vec<Feature> {
    quest
        .marker_locations
        .iter()
        .map(|pos| {
            let mut properties = key_properties(&quest.key);
            properties.insert("type".to_string(), "point".to_string());
            properties.insert("kind".to_string(), quest.icon.clone());
            Feature::point(*pos, properties)
        })
        .collect()
}

/// Pins drawn for the focused quest
pub fn selected_pin_features(quest: &Quest) -> Vec<Feature> {
    quest
        .marker_locations
        .iter()
        .map(|pos| {
            let properties = Properties::from([
                ("type".to_string(), "point".to_string()),
                ("kind".to_string(), quest.icon.clone()),
            ]);
            Feature::point(*pos, properties)
        })
        .collect()
}
