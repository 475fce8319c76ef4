use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of an OSM element. Serialized as its upper-case name, which is also
/// the value used in picked pin properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "NODE",
            ElementType::Way => "WAY",
            ElementType::Relation => "RELATION",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NODE" => Ok(ElementType::Node),
            "WAY" => Ok(ElementType::Way),
            "RELATION" => Ok(ElementType::Relation),
            other => Err(format!("Unknown element type: {}", other)),
        }
    }
}

/// An OSM element as far as quests are concerned: identity, tags and last edit time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub element_type: ElementType,
    pub id: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub timestamp_edited: DateTime<Utc>,
}

impl Element {
    pub fn new(element_type: ElementType, id: i64, timestamp_edited: DateTime<Utc>) -> Self {
        Self {
            element_type,
            id,
            tags: BTreeMap::new(),
            timestamp_edited,
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_parse() {
        assert_eq!("NODE".parse::<ElementType>(), Ok(ElementType::Node));
        assert_eq!("WAY".parse::<ElementType>(), Ok(ElementType::Way));
        assert_eq!("RELATION".parse::<ElementType>(), Ok(ElementType::Relation));
        assert!("node".parse::<ElementType>().is_err());
        assert!("".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_element_type_serializes_upper_case() {
        let json = serde_json::to_string(&ElementType::Way).unwrap();
        assert_eq!(json, "\"WAY\"");
    }

    #[test]
    fn test_element_tags() {
        let element = Element::new(ElementType::Node, 1, Utc::now()).with_tag("tourism", "camp_site");
        assert_eq!(element.tag("tourism"), Some("camp_site"));
        assert_eq!(element.tag("name"), None);
    }
}
