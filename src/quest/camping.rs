use std::collections::BTreeMap;

use chrono::{DateTime, Months, NaiveDate, Utc};

use crate::osm::{Element, ElementType, Tags};

use super::QuestType;

const KEY: &str = "drinking_water";
const CHECK_DATE_KEY: &str = "check_date:drinking_water";

/// Answers older than this are asked again
const RESURVEY_MONTHS: u32 = 4 * 12;

/// Asks whether a camp site has drinking water
#[derive(Debug, Clone, Copy, Default)]
pub struct AddCampDrinkingWater;

impl AddCampDrinkingWater {
    fn is_camp_site(element: &Element) -> bool {
        matches!(element.element_type, ElementType::Node | ElementType::Way)
            && element.tag("tourism") == Some("camp_site")
    }

    /// Date the drinking water tag was last confirmed
    fn last_checked(element: &Element) -> NaiveDate {
        element
            .tag(CHECK_DATE_KEY)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| element.timestamp_edited.date_naive())
    }
}

impl QuestType for AddCampDrinkingWater {
    type Answer = bool;

    fn name(&self) -> &'static str {
        "AddCampDrinkingWater"
    }

    fn icon(&self) -> &'static str {
        "ic_quest_drinking_water"
    }

    fn changeset_comment(&self) -> &'static str {
        "Specify whether there is drinking water at camp site"
    }

    fn wiki_link(&self) -> Option<&'static str> {
        Some("Key:drinking_water")
    }

    fn title(&self, _tags: &BTreeMap<String, String>) -> &'static str {
        "quest_camp_drinking_water_title"
    }

    fn is_applicable_to(&self, element: &Element, now: DateTime<Utc>) -> bool {
        if !Self::is_camp_site(element) {
            return false;
        }
        if element.tag(KEY).is_none() {
            return true;
        }
        let Some(threshold) = now.date_naive().checked_sub_months(Months::new(RESURVEY_MONTHS))
        else {
            return false;
        };
        Self::last_checked(element) < threshold
    }

    fn is_highlighted(&self, element: &Element) -> bool {
        Self::is_camp_site(element)
    }

    fn apply_answer_to(&self, answer: &bool, tags: &mut Tags, now: DateTime<Utc>) {
        let value = if *answer { "yes" } else { "no" };
        if tags.get(KEY) == Some(value) {
            // Same answer as before: record that it was confirmed today
            tags.insert(CHECK_DATE_KEY, &now.format("%Y-%m-%d").to_string());
        } else {
            tags.insert(KEY, value);
            // A check date for the previous value would make the new one look stale
            tags.remove(CHECK_DATE_KEY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::TagChange;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn camp_site(edited: DateTime<Utc>) -> Element {
        Element::new(ElementType::Node, 1, edited).with_tag("tourism", "camp_site")
    }

    #[test]
    fn test_applicable_without_tag() {
        assert!(AddCampDrinkingWater.is_applicable_to(&camp_site(now()), now()));
    }

    #[test]
    fn test_not_applicable_to_other_elements() {
        let hotel = Element::new(ElementType::Node, 1, now()).with_tag("tourism", "hotel");
        assert!(!AddCampDrinkingWater.is_applicable_to(&hotel, now()));

        let relation =
            Element::new(ElementType::Relation, 1, now()).with_tag("tourism", "camp_site");
        assert!(!AddCampDrinkingWater.is_applicable_to(&relation, now()));
    }

    #[test]
    fn test_recent_answer_not_asked() {
        let recent = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let element = camp_site(recent).with_tag(KEY, "yes");
        assert!(!AddCampDrinkingWater.is_applicable_to(&element, now()));
    }

    #[test]
    fn test_old_answer_asked_again() {
        let old = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let element = camp_site(old).with_tag(KEY, "yes");
        assert!(AddCampDrinkingWater.is_applicable_to(&element, now()));
    }

    #[test]
    fn test_check_date_overrides_edit_time() {
        let old = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let element = camp_site(old)
            .with_tag(KEY, "no")
            .with_tag(CHECK_DATE_KEY, "2023-05-01");
        assert!(!AddCampDrinkingWater.is_applicable_to(&element, now()));
    }

    #[test]
    fn test_highlights_camp_sites() {
        let way = Element::new(ElementType::Way, 9, now()).with_tag("tourism", "camp_site");
        assert!(AddCampDrinkingWater.is_highlighted(&way));
        assert!(!AddCampDrinkingWater.is_highlighted(&Element::new(ElementType::Way, 9, now())));
    }

    #[test]
    fn test_answer_sets_tag() {
        let mut tags = Tags::default();
        AddCampDrinkingWater.apply_answer_to(&false, &mut tags, now());
        assert_eq!(tags.get(KEY), Some("no"));
    }

    #[test]
    fn test_changed_answer_drops_stale_check_date() {
        let old = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let element = camp_site(old)
            .with_tag(KEY, "no")
            .with_tag(CHECK_DATE_KEY, "2015-01-01");
        assert!(AddCampDrinkingWater.is_applicable_to(&element, now()));

        let mut tags = Tags::new(element.tags.clone());
        AddCampDrinkingWater.apply_answer_to(&true, &mut tags, now());
        assert_eq!(tags.get(KEY), Some("yes"));
        assert!(tags.get(CHECK_DATE_KEY).is_none());

        let answered = Element {
            tags: tags.resolved(),
            timestamp_edited: now(),
            ..element
        };
        assert!(!AddCampDrinkingWater.is_applicable_to(&answered, now()));
    }

    #[test]
    fn test_same_answer_updates_check_date() {
        let mut tags = Tags::new(BTreeMap::from([(KEY.to_string(), "yes".to_string())]));
        AddCampDrinkingWater.apply_answer_to(&true, &mut tags, now());
        assert_eq!(
            tags.changes(),
            vec![TagChange::Add {
                key: CHECK_DATE_KEY.to_string(),
                value: "2024-06-01".to_string()
            }]
        );
    }
}
