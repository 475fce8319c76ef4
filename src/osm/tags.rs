use std::collections::BTreeMap;

/// A single recorded modification of a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagChange {
    Add { key: String, value: String },
    Modify { key: String, old: String, new: String },
    Delete { key: String, value: String },
}

/// Tags of an element being edited. Reads see pending changes; the original
/// tags are kept so only real changes are recorded.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    original: BTreeMap<String, String>,
    changes: BTreeMap<String, TagChange>,
}

impl Tags {
    pub fn new(original: BTreeMap<String, String>) -> Self {
        Self {
            original,
            changes: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match self.changes.get(key) {
            Some(TagChange::Add { value, .. }) => Some(value.as_str()),
            Some(TagChange::Modify { new, .. }) => Some(new.as_str()),
            Some(TagChange::Delete { .. }) => None,
            None => self.original.get(key).map(String::as_str),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key` to `value`, recording the change against the original tags
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.original.get(key) {
            Some(old) if old == value => {
                self.changes.remove(key);
            }
            Some(old) => {
                self.changes.insert(
                    key.to_string(),
                    TagChange::Modify {
                        key: key.to_string(),
                        old: old.clone(),
                        new: value.to_string(),
                    },
                );
            }
            None => {
                self.changes.insert(
                    key.to_string(),
                    TagChange::Add {
                        key: key.to_string(),
                        value: value.to_string(),
                    },
                );
            }
        }
    }

    /// Remove `key`. Only a key present in the original tags records a change.
    pub fn remove(&mut self, key: &str) {
        match self.original.get(key) {
            Some(value) => {
                self.changes.insert(
                    key.to_string(),
                    TagChange::Delete {
                        key: key.to_string(),
                        value: value.clone(),
                    },
                );
            }
            None => {
                self.changes.remove(key);
            }
        }
    }

    /// The tags with all changes applied
    pub fn resolved(&self) -> BTreeMap<String, String> {
        let mut tags = self.original.clone();
        for change in self.changes.values() {
            match change {
                TagChange::Add { key, value } => {
                    tags.insert(key.clone(), value.clone());
                }
                TagChange::Modify { key, new, .. } => {
                    tags.insert(key.clone(), new.clone());
                }
                TagChange::Delete { key, .. } => {
                    tags.remove(key);
                }
            }
        }
        tags
    }

    pub fn changes(&self) -> Vec<TagChange> {
        self.changes.values().cloned().collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        Tags::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_insert_new_key_is_add() {
        let mut t = tags(&[]);
        t.insert("drinking_water", "yes");
        assert_eq!(t.get("drinking_water"), Some("yes"));
        assert_eq!(
            t.changes(),
            vec![TagChange::Add {
                key: "drinking_water".into(),
                value: "yes".into()
            }]
        );
    }

    #[test]
    fn test_insert_existing_key_is_modify() {
        let mut t = tags(&[("drinking_water", "no")]);
        t.insert("drinking_water", "yes");
        assert_eq!(
            t.changes(),
            vec![TagChange::Modify {
                key: "drinking_water".into(),
                old: "no".into(),
                new: "yes".into()
            }]
        );
    }

    #[test]
    fn test_insert_same_value_is_no_change() {
        let mut t = tags(&[("drinking_water", "yes")]);
        t.insert("drinking_water", "yes");
        assert!(!t.has_changes());
        assert!(t.contains_key("drinking_water"));
    }

    #[test]
    fn test_remove_existing_key_is_delete() {
        let mut t = tags(&[("check_date:drinking_water", "2015-01-01")]);
        t.remove("check_date:drinking_water");
        assert!(!t.contains_key("check_date:drinking_water"));
        assert_eq!(
            t.changes(),
            vec![TagChange::Delete {
                key: "check_date:drinking_water".into(),
                value: "2015-01-01".into()
            }]
        );
        assert!(t.resolved().is_empty());
    }

    #[test]
    fn test_remove_added_key_drops_the_add() {
        let mut t = tags(&[]);
        t.insert("drinking_water", "yes");
        t.remove("drinking_water");
        t.remove("missing");
        assert!(!t.has_changes());
    }

    #[test]
    fn test_reverting_a_change_removes_it() {
        let mut t = tags(&[("drinking_water", "no")]);
        t.insert("drinking_water", "yes");
        t.insert("drinking_water", "no");
        assert!(!t.has_changes());
    }
}
