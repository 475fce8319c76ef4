use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bevy::log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLon;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access store file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse store file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a way is to be split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitPolylineAtPosition {
    /// At an existing vertex
    AtPoint { pos: LatLon },
    /// Between two vertices, `delta` of the way from `first` to `second`
    AtLinePosition {
        first: LatLon,
        second: LatLon,
        delta: f64,
    },
}

impl SplitPolylineAtPosition {
    pub fn position(&self) -> LatLon {
        match self {
            Self::AtPoint { pos } => *pos,
            Self::AtLinePosition {
                first,
                second,
                delta,
            } => LatLon::new(
                first.latitude + (second.latitude - first.latitude) * delta,
                first.longitude + (second.longitude - first.longitude) * delta,
            ),
        }
    }
}

/// Answer to a quest on a way that must be split before it can be applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmQuestSplitWay {
    pub quest_id: i64,
    pub quest_type: String,
    pub way_id: i64,
    pub source: String,
    pub splits: Vec<SplitPolylineAtPosition>,
}

/// Split way answers kept in a JSON file, written through on every change
pub struct SplitWayStore {
    path: PathBuf,
    entries: BTreeMap<i64, OsmQuestSplitWay>,
}

impl SplitWayStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            let list: Vec<OsmQuestSplitWay> = serde_json::from_str(&json)?;
            list.into_iter().map(|e| (e.quest_id, e)).collect()
        } else {
            BTreeMap::new()
        };
        info!("Opened split way store {:?} with {} entries", path, entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries ordered by quest id
    pub fn get_all(&self) -> Vec<OsmQuestSplitWay> {
        self.entries.values().cloned().collect()
    }

    pub fn get(&self, quest_id: i64) -> Option<OsmQuestSplitWay> {
        self.entries.get(&quest_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Insert `entry`, replacing any entry for the same quest
    pub fn put(&mut self, entry: OsmQuestSplitWay) -> Result<(), StoreError> {
        debug!("Storing split of way {} for quest {}", entry.way_id, entry.quest_id);
        let previous = self.entries.insert(entry.quest_id, entry.clone());
        if let Err(e) = self.persist() {
            match previous {
                Some(p) => self.entries.insert(p.quest_id, p),
                None => self.entries.remove(&entry.quest_id),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Returns whether there was an entry for `quest_id`
    pub fn delete(&mut self, quest_id: i64) -> Result<bool, StoreError> {
        let Some(removed) = self.entries.remove(&quest_id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.entries.insert(quest_id, removed);
            return Err(e);
        }
        Ok(true)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let list: Vec<&OsmQuestSplitWay> = self.entries.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_way(quest_id: i64, way_id: i64) -> OsmQuestSplitWay {
        OsmQuestSplitWay {
            quest_id,
            quest_type: "AddMaxSpeed".to_string(),
            way_id,
            source: "survey".to_string(),
            splits: vec![
                SplitPolylineAtPosition::AtPoint {
                    pos: LatLon::new(52.0, 13.0),
                },
                SplitPolylineAtPosition::AtLinePosition {
                    first: LatLon::new(52.0, 13.0),
                    second: LatLon::new(52.002, 13.004),
                    delta: 0.25,
                },
            ],
        }
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SplitWayStore::open(dir.path().join("splits.json")).unwrap();
        assert_eq!(store.count(), 0);
        assert!(store.get_all().is_empty());
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SplitWayStore::open(dir.path().join("splits.json")).unwrap();
        store.put(split_way(3, 100)).unwrap();
        store.put(split_way(1, 200)).unwrap();

        assert_eq!(store.count(), 2);
        assert_eq!(store.get(3), Some(split_way(3, 100)));
        let ids: Vec<i64> = store.get_all().iter().map(|e| e.quest_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_put_replaces_entry_for_same_quest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SplitWayStore::open(dir.path().join("splits.json")).unwrap();
        store.put(split_way(1, 100)).unwrap();
        store.put(split_way(1, 999)).unwrap();
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(1).unwrap().way_id, 999);
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SplitWayStore::open(dir.path().join("splits.json")).unwrap();
        store.put(split_way(1, 100)).unwrap();
        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.json");
        {
            let mut store = SplitWayStore::open(&path).unwrap();
            store.put(split_way(1, 100)).unwrap();
            store.put(split_way(2, 200)).unwrap();
            store.delete(1).unwrap();
        }
        let store = SplitWayStore::open(&path).unwrap();
        assert_eq!(store.get_all(), vec![split_way(2, 200)]);
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            SplitWayStore::open(&path),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut store =
            SplitWayStore::open(dir.path().join("missing").join("splits.json")).unwrap();
        assert!(matches!(store.put(split_way(1, 100)), Err(StoreError::Io(_))));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_line_position() {
        let split = SplitPolylineAtPosition::AtLinePosition {
            first: LatLon::new(0.0, 0.0),
            second: LatLon::new(2.0, 4.0),
            delta: 0.5,
        };
        assert_eq!(split.position(), LatLon::new(1.0, 2.0));
    }
}
