//! Persisted quest answers.

mod split_way;

pub use split_way::{OsmQuestSplitWay, SplitPolylineAtPosition, SplitWayStore, StoreError};
