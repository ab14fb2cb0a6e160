use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Item;

/// Category filter value that matches every item.
pub const ALL_CATEGORIES: &str = "all";

/// A complete ranking produced by one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub last_update: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(items: Vec<Item>, last_update: DateTime<Utc>) -> Self {
        Self { items, last_update }
    }

    /// Items in rank order, restricted to `category` unless it is `"all"`.
    pub fn filter_by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items
            .iter()
            .filter(move |item| category == ALL_CATEGORIES || item.category == category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Nothing has been persisted, or the snapshot was cleared.
    Absent,
    Fresh,
    Stale,
}

impl Staleness {
    /// Fresh while `now - last_update <= interval_hours`.
    pub fn evaluate(last_update: Option<DateTime<Utc>>, interval_hours: u64, now: DateTime<Utc>) -> Self {
        let Some(last_update) = last_update else {
            return Staleness::Absent;
        };

        let interval = i64::try_from(interval_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        if now.signed_duration_since(last_update) <= interval {
            Staleness::Fresh
        } else {
            Staleness::Stale
        }
    }

    pub fn needs_refresh(self) -> bool {
        !matches!(self, Staleness::Fresh)
    }

    pub fn label(self) -> &'static str {
        match self {
            Staleness::Absent => "absent",
            Staleness::Fresh => "fresh",
            Staleness::Stale => "stale",
        }
    }
}
