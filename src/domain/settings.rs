use serde::{Deserialize, Serialize};

use crate::domain::ALL_CATEGORIES;

pub const DEFAULT_REFRESH_INTERVAL_HOURS: u64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFlags {
    pub show_rating: bool,
    pub show_author: bool,
    pub show_category: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            show_rating: true,
            show_author: true,
            show_category: true,
        }
    }
}

/// User preferences. Read-only to the ranking core; replaced only by an
/// explicit save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Source ids to aggregate. Order is irrelevant; the registry decides it.
    pub enabled_sources: Vec<String>,
    pub refresh_interval_hours: u64,
    pub default_category: String,
    pub last_category: String,
    pub display: DisplayFlags,
}

impl Settings {
    /// Defaults with every source in `sources` enabled.
    pub fn with_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled_sources: sources.into_iter().map(Into::into).collect(),
            refresh_interval_hours: DEFAULT_REFRESH_INTERVAL_HOURS,
            default_category: ALL_CATEGORIES.to_string(),
            last_category: ALL_CATEGORIES.to_string(),
            display: DisplayFlags::default(),
        }
    }

    pub fn is_enabled(&self, source: &str) -> bool {
        self.enabled_sources.iter().any(|s| s == source)
    }
}
