pub mod item;
pub mod settings;
pub mod snapshot;

pub use item::{Item, RawItem, RawRating};
pub use settings::{DisplayFlags, Settings, DEFAULT_REFRESH_INTERVAL_HOURS};
pub use snapshot::{Snapshot, Staleness, ALL_CATEGORIES};
