pub mod context;
pub mod error;

pub use context::{AppContext, RefreshResponse};
pub use error::{NovelRankError, Result};
