mod history;
mod persist;
mod shared;

pub use history::{HistoryStore, RunId, DEFAULT_SUITE};
pub use persist::{load_or_default, save};
pub use shared::SharedHistory;
