//! Multi-anchor aggregation engine: fan-out orchestration with per-anchor
//! outcome reporting, plus the session-scoped result store.

mod aggregate;
mod store;

pub use aggregate::{aggregate, AggregateParams, ProgressFn};
pub use store::{new_history_entry, ResultStore};
