//! Place-search provider client and payload normalization.
//!
//! [`ProviderClient`] issues one rate-limit-friendly call per anchor and
//! classifies failures into the taxonomy the aggregation engine relies on;
//! [`normalize`] coerces the provider's loosely-typed entries into canonical
//! [`poisweep_core::PoiRecord`]s.

mod client;
mod error;
mod normalize;
mod retry;

pub use client::{ProviderClient, SearchRequest};
pub use error::ProviderError;
pub use normalize::{normalize, NormalizeError};
pub use retry::retry_with_backoff;
