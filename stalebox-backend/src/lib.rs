//! Traits and structs for stalebox store interaction.
//!
//! If you want to plug in your own key-value store, implement [`Backend`].
//! The fetcher only needs two operations from it: a point read and an
//! atomic multi-key write with per-key TTL.
mod backend;
pub mod entry;
mod error;
pub mod format;
pub mod metrics;

pub use backend::{Backend, BackendResult, WriteEntry, ttl_millis};
pub use entry::{CacheEntry, HeaderValues};
pub use error::BackendError;
pub use format::{Format, FormatError, FormatTypeId, JsonFormat, RonFormat};
pub use stalebox_core::{BackendLabel, Raw};
