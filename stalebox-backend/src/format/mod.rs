//! Value formats for [`CacheEntry`](crate::CacheEntry).
//!
//! The stored record must be self-describing so that entries written by one
//! process can be read by another without sharing type information.
//!
//! | Format | Encoding | Notes |
//! |--------|----------|-------|
//! | [`JsonFormat`] | JSON | Default, readable with any Redis client |
//! | [`RonFormat`] | RON | Human-readable alternative |

use stalebox_core::Raw;
use thiserror::Error;

use crate::entry::CacheEntry;

mod json;
mod ron;

pub use json::JsonFormat;
pub use ron::RonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Unique identifier for format types, used to compare format equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTypeId {
    Json,
    Ron,
    /// For user-defined custom formats. The string should be a unique identifier.
    Custom(&'static str),
}

/// Object-safe codec between [`CacheEntry`] and stored bytes.
pub trait Format: std::fmt::Debug + Send + Sync {
    fn encode(&self, entry: &CacheEntry) -> Result<Raw, FormatError>;

    fn decode(&self, data: &[u8]) -> Result<CacheEntry, FormatError>;

    /// Clone this format into a box (for object safety)
    fn clone_box(&self) -> Box<dyn Format>;

    /// Returns a unique identifier for this format type.
    fn format_type_id(&self) -> FormatTypeId;
}

impl Clone for Box<dyn Format> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
