use bytes::Bytes;
use stalebox_core::Raw;

use super::{Format, FormatError, FormatTypeId};
use crate::entry::CacheEntry;

/// RON (Rusty Object Notation) format - human-readable alternative to JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct RonFormat;

impl Format for RonFormat {
    fn encode(&self, entry: &CacheEntry) -> Result<Raw, FormatError> {
        // RON writes to a String, so the output is always valid UTF-8
        ::ron::to_string(entry)
            .map(|encoded| Bytes::from(encoded.into_bytes()))
            .map_err(|error| FormatError::Serialize(Box::new(error)))
    }

    fn decode(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        let s = std::str::from_utf8(data).map_err(|e| FormatError::Deserialize(Box::new(e)))?;
        ::ron::from_str(s).map_err(|e| FormatError::Deserialize(Box::new(e)))
    }

    fn clone_box(&self) -> Box<dyn Format> {
        Box::new(*self)
    }

    fn format_type_id(&self) -> FormatTypeId {
        FormatTypeId::Ron
    }
}
