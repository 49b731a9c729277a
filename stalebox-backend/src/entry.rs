//! Wire record stored under both cache keys.
//!
//! ```json
//! {"headers":{"content-type":"text/plain","set-cookie":["a=1","b=2"]},"body":"fake response","code":200}
//! ```
//!
//! A header with one value is stored as a plain string; a header sent several
//! times is stored as an array so that no value is lost on the way back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serialized form of a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Response headers by name, in response order.
    pub headers: IndexMap<String, HeaderValues>,
    /// Response body decoded as UTF-8 text.
    pub body: String,
    /// Status code.
    pub code: u16,
}

/// Values of one header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    /// The header appeared once.
    One(String),
    /// The header appeared several times, in order.
    Many(Vec<String>),
}

impl HeaderValues {
    /// Builds the value for a header from every occurrence, in order.
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            HeaderValues::One(values.remove(0))
        } else {
            HeaderValues::Many(values)
        }
    }

    /// Iterates over every value.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValues::One(value) => std::slice::from_ref(value),
            HeaderValues::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_value_is_a_plain_string() {
        let mut headers = IndexMap::new();
        headers.insert(
            "fake".to_owned(),
            HeaderValues::from_values(vec!["header".to_owned()]),
        );
        let entry = CacheEntry {
            headers,
            body: "fake response".to_owned(),
            code: 200,
        };

        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"headers":{"fake":"header"},"body":"fake response","code":200}"#
        );
    }

    #[test]
    fn reads_plain_string_map() {
        let entry: CacheEntry =
            serde_json::from_str(r#"{"headers":{"Fake":"header"},"body":"{}","code":201}"#)
                .unwrap();
        assert_eq!(entry.code, 201);
        assert_eq!(entry.headers["Fake"].iter().collect::<Vec<_>>(), ["header"]);
    }

    #[test]
    fn repeated_values_are_kept_in_order() {
        let values = HeaderValues::from_values(vec!["a=1".to_owned(), "b=2".to_owned()]);
        assert_eq!(values.iter().collect::<Vec<_>>(), ["a=1", "b=2"]);
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"["a=1","b=2"]"#);
    }
}
