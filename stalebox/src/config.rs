//! Fetcher configuration.
//!
//! [`FetcherConfig`] can be built in code or deserialized from any serde
//! format. Durations use humantime notation:
//!
//! ```yaml
//! primary_key_prefix: users_primary
//! stale_key_prefix: users_stale
//! ttl: 30s
//! stale_ttl: 7days
//! vary: [Accept, Accept-Language]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stalebox_core::KeyPrefixes;
use stalebox_core::key::{DEFAULT_PRIMARY_PREFIX, DEFAULT_STALE_PREFIX};

/// Default lifetime of the primary tier.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Settings shared by every fetch made through one fetcher.
///
/// `ttl` is the primary tier lifetime. Setting it to `None` writes the primary
/// key without expiry, which makes the fetcher serve that response forever and
/// never consult the origin again for it.
///
/// `stale_ttl` is the stale tier lifetime; `None` (the default) keeps the
/// last known-good response until the store evicts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Namespace of primary tier keys.
    pub primary_key_prefix: String,
    /// Namespace of stale tier keys.
    pub stale_key_prefix: String,
    /// Primary tier lifetime.
    #[serde(with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// Stale tier lifetime.
    #[serde(with = "humantime_serde")]
    pub stale_ttl: Option<Duration>,
    /// Request header names that partition the cache, in the casing they are
    /// sent with (`Accept-Language`, not `accept-language`).
    pub vary: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            primary_key_prefix: DEFAULT_PRIMARY_PREFIX.to_owned(),
            stale_key_prefix: DEFAULT_STALE_PREFIX.to_owned(),
            ttl: Some(DEFAULT_TTL),
            stale_ttl: None,
            vary: Vec::new(),
        }
    }
}

impl FetcherConfig {
    /// Starts a builder with every field at its default.
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::default()
    }

    /// Returns the key namespaces of both tiers.
    pub fn prefixes(&self) -> KeyPrefixes {
        KeyPrefixes::new(
            self.primary_key_prefix.clone(),
            self.stale_key_prefix.clone(),
        )
    }
}

/// Builder for [`FetcherConfig`].
#[derive(Debug, Clone, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Sets the primary tier key prefix.
    pub fn primary_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.primary_key_prefix = prefix.into();
        self
    }

    /// Sets the stale tier key prefix.
    pub fn stale_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.stale_key_prefix = prefix.into();
        self
    }

    /// Sets the primary tier lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = Some(ttl);
        self
    }

    /// Writes primary entries without expiry.
    pub fn no_ttl(mut self) -> Self {
        self.config.ttl = None;
        self
    }

    /// Sets the stale tier lifetime.
    pub fn stale_ttl(mut self, ttl: Duration) -> Self {
        self.config.stale_ttl = Some(ttl);
        self
    }

    /// Sets the default vary header list.
    pub fn vary<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.vary = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.primary_key_prefix, "primary_http");
        assert_eq!(config.stale_key_prefix, "stale_http");
        assert_eq!(config.ttl, Some(Duration::from_secs(5)));
        assert_eq!(config.stale_ttl, None);
        assert!(config.vary.is_empty());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = FetcherConfig::builder()
            .primary_key_prefix("p")
            .stale_key_prefix("s")
            .ttl(Duration::from_millis(250))
            .stale_ttl(Duration::from_secs(3600))
            .vary(["Accept"])
            .build();

        assert_eq!(config.prefixes(), KeyPrefixes::new("p", "s"));
        assert_eq!(config.ttl, Some(Duration::from_millis(250)));
        assert_eq!(config.stale_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.vary, vec!["Accept".to_owned()]);
    }

    #[test]
    fn no_ttl_clears_primary_lifetime() {
        let config = FetcherConfig::builder().no_ttl().build();
        assert_eq!(config.ttl, None);
    }

    #[test]
    fn yaml_with_humantime_durations() {
        let yaml = r#"
primary_key_prefix: users_primary
ttl: 1m 30s
stale_ttl: 7days
vary: [Accept, Accept-Language]
"#;
        let config: FetcherConfig = serde_saphyr::from_str(yaml).unwrap();

        assert_eq!(config.primary_key_prefix, "users_primary");
        assert_eq!(config.stale_key_prefix, "stale_http");
        assert_eq!(config.ttl, Some(Duration::from_secs(90)));
        assert_eq!(config.stale_ttl, Some(Duration::from_secs(7 * 24 * 3600)));
        assert_eq!(config.vary, vec!["Accept", "Accept-Language"]);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config: FetcherConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, FetcherConfig::default());
    }

    #[test]
    fn json_round_trip() {
        let config = FetcherConfig::builder()
            .ttl(Duration::from_millis(500))
            .build();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""ttl":"500ms""#), "{json}");
        let parsed: FetcherConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
