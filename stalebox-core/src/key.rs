//! Cache key derivation.
//!
//! Every logical request is addressed by two keys that share one suffix:
//!
//! ```text
//! {primary_prefix}:{url}#{vary}
//! {stale_prefix}:{url}#{vary}
//! ```
//!
//! `{vary}` is the query-string encoding of the request headers selected by
//! the vary list, keyed by lowercase header name and sorted by name, so that
//! header insertion order never changes the key.
//!
//! ## Vary matching
//!
//! A request header is selected when its name, written in canonical HTTP
//! header case (`Content-Type`), equals a vary-list entry byte-for-byte. The
//! request side is case-insensitive because every spelling of a header name
//! renders to the same canonical form; the vary list is compared verbatim, so
//! `"accept"` in the list selects nothing.
//!
//! ```
//! use http::header::{ACCEPT, HeaderValue};
//! use stalebox_core::{KeyPrefixes, Request, derive_key};
//!
//! let request = Request::builder("/url")
//!     .header(ACCEPT, HeaderValue::from_static("application/json"))
//!     .build();
//!
//! assert_eq!(derive_key(&request, &["Accept"]).unwrap(), "/url#accept=application%2Fjson");
//! assert_eq!(derive_key(&request, &["accept"]).unwrap(), "/url#");
//!
//! let prefixes = KeyPrefixes::default();
//! assert_eq!(
//!     prefixes.primary_key(&request, &["Accept"]).unwrap(),
//!     "primary_http:/url#accept=application%2Fjson",
//! );
//! ```

use http::HeaderValue;
use thiserror::Error;

use crate::request::Request;

/// Default prefix of the primary (short-lived) cache tier.
pub const DEFAULT_PRIMARY_PREFIX: &str = "primary_http";
/// Default prefix of the stale (long-lived) cache tier.
pub const DEFAULT_STALE_PREFIX: &str = "stale_http";

/// Error raised when the vary headers cannot be encoded.
#[derive(Debug, Error)]
#[error("failed to encode vary headers: {0}")]
pub struct KeyError(#[from] serde_urlencoded::ser::Error);

/// Renders a header name in canonical HTTP header case.
///
/// ```
/// assert_eq!(stalebox_core::header_case("x-request-id"), "X-Request-Id");
/// assert_eq!(stalebox_core::header_case("ACCEPT"), "Accept");
/// ```
pub fn header_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut cased = String::with_capacity(word.len());
                    cased.push(first.to_ascii_uppercase());
                    cased.push_str(&chars.as_str().to_ascii_lowercase());
                    cased
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Derives the tier-independent cache key `{url}#{vary}` for a request.
///
/// Values of a repeated header are joined with `,`. Every value byte reaches
/// the key: bytes are read as latin-1, one char per byte, so values that are
/// not visible ASCII still give distinct keys. No I/O happens here.
pub fn derive_key<S: AsRef<str>>(request: &Request, vary: &[S]) -> Result<String, KeyError> {
    let headers = request.headers();
    let mut pairs = headers
        .keys()
        .filter(|name| {
            let cased = header_case(name.as_str());
            vary.iter().any(|entry| entry.as_ref() == cased)
        })
        .map(|name| {
            let values = headers.get_all(name).iter().map(latin1).collect::<Vec<_>>();
            (name.as_str(), values.join(","))
        })
        .collect::<Vec<_>>();
    pairs.sort();

    let encoded = serde_urlencoded::to_string(&pairs)?;
    Ok(format!("{}#{}", request.url(), encoded))
}

fn latin1(value: &HeaderValue) -> String {
    value.as_bytes().iter().copied().map(char::from).collect()
}

/// Joins a tier prefix with a derived key: `{prefix}:{key}`.
#[inline]
pub fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{prefix}:{key}")
}

/// The pair of prefixes addressing the primary and stale tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPrefixes {
    /// Prefix of the primary tier.
    pub primary: String,
    /// Prefix of the stale tier.
    pub stale: String,
}

impl Default for KeyPrefixes {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_PREFIX.to_owned(),
            stale: DEFAULT_STALE_PREFIX.to_owned(),
        }
    }
}

impl KeyPrefixes {
    /// Creates a prefix pair.
    pub fn new(primary: impl Into<String>, stale: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            stale: stale.into(),
        }
    }

    /// Derives the primary-tier key for a request.
    pub fn primary_key<S: AsRef<str>>(&self, request: &Request, vary: &[S]) -> Result<String, KeyError> {
        derive_key(request, vary).map(|key| prefixed_key(&self.primary, &key))
    }

    /// Derives the stale-tier key for a request.
    pub fn stale_key<S: AsRef<str>>(&self, request: &Request, vary: &[S]) -> Result<String, KeyError> {
        derive_key(request, vary).map(|key| prefixed_key(&self.stale, &key))
    }

    /// Derives both keys from a single key derivation.
    pub fn keys<S: AsRef<str>>(&self, request: &Request, vary: &[S]) -> Result<(String, String), KeyError> {
        let key = derive_key(request, vary)?;
        Ok((prefixed_key(&self.primary, &key), prefixed_key(&self.stale, &key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderName, HeaderValue, USER_AGENT};
    use pretty_assertions::assert_eq;

    const NO_VARY: [&str; 0] = [];

    fn request(headers: &[(HeaderName, &'static str)]) -> Request {
        headers
            .iter()
            .fold(Request::builder("http://example.com/path?q=1"), |builder, (name, value)| {
                builder.header(name.clone(), HeaderValue::from_static(value))
            })
            .build()
    }

    #[test]
    fn empty_vary_is_url_only() {
        let request = request(&[(ACCEPT, "text/xml")]);
        assert_eq!(
            derive_key(&request, &NO_VARY).unwrap(),
            "http://example.com/path?q=1#"
        );
    }

    #[test]
    fn vary_selects_listed_headers_only() {
        let request = request(&[(ACCEPT, "text/xml"), (USER_AGENT, "curl/8")]);
        assert_eq!(
            derive_key(&request, &["Accept"]).unwrap(),
            "http://example.com/path?q=1#accept=text%2Fxml"
        );
    }

    #[test]
    fn vary_list_is_not_normalized() {
        let request = request(&[(ACCEPT, "text/xml")]);
        assert_eq!(
            derive_key(&request, &["accept"]).unwrap(),
            derive_key(&request, &NO_VARY).unwrap()
        );
        assert_eq!(
            derive_key(&request, &["ACCEPT"]).unwrap(),
            derive_key(&request, &NO_VARY).unwrap()
        );
    }

    #[test]
    fn request_header_spelling_does_not_matter() {
        let lower = Request::builder("/url")
            .header(
                HeaderName::from_static("x-tenant"),
                HeaderValue::from_static("a"),
            )
            .build();
        let upper = Request::builder("/url")
            .header(
                HeaderName::from_bytes(b"X-TENANT").unwrap(),
                HeaderValue::from_static("a"),
            )
            .build();

        assert_eq!(
            derive_key(&lower, &["X-Tenant"]).unwrap(),
            derive_key(&upper, &["X-Tenant"]).unwrap()
        );
        assert_eq!(derive_key(&lower, &["X-Tenant"]).unwrap(), "/url#x-tenant=a");
    }

    #[test]
    fn insertion_order_does_not_change_key() {
        let vary = ["Accept", "Accept-Language"];
        let first = request(&[(ACCEPT, "text/html"), (ACCEPT_LANGUAGE, "en US")]);
        let second = request(&[(ACCEPT_LANGUAGE, "en US"), (ACCEPT, "text/html")]);

        let key = derive_key(&first, &vary).unwrap();
        assert_eq!(key, derive_key(&second, &vary).unwrap());
        assert_eq!(
            key,
            "http://example.com/path?q=1#accept=text%2Fhtml&accept-language=en+US"
        );
    }

    #[test]
    fn repeated_header_values_are_joined() {
        let request = request(&[(ACCEPT, "text/html"), (ACCEPT, "text/xml")]);
        assert_eq!(
            derive_key(&request, &["Accept"]).unwrap(),
            "http://example.com/path?q=1#accept=text%2Fhtml%2Ctext%2Fxml"
        );
    }

    #[test]
    fn different_vary_values_give_different_keys() {
        let json = request(&[(ACCEPT, "application/json")]);
        let xml = request(&[(ACCEPT, "text/xml")]);
        assert_ne!(
            derive_key(&json, &["Accept"]).unwrap(),
            derive_key(&xml, &["Accept"]).unwrap()
        );
    }

    #[test]
    fn non_ascii_values_stay_in_the_key() {
        let key = |user: &str| {
            let request = Request::builder("/url")
                .header(
                    HeaderName::from_static("x-user"),
                    HeaderValue::from_str(user).unwrap(),
                )
                .build();
            derive_key(&request, &["X-User"]).unwrap()
        };

        assert_ne!(key("José"), key("Zoë"));
        assert_ne!(key("José"), "/url#");
        assert_eq!(key("José"), "/url#x-user=Jos%C3%83%C2%A9");
    }

    #[test]
    fn opaque_bytes_stay_in_the_key() {
        let key = |bytes: &[u8]| {
            let request = Request::builder("/url")
                .header(
                    HeaderName::from_static("x-token"),
                    HeaderValue::from_bytes(bytes).unwrap(),
                )
                .build();
            derive_key(&request, &["X-Token"]).unwrap()
        };

        assert_ne!(key(b"\xe9"), key(b"\xe8"));
        assert_ne!(key(b"\xe9"), key(b"\xc3\xa9"));
    }

    #[test]
    fn prefixes_share_suffix() {
        let prefixes = KeyPrefixes::new("p", "s");
        let request = Request::get("/url");
        let (primary, stale) = prefixes.keys(&request, &NO_VARY).unwrap();

        assert_eq!(primary, "p:/url#");
        assert_eq!(stale, "s:/url#");
        assert_eq!(prefixes.primary_key(&request, &NO_VARY).unwrap(), primary);
        assert_eq!(prefixes.stale_key(&request, &NO_VARY).unwrap(), stale);
    }

    #[test]
    fn default_prefixes() {
        let prefixes = KeyPrefixes::default();
        assert_eq!(prefixes.primary, "primary_http");
        assert_eq!(prefixes.stale, "stale_http");
    }

    #[test]
    fn header_case_rendering() {
        assert_eq!(header_case("content-type"), "Content-Type");
        assert_eq!(header_case("x-b3-traceid"), "X-B3-Traceid");
        assert_eq!(header_case("dnt"), "Dnt");
    }
}
