#![warn(missing_docs)]
//! # stalebox-core
//!
//! Core types shared by every stalebox crate.
//!
//! The fetcher composes two capabilities that live outside of it:
//!
//! - a **transport** that turns a [`Request`] into a [`Response`] ([`Transport`])
//! - a **store** that keeps serialized responses under string keys
//!   (the `Backend` trait in `stalebox-backend`)
//!
//! This crate defines the data model flowing between them and the pure
//! cache-key derivation ([`key`]) used to address both cache tiers.

pub mod error;
pub mod key;
pub mod label;
pub mod request;
pub mod response;
pub mod transport;

pub use error::{TransportError, TransportErrorKind};
pub use key::{KeyError, KeyPrefixes, derive_key, header_case, prefixed_key};
pub use label::BackendLabel;
pub use request::{Request, RequestBuilder, RequestInput, RequestOptions};
pub use response::{Response, ResponseSource};
pub use transport::Transport;

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
