#![doc = include_str!("../README.md")]

pub mod mock_backend;
pub mod mock_transport;
pub mod tracing;

pub use mock_backend::{BackendCounters, MockBackend, StoredValue};
pub use mock_transport::{MockTransport, Reply};
pub use self::tracing::{CapturedEvent, CapturedSpan, TraceCollector, create_trace_collector};
