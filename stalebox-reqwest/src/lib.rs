#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod transport;

pub use transport::ReqwestTransport;

/// Re-export of the middleware client accepted by [`ReqwestTransport::new`].
pub use reqwest_middleware::ClientWithMiddleware;
