use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use stalebox_core::{Request, Response, Transport, TransportError, TransportErrorKind};

/// A scripted origin reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A response the transport accepts.
    Ok {
        code: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// A transport-level failure.
    Err(TransportError),
}

impl Reply {
    /// A `200 OK` with a `text/plain` body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    /// An accepted response with the given status.
    pub fn with_status(code: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        Reply::Ok {
            code,
            headers,
            body: body.into(),
        }
    }

    /// Appends a response header; no-op on an error reply.
    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        if let Reply::Ok { headers, .. } = &mut self {
            headers.append(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        self
    }

    /// A connection failure.
    pub fn connect_error() -> Self {
        Reply::Err(TransportError::new(
            TransportErrorKind::Connect,
            "connection refused",
        ))
    }

    /// A status code rejected by the transport.
    pub fn status_error(code: StatusCode) -> Self {
        Reply::Err(TransportError::status(code))
    }

    fn into_response(self, request: Request) -> Response {
        match self {
            Reply::Ok {
                code,
                headers,
                body,
            } => Response::new(request, code, headers, body),
            Reply::Err(error) => Response::failed(request, error),
        }
    }
}

/// Transport that answers from a queue of scripted replies.
///
/// Once the queue is empty every call gets the fallback reply, which is a
/// connection error unless set with [`MockTransport::always`].
#[derive(Clone, Debug)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    fallback: Arc<Mutex<Reply>>,
    requests: Arc<Mutex<Vec<Request>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(Reply::connect_error())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Creates a transport that gives `reply` to every call.
    pub fn always(reply: Reply) -> Self {
        let transport = Self::new();
        transport.set_fallback(reply);
        transport
    }

    /// Delays every reply, to keep calls in flight concurrently.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a reply for the next call.
    pub fn push(&self, reply: Reply) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Replaces the reply given once the queue is empty.
    pub fn set_fallback(&self, reply: Reply) {
        *self.fallback.lock().unwrap() = reply;
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Reply {
        let queued = self.replies.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: Request) -> Response {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.next_reply();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply.into_response(request)
    }
}
