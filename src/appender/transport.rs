//! Transport seam between the appender worker and the outside world.

use std::time::Duration;

use thiserror::Error;
use ureq::{Agent, AgentBuilder};

/// Failure delivering a line to the sink.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never completed (connect failure, timeout, DNS, ...).
    #[error("request failed: {0}")]
    Request(String),
    /// The response arrived but its body could not be read.
    #[error("reading response body: {0}")]
    Body(String),
}

/// A sink that accepts one encoded line at a time.
///
/// Implementations are owned by the worker thread, so `&mut self` access is
/// uncontended. The returned string is the sink's response body; the worker
/// discards it, but callers driving a transport directly may inspect it.
pub trait Transport: Send {
    fn send(&mut self, line: &str) -> Result<String, TransportError>;
}

/// HTTP POST transport for logfmt lines.
pub struct HttpPost {
    agent: Agent,
    url: String,
}

impl HttpPost {
    /// Build a transport posting to `url` with the given timeouts.
    pub fn new(url: impl Into<String>, connect_timeout: Duration, write_timeout: Duration) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout(write_timeout)
            .build();
        Self {
            agent,
            url: url.into(),
        }
    }
}

impl Transport for HttpPost {
    /// POST the line as the full request body.
    ///
    /// The `Content-Type: application/json; charset=UTF-8` header is a
    /// historical quirk of the receiving endpoints: the payload is logfmt
    /// text, not JSON. It is kept for wire compatibility.
    ///
    /// Error responses (4xx/5xx) are not failures at this level; their body
    /// is returned like any other, matching the original appender which
    /// read the error stream. Only transport-level problems surface as
    /// [`TransportError`].
    fn send(&mut self, line: &str) -> Result<String, TransportError> {
        let request = self
            .agent
            .post(&self.url)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json; charset=UTF-8");
        let response = match request.send_string(line) {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(TransportError::Request(err.to_string()));
            }
        };
        response
            .into_string()
            .map_err(|err| TransportError::Body(err.to_string()))
    }
}
