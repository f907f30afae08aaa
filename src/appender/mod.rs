//! Background appender forwarding encoded lines to an HTTP sink.
//!
//! [`HttpAppender`] owns a bounded queue and a single worker thread, so
//! producers never block on network I/O. The queue's overflow behaviour is
//! explicit: drop the new line (default), block until space frees up, or
//! wait up to a timeout. Lifecycle is explicit too: the worker starts at
//! construction and stops on [`HttpAppender::close`] (or drop), draining
//! whatever is still queued.

mod transport;
mod worker;

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender, TrySendError, bounded};
use log::warn;
use parking_lot::Mutex;
use thiserror::Error;

use crate::rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};
use worker::{Command, flush_queue, spawn_worker};

pub use transport::{HttpPost, Transport, TransportError};

/// Default bounded queue capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
/// Default connection timeout for the HTTP transport.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default request timeout for the HTTP transport.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// How [`HttpAppender::append`] reacts when the queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the new line, preserving queued ones.
    #[default]
    Drop,
    /// Block the caller until space becomes available.
    Block,
    /// Block up to the given duration before giving up.
    Timeout(Duration),
}

/// Errors reported when a line cannot be queued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppendError {
    /// The queue is at capacity; the line was dropped.
    #[error("appender queue full, line dropped")]
    QueueFull,
    /// The worker has shut down; the line was dropped.
    #[error("appender closed")]
    Closed,
    /// The timeout elapsed before space became available.
    #[error("timed out after {0:?} waiting for queue space")]
    Timeout(Duration),
}

/// Configuration for constructing an [`HttpAppender`].
#[derive(Clone, Debug)]
pub struct AppenderConfig {
    /// Target URL for HTTP POST requests.
    pub url: String,
    /// Bounded queue capacity between producers and the worker.
    pub capacity: usize,
    /// Behaviour when the queue is full.
    pub overflow: OverflowPolicy,
    /// Timeout for establishing connections.
    pub connect_timeout: Duration,
    /// Timeout for sending requests; also bounds flush and shutdown waits.
    pub write_timeout: Duration,
    /// Interval between rate-limited drop warnings.
    pub warn_interval: Duration,
}

impl AppenderConfig {
    /// Defaults for every knob except the target URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            overflow: OverflowPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

/// Appender forwarding lines to an HTTP endpoint from a worker thread.
pub struct HttpAppender {
    tx: Option<Sender<Command>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    overflow: OverflowPolicy,
    warner: RateLimitedWarner,
    flush_timeout: Duration,
}

impl HttpAppender {
    /// Spawn an appender posting to the configured URL.
    pub fn new(config: AppenderConfig) -> Self {
        let transport = HttpPost::new(
            config.url.clone(),
            config.connect_timeout,
            config.write_timeout,
        );
        Self::with_transport(transport, config)
    }

    /// Spawn an appender over a caller-supplied transport.
    pub fn with_transport<T>(transport: T, config: AppenderConfig) -> Self
    where
        T: Transport + 'static,
    {
        let (tx, handle) = spawn_worker(transport, config.capacity, config.warn_interval);
        Self {
            tx: Some(tx),
            handle: Mutex::new(Some(handle)),
            overflow: config.overflow,
            warner: RateLimitedWarner::new(config.warn_interval),
            flush_timeout: config.write_timeout,
        }
    }

    /// Queue one encoded line for delivery.
    ///
    /// Never performs I/O on the calling thread. The configured
    /// [`OverflowPolicy`] decides what happens when the queue is full.
    pub fn append(&self, line: String) -> Result<(), AppendError> {
        let Some(tx) = &self.tx else {
            self.note_drop("appender used after close");
            return Err(AppendError::Closed);
        };
        match self.overflow {
            OverflowPolicy::Drop => match tx.try_send(Command::Line(line)) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    self.note_drop("queue full");
                    Err(AppendError::QueueFull)
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.note_drop("worker disconnected");
                    Err(AppendError::Closed)
                }
            },
            OverflowPolicy::Block => tx.send(Command::Line(line)).map_err(|_| {
                self.note_drop("worker disconnected");
                AppendError::Closed
            }),
            OverflowPolicy::Timeout(dur) => match tx.send_timeout(Command::Line(line), dur) {
                Ok(()) => Ok(()),
                Err(SendTimeoutError::Timeout(_)) => {
                    self.note_drop("queue full past timeout");
                    Err(AppendError::Timeout(dur))
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    self.note_drop("worker disconnected");
                    Err(AppendError::Closed)
                }
            },
        }
    }

    /// Wait until every queued line has been handed to the transport.
    ///
    /// Returns `true` when the worker acknowledged within the write-timeout
    /// budget, `false` after close or on timeout.
    pub fn flush(&self) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        self.warner.flush(|count| {
            warn!("HttpAppender dropped {count} lines in the last interval");
        });
        flush_queue(tx, self.flush_timeout)
    }

    /// Stop the worker, draining queued lines first.
    pub fn close(&mut self) {
        self.request_shutdown();
        self.join_worker();
    }

    fn note_drop(&self, reason: &str) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!("HttpAppender dropped {count} lines ({reason})");
        });
    }

    fn request_shutdown(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send(Command::Shutdown(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.recv_timeout(self.flush_timeout);
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!("HttpAppender: worker thread panicked");
        }
    }
}

impl Drop for HttpAppender {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for HttpAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAppender")
            .field("overflow", &self.overflow)
            .field("flush_timeout", &self.flush_timeout)
            .finish()
    }
}
