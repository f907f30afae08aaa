//! Worker thread draining the appender queue.
//!
//! The worker is the sole consumer of the bounded channel and forwards
//! lines to its transport strictly in arrival order. Transport failures are
//! logged through a rate-limited warner and swallowed; they never reach the
//! producers.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use log::warn;

use super::transport::Transport;
use crate::rate_limited_warner::RateLimitedWarner;

/// Commands processed by the worker thread.
pub(crate) enum Command {
    Line(String),
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

pub(crate) fn spawn_worker<T>(
    transport: T,
    capacity: usize,
    warn_interval: Duration,
) -> (Sender<Command>, JoinHandle<()>)
where
    T: Transport + 'static,
{
    let (tx, rx) = bounded(capacity);
    let handle = thread::spawn(move || {
        Worker {
            transport,
            warner: RateLimitedWarner::new(warn_interval),
        }
        .run(rx)
    });
    (tx, handle)
}

struct Worker<T> {
    transport: T,
    warner: RateLimitedWarner,
}

impl<T: Transport> Worker<T> {
    fn run(mut self, rx: Receiver<Command>) {
        loop {
            match rx.recv() {
                Ok(Command::Line(line)) => self.post_line(&line),
                Ok(Command::Flush(ack)) => {
                    // Each line is sent synchronously, so nothing is
                    // buffered; acknowledge immediately.
                    let _ = ack.send(());
                }
                Ok(Command::Shutdown(ack)) => {
                    self.drain_pending(&rx);
                    let _ = ack.send(());
                    break;
                }
                Err(_) => {
                    self.drain_pending(&rx);
                    break;
                }
            }
        }
    }

    fn post_line(&mut self, line: &str) {
        match self.transport.send(line) {
            // Response body is read and discarded.
            Ok(_) => {}
            Err(err) => {
                warn!("HttpAppender send failed: {err}");
                self.warner.record_drop();
                self.warner.warn_if_due(|count| {
                    warn!("HttpAppender dropped {count} lines due to transport failures");
                });
            }
        }
    }

    fn drain_pending(&mut self, rx: &Receiver<Command>) {
        loop {
            match rx.try_recv() {
                Ok(Command::Line(line)) => self.post_line(&line),
                Ok(Command::Flush(ack)) => {
                    let _ = ack.send(());
                }
                Ok(Command::Shutdown(ack)) => {
                    let _ = ack.send(());
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

/// Send a flush command and wait for acknowledgment within `timeout`.
///
/// Deadline based so the total wait never exceeds `timeout` even when the
/// send itself consumes part of the budget.
pub(crate) fn flush_queue(tx: &Sender<Command>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let (ack_tx, ack_rx) = bounded(1);
    if tx.send_timeout(Command::Flush(ack_tx), timeout).is_err() {
        return false;
    }
    let remaining = deadline.saturating_duration_since(Instant::now());
    ack_rx.recv_timeout(remaining).is_ok()
}
