//! Generate and parse log lines in the logfmt style.
//!
//! The core of the crate is a symmetric line codec: [`codec::encode`] turns
//! an ordered set of key/value pairs into one `key=value ...` line, quoting
//! and escaping values only when necessary, and [`codec::parse`] scans any
//! such line back into a mapping without ever failing on malformed input.
//!
//! Around the codec sit three collaborators:
//!
//! - [`FieldSet`], the per-event accumulator consumed once per line;
//! - [`enrich`], explicit task/environment/user context attached before
//!   formatting;
//! - [`HttpAppender`], a bounded-queue background worker that forwards
//!   finished lines to an HTTP endpoint so producers never block on I/O.
//!
//! ```
//! use logfmt::{FieldSet, codec};
//!
//! let mut event = FieldSet::new();
//! event.add("key1", "value1").add("port", 443).message("hello world");
//! let line = event.format();
//! assert_eq!(line, "key1=value1 msg=\"hello world\" port=443");
//! assert_eq!(codec::parse(&line)["msg"], "hello world");
//! ```

pub mod appender;
pub mod codec;
pub mod enrich;
mod fieldset;
mod level;
mod rate_limited_warner;
mod value;

pub use appender::{
    AppendError, AppenderConfig, HttpAppender, HttpPost, OverflowPolicy, Transport, TransportError,
};
pub use codec::{DEFAULT_TEXT_LIMIT, encode, encode_with_limit, parse};
pub use enrich::{Env, Task, TaskContext, User, next_task_id};
pub use fieldset::{FieldSet, MASKED_VALUE};
pub use level::Level;
pub use value::Value;
