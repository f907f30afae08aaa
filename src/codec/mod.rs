//! The logfmt line codec.
//!
//! [`encode`] renders an ordered sequence of key/value pairs into a single
//! line of `key=value` tokens separated by single spaces; [`parse`] scans
//! such a line back into a mapping. Both are pure functions over character
//! data and are inverses of each other on the sub-language of lines the
//! encoder produces (modulo text truncation and sub-second timestamps).

mod quote;
mod scan;

use std::borrow::Cow;

use crate::value::{Value, instant_text};

pub use scan::parse;

/// Default cap on rendered text values, in characters.
pub const DEFAULT_TEXT_LIMIT: usize = 80;

/// Encode fields into one logfmt line using the default text cap.
///
/// Keys are appended verbatim; validating them is the caller's concern.
/// An empty sequence encodes to the empty string.
pub fn encode<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    encode_with_limit(fields, DEFAULT_TEXT_LIMIT)
}

/// Encode fields into one logfmt line, truncating text values longer than
/// `text_limit` characters to the limit plus a `...` marker before any
/// quoting decision is made.
pub fn encode_with_limit<'a, I>(fields: I, text_limit: usize) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut line = String::new();
    for (key, value) in fields {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(key);
        line.push('=');
        match value {
            Value::Null => line.push_str("null"),
            Value::Instant(ts) => line.push_str(&instant_text(ts)),
            Value::Text(text) => quote::quote_into(&mut line, &truncate(text, text_limit)),
            other => quote::quote_into(&mut line, &other.to_text()),
        }
    }
    line
}

fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    Cow::Owned(out)
}
