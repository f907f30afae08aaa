//! Renderable value kinds accepted by the field set.
//!
//! The encoder dispatches on a closed set of variants rather than inspecting
//! runtime types, so every renderable kind has exactly one rendering rule.

use chrono::{DateTime, Utc};

/// A single field value awaiting encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Encoded as the bare word `null`, never quoted.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Encoded as ISO-8601 UTC truncated to whole seconds, never quoted.
    Instant(DateTime<Utc>),
    /// Pre-rendered error text, quoted like ordinary text.
    Error(String),
}

impl Value {
    /// Capture an error together with its source chain, outermost first.
    pub fn error(err: &dyn std::error::Error) -> Self {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        Value::Error(text)
    }

    /// The stringified form a decoder recovers for this value.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Instant(ts) => instant_text(ts),
            Value::Error(s) => s.clone(),
        }
    }
}

/// ISO-8601 instant with sub-second precision dropped.
pub(crate) fn instant_text(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Instant(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
