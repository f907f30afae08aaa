//! The field-set accumulator consumed by the encoder.
//!
//! A `FieldSet` collects key/value pairs for one log event and turns them
//! into a single line with [`FieldSet::format`]. Formatting is an explicit
//! consume operation: it encodes a snapshot of the accumulated fields and
//! resets the set, so each instance produces one line per fill. A second
//! `format` call without re-adding fields returns the empty string.
//!
//! The set is not internally synchronized. When several producer threads
//! attach fields to the same logical event, wrap it in a
//! `parking_lot::Mutex` and share the handle.

use std::collections::BTreeMap;
use std::mem;
use std::path::Path;

use chrono::Utc;
use ini::Ini;

use crate::codec;
use crate::level::Level;
use crate::value::Value;

/// Replacement value stored for sensitive keys.
pub const MASKED_VALUE: &str = "******";

/// Properties-file keys mapped to the reserved `git_*` field names.
const GIT_FIELDS: [(&str, &str); 5] = [
    ("git.build.version", "git_build_version"),
    ("git.remote.origin.url", "git_origin"),
    ("git.branch", "git_branch"),
    ("git.commit.id", "git_head"),
    ("git.dirty", "git_is_dirty"),
];

/// Accumulator for the key/value pairs of one log event.
///
/// Keys are unique; adding an existing key overwrites its value. Encoding
/// order is deterministic: fields are sorted by key.
#[derive(Clone, Debug)]
pub struct FieldSet {
    fields: BTreeMap<String, Value>,
    mask_secrets: bool,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSet {
    /// Create an empty field set with secret masking enabled.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            mask_secrets: true,
        }
    }

    /// Enable or disable masking of sensitive keys.
    ///
    /// When enabled (the default), any key containing `password`
    /// case-insensitively stores [`MASKED_VALUE`] instead of the supplied
    /// value.
    pub fn mask_secrets(mut self, enabled: bool) -> Self {
        self.mask_secrets = enabled;
        self
    }

    /// Add one field. Empty keys are ignored; the last write to a key wins.
    pub fn add(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if key.is_empty() {
            return self;
        }
        let value = if self.mask_secrets && key.to_ascii_lowercase().contains("password") {
            Value::Text(MASKED_VALUE.to_owned())
        } else {
            value.into()
        };
        self.fields.insert(key.to_owned(), value);
        self
    }

    /// Add every pair from `values`.
    pub fn add_all<K, V, I>(&mut self, values: I) -> &mut Self
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in values {
            self.add(key.as_ref(), value);
        }
        self
    }

    /// Shorthand for adding the `msg` field.
    pub fn message(&mut self, msg: impl Into<Value>) -> &mut Self {
        self.add("msg", msg)
    }

    /// Add the `msg` field from an error and its source chain.
    pub fn message_error(&mut self, err: &dyn std::error::Error) -> &mut Self {
        self.add("msg", Value::error(err))
    }

    /// Attach build identity fields from a `git.properties` file.
    ///
    /// Adds `git_build_version`, `git_origin`, `git_branch`, `git_head` and
    /// `git_is_dirty` for whichever properties the file carries. A missing
    /// or unreadable file is skipped silently so logging keeps working in
    /// environments without build metadata.
    pub fn add_git_properties(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let Ok(properties) = Ini::load_from_file(path.as_ref()) else {
            return self;
        };
        let Some(section) = properties.section(None::<String>) else {
            return self;
        };
        for (property, field) in GIT_FIELDS {
            if let Some(value) = section.get(property) {
                self.add(field, value);
            }
        }
        self
    }

    /// Look up a previously added value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode the accumulated fields into one line and reset the set.
    ///
    /// This is a single-use-per-line contract: the returned line carries a
    /// snapshot of the fields, and the accumulator is empty afterwards.
    pub fn format(&mut self) -> String {
        let fields = mem::take(&mut self.fields);
        codec::encode(fields.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Stamp `timestamp` (now, whole seconds) and `level`, then format.
    pub fn format_at(&mut self, level: Level) -> String {
        self.add("timestamp", Value::Instant(Utc::now()))
            .add("level", level.to_string())
            .format()
    }

    pub fn format_trace(&mut self) -> String {
        self.format_at(Level::Trace)
    }

    pub fn format_debug(&mut self) -> String {
        self.format_at(Level::Debug)
    }

    pub fn format_info(&mut self) -> String {
        self.format_at(Level::Info)
    }

    pub fn format_warn(&mut self) -> String {
        self.format_at(Level::Warn)
    }

    pub fn format_error(&mut self) -> String {
        self.format_at(Level::Error)
    }

    pub fn format_fatal(&mut self) -> String {
        self.format_at(Level::Fatal)
    }
}
