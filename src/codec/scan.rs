//! The decoding state machine.
//!
//! A single left-to-right scan over the character stream with three states.
//! NEXT skips separators until a key-start character appears, KEY consumes
//! the key and watches for `=`, VAL consumes the value in either unquoted or
//! quoted mode. Malformed input never errors; whatever fields can be
//! recovered are returned.

use std::collections::BTreeMap;

use super::quote::unquote;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Next,
    Key,
    Val,
}

/// Parse one logfmt line into a key-to-value mapping.
///
/// All values come back as text; re-typing is the caller's concern. Partial
/// or malformed fields degrade gracefully: a key without `=` maps to the
/// empty string, an unterminated quote yields the span up to end of input,
/// and a line that never contains a single valid field comes back whole as
/// one key with an empty value.
pub fn parse(line: &str) -> BTreeMap<String, String> {
    let chars: Vec<char> = line.chars().collect();
    let n = chars.len();
    let mut fields = BTreeMap::new();

    let mut state = ScanState::Next;
    let mut key_start = 0;
    let mut key_end = 0;
    let mut val_start = 0;
    let mut quoted = false;
    let mut i = 0;

    while i < n {
        let c = chars[i];
        match state {
            ScanState::Next => {
                if is_key_char(c) {
                    state = ScanState::Key;
                    key_start = i;
                }
                i += 1;
            }
            ScanState::Key => {
                if c == '=' {
                    key_end = i;
                    quoted = false;
                    i += 1;
                    if i < n && chars[i] == '"' {
                        quoted = true;
                        i += 1;
                    }
                    val_start = i;
                    state = ScanState::Val;
                } else if !is_key_char(c) {
                    insert(&mut fields, &chars[key_start..i], String::new());
                    state = ScanState::Next;
                    i += 1;
                } else {
                    i += 1;
                }
            }
            ScanState::Val => {
                let mut b = c;
                let mut escaped = false;
                // A backslash marks the following character as escaped and
                // is consumed together with it.
                if b == '\\' && i + 1 < n {
                    escaped = true;
                    i += 1;
                    b = chars[i];
                }
                if is_val_char(b, quoted, escaped) {
                    i += 1;
                } else {
                    insert(
                        &mut fields,
                        &chars[key_start..key_end],
                        unquote(&chars[val_start..i]),
                    );
                    state = ScanState::Next;
                    i += 1;
                }
            }
        }
    }

    // End-of-input flush: emit whatever span is still pending.
    match state {
        ScanState::Key => insert(&mut fields, &chars[key_start..n], String::new()),
        ScanState::Val => insert(
            &mut fields,
            &chars[key_start..key_end],
            unquote(&chars[val_start..n]),
        ),
        ScanState::Next => {
            // A non-empty line that never produced a field becomes a single
            // entry keyed by the raw line.
            if fields.is_empty() && n > 0 {
                fields.insert(line.to_owned(), String::new());
            }
        }
    }
    fields
}

fn insert(fields: &mut BTreeMap<String, String>, key: &[char], value: String) {
    fields.insert(key.iter().collect(), value);
}

/// Key characters are anything above the separator except `=` and `"`.
fn is_key_char(c: char) -> bool {
    c > ' ' && c != '=' && c != '"'
}

/// Value termination depends on mode: unquoted values end at any separator,
/// `=`, or `"`; quoted values run until an unescaped `"` and may contain
/// spaces but not control characters.
fn is_val_char(c: char, quoted: bool, escaped: bool) -> bool {
    if !quoted {
        c > ' ' && c != '=' && c != '"'
    } else {
        c >= ' ' && (c != '=' || escaped) && (c != '"' || escaped)
    }
}
