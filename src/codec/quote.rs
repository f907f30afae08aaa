//! Quoting and unquoting rules for encoded values.
//!
//! A value is emitted raw when every character belongs to the unquoted-safe
//! set; anything else is wrapped in double quotes with backslash escapes.
//! `unquote` reverses exactly the escapes `quote_into` produces, so the two
//! stay symmetric. The `=` escape keeps values containing `=` unambiguous
//! when scanned back.

/// True when `text` contains any character outside ASCII alphanumerics,
/// `-`, or `.`.
pub(crate) fn needs_quoting(text: &str) -> bool {
    !text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Append `text` to `line`, quoted and escaped only when necessary.
///
/// The empty string encodes as `""`.
pub(crate) fn quote_into(line: &mut String, text: &str) {
    if text.is_empty() {
        line.push_str("\"\"");
        return;
    }
    if !needs_quoting(text) {
        line.push_str(text);
        return;
    }
    line.push('"');
    for c in text.chars() {
        match c {
            '\t' => line.push_str("\\t"),
            '\u{8}' => line.push_str("\\b"),
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            '\u{c}' => line.push_str("\\f"),
            '"' => line.push_str("\\\""),
            '\\' => line.push_str("\\\\"),
            '=' => line.push_str("\\="),
            _ => line.push(c),
        }
    }
    line.push('"');
}

/// Materialize a scanned value span, reversing the canonical escapes.
///
/// An unrecognized escape keeps the backslash literally and the following
/// character is re-examined on the next pass, so `1\4` survives unchanged.
pub(crate) fn unquote(raw: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let curr = raw[i];
        if curr != '\\' || i + 1 >= raw.len() {
            out.push(curr);
            i += 1;
            continue;
        }
        match raw[i + 1] {
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\u{c}'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '=' => out.push('='),
            _ => {
                out.push('\\');
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn quoted(text: &str) -> String {
        let mut line = String::new();
        quote_into(&mut line, text);
        line
    }

    fn unquoted(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        unquote(&chars)
    }

    #[rstest]
    #[case("value1", false)]
    #[case("123.456", false)]
    #[case("with-dash", false)]
    #[case("two words", true)]
    #[case("a=b", true)]
    #[case("quo\"te", true)]
    #[case("caf\u{e9}", true)]
    fn detects_unsafe_characters(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(needs_quoting(text), expected);
    }

    #[test]
    fn safe_text_stays_raw() {
        assert_eq!(quoted("value1"), "value1");
    }

    #[test]
    fn empty_text_becomes_empty_quotes() {
        assert_eq!(quoted(""), "\"\"");
    }

    #[rstest]
    #[case("\t", "\"\\t\"")]
    #[case("\u{8}", "\"\\b\"")]
    #[case("\n", "\"\\n\"")]
    #[case("\r", "\"\\r\"")]
    #[case("\u{c}", "\"\\f\"")]
    #[case("\"", "\"\\\"\"")]
    #[case("\\", "\"\\\\\"")]
    #[case("a=b", "\"a\\=b\"")]
    fn escapes_special_characters(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(quoted(text), expected);
    }

    #[rstest]
    #[case("\\t", "\t")]
    #[case("\\\\", "\\")]
    #[case("\\=", "=")]
    #[case("1\\4", "1\\4")]
    #[case("trailing\\", "trailing\\")]
    fn unquote_reverses_or_preserves(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(unquoted(raw), expected);
    }
}
