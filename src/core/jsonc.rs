//! JSON with `//` comments
//!
//! Resource files are JSON with line comments. Comments are removed with a
//! small state machine that leaves every other character (including the
//! newline that ends a comment) at its original line and column, so
//! `serde_json` error positions point into the original file.

use serde_json::Value;

use crate::error::ResourceError;

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    InString,
    InStringEscape,
    InFirstSlash,
    InComment,
}

/// Remove `//` line comments from `text`.
///
/// `//` inside a quoted string is kept. A single `/` that is not followed by
/// another `/` is kept as is.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Idle;
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match state {
            ScanState::Idle => {
                chars.next();
                match c {
                    '"' => {
                        out.push(c);
                        state = ScanState::InString;
                    }
                    '/' => state = ScanState::InFirstSlash,
                    _ => out.push(c),
                }
            }
            ScanState::InString => {
                chars.next();
                out.push(c);
                match c {
                    '"' => state = ScanState::Idle,
                    '\\' => state = ScanState::InStringEscape,
                    _ => {}
                }
            }
            ScanState::InStringEscape => {
                chars.next();
                out.push(c);
                state = ScanState::InString;
            }
            ScanState::InFirstSlash => {
                if c == '/' {
                    chars.next();
                    state = ScanState::InComment;
                } else {
                    // Not a comment. Emit the slash and rescan `c` as idle.
                    out.push('/');
                    state = ScanState::Idle;
                }
            }
            ScanState::InComment => {
                if c == '\r' || c == '\n' {
                    state = ScanState::Idle;
                } else {
                    chars.next();
                }
            }
        }
    }

    if state == ScanState::InFirstSlash {
        out.push('/');
    }

    out
}

/// Strip comments from `text` and parse it as JSON.
///
/// `name` is used for error context only.
pub fn parse(name: &str, text: &str) -> Result<Value, ResourceError> {
    let stripped = strip_comments(text);
    serde_json::from_str(&stripped).map_err(|e| ResourceError::Parse {
        name: name.to_string(),
        line: e.line(),
        column: e.column(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_comment_removed() {
        let text = r#"{"a": "http://x"} // comment"#;
        assert_eq!(strip_comments(text), r#"{"a": "http://x"} "#);
        let value: Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(value["a"], "http://x");
    }

    #[test]
    fn test_slashes_inside_string_kept() {
        let text = r#"{"a": "a//b"}"#;
        assert_eq!(strip_comments(text), text);
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let text = r#"{"a": "x\" // y"} // z"#;
        assert_eq!(strip_comments(text), r#"{"a": "x\" // y"} "#);
    }

    #[test]
    fn test_newline_after_comment_preserved() {
        let text = "// header\n{\n  \"a\": 1 // one\n}\n";
        assert_eq!(strip_comments(text), "\n{\n  \"a\": 1 \n}\n");
    }

    #[test]
    fn test_carriage_return_ends_comment() {
        let text = "1 // x\r\n2";
        assert_eq!(strip_comments(text), "1 \r\n2");
    }

    #[test]
    fn test_single_slash_kept() {
        assert_eq!(strip_comments("1 / 2"), "1 / 2");
        assert_eq!(strip_comments("a/"), "a/");
    }

    #[test]
    fn test_parse_error_points_at_original_line() {
        let text = "// line 1\n// line 2\n{\n  \"a\": 1,\n  oops\n}\n";
        match parse("boards.jsonc", text) {
            Err(ResourceError::Parse { name, line, .. }) => {
                assert_eq!(name, "boards.jsonc");
                assert_eq!(line, 5);
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_line_count_preserved(
            lines in proptest::collection::vec("[a-z \"/]{0,20}", 0..10)
        ) {
            let text = lines.join("\n");
            let stripped = strip_comments(&text);
            prop_assert_eq!(stripped.matches('\n').count(), text.matches('\n').count());
        }

        #[test]
        fn prop_text_without_slashes_unchanged(text in "[a-z0-9 \"{}:,\n]{0,60}") {
            prop_assert_eq!(strip_comments(&text), text);
        }
    }
}
