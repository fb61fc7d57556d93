//! CQ code escaping utilities.
//!
//! Field values inside `[CQ:...]` groups cannot contain the four characters
//! that delimit the group, so they are replaced with HTML-style entities:
//!
//! | Character | Entity  |
//! |-----------|---------|
//! | `&`       | `&amp;` |
//! | `[`       | `&#91;` |
//! | `]`       | `&#93;` |
//! | `,`       | `&#44;` |

/// Escapes special characters in a CQ code value.
///
/// `&` is replaced first so the entities introduced by the later rules are
/// not escaped again. Not idempotent: escaping twice double-escapes `&`.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
        .replace(',', "&#44;")
}

/// Reverses [`escape`].
///
/// Substitutions run in reverse order with `&amp;` last, so an `&` produced
/// here never starts another entity.
pub fn unescape(text: &str) -> String {
    text.replace("&#44;", ",")
        .replace("&#93;", "]")
        .replace("&#91;", "[")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("Hello [World]"), "Hello &#91;World&#93;");
        assert_eq!(escape("A & B"), "A &amp; B");
        assert_eq!(escape("a,b,c"), "a&#44;b&#44;c");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("&#91;x&#93; &amp;"), "[x] &");
        assert_eq!(unescape("a&#44;b&#44;c"), "a,b,c");
    }

    #[test]
    fn test_entity_text_survives_round_trip() {
        for s in ["&#91;", "&amp;#44;", "[&],", "", "&&[[]],,", "你好, [世界]"] {
            assert_eq!(unescape(&escape(s)), s, "round trip of {s:?}");
        }
    }

    #[test]
    fn test_escape_is_not_idempotent() {
        let once = escape("&");
        assert_ne!(escape(&once), once);
    }
}
