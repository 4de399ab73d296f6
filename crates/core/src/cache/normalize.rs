//! Change-detection normalization.
//!
//! Calendar servers stamp every generated document with a `DTSTAMP:` line
//! that changes on each request even when no event changed. Those lines are
//! stripped before fingerprinting so that only real changes trigger a cache
//! overwrite. The stored document is never normalized.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::Regex;

use super::hash::fingerprint;

/// Marker at the start of the volatile generation-timestamp line.
pub const VOLATILE_MARKER: &str = "DTSTAMP:";

/// Matches a whole volatile line, including its terminator when present.
static VOLATILE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m-u)^{}[^\n]*\n?", regex::escape(VOLATILE_MARKER))).expect("static pattern is valid")
});

/// Remove every `DTSTAMP:` line from a document.
///
/// Matching is case-sensitive and anchored at line start. All other bytes,
/// including CRLF line endings, are preserved. Borrows when nothing matches.
pub fn normalize(content: &[u8]) -> Cow<'_, [u8]> {
    VOLATILE_LINE.replace_all(content, &b""[..])
}

/// Fingerprint of the normalized form of a document.
pub fn normalized_fingerprint(content: &[u8]) -> String {
    fingerprint(&normalize(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_timestamp_line() {
        let doc = b"BEGIN:VEVENT\nDTSTAMP:20240101T000000Z\nSUMMARY:foo\nEND:VEVENT\n";
        assert_eq!(&*normalize(doc), b"BEGIN:VEVENT\nSUMMARY:foo\nEND:VEVENT\n");
    }

    #[test]
    fn test_strips_every_occurrence() {
        let doc = b"DTSTAMP:1\nA\nDTSTAMP:2\nB\nDTSTAMP:3";
        assert_eq!(&*normalize(doc), b"A\nB\n");
    }

    #[test]
    fn test_preserves_crlf() {
        let doc = b"BEGIN:VCALENDAR\r\nDTSTAMP:20240101T000000Z\r\nSUMMARY:foo\r\n";
        assert_eq!(&*normalize(doc), b"BEGIN:VCALENDAR\r\nSUMMARY:foo\r\n");
    }

    #[test]
    fn test_case_sensitive() {
        let doc = b"dtstamp:20240101\nSUMMARY:foo\n";
        assert_eq!(&*normalize(doc), &doc[..]);
    }

    #[test]
    fn test_anchored_at_line_start() {
        let doc = b"X-NOTE: DTSTAMP:20240101\n DTSTAMP:folded\n";
        assert_eq!(&*normalize(doc), &doc[..]);
    }

    #[test]
    fn test_idempotent() {
        let doc = b"BEGIN:VEVENT\nDTSTAMP:20240101\nSUMMARY:foo\n";
        let once = normalize(doc).into_owned();
        let twice = normalize(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_timestamp_borrows() {
        let doc = b"BEGIN:VEVENT\nSUMMARY:foo\n";
        assert!(matches!(normalize(doc), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fingerprint_ignores_timestamp() {
        let a = normalized_fingerprint(b"DTSTAMP:20240101\nEVENT:foo");
        let b = normalized_fingerprint(b"DTSTAMP:20240102\nEVENT:foo");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_detects_change() {
        let a = normalized_fingerprint(b"DTSTAMP:20240101\nEVENT:foo");
        let b = normalized_fingerprint(b"DTSTAMP:20240102\nEVENT:bar");
        assert_ne!(a, b);
    }

    #[test]
    fn test_non_utf8_bytes_preserved() {
        let doc = b"SUMMARY:\xff\xfe\nDTSTAMP:1\n";
        assert_eq!(&*normalize(doc), b"SUMMARY:\xff\xfe\n");
    }
}
