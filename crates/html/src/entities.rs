//! Character reference decoding for text and attribute values.
//!
//! Only a small, stable subset is decoded:
//! - named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`
//! - numeric, semicolon-terminated: `&#215;`, `&#xD7;`
//!
//! Anything else (unknown names, missing semicolons, surrogates, out-of-range
//! scalars) is copied through unchanged.

use memchr::memchr;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
];

// Longest body we are willing to scan for a `;`: "#x10FFFF" / "#1114111".
const MAX_REFERENCE_LEN: usize = 8;

pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;

    while let Some(rel) = memchr(b'&', &bytes[i..]) {
        let amp = i + rel;
        match decode_reference(&s[amp + 1..]) {
            Some((ch, consumed)) => {
                out.push_str(&s[copy_start..amp]);
                out.push(ch);
                i = amp + 1 + consumed;
                copy_start = i;
            }
            None => i = amp + 1,
        }
    }

    out.push_str(&s[copy_start..]);
    out
}

/// Decodes the reference following a `&`; returns the char and the bytes consumed
/// (including the terminating `;`).
fn decode_reference(rest: &str) -> Option<(char, usize)> {
    let window = &rest.as_bytes()[..rest.len().min(MAX_REFERENCE_LEN + 1)];
    let end = window
        .iter()
        .position(|&b| b == b';' || b == b'&' || b.is_ascii_whitespace())?;
    if window[end] != b';' || end == 0 {
        return None;
    }
    let body = &rest[..end];

    let ch = if let Some(numeric) = body.strip_prefix('#') {
        decode_numeric(numeric)?
    } else {
        NAMED
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, ch)| *ch)?
    };
    Some((ch, end + 1))
}

fn decode_numeric(numeric: &str) -> Option<char> {
    let (digits, radix) = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (numeric, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_references() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;"), "×");
        assert_eq!(decode_entities("&#x10FFFF;"), "\u{10FFFF}");
    }

    #[test]
    fn keeps_utf8_around_references() {
        assert_eq!(decode_entities("π &amp; σ"), "π & σ");
        assert_eq!(decode_entities("120×32"), "120×32");
    }

    #[test]
    fn passes_malformed_references_through() {
        for s in [
            "&",
            "&&",
            "&;",
            "&#;",
            "&#x;",
            "&amp",
            "&notanentity;",
            "&#xZZ;",
            "&#xD800;",
            "&#x110000;",
            "&#99999999;",
            "&#-1;",
            "loose &amp space",
        ] {
            assert_eq!(decode_entities(s), s, "input {s:?}");
        }
    }

    #[test]
    fn malformed_reference_does_not_swallow_the_next_one() {
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
        assert_eq!(decode_entities("&&lt;"), "&<");
    }
}
