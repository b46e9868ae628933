//! Byte-level scanning layer
//!
//! Everything below the element grammar lives here: the sliding cursor
//! buffer over the input stream, qualified-name and attribute-value
//! scanners producing spans into that buffer, and the reusable per-element
//! attribute pool. Spans are only valid until the cursor's retain floor
//! moves past them; anything that outlives the current element must be
//! copied out.

pub(crate) mod attrs;
pub(crate) mod cursor;
pub(crate) mod qname;

use crate::error::CimXmlSyntaxError;

/// XML white space: space, tab, carriage return, line feed.
#[inline]
pub(crate) fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Content equality checked from the last byte backwards.
///
/// Closing-tag names in grid files share long common prefixes
/// (`cim:Location.CoordinateSystem` vs `cim:Location.PowerSystemResources`),
/// so a mismatch shows up at the tail first.
pub(crate) fn eq_bytes_reversed(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().rev().zip(b.iter().rev()).all(|(x, y)| x == y)
}

/// Decodes a raw UTF-8 chunk into `out`, expanding entity and character
/// references.
///
/// Only the five predefined XML entities and decimal/hex character
/// references are supported; anything else is fatal, including an `&`
/// without a terminating `;`. `offset` is the absolute stream position of
/// `raw[0]`, used for error positions.
pub(crate) fn decode_text(
    raw: &[u8],
    offset: u64,
    out: &mut String,
) -> Result<(), CimXmlSyntaxError> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        CimXmlSyntaxError::new(
            "invalid UTF-8 in content",
            offset + e.valid_up_to() as u64,
        )
    })?;

    let mut rest = text;
    let mut rest_offset = offset;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let ref_offset = rest_offset + amp as u64;
        let after = &rest[amp + 1..];
        let Some(semi) = after.find(';') else {
            return Err(CimXmlSyntaxError::new(
                "unterminated entity reference",
                ref_offset,
            ));
        };
        let name = &after[..semi];
        let decoded = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => decode_char_reference(name).ok_or_else(|| {
                let kind = if name.starts_with('#') {
                    "invalid character reference"
                } else {
                    "unknown entity reference"
                };
                CimXmlSyntaxError::new(format!("{kind} '&{name};'"), ref_offset)
            })?,
        };
        out.push(decoded);
        rest = &after[semi + 1..];
        rest_offset = ref_offset + 1 + semi as u64 + 1;
    }
    out.push_str(rest);
    Ok(())
}

fn decode_char_reference(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_classification() {
        assert!(is_xml_whitespace(b' '));
        assert!(is_xml_whitespace(b'\t'));
        assert!(is_xml_whitespace(b'\r'));
        assert!(is_xml_whitespace(b'\n'));
        assert!(!is_xml_whitespace(b'a'));
        assert!(!is_xml_whitespace(b'<'));
    }

    #[test]
    fn test_reversed_equality() {
        assert!(eq_bytes_reversed(b"cim:Location", b"cim:Location"));
        assert!(!eq_bytes_reversed(b"cim:Location", b"cim:Location2"));
        assert!(!eq_bytes_reversed(b"cim:LocationA", b"cim:LocationB"));
        assert!(eq_bytes_reversed(b"", b""));
    }

    #[test]
    fn test_decode_plain_text() {
        let mut out = String::new();
        decode_text(b"Alice", 0, &mut out).unwrap();
        assert_eq!(out, "Alice");
    }

    #[test]
    fn test_decode_predefined_entities() {
        let mut out = String::new();
        decode_text(b"AT&amp;T &lt;ok&gt; &quot;x&quot; &apos;y&apos;", 0, &mut out).unwrap();
        assert_eq!(out, "AT&T <ok> \"x\" 'y'");
    }

    #[test]
    fn test_decode_character_references() {
        let mut out = String::new();
        decode_text(b"&#65;&#x42;&#xe9;", 0, &mut out).unwrap();
        assert_eq!(out, "AB\u{e9}");
    }

    #[test]
    fn test_unknown_entity_is_fatal_with_offset() {
        let mut out = String::new();
        let err = decode_text(b"ab&nbsp;cd", 10, &mut out).unwrap_err();
        assert!(err.to_string().contains("&nbsp;"));
        assert_eq!(err.offset(), 12);
    }

    #[test]
    fn test_unterminated_entity_is_fatal() {
        let mut out = String::new();
        let err = decode_text(b"ab&amp cd", 0, &mut out).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_invalid_character_reference_is_fatal() {
        let mut out = String::new();
        assert!(decode_text(b"&#xDFFF;", 0, &mut out).is_err());
        assert!(decode_text(b"&#notanumber;", 0, &mut out).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let mut out = String::new();
        let err = decode_text(&[b'a', 0xFF, b'b'], 5, &mut out).unwrap_err();
        assert_eq!(err.offset(), 6);
    }
}
