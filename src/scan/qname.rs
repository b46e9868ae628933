//! Qualified-name and token scanners
//!
//! All scanners work forward from the cursor position, refill
//! transparently mid-token, and leave the terminating byte unconsumed.
//! Results are spans into the cursor buffer and must be copied before the
//! retain floor moves past them.

use std::io::Read;

use crate::error::{CimXmlParseError, ParseResult};
use crate::scan::cursor::{ByteCursor, Span};
use crate::scan::is_xml_whitespace;

const NO_COLON: u32 = u32::MAX;

/// A scanned `prefix:local` or bare `local` token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QName {
    pub span: Span,
    /// Offset of the recognized `:` from the token start, or `NO_COLON`.
    colon: u32,
}

impl QName {
    /// A prefixless name over the given range, for tests that only need
    /// span bookkeeping.
    #[cfg(test)]
    pub(crate) fn bare(start: u64, len: u32) -> Self {
        Self {
            span: Span { start, len },
            colon: NO_COLON,
        }
    }

    pub fn has_prefix(&self) -> bool {
        self.colon != NO_COLON
    }

    pub fn bytes<'a, R: Read>(&self, cur: &'a ByteCursor<R>) -> &'a [u8] {
        cur.bytes(self.span)
    }

    /// The bytes before the colon, or `None` for a bare name.
    pub fn prefix_bytes<'a, R: Read>(&self, cur: &'a ByteCursor<R>) -> Option<&'a [u8]> {
        if self.has_prefix() {
            Some(&self.bytes(cur)[..self.colon as usize])
        } else {
            None
        }
    }

    /// The bytes after the colon, or the whole name when bare.
    pub fn local_bytes<'a, R: Read>(&self, cur: &'a ByteCursor<R>) -> &'a [u8] {
        let bytes = self.bytes(cur);
        if self.has_prefix() {
            &bytes[self.colon as usize + 1..]
        } else {
            bytes
        }
    }
}

/// What ends a name scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameKind {
    /// Terminated by whitespace, `>` or `/`.
    Tag,
    /// Terminated by whitespace or `=`.
    Attribute,
}

/// Scans a qualified name. `min_prefix` is the namespace table's shortest
/// registered prefix length: a colon cannot appear before that many bytes,
/// so colon detection starts there. Returns the name and the terminator
/// byte, which stays unconsumed.
pub(crate) fn scan_qname<R: Read>(
    cur: &mut ByteCursor<R>,
    kind: NameKind,
    min_prefix: usize,
) -> ParseResult<(QName, u8)> {
    let start = cur.offset();
    let mut colon = NO_COLON;
    loop {
        let Some(b) = cur.peek()? else {
            return Err(CimXmlParseError::syntax(
                "unexpected end of stream inside name",
                cur.offset(),
            ));
        };
        let len = (cur.offset() - start) as u32;
        let terminated = match kind {
            NameKind::Tag => is_xml_whitespace(b) || b == b'>' || b == b'/',
            NameKind::Attribute => is_xml_whitespace(b) || b == b'=',
        };
        if terminated {
            if len == 0 {
                return Err(CimXmlParseError::syntax("empty name", start));
            }
            if colon != NO_COLON && colon + 1 == len {
                return Err(CimXmlParseError::syntax(
                    "empty local part after ':'",
                    cur.offset(),
                ));
            }
            return Ok((QName { span: Span { start, len }, colon }, b));
        }
        match b {
            b':' if len as usize >= min_prefix => {
                if colon != NO_COLON {
                    return Err(CimXmlParseError::syntax(
                        "qualified name must have at most one prefix separator",
                        cur.offset(),
                    ));
                }
                colon = len;
            }
            b'<' => {
                return Err(CimXmlParseError::syntax("unexpected '<' in name", cur.offset()));
            }
            _ => {}
        }
        cur.advance(1);
    }
}

/// Skips whitespace; returns the first non-whitespace byte unconsumed, or
/// `None` at end-of-stream.
pub(crate) fn skip_whitespace<R: Read>(cur: &mut ByteCursor<R>) -> ParseResult<Option<u8>> {
    loop {
        match cur.peek()? {
            Some(b) if is_xml_whitespace(b) => cur.advance(1),
            other => return Ok(other),
        }
    }
}

/// Scans a quoted attribute value after optional whitespace. Colons are
/// ordinary bytes here; a raw `<` is fatal. The returned span excludes the
/// quotes, which are consumed.
pub(crate) fn scan_attribute_value<R: Read>(cur: &mut ByteCursor<R>) -> ParseResult<Span> {
    skip_whitespace(cur)?;
    let quote = match cur.next_byte()? {
        Some(b @ (b'"' | b'\'')) => b,
        Some(_) => {
            return Err(CimXmlParseError::syntax(
                "expected quoted attribute value",
                cur.offset() - 1,
            ));
        }
        None => {
            return Err(CimXmlParseError::syntax(
                "unexpected end of stream before attribute value",
                cur.offset(),
            ));
        }
    };
    let start = cur.offset();
    loop {
        match cur.peek()? {
            None => {
                return Err(CimXmlParseError::syntax(
                    "unterminated attribute value",
                    cur.offset(),
                ));
            }
            Some(b) if b == quote => {
                let span = Span {
                    start,
                    len: (cur.offset() - start) as u32,
                };
                cur.advance(1);
                return Ok(span);
            }
            Some(b'<') => {
                return Err(CimXmlParseError::syntax(
                    "raw '<' in attribute value",
                    cur.offset(),
                ));
            }
            Some(_) => cur.advance(1),
        }
    }
}

/// Scans character data up to the next `<`, which stays unconsumed. Only
/// legal inside an element, so end-of-stream here is fatal.
pub(crate) fn scan_text_chunk<R: Read>(cur: &mut ByteCursor<R>) -> ParseResult<Span> {
    let start = cur.offset();
    loop {
        match cur.peek()? {
            None => {
                return Err(CimXmlParseError::syntax(
                    "unexpected end of stream inside text content",
                    cur.offset(),
                ));
            }
            Some(b'<') => {
                return Ok(Span {
                    start,
                    len: (cur.offset() - start) as u32,
                });
            }
            Some(_) => cur.advance(1),
        }
    }
}

/// Scans a CDATA section body after `<![CDATA[` has been consumed. The
/// closing `]]>` is consumed; the returned span excludes it.
pub(crate) fn scan_cdata_chunk<R: Read>(cur: &mut ByteCursor<R>) -> ParseResult<Span> {
    let start = cur.offset();
    loop {
        if cur.starts_with(b"]]>")? {
            let span = Span {
                start,
                len: (cur.offset() - start) as u32,
            };
            cur.advance(3);
            return Ok(span);
        }
        if cur.next_byte()?.is_none() {
            return Err(CimXmlParseError::syntax(
                "unterminated CDATA section",
                cur.offset(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::testing::ChunkReader;

    fn cursor(data: &[u8]) -> ByteCursor<ChunkReader<'_>> {
        ByteCursor::with_capacity(ChunkReader::new(data, 3), 16)
    }

    #[test]
    fn test_splits_prefix_and_local() {
        let mut cur = cursor(b"cim:Location ");
        let (q, term) = scan_qname(&mut cur, NameKind::Tag, 3).unwrap();
        assert_eq!(term, b' ');
        assert!(q.has_prefix());
        assert_eq!(q.bytes(&cur), b"cim:Location");
        assert_eq!(q.prefix_bytes(&cur), Some(&b"cim"[..]));
        assert_eq!(q.local_bytes(&cur), b"Location");
    }

    #[test]
    fn test_bare_name_has_no_prefix() {
        let mut cur = cursor(b"Description>");
        let (q, term) = scan_qname(&mut cur, NameKind::Tag, 3).unwrap();
        assert_eq!(term, b'>');
        assert!(!q.has_prefix());
        assert_eq!(q.local_bytes(&cur), b"Description");
    }

    #[test]
    fn test_second_colon_is_fatal() {
        let mut cur = cursor(b"cim:Location:bad>");
        let err = scan_qname(&mut cur, NameKind::Tag, 3).unwrap_err();
        assert!(err
            .to_string()
            .contains("at most one prefix separator"));
    }

    #[test]
    fn test_colon_before_min_prefix_is_not_a_split() {
        // With the default hint of 3 a two-byte prefix is invisible; the
        // namespace table lowers the hint when such a prefix is declared.
        let mut cur = cursor(b"md:Model ");
        let (q, _) = scan_qname(&mut cur, NameKind::Tag, 3).unwrap();
        assert!(!q.has_prefix());
        assert_eq!(q.local_bytes(&cur), b"md:Model");

        let mut cur = cursor(b"md:Model ");
        let (q, _) = scan_qname(&mut cur, NameKind::Tag, 2).unwrap();
        assert!(q.has_prefix());
        assert_eq!(q.prefix_bytes(&cur), Some(&b"md"[..]));
    }

    #[test]
    fn test_empty_local_part_is_fatal() {
        let mut cur = cursor(b"cim: ");
        assert!(scan_qname(&mut cur, NameKind::Tag, 3).is_err());
    }

    #[test]
    fn test_attribute_name_stops_at_equals() {
        let mut cur = cursor(b"rdf:about=\"x\"");
        let (q, term) = scan_qname(&mut cur, NameKind::Attribute, 3).unwrap();
        assert_eq!(term, b'=');
        assert_eq!(q.prefix_bytes(&cur), Some(&b"rdf"[..]));
        assert_eq!(q.local_bytes(&cur), b"about");
    }

    #[test]
    fn test_eof_inside_name_is_fatal() {
        let mut cur = cursor(b"cim:Loc");
        assert!(scan_qname(&mut cur, NameKind::Tag, 3).is_err());
    }

    #[test]
    fn test_value_scanning_ignores_colons_and_handles_both_quotes() {
        let mut cur = cursor(b"= \"http://a/b#c\" ");
        cur.next_byte().unwrap();
        let span = scan_attribute_value(&mut cur).unwrap();
        assert_eq!(cur.bytes(span), b"http://a/b#c");

        let mut cur2 = cursor(b"'x y'");
        let span2 = scan_attribute_value(&mut cur2).unwrap();
        assert_eq!(cur2.bytes(span2), b"x y");
    }

    #[test]
    fn test_unterminated_value_is_fatal() {
        let mut cur = cursor(b"\"abc");
        assert!(scan_attribute_value(&mut cur).is_err());
    }

    #[test]
    fn test_raw_angle_bracket_in_value_is_fatal() {
        let mut cur = cursor(b"\"a<b\"");
        let err = scan_attribute_value(&mut cur).unwrap_err();
        assert!(err.to_string().contains("raw '<'"));
    }

    #[test]
    fn test_text_chunk_stops_at_tag_open() {
        let mut cur = cursor(b"Alice &amp; Bob</ex:name>");
        let span = scan_text_chunk(&mut cur).unwrap();
        assert_eq!(cur.bytes(span), b"Alice &amp; Bob");
        assert_eq!(cur.peek().unwrap(), Some(b'<'));
    }

    #[test]
    fn test_text_chunk_eof_is_fatal() {
        let mut cur = cursor(b"dangling");
        assert!(scan_text_chunk(&mut cur).is_err());
    }

    #[test]
    fn test_cdata_chunk_runs_to_terminator() {
        let mut cur = cursor(b"a < b && c]]>rest");
        let span = scan_cdata_chunk(&mut cur).unwrap();
        assert_eq!(cur.bytes(span), b"a < b && c");
        assert_eq!(cur.peek().unwrap(), Some(b'r'));

        // A lone ']' pair is content, not a terminator.
        let mut cur2 = cursor(b"x]] ]]>");
        let span2 = scan_cdata_chunk(&mut cur2).unwrap();
        assert_eq!(cur2.bytes(span2), b"x]] ");
    }

    #[test]
    fn test_unterminated_cdata_is_fatal() {
        let mut cur = cursor(b"never closed");
        assert!(scan_cdata_chunk(&mut cur).is_err());
    }
}
