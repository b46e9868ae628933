//! Sliding byte buffer over the input stream
//!
//! The cursor owns the only mutable copy of recently-read bytes. Scanners
//! advance its position directly and record [`Span`]s, which are absolute
//! stream offsets rather than buffer indexes, so compaction never
//! invalidates a recorded span as long as its bytes are still buffered.
//!
//! The *retain floor* marks the earliest byte that must survive a refill:
//! the parser pins it at the start of each construct (an opening tag, a
//! text run) and releases it once the construct has been handled. When the
//! buffer fills up, bytes below the floor are discarded by sliding the
//! tail to the front; when the floor itself is at the front, the buffer
//! grows instead.

use std::io::{self, Read};

pub(crate) const DEFAULT_CAPACITY: usize = 8 * 1024;

/// A contiguous byte range of the input stream.
///
/// Resolved against the cursor via [`ByteCursor::bytes`]; only valid while
/// the retain floor has not moved past `start`. Lengths fit `u32`; the
/// tokens of this dialect are far smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: u64,
    pub len: u32,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub(crate) struct ByteCursor<R> {
    reader: R,
    buf: Vec<u8>,
    /// Next unread index into `buf`.
    pos: usize,
    /// Filled-to-exclusive bound. Invariant: floor <= pos <= end <= buf.len().
    end: usize,
    /// Compaction floor: bytes at `floor..end` survive refills.
    floor: usize,
    /// Absolute stream offset of `buf[0]`.
    origin: u64,
    eof: bool,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buf: vec![0; capacity.max(16)],
            pos: 0,
            end: 0,
            floor: 0,
            origin: 0,
            eof: false,
        }
    }

    /// Absolute stream offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.origin + self.pos as u64
    }

    /// Moves the retain floor up to the current position. Spans recorded
    /// before this call must already have been copied out.
    pub fn release(&mut self) {
        self.floor = self.pos;
    }

    fn available(&self) -> usize {
        self.end - self.pos
    }

    /// Reads more bytes, compacting or growing first if the buffer is
    /// full. Returns false only at end-of-stream.
    fn try_fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.end == self.buf.len() {
            if self.floor > 0 {
                self.buf.copy_within(self.floor..self.end, 0);
                self.pos -= self.floor;
                self.end -= self.floor;
                self.origin += self.floor as u64;
                self.floor = 0;
            } else {
                // The whole buffer backs live spans; a single construct
                // larger than the buffer forces growth.
                let doubled = self.buf.len() * 2;
                self.buf.resize(doubled, 0);
            }
        }
        loop {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Refills until at least `n` bytes are readable; returns the number
    /// actually available, which is smaller only at end-of-stream.
    pub fn ensure(&mut self, n: usize) -> io::Result<usize> {
        while self.available() < n {
            if !self.try_fill()? {
                break;
            }
        }
        Ok(self.available())
    }

    /// The next byte without consuming it, or `None` at end-of-stream.
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.pos == self.end && !self.try_fill()? {
            return Ok(None);
        }
        Ok(Some(self.buf[self.pos]))
    }

    /// Consumes and returns the next byte, or `None` at end-of-stream.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }

    /// Consumes `n` already-ensured bytes.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.available());
        self.pos += n;
    }

    /// True when the next bytes equal `lit`, refilling as needed. Does not
    /// consume.
    pub fn starts_with(&mut self, lit: &[u8]) -> io::Result<bool> {
        if self.ensure(lit.len())? < lit.len() {
            return Ok(false);
        }
        Ok(&self.buf[self.pos..self.pos + lit.len()] == lit)
    }

    /// Consumes input through the next occurrence of `delim`. Returns
    /// false if the stream ends first.
    pub fn skip_until(&mut self, delim: &[u8]) -> io::Result<bool> {
        debug_assert!(!delim.is_empty());
        loop {
            match self.next_byte()? {
                None => return Ok(false),
                Some(b) if b == delim[0] => {
                    if self.starts_with(&delim[1..])? {
                        self.advance(delim.len() - 1);
                        return Ok(true);
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Resolves a recorded span against the buffer.
    ///
    /// The span's bytes must still be retained, i.e. the floor has not
    /// moved past `span.start` since it was recorded.
    pub fn bytes(&self, span: Span) -> &[u8] {
        debug_assert!(span.start >= self.origin + self.floor as u64);
        let start = (span.start - self.origin) as usize;
        &self.buf[start..start + span.len as usize]
    }

    /// Skips a UTF-8 byte-order mark at the very start of the stream.
    pub fn skip_bom(&mut self) -> io::Result<()> {
        if self.starts_with(b"\xEF\xBB\xBF")? {
            self.advance(3);
            self.release();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::testing::ChunkReader;

    #[test]
    fn test_sequential_reads_across_refills() {
        let data = b"abcdefghijklmnop";
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(data, 3), 16);
        let mut seen = Vec::new();
        while let Some(b) = cur.next_byte().unwrap() {
            seen.push(b);
            cur.release();
        }
        assert_eq!(seen, data);
        assert_eq!(cur.offset(), data.len() as u64);
    }

    #[test]
    fn test_span_survives_compaction() {
        let data = b"0123456789abcdefghij";
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(data, 4), 16);
        // Consume and release the first 8 bytes.
        for _ in 0..8 {
            cur.next_byte().unwrap();
        }
        cur.release();
        // Record a span over "89ab" while the floor pins it.
        let start = cur.offset();
        for _ in 0..4 {
            cur.next_byte().unwrap();
        }
        let span = Span { start, len: 4 };
        // Reading past capacity forces compaction down to the floor.
        for _ in 0..8 {
            cur.next_byte().unwrap();
        }
        assert_eq!(cur.bytes(span), b"89ab");
        assert_eq!(cur.offset(), 20);
    }

    #[test]
    fn test_buffer_grows_when_floor_pinned_at_start() {
        let data = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(data, 7), 16);
        let start = cur.offset();
        for _ in 0..data.len() {
            cur.next_byte().unwrap();
        }
        let span = Span {
            start,
            len: data.len() as u32,
        };
        assert_eq!(cur.bytes(span), data);
        assert_eq!(cur.next_byte().unwrap(), None);
    }

    #[test]
    fn test_starts_with_across_chunk_boundary() {
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(b"<!--x-->", 2), 16);
        assert!(cur.starts_with(b"<!--").unwrap());
        assert!(!cur.starts_with(b"<!DO").unwrap());
        cur.advance(4);
        assert!(cur.skip_until(b"-->").unwrap());
        assert_eq!(cur.peek().unwrap(), None);
    }

    #[test]
    fn test_skip_until_handles_partial_matches() {
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(b"a--b--->rest", 3), 16);
        assert!(cur.skip_until(b"-->").unwrap());
        let mut rest = Vec::new();
        while let Some(b) = cur.next_byte().unwrap() {
            rest.push(b);
        }
        assert_eq!(rest, b"rest");
    }

    #[test]
    fn test_skip_until_reports_eof() {
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(b"no marker here", 5), 16);
        assert!(!cur.skip_until(b"-->").unwrap());
    }

    #[test]
    fn test_bom_is_skipped_only_at_start() {
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(b"\xEF\xBB\xBF<x>", 2), 16);
        cur.skip_bom().unwrap();
        assert_eq!(cur.next_byte().unwrap(), Some(b'<'));
        assert_eq!(cur.offset(), 4);

        let mut plain = ByteCursor::with_capacity(ChunkReader::new(b"<x>", 2), 16);
        plain.skip_bom().unwrap();
        assert_eq!(plain.next_byte().unwrap(), Some(b'<'));
    }

    #[test]
    fn test_ensure_reports_short_input_at_eof() {
        let mut cur = ByteCursor::with_capacity(ChunkReader::new(b"ab", 1), 16);
        assert_eq!(cur.ensure(5).unwrap(), 2);
        assert_eq!(cur.next_byte().unwrap(), Some(b'a'));
    }
}
