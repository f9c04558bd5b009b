//! Line reader over a hashing, buffered byte source.
//!
//! Header lines and raw payload runs are read from the same `BufReader`,
//! whose buffer holds bytes the hashing layer has already counted. The
//! source offset of the next unread byte is therefore
//! `bytes_read - buffered`, computed in one place by [`SectionReader::position`].

use std::io::{self, BufRead, BufReader, Read};

use super::hashing::HashingReader;

/// Longest accepted header line, excluding its terminator.
pub const MAX_LINE_LEN: usize = 4096;

/// Upper bound for the read buffer.
pub const MAX_READ_BUFFER: usize = 4096;

/// Lower bound for the read buffer.
const MIN_READ_BUFFER: usize = 16;

/// Outcome of reading one header line.
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// A line with its `\n` or `\r\n` terminator removed.
    Text(&'a [u8]),
    /// The line exceeds [`MAX_LINE_LEN`].
    TooLong,
    /// No bytes left.
    End,
}

/// Pick a read buffer size from an approximate source size.
///
/// One byte is added for the final read at end of file, then the size is
/// capped at [`MAX_READ_BUFFER`] and rounded down to a power of two.
/// An unknown size (0) gets the full buffer.
pub fn read_buffer_size(approximate_size: u64) -> usize {
    if approximate_size == 0 {
        return MAX_READ_BUFFER;
    }
    let size = approximate_size
        .saturating_add(1)
        .min(MAX_READ_BUFFER as u64) as usize;
    (1usize << size.ilog2()).max(MIN_READ_BUFFER)
}

/// Reads header lines and payloads of a message in one forward pass.
pub struct SectionReader<R> {
    reader: BufReader<HashingReader<R>>,
    line: Vec<u8>,
    line_number: usize,
}

impl<R: Read> SectionReader<R> {
    pub fn new(inner: R, approximate_size: u64) -> Self {
        Self {
            reader: BufReader::with_capacity(
                read_buffer_size(approximate_size),
                HashingReader::new(inner),
            ),
            line: Vec::with_capacity(256),
            line_number: 0,
        }
    }

    /// 1-based physical line number of the most recent header line.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Source offset of the next byte a caller would receive.
    pub fn position(&self) -> u64 {
        self.reader.get_ref().bytes_read() - self.reader.buffer().len() as u64
    }

    /// Read the next header line.
    pub fn next_line(&mut self) -> io::Result<Line<'_>> {
        self.line.clear();
        let mut started = false;
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            if !started {
                started = true;
                self.line_number += 1;
            }
            let (take, done) = match memchr_newline(buf) {
                Some(pos) => (pos + 1, true),
                None => (buf.len(), false),
            };
            self.line.extend_from_slice(&buf[..take]);
            self.reader.consume(take);
            // Allow room for a "\r\n" terminator before giving up.
            if self.line.len() > MAX_LINE_LEN + 2 {
                return Ok(Line::TooLong);
            }
            if done {
                break;
            }
        }
        if !started {
            return Ok(Line::End);
        }

        let mut end = self.line.len();
        if end > 0 && self.line[end - 1] == b'\n' {
            end -= 1;
            if end > 0 && self.line[end - 1] == b'\r' {
                end -= 1;
            }
        }
        if end > MAX_LINE_LEN {
            return Ok(Line::TooLong);
        }
        Ok(Line::Text(&self.line[..end]))
    }

    /// Read up to `size` raw bytes; fewer are returned only at end of stream.
    pub fn read_payload(&mut self, size: u64) -> io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(size as usize);
        (&mut self.reader).take(size).read_to_end(&mut data)?;
        self.line_number += count_newlines(&data);
        Ok(data)
    }

    /// Skip up to `size` raw bytes, returning how many were skipped.
    ///
    /// Skipped bytes still pass through the hashing layer.
    pub fn skip_payload(&mut self, size: u64) -> io::Result<u64> {
        let mut remaining = size;
        while remaining > 0 {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            let take = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            self.line_number += count_newlines(&buf[..take]);
            self.reader.consume(take);
            remaining -= take as u64;
        }
        Ok(size - remaining)
    }

    /// Stop reading and return the digest of every byte read from the source.
    ///
    /// Call after [`Line::End`]; bytes left in the buffer are hashed but
    /// were never parsed.
    pub fn finish(self) -> [u8; 32] {
        self.reader.into_inner().finalize()
    }
}

/// Fast newline search (equivalent to memchr for `\n`).
#[inline]
fn memchr_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

fn count_newlines(data: &[u8]) -> usize {
    data.iter().filter(|&&b| b == b'\n').count()
}
