//! Input stream wrapper with read-ahead.
//!
//! Format detection needs to look at the first bytes of the input before the
//! selected parser consumes it from the beginning. [`DocumentStream`] buffers
//! whatever has been peeked and replays it to later readers, so the underlying
//! source never needs to be seekable.

use std::io::{self, Read};

/// A forward-only byte stream that supports bounded look-ahead.
///
/// Owns the caller's reader for the duration of one extraction. Dropping the
/// stream drops the reader, which is how input resources are released.
pub struct DocumentStream<'a> {
    inner: Box<dyn Read + 'a>,
    buffer: Vec<u8>,
    position: usize,
    eof: bool,
}

impl<'a> DocumentStream<'a> {
    pub fn new<R: Read + 'a>(reader: R) -> Self {
        Self {
            inner: Box::new(reader),
            buffer: Vec::new(),
            position: 0,
            eof: false,
        }
    }

    /// Stream over an in-memory byte slice.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }

    /// Return up to `len` upcoming bytes without consuming them.
    ///
    /// Fewer bytes are returned only when the input ends first.
    pub fn peek(&mut self, len: usize) -> io::Result<&[u8]> {
        let wanted = self.position + len;
        if self.buffer.len() < wanted && !self.eof {
            let missing = wanted - self.buffer.len();
            let read = (&mut self.inner).take(missing as u64).read_to_end(&mut self.buffer)?;
            if read < missing {
                self.eof = true;
            }
        }
        let end = wanted.min(self.buffer.len());
        Ok(&self.buffer[self.position..end])
    }

    /// Read the rest of the input into memory and return it without consuming it.
    pub fn buffer_all(&mut self) -> io::Result<&[u8]> {
        if !self.eof {
            self.inner.read_to_end(&mut self.buffer)?;
            self.eof = true;
        }
        Ok(&self.buffer[self.position..])
    }

    /// Consume and return the rest of the input.
    pub fn read_remaining(&mut self) -> io::Result<Vec<u8>> {
        self.buffer_all()?;
        let rest = self.buffer.split_off(self.position);
        self.buffer.clear();
        self.position = 0;
        Ok(rest)
    }

    /// Number of bytes held in the look-ahead buffer and not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.position
    }
}

impl Read for DocumentStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position < self.buffer.len() {
            let available = &self.buffer[self.position..];
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            self.position += n;
            if self.position == self.buffer.len() {
                self.buffer.clear();
                self.position = 0;
            }
            return Ok(n);
        }
        if self.eof {
            return Ok(0);
        }
        self.inner.read(buf)
    }
}

impl Drop for DocumentStream<'_> {
    fn drop(&mut self) {
        tracing::trace!("input stream released");
    }
}
