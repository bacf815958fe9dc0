//! Sequential byte sources for the decoder.
//!
//! [`Reader`] only requires single-byte and chunk access; the wide big-endian
//! reads are composed from [`Reader::read_byte`] by default. [`SliceReader`]
//! overrides them with direct reads from its backing buffer.

use std::io::{self, Read as _};

use crate::error::{CborError, Result};

pub trait Reader {
    /// Returns the next byte without consuming it, or `None` at end of input.
    fn peek_byte(&mut self) -> Result<Option<u8>>;

    fn read_byte(&mut self) -> Result<u8>;

    /// Returns the next `len` bytes as an owned buffer.
    ///
    /// Fails with [`CborError::TruncatedInput`] if fewer than `len` bytes remain.
    fn read_chunk(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;

    fn read_u16(&mut self) -> Result<u16> {
        let hi = self.read_byte()? as u16;
        let lo = self.read_byte()? as u16;
        Ok(hi * 256 + lo)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let hi = self.read_u16()? as u32;
        let lo = self.read_u16()? as u32;
        Ok(hi * 65536 + lo)
    }

    fn read_u64(&mut self) -> Result<u64> {
        let hi = self.read_u32()? as u64;
        let lo = self.read_u32()? as u64;
        Ok((hi << 32) | lo)
    }
}

impl<R: Reader + ?Sized> Reader for &mut R {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        (**self).peek_byte()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn read_chunk(&mut self, len: usize) -> Result<Vec<u8>> {
        (**self).read_chunk(len)
    }

    fn position(&self) -> usize {
        (**self).position()
    }

    fn read_u16(&mut self) -> Result<u16> {
        (**self).read_u16()
    }

    fn read_u32(&mut self) -> Result<u32> {
        (**self).read_u32()
    }

    fn read_u64(&mut self) -> Result<u64> {
        (**self).read_u64()
    }
}

/// Cursor over a borrowed, fully materialized buffer.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        SliceReader { buf, pos: 0 }
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consumes exactly `N` bytes as a fixed-size array.
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| CborError::TruncatedInput {
                needed: end - self.buf.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }
}

impl Reader for SliceReader<'_> {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.buf.get(self.pos).copied())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or(CborError::TruncatedInput { needed: 1 })?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_chunk(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.remaining() {
            return Err(CborError::TruncatedInput {
                needed: len - self.remaining(),
            });
        }
        let chunk = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(chunk)
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take()?))
    }
}

/// Adapts any [`io::Read`] into a [`Reader`] with one byte of lookahead.
///
/// Wide reads use the default byte-by-byte composition, so wrap unbuffered
/// sources in [`io::BufReader`].
pub struct IoReader<R: io::Read> {
    inner: R,
    peeked: Option<u8>,
    pos: usize,
}

impl<R: io::Read> IoReader<R> {
    pub fn new(inner: R) -> Self {
        IoReader {
            inner,
            peeked: None,
            pos: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill_peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut buf = [0u8; 1];
            loop {
                match self.inner.read(&mut buf) {
                    Ok(0) => return Ok(None),
                    Ok(_) => {
                        self.peeked = Some(buf[0]);
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(self.peeked)
    }
}

impl<R: io::Read> Reader for IoReader<R> {
    fn peek_byte(&mut self) -> Result<Option<u8>> {
        self.fill_peek()
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = self
            .fill_peek()?
            .ok_or(CborError::TruncatedInput { needed: 1 })?;
        self.peeked = None;
        self.pos += 1;
        Ok(byte)
    }

    fn read_chunk(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(crate::PREALLOC_LIMIT));
        if len > 0 {
            if let Some(byte) = self.peeked.take() {
                out.push(byte);
            }
        }
        let wanted = (len - out.len()) as u64;
        let read = (&mut self.inner).take(wanted).read_to_end(&mut out)?;
        if (read as u64) < wanted {
            return Err(CborError::TruncatedInput {
                needed: (wanted - read as u64) as usize,
            });
        }
        self.pos += len;
        Ok(out)
    }

    fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_reader_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x01, 0x02];
        let mut reader = SliceReader::new(&data);
        assert_eq!(reader.read_u64().unwrap(), 0x123456789abcdef0);
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.peek_byte().unwrap(), None);
    }

    #[test]
    fn test_slice_reader_peek_does_not_advance() {
        let data = [0xff, 0x01];
        let mut reader = SliceReader::new(&data);
        assert_eq!(reader.peek_byte().unwrap(), Some(0xff));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_byte().unwrap(), 0xff);
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_slice_reader_truncated_chunk() {
        let data = [1, 2];
        let mut reader = SliceReader::new(&data);
        let err = reader.read_chunk(4).unwrap_err();
        assert!(matches!(err, CborError::TruncatedInput { needed: 2 }));
        // a failed read leaves the cursor untouched
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_slice_reader_truncated_wide_read() {
        let data = [0xaa, 0xbb];
        let mut reader = SliceReader::new(&data);
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, CborError::TruncatedInput { needed: 2 }));
    }

    #[test]
    fn test_io_reader_default_composition_matches_slice_reader() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0xca, 0xfe, 0xba, 0xbe];
        let mut slice = SliceReader::new(&data);
        let mut io = IoReader::new(&data[..]);

        assert_eq!(slice.read_u64().unwrap(), io.read_u64().unwrap());
        assert_eq!(slice.read_u16().unwrap(), io.read_u16().unwrap());
        assert_eq!(io.peek_byte().unwrap(), Some(0xba));
        assert_eq!(io.read_chunk(2).unwrap(), vec![0xba, 0xbe]);
        assert_eq!(io.position(), data.len());
        assert_eq!(io.peek_byte().unwrap(), None);
    }

    #[test]
    fn test_io_reader_truncated_chunk() {
        let data = [1u8, 2, 3];
        let mut reader = IoReader::new(&data[..]);
        assert_eq!(reader.peek_byte().unwrap(), Some(1));
        let err = reader.read_chunk(5).unwrap_err();
        assert!(matches!(err, CborError::TruncatedInput { needed: 2 }));
    }
}
