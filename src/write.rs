//! Byte sinks for the encoder.
//!
//! [`Writer`] requires only byte and chunk appends; the wide big-endian writes
//! are composed from [`Writer::write_byte`]. [`SegmentedWriter`] accumulates
//! output in fixed-size segments and joins them once in [`Writer::result`].

use std::mem;

/// Size of each in-progress segment held by [`SegmentedWriter`].
pub const SEGMENT_SIZE: usize = 16 * 1024;

pub trait Writer {
    fn write_byte(&mut self, byte: u8);

    fn write_chunk(&mut self, chunk: &[u8]);

    /// Consumes the writer and returns everything written as one buffer.
    fn result(self) -> Vec<u8>
    where
        Self: Sized;

    fn write_u16(&mut self, value: u16) {
        self.write_byte((value >> 8) as u8);
        self.write_byte((value & 0xff) as u8);
    }

    fn write_u32(&mut self, value: u32) {
        self.write_u16((value >> 16) as u16);
        self.write_u16((value & 0xffff) as u16);
    }

    fn write_u64(&mut self, value: u64) {
        self.write_u32((value >> 32) as u32);
        self.write_u32((value & 0xffff_ffff) as u32);
    }
}

impl Writer for Vec<u8> {
    fn write_byte(&mut self, byte: u8) {
        self.push(byte);
    }

    fn write_chunk(&mut self, chunk: &[u8]) {
        self.extend_from_slice(chunk);
    }

    fn result(self) -> Vec<u8> {
        self
    }

    fn write_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.extend_from_slice(&value.to_be_bytes());
    }
}

/// Accumulates output in segments of [`SEGMENT_SIZE`] bytes.
///
/// Large chunks are kept as their own segment instead of being split, so the
/// only full copy of the payload happens in [`Writer::result`].
#[derive(Debug)]
pub struct SegmentedWriter {
    complete: Vec<Vec<u8>>,
    current: Vec<u8>,
    segment_size: usize,
    len: usize,
}

impl Default for SegmentedWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentedWriter {
    pub fn new() -> Self {
        Self::with_segment_size(SEGMENT_SIZE)
    }

    /// Creates a writer with a custom segment size (minimum 1).
    pub fn with_segment_size(segment_size: usize) -> Self {
        let segment_size = segment_size.max(1);
        SegmentedWriter {
            complete: Vec::new(),
            current: Vec::with_capacity(segment_size),
            segment_size,
            len: 0,
        }
    }

    /// Total number of bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of completed segments, not counting the one in progress.
    pub fn segment_count(&self) -> usize {
        self.complete.len()
    }

    fn rotate(&mut self) {
        let full = mem::replace(&mut self.current, Vec::with_capacity(self.segment_size));
        if !full.is_empty() {
            self.complete.push(full);
        }
    }
}

impl Writer for SegmentedWriter {
    fn write_byte(&mut self, byte: u8) {
        self.current.push(byte);
        if self.current.len() >= self.segment_size {
            self.rotate();
        }
        self.len += 1;
    }

    fn write_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        if self.current.is_empty() {
            self.complete.push(chunk.to_vec());
        } else if self.segment_size - self.current.len() >= chunk.len() {
            self.current.extend_from_slice(chunk);
            if self.current.len() >= self.segment_size {
                self.rotate();
            }
        } else {
            self.rotate();
            self.complete.push(chunk.to_vec());
        }
        self.len += chunk.len();
    }

    fn result(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for segment in &self.complete {
            out.extend_from_slice(segment);
        }
        out.extend_from_slice(&self.current);
        debug_assert_eq!(out.len(), self.len);
        out
    }
}
