//! Bounded per-connection buffers
//!
//! `InputBuffer` dialokasi sekali per slot dan tidak pernah tumbuh.
//! `OutputBuffer` memegang satu response utuh (header + body) dan cursor
//! berapa byte yang sudah terkirim.

use std::io::{self, Read};

/// Fixed-capacity request buffer
///
/// The last byte is never filled, so at most `capacity - 1` bytes of request
/// are accumulated. Reaching that limit without a header terminator is the
/// "request too large" condition.
pub struct InputBuffer {
    data: Box<[u8]>,
    used: usize,
}

impl InputBuffer {
    /// # Panics
    /// Panics if `capacity < 2`; config validation rules that out.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 2, "input buffer needs at least 2 bytes");
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Maximum number of bytes that will ever be accumulated.
    #[inline(always)]
    pub fn limit(&self) -> usize {
        self.data.len() - 1
    }

    #[inline(always)]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.used >= self.limit()
    }

    /// Accumulated bytes (zero-copy view)
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// One `read` call into the spare space.
    ///
    /// Returns `Ok(0)` only for end-of-stream; callers check `is_full` first.
    #[inline]
    pub fn fill_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<usize> {
        let limit = self.limit();
        let n = source.read(&mut self.data[self.used..limit])?;
        // A reader claiming more than it was given is a bug in the reader.
        let n = n.min(limit - self.used);
        self.used += n;
        Ok(n)
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.used = 0;
    }
}

/// Owned response bytes plus a send cursor
///
/// `sent <= total` is kept by `advance`, which never moves past the end.
#[derive(Debug)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    sent: usize,
}

impl OutputBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, sent: 0 }
    }

    #[inline(always)]
    pub fn total(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Bytes still to be written
    #[inline(always)]
    pub fn remaining(&self) -> &[u8] {
        &self.bytes[self.sent..]
    }

    #[inline(always)]
    pub fn advance(&mut self, n: usize) {
        self.sent += n.min(self.bytes.len() - self.sent);
    }

    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.sent == self.bytes.len()
    }
}
