//! Bounded byte capture for diagnostic output.
//!
//! A misbehaving child can write arbitrary amounts to its error stream; the
//! reader keeps only the most recent `cap` bytes and accounts for anything it
//! had to drop.

use std::collections::VecDeque;
use std::fmt;

/// Fixed-capacity byte buffer that retains the tail of what was written.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: VecDeque<u8>,
    cap: usize,
    total_in: usize,
}

impl RingBuffer {
    /// Create a buffer that retains at most `cap` bytes.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(cap.min(4096)),
            cap,
            total_in: 0,
        }
    }

    /// Append bytes, dropping from the front once `cap` is exceeded.
    pub fn write(&mut self, bytes: &[u8]) {
        self.total_in += bytes.len();

        if bytes.len() >= self.cap {
            // The new chunk alone fills the buffer; everything older is gone.
            self.data.clear();
            self.data.extend(&bytes[bytes.len() - self.cap..]);
            return;
        }

        let excess = (self.data.len() + bytes.len()).saturating_sub(self.cap);
        if excess > 0 {
            self.data.drain(..excess);
        }
        self.data.extend(bytes);
    }

    /// Drop all retained bytes and reset the write accounting.
    pub fn reset(&mut self) {
        self.data.clear();
        self.total_in = 0;
    }

    /// Number of bytes currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total bytes ever written, including any that were dropped.
    #[must_use]
    pub const fn total_bytes_written(&self) -> usize {
        self.total_in
    }

    /// True if any bytes were dropped to stay within the cap.
    #[must_use]
    pub fn was_truncated(&self) -> bool {
        self.total_in > self.data.len()
    }

    /// Copy the retained bytes out in write order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let (front, back) = self.data.as_slices();
        let mut out = Vec::with_capacity(self.data.len());
        out.extend_from_slice(front);
        out.extend_from_slice(back);
        out
    }
}

impl fmt::Display for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retains_everything_under_cap() {
        let mut buf = RingBuffer::new(16);
        buf.write(b"abc");
        buf.write(b"def");
        assert_eq!(buf.to_vec(), b"abcdef");
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.total_bytes_written(), 6);
        assert!(!buf.was_truncated());
    }

    #[test]
    fn drops_oldest_bytes_first() {
        let mut buf = RingBuffer::new(8);
        buf.write(b"12345678");
        buf.write(b"AB");
        assert_eq!(buf.to_vec(), b"345678AB");
        assert_eq!(buf.total_bytes_written(), 10);
        assert!(buf.was_truncated());
    }

    #[test]
    fn oversized_single_write_keeps_tail() {
        let mut buf = RingBuffer::new(4);
        buf.write(b"hello world");
        assert_eq!(buf.to_vec(), b"orld");
        assert_eq!(buf.total_bytes_written(), 11);
        assert!(buf.was_truncated());
    }

    #[test]
    fn write_exactly_at_cap_is_not_truncated() {
        let mut buf = RingBuffer::new(5);
        buf.write(b"12345");
        assert_eq!(buf.to_vec(), b"12345");
        assert!(!buf.was_truncated());
    }

    #[test]
    fn reset_clears_contents_and_accounting() {
        let mut buf = RingBuffer::new(4);
        buf.write(b"123456");
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.total_bytes_written(), 0);
        assert!(!buf.was_truncated());
        buf.write(b"ok");
        assert_eq!(buf.to_vec(), b"ok");
    }

    #[test]
    fn display_is_lossy_utf8() {
        let mut buf = RingBuffer::new(16);
        buf.write(b"ok \xff\xfe");
        let text = buf.to_string();
        assert!(text.starts_with("ok "));
    }

    #[test]
    fn empty_buffer() {
        let buf = RingBuffer::new(8);
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.to_vec(), Vec::<u8>::new());
        assert!(!buf.was_truncated());
    }
}
