use std::io;

/// Default size used by the appender to pick its buffer capacity and flush
/// threshold.
pub const PAGE_SIZE: usize = 4096;

/// Owned, growable byte region reused across encode calls.
///
/// Besides appending, the buffer supports reserving a fixed-width slot and
/// overwriting it later. The encoder uses that to write a value first and
/// its length prefix afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Buffer {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Drop the contents while keeping the allocation.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Shrink back to `len` bytes. Used to discard a partially written record.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn push(&mut self, b: u8) {
        self.data.push(b);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn push_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Grow by `n` zero bytes and return the new region for in-place writes.
    pub fn extend_zeroed(&mut self, n: usize) -> &mut [u8] {
        let start = self.data.len();
        self.data.resize(start + n, 0);
        &mut self.data[start..]
    }

    /// Reserve eight bytes for a little-endian `u64` and return their offset.
    pub fn reserve_u64(&mut self) -> usize {
        let at = self.data.len();
        self.data.extend_from_slice(&[0u8; 8]);
        at
    }

    /// Overwrite the eight bytes at `at` with `v` in little-endian order.
    ///
    /// Panics if the slot lies outside the written region; callers only pass
    /// offsets obtained from [`Buffer::reserve_u64`].
    pub fn patch_u64_le(&mut self, at: usize, v: u64) {
        self.data[at..at + 8].copy_from_slice(&v.to_le_bytes());
    }

    /// Bytes written since `start`.
    pub fn since(&self, start: usize) -> &[u8] {
        &self.data[start..]
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reserve_and_patch_length() {
        let mut buf = Buffer::new();
        buf.push_str("K\n");
        let at = buf.reserve_u64();
        let start = buf.len();
        buf.push_str("value");
        let n = buf.len() - start;
        buf.patch_u64_le(at, n as u64);

        assert_eq!(&buf.as_bytes()[2..10], &[5, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(buf.since(start), b"value");
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut buf = Buffer::with_capacity(64);
        write!(buf, "{}-{}", 1, 2).unwrap();
        assert_eq!(buf.as_bytes(), b"1-2");

        buf.reset();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 64);
    }

    #[test]
    fn truncate_discards_tail() {
        let mut buf = Buffer::new();
        buf.push_str("keep");
        let mark = buf.len();
        buf.extend_zeroed(3).copy_from_slice(b"xyz");
        buf.truncate(mark);
        assert_eq!(buf.as_bytes(), b"keep");
    }
}
