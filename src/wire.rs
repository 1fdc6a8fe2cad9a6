use std::mem::size_of;

use bytes::{BufMut, BytesMut};

use crate::sockaddr::SockAddr;

/// Native word (`long`) width, the unit the routing socket aligns embedded addresses to.
pub const WORD: usize = size_of::<usize>();

/// Rounds `len` up to the next multiple of the native word. A zero-length address still takes up one word, matching the kernel's `SA_SIZE`.
pub const fn align_word(len: usize) -> usize {
    if len == 0 { WORD } else { len.next_multiple_of(WORD) }
}

/// Append-only builder for kernel request images. All writes go through the cursor, so nothing is ever written past the end of the image.
#[derive(Debug)]
pub struct WireBuilder {
    buf: BytesMut,
}

impl WireBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16_ne(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_ne(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32_ne(value);
    }

    pub fn put_zeroes(&mut self, count: usize) {
        self.buf.put_bytes(0, count);
    }

    /// Fixed-width, NUL-padded name field. The caller guarantees `name` leaves room for the terminator.
    pub fn put_name(&mut self, name: &str, width: usize) {
        debug_assert!(name.len() < width);
        self.buf.put_slice(name.as_bytes());
        self.buf.put_bytes(0, width - name.len());
    }

    /// Address embedded in a fixed struct field: exactly its own size, no padding.
    pub fn put_sockaddr(&mut self, sockaddr: &SockAddr) {
        sockaddr.encode(&mut self.buf);
    }

    /// Address appended to a routing message: padded to the native word.
    pub fn put_sockaddr_aligned(&mut self, sockaddr: &SockAddr) {
        let end = self.len() + align_word(sockaddr.sa_len());
        sockaddr.encode(&mut self.buf);
        self.pad_to(end);
    }

    /// Zero-fills up to the next multiple of `alignment`.
    pub fn align_to(&mut self, alignment: usize) {
        self.pad_to(self.len().next_multiple_of(alignment));
    }

    fn pad_to(&mut self, end: usize) {
        self.buf.put_bytes(0, end - self.len());
    }

    /// Overwrites an already written native-endian `u16`, e.g. a length field that is only known once the image is complete.
    pub fn set_u16(&mut self, offset: usize, value: u16) {
        self.buf[offset..offset + 2].copy_from_slice(&value.to_ne_bytes());
    }

    pub fn finish(self) -> BytesMut {
        self.buf
    }
}
