use crate::types::Error;
use crate::types::Result;

/// A bounds-checked read cursor over a borrowed message.
///
/// Every read checks the requested span against the end of the slice before
/// touching it. A failed read leaves the cursor where it was; callers are
/// expected to abandon the decode anyway.
#[derive(Debug, Clone)]
pub struct Buffer<'a> {
    slice: &'a [u8],
    pos: usize,
}

impl<'a> Buffer<'a> {
    /// Create a buffer at the start of `slice`.
    pub fn new(slice: &'a [u8]) -> Self {
        Self { slice, pos: 0 }
    }

    /// A new buffer over the same bytes, positioned at `pos`.
    pub fn at(&self, pos: usize) -> Result<Self> {
        if pos > self.slice.len() {
            return Err(Error::OutOfBounds {
                needed: pos,
                remaining: self.slice.len(),
            });
        }
        Ok(Self { slice: self.slice, pos })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.slice.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread bytes.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.slice[self.pos..]
    }

    pub(crate) fn full_slice(&self) -> &'a [u8] {
        self.slice
    }

    #[inline]
    fn need(&self, n: usize) -> Result<()> {
        let remaining = self.remaining();
        if n > remaining {
            Err(Error::OutOfBounds { needed: n, remaining })
        } else {
            Ok(())
        }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.need(1)?;
        let byte = self.slice[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    pub fn peek_byte(&self) -> Result<u8> {
        self.need(1)?;
        Ok(self.slice[self.pos])
    }

    /// Reads four bytes as a little-endian word.
    pub fn read_word(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.need(len)?;
        let bytes = &self.slice[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Skips `len` bytes without looking at them.
    pub fn advance(&mut self, len: usize) -> Result<()> {
        self.need(len)?;
        self.pos += len;
        Ok(())
    }
}
