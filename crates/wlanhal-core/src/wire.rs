//! Tagged wire codec for request/response buffers
//!
//! Every field in a wire message is written as a one-byte type tag followed
//! by the field payload. Readers name the type they expect; a mismatched tag
//! is an error rather than a silently reinterpreted value, so reading fields
//! in the wrong order can never corrupt a decode.
//!
//! Integers are little-endian. Strings are UTF-8 with a u16 length prefix,
//! opaque buffers carry a u32 length prefix.

use core::convert::TryInto;

use crate::errors::WireError;

// ----------------------------------------------------------------------------
// Field Tags
// ----------------------------------------------------------------------------

/// Type tag preceding every encoded field
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    U8 = 0x01,
    U32 = 0x02,
    I32 = 0x03,
    U64 = 0x04,
    Str = 0x05,
    Bytes = 0x06,
}

impl FieldTag {
    pub fn from_u8(value: u8) -> Result<Self, WireError> {
        match value {
            0x01 => Ok(FieldTag::U8),
            0x02 => Ok(FieldTag::U32),
            0x03 => Ok(FieldTag::I32),
            0x04 => Ok(FieldTag::U64),
            0x05 => Ok(FieldTag::Str),
            0x06 => Ok(FieldTag::Bytes),
            _ => Err(WireError::UnknownTag(value)),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldTag::U8 => "u8",
            FieldTag::U32 => "u32",
            FieldTag::I32 => "i32",
            FieldTag::U64 => "u64",
            FieldTag::Str => "string",
            FieldTag::Bytes => "bytes",
        }
    }
}

/// Longest permitted string field
pub const MAX_STR_LEN: usize = u16::MAX as usize;

/// Longest permitted opaque buffer field
pub const MAX_BYTES_LEN: usize = 1 << 20;

// ----------------------------------------------------------------------------
// Writer
// ----------------------------------------------------------------------------

/// Appends tagged fields to a flat buffer
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn tag(&mut self, tag: FieldTag) -> &mut Self {
        self.buf.push(tag as u8);
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.tag(FieldTag::U8).buf.push(value);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.tag(FieldTag::U32)
            .buf
            .extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.tag(FieldTag::I32)
            .buf
            .extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.tag(FieldTag::U64)
            .buf
            .extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_str(&mut self, value: &str) -> Result<&mut Self, WireError> {
        if value.len() > MAX_STR_LEN {
            return Err(WireError::FieldTooLarge {
                len: value.len(),
                max: MAX_STR_LEN,
            });
        }
        self.tag(FieldTag::Str)
            .buf
            .extend_from_slice(&(value.len() as u16).to_le_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        Ok(self)
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<&mut Self, WireError> {
        if value.len() > MAX_BYTES_LEN {
            return Err(WireError::FieldTooLarge {
                len: value.len(),
                max: MAX_BYTES_LEN,
            });
        }
        self.tag(FieldTag::Bytes)
            .buf
            .extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(value);
        Ok(self)
    }

    /// Consume the writer and return the encoded buffer
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Reader
// ----------------------------------------------------------------------------

/// Consumes tagged fields from a flat buffer
#[derive(Debug)]
pub struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize, wanted: &'static str) -> Result<&'a [u8], WireError> {
        if self.data.len() < self.offset + len {
            return Err(WireError::Truncated { wanted });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn expect_tag(&mut self, expected: FieldTag) -> Result<(), WireError> {
        let raw = self.take(1, expected.name())?[0];
        let found = FieldTag::from_u8(raw)?;
        if found != expected {
            // Roll back so a caller can retry with the right type
            self.offset -= 1;
            return Err(WireError::TypeMismatch {
                expected: expected.name(),
                found: raw,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        self.expect_tag(FieldTag::U8)?;
        Ok(self.take(1, "u8")?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        self.expect_tag(FieldTag::U32)?;
        let bytes: [u8; 4] = self.take(4, "u32")?.try_into().expect("4-byte slice");
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        self.expect_tag(FieldTag::I32)?;
        let bytes: [u8; 4] = self.take(4, "i32")?.try_into().expect("4-byte slice");
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        self.expect_tag(FieldTag::U64)?;
        let bytes: [u8; 8] = self.take(8, "u64")?.try_into().expect("8-byte slice");
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_str(&mut self) -> Result<String, WireError> {
        self.expect_tag(FieldTag::Str)?;
        let len_bytes: [u8; 2] = self.take(2, "string")?.try_into().expect("2-byte slice");
        let len = u16::from_le_bytes(len_bytes) as usize;
        let raw = self.take(len, "string")?;
        core::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        self.expect_tag(FieldTag::Bytes)?;
        let len_bytes: [u8; 4] = self.take(4, "bytes")?.try_into().expect("4-byte slice");
        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > MAX_BYTES_LEN {
            return Err(WireError::FieldTooLarge {
                len,
                max: MAX_BYTES_LEN,
            });
        }
        Ok(self.take(len, "bytes")?.to_vec())
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// The unconsumed tail of the buffer, for splitting a frame into a
    /// fixed prefix and a command-specific body
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Assert the buffer was fully consumed
    pub fn finish(self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WireError::TrailingBytes(n)),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
