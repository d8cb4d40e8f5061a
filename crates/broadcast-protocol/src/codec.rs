//! Little-endian cursor codec for broadcasting datagrams.
//!
//! [`PacketReader`] walks a borrowed byte slice and fails with
//! [`DecodeError::UnexpectedEnd`] when a field asks for more bytes than
//! remain. [`PacketWriter`] mirrors every read operation; both sides use
//! little-endian for all multi-byte fields, integers and floats alike.

use crate::{DecodeError, EncodeError};

/// Cursor over one inbound datagram.
pub struct PacketReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left in the datagram.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Consume exactly `len` bytes.
    ///
    /// # Errors
    /// Returns [`DecodeError::UnexpectedEnd`] if fewer than `len` bytes remain.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.offset.checked_add(len).ok_or(DecodeError::UnexpectedEnd {
            offset: self.offset,
            needed: len,
            remaining: self.remaining(),
        })?;
        if end > self.data.len() {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let offset = self.offset;
        let remaining = self.remaining();
        let bytes = self.read_exact(N)?;
        <[u8; N]>::try_from(bytes).map_err(|_| DecodeError::UnexpectedEnd {
            offset,
            needed: N,
            remaining,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? > 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// IEEE-754 single, little-endian. Non-finite values decode to `0.0`.
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let value = f32::from_le_bytes(self.read_array()?);
        Ok(if value.is_finite() { value } else { 0.0 })
    }

    /// Length-prefixed string: `u16` byte length, then that many bytes.
    ///
    /// The game appends garbage bytes to names it cannot represent, so the
    /// payload is decoded leniently: valid UTF-8 chunks are kept, everything
    /// else is dropped. The cursor always advances by the full prefixed
    /// length.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = usize::from(self.read_u16()?);
        let raw = self.read_exact(len)?;
        let mut out = String::with_capacity(raw.len());
        for chunk in raw.utf8_chunks() {
            out.push_str(chunk.valid());
        }
        Ok(out)
    }
}

/// Growable buffer mirroring [`PacketReader`] field by field.
#[derive(Default)]
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a `u16`-length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns [`EncodeError::StringTooLong`] if the string does not fit the
    /// `u16` length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        let bytes = value.as_bytes();
        let len = u16::try_from(bytes.len()).map_err(|_| EncodeError::StringTooLong(bytes.len()))?;
        self.write_u16(len);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
