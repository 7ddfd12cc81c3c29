//! Binary encoding of protocol values.
//!
//! All integers are big endian. Variable length byte strings are prefixed by their
//! length. Decoding must consume the whole input.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Error decoding a binary encoded value.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unexpected end of input: {0}")]
    UnexpectedEnd(#[from] std::io::Error),
    #[error("Unknown tag {0}")]
    UnknownTag(u8),
    #[error("Invalid boolean value {0}")]
    InvalidBool(u8),
    #[error("Invalid UTF-8 in name")]
    InvalidUtf8,
    #[error("Length {length} exceeds the maximum of {max}")]
    LengthExceeded { length: u64, max: u64 },
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(u64),
    #[error("Non-canonical encoding: {0}")]
    NonCanonical(&'static str),
}

/// Values with a canonical binary encoding.
pub trait Serial {
    /// Append the encoding of `self` to `out`.
    fn serial(&self, out: &mut Vec<u8>);

    /// The encoding of `self`.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serial(&mut out);
        out
    }
}

impl Serial for u8 {
    fn serial(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }
}

impl Serial for u16 {
    fn serial(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Serial for u32 {
    fn serial(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Serial for u64 {
    fn serial(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Serial for bool {
    fn serial(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

/// Append a byte string prefixed by its length as a `u16`. Longer strings are truncated,
/// which never happens for values that passed decoding.
pub fn serial_bytes_u16(bytes: &[u8], out: &mut Vec<u8>) {
    let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
    len.serial(out);
    out.extend_from_slice(&bytes[..usize::from(len)]);
}

/// Append a byte string prefixed by its length as a `u32`.
pub fn serial_bytes_u32(bytes: &[u8], out: &mut Vec<u8>) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    len.serial(out);
    out.extend_from_slice(&bytes[..len as usize]);
}

/// Cursor over an input being decoded.
pub struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Decoder {
            cursor: Cursor::new(bytes),
        }
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.cursor.read_u8()?)
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    pub fn u64(&mut self) -> Result<u64, DecodeError> {
        Ok(self.cursor.read_u64::<BigEndian>()?)
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    pub fn array_32(&mut self) -> Result<[u8; 32], DecodeError> {
        let mut array = [0u8; 32];
        self.cursor.read_exact(&mut array)?;
        Ok(array)
    }

    /// Read exactly `len` bytes.
    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        let remaining = self.remaining();
        if len as u64 > remaining {
            return Err(DecodeError::LengthExceeded {
                length: len as u64,
                max: remaining,
            });
        }
        let mut bytes = vec![0u8; len];
        self.cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Read a byte string prefixed by a `u16` length, of at most `max` bytes.
    pub fn bytes_u16(&mut self, max: usize) -> Result<Vec<u8>, DecodeError> {
        let len = usize::from(self.u16()?);
        if len > max {
            return Err(DecodeError::LengthExceeded {
                length: len as u64,
                max: max as u64,
            });
        }
        self.bytes(len)
    }

    /// Read a byte string prefixed by a `u32` length, of at most `max` bytes.
    pub fn bytes_u32(&mut self, max: usize) -> Result<Vec<u8>, DecodeError> {
        let len = self.u32()? as usize;
        if len > max {
            return Err(DecodeError::LengthExceeded {
                length: len as u64,
                max: max as u64,
            });
        }
        self.bytes(len)
    }

    /// Read a UTF-8 string prefixed by a `u16` length, of at most `max` bytes.
    pub fn string_u16(&mut self, max: usize) -> Result<String, DecodeError> {
        String::from_utf8(self.bytes_u16(max)?).map_err(|_| DecodeError::InvalidUtf8)
    }

    fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    /// Finish decoding, checking that the whole input was consumed.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            trailing => Err(DecodeError::TrailingBytes(trailing)),
        }
    }
}
