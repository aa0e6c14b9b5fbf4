//! Low-level wire primitives for the binary manifest encoding.
//!
//! The compiled manifest uses protobuf wire framing: every field is a
//! varint key `(field_number << 3) | wire_type` followed by a payload whose
//! shape depends on the wire type. This module provides the strict readers
//! and writers the document codec is built on. Readers carry an absolute
//! byte offset so decode failures can point at the exact position in the
//! original buffer even when parsing nested messages.

use crate::{Error, Result};

/// Wire type for varint-encoded scalars (ints, bools, enums).
pub const WIRE_VARINT: u8 = 0;
/// Wire type for length-delimited payloads (strings, bytes, sub-messages).
pub const WIRE_LEN: u8 = 2;
/// Wire type for fixed 32-bit little-endian scalars (floats).
pub const WIRE_FIXED32: u8 = 5;

/// Longest legal varint: 10 bytes carry 70 bits, enough for any u64.
const MAX_VARINT_BYTES: usize = 10;

/// A strict cursor over one wire-encoded message.
///
/// Unlike a general protobuf reader there is no skip support: the document
/// schema is closed, so any field the codec does not recognize is a decode
/// error rather than something to step over.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Offset of `buf[0]` within the original document buffer.
    base: u64,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over a whole document buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, base: 0 }
    }

    /// Creates a reader over a nested message slice.
    ///
    /// `base` is the absolute offset of the slice within the original
    /// buffer, used for error reporting.
    pub fn with_base(buf: &'a [u8], base: u64) -> Self {
        Self { buf, pos: 0, base }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn err(&self, at: u64, reason: impl Into<String>) -> Error {
        Error::malformed_document(at, reason)
    }

    /// Reads a base-128 varint.
    ///
    /// Each byte contributes 7 payload bits, least-significant group first;
    /// the high bit marks continuation. Rejects varints longer than 10
    /// bytes and truncated input.
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.offset();
        let mut value = 0u64;
        for i in 0..MAX_VARINT_BYTES {
            let byte = match self.buf.get(self.pos) {
                Some(&b) => b,
                None => return Err(self.err(self.offset(), "truncated varint")),
            };
            self.pos += 1;
            // The 10th byte may only carry the final bit of a u64.
            if i == MAX_VARINT_BYTES - 1 && byte > 0x01 {
                return Err(self.err(start, "varint overflows 64 bits"));
            }
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(self.err(start, "varint exceeds 10 bytes"))
    }

    /// Reads a field key, returning `(field_number, wire_type)`.
    pub fn read_key(&mut self) -> Result<(u32, u8)> {
        let start = self.offset();
        let key = self.read_varint()?;
        let field = key >> 3;
        let wire_type = (key & 0x07) as u8;
        if field == 0 || field > u64::from(u32::MAX >> 3) {
            return Err(self.err(start, format!("invalid field number {field}")));
        }
        Ok((field as u32, wire_type))
    }

    /// Checks that a key's wire type matches what the schema declares.
    pub fn expect_wire_type(&self, field: u32, actual: u8, expected: u8) -> Result<()> {
        if actual != expected {
            return Err(self.err(
                self.offset(),
                format!("field {field}: wire type {actual}, expected {expected}"),
            ));
        }
        Ok(())
    }

    /// Reads a length-delimited payload, returning the sub-slice and its
    /// absolute offset.
    pub fn read_len_prefixed(&mut self) -> Result<(&'a [u8], u64)> {
        let start = self.offset();
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| self.err(start, format!("length {len} exceeds address space")))?;
        let data_offset = self.offset();
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| self.err(start, format!("length {len} overruns buffer")))?;
        // Copy the reference so the returned slice borrows the underlying
        // buffer for 'a rather than this reader.
        let buf = self.buf;
        let slice = &buf[self.pos..end];
        self.pos = end;
        Ok((slice, data_offset))
    }

    /// Reads a length-delimited UTF-8 string field.
    pub fn read_string(&mut self) -> Result<String> {
        let (bytes, offset) = self.read_len_prefixed()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| self.err(offset, "invalid UTF-8 in string field"))
    }

    /// Reads a fixed 32-bit little-endian scalar.
    pub fn read_fixed32(&mut self) -> Result<u32> {
        let start = self.offset();
        let end = self.pos + 4;
        if end > self.buf.len() {
            return Err(self.err(start, "truncated fixed32"));
        }
        let value = u32::from_le_bytes(self.buf[self.pos..end].try_into().unwrap());
        self.pos = end;
        Ok(value)
    }

    /// Reads a varint and narrows it to u32, rejecting out-of-range values.
    pub fn read_varint_u32(&mut self) -> Result<u32> {
        let start = self.offset();
        let value = self.read_varint()?;
        u32::try_from(value).map_err(|_| self.err(start, format!("value {value} exceeds u32")))
    }

    /// Reads a varint as a sign-extended 32-bit integer.
    ///
    /// Negative int32 values are encoded as 10-byte sign-extended varints;
    /// truncating the low 32 bits recovers the value in either case.
    pub fn read_varint_i32(&mut self) -> Result<i32> {
        Ok(self.read_varint()? as i32)
    }
}

/// Writes a base-128 varint.
///
/// This is the inverse of [`WireReader::read_varint`].
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Writes a field key.
pub fn write_key(out: &mut Vec<u8>, field: u32, wire_type: u8) {
    write_varint(out, (u64::from(field) << 3) | u64::from(wire_type));
}

/// Writes a length-delimited field: key, payload length, payload.
pub fn write_len_field(out: &mut Vec<u8>, field: u32, payload: &[u8]) {
    write_key(out, field, WIRE_LEN);
    write_varint(out, payload.len() as u64);
    out.extend_from_slice(payload);
}

/// Writes a string field, eliding the empty string as the canonical
/// encoding does.
pub fn write_string_field(out: &mut Vec<u8>, field: u32, value: &str) {
    if !value.is_empty() {
        write_len_field(out, field, value.as_bytes());
    }
}

/// Writes a varint scalar field, eliding zero.
pub fn write_varint_field(out: &mut Vec<u8>, field: u32, value: u64) {
    if value != 0 {
        write_key(out, field, WIRE_VARINT);
        write_varint(out, value);
    }
}

/// Writes a varint scalar field unconditionally.
///
/// Used for oneof members, whose presence is significant even at the
/// default value.
pub fn write_varint_field_always(out: &mut Vec<u8>, field: u32, value: u64) {
    write_key(out, field, WIRE_VARINT);
    write_varint(out, value);
}

/// Writes a fixed 32-bit scalar field unconditionally.
pub fn write_fixed32_field(out: &mut Vec<u8>, field: u32, value: u32) {
    write_key(out, field, WIRE_FIXED32);
    out.extend_from_slice(&value.to_le_bytes());
}

/// Writes a sign-extended 32-bit integer as a varint field,
/// unconditionally.
pub fn write_varint_i32_field(out: &mut Vec<u8>, field: u32, value: i32) {
    write_varint_field_always(out, field, value as i64 as u64);
}
