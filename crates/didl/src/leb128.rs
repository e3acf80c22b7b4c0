//! Canonical LEB128 / SLEB128 for 32-bit integers.
//!
//! Readers accept only the shortest encoding of a value and at most
//! `MAX_LEB128_LEN` bytes. Writers always produce the shortest encoding.

use crate::buffer::Buffer;
use crate::types::Error;
use crate::types::Result;

/// Five groups of seven bits cover 32 bits.
pub const MAX_LEB128_LEN: usize = 5;

/// Reads an unsigned LEB128 value that must fit in a `u32`.
pub fn read_u32(buf: &mut Buffer<'_>) -> Result<u32> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = buf.read_byte()?;
        if shift > 0 && byte == 0x00 {
            // a trailing zero group adds nothing
            return Err(Error::NonCanonicalEncoding);
        }
        if shift == 28 && byte & 0xF0 != 0x00 {
            // the fifth byte may carry 4 bits and must be the last
            return Err(Error::IntegerOverflow);
        }
        result |= u32::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
}

/// Reads a signed LEB128 value that must fit in an `i32`.
pub fn read_i32(buf: &mut Buffer<'_>) -> Result<i32> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;
    let mut sign = false;
    loop {
        let byte = buf.read_byte()?;
        if shift == 28 && !matches!(byte & 0xF0, 0x00 | 0x70) {
            return Err(Error::IntegerOverflow);
        }
        if shift > 0 && ((!sign && byte == 0x00) || (sign && byte == 0x7F)) {
            // the group only repeats the sign extension of the previous one
            return Err(Error::NonCanonicalEncoding);
        }
        sign = byte & 0x40 != 0;
        result |= u32::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            break;
        }
    }
    if shift < 32 && sign {
        result |= u32::MAX << shift;
    }
    Ok(result as i32)
}

pub fn write_u32(out: &mut Vec<u8>, mut v: u32) {
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn write_i32(out: &mut Vec<u8>, mut v: i32) {
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        let sign = byte & 0x40 != 0;
        if (v == 0 && !sign) || (v == -1 && sign) {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
