//! # Name Strings
//!
//! Module, file and procedure names live in the name-data region of a blob
//! and are referenced by offset. The first byte at that offset selects the
//! encoding:
//!
//! - `1`: XOR-obfuscated literal, NUL terminated. Every byte other than
//!   `0xAA` is XORed with `0xAA`.
//! - `2`: 6-bit packed string that is logically prefixed with `@`.
//! - anything else: 6-bit packed string starting at that very byte.
//!
//! Packed strings store four characters in three bytes (A..D below) and end
//! at the first 6-bit code `0`:
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! B1  B0  A5  A4  A3  A2  A1  A0   byte 0
//! C3  C2  C1  C0  B5  B4  B3  B2   byte 1
//! D5  D4  D3  D2  D1  D0  C5  C4   byte 2
//! ```
//!
//! Codes `0x0A`, `0x24` and `0x3E` have no character assigned and are
//! emitted as the raw code.

use smallvec::SmallVec;
use tracing::warn;

use crate::error::{JdbgError, JdbgResult};

/// Marker byte for an XOR-obfuscated literal name.
pub const LITERAL_MARKER: u8 = 1;
/// Marker byte for a packed name with a leading `@`.
pub const AT_PREFIX_MARKER: u8 = 2;
/// Key used by the literal encoding.
pub const XOR_KEY: u8 = 0xAA;
/// Longest name the packed decoder produces, prefix included.
pub const MAX_NAME_LEN: usize = 255;

type NameBuffer = SmallVec<[u8; 64]>;

/// Decode the name string stored at `offset`.
///
/// ## Errors
///
/// Returns [`JdbgError::TruncatedStream`] if `offset` is outside the buffer
/// or the string runs off the end before its terminator.
pub fn decode_name(data: &[u8], offset: usize) -> JdbgResult<String>
{
    match byte_at(data, offset)? {
        LITERAL_MARKER => decode_literal(data, offset + 1),
        AT_PREFIX_MARKER => decode_packed(data, offset + 1, Some(b'@')),
        _ => decode_packed(data, offset, None),
    }
}

/// Decode a name payload word from one of the tables.
///
/// A value of `0` means "no name". Any other value `v` refers to the name at
/// `v + words_base - 1`, where `words_base` is the header's `words` offset.
///
/// ## Errors
///
/// Returns [`JdbgError::TruncatedStream`] when the computed offset lies
/// outside the buffer or the name itself is truncated.
pub fn name_from_ref(data: &[u8], words_base: i32, value: i64) -> JdbgResult<String>
{
    if value == 0 {
        return Ok(String::new());
    }

    let offset = value + i64::from(words_base) - 1;
    let offset = usize::try_from(offset).map_err(|_| JdbgError::truncated(offset, data.len()))?;
    decode_name(data, offset)
}

fn byte_at(data: &[u8], position: usize) -> JdbgResult<u8>
{
    data.get(position)
        .copied()
        .ok_or_else(|| JdbgError::truncated_at(position, data.len()))
}

fn decode_literal(data: &[u8], start: usize) -> JdbgResult<String>
{
    let tail = data
        .get(start..)
        .ok_or_else(|| JdbgError::truncated_at(start, data.len()))?;
    let end = tail
        .iter()
        .position(|&byte| byte == 0)
        .ok_or_else(|| JdbgError::truncated_at(data.len(), data.len()))?;

    let name: NameBuffer = tail[..end]
        .iter()
        .map(|&byte| if byte == XOR_KEY { byte } else { byte ^ XOR_KEY })
        .collect();
    Ok(String::from_utf8_lossy(&name).into_owned())
}

fn decode_packed(data: &[u8], start: usize, prefix: Option<u8>) -> JdbgResult<String>
{
    let mut name = NameBuffer::new();
    name.extend(prefix);

    let mut position = start;
    let mut phase: u8 = 0;

    while name.len() < MAX_NAME_LEN {
        let code = match phase & 0x03 {
            0 => byte_at(data, position)? & 0x3F,
            1 => {
                let low = (byte_at(data, position)? >> 6) & 0x03;
                position += 1;
                low | ((byte_at(data, position)? & 0x0F) << 2)
            }
            2 => {
                let low = (byte_at(data, position)? >> 4) & 0x0F;
                position += 1;
                low | ((byte_at(data, position)? & 0x03) << 4)
            }
            _ => {
                let code = (byte_at(data, position)? >> 2) & 0x3F;
                position += 1;
                code
            }
        };

        if code == 0 {
            return Ok(String::from_utf8_lossy(&name).into_owned());
        }
        name.push(char_for_code(code));
        phase = phase.wrapping_add(1);
    }

    warn!(offset = start, limit = MAX_NAME_LEN, "packed name reached length limit without terminator");
    Ok(String::from_utf8_lossy(&name).into_owned())
}

/// Map a 6-bit code to its character byte.
#[must_use]
pub fn char_for_code(code: u8) -> u8
{
    match code {
        0x01..=0x09 => code - 0x01 + b'0',
        0x0B..=0x23 => code - 0x0B + b'A',
        0x25..=0x3D => code - 0x25 + b'a',
        0x3F => b'_',
        _ => code,
    }
}
