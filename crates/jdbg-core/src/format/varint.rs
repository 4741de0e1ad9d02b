//! # Delta-Varint Codec
//!
//! Every address table in a blob is a stream of variable-length integers.
//! Each byte carries 7 bits of magnitude, least significant group first; the
//! high bit says whether another byte follows.
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! +---+---------------------------+
//! | C |  7 bits of magnitude      |   C = 1: more bytes follow
//! +---+---------------------------+
//! ```
//!
//! The accumulator is a 32-bit signed integer with wraparound. Bits shifted
//! past bit 31 are lost, and a group that would start at bit 32 or above
//! contributes nothing. The value `0x7FFFFFFF` is reserved as the
//! end-of-table sentinel.

use crate::error::{JdbgError, JdbgResult};

/// End-of-stream marker for delta tables.
pub const SENTINEL: i32 = 0x7FFF_FFFF;

/// Outcome of decoding one varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarintRead
{
    /// Cursor just past the last byte consumed
    pub next: usize,
    /// Decoded value
    pub value: i32,
    /// `false` exactly when `value` is the [`SENTINEL`]
    pub has_more: bool,
}

impl VarintRead
{
    /// The decoded value reinterpreted as an unsigned 32-bit delta.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn delta(&self) -> u32
    {
        self.value as u32
    }
}

/// Decode one varint starting at `cursor`.
///
/// ## Errors
///
/// Returns [`JdbgError::TruncatedStream`] when the buffer ends before a byte
/// with a clear continuation bit is found.
///
/// ## Example
///
/// ```rust
/// use jdbg_core::format::varint::read_value;
///
/// let data = [0x96, 0x01];
/// let read = read_value(&data, 0)?;
/// assert_eq!(read.value, 150);
/// assert_eq!(read.next, 2);
/// assert!(read.has_more);
/// # Ok::<(), jdbg_core::JdbgError>(())
/// ```
pub fn read_value(data: &[u8], cursor: usize) -> JdbgResult<VarintRead>
{
    let mut position = cursor;
    let mut value: i32 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *data
            .get(position)
            .ok_or_else(|| JdbgError::truncated_at(position, data.len()))?;
        position += 1;

        let group = i32::from(byte & 0x7F).checked_shl(shift).unwrap_or(0);
        value = value.wrapping_add(group);

        if byte & 0x80 == 0 {
            break;
        }
        shift = shift.saturating_add(7);
    }

    Ok(VarintRead {
        next: position,
        value,
        has_more: value != SENTINEL,
    })
}
