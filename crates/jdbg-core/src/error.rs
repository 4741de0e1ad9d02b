//! # Error Types
//!
//! General error handling for blob decoding and address resolution.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Note that an address that no table covers is *not* an error: resolvers
//! return their documented empty value (`""`, `(0, 0)`) for it.

use thiserror::Error;

use crate::format::header::HeaderDefect;

/// Main error type for decoding and resolution
///
/// ## Error Categories
///
/// 1. **Structural errors**: MalformedHeader (size, alignment, signature, version)
/// 2. **Integrity errors**: ChecksumMismatch, ChecksumNotRecorded
/// 3. **Decode errors**: TruncatedStream (a varint or name would read past the buffer)
///
/// Structural and integrity errors describe the blob as a whole. With the
/// default best-effort policy they are only reported by the validity
/// accessors; with [`ValidationPolicy::Strict`](crate::ValidationPolicy::Strict)
/// every resolution call on a suspect blob fails with them.
///
/// `TruncatedStream` is scoped to a single query: other addresses whose
/// lookups never reach the damaged bytes still resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JdbgError
{
    /// The fixed header failed a structural check
    ///
    /// This happens when:
    /// - The buffer is empty or not longer than the header
    /// - The buffer length is not a multiple of 4
    /// - The signature or version does not match the JDBG format
    #[error("Malformed debug blob header: {0}")]
    MalformedHeader(HeaderDefect),

    /// The rolling checksum disagrees with the value stored in the header
    ///
    /// The blob was corrupted after it was written, or was patched without
    /// recomputing the checksum.
    #[error("Checksum mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch
    {
        /// Value stored in the header
        stored: u32,
        /// Value computed over the buffer
        computed: u32,
    },

    /// The header's validity byte is clear, so the blob cannot be verified
    #[error("Checksum not recorded: the blob cannot be verified")]
    ChecksumNotRecorded,

    /// A read would have gone past the end of the buffer
    ///
    /// Raised by the varint codec when a continuation byte is missing, by the
    /// name decoder when a string runs off the end without its terminator, and
    /// for offsets (table starts, name references) that point outside the blob.
    #[error("Truncated stream: read at offset {offset} past end of {len}-byte blob")]
    TruncatedStream
    {
        /// Offset of the byte that could not be read (may be negative for
        /// corrupt offsets)
        offset: i64,
        /// Length of the blob
        len: usize,
    },
}

impl JdbgError
{
    pub(crate) fn truncated(offset: i64, len: usize) -> Self
    {
        Self::TruncatedStream { offset, len }
    }

    pub(crate) fn truncated_at(position: usize, len: usize) -> Self
    {
        Self::truncated(i64::try_from(position).unwrap_or(i64::MAX), len)
    }
}

/// Convenience type alias for `Result<T, JdbgError>`
///
/// ```rust
/// use jdbg_core::error::JdbgResult;
/// fn foo() -> JdbgResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type JdbgResult<T> = std::result::Result<T, JdbgError>;
