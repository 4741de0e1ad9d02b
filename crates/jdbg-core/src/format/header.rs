//! # Blob Header & Checksum
//!
//! Every blob starts with a packed, little-endian header:
//!
//! | Offset | Field             | Type |
//! |--------|-------------------|------|
//! | 0      | `signature`       | u32  |
//! | 4      | `version`         | u8   |
//! | 5      | `units`           | i32  |
//! | 9      | `source_names`    | i32  |
//! | 13     | `symbols`         | i32  |
//! | 17     | `line_numbers`    | i32  |
//! | 21     | `words`           | i32  |
//! | 25     | `module_name`     | i32  |
//! | 29     | `check_sum`       | i32  |
//! | 33     | `check_sum_valid` | bool |
//!
//! ## Checksum
//!
//! The writer stores the wrapping sum of all 32-bit little-endian words of the
//! blob, taken with the checksum field zeroed. The reader sums the words of
//! the blob as stored, seeded with the negated checksum, and rotates the
//! result right by 8 bits. Because the field sits at the unaligned offset 29,
//! its own bytes contribute exactly `stored.rotate_left(8)` to the sum, so the
//! rotated value equals the stored one only for an unmodified blob.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{JdbgError, JdbgResult};

/// `JDBG` read as a little-endian `u32`.
pub const SIGNATURE: u32 = 0x4742_444A;
/// The only header version this crate understands.
pub const VERSION: u8 = 1;
/// Size of the packed header in bytes.
pub const HEADER_SIZE: usize = 34;
/// Byte offset of the `check_sum` field.
pub const CHECKSUM_OFFSET: usize = 29;

/// Parsed fixed-size header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobHeader
{
    pub signature: u32,
    pub version: u8,
    /// Start of the module (unit) table
    pub units: i32,
    /// Start of the source file table
    pub source_names: i32,
    /// Start of the procedure table
    pub symbols: i32,
    /// Start of the line number table
    pub line_numbers: i32,
    /// Base of the name-data region
    pub words: i32,
    /// Name reference for the blob's own module
    pub module_name: i32,
    pub check_sum: i32,
    /// Whether the writer recorded a checksum
    pub check_sum_valid: bool,
}

impl BlobHeader
{
    /// Read the header fields from the start of `data`.
    ///
    /// Returns `None` when the buffer is shorter than [`HEADER_SIZE`]. No
    /// field is validated here; see [`FormatReport::inspect`].
    #[must_use]
    pub fn parse(data: &[u8]) -> Option<Self>
    {
        let raw: &[u8; HEADER_SIZE] = data.get(..HEADER_SIZE)?.try_into().ok()?;
        let word = |offset: usize| [raw[offset], raw[offset + 1], raw[offset + 2], raw[offset + 3]];

        Some(Self {
            signature: u32::from_le_bytes(word(0)),
            version: raw[4],
            units: i32::from_le_bytes(word(5)),
            source_names: i32::from_le_bytes(word(9)),
            symbols: i32::from_le_bytes(word(13)),
            line_numbers: i32::from_le_bytes(word(17)),
            words: i32::from_le_bytes(word(21)),
            module_name: i32::from_le_bytes(word(25)),
            check_sum: i32::from_le_bytes(word(CHECKSUM_OFFSET)),
            check_sum_valid: raw[33] != 0,
        })
    }

    /// The stored checksum as an unsigned word.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn stored_checksum(&self) -> u32
    {
        self.check_sum as u32
    }
}

/// First structural check a buffer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDefect
{
    /// No bytes at all
    Empty,
    /// Not longer than the header
    TooShort
    {
        len: usize
    },
    /// Length is not a multiple of 4
    Misaligned
    {
        len: usize
    },
    /// Signature is not `JDBG`
    BadSignature(u32),
    /// Unknown header version
    BadVersion(u8),
}

impl fmt::Display for HeaderDefect
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Empty => write!(f, "buffer is empty"),
            Self::TooShort { len } => write!(f, "{len} bytes is not longer than the {HEADER_SIZE}-byte header"),
            Self::Misaligned { len } => write!(f, "length {len} is not a multiple of 4"),
            Self::BadSignature(signature) => {
                write!(f, "signature 0x{signature:08x} does not match 0x{SIGNATURE:08x}")
            }
            Self::BadVersion(version) => write!(f, "version {version} is not supported (expected {VERSION})"),
        }
    }
}

/// Outcome of the checksum verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus
{
    /// The header failed a structural check, so no checksum was computed
    Skipped,
    /// The validity byte is clear, so nothing was verified
    NotPresent,
    /// Computed value matches the stored one
    Valid,
    /// Computed value differs from the stored one
    Mismatch
    {
        stored: u32, computed: u32
    },
}

/// Compute the rotated rolling checksum over the whole buffer.
///
/// Trailing bytes that do not fill a whole word are ignored; such a buffer
/// never passes the structural checks anyway.
#[must_use]
pub fn compute_checksum(data: &[u8], stored: u32) -> u32
{
    let sum = data
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .fold(stored.wrapping_neg(), u32::wrapping_add);
    sum.rotate_right(8)
}

/// Structural and integrity assessment of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatReport
{
    pub header: Option<BlobHeader>,
    pub defect: Option<HeaderDefect>,
    pub checksum: ChecksumStatus,
}

impl FormatReport
{
    /// Parse the header and run every check against `data`.
    #[must_use]
    pub fn inspect(data: &[u8]) -> Self
    {
        let header = BlobHeader::parse(data);
        let defect = find_defect(data, header.as_ref());

        let checksum = match header {
            Some(header) if defect.is_none() => {
                if header.check_sum_valid {
                    let stored = header.stored_checksum();
                    let computed = compute_checksum(data, stored);
                    if computed == stored {
                        ChecksumStatus::Valid
                    } else {
                        warn!(stored, computed, "debug blob checksum mismatch");
                        ChecksumStatus::Mismatch { stored, computed }
                    }
                } else {
                    ChecksumStatus::NotPresent
                }
            }
            _ => ChecksumStatus::Skipped,
        };

        debug!(len = data.len(), ?defect, ?checksum, "inspected debug blob");
        Self {
            header,
            defect,
            checksum,
        }
    }

    /// All structural checks passed.
    #[must_use]
    pub fn valid_format(&self) -> bool
    {
        self.defect.is_none()
    }

    /// Structurally valid, with a recorded checksum that matches.
    ///
    /// A clear validity byte leaves nothing to verify against, so such a blob
    /// is not valid.
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.valid_format() && self.checksum == ChecksumStatus::Valid
    }

    /// Turn the assessment into an error for callers that insist on a trusted
    /// blob.
    ///
    /// ## Errors
    ///
    /// [`JdbgError::MalformedHeader`] for a structural defect,
    /// [`JdbgError::ChecksumMismatch`] for a failed checksum and
    /// [`JdbgError::ChecksumNotRecorded`] when the validity byte is clear.
    pub fn require_valid(&self) -> JdbgResult<()>
    {
        if let Some(defect) = self.defect {
            return Err(JdbgError::MalformedHeader(defect));
        }
        match self.checksum {
            ChecksumStatus::Valid => Ok(()),
            ChecksumStatus::Mismatch { stored, computed } => Err(JdbgError::ChecksumMismatch { stored, computed }),
            ChecksumStatus::NotPresent | ChecksumStatus::Skipped => Err(JdbgError::ChecksumNotRecorded),
        }
    }
}

fn find_defect(data: &[u8], header: Option<&BlobHeader>) -> Option<HeaderDefect>
{
    let len = data.len();
    if data.is_empty() {
        return Some(HeaderDefect::Empty);
    }
    let header = match header {
        Some(header) if len > HEADER_SIZE => header,
        _ => return Some(HeaderDefect::TooShort { len }),
    };
    if len % 4 != 0 {
        return Some(HeaderDefect::Misaligned { len });
    }
    if header.signature != SIGNATURE {
        return Some(HeaderDefect::BadSignature(header.signature));
    }
    if header.version != VERSION {
        return Some(HeaderDefect::BadVersion(header.version));
    }
    None
}
