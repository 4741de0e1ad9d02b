//! # Blob Format
//!
//! Low-level decoding of the JDBG binary layout: the fixed header and its
//! checksum, the delta-varint integers that make up every table, and the
//! name strings the tables point into.

pub mod header;
pub mod names;
pub mod varint;

pub use header::{BlobHeader, ChecksumStatus, FormatReport, HeaderDefect};
pub use varint::{read_value, VarintRead, SENTINEL};
