//! # jdbg-core
//!
//! Decoder and address resolver for JDBG debug-information blobs.
//!
//! A JDBG blob is a compact, self-contained description of a compiled image:
//! which module, source file, line and procedure every code address belongs
//! to. It is small enough to ship next to (or inside) a release build, so a
//! crash handler can turn a raw instruction address into a readable location
//! without external symbol files.
//!
//! This crate provides:
//! - Header parsing, structural validation and checksum verification
//! - The delta-varint and name-string codecs the tables are built from
//! - Address resolution with either a streaming or a cached lookup strategy
//!
//! ## Example
//!
//! ```rust,no_run
//! use jdbg_core::DebugInfo;
//!
//! let info = DebugInfo::new(std::fs::read("app.jdbg")?);
//! let line = info.line(0x1234u32)?;
//! println!("{} line {} (+{})", info.source_file(0x1234u32)?, line.line, line.offset);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod debug_info;
pub mod error;
pub mod format;
pub mod prelude;
pub mod tables;
pub mod types;

pub use debug_info::{DebugInfo, LookupStrategy, ResolveOptions, ValidationPolicy};
// Re-export commonly used types
pub use error::{JdbgError, JdbgResult};
pub use format::{ChecksumStatus, HeaderDefect};
pub use tables::{Entry, TableKind};
pub use types::{Address, LineInfo, ProcedureInfo, ProcedureName, ResolvedLocation};
