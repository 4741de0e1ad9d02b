//! Common module for library exports

pub use crate::debug_info::{DebugInfo, LookupStrategy, ResolveOptions, ValidationPolicy};
pub use crate::error::{JdbgError, JdbgResult};
pub use crate::format::{BlobHeader, ChecksumStatus, HeaderDefect};
pub use crate::tables::{Entry, TableKind};
pub use crate::types::address::Address;
pub use crate::types::symbols::{LineInfo, ProcedureInfo, ProcedureName, ResolvedLocation};
