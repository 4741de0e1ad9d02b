//! # Types
//!
//! Value types returned by the resolver.
//!
//! Lookups that find nothing return empty or zero values rather than errors,
//! so these types all have a meaningful `Default`.

pub mod address;
pub mod symbols;

// Re-export all public types
pub use address::Address;
pub use symbols::{LineInfo, ProcedureInfo, ProcedureName, ResolvedLocation};
