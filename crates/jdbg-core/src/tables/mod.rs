//! # Address Tables
//!
//! A blob carries four delta tables, all with the same shape: each entry is
//! an address delta followed by `N` payload deltas, and every value is added
//! to a running accumulator. Lookups answer "which entry covers this
//! address", i.e. the last entry whose address does not exceed it.
//!
//! Two strategies implement [`FloorLookup`]:
//!
//! - [`stream::DeltaTable`] re-decodes the varint stream on every query
//! - [`cached::SortedTable`] is materialized once and binary searched
//!
//! Both return identical entries for every address.

use std::fmt;
use std::str::FromStr;

use crate::error::JdbgResult;
use crate::format::BlobHeader;

pub mod cached;
pub mod stream;

pub use cached::{CachedTables, SortedTable};
pub use stream::{DeltaEntries, DeltaTable};

/// One decoded table entry: an absolute address plus `N` accumulated payload
/// words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry<const N: usize>
{
    pub address: u32,
    pub payload: [u32; N],
}

impl<const N: usize> Default for Entry<N>
{
    fn default() -> Self
    {
        Self {
            address: 0,
            payload: [0; N],
        }
    }
}

/// The four tables of a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind
{
    /// Module start addresses and names
    Units,
    /// Source file names
    SourceNames,
    /// Procedure names (two name words per entry)
    Symbols,
    /// Line numbers
    LineNumbers,
}

impl TableKind
{
    pub const ALL: [TableKind; 4] = [
        TableKind::Units,
        TableKind::SourceNames,
        TableKind::Symbols,
        TableKind::LineNumbers,
    ];

    /// Offset of this table's first byte, as recorded in the header.
    #[must_use]
    pub fn start(self, header: &BlobHeader) -> i32
    {
        match self {
            TableKind::Units => header.units,
            TableKind::SourceNames => header.source_names,
            TableKind::Symbols => header.symbols,
            TableKind::LineNumbers => header.line_numbers,
        }
    }

    /// Number of payload deltas per entry.
    #[must_use]
    pub fn arity(self) -> usize
    {
        match self {
            TableKind::Symbols => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for TableKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            TableKind::Units => "units",
            TableKind::SourceNames => "sources",
            TableKind::Symbols => "symbols",
            TableKind::LineNumbers => "lines",
        };
        write!(f, "{label}")
    }
}

impl FromStr for TableKind
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "units" | "modules" => Ok(TableKind::Units),
            "sources" | "files" | "source_names" => Ok(TableKind::SourceNames),
            "symbols" | "procs" | "procedures" => Ok(TableKind::Symbols),
            "lines" | "line_numbers" => Ok(TableKind::LineNumbers),
            _ => Err(format!(
                "Unknown table: {s}. Use 'units', 'sources', 'symbols', or 'lines'"
            )),
        }
    }
}

/// Predecessor search over a table.
///
/// Implementations return the last entry, in table order, that comes before
/// the first entry whose address exceeds `address`. For a table with
/// non-decreasing addresses that is simply the entry with the largest
/// address `<= address`.
pub trait FloorLookup<const N: usize>
{
    /// Find the entry covering `address`, or `None` if the address precedes
    /// every entry.
    ///
    /// ## Errors
    ///
    /// Decode errors from the underlying stream.
    fn floor_entry(&self, address: u32) -> JdbgResult<Option<Entry<N>>>;
}

/// One table seen through whichever lookup strategy is in effect.
#[derive(Debug, Clone, Copy)]
pub enum TableView<'a, const N: usize>
{
    Streaming(DeltaTable<'a, N>),
    Cached(&'a SortedTable<N>),
}

impl<const N: usize> FloorLookup<N> for TableView<'_, N>
{
    fn floor_entry(&self, address: u32) -> JdbgResult<Option<Entry<N>>>
    {
        match self {
            TableView::Streaming(table) => table.floor_entry(address),
            TableView::Cached(table) => table.floor_entry(address),
        }
    }
}

/// Predecessor search that also rejects entries belonging to an earlier
/// module.
///
/// `module_floor` is the start of the module that owns `address`; `None`
/// means no module owns it, and every entry is rejected.
///
/// ## Errors
///
/// Decode errors from the underlying table.
pub fn bounded_entry<T, const N: usize>(table: &T, address: u32, module_floor: Option<u32>) -> JdbgResult<Option<Entry<N>>>
where
    T: FloorLookup<N> + ?Sized,
{
    let entry = table.floor_entry(address)?;
    Ok(entry.filter(|entry| module_floor.is_some_and(|floor| entry.address >= floor)))
}
