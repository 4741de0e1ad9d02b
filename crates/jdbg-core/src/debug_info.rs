//! # Debug Info
//!
//! [`DebugInfo`] owns a blob and answers address queries against it.
//!
//! ## Resolution
//!
//! Every query except the module lookups first finds the module that owns
//! the address (its *floor*). The matching entry in the source, line or
//! symbol table is only accepted if it starts at or after that floor; an
//! entry from an earlier module means the address has no information of
//! that kind. Addresses outside every module resolve to empty results.
//!
//! Nothing found is not an error. Errors come from a blob whose tables
//! cannot be read, or from [`ValidationPolicy::Strict`] rejecting a blob
//! that failed validation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jdbg_core::{DebugInfo, ResolveOptions};
//!
//! let data = std::fs::read("app.jdbg")?;
//! let info = DebugInfo::with_options(data, ResolveOptions::cached());
//! if info.is_valid() {
//!     let location = info.resolve(0x0040_1234u32)?;
//!     println!("{location}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::{JdbgError, JdbgResult};
use crate::format::names::name_from_ref;
use crate::format::{BlobHeader, ChecksumStatus, FormatReport, HeaderDefect};
use crate::tables::{bounded_entry, CachedTables, DeltaTable, Entry, FloorLookup, SortedTable, TableKind, TableView};
use crate::types::{Address, LineInfo, ProcedureInfo, ProcedureName, ResolvedLocation};

/// How tables are searched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LookupStrategy
{
    /// Decode the table stream on every query
    #[default]
    Streaming,
    /// Decode every table once, then binary search
    Cached,
}

/// What to do with a blob that failed validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ValidationPolicy
{
    /// Resolve anyway; only a missing header is fatal
    #[default]
    BestEffort,
    /// Refuse to resolve against a blob that is not [`DebugInfo::is_valid`]
    Strict,
}

/// Options fixed when a [`DebugInfo`] is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResolveOptions
{
    pub strategy: LookupStrategy,
    pub policy: ValidationPolicy,
}

impl ResolveOptions
{
    /// Cached lookups with the default policy.
    #[must_use]
    pub fn cached() -> Self
    {
        Self {
            strategy: LookupStrategy::Cached,
            ..Self::default()
        }
    }

    /// Streaming lookups that refuse invalid blobs.
    #[must_use]
    pub fn strict() -> Self
    {
        Self {
            policy: ValidationPolicy::Strict,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: LookupStrategy) -> Self
    {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self
    {
        self.policy = policy;
        self
    }
}

/// A parsed debug blob.
///
/// Construction never fails; inspect [`is_valid`](Self::is_valid) or opt
/// into [`ValidationPolicy::Strict`] to act on a damaged blob.
#[derive(Debug)]
pub struct DebugInfo
{
    data: Arc<[u8]>,
    report: FormatReport,
    options: ResolveOptions,
    cache: OnceCell<CachedTables>,
}

impl DebugInfo
{
    /// Parse `data` with default options (streaming, best effort).
    #[must_use]
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self
    {
        Self::with_options(data, ResolveOptions::default())
    }

    #[must_use]
    pub fn with_options(data: impl Into<Arc<[u8]>>, options: ResolveOptions) -> Self
    {
        let data = data.into();
        let report = FormatReport::inspect(&data);
        debug!(
            len = data.len(),
            valid = report.is_valid(),
            strategy = ?options.strategy,
            policy = ?options.policy,
            "loaded debug info"
        );

        Self {
            data,
            report,
            options,
            cache: OnceCell::new(),
        }
    }

    /// Raw blob bytes.
    #[must_use]
    pub fn data(&self) -> &[u8]
    {
        &self.data
    }

    #[must_use]
    pub fn options(&self) -> ResolveOptions
    {
        self.options
    }

    /// Structurally valid with a recorded checksum that matches.
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.report.is_valid()
    }

    /// Every structural check passed; says nothing about the checksum.
    #[must_use]
    pub fn valid_format(&self) -> bool
    {
        self.report.valid_format()
    }

    /// The first structural check the blob failed.
    #[must_use]
    pub fn format_defect(&self) -> Option<HeaderDefect>
    {
        self.report.defect
    }

    #[must_use]
    pub fn checksum(&self) -> ChecksumStatus
    {
        self.report.checksum
    }

    /// Parsed header, if the blob is at least header-sized.
    #[must_use]
    pub fn header(&self) -> Option<&BlobHeader>
    {
        self.report.header.as_ref()
    }

    /// Name of the module the blob itself describes.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn own_module_name(&self) -> JdbgResult<String>
    {
        let header = self.usable_header()?;
        name_from_ref(&self.data, header.words, i64::from(header.module_name))
    }

    /// Start address of the module containing `address`, or `None` if it
    /// precedes every module.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn module_start(&self, address: impl Into<Address>) -> JdbgResult<Option<Address>>
    {
        let header = self.usable_header()?;
        let address = address.into();
        Ok(self.module_floor(header, address)?.map(Address::new))
    }

    /// Name of the module containing `address`, or empty.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn module_name(&self, address: impl Into<Address>) -> JdbgResult<String>
    {
        let header = self.usable_header()?;
        let address = address.into();
        let entry = self.units(header)?.floor_entry(address.value())?;
        trace!(%address, ?entry, "module name lookup");
        self.entry_name(header, entry)
    }

    /// Source file containing `address`, or empty.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn source_file(&self, address: impl Into<Address>) -> JdbgResult<String>
    {
        let header = self.usable_header()?;
        self.source_file_at(header, address.into())
    }

    /// Line covering `address` and the offset into it, or `(0, 0)`.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn line(&self, address: impl Into<Address>) -> JdbgResult<LineInfo>
    {
        let header = self.usable_header()?;
        self.line_at(header, address.into())
    }

    /// Procedure covering `address` and the offset into it, or an empty name
    /// and offset 0.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn procedure(&self, address: impl Into<Address>) -> JdbgResult<ProcedureInfo>
    {
        let header = self.usable_header()?;
        self.procedure_at(header, address.into())
    }

    /// Run every lookup for `address`.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn resolve(&self, address: impl Into<Address>) -> JdbgResult<ResolvedLocation>
    {
        let header = self.usable_header()?;
        let address = address.into();
        let module_start = self.module_floor(header, address)?.map(Address::new);
        let module = self.entry_name(header, self.units(header)?.floor_entry(address.value())?)?;

        let location = ResolvedLocation {
            address,
            module_start,
            module,
            source_file: self.source_file_at(header, address)?,
            line: self.line_at(header, address)?,
            procedure: self.procedure_at(header, address)?,
        };
        debug!(%location, "resolved address");
        Ok(location)
    }

    /// Entries of the module table.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn unit_entries(&self) -> JdbgResult<Vec<Entry<1>>>
    {
        self.table_entries(TableKind::Units, |tables| &tables.units)
    }

    /// Entries of the source file table.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn source_name_entries(&self) -> JdbgResult<Vec<Entry<1>>>
    {
        self.table_entries(TableKind::SourceNames, |tables| &tables.source_names)
    }

    /// Entries of the line number table.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn line_number_entries(&self) -> JdbgResult<Vec<Entry<1>>>
    {
        self.table_entries(TableKind::LineNumbers, |tables| &tables.line_numbers)
    }

    /// Entries of the procedure table.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn symbol_entries(&self) -> JdbgResult<Vec<Entry<2>>>
    {
        self.table_entries(TableKind::Symbols, |tables| &tables.symbols)
    }

    /// Decode a name payload word the way the tables reference names.
    ///
    /// ## Errors
    ///
    /// See [`JdbgError`].
    pub fn name(&self, value: u32) -> JdbgResult<String>
    {
        let header = self.usable_header()?;
        name_from_ref(&self.data, header.words, i64::from(value))
    }

    /// The header, once the policy allows resolving against this blob.
    fn usable_header(&self) -> JdbgResult<&BlobHeader>
    {
        if self.options.policy == ValidationPolicy::Strict {
            self.report.require_valid()?;
        }
        self.report.header.as_ref().ok_or_else(|| {
            JdbgError::MalformedHeader(
                self.report
                    .defect
                    .unwrap_or(HeaderDefect::TooShort { len: self.data.len() }),
            )
        })
    }

    fn cached(&self, header: &BlobHeader) -> &CachedTables
    {
        self.cache.get_or_init(|| CachedTables::build(&self.data, header))
    }

    fn view<const N: usize>(
        &self,
        header: &BlobHeader,
        kind: TableKind,
        pick: fn(&CachedTables) -> &SortedTable<N>,
    ) -> JdbgResult<TableView<'_, N>>
    {
        match self.options.strategy {
            LookupStrategy::Streaming => Ok(TableView::Streaming(DeltaTable::new(&self.data, kind.start(header))?)),
            LookupStrategy::Cached => Ok(TableView::Cached(pick(self.cached(header)))),
        }
    }

    fn units(&self, header: &BlobHeader) -> JdbgResult<TableView<'_, 1>>
    {
        self.view(header, TableKind::Units, |tables| &tables.units)
    }

    fn module_floor(&self, header: &BlobHeader, address: Address) -> JdbgResult<Option<u32>>
    {
        let floor = self
            .units(header)?
            .floor_entry(address.value())?
            .map(|entry| entry.address);
        trace!(%address, ?floor, "module floor");
        Ok(floor)
    }

    fn entry_name(&self, header: &BlobHeader, entry: Option<Entry<1>>) -> JdbgResult<String>
    {
        match entry {
            Some(entry) => name_from_ref(&self.data, header.words, i64::from(entry.payload[0])),
            None => Ok(String::new()),
        }
    }

    fn source_file_at(&self, header: &BlobHeader, address: Address) -> JdbgResult<String>
    {
        let floor = self.module_floor(header, address)?;
        let table = self.view(header, TableKind::SourceNames, |tables| &tables.source_names)?;
        let entry = bounded_entry(&table, address.value(), floor)?;
        trace!(%address, ?entry, "source file lookup");
        self.entry_name(header, entry)
    }

    fn line_at(&self, header: &BlobHeader, address: Address) -> JdbgResult<LineInfo>
    {
        let floor = self.module_floor(header, address)?;
        let table = self.view(header, TableKind::LineNumbers, |tables| &tables.line_numbers)?;
        let entry = bounded_entry(&table, address.value(), floor)?;
        trace!(%address, ?entry, "line lookup");

        Ok(entry.map_or_else(LineInfo::default, |entry| LineInfo {
            line: entry.payload[0],
            offset: address.offset_from(entry.address),
        }))
    }

    fn procedure_at(&self, header: &BlobHeader, address: Address) -> JdbgResult<ProcedureInfo>
    {
        let floor = self.module_floor(header, address)?;
        let table = self.view(header, TableKind::Symbols, |tables| &tables.symbols)?;
        let Some(entry) = bounded_entry(&table, address.value(), floor)? else {
            return Ok(ProcedureInfo::default());
        };
        trace!(%address, ?entry, "procedure lookup");

        let [first, second] = entry.payload;
        let name = if first == 0 {
            ProcedureName::default()
        } else {
            let outer = name_from_ref(&self.data, header.words, i64::from(first))?;
            let inner = match second {
                0 => None,
                second => Some(name_from_ref(&self.data, header.words, i64::from(second))?),
            };
            ProcedureName::new(outer, inner)
        };

        Ok(ProcedureInfo {
            name,
            offset: address.offset_from(entry.address),
        })
    }

    fn table_entries<const N: usize>(
        &self,
        kind: TableKind,
        pick: fn(&CachedTables) -> &SortedTable<N>,
    ) -> JdbgResult<Vec<Entry<N>>>
    {
        let header = self.usable_header()?;
        match self.view(header, kind, pick)? {
            TableView::Streaming(table) => table.entries().collect(),
            TableView::Cached(table) => match table.failure() {
                Some(error) => Err(error.clone()),
                None => Ok(table.entries().to_vec()),
            },
        }
    }
}
