//! Materialized tables for repeated lookups.
//!
//! Decoding a table once turns every later query into a binary search. Names
//! are not decoded up front; entries keep their raw payload words and the
//! resolver decodes only the name it returns.
//!
//! A table that cannot be decoded to its end keeps the entries read before
//! the damage. Queries answered within that prefix succeed, and queries that
//! would have to read past it fail with the same error the streaming walk
//! raises.

use tracing::{debug, warn};

use crate::error::{JdbgError, JdbgResult};
use crate::format::BlobHeader;

use super::stream::DeltaTable;
use super::{Entry, FloorLookup, TableKind};

/// Where and how decoding a table stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableFailure
{
    /// Address of the entry whose payload was cut off, if its address delta
    /// was read.
    pending_address: Option<u32>,
    error: JdbgError,
}

/// A decoded table with a prefix-maximum index over its addresses.
///
/// `running_max[i]` is the largest address among `entries[..=i]`. It is
/// non-decreasing even when the entry addresses are not, so a binary search
/// over it finds the same entry a sequential walk would stop before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedTable<const N: usize>
{
    entries: Vec<Entry<N>>,
    running_max: Vec<u32>,
    failure: Option<TableFailure>,
}

impl<const N: usize> SortedTable<N>
{
    #[must_use]
    pub fn from_entries(entries: Vec<Entry<N>>) -> Self
    {
        let running_max = entries
            .iter()
            .scan(0u32, |max, entry| {
                *max = (*max).max(entry.address);
                Some(*max)
            })
            .collect();

        Self {
            entries,
            running_max,
            failure: None,
        }
    }

    /// Decode the table at `start`.
    ///
    /// Decoding stops at the first error; the entries before it are kept and
    /// the error is replayed by any lookup that reaches it.
    #[must_use]
    pub fn decode(data: &[u8], start: i32) -> Self
    {
        let mut entries = Vec::new();
        let failure = match DeltaTable::<N>::new(data, start) {
            Ok(table) => {
                let mut walk = table.entries();
                loop {
                    match walk.next() {
                        Some(Ok(entry)) => entries.push(entry),
                        Some(Err(error)) => {
                            break Some(TableFailure {
                                pending_address: walk.pending_address(),
                                error,
                            });
                        }
                        None => break None,
                    }
                }
            }
            Err(error) => Some(TableFailure {
                pending_address: None,
                error,
            }),
        };

        Self {
            failure,
            ..Self::from_entries(entries)
        }
    }

    /// Entries decoded before any damage.
    #[must_use]
    pub fn entries(&self) -> &[Entry<N>]
    {
        &self.entries
    }

    /// The error that cut decoding short, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&JdbgError>
    {
        self.failure.as_ref().map(|failure| &failure.error)
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}

impl<const N: usize> FloorLookup<N> for SortedTable<N>
{
    fn floor_entry(&self, address: u32) -> JdbgResult<Option<Entry<N>>>
    {
        let idx = self.running_max.partition_point(|&max| max <= address);
        // Every decoded address is covered, so a walk would go on to the damage.
        if idx == self.entries.len() {
            if let Some(failure) = &self.failure {
                let stops_before = failure.pending_address.is_some_and(|pending| address < pending);
                if !stops_before {
                    return Err(failure.error.clone());
                }
            }
        }
        Ok(idx.checked_sub(1).map(|idx| self.entries[idx]))
    }
}

/// All four tables of a blob, decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedTables
{
    pub units: SortedTable<1>,
    pub source_names: SortedTable<1>,
    pub line_numbers: SortedTable<1>,
    pub symbols: SortedTable<2>,
}

impl CachedTables
{
    /// Decode every table named in `header`.
    ///
    /// Damage in one table never affects lookups in another.
    #[must_use]
    pub fn build(data: &[u8], header: &BlobHeader) -> Self
    {
        let tables = Self {
            units: SortedTable::decode(data, TableKind::Units.start(header)),
            source_names: SortedTable::decode(data, TableKind::SourceNames.start(header)),
            line_numbers: SortedTable::decode(data, TableKind::LineNumbers.start(header)),
            symbols: SortedTable::decode(data, TableKind::Symbols.start(header)),
        };

        for (kind, failure) in [
            (TableKind::Units, tables.units.failure()),
            (TableKind::SourceNames, tables.source_names.failure()),
            (TableKind::LineNumbers, tables.line_numbers.failure()),
            (TableKind::Symbols, tables.symbols.failure()),
        ] {
            if let Some(error) = failure {
                warn!(table = %kind, "{error}");
            }
        }

        debug!(
            units = tables.units.len(),
            source_names = tables.source_names.len(),
            line_numbers = tables.line_numbers.len(),
            symbols = tables.symbols.len(),
            "built lookup tables"
        );
        tables
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn entry(address: u32, word: u32) -> Entry<1>
    {
        Entry {
            address,
            payload: [word],
        }
    }

    #[test]
    fn test_floor_matches_sequential_walk()
    {
        let table = SortedTable::from_entries(vec![entry(100, 1), entry(200, 2), entry(300, 3)]);
        assert_eq!(table.floor_entry(99).unwrap(), None);
        assert_eq!(table.floor_entry(100).unwrap(), Some(entry(100, 1)));
        assert_eq!(table.floor_entry(299).unwrap(), Some(entry(200, 2)));
        assert_eq!(table.floor_entry(u32::MAX).unwrap(), Some(entry(300, 3)));
    }

    #[test]
    fn test_floor_on_out_of_order_addresses()
    {
        // Address wraps back after 300; a walk for 250 stops at 300 and
        // answers 200, never reaching the entry at 50.
        let table = SortedTable::from_entries(vec![entry(100, 1), entry(200, 2), entry(300, 3), entry(50, 4)]);
        assert_eq!(table.floor_entry(250).unwrap(), Some(entry(200, 2)));
        assert_eq!(table.floor_entry(400).unwrap(), Some(entry(50, 4)));
        assert_eq!(table.floor_entry(60).unwrap(), None);
    }

    #[test]
    fn test_decode_agrees_with_stream()
    {
        let data = [0x64, 0x0A, 0x64, 0x05, 0x64, 0x07, 0xFF, 0xFF, 0xFF, 0xFF, 0x07];
        let sorted = SortedTable::<1>::decode(&data, 0);
        assert!(sorted.failure().is_none());
        let stream = DeltaTable::<1>::new(&data, 0).unwrap();
        assert_eq!(sorted.len(), 3);
        for address in [0u32, 99, 100, 150, 200, 299, 300, 1000] {
            assert_eq!(sorted.floor_entry(address).unwrap(), stream.floor_entry(address).unwrap());
        }
    }

    #[test]
    fn test_truncated_table_keeps_decoded_prefix()
    {
        // Second entry's payload is missing.
        let data = [0x64, 0x0A, 0x64];
        let sorted = SortedTable::<1>::decode(&data, 0);
        assert_eq!(sorted.entries(), &[entry(100, 10)]);
        assert!(matches!(sorted.failure(), Some(JdbgError::TruncatedStream { offset: 3, .. })));

        assert_eq!(sorted.floor_entry(50).unwrap(), None);
        assert_eq!(sorted.floor_entry(199).unwrap(), Some(entry(100, 10)));
        assert!(matches!(sorted.floor_entry(200), Err(JdbgError::TruncatedStream { offset: 3, .. })));
    }

    #[test]
    fn test_truncated_table_fails_where_stream_fails()
    {
        let inputs: [(&[u8], i32); 5] = [
            (&[0x64, 0x0A, 0x64], 0),
            (&[0x64, 0x0A, 0xE4], 0),
            (&[0x64, 0x0A, 0x64, 0x05, 0x10], 0),
            (&[], 0),
            (&[0x64, 0x0A], -1),
        ];
        for (data, start) in inputs {
            let sorted = SortedTable::<1>::decode(data, start);
            assert!(sorted.failure().is_some());
            for address in [0u32, 99, 100, 150, 199, 200, 250, 300, u32::MAX] {
                let streamed = DeltaTable::<1>::new(data, start).and_then(|table| table.floor_entry(address));
                assert_eq!(sorted.floor_entry(address), streamed, "data {data:?} at {address}");
            }
        }
    }
}
