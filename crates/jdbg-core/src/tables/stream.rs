//! Streaming table access: decode the varint stream on every query.

use crate::error::{JdbgError, JdbgResult};
use crate::format::varint::read_value;

use super::{Entry, FloorLookup};

/// A delta table read in place from the blob.
#[derive(Debug, Clone, Copy)]
pub struct DeltaTable<'a, const N: usize>
{
    data: &'a [u8],
    start: usize,
}

impl<'a, const N: usize> DeltaTable<'a, N>
{
    /// Table starting at the header offset `start`.
    ///
    /// ## Errors
    ///
    /// [`JdbgError::TruncatedStream`] for a negative offset. Offsets past the
    /// end are reported by the first read.
    pub fn new(data: &'a [u8], start: i32) -> JdbgResult<Self>
    {
        let start = usize::try_from(start).map_err(|_| JdbgError::truncated(i64::from(start), data.len()))?;
        Ok(Self { data, start })
    }

    /// Decode every entry in table order.
    #[must_use]
    pub fn entries(&self) -> DeltaEntries<'a, N>
    {
        DeltaEntries {
            data: self.data,
            cursor: self.start,
            current: Entry::default(),
            pending: None,
            done: false,
        }
    }
}

/// Add the next `N` payload deltas to `payload`, returning the new cursor.
///
/// The sentinel has no special meaning in payload position.
fn read_payload<const N: usize>(data: &[u8], mut cursor: usize, payload: &mut [u32; N]) -> JdbgResult<usize>
{
    for word in payload.iter_mut() {
        let read = read_value(data, cursor)?;
        *word = word.wrapping_add(read.delta());
        cursor = read.next;
    }
    Ok(cursor)
}

impl<const N: usize> FloorLookup<N> for DeltaTable<'_, N>
{
    fn floor_entry(&self, address: u32) -> JdbgResult<Option<Entry<N>>>
    {
        let mut cursor = self.start;
        let mut current = Entry::<N>::default();
        let mut found = None;

        loop {
            let read = read_value(self.data, cursor)?;
            if !read.has_more {
                break;
            }
            cursor = read.next;
            current.address = current.address.wrapping_add(read.delta());
            // The payload of the first entry past the address is never needed.
            if address < current.address {
                break;
            }
            cursor = read_payload(self.data, cursor, &mut current.payload)?;
            found = Some(current);
        }

        Ok(found)
    }
}

/// Iterator over the entries of a [`DeltaTable`].
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct DeltaEntries<'a, const N: usize>
{
    data: &'a [u8],
    cursor: usize,
    current: Entry<N>,
    pending: Option<u32>,
    done: bool,
}

impl<const N: usize> DeltaEntries<'_, N>
{
    /// Address of the entry whose payload failed to decode.
    ///
    /// `None` unless the last item yielded was an error raised after that
    /// entry's address delta was read.
    #[must_use]
    pub fn pending_address(&self) -> Option<u32>
    {
        self.pending
    }

    fn advance(&mut self) -> JdbgResult<Option<Entry<N>>>
    {
        let read = read_value(self.data, self.cursor)?;
        if !read.has_more {
            return Ok(None);
        }
        self.current.address = self.current.address.wrapping_add(read.delta());
        self.pending = Some(self.current.address);
        self.cursor = read_payload(self.data, read.next, &mut self.current.payload)?;
        self.pending = None;
        Ok(Some(self.current))
    }
}

impl<const N: usize> Iterator for DeltaEntries<'_, N>
{
    type Item = JdbgResult<Entry<N>>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
