//! Blob encoder shared by the integration tests.
//!
//! Writes the header, the four delta tables and the name region, then seals
//! the blob with its checksum. Names are packed into 6-bit codes when every
//! character has a code, and written as XOR literals otherwise.

#![allow(dead_code)]

use std::collections::HashMap;

use jdbg_core::format::header::{CHECKSUM_OFFSET, HEADER_SIZE, SIGNATURE, VERSION};
use jdbg_core::format::names::{AT_PREFIX_MARKER, LITERAL_MARKER, XOR_KEY};
use jdbg_core::format::SENTINEL;

/// Append `value` as a 7-bit varint, low group first.
pub fn write_varint(out: &mut Vec<u8>, value: u32)
{
    let mut rest = value;
    while rest >= 0x80 {
        out.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    out.push(rest as u8);
}

/// 6-bit code for a character, if it has one.
pub fn code_for_char(c: char) -> Option<u8>
{
    match c {
        '0'..='8' => Some(c as u8 - b'0' + 0x01),
        'A'..='Y' => Some(c as u8 - b'A' + 0x0B),
        'a'..='y' => Some(c as u8 - b'a' + 0x25),
        '_' => Some(0x3F),
        _ => None,
    }
}

/// Pack codes four to three bytes, terminated by code 0 and followed by one
/// spare byte the decoder may read after the terminator.
pub fn pack_codes(codes: &[u8]) -> Vec<u8>
{
    let mut out = vec![0u8; codes.len() + 2];
    let mut position = 0;
    for (index, &code) in codes.iter().chain(std::iter::once(&0)).enumerate() {
        match index % 4 {
            0 => out[position] |= code,
            1 => {
                out[position] |= (code & 0x03) << 6;
                out[position + 1] |= code >> 2;
                position += 1;
            }
            2 => {
                out[position] |= (code & 0x0F) << 4;
                out[position + 1] |= code >> 4;
                position += 1;
            }
            _ => {
                out[position] |= code << 2;
                position += 1;
            }
        }
    }
    out.truncate(position + 2);
    out
}

/// XOR literal encoding, marker included.
pub fn encode_literal(name: &str) -> Vec<u8>
{
    let mut out = vec![LITERAL_MARKER];
    out.extend(
        name.bytes()
            .map(|byte| if byte == XOR_KEY { byte } else { byte ^ XOR_KEY }),
    );
    out.push(0);
    out
}

/// Packed encoding, or `None` if some character has no code or the packed
/// bytes would be mistaken for a marker.
pub fn encode_packed(name: &str) -> Option<Vec<u8>>
{
    let (prefix, body) = match name.strip_prefix('@') {
        Some(body) => (Some(AT_PREFIX_MARKER), body),
        None => (None, name),
    };
    if body.is_empty() {
        return None;
    }
    let codes = body.chars().map(code_for_char).collect::<Option<Vec<_>>>()?;
    let packed = pack_codes(&codes);
    if prefix.is_none() && (packed[0] == LITERAL_MARKER || packed[0] == AT_PREFIX_MARKER) {
        return None;
    }

    let mut out = Vec::with_capacity(packed.len() + 1);
    out.extend(prefix);
    out.extend(packed);
    Some(out)
}

/// Encode a name the way a writer would pick: packed when possible.
pub fn encode_name(name: &str, force_literal: bool) -> Vec<u8>
{
    if force_literal {
        return encode_literal(name);
    }
    encode_packed(name).unwrap_or_else(|| encode_literal(name))
}

/// Recompute and store the checksum over `data`.
pub fn seal(data: &mut [u8])
{
    data[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].fill(0);
    let sum = data
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .fold(0u32, u32::wrapping_add);
    data[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&sum.to_le_bytes());
}

/// Overwrite a little-endian `i32` header field.
pub fn patch_i32(data: &mut [u8], offset: usize, value: i32)
{
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Header field offsets.
pub mod field
{
    pub const UNITS: usize = 5;
    pub const SOURCE_NAMES: usize = 9;
    pub const SYMBOLS: usize = 13;
    pub const LINE_NUMBERS: usize = 17;
    pub const WORDS: usize = 21;
    pub const MODULE_NAME: usize = 25;
    pub const CHECK_SUM_VALID: usize = 33;
}

#[derive(Debug, Default)]
struct NameRegion
{
    bytes: Vec<u8>,
    refs: HashMap<String, u32>,
    force_literal: bool,
}

impl NameRegion
{
    /// Payload word for `name`: 0 for no name, else offset into the region
    /// plus one.
    fn reference(&mut self, name: &str) -> u32
    {
        if name.is_empty() {
            return 0;
        }
        if let Some(&value) = self.refs.get(name) {
            return value;
        }
        let value = self.bytes.len() as u32 + 1;
        self.bytes.extend(encode_name(name, self.force_literal));
        self.refs.insert(name.to_string(), value);
        value
    }

    /// Non-zero reference to a literal that decodes to nothing.
    fn blank(&mut self) -> u32
    {
        let value = self.bytes.len() as u32 + 1;
        self.bytes.extend(encode_literal(""));
        value
    }
}

/// Second name word of a symbol entry.
#[derive(Debug, Clone)]
enum InnerName
{
    Absent,
    Named(String),
    Blank,
}

/// Builder for synthetic blobs.
#[derive(Debug, Clone)]
pub struct BlobBuilder
{
    module_name: String,
    units: Vec<(u32, String)>,
    sources: Vec<(u32, String)>,
    lines: Vec<(u32, u32)>,
    symbols: Vec<(u32, String, InnerName)>,
    check_sum: bool,
    force_literal: bool,
}

impl Default for BlobBuilder
{
    fn default() -> Self
    {
        Self {
            module_name: String::new(),
            units: Vec::new(),
            sources: Vec::new(),
            lines: Vec::new(),
            symbols: Vec::new(),
            check_sum: true,
            force_literal: false,
        }
    }
}

impl BlobBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn module_name(mut self, name: &str) -> Self
    {
        self.module_name = name.to_string();
        self
    }

    pub fn unit(mut self, address: u32, name: &str) -> Self
    {
        self.units.push((address, name.to_string()));
        self
    }

    pub fn source(mut self, address: u32, name: &str) -> Self
    {
        self.sources.push((address, name.to_string()));
        self
    }

    pub fn line(mut self, address: u32, line: u32) -> Self
    {
        self.lines.push((address, line));
        self
    }

    /// Procedure entry; an empty `inner` means not nested.
    pub fn symbol(mut self, address: u32, outer: &str, inner: &str) -> Self
    {
        let inner = if inner.is_empty() { InnerName::Absent } else { InnerName::Named(inner.to_string()) };
        self.symbols.push((address, outer.to_string(), inner));
        self
    }

    /// Procedure entry whose second word references an empty name.
    pub fn symbol_with_blank_inner(mut self, address: u32, outer: &str) -> Self
    {
        self.symbols.push((address, outer.to_string(), InnerName::Blank));
        self
    }

    pub fn without_checksum(mut self) -> Self
    {
        self.check_sum = false;
        self
    }

    pub fn literal_names(mut self) -> Self
    {
        self.force_literal = true;
        self
    }

    pub fn build(&self) -> Vec<u8>
    {
        let mut names = NameRegion {
            force_literal: self.force_literal,
            ..NameRegion::default()
        };

        let units: Vec<(u32, [u32; 1])> = self
            .units
            .iter()
            .map(|(address, name)| (*address, [names.reference(name)]))
            .collect();
        let sources: Vec<(u32, [u32; 1])> = self
            .sources
            .iter()
            .map(|(address, name)| (*address, [names.reference(name)]))
            .collect();
        let symbols: Vec<(u32, [u32; 2])> = self
            .symbols
            .iter()
            .map(|(address, outer, inner)| {
                let inner = match inner {
                    InnerName::Absent => 0,
                    InnerName::Named(name) => names.reference(name),
                    InnerName::Blank => names.blank(),
                };
                (*address, [names.reference(outer), inner])
            })
            .collect();
        let lines: Vec<(u32, [u32; 1])> = self.lines.iter().map(|&(address, line)| (address, [line])).collect();
        let module_name = names.reference(&self.module_name);

        let mut body = Vec::new();
        let units_at = HEADER_SIZE + body.len();
        encode_table(&mut body, &units);
        let sources_at = HEADER_SIZE + body.len();
        encode_table(&mut body, &sources);
        let symbols_at = HEADER_SIZE + body.len();
        encode_table(&mut body, &symbols);
        let lines_at = HEADER_SIZE + body.len();
        encode_table(&mut body, &lines);
        let words_at = HEADER_SIZE + body.len();
        body.extend(&names.bytes);

        let mut data = Vec::with_capacity(HEADER_SIZE + body.len() + 4);
        data.extend_from_slice(&SIGNATURE.to_le_bytes());
        data.push(VERSION);
        for offset in [units_at, sources_at, symbols_at, lines_at, words_at] {
            data.extend_from_slice(&(offset as i32).to_le_bytes());
        }
        data.extend_from_slice(&module_name.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.push(u8::from(self.check_sum));
        data.extend(body);
        while data.len() % 4 != 0 {
            data.push(0);
        }

        seal(&mut data);
        data
    }
}

/// Write entries as deltas from the previous entry, then the sentinel.
pub fn encode_table<const N: usize>(out: &mut Vec<u8>, entries: &[(u32, [u32; N])])
{
    let mut previous = (0u32, [0u32; N]);
    for &(address, payload) in entries {
        write_varint(out, address.wrapping_sub(previous.0));
        for (word, last) in payload.iter().zip(previous.1) {
            write_varint(out, word.wrapping_sub(last));
        }
        previous = (address, payload);
    }
    write_varint(out, SENTINEL as u32);
}
