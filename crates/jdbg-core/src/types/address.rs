//! Code address type.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Strongly typed code address
///
/// Addresses in a debug blob are 32-bit offsets relative to the start of the
/// code image. Wrapping them keeps them from being mixed up with line
/// numbers, byte offsets into the blob, or name references, which are all
/// plain integers too.
///
/// ## Example
///
/// ```rust
/// use jdbg_core::types::Address;
///
/// let addr = Address::from(0x1000u32);
/// let next_addr = addr + 0x100; // Add offset
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address
{
    /// The start of the code image
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u32` value
    ///
    /// ## Example
    ///
    /// ```rust
    /// use jdbg_core::types::Address;
    ///
    /// const ENTRY: Address = Address::new(0x1000);
    /// assert_eq!(ENTRY.value(), 0x1000);
    /// ```
    #[must_use]
    pub const fn new(value: u32) -> Self
    {
        Address(value)
    }

    /// Get the raw `u32` value of this address
    #[must_use]
    pub const fn value(self) -> u32
    {
        self.0
    }

    /// Distance from `base` up to this address
    ///
    /// Wraps when `base` lies above `self`, which only happens for
    /// malformed tables.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use jdbg_core::types::Address;
    ///
    /// let addr = Address::new(0x1020);
    /// assert_eq!(addr.offset_from(0x1000), 0x20);
    /// assert_eq!(addr.offset_from(0x1021), u32::MAX);
    /// ```
    #[must_use]
    pub const fn offset_from(self, base: u32) -> u32
    {
        self.0.wrapping_sub(base)
    }
}

impl From<u32> for Address
{
    fn from(value: u32) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u32
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Add<u32> for Address
{
    type Output = Address;

    fn add(self, rhs: u32) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u32> for Address
{
    type Output = Address;

    fn sub(self, rhs: u32) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

impl FromStr for Address
{
    type Err = String;

    /// Parse `0x`-prefixed hex or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => trimmed.parse::<u32>(),
        };
        parsed
            .map(Address)
            .map_err(|err| format!("Invalid address '{s}': {err}"))
    }
}
