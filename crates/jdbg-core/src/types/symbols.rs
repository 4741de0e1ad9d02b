//! Procedure and source location types.

use std::fmt;

use super::address::Address;

/// Line number covering an address.
///
/// The default value (line 0, offset 0) means no line entry applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LineInfo
{
    /// 1-based source line
    pub line: u32,
    /// Bytes from the start of the line's code to the queried address
    pub offset: u32,
}

impl LineInfo
{
    /// Whether a line entry was found.
    #[must_use]
    pub fn is_known(&self) -> bool
    {
        self.line != 0
    }
}

/// A procedure name, optionally nested inside an outer scope such as a
/// class or an enclosing routine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProcedureName
{
    pub outer: String,
    pub inner: Option<String>,
}

impl ProcedureName
{
    /// Build from the decoded name words of a symbol entry.
    ///
    /// `inner` is `None` only when the entry has no second name word; a
    /// second word that decodes to nothing still renders as `Outer.`.
    #[must_use]
    pub fn new(outer: impl Into<String>, inner: Option<String>) -> Self
    {
        Self {
            outer: outer.into(),
            inner,
        }
    }

    /// Whether both parts are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.outer.is_empty() && self.inner.is_none()
    }
}

impl fmt::Display for ProcedureName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.inner {
            Some(inner) => write!(f, "{}.{inner}", self.outer),
            None => write!(f, "{}", self.outer),
        }
    }
}

/// Procedure covering an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProcedureInfo
{
    pub name: ProcedureName,
    /// Bytes from the procedure's first instruction to the queried address
    pub offset: u32,
}

/// Everything known about one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLocation
{
    pub address: Address,
    /// Start of the owning module, if any
    pub module_start: Option<Address>,
    pub module: String,
    pub source_file: String,
    pub line: LineInfo,
    pub procedure: ProcedureInfo,
}

impl fmt::Display for ResolvedLocation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.address)?;
        if !self.module.is_empty() {
            write!(f, " {}", self.module)?;
        }
        if !self.procedure.name.is_empty() {
            write!(f, " {}+0x{:x}", self.procedure.name, self.procedure.offset)?;
        }
        if !self.source_file.is_empty() {
            write!(f, " ({}", self.source_file)?;
            if self.line.is_known() {
                write!(f, ":{}", self.line.line)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_procedure_name_display()
    {
        let nested = ProcedureName::new("TForm1", Some("Button1Click".into()));
        assert_eq!(nested.to_string(), "TForm1.Button1Click");

        let plain = ProcedureName::new("Main", None);
        assert_eq!(plain.to_string(), "Main");

        let blank_inner = ProcedureName::new("Outer", Some(String::new()));
        assert!(!blank_inner.is_empty());
        assert_eq!(blank_inner.to_string(), "Outer.");

        assert!(ProcedureName::default().is_empty());
    }

    #[test]
    fn test_resolved_location_display()
    {
        let location = ResolvedLocation {
            address: Address::new(0x1010),
            module_start: Some(Address::new(0x1000)),
            module: "Unit1".into(),
            source_file: "Unit1.pas".into(),
            line: LineInfo { line: 42, offset: 2 },
            procedure: ProcedureInfo {
                name: ProcedureName::new("TForm1", Some("Run".into())),
                offset: 0x10,
            },
        };
        assert_eq!(location.to_string(), "0x00001010 Unit1 TForm1.Run+0x10 (Unit1.pas:42)");

        let unknown = ResolvedLocation {
            address: Address::new(5),
            ..ResolvedLocation::default()
        };
        assert_eq!(unknown.to_string(), "0x00000005");
    }
}
