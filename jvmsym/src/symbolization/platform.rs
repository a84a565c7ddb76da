//! Symbol resolution without an OS lookup primitive.
//!
//! Combines the library's load address (from the memory map) with symbol
//! offsets (from the on-disk symbol table). Both are captured once, when the
//! resolver is built; lookups afterwards only read them.

use log::info;

use crate::config::ToolConfig;
use crate::domain::{Address, LibraryHandle, Pid, ResolveError};
use crate::runner::ProcessRunner;

use super::memory_maps::find_library_base;
use super::symbol_table::{load_symbol_offsets, SymbolOffsets};

/// Resolver for one library, derived from diagnostic tool output
#[derive(Debug)]
pub struct PlatformResolver {
    library: LibraryHandle,
    base: Address,
    symbols: SymbolOffsets,
    prefix: String,
}

impl PlatformResolver {
    /// Locate `library` in process `pid` and load its symbol table.
    ///
    /// Runs the memory-map tool first, then the symbol-dump tool; the first
    /// failure aborts construction.
    ///
    /// # Errors
    /// Returns an error if either tool fails or its output cannot be used
    pub fn new<R: ProcessRunner + ?Sized>(
        runner: &R,
        tools: &ToolConfig,
        library: LibraryHandle,
        pid: Pid,
    ) -> Result<Self, ResolveError> {
        let base = find_library_base(runner, &tools.map_tool, &tools.marker, &library, pid)?;
        let symbols = load_symbol_offsets(runner, &tools.symbol_tool, library.path())?;

        info!("Derived resolver ready for {library}: base {base}, {} symbols", symbols.len());
        Ok(Self::from_parts(library, base, symbols, tools.prefix.clone()))
    }

    /// Build a resolver from an already known base and symbol table.
    #[must_use]
    pub fn from_parts(
        library: LibraryHandle,
        base: Address,
        symbols: SymbolOffsets,
        prefix: impl Into<String>,
    ) -> Self {
        Self { library, base, symbols, prefix: prefix.into() }
    }

    /// Absolute address of the undecorated symbol `name`.
    ///
    /// # Errors
    /// - `SymbolNotFound` if the decorated name is not in the symbol table
    /// - `AddressOverflow` if base + offset does not fit in 64 bits
    pub fn lookup(&self, name: &str) -> Result<Address, ResolveError> {
        let offset = self.offset_of(name)?;
        self.address_at(name, offset)
    }

    /// Absolute address of `offset` within the library; `name` only labels
    /// the error.
    ///
    /// # Errors
    /// Returns `AddressOverflow` if base + offset does not fit in 64 bits
    pub fn address_at(&self, name: &str, offset: u64) -> Result<Address, ResolveError> {
        self.base.0.checked_add(offset).map(Address).ok_or_else(|| ResolveError::AddressOverflow {
            name: name.to_string(),
            base: self.base.0,
            offset,
        })
    }

    /// Offset of the undecorated symbol `name` within the library.
    ///
    /// # Errors
    /// Returns `SymbolNotFound` if the decorated name is not in the symbol table
    pub fn offset_of(&self, name: &str) -> Result<u64, ResolveError> {
        let decorated = format!("{}{name}", self.prefix);
        self.symbols
            .get(&decorated)
            .copied()
            .ok_or_else(|| ResolveError::SymbolNotFound { name: name.to_string() })
    }

    #[must_use]
    pub fn library(&self) -> &LibraryHandle {
        &self.library
    }

    #[must_use]
    pub fn base(&self) -> Address {
        self.base
    }

    /// Decorated names and offsets, in no particular order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, u64)> {
        self.symbols.iter().map(|(name, offset)| (name.as_str(), *offset))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PlatformResolver {
        let symbols: SymbolOffsets =
            [("_foo".to_string(), 0x1020), ("_bar".to_string(), 0x2040)].into_iter().collect();
        PlatformResolver::from_parts(
            LibraryHandle::from_path("/jdk/lib/server/libjvm.dylib"),
            Address(0x10a2b_3000),
            symbols,
            "_",
        )
    }

    #[test]
    fn test_lookup_adds_base_and_offset() {
        let resolver = resolver();
        assert_eq!(resolver.lookup("foo").unwrap(), Address(0x10a2b_3000 + 0x1020));
        assert_eq!(resolver.lookup("bar").unwrap(), Address(0x10a2b_3000 + 0x2040));
    }

    #[test]
    fn test_lookup_requires_undecorated_name() {
        let resolver = resolver();
        // "_foo" becomes "__foo", which is not in the table
        assert!(resolver.lookup("_foo").unwrap_err().is_symbol_not_found());
    }

    #[test]
    fn test_lookup_missing_leaves_table_intact() {
        let resolver = resolver();
        let err = resolver.lookup("missing").unwrap_err();
        assert!(matches!(err, ResolveError::SymbolNotFound { ref name } if name == "missing"));
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.base(), Address(0x10a2b_3000));
        assert_eq!(resolver.lookup("foo").unwrap(), Address(0x10a2b_4020));
    }

    #[test]
    fn test_lookup_without_prefix() {
        let symbols: SymbolOffsets = [("foo".to_string(), 0x10)].into_iter().collect();
        let resolver = PlatformResolver::from_parts(
            LibraryHandle::new("libjvm.so", "/jdk/lib/server/libjvm.so"),
            Address(0x7f00_0000_0000),
            symbols,
            "",
        );
        assert_eq!(resolver.lookup("foo").unwrap(), Address(0x7f00_0000_0010));
    }

    #[test]
    fn test_lookup_overflow() {
        let symbols: SymbolOffsets = [("_far".to_string(), 0x10)].into_iter().collect();
        let resolver = PlatformResolver::from_parts(
            LibraryHandle::from_path("libjvm.dylib"),
            Address(u64::MAX - 1),
            symbols,
            "_",
        );
        assert!(matches!(resolver.lookup("far"), Err(ResolveError::AddressOverflow { .. })));
        assert!(matches!(
            resolver.address_at("_far", 0x10),
            Err(ResolveError::AddressOverflow { ref name, offset: 0x10, .. }) if name == "_far"
        ));
        assert_eq!(resolver.address_at("_near", 0x1).unwrap(), Address(u64::MAX));
    }
}
