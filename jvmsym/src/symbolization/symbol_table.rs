//! Symbol table loading via `nm`
//!
//! The whole table is dumped once and kept, rather than running
//! `nm | grep` per symbol: one subprocess pays for every later lookup.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::ResolveError;
use crate::runner::{shell_command, shell_quote, ProcessRunner};

use super::check_stderr;
use super::memory_maps::parse_hex;

/// Decorated symbol name → offset inside the library
pub type SymbolOffsets = HashMap<String, u64>;

/// Dump the symbol table of the library at `path` with `symbol_tool`.
///
/// # Errors
/// - `ExternalTool` if the command wrote anything to stderr
/// - `MalformedOutput` if a symbol line carries a non-hex offset
pub fn load_symbol_offsets<R: ProcessRunner + ?Sized>(
    runner: &R,
    symbol_tool: &str,
    path: &Path,
) -> Result<SymbolOffsets, ResolveError> {
    let script = format!("{} {}", shell_quote(symbol_tool), shell_quote(&path.to_string_lossy()));
    let output = runner.run(&shell_command(script.clone()))?;
    check_stderr(&script, &output)?;

    let symbols = parse_symbol_table(&output.stdout)?;
    info!("Loaded {} symbols from {}", symbols.len(), path.display());
    Ok(symbols)
}

/// Parse full `nm` output into a name → offset map.
///
/// When a name appears twice the later line wins.
///
/// # Errors
/// Returns an error if a defined-symbol line has a non-hex offset
pub fn parse_symbol_table(output: &str) -> Result<SymbolOffsets, ResolveError> {
    let mut symbols = SymbolOffsets::new();
    let mut skipped = 0usize;

    for line in output.lines() {
        match parse_symbol_line(line)? {
            Some((name, offset)) => {
                if let Some(previous) = symbols.insert(name.to_string(), offset) {
                    warn!("Duplicate symbol {name}: 0x{previous:x} replaced by 0x{offset:x}");
                }
            }
            None => skipped += 1,
        }
    }

    debug!("Skipped {skipped} nm lines that are not defined symbols");
    Ok(symbols)
}

/// Parse one `nm` line of the form `OFFSET TYPE NAME`.
///
/// Lines with any other number of fields (undefined symbols such as
/// `U _malloc`, blank lines, archive member headers) yield `Ok(None)`.
///
/// # Errors
/// Returns an error if the line has three fields but the first is not hex
pub fn parse_symbol_line(line: &str) -> Result<Option<(&str, u64)>, ResolveError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[offset, _kind, name] = fields.as_slice() else {
        return Ok(None);
    };
    Ok(Some((name, parse_hex(offset)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Excerpt of `nm libjvm.dylib`
    const NM_OUTPUT: &str = "\
0000000000001020 T _foo
0000000000002040 t _bar
                 U _undef
00000000005f3a10 S _gHotSpotVMStructs
00000000005f3a18 S _gHotSpotVMTypes
0000000000231f80 T __ZN7Threads7threadsEv
";

    #[test]
    fn test_parse_symbol_table() {
        let symbols = parse_symbol_table(NM_OUTPUT).unwrap();
        assert_eq!(symbols.len(), 5);
        assert_eq!(symbols["_foo"], 0x1020);
        assert_eq!(symbols["_bar"], 0x2040);
        assert_eq!(symbols["_gHotSpotVMStructs"], 0x5f_3a10);
        assert_eq!(symbols["__ZN7Threads7threadsEv"], 0x23_1f80);
        assert!(!symbols.contains_key("_undef"));
    }

    #[test]
    fn test_parse_symbol_table_exact_fixture() {
        let output = "0000000000001020 T _foo\n0000000000002040 t _bar\nU _undef\n";
        let symbols = parse_symbol_table(output).unwrap();
        let expected: SymbolOffsets =
            [("_foo".to_string(), 0x1020), ("_bar".to_string(), 0x2040)].into_iter().collect();
        assert_eq!(symbols, expected);
    }

    #[test]
    fn test_parse_symbol_line_shapes() {
        assert_eq!(parse_symbol_line("  0000000000001020   T   _foo  ").unwrap(), Some(("_foo", 0x1020)));
        assert_eq!(parse_symbol_line("U _undef").unwrap(), None);
        assert_eq!(parse_symbol_line("").unwrap(), None);
        assert_eq!(parse_symbol_line("libjvm.dylib(os_bsd.o):").unwrap(), None);
        assert_eq!(
            parse_symbol_line("/opt/jdk/lib/libjvm.dylib (for architecture arm64):").unwrap(),
            None
        );
    }

    #[test]
    fn test_duplicate_symbol_last_wins() {
        let output = "0000000000001000 T _dup\n0000000000003000 T _dup\n";
        let symbols = parse_symbol_table(output).unwrap();
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols["_dup"], 0x3000);
    }

    #[test]
    fn test_malformed_offset() {
        let err = parse_symbol_table("0000000000001020 T _foo\nnot-hex T _bar\n").unwrap_err();
        assert!(matches!(err, ResolveError::MalformedOutput { ref field, .. } if field == "not-hex"));
    }
}
