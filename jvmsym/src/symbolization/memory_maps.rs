//! Memory mapping utilities for locating a loaded library
//!
//! This module asks the platform's memory-map tool (`vmmap` on macOS) for the
//! mappings of a process, filtered to one library, and extracts where the
//! library's executable segment was loaded. That start address is the base
//! every symbol offset from the library's symbol table is added to.

use log::{debug, info};

use crate::domain::{Address, LibraryHandle, Pid, ResolveError};
use crate::runner::{shell_command, shell_quote, ProcessRunner};

use super::check_stderr;

/// Find the base address of `library`'s executable segment in process `pid`.
///
/// Runs `<map_tool> <pid> | grep <library name>` and hands the output to
/// [`parse_segment_base`].
///
/// # Errors
/// - `ExternalTool` if the command wrote anything to stderr
/// - `LibraryBaseNotFound` if no line carries `marker`
/// - `MalformedOutput` if the marker line's range is not hex
pub fn find_library_base<R: ProcessRunner + ?Sized>(
    runner: &R,
    map_tool: &str,
    marker: &str,
    library: &LibraryHandle,
    pid: Pid,
) -> Result<Address, ResolveError> {
    let script = format!(
        "{} {} | grep {}",
        shell_quote(map_tool),
        pid,
        shell_quote(library.name())
    );
    let output = runner.run(&shell_command(script.clone()))?;
    check_stderr(&script, &output)?;

    let base = parse_segment_base(&output.stdout, marker)?.ok_or_else(|| {
        ResolveError::LibraryBaseNotFound { library: library.name().to_string() }
    })?;

    info!("{} executable segment mapped at {base} in process {pid}", library.name());
    Ok(base)
}

/// Parse memory-map output for the start of the executable segment.
///
/// Only lines beginning with `marker` are considered, and only their second
/// field is read: `__TEXT  000000010a2b3000-000000010a500000 [ 2444K ...]`.
/// Everything else on the line varies between tool versions and is ignored.
///
/// Returns `Ok(None)` if no line carries the marker, or if the marker line
/// starts at address zero, which is never a real mapping.
///
/// # Errors
/// Returns an error if the marker line's start address is not hexadecimal
pub fn parse_segment_base(output: &str, marker: &str) -> Result<Option<Address>, ResolveError> {
    let Some(line) = output.lines().find(|line| line.starts_with(marker)) else {
        return Ok(None);
    };
    debug!("Executable segment line: {line}");

    let range = line.split_whitespace().nth(1).unwrap_or_default();
    let start = range.split('-').next().unwrap_or_default();
    let start = parse_hex(start)?;

    Ok((start != 0).then_some(Address(start)))
}

/// Parse a hex field as printed by `vmmap`/`nm` (no `0x` prefix).
pub(crate) fn parse_hex(field: &str) -> Result<u64, ResolveError> {
    u64::from_str_radix(field, 16)
        .map_err(|source| ResolveError::MalformedOutput { field: field.to_string(), source })
}
