//! # Deriving Symbol Addresses from Diagnostic Tools
//!
//! Some platforms give a process no supported way to ask "where is symbol
//! `X` of library `L`?". On macOS the JVM's `libjvm.dylib` is such a case.
//! This module answers the question with two stock developer tools.
//!
//! ## Address Arithmetic
//!
//! ```text
//! Runtime Address = Base Address + Symbol Offset
//! ```
//!
//! - **Base address**: where the library's `__TEXT` segment was mapped in
//!   this process. ASLR moves it on every run, so it is read from the live
//!   process with `vmmap <pid>`.
//! - **Symbol offset**: where the symbol sits inside the library file. It
//!   is fixed per build and read from `nm <library>`.
//!
//! ## Resolution Flow
//!
//! ```text
//! 1. vmmap 4242 | grep libjvm.dylib
//!    __TEXT  000000010a2b3000-000000010a500000 [ 2356K ...] r-x/r-x ... libjvm.dylib
//!    Base address: 0x10a2b3000
//!
//! 2. nm /.../lib/server/libjvm.dylib
//!    00000000005f3a10 S _gHotSpotVMStructs
//!                     U _malloc               (undefined, skipped)
//!
//! 3. lookup("gHotSpotVMStructs")
//!    decorate:  "_gHotSpotVMStructs"
//!    offset:    0x5f3a10
//!    address:   0x10a2b3000 + 0x5f3a10 = 0x10a8a6a10
//! ```
//!
//! ## Module Structure
//!
//! - **`memory_maps`**: runs the memory-map tool, finds the base address
//! - **`symbol_table`**: runs the symbol-dump tool, builds name → offset
//! - **`platform`**: [`PlatformResolver`], the two combined
//!
//! Both parsers lock onto the minimum structure they need (a leading
//! segment marker, a three-field symbol line) so that format drift
//! elsewhere in the output does not break them.
//!
//! ## Limitations
//!
//! - The base and table are captured once. If the library is unloaded and
//!   mapped again somewhere else, returned addresses are stale.
//! - A hung diagnostic tool blocks the initializing thread; there is no
//!   timeout.

pub mod memory_maps;
pub mod platform;
pub mod symbol_table;

pub use memory_maps::{find_library_base, parse_segment_base};
pub use platform::PlatformResolver;
pub use symbol_table::{load_symbol_offsets, parse_symbol_line, parse_symbol_table, SymbolOffsets};

use log::debug;

use crate::domain::ResolveError;
use crate::runner::CommandOutput;

/// Any stderr output is treated as failure, whatever the exit status.
fn check_stderr(command: &str, output: &CommandOutput) -> Result<(), ResolveError> {
    if output.stderr.is_empty() {
        return Ok(());
    }
    debug!("`{command}` wrote to stderr: {}", output.stderr.trim_end());
    Err(ResolveError::ExternalTool {
        command: command.to_string(),
        stderr: output.stderr.trim_end().to_string(),
    })
}
