//! Structured error types for jvmsym
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::num::ParseIntError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use super::types::Pid;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No symbol resolver available for platform {platform}")]
    ResolverUnavailable { platform: String },

    #[error("`{command}` reported an error: {stderr}")]
    ExternalTool { command: String, stderr: String },

    #[error("No executable segment found for {library} in memory map output")]
    LibraryBaseNotFound { library: String },

    #[error("Symbol couldn't be found: {name}")]
    SymbolNotFound { name: String },

    #[error("Malformed tool output, cannot parse hex field {field:?}")]
    MalformedOutput {
        field: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Runtime native library not found, tried: {}", display_paths(.candidates))]
    LibraryNotFound { candidates: Vec<PathBuf> },

    #[error("Library {} is not loaded in this process", .path.display())]
    LibraryNotLoaded { path: PathBuf },

    #[error("The dynamic linker only resolves symbols in this process, not in process {pid}")]
    ForeignProcess { pid: Pid },

    #[error("Address of {name} overflows: base 0x{base:x} + offset 0x{offset:x}")]
    AddressOverflow { name: String, base: u64, offset: u64 },

    #[error("Failed to run diagnostic tool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Symbol resolver failed to initialize: {0}")]
    Initialization(#[source] Arc<ResolveError>),
}

impl ResolveError {
    /// True for the per-call "no such symbol" outcome.
    ///
    /// An initialization failure never counts, whatever its cause.
    #[must_use]
    pub fn is_symbol_not_found(&self) -> bool {
        matches!(self, ResolveError::SymbolNotFound { .. })
    }

    /// The error behind any `Initialization` wrapping.
    #[must_use]
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Initialization(inner) => inner.root_cause(),
            other => other,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<no candidates>".to_string();
    }
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
