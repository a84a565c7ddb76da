//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep process IDs, addresses and library identities
//! from being mixed up in function signatures.

use std::fmt;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

/// Process ID
///
/// Represents the process whose memory mappings are inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

impl Pid {
    /// The calling process.
    #[must_use]
    pub fn current() -> Self {
        Pid(std::process::id())
    }

    /// Parse a runtime identity string of the form `pid@host`.
    ///
    /// Only the part before the first `@` is used, so a bare `1234` parses too.
    ///
    /// # Errors
    /// Returns an error if the leading part is not a decimal number
    pub fn from_identity(identity: &str) -> Result<Self, ParseIntError> {
        let pid = identity.split('@').next().unwrap_or(identity);
        pid.trim().parse().map(Pid)
    }

    /// The id as a `pid_t`, if it can name exactly one process.
    ///
    /// `0` and anything above `i32::MAX` are rejected: passed to `kill(2)`
    /// they address a process group or every process instead.
    #[must_use]
    pub fn as_raw(self) -> Option<i32> {
        i32::try_from(self.0).ok().filter(|&pid| pid > 0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute address inside a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// One native library: the name it shows up under in memory maps and the
/// file its symbol table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryHandle {
    name: String,
    path: PathBuf,
}

impl LibraryHandle {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into() }
    }

    /// Build a handle whose display name is the file name of `path`.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());
        Self { name, path }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}
