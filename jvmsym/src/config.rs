//! Resolver configuration: host platform, diagnostic tools and where the
//! runtime native library lives.

use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::{LibraryHandle, Pid, ResolveError};

/// Environment variable naming the runtime home directory
pub const RUNTIME_HOME_ENV: &str = "JAVA_HOME";

/// Library file probed inside the runtime home on macOS
pub const MACOS_LIBRARY: &str = "libjvm.dylib";

/// VM flavours probed, in order, under `<home>/lib/`
pub const VM_FLAVOURS: [&str; 2] = ["server", "client"];

/// Operating system family the resolver runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl Platform {
    /// Platform this binary was built for.
    #[must_use]
    pub fn host() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::MacOs => f.write_str("macos"),
            Platform::Windows => f.write_str("windows"),
            Platform::Other(os) => f.write_str(os),
        }
    }
}

/// Which lookup strategy to use, when not chosen by platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Ask the dynamic linker (`dlsym`)
    Direct,
    /// Compute base + offset from diagnostic tool output
    Derived,
}

/// External tools and the output conventions the parsers rely on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Lists a process's memory mappings, takes the pid as its argument
    pub map_tool: String,
    /// Dumps a library's symbol table, takes the library path
    pub symbol_tool: String,
    /// Leading token of the executable-segment line in `map_tool` output
    pub marker: String,
    /// Prepended to symbol names before looking them up in the table
    pub prefix: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            map_tool: "vmmap".to_string(),
            symbol_tool: "nm".to_string(),
            marker: "__TEXT".to_string(),
            prefix: "_".to_string(),
        }
    }
}

/// Everything needed to pick and build a lookup strategy
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub platform: Platform,
    /// Overrides the per-platform choice of strategy
    pub strategy: Option<StrategyKind>,
    /// Explicit library; probed under `runtime_home` when absent
    pub library: Option<LibraryHandle>,
    pub runtime_home: Option<PathBuf>,
    pub tools: ToolConfig,
    /// Process whose memory map is inspected
    pub pid: Pid,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            platform: Platform::host(),
            strategy: None,
            library: None,
            runtime_home: None,
            tools: ToolConfig::default(),
            pid: Pid::current(),
        }
    }
}

impl ResolverConfig {
    /// Configuration for the current process, taking the runtime home from
    /// `JAVA_HOME`.
    #[must_use]
    pub fn for_host() -> Self {
        let runtime_home = std::env::var_os(RUNTIME_HOME_ENV).map(PathBuf::from);
        debug!("{RUNTIME_HOME_ENV} = {runtime_home:?}");
        Self { runtime_home, ..Self::default() }
    }

    /// Strategy to build for this configuration, `None` if the platform has
    /// no supported way to resolve symbols.
    ///
    /// The dynamic linker only sees the calling process, so another process
    /// defaults to the derived strategy even on Linux.
    #[must_use]
    pub fn strategy_kind(&self) -> Option<StrategyKind> {
        self.strategy.or(match self.platform {
            Platform::Linux if self.targets_current_process() => Some(StrategyKind::Direct),
            Platform::Linux | Platform::MacOs => Some(StrategyKind::Derived),
            Platform::Windows | Platform::Other(_) => None,
        })
    }

    /// True when `pid` is the calling process.
    #[must_use]
    pub fn targets_current_process(&self) -> bool {
        self.pid == Pid::current()
    }

    /// The library the derived strategy works against.
    ///
    /// # Errors
    /// Returns `LibraryNotFound` if no library was configured and none of
    /// the runtime home candidates exists
    pub fn resolve_library(&self) -> Result<LibraryHandle, ResolveError> {
        if let Some(library) = &self.library {
            return Ok(library.clone());
        }
        let candidates = self
            .runtime_home
            .as_deref()
            .map(|home| library_candidates(home, MACOS_LIBRARY))
            .unwrap_or_default();
        locate_library(&candidates)
    }
}

/// `<home>/lib/<flavour>/<file>` for every VM flavour, in probing order.
#[must_use]
pub fn library_candidates(home: &Path, file: &str) -> Vec<PathBuf> {
    VM_FLAVOURS.iter().map(|flavour| home.join("lib").join(flavour).join(file)).collect()
}

/// First candidate that is an existing file.
///
/// # Errors
/// Returns `LibraryNotFound` listing every candidate if none exists
pub fn locate_library(candidates: &[PathBuf]) -> Result<LibraryHandle, ResolveError> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .map(|path| {
            debug!("Using runtime library {}", path.display());
            LibraryHandle::from_path(path.clone())
        })
        .ok_or_else(|| ResolveError::LibraryNotFound { candidates: candidates.to_vec() })
}
