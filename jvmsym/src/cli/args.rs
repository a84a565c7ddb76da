//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ResolverConfig, StrategyKind, ToolConfig};
use crate::domain::{LibraryHandle, Pid};

#[derive(Parser)]
#[command(
    name = "jvmsym",
    version,
    about = "Resolve addresses of native symbols in a running JVM's libjvm",
    after_help = "\
EXAMPLES:
    jvmsym --pid 4242 lookup gHotSpotVMStructs       Resolve in a running JVM
    jvmsym --home $JAVA_HOME --pid 4242 base         Where libjvm is mapped
    jvmsym --library ./libjvm.dylib symbols --json   Dump the symbol table"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the runtime native library (skips probing under --home)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Runtime home to probe for lib/{server,client}/libjvm.dylib [default: $JAVA_HOME]
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Target process, as a PID or a runtime identity like 4242@host [default: self]
    #[arg(short, long, global = true, value_parser = parse_pid)]
    pub pid: Option<Pid>,

    /// Always derive addresses from tool output
    #[arg(long, global = true, conflicts_with = "direct")]
    pub derived: bool,

    /// Always ask the dynamic linker
    #[arg(long, global = true)]
    pub direct: bool,

    /// Memory map tool
    #[arg(long, global = true, default_value = "vmmap")]
    pub map_tool: String,

    /// Symbol table tool
    #[arg(long, global = true, default_value = "nm")]
    pub symbol_tool: String,

    /// Leading token of the executable segment line in the memory map
    #[arg(long, global = true, default_value = "__TEXT")]
    pub marker: String,

    /// Symbol decoration prefix
    #[arg(long, global = true, default_value = "_", allow_hyphen_values = true)]
    pub prefix: String,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the absolute address of each symbol
    Lookup {
        /// Undecorated symbol names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print where the library's executable segment is mapped
    Base,
    /// Print the library's symbol table
    Symbols {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Only symbols whose name contains this string
        #[arg(long)]
        filter: Option<String>,
    },
}

impl Args {
    /// Resolver configuration described by these arguments.
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::for_host();
        if self.home.is_some() {
            config.runtime_home.clone_from(&self.home);
        }
        config.library = self.library.clone().map(LibraryHandle::from_path);
        if let Some(pid) = self.pid {
            config.pid = pid;
        }
        config.strategy = if self.derived {
            Some(StrategyKind::Derived)
        } else if self.direct {
            Some(StrategyKind::Direct)
        } else {
            None
        };
        config.tools = ToolConfig {
            map_tool: self.map_tool.clone(),
            symbol_tool: self.symbol_tool.clone(),
            marker: self.marker.clone(),
            prefix: self.prefix.clone(),
        };
        config
    }
}

fn parse_pid(value: &str) -> Result<Pid, String> {
    let pid = Pid::from_identity(value).map_err(|e| format!("invalid process id {value:?}: {e}"))?;
    match pid.as_raw() {
        Some(_) => Ok(pid),
        None => Err(format!("invalid process id {value:?}: must be between 1 and {}", i32::MAX)),
    }
}
