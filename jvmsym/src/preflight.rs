//! Pre-flight checks for the derived lookup path
//!
//! The derived strategy depends on two external tools, a readable library
//! file and a live target process. Checking them up front turns a cryptic
//! shell error into a clear, actionable message.

#![allow(unsafe_code)] // kill() requires unsafe

use anyhow::{bail, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::config::ResolverConfig;
use crate::domain::Pid;

/// Run all pre-flight checks for derived resolution
///
/// # Errors
/// Returns the first failed check
pub fn run_preflight_checks(config: &ResolverConfig, library: &Path) -> Result<()> {
    check_library_file(library)?;
    check_tool_available(&config.tools.map_tool)?;
    check_tool_available(&config.tools.symbol_tool)?;
    check_process_exists(config.pid)?;
    Ok(())
}

/// Check that the library exists and is a regular file
///
/// # Errors
/// Returns an error if the path is missing or is not a file
pub fn check_library_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!(
            "Library not found: {}\n\n\
             Point --library at the runtime's native library or set --home.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             --library must point to the library file, not a directory.",
            path.display()
        );
    }
    Ok(())
}

/// Check that `tool` can be executed, either as a path or via `PATH`
///
/// # Errors
/// Returns an error if the tool cannot be found
pub fn check_tool_available(tool: &str) -> Result<()> {
    if find_tool(tool).is_some() {
        return Ok(());
    }
    bail!(
        "Diagnostic tool not found: {tool}\n\n\
         Install the platform developer tools or pass its path explicitly."
    );
}

fn find_tool(tool: &str) -> Option<PathBuf> {
    let tool_path = Path::new(tool);
    if tool_path.components().count() > 1 {
        return tool_path.is_file().then(|| tool_path.to_path_buf());
    }
    let search = env::var_os("PATH")?;
    env::split_paths(&search).map(|dir| dir.join(tool)).find(|candidate| candidate.is_file())
}

/// Check that the target process is alive
///
/// # Errors
/// Returns an error if no process with that id exists
pub fn check_process_exists(pid: Pid) -> Result<()> {
    let Some(raw) = pid.as_raw() else {
        bail!("Invalid process id {pid}: must be between 1 and {}", i32::MAX);
    };
    // Signal 0 performs the existence and permission checks only
    if unsafe { libc::kill(raw, 0) } == 0 {
        return Ok(());
    }
    // EPERM means it exists but belongs to someone else
    if std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM) {
        return Ok(());
    }
    bail!(
        "Process {pid} not found.\n\n\
         Is the process still running? Check with: ps -p {pid}"
    );
}
