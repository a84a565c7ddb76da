//! Synchronous execution of diagnostic tools.
//!
//! The resolver only needs "run this command, give me both output streams".
//! [`ProcessRunner`] is that seam, so tests can feed captured tool output
//! instead of spawning `vmmap` and `nm`.

use log::debug;
use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: stderr.into() }
    }

    /// Output with nothing on stderr.
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self::new(stdout, String::new())
    }
}

/// Runs a command to completion and returns what it printed.
///
/// Implementations block until the child exits and must not leave it
/// running or unreaped. The exit status is deliberately not part of the
/// result: callers judge success by stderr.
pub trait ProcessRunner: Send + Sync {
    /// Run `command` (program followed by its arguments).
    ///
    /// # Errors
    /// Returns an error if the command could not be started or its output
    /// could not be collected
    fn run(&self, command: &[String]) -> io::Result<CommandOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for Arc<R> {
    fn run(&self, command: &[String]) -> io::Result<CommandOutput> {
        (**self).run(command)
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &[String]) -> io::Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(&self, command: &[String]) -> io::Result<CommandOutput> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        debug!("Running {}", command.join(" "));

        // output() reads stdout and stderr concurrently and waits for the
        // child, so a chatty stderr cannot stall a child blocked on stdout.
        let output = Command::new(program).args(args).stdin(Stdio::null()).output()?;

        debug!(
            "{program} exited with {} ({} bytes stdout, {} bytes stderr)",
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Build `["/bin/sh", "-c", script]`.
#[must_use]
pub fn shell_command(script: String) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), script]
}

/// Quote `arg` for a POSIX shell.
///
/// Plain words pass through untouched so logged commands stay readable;
/// anything else is wrapped in single quotes.
#[must_use]
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| c.is_ascii_alphanumeric() || "-_./:@+=,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote_plain() {
        assert_eq!(shell_quote("libjvm.dylib"), "libjvm.dylib");
        assert_eq!(shell_quote("/opt/jdk-21/lib/server/libjvm.dylib"), "/opt/jdk-21/lib/server/libjvm.dylib");
    }

    #[test]
    fn test_shell_quote_special() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("/Library/Java Home/libjvm.dylib"), "'/Library/Java Home/libjvm.dylib'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = ShellRunner.run(&[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
