//! # jvmsym - Native Symbol Addresses for a Running JVM
//!
//! Instrumentation agents and profilers that live inside a JVM often need the
//! address of a symbol exported by `libjvm` (`gHotSpotVMStructs`, for
//! example) so they can read VM structures or hook a function. jvmsym
//! answers `lookup(name) -> address` for the current process.
//!
//! ## Strategies
//!
//! ```text
//!                      ┌──────────────────────┐
//!   lookup("name") ──▶ │     SymbolFacade     │  built once, on first use
//!                      └──────────┬───────────┘
//!                 ┌───────────────┴────────────────┐
//!                 ▼                                ▼
//!       ┌──────────────────┐           ┌──────────────────────┐
//!       │ Direct (Linux)   │           │ Derived (macOS)      │
//!       │ dlsym()          │           │ vmmap → base address │
//!       └──────────────────┘           │ nm    → offsets      │
//!                                      │ base + offset        │
//!                                      └──────────────────────┘
//! ```
//!
//! - **Direct**: the dynamic linker already knows every exported symbol.
//! - **Derived**: macOS offers no supported lookup for this case, so the
//!   address is computed from `vmmap` and `nm` output. See
//!   [`symbolization`].
//! - Other platforms get [`ResolveError::ResolverUnavailable`].
//!
//! ## Module Structure
//!
//! - [`facade`]: process-wide one-time initialization and dispatch
//! - [`symbolization`]: the derived strategy and its two parsers
//! - `direct`: the `dlsym` strategy (Unix only)
//! - [`runner`]: running diagnostic tools, swappable in tests
//! - [`config`]: platform detection, tool settings, library probing
//! - [`domain`]: `Pid`, `Address`, `LibraryHandle` and [`ResolveError`]
//! - `preflight`: environment checks used by the CLI (Unix only)
//! - [`cli`]: argument definitions for the `jvmsym` binary
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! let addr = jvmsym::lookup("gHotSpotVMStructs")?;
//! ```
//!
//! Addresses are captured once per process. A library that is unloaded and
//! mapped again elsewhere is not noticed.

pub mod cli;
pub mod config;
#[cfg(unix)]
pub mod direct;
pub mod domain;
pub mod facade;
#[cfg(unix)]
pub mod preflight;
pub mod runner;
pub mod symbolization;

pub use domain::{Address, LibraryHandle, Pid, ResolveError};
pub use facade::{global, lookup, Strategy, SymbolFacade};
