//! # jvmsym - Main Entry Point
//!
//! Diagnostic front end for the resolver:
//! - **lookup**: resolve symbols the same way an embedding agent would
//! - **base** / **symbols**: show the two halves of the derived path

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;
use std::io::{self, Write};

use jvmsym::cli::{Args, Command};
use jvmsym::config::{ResolverConfig, StrategyKind};
use jvmsym::runner::ShellRunner;
use jvmsym::symbolization::PlatformResolver;
use jvmsym::{LibraryHandle, ResolveError, SymbolFacade};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_SYMBOL_NOT_FOUND: i32 = 3;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ResolveError>() {
        Some(e) if e.is_symbol_not_found() => EXIT_SYMBOL_NOT_FOUND,
        Some(e) => match e.root_cause() {
            ResolveError::ResolverUnavailable { .. } | ResolveError::ForeignProcess { .. } => {
                EXIT_USAGE
            }
            _ => EXIT_ERROR,
        },
        None => EXIT_ERROR,
    }
}

#[derive(Serialize)]
struct SymbolEntry<'a> {
    name: &'a str,
    offset: String,
    address: String,
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.resolver_config();

    match &args.command {
        Command::Lookup { names } => lookup(config, names, args.quiet),
        Command::Base => {
            let resolver = build_derived(&config, args.quiet)?;
            println!("{}", resolver.base());
            Ok(())
        }
        Command::Symbols { json, filter } => {
            let resolver = build_derived(&config, args.quiet)?;
            let stdout = io::stdout();
            print_symbols(&resolver, *json, filter.as_deref(), &mut stdout.lock())
        }
    }
}

fn lookup(config: ResolverConfig, names: &[String], quiet: bool) -> Result<()> {
    if config.strategy_kind() == Some(StrategyKind::Derived) {
        preflight(&config, &config.resolve_library()?)?;
    }

    let facade = SymbolFacade::new(config, ShellRunner);
    let strategy = facade.strategy()?;
    if !quiet {
        eprintln!("strategy: {:?}", strategy.kind());
    }

    let mut missing = None;
    for name in names {
        match facade.lookup(name) {
            Ok(addr) => println!("{name} 0x{addr:x}"),
            Err(e) if e.is_symbol_not_found() => {
                eprintln!("{name}: not found");
                missing = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    match missing {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn build_derived(config: &ResolverConfig, quiet: bool) -> Result<PlatformResolver> {
    let library = config.resolve_library()?;
    preflight(config, &library)?;
    if !quiet {
        eprintln!("library: {library}");
        eprintln!("pid: {}", config.pid);
    }
    let resolver = PlatformResolver::new(&ShellRunner, &config.tools, library, config.pid)
        .context("Failed to derive symbol addresses")?;
    info!("{} symbols loaded", resolver.len());
    Ok(resolver)
}

#[cfg(unix)]
fn preflight(config: &ResolverConfig, library: &LibraryHandle) -> Result<()> {
    jvmsym::preflight::run_preflight_checks(config, library.path())
}

#[cfg(not(unix))]
fn preflight(_config: &ResolverConfig, _library: &LibraryHandle) -> Result<()> {
    Ok(())
}

fn print_symbols(
    resolver: &PlatformResolver,
    json: bool,
    filter: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let mut symbols: Vec<(&str, u64)> = resolver
        .symbols()
        .filter(|(name, _)| filter.map_or(true, |f| name.contains(f)))
        .collect();
    symbols.sort_unstable();

    // Resolve every address before writing, so an overflow prints nothing
    let resolved = symbols
        .into_iter()
        .map(|(name, offset)| resolver.address_at(name, offset).map(|address| (name, offset, address)))
        .collect::<Result<Vec<_>, ResolveError>>()?;

    if json {
        let entries: Vec<SymbolEntry> = resolved
            .iter()
            .map(|&(name, offset, address)| SymbolEntry {
                name,
                offset: format!("0x{offset:x}"),
                address: address.to_string(),
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &entries).context("Failed to write JSON")?;
        writeln!(out)?;
    } else {
        for (name, offset, address) in resolved {
            writeln!(out, "0x{:016x} 0x{offset:08x} {name}", address.0)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jvmsym::symbolization::SymbolOffsets;
    use jvmsym::{Address, Pid};
    use std::sync::Arc;

    fn resolver(base: u64) -> PlatformResolver {
        let symbols: SymbolOffsets =
            [("_foo".to_string(), 0x1020), ("_bar".to_string(), 0x2040)].into_iter().collect();
        PlatformResolver::from_parts(
            LibraryHandle::from_path("/jdk/lib/server/libjvm.dylib"),
            Address(base),
            symbols,
            "_",
        )
    }

    #[test]
    fn test_print_symbols_text() {
        let mut out = Vec::new();
        print_symbols(&resolver(0x10a2b_3000), false, None, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x000000010a2b5040 0x00002040 _bar\n0x000000010a2b4020 0x00001020 _foo\n"
        );
    }

    #[test]
    fn test_print_symbols_json_filtered() {
        let mut out = Vec::new();
        print_symbols(&resolver(0x10a2b_3000), true, Some("foo"), &mut out).unwrap();
        let entries: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            entries,
            serde_json::json!([{ "name": "_foo", "offset": "0x1020", "address": "0x10a2b4020" }])
        );
    }

    #[test]
    fn test_print_symbols_overflow_is_an_error() {
        let mut out = Vec::new();
        let err = print_symbols(&resolver(u64::MAX - 0x1000), false, None, &mut out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::AddressOverflow { offset: 0x2040, .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_exit_codes() {
        let missing = anyhow::Error::from(ResolveError::SymbolNotFound { name: "foo".into() });
        assert_eq!(exit_code_for(&missing), EXIT_SYMBOL_NOT_FOUND);

        let foreign = ResolveError::ForeignProcess { pid: Pid(4242) };
        let wrapped = anyhow::Error::from(ResolveError::Initialization(Arc::new(foreign)));
        assert_eq!(exit_code_for(&wrapped), EXIT_USAGE);

        let tool = ResolveError::ExternalTool { command: "nm".into(), stderr: "boom".into() };
        let wrapped = anyhow::Error::from(ResolveError::Initialization(Arc::new(tool)));
        assert_eq!(exit_code_for(&wrapped), EXIT_ERROR);

        assert_eq!(exit_code_for(&anyhow::anyhow!("preflight failed")), EXIT_ERROR);
    }
}
