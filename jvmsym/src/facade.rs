//! Process-wide entry point for symbol lookups.
//!
//! The strategy is chosen and built on first use and then kept for the rest
//! of the process. If building it fails, every later call reports that same
//! failure; there is no retry and no degraded fallback.

use log::{info, warn};
use std::sync::{Arc, OnceLock};

use crate::config::{ResolverConfig, StrategyKind};
#[cfg(unix)]
use crate::direct::DirectResolver;
use crate::domain::{Address, ResolveError};
use crate::runner::{ProcessRunner, ShellRunner};
use crate::symbolization::PlatformResolver;

/// A ready-to-use lookup strategy
#[derive(Debug)]
pub enum Strategy {
    /// The dynamic linker answers lookups
    #[cfg(unix)]
    Direct(DirectResolver),
    /// Base + offset derived from diagnostic tool output
    Derived(PlatformResolver),
}

impl Strategy {
    /// Build the strategy `config` calls for.
    ///
    /// Returns `Ok(None)` when the platform has no supported strategy, which
    /// includes the direct strategy on a target without a dynamic linker API.
    ///
    /// # Errors
    /// - `ForeignProcess` if the direct strategy is asked to inspect another process
    /// - any error from constructing the chosen strategy
    pub fn build<R: ProcessRunner + ?Sized>(
        config: &ResolverConfig,
        runner: &R,
    ) -> Result<Option<Self>, ResolveError> {
        let Some(kind) = config.strategy_kind() else {
            return Ok(None);
        };

        let strategy = match kind {
            #[cfg(unix)]
            StrategyKind::Direct => {
                if !config.targets_current_process() {
                    return Err(ResolveError::ForeignProcess { pid: config.pid });
                }
                let resolver = match &config.library {
                    Some(library) => DirectResolver::open_loaded(library.path())?,
                    None => DirectResolver::process_wide(),
                };
                Strategy::Direct(resolver)
            }
            #[cfg(not(unix))]
            StrategyKind::Direct => return Ok(None),
            StrategyKind::Derived => {
                let library = config.resolve_library()?;
                Strategy::Derived(PlatformResolver::new(runner, &config.tools, library, config.pid)?)
            }
        };
        Ok(Some(strategy))
    }

    /// # Errors
    /// Returns `SymbolNotFound` if the strategy cannot resolve `name`
    pub fn lookup(&self, name: &str) -> Result<Address, ResolveError> {
        match self {
            #[cfg(unix)]
            Strategy::Direct(resolver) => resolver.lookup(name),
            Strategy::Derived(resolver) => resolver.lookup(name),
        }
    }

    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            #[cfg(unix)]
            Strategy::Direct(_) => StrategyKind::Direct,
            Strategy::Derived(_) => StrategyKind::Derived,
        }
    }
}

type InitState = Result<Option<Strategy>, Arc<ResolveError>>;

/// Lazily initialized resolver
///
/// Concurrent first callers block until one of them has built the strategy;
/// all of them then see the same result. Lookups after that take no lock.
pub struct SymbolFacade<R = ShellRunner> {
    config: ResolverConfig,
    runner: R,
    state: OnceLock<InitState>,
}

impl<R: ProcessRunner> SymbolFacade<R> {
    pub fn new(config: ResolverConfig, runner: R) -> Self {
        Self { config, runner, state: OnceLock::new() }
    }

    /// Absolute address of the native symbol `name`.
    ///
    /// # Errors
    /// - `ResolverUnavailable` if the platform has no strategy
    /// - `Initialization` wrapping the cause if the strategy failed to build
    /// - `SymbolNotFound` if the symbol does not exist
    pub fn lookup(&self, name: &str) -> Result<u64, ResolveError> {
        self.strategy()?.lookup(name).map(u64::from)
    }

    /// The initialized strategy, building it on first call.
    ///
    /// # Errors
    /// Same initialization errors as [`SymbolFacade::lookup`]
    pub fn strategy(&self) -> Result<&Strategy, ResolveError> {
        match self.state.get_or_init(|| self.initialize()) {
            Ok(Some(strategy)) => Ok(strategy),
            Ok(None) => Err(ResolveError::ResolverUnavailable {
                platform: self.config.platform.to_string(),
            }),
            Err(cause) => Err(ResolveError::Initialization(Arc::clone(cause))),
        }
    }

    /// True once initialization has run, successfully or not.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn initialize(&self) -> InitState {
        info!("Initializing symbol resolver for platform {}", self.config.platform);
        match Strategy::build(&self.config, &self.runner) {
            Ok(Some(strategy)) => {
                info!("Using {:?} symbol lookup", strategy.kind());
                Ok(Some(strategy))
            }
            Ok(None) => {
                warn!("No symbol lookup strategy for platform {}", self.config.platform);
                Ok(None)
            }
            Err(e) => {
                warn!("Symbol resolver initialization failed: {e}");
                Err(Arc::new(e))
            }
        }
    }
}

static GLOBAL: OnceLock<SymbolFacade> = OnceLock::new();

/// The process-wide facade, configured from the host environment.
pub fn global() -> &'static SymbolFacade {
    GLOBAL.get_or_init(|| SymbolFacade::new(ResolverConfig::for_host(), ShellRunner))
}

/// Look up `name` through the process-wide facade.
///
/// # Errors
/// See [`SymbolFacade::lookup`]
pub fn lookup(name: &str) -> Result<u64, ResolveError> {
    global().lookup(name)
}
