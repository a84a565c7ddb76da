//! Symbol lookup through the dynamic linker.
//!
//! Where the runtime's library is visible to `dlsym`, a lookup is a single
//! call and nothing has to be derived.

#![allow(unsafe_code)] // dlopen/dlsym/dlclose are FFI calls

use log::debug;
use std::ffi::{c_void, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::domain::{Address, ResolveError};

/// Resolver backed by `dlsym`
#[derive(Debug)]
pub struct DirectResolver {
    handle: *mut c_void,
    /// Set when `handle` came from `dlopen` and must be released
    library: Option<PathBuf>,
}

// SAFETY: the handle is an opaque token owned by the dynamic linker and is
// only passed back to dlsym/dlclose, which are thread-safe.
unsafe impl Send for DirectResolver {}
unsafe impl Sync for DirectResolver {}

impl DirectResolver {
    /// Search every library loaded into the process.
    #[must_use]
    pub fn process_wide() -> Self {
        Self { handle: libc::RTLD_DEFAULT, library: None }
    }

    /// Restrict lookups to the already loaded library at `path`.
    ///
    /// The library is never loaded by this call (`RTLD_NOLOAD`).
    ///
    /// # Errors
    /// Returns `LibraryNotLoaded` if the library is not mapped in this process
    pub fn open_loaded(path: &Path) -> Result<Self, ResolveError> {
        let not_loaded = || ResolveError::LibraryNotLoaded { path: path.to_path_buf() };
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| not_loaded())?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_NOLOAD) };
        if handle.is_null() {
            return Err(not_loaded());
        }

        debug!("Direct resolver bound to {}", path.display());
        Ok(Self { handle, library: Some(path.to_path_buf()) })
    }

    /// Address of `name` as reported by the dynamic linker.
    ///
    /// # Errors
    /// Returns `SymbolNotFound` if the linker does not know the symbol
    pub fn lookup(&self, name: &str) -> Result<Address, ResolveError> {
        let not_found = || ResolveError::SymbolNotFound { name: name.to_string() };
        let c_name = CString::new(name).map_err(|_| not_found())?;

        let ptr = unsafe { libc::dlsym(self.handle, c_name.as_ptr()) };
        if ptr.is_null() {
            return Err(not_found());
        }
        Ok(Address(ptr as usize as u64))
    }
}

impl Drop for DirectResolver {
    fn drop(&mut self) {
        if self.library.is_some() {
            unsafe {
                libc::dlclose(self.handle);
            }
        }
    }
}
