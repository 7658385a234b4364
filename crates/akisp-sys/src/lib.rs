// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]

mod ffi;
pub use ffi::*;

// Re-export libloading for error handling
pub use libloading;

use std::sync::{Mutex, OnceLock, PoisonError};

/// Default soname of the vendor ISP core.
pub const DEFAULT_LIBRARY: &str = "libakisp.so";

/// Environment variable overriding [`DEFAULT_LIBRARY`].
pub const LIBRARY_ENV: &str = "AKISP_LIBRARY";

static LIBRARY: OnceLock<AkIspLibrary> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Load the vendor ISP core library.
///
/// The library is loaded once per process and shared afterwards. A failed
/// load is not cached, so a later call can succeed once the library has been
/// installed.
///
/// The environment variable `AKISP_LIBRARY` can be used to specify a custom
/// path to the library. If not set, searches standard system paths.
pub fn init() -> Result<&'static AkIspLibrary, libloading::Error> {
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    // Double-check after acquiring lock
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let lib_path = library_path();
    let lib = unsafe { AkIspLibrary::new(lib_path.as_str())? };

    // Only the holder of INIT_LOCK sets the cell, so this cannot race.
    let _ = LIBRARY.set(lib);

    LIBRARY.get().ok_or(libloading::Error::DlOpenUnknown)
}

/// Path that [`init`] will try to open.
pub fn library_path() -> String {
    std::env::var(LIBRARY_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| DEFAULT_LIBRARY.to_string())
}

/// Try to get a reference to the loaded library without loading it.
pub fn try_library() -> Option<&'static AkIspLibrary> {
    LIBRARY.get()
}
