///
/// Extension descriptors and the SQLite auto-extension registry.
///
/// An `Extension` pairs a name with an entry point using SQLite's
/// loadable-extension signature. The same entry point can be:
/// - called directly on one open connection (`load`)
/// - installed process-wide with `sqlite3_auto_extension` (`install`), so
///   every connection opened afterwards runs it during open
///
/// SQLite owns the auto-extension list and serializes access to it.
/// Installing an entry point that is already listed is a no-op.
///

use std::os::raw::{c_char, c_int};
use std::ptr;

use rusqlite::{Connection, ffi};
use tracing::{debug, warn};

use crate::errors::ExtensionError;

/// `int xEntryPoint(sqlite3 *db, char **pzErrMsg, const sqlite3_api_routines *pApi)`
///
/// The API routines pointer is only meaningful for dynamically loaded
/// libraries. Statically linked entry points ignore it.
pub type EntryPoint = unsafe extern "C" fn(
    db: *mut ffi::sqlite3,
    pz_err_msg: *mut *const c_char,
    p_api: *const ffi::sqlite3_api_routines,
) -> c_int;

#[derive(Debug, Clone, Copy)]
pub struct Extension {
    name: &'static str,
    entry: EntryPoint,
}

impl Extension {
    pub const fn new(name: &'static str, entry: EntryPoint) -> Self {
        Self { name, entry }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn entry_point(&self) -> EntryPoint {
        self.entry
    }

    /// Run the entry point against a single connection.
    pub fn load(&self, conn: &Connection) -> Result<(), ExtensionError> {
        let code = unsafe { (self.entry)(conn.handle(), ptr::null_mut(), ptr::null()) };
        match check_code(self.name, code) {
            Ok(()) => {
                debug!(extension = self.name, "Loaded extension into connection");
                Ok(())
            }
            Err(e) => {
                warn!(extension = self.name, code, "Extension entry point failed");
                Err(e)
            }
        }
    }

    /// Add the entry point to SQLite's auto-extension list.
    pub fn install(&self) -> Result<(), ExtensionError> {
        let code = unsafe { ffi::sqlite3_auto_extension(Some(self.entry)) };
        if code != ffi::SQLITE_OK {
            warn!(extension = self.name, code, "Failed to install auto-extension");
            return Err(ExtensionError::AutoExtension {
                name: self.name.to_string(),
                code,
            });
        }
        debug!(extension = self.name, "Installed auto-extension");
        Ok(())
    }

    /// Remove the entry point from the auto-extension list. Returns `false`
    /// when it was not installed.
    pub fn uninstall(&self) -> bool {
        let removed = unsafe { ffi::sqlite3_cancel_auto_extension(Some(self.entry)) } != 0;
        debug!(extension = self.name, removed, "Cancelled auto-extension");
        removed
    }
}

/// Clear every auto-extension registered in this process, including ones
/// installed outside sqlext.
pub fn reset_auto_extensions() {
    unsafe { ffi::sqlite3_reset_auto_extension() };
    debug!("Reset auto-extension list");
}

/// Map a host registration status code to a result.
pub fn check_code(name: &str, code: c_int) -> Result<(), ExtensionError> {
    if code == ffi::SQLITE_OK {
        Ok(())
    } else {
        Err(ExtensionError::Registration {
            name: name.to_string(),
            code,
        })
    }
}

pub fn sqlite_error_code(e: &rusqlite::Error) -> c_int {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => err.extended_code,
        _ => ffi::SQLITE_ERROR,
    }
}
