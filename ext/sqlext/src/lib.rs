//!
//! # sqlext - SQLite extension registration
//!
//! Registers the built-in SQL functions with SQLite:
//!
//! - `sha1(X)`, `sha1_query(SQL)` from `sqlext-sha1`
//! - `mycount([X])` from `sqlext-mycount`
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! // Every connection opened after this call has the functions.
//! sqlext::register_extensions()?;
//! let conn = rusqlite::Connection::open("app.db")?;
//!
//! // Or load into one connection only, honoring a config file.
//! let config = sqlext::parse_config(Path::new("sqlext.toml"))?;
//! let conn = sqlext::open("app.db", &config)?;
//! ```
//!

use std::path::Path;

use rusqlite::Connection;
use tracing::{info, warn};

pub use sqlext_core::{
    Extension, ExtensionConfig, ExtensionError, parse_config, parse_config_str, reset_auto_extensions,
};
pub use sqlext_mycount as mycount;
pub use sqlext_sha1 as sha1;

/// Built-in extensions in registration order.
pub const BUILTIN: [Extension; 2] = [sqlext_sha1::EXTENSION, sqlext_mycount::EXTENSION];

pub fn builtin() -> &'static [Extension] {
    &BUILTIN
}

pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN.iter().map(Extension::name).collect()
}

fn enabled(config: &ExtensionConfig) -> Result<impl Iterator<Item = &'static Extension> + '_, ExtensionError> {
    config.validate(&builtin_names())?;
    Ok(builtin().iter().filter(move |ext| config.is_enabled(ext.name())))
}

/// Install every built-in extension as an auto-extension.
pub fn register_extensions() -> Result<(), ExtensionError> {
    register_extensions_with(&ExtensionConfig::all())
}

/// Install the built-in extensions enabled in `config` as auto-extensions.
///
/// All or nothing: if one install fails, the ones installed before it are
/// cancelled again and the error is returned.
pub fn register_extensions_with(config: &ExtensionConfig) -> Result<(), ExtensionError> {
    install_all(enabled(config)?, Extension::install)
}

fn install_all<'a, I, F>(extensions: I, install: F) -> Result<(), ExtensionError>
where
    I: IntoIterator<Item = &'a Extension>,
    F: Fn(&Extension) -> Result<(), ExtensionError>,
{
    let mut installed: Vec<&Extension> = Vec::new();
    for ext in extensions {
        if let Err(e) = install(ext) {
            for done in installed.iter().rev() {
                done.uninstall();
            }
            warn!(
                extension = ext.name(),
                rolled_back = installed.len(),
                "Auto-extension registration failed"
            );
            return Err(e);
        }
        installed.push(ext);
    }
    let names: Vec<&str> = installed.iter().map(|ext| ext.name()).collect();
    info!(extensions = ?names, "Registered auto-extensions");
    Ok(())
}

/// Cancel the built-in auto-extensions. Returns how many were installed.
pub fn unregister_extensions() -> usize {
    builtin().iter().filter(|ext| ext.uninstall()).count()
}

/// Load the enabled built-ins into one connection without touching the
/// process-wide auto-extension list.
pub fn load_extensions(conn: &Connection, config: &ExtensionConfig) -> Result<(), ExtensionError> {
    for ext in enabled(config)? {
        ext.load(conn)?;
    }
    Ok(())
}

pub fn open<P: AsRef<Path>>(path: P, config: &ExtensionConfig) -> Result<Connection, ExtensionError> {
    let conn = Connection::open(path)?;
    load_extensions(&conn, config)?;
    Ok(conn)
}

pub fn open_in_memory(config: &ExtensionConfig) -> Result<Connection, ExtensionError> {
    let conn = Connection::open_in_memory()?;
    load_extensions(&conn, config)?;
    Ok(conn)
}
