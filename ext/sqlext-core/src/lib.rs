//!
//! sqlext-core - Shared Extension Plumbing
//!
//! This crate provides the types shared across all sqlext extension crates:
//!
//! - `Extension` descriptors pairing a name with a C-ABI entry point
//! - Auto-extension install/uninstall on top of `sqlite3_auto_extension`
//! - `ValueType` for decoding argument types inside raw function callbacks
//! - `ExtensionError` for every failure the Rust API can report
//! - `ExtensionConfig` for enabling extensions from a TOML file
//!
//! Entry points follow SQLite's loadable-extension signature so the same
//! function can be handed to `sqlite3_auto_extension` or called directly
//! on an open connection.
//!

pub mod config;
pub mod errors;
pub mod extension;
pub mod value;

pub use config::{ExtensionConfig, parse_config, parse_config_str};
pub use errors::ExtensionError;
pub use extension::{EntryPoint, Extension, check_code, reset_auto_extensions, sqlite_error_code};
pub use value::ValueType;
