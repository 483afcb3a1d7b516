///
/// Extension error types.
///
/// All errors that can occur while registering functions, installing
/// auto-extensions, running `sha1_query`, and loading configuration.
///
/// Variants that originate in SQLite carry the raw result code so entry
/// points can hand it back to the host unchanged.
///

use std::ffi::CStr;
use std::os::raw::c_int;
use std::path::PathBuf;

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Failed to register function '{name}': {}", describe_code(*code))]
    Registration { name: String, code: c_int },

    #[error("Failed to install auto-extension '{name}': {}", describe_code(*code))]
    AutoExtension { name: String, code: c_int },

    #[error("non-query: [{sql}]")]
    NonQuery { sql: String },

    #[error("Unknown extension '{0}'")]
    UnknownExtension(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config at {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl ExtensionError {
    /// SQLite result code for this error, `SQLITE_ERROR` when none applies.
    pub fn code(&self) -> c_int {
        match self {
            ExtensionError::Registration { code, .. }
            | ExtensionError::AutoExtension { code, .. } => *code,
            ExtensionError::Sqlite(e) => crate::sqlite_error_code(e),
            _ => ffi::SQLITE_ERROR,
        }
    }
}

fn describe_code(code: c_int) -> String {
    let reason = unsafe { CStr::from_ptr(ffi::sqlite3_errstr(code)) };
    format!("{} (code {})", reason.to_string_lossy(), code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ExtensionError::Registration {
            name: "mycount".to_string(),
            code: ffi::SQLITE_NOMEM,
        };
        assert!(err.to_string().contains("Failed to register function"));
        assert!(err.to_string().contains("mycount"));
        assert!(err.to_string().contains("code 7"));

        let err = ExtensionError::AutoExtension {
            name: "sha1".to_string(),
            code: ffi::SQLITE_MISUSE,
        };
        assert!(err.to_string().contains("auto-extension"));
        assert!(err.to_string().contains("sha1"));

        let err = ExtensionError::NonQuery {
            sql: "DELETE FROM t".to_string(),
        };
        assert_eq!(err.to_string(), "non-query: [DELETE FROM t]");

        let err = ExtensionError::UnknownExtension("closure".to_string());
        assert!(err.to_string().contains("Unknown extension"));
        assert!(err.to_string().contains("closure"));

        let err = ExtensionError::InvalidConfig("bad value".to_string());
        assert!(err.to_string().contains("Invalid config"));

        let err = ExtensionError::ConfigParse {
            path: PathBuf::from("/tmp/sqlext.toml"),
            reason: "expected a table".to_string(),
        };
        assert!(err.to_string().contains("/tmp/sqlext.toml"));
        assert!(err.to_string().contains("expected a table"));
    }

    #[test]
    fn test_code_is_propagated_verbatim() {
        let err = ExtensionError::Registration {
            name: "mycount".to_string(),
            code: ffi::SQLITE_BUSY,
        };
        assert_eq!(err.code(), ffi::SQLITE_BUSY);

        let err = ExtensionError::UnknownExtension("x".to_string());
        assert_eq!(err.code(), ffi::SQLITE_ERROR);
    }
}
