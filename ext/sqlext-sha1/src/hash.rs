///
/// sha1(X) scalar function and the extension entry point.
///
/// `sha1` is implemented against the raw C API so non-BLOB arguments are
/// hashed over SQLite's own text rendering (`sqlite3_value_text`), which
/// keeps REAL values byte-identical to what SQLite would print.
///
/// - NULL → NULL
/// - BLOB → digest of the raw bytes
/// - INTEGER, REAL, TEXT → digest of the UTF-8 text
///

use std::os::raw::{c_char, c_int};
use std::ptr;

use rusqlite::{Connection, ffi};
use sha1::{Digest, Sha1};
use sqlext_core::{Extension, ExtensionError, ValueType, check_code, sqlite_error_code};
use tracing::debug;

use crate::query::register_sha1_query;

pub const EXTENSION: Extension = Extension::new("sha1", sqlite3_sha_init);

const SHA1_FLAGS: c_int = ffi::SQLITE_UTF8 | ffi::SQLITE_DETERMINISTIC | ffi::SQLITE_INNOCUOUS;

/// Lowercase hex SHA-1 digest of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

unsafe fn blob_as_slice<'a>(value: *mut ffi::sqlite3_value) -> &'a [u8] {
    unsafe {
        let data = ffi::sqlite3_value_blob(value) as *const u8;
        let len = ffi::sqlite3_value_bytes(value);
        if data.is_null() || len <= 0 {
            return &[];
        }
        std::slice::from_raw_parts(data, len as usize)
    }
}

unsafe fn text_as_slice<'a>(value: *mut ffi::sqlite3_value) -> &'a [u8] {
    unsafe {
        let data = ffi::sqlite3_value_text(value);
        let len = ffi::sqlite3_value_bytes(value);
        if data.is_null() || len <= 0 {
            return &[];
        }
        std::slice::from_raw_parts(data, len as usize)
    }
}

unsafe extern "C" fn sha1_func(
    ctx: *mut ffi::sqlite3_context,
    argc: c_int,
    argv: *mut *mut ffi::sqlite3_value,
) {
    if argc < 1 {
        return;
    }
    let value = unsafe { *argv };
    let input = match unsafe { ValueType::of(value) } {
        ValueType::Null => return,
        ValueType::Blob => unsafe { blob_as_slice(value) },
        _ => unsafe { text_as_slice(value) },
    };
    let hex_str = sha1_hex(input);
    unsafe {
        ffi::sqlite3_result_text(
            ctx,
            hex_str.as_ptr() as *const c_char,
            hex_str.len() as c_int,
            ffi::SQLITE_TRANSIENT(),
        );
    }
}

/// Extension entry point registering `sha1` and `sha1_query`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sqlite3_sha_init(
    db: *mut ffi::sqlite3,
    _pz_err_msg: *mut *const c_char,
    _p_api: *const ffi::sqlite3_api_routines,
) -> c_int {
    let rc = unsafe {
        ffi::sqlite3_create_function_v2(
            db,
            c"sha1".as_ptr(),
            1,
            SHA1_FLAGS,
            ptr::null_mut(),
            Some(sha1_func),
            None,
            None,
            None,
        )
    };
    if rc != ffi::SQLITE_OK {
        return rc;
    }

    // Borrowed handle: dropping this Connection leaves the database open.
    let conn = match unsafe { Connection::from_handle(db) } {
        Ok(conn) => conn,
        Err(e) => return sqlite_error_code(&e),
    };
    if let Err(e) = register_sha1_query(&conn) {
        return sqlite_error_code(&e);
    }
    debug!("Registered sha1 and sha1_query");
    ffi::SQLITE_OK
}

/// Register `sha1` and `sha1_query` on one connection.
pub fn register(conn: &Connection) -> Result<(), ExtensionError> {
    let rc = unsafe { sqlite3_sha_init(conn.handle(), ptr::null_mut(), ptr::null()) };
    check_code(EXTENSION.name(), rc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_sha1() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        register(&conn).unwrap();
        conn
    }

    fn sha1_of(conn: &Connection, expr: &str) -> Option<String> {
        conn.query_row(&format!("SELECT sha1({expr})"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_sha1_hex_known_vector() {
        assert_eq!(sha1_hex(b"hello world"), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_sql_text_argument() {
        let conn = conn_with_sha1();
        assert_eq!(
            sha1_of(&conn, "'hello world'").as_deref(),
            Some("2aae6c35c94fcfb415dbe95f408b9ce91ee846ed")
        );
    }

    #[test]
    fn test_sql_null_argument() {
        let conn = conn_with_sha1();
        assert_eq!(sha1_of(&conn, "NULL"), None);
    }

    #[test]
    fn test_sql_blob_argument() {
        let conn = conn_with_sha1();
        assert_eq!(
            sha1_of(&conn, "CAST('abc' AS BLOB)").as_deref(),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
        assert_eq!(
            sha1_of(&conn, "x''").as_deref(),
            Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[test]
    fn test_sql_numbers_hash_their_text() {
        let conn = conn_with_sha1();
        assert_eq!(sha1_of(&conn, "123"), sha1_of(&conn, "'123'"));
        assert_eq!(sha1_of(&conn, "1.5"), sha1_of(&conn, "CAST(1.5 AS TEXT)"));
    }

    #[test]
    fn test_sql_bound_parameter() {
        let conn = conn_with_sha1();
        let digest: String = conn
            .query_row("SELECT sha1(?1)", [b"hello world".to_vec()], |row| row.get(0))
            .unwrap();
        assert_eq!(digest, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[test]
    fn test_sql_wrong_arity() {
        let conn = conn_with_sha1();
        assert!(conn.execute_batch("SELECT sha1()").is_err());
        assert!(conn.execute_batch("SELECT sha1('a', 'b')").is_err());
    }
}
