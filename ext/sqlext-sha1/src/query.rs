///
/// sha1_query(SQL) - digest over queries and their results.
///
/// Every statement in SQL is prepared and stepped in order. The hash input is:
/// - per statement: "S<n>:" then the n bytes of statement text
/// - per row: "R"
/// - per column: "N" for NULL, "I"/"F" plus 8 big-endian bytes for
///   INTEGER/REAL, "T<n>:"/"B<n>:" plus n bytes for TEXT/BLOB
///
/// Statements that write are rejected. Registered SQLITE_DIRECTONLY since it
/// runs arbitrary SQL on the calling connection.
///

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ffi};
use sha1::{Digest, Sha1};
use sqlext_core::ExtensionError;

pub(crate) fn register_sha1_query(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "sha1_query",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DIRECTONLY,
        |ctx| {
            let sql = match ctx.get_raw(0) {
                ValueRef::Null => return Ok(None),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    String::from_utf8_lossy(bytes).into_owned()
                }
                ValueRef::Integer(v) => v.to_string(),
                ValueRef::Real(v) => v.to_string(),
            };
            let conn = unsafe { ctx.get_connection()? };
            query_digest(&conn, &sql)
                .map(Some)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
        },
    )
}

/// Owned prepared statement, finalized on drop.
struct RawStatement(*mut ffi::sqlite3_stmt);

impl Drop for RawStatement {
    fn drop(&mut self) {
        unsafe { ffi::sqlite3_finalize(self.0) };
    }
}

fn sqlite_failure(db: *mut ffi::sqlite3, code: c_int) -> ExtensionError {
    let message = unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
        .to_string_lossy()
        .into_owned();
    ExtensionError::Sqlite(rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some(message)))
}

unsafe fn column_slice<'a>(data: *const u8, len: c_int) -> &'a [u8] {
    if data.is_null() || len <= 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(data, len as usize) }
}

/// Run every statement in `sql` and return the hex digest of their text and rows.
///
/// Statements are stepped without bindings, so parameters read as NULL.
pub fn query_digest(conn: &Connection, sql: &str) -> Result<String, ExtensionError> {
    let db = unsafe { conn.handle() };
    let mut hasher = Sha1::new();
    let mut rest = sql.as_bytes();

    while !rest.is_empty() {
        let mut raw = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                db,
                rest.as_ptr() as *const c_char,
                rest.len() as c_int,
                &mut raw,
                &mut tail,
            )
        };
        let stmt = RawStatement(raw);
        if rc != ffi::SQLITE_OK {
            return Err(sqlite_failure(db, rc));
        }
        let consumed = if tail.is_null() {
            rest.len()
        } else {
            tail as usize - rest.as_ptr() as usize
        };
        rest = &rest[consumed..];
        if stmt.0.is_null() {
            if consumed == 0 {
                break;
            }
            continue;
        }
        unsafe { hash_statement(db, &stmt, &mut hasher) }?;
    }

    Ok(hex::encode(hasher.finalize()))
}

/// # Safety
/// `stmt` must be a live statement prepared on `db`.
unsafe fn hash_statement(
    db: *mut ffi::sqlite3,
    stmt: &RawStatement,
    hasher: &mut Sha1,
) -> Result<(), ExtensionError> {
    let text = unsafe { CStr::from_ptr(ffi::sqlite3_sql(stmt.0)) }.to_bytes();
    if unsafe { ffi::sqlite3_stmt_readonly(stmt.0) } == 0 {
        return Err(ExtensionError::NonQuery {
            sql: String::from_utf8_lossy(text).into_owned(),
        });
    }
    hasher.update(format!("S{}:", text.len()));
    hasher.update(text);

    let col_count = unsafe { ffi::sqlite3_column_count(stmt.0) };
    loop {
        match unsafe { ffi::sqlite3_step(stmt.0) } {
            ffi::SQLITE_ROW => {}
            ffi::SQLITE_DONE => return Ok(()),
            rc => return Err(sqlite_failure(db, rc)),
        }
        hasher.update(b"R");
        for i in 0..col_count {
            match unsafe { ffi::sqlite3_column_type(stmt.0, i) } {
                ffi::SQLITE_INTEGER => {
                    hasher.update(b"I");
                    hasher.update(unsafe { ffi::sqlite3_column_int64(stmt.0, i) }.to_be_bytes());
                }
                ffi::SQLITE_FLOAT => {
                    hasher.update(b"F");
                    hasher.update(unsafe { ffi::sqlite3_column_double(stmt.0, i) }.to_bits().to_be_bytes());
                }
                ffi::SQLITE_TEXT => {
                    let data = unsafe { ffi::sqlite3_column_text(stmt.0, i) };
                    let len = unsafe { ffi::sqlite3_column_bytes(stmt.0, i) };
                    let bytes = unsafe { column_slice(data, len) };
                    hasher.update(format!("T{}:", bytes.len()));
                    hasher.update(bytes);
                }
                ffi::SQLITE_BLOB => {
                    let data = unsafe { ffi::sqlite3_column_blob(stmt.0, i) } as *const u8;
                    let len = unsafe { ffi::sqlite3_column_bytes(stmt.0, i) };
                    let bytes = unsafe { column_slice(data, len) };
                    hasher.update(format!("B{}:", bytes.len()));
                    hasher.update(bytes);
                }
                _ => hasher.update(b"N"),
            }
        }
    }
}
